// SPDX-License-Identifier: MIT OR Apache-2.0
//! Demo curves shown at startup.

use natron_editor_curves::{Curve, CurveKind, CurveSet, KeyframeType, ValueKind};

/// One curve of each flavour the editor handles
pub fn demo_curves() -> CurveSet {
    let mut curves = CurveSet::new();

    let wave: Vec<(f64, f64)> = (0..=8)
        .map(|i| {
            let t = f64::from(i) * 25.0;
            (t, 5.0 * (t * std::f64::consts::PI / 100.0).sin())
        })
        .collect();
    let wave_id = curves.add_curve(
        Curve::new("Wave")
            .with_color([110, 190, 255])
            .with_keyframes(&wave, KeyframeType::Smooth),
    );

    curves.add_curve(
        Curve::new("Pulse (periodic)")
            .with_color([255, 170, 90])
            .with_period(0.0, 60.0)
            .with_keyframes(&[(0.0, -3.0), (20.0, 3.0), (40.0, 0.0)], KeyframeType::Linear),
    );

    curves.add_curve(
        Curve::new("Steps")
            .with_color([140, 220, 120])
            .with_value_kind(ValueKind::Int)
            .with_keyframes(&[(0.0, 1.0), (60.0, 4.0), (120.0, -2.0), (180.0, 2.0)], KeyframeType::Constant),
    );

    curves.add_curve(
        Curve::new("Control point X")
            .with_kind(CurveKind::BezierControlPoint)
            .with_fractional_time()
            .with_color([220, 120, 220])
            .with_keyframes(&[(10.0, -6.0), (95.5, -1.0), (170.0, -7.5)], KeyframeType::Linear),
    );

    curves.select_curve(Some(wave_id));
    curves
}
