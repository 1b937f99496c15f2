// SPDX-License-Identifier: MIT OR Apache-2.0
//! Axis tick placement.
//!
//! Ticks are laid out on a regular grid of step `tick_size`. Each grid index
//! gets a size class (1, 2 or 5, 10, 20 or 50, ...) telling how important it
//! is: the class times `tick_size` is the spacing of the coarsest grid the
//! tick belongs to. Gridlines fade in with their on-screen spacing.

use crate::settings::CurveEditorSettings;

/// Extent of the zero axes drawn across the view
pub const AXIS_MAX: f64 = 100_000.0;
/// Negative extent of the zero axes
pub const AXIS_MIN: f64 = -100_000.0;

/// A tick position and its importance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    /// Position along the axis
    pub value: f64,
    /// Size class, the multiple of the base step this tick aligns with
    pub size_class: i32,
}

/// Compute the base tick step for an axis.
///
/// Returns the smallest power of ten, or half of one when the second value
/// is true, whose on-screen size is at least `min_tick_size_units` pixels. Requires `xmin < xmax` and `range_units > 0`.
pub fn ticks_size(xmin: f64, xmax: f64, range_units: f64, min_tick_size_units: f64) -> (f64, bool) {
    let min_tick_size = min_tick_size_units * (xmax - xmin) / range_units;
    let next_p10 = min_tick_size.log10().ceil();
    let tick_size = 10f64.powf(next_p10);

    if tick_size / 2.0 >= min_tick_size {
        (tick_size / 2.0, true)
    } else {
        (tick_size, false)
    }
}

/// Compute the index range of ticks inside `[xmin, xmax]`.
///
/// Returns `(offset, m1, m2)` such that tick `i` sits at
/// `offset + i * tick_width`. The offset is zero when the interval contains
/// zero, otherwise it is a multiple of the largest tick spacing placed at or
/// below `xmin`, which keeps indices small far from the origin.
pub fn ticks_bounds(
    xmin: f64,
    xmax: f64,
    tick_width: f64,
    half_tick: bool,
    tick_max: i32,
) -> (f64, i32, i32) {
    let mut offset = 0.0;
    if xmin > 0.0 || xmax < 0.0 {
        let largest = tick_width * f64::from(tick_max) * if half_tick { 2.0 } else { 1.0 };
        if largest > 0.0 {
            offset = largest * (xmin / largest).floor();
        }
    }
    let m1 = ((xmin - offset) / tick_width).ceil() as i32;
    let m2 = ((xmax - offset) / tick_width).floor() as i32;
    (offset, m1, m2)
}

/// Assign a size class to every tick index in `[m1, m2]`.
///
/// Classes grow by alternating factors of 2 and 5 (starting with 2 when
/// `half_tick`) up to `tick_max`; the largest class dividing an index wins.
/// Index 0 always gets `10 * tick_max`.
pub fn ticks_fill(half_tick: bool, tick_max: i32, m1: i32, m2: i32) -> Vec<i32> {
    let len = (i64::from(m2) - i64::from(m1) + 1).max(0) as usize;
    let mut ticks = vec![1; len];

    let mut size: i32 = 1;
    let mut multiply_by_two = half_tick;
    loop {
        size = match size.checked_mul(if multiply_by_two { 2 } else { 5 }) {
            Some(next) if next <= tick_max => next,
            _ => break,
        };
        multiply_by_two = !multiply_by_two;

        let mut i = i64::from(m1.div_euclid(size)) * i64::from(size);
        if i < i64::from(m1) {
            i += i64::from(size);
        }
        while i <= i64::from(m2) {
            ticks[(i - i64::from(m1)) as usize] = size;
            i += i64::from(size);
        }
    }

    if m1 <= 0 && m2 >= 0 {
        ticks[(-i64::from(m1)) as usize] = tick_max.saturating_mul(10);
    }

    ticks
}

/// Opacity of a gridline whose spacing is `val`, fading in between `min` and `max`
pub fn ticks_alpha(min: f64, max: f64, val: f64) -> f64 {
    ((val - min) / (max - min)).clamp(0.0, 1.0).sqrt()
}

/// Upper bound on the ticks generated for one axis
pub const MAX_TICK_COUNT: i64 = 1 << 16;

/// Ticks with their positions, for `[xmin, xmax]` spanning `range_units` pixels
pub fn ticks(xmin: f64, xmax: f64, range_units: f64, min_tick_size_units: f64, tick_max: i32) -> Vec<Tick> {
    let (tick_size, half_tick) = ticks_size(xmin, xmax, range_units, min_tick_size_units);
    if !(tick_size > 0.0) || !tick_size.is_finite() {
        return Vec::new();
    }
    let (offset, m1, m2) = ticks_bounds(xmin, xmax, tick_size, half_tick, tick_max);
    if i64::from(m2) - i64::from(m1) >= MAX_TICK_COUNT {
        tracing::warn!("Skipping {} ticks between {} and {}", i64::from(m2) - i64::from(m1) + 1, xmin, xmax);
        return Vec::new();
    }
    ticks_fill(half_tick, tick_max, m1, m2)
        .into_iter()
        .zip(m1..=m2)
        .map(|(size_class, i)| Tick {
            value: f64::from(i) * tick_size + offset,
            size_class,
        })
        .collect()
}

/// Format a tick value with six significant digits, like `%g`
pub fn format_tick_label(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if !value.is_finite() {
        return value.to_string();
    }

    const PRECISION: i32 = 6;
    // The exponent after rounding to the precision, e.g. 999999.7 -> 1e+06
    let scientific = format!("{:.*e}", (PRECISION - 1) as usize, value);
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((scientific.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if exponent < -4 || exponent >= PRECISION {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_fraction(mantissa), sign, exponent.abs())
    } else {
        let decimals = (PRECISION - 1 - exponent) as usize;
        trim_fraction(&format!("{value:.decimals$}")).to_string()
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

/// A label drawn next to a gridline
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleLabel {
    /// Formatted value
    pub text: String,
    /// Label opacity in `[0, 1]`
    pub alpha: f64,
}

/// A gridline ready to draw
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleTick {
    /// Position along the axis
    pub value: f64,
    /// Size class
    pub size_class: i32,
    /// Gridline opacity in `(0, 1]`
    pub alpha: f64,
    /// Label, when there is room for it
    pub label: Option<ScaleLabel>,
}

/// Gridlines and labels for one axis.
///
/// `range_px` is the on-screen length of `[range_min, range_max]`,
/// `min_text_px` the smallest spacing worth labelling (the width of "00" on
/// the horizontal axis, the line height on the vertical one) and
/// `label_extent` the size of a label along the axis.
pub fn scale_ticks(
    range_min: f64,
    range_max: f64,
    range_px: f64,
    min_text_px: f64,
    settings: &CurveEditorSettings,
    label_extent: &dyn Fn(&str) -> f64,
) -> Vec<ScaleTick> {
    let range = range_max - range_min;
    if !(range > 0.0) || !(range_px > 0.0) || !range.is_finite() || !settings.has_valid_ticks() {
        return Vec::new();
    }

    let min_px = settings.min_tick_size_px;
    let max_px = settings.max_tick_size_px;
    let min_tick_size_text = range * min_text_px / range_px;
    let (small_tick_size, _) = ticks_size(range_min, range_max, range_px, min_px);

    ticks(range_min, range_max, range_px, min_px, settings.ticks_max)
        .into_iter()
        .filter_map(|tick| {
            let tick_size = f64::from(tick.size_class) * small_tick_size;
            let tick_size_px = range_px * tick_size / range;
            let alpha = ticks_alpha(min_px, max_px, tick_size_px);
            if alpha <= 0.0 {
                return None;
            }

            let label = (tick_size > min_tick_size_text)
                .then(|| format_tick_label(tick.value))
                .and_then(|text| {
                    let text_px = label_extent(&text);
                    if tick_size_px <= text_px {
                        return None;
                    }
                    let mut text_alpha = 1.0;
                    if tick_size_px < text_px + min_text_px && min_text_px > 0.0 {
                        text_alpha = (tick_size_px - text_px) / min_text_px;
                    }
                    Some(ScaleLabel { text, alpha: text_alpha })
                });

            Some(ScaleTick {
                value: tick.value,
                size_class: tick.size_class,
                alpha,
                label,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticks_size_bounds() {
        for &(xmin, xmax, px, min_px) in &[
            (0.0, 1.0, 500.0, 6.0),
            (-10.0, 500.0, 800.0, 5.0),
            (1e6, 1e6 + 3.0, 1200.0, 10.0),
            (-0.002, 0.001, 300.0, 7.0),
            (-1e5, 1e5, 640.0, 5.0),
        ] {
            let min_tick_size = min_px * (xmax - xmin) / px;
            let (size, half) = ticks_size(xmin, xmax, px, min_px);
            assert!(size > 0.0);
            assert!(min_tick_size <= size * (1.0 + 1e-12));
            if half {
                assert!(size * 2.0 / 10.0 < min_tick_size);
            } else {
                assert!(size / 10.0 < min_tick_size);
                assert!(size / 2.0 < min_tick_size);
            }
        }
    }

    #[test]
    fn test_ticks_size_values() {
        // 4px over 100px of a unit range -> 0.04, halved 0.1 is enough
        let (size, half) = ticks_size(0.0, 1.0, 100.0, 4.0);
        assert!((size - 0.05).abs() < 1e-12);
        assert!(half);

        // 0.07 rounds up to 0.1, and 0.05 is too small
        let (size, half) = ticks_size(0.0, 1.0, 100.0, 7.0);
        assert!((size - 0.1).abs() < 1e-12);
        assert!(!half);
    }

    #[test]
    fn test_fill_length_and_zero() {
        for &(xmin, xmax, px) in &[(-10.0, 500.0, 800.0), (-3.0, 3.0, 100.0), (-1.0, 1.0, 1000.0)] {
            let (size, half) = ticks_size(xmin, xmax, px, 5.0);
            let (offset, m1, m2) = ticks_bounds(xmin, xmax, size, half, 1000);
            assert_eq!(offset, 0.0);
            let classes = ticks_fill(half, 1000, m1, m2);
            assert_eq!(classes.len(), (m2 - m1 + 1) as usize);
            assert!(m1 <= 0 && m2 >= 0);
            assert_eq!(classes[(-m1) as usize], 10_000);
        }
    }

    #[test]
    fn test_fill_classes() {
        let classes = ticks_fill(false, 100, 0, 20);
        assert_eq!(classes[0], 1000);
        assert_eq!(classes[1], 1);
        assert_eq!(classes[5], 5);
        assert_eq!(classes[10], 10);
        assert_eq!(classes[15], 5);
        assert_eq!(classes[20], 10);

        let classes = ticks_fill(true, 100, 1, 20);
        assert_eq!(classes[1 - 1], 1);
        assert_eq!(classes[2 - 1], 2);
        assert_eq!(classes[10 - 1], 10);
        assert_eq!(classes[20 - 1], 20);

        let classes = ticks_fill(false, 1000, -12, -8);
        assert_eq!(classes, vec![1, 1, 10, 1, 1]);
    }

    #[test]
    fn test_fill_empty_range() {
        assert!(ticks_fill(false, 1000, 5, 4).is_empty());
    }

    #[test]
    fn test_bounds_bracket_interval() {
        let (offset, m1, m2) = ticks_bounds(1_000_003.2, 1_000_010.7, 0.5, true, 1000);
        assert!(offset > 0.0);
        assert!(offset <= 1_000_003.2);
        assert_eq!(offset % 1000.0, 0.0);
        assert!(f64::from(m1) * 0.5 + offset >= 1_000_003.2);
        assert!(f64::from(m1 - 1) * 0.5 + offset < 1_000_003.2);
        assert!(f64::from(m2) * 0.5 + offset <= 1_000_010.7);
        assert!(f64::from(m2 + 1) * 0.5 + offset > 1_000_010.7);

        let (offset, _, _) = ticks_bounds(-50.0, -20.0, 1.0, false, 10);
        assert_eq!(offset, -50.0);
    }

    #[test]
    fn test_alpha() {
        assert_eq!(ticks_alpha(1.0, 4.0, 1.0), 0.0);
        assert_eq!(ticks_alpha(1.0, 4.0, 4.0), 1.0);
        assert_eq!(ticks_alpha(1.0, 4.0, 0.0), 0.0);
        assert_eq!(ticks_alpha(1.0, 4.0, 100.0), 1.0);

        let mut last = 0.0;
        for i in 0..50 {
            let a = ticks_alpha(1.0, 4.0, f64::from(i) * 0.1);
            assert!(a >= last);
            last = a;
        }
    }

    #[test]
    fn test_format_label() {
        assert_eq!(format_tick_label(0.0), "0");
        assert_eq!(format_tick_label(-0.0), "0");
        assert_eq!(format_tick_label(1.0), "1");
        assert_eq!(format_tick_label(0.5), "0.5");
        assert_eq!(format_tick_label(-250.0), "-250");
        assert_eq!(format_tick_label(1234.5), "1234.5");
        assert_eq!(format_tick_label(0.1 + 0.2), "0.3");
        assert_eq!(format_tick_label(0.0001), "0.0001");
        assert_eq!(format_tick_label(0.00001), "1e-05");
        assert_eq!(format_tick_label(1_000_000.0), "1e+06");
        assert_eq!(format_tick_label(123_456_789.0), "1.23457e+08");
    }

    #[test]
    fn test_scale_ticks_labels_major_lines() {
        let settings = CurveEditorSettings::default();
        let width = |s: &str| 7.0 * s.chars().count() as f64;
        let ticks = scale_ticks(-10.0, 500.0, 800.0, 14.0, &settings, &width);
        assert!(!ticks.is_empty());
        assert!(ticks.iter().all(|t| t.alpha > 0.0 && t.alpha <= 1.0));

        let zero = ticks.iter().find(|t| t.value == 0.0).unwrap();
        assert_eq!(zero.label.as_ref().unwrap().text, "0");

        // Labelled ticks are never weaker than unlabelled ones
        let weakest_labelled = ticks
            .iter()
            .filter(|t| t.label.is_some())
            .map(|t| t.size_class)
            .min()
            .unwrap();
        assert!(ticks
            .iter()
            .filter(|t| t.label.is_none())
            .all(|t| t.size_class <= weakest_labelled));
    }

    #[test]
    fn test_scale_ticks_degenerate() {
        let settings = CurveEditorSettings::default();
        let width = |_: &str| 10.0;
        assert!(scale_ticks(1.0, 1.0, 800.0, 14.0, &settings, &width).is_empty());
        assert!(scale_ticks(0.0, 1.0, 0.0, 14.0, &settings, &width).is_empty());
    }

    #[test]
    fn test_scale_ticks_rejects_bad_settings() {
        let width = |_: &str| 10.0;
        let broken = [
            CurveEditorSettings {
                min_tick_size_px: 0.0,
                ..Default::default()
            },
            CurveEditorSettings {
                max_tick_size_px: 5.0,
                ..Default::default()
            },
            CurveEditorSettings {
                ticks_max: 1_000_000_000,
                ..Default::default()
            },
        ];
        for settings in &broken {
            assert!(scale_ticks(-10.0, 500.0, 800.0, 14.0, settings, &width).is_empty());
        }
    }

    #[test]
    fn test_zero_tick_spacing_yields_nothing() {
        assert!(ticks(-10.0, 500.0, 800.0, 0.0, 1000).is_empty());
        assert!(ticks(-10.0, 500.0, 800.0, 1e-9, 1000).is_empty());
    }

    #[test]
    fn test_fill_huge_tick_max() {
        let fill = ticks_fill(false, 1_000_000_000, -3, 3);
        assert_eq!(fill.len(), 7);
        assert_eq!(fill[3], i32::MAX);
        assert_eq!(fill[0], 1);

        let fill = ticks_fill(true, i32::MAX, i32::MAX - 2, i32::MAX);
        assert_eq!(fill.len(), 3);
    }
}
