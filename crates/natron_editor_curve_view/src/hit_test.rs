// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pointer proximity queries against curves, keys, handles and markers.
//!
//! All probes take a widget-space point and compare in widget pixels using
//! the configured click tolerance.

use crate::selection::{tangent_endpoints, BboxHandle, KeySelection, SelectedKey, TangentSide};
use crate::settings::CurveEditorSettings;
use crate::text::TextMetrics;
use crate::ticks::format_tick_label;
use crate::timeline::{polygon_contains, Timeline, TimelineMarkers};
use crate::zoom::{ZoomContext, ZoomPoint, ZoomRect};
use egui::Pos2;
use natron_editor_curves::{Curve, CurveId, CurveSet, KeyFrame};

/// A curve passing near the pointer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveHit {
    /// The curve
    pub curve: CurveId,
    /// Pointer time
    pub x: f64,
    /// Curve value at that time
    pub y: f64,
}

/// A keyframe under the pointer, with its neighbours
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyFrameHit {
    /// Owning curve
    pub curve: CurveId,
    /// Index of the key in its curve
    pub index: usize,
    /// The key
    pub key: KeyFrame,
    /// Previous key, wrapped on periodic curves
    pub prev: Option<KeyFrame>,
    /// Next key, wrapped on periodic curves
    pub next: Option<KeyFrame>,
}

/// Label drawn under a single selected key
pub fn key_label(key: &KeyFrame) -> String {
    format!("x: {}, y: {}", format_tick_label(key.time), format_tick_label(key.value))
}

/// Label drawn under a tangent handle
pub fn derivative_label(side: TangentSide, derivative: f64, precision: u32) -> String {
    let prefix = match side {
        TangentSide::Left => "l",
        TangentSide::Right => "r",
    };
    format!("{prefix}: {}", round_derivative(derivative, precision))
}

/// Round to `precision` decimal digits, halves up
pub fn round_derivative(derivative: f64, precision: u32) -> f64 {
    let rounding = 10f64.powi(precision as i32);
    (derivative * rounding + 0.5).floor() / rounding
}

/// Evaluate a curve for display, retrying without its expression on failure
pub fn evaluate_with_fallback(curve: &Curve, time: f64) -> Option<f64> {
    match curve.evaluate(true, time) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::debug!("Expression of curve '{}' failed at {}: {}", curve.name, time, err);
            curve.evaluate(false, time).ok()
        }
    }
}

/// Read-only probes over the current editor state
pub struct CurveHitTester<'a> {
    zoom: &'a ZoomContext,
    curves: &'a CurveSet,
    selection: &'a KeySelection,
    timeline: &'a Timeline,
    settings: &'a CurveEditorSettings,
    metrics: &'a dyn TextMetrics,
}

impl<'a> CurveHitTester<'a> {
    /// Create a tester borrowing the editor state
    pub fn new(
        zoom: &'a ZoomContext,
        curves: &'a CurveSet,
        selection: &'a KeySelection,
        timeline: &'a Timeline,
        settings: &'a CurveEditorSettings,
        metrics: &'a dyn TextMetrics,
    ) -> Self {
        Self {
            zoom,
            curves,
            selection,
            timeline,
            settings,
            metrics,
        }
    }

    fn tolerance(&self) -> f64 {
        self.settings.click_tolerance
    }

    fn widget(&self, p: ZoomPoint) -> (f64, f64) {
        (self.zoom.widget_x(p.x), self.zoom.widget_y(p.y))
    }

    /// Inclusive square test around a zoom-space point
    fn near_point(&self, pt: Pos2, target: ZoomPoint) -> bool {
        let tol = self.tolerance();
        let (tx, ty) = self.widget(target);
        let (px, py) = (f64::from(pt.x), f64::from(pt.y));
        px >= tx - tol && px <= tx + tol && py >= ty - tol && py <= ty + tol
    }

    /// Whether `pt` falls in the box of `text` drawn below `anchor`
    fn near_label(&self, pt: Pos2, anchor: ZoomPoint, text: &str) -> bool {
        let tol = self.tolerance();
        let (x, y) = self.widget(anchor);
        let top = y + self.settings.label_offset;
        let right = x + self.metrics.text_width(text);
        let bottom = top + self.metrics.line_height();
        let (px, py) = (f64::from(pt.x), f64::from(pt.y));
        px >= x - tol && px <= right + tol && py >= top - tol && py <= bottom + tol
    }

    fn single_editable_key(&self) -> Option<&'a SelectedKey> {
        let [selected] = self.selection.keys() else {
            return None;
        };
        let curve = self.curves.curve(selected.curve)?;
        (!curve.is_bezier()).then_some(selected)
    }

    /// First visible curve whose value at the pointer time is within tolerance
    pub fn is_nearby_curve(&self, pt: Pos2) -> Option<CurveHit> {
        let tol = self.tolerance();
        let pos = self.zoom.to_zoom_coordinates(pt);
        let py = f64::from(pt.y);

        self.curves.visible_curves().find_map(|curve| {
            let y = evaluate_with_fallback(curve, pos.x)?;
            let wy = self.zoom.widget_y(y);
            (py < wy + tol && py > wy - tol).then_some(CurveHit {
                curve: curve.id,
                x: pos.x,
                y,
            })
        })
    }

    /// First keyframe of a visible curve strictly within tolerance
    pub fn is_nearby_keyframe(&self, pt: Pos2) -> Option<KeyFrameHit> {
        let tol = self.tolerance();
        let (px, py) = (f64::from(pt.x), f64::from(pt.y));

        for curve in self.curves.visible_curves() {
            for (index, key) in curve.keyframes().iter().enumerate() {
                let (kx, ky) = self.widget(ZoomPoint::new(key.time, key.value));
                if (py - ky).abs() < tol && (px - kx).abs() < tol {
                    let (prev, next) = curve.prev_next(index);
                    return Some(KeyFrameHit {
                        curve: curve.id,
                        index,
                        key: *key,
                        prev,
                        next,
                    });
                }
            }
        }
        None
    }

    /// Label of the single selected key
    pub fn is_nearby_keyframe_text(&self, pt: Pos2) -> Option<SelectedKey> {
        let selected = self.single_editable_key()?;
        self.near_label(pt, selected.position(), &key_label(&selected.key))
            .then_some(*selected)
    }

    /// Tangent handle of a selected key, left side first
    pub fn is_nearby_tangent(&self, pt: Pos2) -> Option<(TangentSide, SelectedKey)> {
        for selected in self.selection.keys() {
            let editable = self.curves.curve(selected.curve).is_some_and(|c| !c.is_bezier());
            if !editable {
                continue;
            }
            for side in [TangentSide::Left, TangentSide::Right] {
                if self.near_point(pt, selected.tangent(side)) {
                    return Some((side, *selected));
                }
            }
        }
        None
    }

    /// Derivative label of the single selected key, left side first
    pub fn is_nearby_selected_tangent_text(&self, pt: Pos2) -> Option<(TangentSide, SelectedKey)> {
        let selected = self.single_editable_key()?;
        let precision = self.settings.derivative_precision;
        [TangentSide::Left, TangentSide::Right]
            .into_iter()
            .find(|&side| {
                let text = derivative_label(side, selected.derivative(side), precision);
                self.near_label(pt, selected.tangent(side), &text)
            })
            .map(|side| (side, *selected))
    }

    /// Move cross at the middle of the selection bounding box
    pub fn is_nearby_selected_keyframes_cross_widget(&self, pt: Pos2) -> bool {
        if self.selection.len() < 2 {
            return false;
        }
        let Some(bbox) = self.selection.bounding_box() else {
            return false;
        };
        let tol = self.tolerance();
        let half = self.settings.cross_half_size;
        let (mx, my) = self.widget(bbox.center());
        let (px, py) = (f64::from(pt.x), f64::from(pt.y));

        let horizontal = px >= mx - half - tol && px <= mx + half + tol && (py - my).abs() <= tol;
        let vertical = py >= my - half - tol && py <= my + half + tol && (px - mx).abs() <= tol;
        horizontal || vertical
    }

    /// Whether `pt` is on the given handle of the selection bounding box
    pub fn is_nearby_bbox_handle(&self, pt: Pos2, handle: BboxHandle) -> bool {
        self.selection
            .bounding_box()
            .is_some_and(|bbox| self.near_point(pt, handle.position(&bbox)))
    }

    /// First bounding box handle under `pt`, in press order
    pub fn nearby_bbox_handle(&self, pt: Pos2) -> Option<BboxHandle> {
        let bbox = self.selection.bounding_box()?;
        BboxHandle::all()
            .iter()
            .copied()
            .find(|handle| self.near_point(pt, handle.position(&bbox)))
    }

    /// Top-left bounding box handle
    pub fn is_nearby_bbox_top_left(&self, pt: Pos2) -> bool {
        self.is_nearby_bbox_handle(pt, BboxHandle::TopLeft)
    }

    /// Left edge bounding box handle
    pub fn is_nearby_bbox_mid_left(&self, pt: Pos2) -> bool {
        self.is_nearby_bbox_handle(pt, BboxHandle::MidLeft)
    }

    /// Bottom-left bounding box handle
    pub fn is_nearby_bbox_btm_left(&self, pt: Pos2) -> bool {
        self.is_nearby_bbox_handle(pt, BboxHandle::BtmLeft)
    }

    /// Bottom edge bounding box handle
    pub fn is_nearby_bbox_mid_btm(&self, pt: Pos2) -> bool {
        self.is_nearby_bbox_handle(pt, BboxHandle::MidBtm)
    }

    /// Bottom-right bounding box handle
    pub fn is_nearby_bbox_btm_right(&self, pt: Pos2) -> bool {
        self.is_nearby_bbox_handle(pt, BboxHandle::BtmRight)
    }

    /// Right edge bounding box handle
    pub fn is_nearby_bbox_mid_right(&self, pt: Pos2) -> bool {
        self.is_nearby_bbox_handle(pt, BboxHandle::MidRight)
    }

    /// Top-right bounding box handle
    pub fn is_nearby_bbox_top_right(&self, pt: Pos2) -> bool {
        self.is_nearby_bbox_handle(pt, BboxHandle::TopRight)
    }

    /// Top edge bounding box handle
    pub fn is_nearby_bbox_mid_top(&self, pt: Pos2) -> bool {
        self.is_nearby_bbox_handle(pt, BboxHandle::MidTop)
    }

    fn timeline_markers(&self) -> TimelineMarkers {
        self.timeline
            .markers(self.zoom, self.settings.cursor_width, self.settings.cursor_height)
    }

    /// Current frame marker at the top of the view
    pub fn is_nearby_timeline_top_poly(&self, pt: Pos2) -> bool {
        polygon_contains(&self.timeline_markers().top, self.zoom.to_zoom_coordinates(pt))
    }

    /// Current frame marker at the bottom of the view
    pub fn is_nearby_timeline_btm_poly(&self, pt: Pos2) -> bool {
        polygon_contains(&self.timeline_markers().bottom, self.zoom.to_zoom_coordinates(pt))
    }

    /// Keys of visible curves inside a zoom-space rectangle, bounds inclusive
    pub fn keyframes_within_rect(&self, rect: &ZoomRect) -> Vec<SelectedKey> {
        keys_in_rect(self.zoom, self.curves, rect)
    }
}

/// Keys of visible curves inside `rect`, with their tangent handles
pub fn keys_in_rect(zoom: &ZoomContext, curves: &CurveSet, rect: &ZoomRect) -> Vec<SelectedKey> {
    let mut keys = Vec::new();
    for curve in curves.visible_curves() {
        for (index, key) in curve.keyframes().iter().enumerate() {
            if rect.contains(ZoomPoint::new(key.time, key.value)) {
                let (left_tangent, right_tangent) = tangent_endpoints(zoom, curve, index);
                keys.push(SelectedKey {
                    curve: curve.id,
                    key: *key,
                    left_tangent,
                    right_tangent,
                });
            }
        }
    }
    keys
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::MonospaceMetrics;
    use natron_editor_curves::{CurveExpression, CurveKind, KeyframeType};

    struct Fixture {
        zoom: ZoomContext,
        curves: CurveSet,
        selection: KeySelection,
        timeline: Timeline,
        settings: CurveEditorSettings,
        metrics: MonospaceMetrics,
        curve: CurveId,
    }

    impl Fixture {
        // 800x400 view over [0, 100] x [-10, 10]: 8 px per frame, 20 px per unit
        fn new() -> Self {
            let mut zoom = ZoomContext::new();
            zoom.set_screen_size(800.0, 400.0);
            zoom.fit(0.0, 100.0, -10.0, 10.0);
            let mut curves = CurveSet::new();
            let curve = curves.add_curve(
                Curve::new("ramp")
                    .with_keyframes(&[(0.0, 0.0), (50.0, 5.0), (100.0, 0.0)], KeyframeType::Linear),
            );
            let mut timeline = Timeline::new(0, 100);
            timeline.seek(50);
            Self {
                zoom,
                curves,
                selection: KeySelection::new(),
                timeline,
                settings: CurveEditorSettings::default(),
                metrics: MonospaceMetrics::default(),
                curve,
            }
        }

        fn select(&mut self, indices: &[usize]) {
            self.selection.clear();
            let curve = self.curves.curve(self.curve).unwrap();
            for &i in indices {
                self.selection
                    .insert_conditionally(SelectedKey::new(&self.zoom, curve, i).unwrap());
            }
        }

        fn tester(&self) -> CurveHitTester<'_> {
            CurveHitTester::new(
                &self.zoom,
                &self.curves,
                &self.selection,
                &self.timeline,
                &self.settings,
                &self.metrics,
            )
        }
    }

    #[test]
    fn test_nearby_curve() {
        let f = Fixture::new();
        // (25, 2.5) sits at (200, 150)
        let hit = f.tester().is_nearby_curve(Pos2::new(200.0, 153.0)).unwrap();
        assert_eq!(hit.curve, f.curve);
        assert!((hit.x - 25.0).abs() < 1e-9);
        assert!((hit.y - 2.5).abs() < 1e-9);
        assert!(f.tester().is_nearby_curve(Pos2::new(200.0, 156.0)).is_none());
    }

    #[test]
    fn test_nearby_curve_falls_back_on_bad_expression() {
        let mut f = Fixture::new();
        f.curves.curve_mut(f.curve).unwrap().expression = Some(CurveExpression::Loop { first: 10, last: 5 });
        assert!(f.tester().is_nearby_curve(Pos2::new(200.0, 150.0)).is_some());
    }

    #[test]
    fn test_hidden_curves_are_ignored() {
        let mut f = Fixture::new();
        f.curves.curve_mut(f.curve).unwrap().visible = false;
        assert!(f.tester().is_nearby_curve(Pos2::new(200.0, 150.0)).is_none());
        assert!(f.tester().is_nearby_keyframe(Pos2::new(400.0, 100.0)).is_none());
    }

    #[test]
    fn test_nearby_keyframe_is_strict() {
        let f = Fixture::new();
        // Key (50, 5) sits at (400, 100)
        let hit = f.tester().is_nearby_keyframe(Pos2::new(404.0, 100.0)).unwrap();
        assert_eq!(hit.index, 1);
        assert_eq!(hit.prev.map(|k| k.time), Some(0.0));
        assert_eq!(hit.next.map(|k| k.time), Some(100.0));
        assert!(f.tester().is_nearby_keyframe(Pos2::new(405.0, 100.0)).is_none());
    }

    #[test]
    fn test_nearby_keyframe_periodic_neighbours() {
        let mut f = Fixture::new();
        f.curves.remove_curve(f.curve);
        let id = f.curves.add_curve(
            Curve::new("cycle")
                .with_keyframes(&[(0.0, 0.0), (10.0, 5.0), (15.0, -5.0)], KeyframeType::Linear)
                .with_period(0.0, 20.0),
        );
        let tester = f.tester();

        let (x, y) = (f.zoom.widget_x(15.0) as f32, f.zoom.widget_y(-5.0) as f32);
        let last = tester.is_nearby_keyframe(Pos2::new(x, y)).unwrap();
        assert_eq!(last.curve, id);
        assert_eq!(last.next.map(|k| k.time), Some(20.0));

        let (x, y) = (f.zoom.widget_x(0.0) as f32, f.zoom.widget_y(0.0) as f32);
        let first = tester.is_nearby_keyframe(Pos2::new(x, y)).unwrap();
        assert_eq!(first.prev.map(|k| k.time), Some(-5.0));
        assert_eq!(first.prev.map(|k| k.value), Some(-5.0));
    }

    #[test]
    fn test_keyframe_text_needs_single_selection() {
        let mut f = Fixture::new();
        assert!(f.tester().is_nearby_keyframe_text(Pos2::new(420.0, 110.0)).is_none());

        // "x: 50, y: 5" spans 77 px from (400, 104)
        f.select(&[1]);
        let hit = f.tester().is_nearby_keyframe_text(Pos2::new(470.0, 110.0)).unwrap();
        assert_eq!(hit.key.time, 50.0);
        assert!(f.tester().is_nearby_keyframe_text(Pos2::new(483.0, 110.0)).is_none());
        assert!(f.tester().is_nearby_keyframe_text(Pos2::new(420.0, 124.0)).is_none());

        f.select(&[1, 2]);
        assert!(f.tester().is_nearby_keyframe_text(Pos2::new(420.0, 110.0)).is_none());
    }

    #[test]
    fn test_no_labels_on_bezier_curves() {
        let mut f = Fixture::new();
        f.curves.curve_mut(f.curve).unwrap().kind = CurveKind::BezierControlPoint;
        f.select(&[1]);
        let tester = f.tester();
        assert!(tester.is_nearby_keyframe_text(Pos2::new(420.0, 110.0)).is_none());
        let left = f.zoom.to_widget_coordinates(f.selection.keys()[0].left_tangent);
        assert!(tester.is_nearby_tangent(left).is_none());
        assert!(tester.is_nearby_selected_tangent_text(left + egui::vec2(2.0, 8.0)).is_none());
    }

    #[test]
    fn test_nearby_tangent_and_text() {
        let mut f = Fixture::new();
        f.select(&[1]);
        let selected = f.selection.keys()[0];
        let left = f.zoom.to_widget_coordinates(selected.left_tangent);
        let right = f.zoom.to_widget_coordinates(selected.right_tangent);

        let tester = f.tester();
        let (side, key) = tester.is_nearby_tangent(left + egui::vec2(5.0, -5.0)).unwrap();
        assert_eq!(side, TangentSide::Left);
        assert_eq!(key.key.id, selected.key.id);
        assert_eq!(tester.is_nearby_tangent(right).map(|(s, _)| s), Some(TangentSide::Right));
        assert!(tester.is_nearby_tangent(right + egui::vec2(6.0, 0.0)).is_none());

        let (side, _) = tester
            .is_nearby_selected_tangent_text(right + egui::vec2(10.0, 10.0))
            .unwrap();
        assert_eq!(side, TangentSide::Right);
    }

    #[test]
    fn test_tangent_text_needs_single_selection() {
        let mut f = Fixture::new();
        f.select(&[1]);
        let right = f.zoom.to_widget_coordinates(f.selection.keys()[0].right_tangent);
        let label = right + egui::vec2(10.0, 10.0);
        assert!(f.tester().is_nearby_selected_tangent_text(label).is_some());

        f.select(&[1, 2]);
        let still_right = f.zoom.to_widget_coordinates(f.selection.keys()[0].right_tangent);
        assert_eq!(still_right, right);
        assert!(f.tester().is_nearby_selected_tangent_text(label).is_none());
    }

    #[test]
    fn test_derivative_label_rounding() {
        assert_eq!(derivative_label(TangentSide::Left, 0.12345, 3), "l: 0.123");
        assert_eq!(derivative_label(TangentSide::Right, 2.0, 3), "r: 2");
        assert_eq!(round_derivative(1.23456, 3), 1.235);
    }

    #[test]
    fn test_cross_widget() {
        let mut f = Fixture::new();
        f.select(&[1]);
        assert!(!f.tester().is_nearby_selected_keyframes_cross_widget(Pos2::new(400.0, 100.0)));

        // Box over (0, 0)..(50, 5), middle at (200, 150)
        f.select(&[0, 1]);
        let tester = f.tester();
        assert!(tester.is_nearby_selected_keyframes_cross_widget(Pos2::new(200.0, 150.0)));
        assert!(tester.is_nearby_selected_keyframes_cross_widget(Pos2::new(225.0, 150.0)));
        assert!(tester.is_nearby_selected_keyframes_cross_widget(Pos2::new(200.0, 126.0)));
        assert!(tester.is_nearby_selected_keyframes_cross_widget(Pos2::new(203.0, 174.0)));
        assert!(!tester.is_nearby_selected_keyframes_cross_widget(Pos2::new(226.0, 150.0)));
        assert!(!tester.is_nearby_selected_keyframes_cross_widget(Pos2::new(230.0, 180.0)));
    }

    #[test]
    fn test_bbox_handles() {
        let mut f = Fixture::new();
        assert!(f.tester().nearby_bbox_handle(Pos2::new(0.0, 100.0)).is_none());

        f.select(&[0, 1]);
        let tester = f.tester();
        assert!(tester.is_nearby_bbox_top_left(Pos2::new(3.0, 102.0)));
        assert!(tester.is_nearby_bbox_mid_left(Pos2::new(0.0, 150.0)));
        assert!(tester.is_nearby_bbox_btm_left(Pos2::new(0.0, 200.0)));
        assert!(tester.is_nearby_bbox_mid_btm(Pos2::new(200.0, 200.0)));
        assert!(tester.is_nearby_bbox_btm_right(Pos2::new(400.0, 200.0)));
        assert!(tester.is_nearby_bbox_mid_right(Pos2::new(400.0, 150.0)));
        assert!(tester.is_nearby_bbox_top_right(Pos2::new(405.0, 95.0)));
        assert!(tester.is_nearby_bbox_mid_top(Pos2::new(200.0, 100.0)));
        assert!(!tester.is_nearby_bbox_mid_top(Pos2::new(200.0, 106.0)));
        assert_eq!(tester.nearby_bbox_handle(Pos2::new(3.0, 102.0)), Some(BboxHandle::TopLeft));
        assert_eq!(tester.nearby_bbox_handle(Pos2::new(300.0, 150.0)), None);
    }

    #[test]
    fn test_timeline_polys() {
        let f = Fixture::new();
        let tester = f.tester();
        // Frame 50 is at x = 400; the view is 400 px tall
        assert!(tester.is_nearby_timeline_top_poly(Pos2::new(400.0, 2.0)));
        assert!(tester.is_nearby_timeline_btm_poly(Pos2::new(400.0, 397.0)));
        assert!(!tester.is_nearby_timeline_top_poly(Pos2::new(400.0, 200.0)));
        assert!(!tester.is_nearby_timeline_btm_poly(Pos2::new(400.0, 200.0)));
        assert!(!tester.is_nearby_timeline_top_poly(Pos2::new(420.0, 2.0)));
    }

    #[test]
    fn test_keyframes_within_rect() {
        let f = Fixture::new();
        let rect = ZoomRect { left: 40.0, right: 100.0, bottom: -1.0, top: 6.0 };
        let keys = f.tester().keyframes_within_rect(&rect);
        let times: Vec<f64> = keys.iter().map(|k| k.key.time).collect();
        assert_eq!(times, vec![50.0, 100.0]);
    }
}
