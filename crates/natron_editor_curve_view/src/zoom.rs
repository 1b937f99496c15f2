// SPDX-License-Identifier: MIT OR Apache-2.0
//! Mapping between zoom coordinates and widget pixels.
//!
//! Zoom coordinates are curve units (time on x, value on y, y up). Widget
//! coordinates are pixels relative to the view's top-left corner (y down).

use egui::Pos2;
use serde::{Deserialize, Serialize};

/// Smallest allowed zoom factor and pixel aspect ratio
pub const MIN_ZOOM: f64 = 0.0001;
/// Largest allowed zoom factor and pixel aspect ratio
pub const MAX_ZOOM: f64 = 10000.0;

/// A point in zoom coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ZoomPoint {
    /// Time
    pub x: f64,
    /// Value
    pub y: f64,
}

impl ZoomPoint {
    /// Create a point
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: ZoomPoint) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl std::ops::Sub for ZoomPoint {
    type Output = ZoomPoint;

    fn sub(self, rhs: ZoomPoint) -> ZoomPoint {
        ZoomPoint::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::ops::Add for ZoomPoint {
    type Output = ZoomPoint;

    fn add(self, rhs: ZoomPoint) -> ZoomPoint {
        ZoomPoint::new(self.x + rhs.x, self.y + rhs.y)
    }
}

/// An axis-aligned rectangle in zoom coordinates, `top >= bottom`
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ZoomRect {
    /// Smallest x
    pub left: f64,
    /// Largest x
    pub right: f64,
    /// Smallest y
    pub bottom: f64,
    /// Largest y
    pub top: f64,
}

impl ZoomRect {
    /// Rectangle spanned by two corners in any order
    pub fn from_corners(a: ZoomPoint, b: ZoomPoint) -> Self {
        Self {
            left: a.x.min(b.x),
            right: a.x.max(b.x),
            bottom: a.y.min(b.y),
            top: a.y.max(b.y),
        }
    }

    /// Horizontal middle
    pub fn mid_x(&self) -> f64 {
        (self.left + self.right) / 2.0
    }

    /// Vertical middle
    pub fn mid_y(&self) -> f64 {
        (self.bottom + self.top) / 2.0
    }

    /// Center point
    pub fn center(&self) -> ZoomPoint {
        ZoomPoint::new(self.mid_x(), self.mid_y())
    }

    /// Width
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    /// Height
    pub fn height(&self) -> f64 {
        self.top - self.bottom
    }

    /// Whether a point lies inside, bounds inclusive
    pub fn contains(&self, p: ZoomPoint) -> bool {
        p.x >= self.left && p.x <= self.right && p.y >= self.bottom && p.y <= self.top
    }
}

/// Affine mapping between zoom and widget coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomContext {
    left: f64,
    bottom: f64,
    factor: f64,
    par: f64,
    screen_width: f64,
    screen_height: f64,
}

impl ZoomContext {
    /// Identity-like mapping on a 1x1 screen
    pub fn new() -> Self {
        Self {
            left: 0.0,
            bottom: 0.0,
            factor: 1.0,
            par: 1.0,
            screen_width: 1.0,
            screen_height: 1.0,
        }
    }

    /// Left edge of the visible area
    pub fn left(&self) -> f64 {
        self.left
    }

    /// Bottom edge of the visible area
    pub fn bottom(&self) -> f64 {
        self.bottom
    }

    /// Right edge of the visible area
    pub fn right(&self) -> f64 {
        self.left + self.screen_width / (self.factor * self.par)
    }

    /// Top edge of the visible area
    pub fn top(&self) -> f64 {
        self.bottom + self.screen_height / self.factor
    }

    /// Vertical pixels per unit
    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// Horizontal to vertical pixel ratio
    pub fn aspect_ratio(&self) -> f64 {
        self.par
    }

    /// Screen width in pixels
    pub fn screen_width(&self) -> f64 {
        self.screen_width
    }

    /// Screen height in pixels
    pub fn screen_height(&self) -> f64 {
        self.screen_height
    }

    /// The visible area
    pub fn visible_rect(&self) -> ZoomRect {
        ZoomRect {
            left: self.left,
            right: self.right(),
            bottom: self.bottom,
            top: self.top(),
        }
    }

    /// Resize the screen, keeping the bottom-left corner
    pub fn set_screen_size(&mut self, width: f64, height: f64) {
        self.screen_width = width.max(1.0);
        self.screen_height = height.max(1.0);
    }

    /// Zoom x for a widget x
    pub fn zoom_x(&self, wx: f64) -> f64 {
        (self.right() - self.left) * wx / self.screen_width + self.left
    }

    /// Zoom y for a widget y
    pub fn zoom_y(&self, wy: f64) -> f64 {
        let top = self.top();
        (self.bottom - top) * wy / self.screen_height + top
    }

    /// Widget x for a zoom x
    pub fn widget_x(&self, zx: f64) -> f64 {
        (zx - self.left) / (self.right() - self.left) * self.screen_width
    }

    /// Widget y for a zoom y
    pub fn widget_y(&self, zy: f64) -> f64 {
        let top = self.top();
        (zy - top) / (self.bottom - top) * self.screen_height
    }

    /// Convert a widget point to zoom coordinates
    pub fn to_zoom_coordinates(&self, widget: Pos2) -> ZoomPoint {
        ZoomPoint::new(self.zoom_x(f64::from(widget.x)), self.zoom_y(f64::from(widget.y)))
    }

    /// Convert a zoom point to widget coordinates
    pub fn to_widget_coordinates(&self, zoom: ZoomPoint) -> Pos2 {
        Pos2::new(self.widget_x(zoom.x) as f32, self.widget_y(zoom.y) as f32)
    }

    /// Pan by a zoom-space offset
    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.left += dx;
        self.bottom += dy;
    }

    /// Zoom both axes about `center`
    pub fn zoom(&mut self, center: ZoomPoint, scale: f64) {
        let scale = Self::clamp_scale(self.factor, scale);
        self.left = center.x - (center.x - self.left) / scale;
        self.bottom = center.y - (center.y - self.bottom) / scale;
        self.factor = (self.factor * scale).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// Zoom the horizontal axis about `center_x`
    pub fn zoomx(&mut self, center_x: f64, scale: f64) {
        let scale = Self::clamp_scale(self.par, scale);
        self.left = center_x - (center_x - self.left) / scale;
        self.par = (self.par * scale).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// Zoom the vertical axis about `center_y`
    pub fn zoomy(&mut self, center_y: f64, scale: f64) {
        let scale = Self::clamp_scale(self.factor, scale);
        let scale = 1.0 / Self::clamp_scale(self.par, 1.0 / scale);
        self.bottom = center_y - (center_y - self.bottom) / scale;
        self.factor = (self.factor * scale).clamp(MIN_ZOOM, MAX_ZOOM);
        self.par = (self.par / scale).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// Show exactly the given rectangle
    pub fn fit(&mut self, left: f64, right: f64, bottom: f64, top: f64) {
        if right <= left || top <= bottom {
            return;
        }
        self.left = left;
        self.bottom = bottom;
        self.factor = self.screen_height / (top - bottom);
        self.par = self.screen_width * (top - bottom) / (self.screen_height * (right - left));
    }

    /// Reduce `scale` so that `value * scale` stays within the zoom limits
    fn clamp_scale(value: f64, scale: f64) -> f64 {
        if !scale.is_finite() || scale <= 0.0 {
            return 1.0;
        }
        let target = (value * scale).clamp(MIN_ZOOM, MAX_ZOOM);
        target / value
    }
}

impl Default for ZoomContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> ZoomContext {
        let mut zoom = ZoomContext::new();
        zoom.set_screen_size(800.0, 600.0);
        zoom.fit(-10.0, 500.0, -10.0, 10.0);
        zoom
    }

    fn assert_round_trip(zoom: &ZoomContext) {
        for &(x, y) in &[(0.0, 0.0), (123.0, 456.0), (799.0, 1.0), (400.5, 300.25)] {
            let p = Pos2::new(x, y);
            let back = zoom.to_widget_coordinates(zoom.to_zoom_coordinates(p));
            assert!((back.x - p.x).abs() < 1e-3, "{back:?} != {p:?}");
            assert!((back.y - p.y).abs() < 1e-3, "{back:?} != {p:?}");
        }
    }

    #[test]
    fn test_fit_shows_rect() {
        let zoom = context();
        assert!((zoom.left() + 10.0).abs() < 1e-9);
        assert!((zoom.right() - 500.0).abs() < 1e-9);
        assert!((zoom.top() - 10.0).abs() < 1e-9);
        assert!((zoom.bottom() + 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_widget_y_points_down() {
        let zoom = context();
        assert!(zoom.widget_y(10.0).abs() < 1e-9);
        assert!((zoom.widget_y(-10.0) - 600.0).abs() < 1e-9);
        assert!(zoom.widget_x(0.0) > zoom.widget_x(-5.0));
    }

    #[test]
    fn test_round_trip_after_gestures() {
        let mut zoom = context();
        assert_round_trip(&zoom);

        zoom.translate(37.5, -2.0);
        assert_round_trip(&zoom);

        zoom.zoom(ZoomPoint::new(100.0, 0.0), 1.7);
        assert_round_trip(&zoom);

        zoom.zoomx(250.0, 0.3);
        assert_round_trip(&zoom);

        zoom.zoomy(3.0, 4.0);
        assert_round_trip(&zoom);
    }

    #[test]
    fn test_zoom_keeps_center_fixed() {
        let mut zoom = context();
        let center = ZoomPoint::new(120.0, 2.5);
        let before = zoom.to_widget_coordinates(center);
        zoom.zoom(center, 2.0);
        let after = zoom.to_widget_coordinates(center);
        assert!((before.x - after.x).abs() < 1e-3);
        assert!((before.y - after.y).abs() < 1e-3);
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut zoom = ZoomContext::new();
        zoom.zoom(ZoomPoint::default(), 1e9);
        assert!(zoom.factor() <= MAX_ZOOM);
        zoom.zoom(ZoomPoint::default(), 1e-12);
        assert!(zoom.factor() >= MIN_ZOOM);
        zoom.zoomx(0.0, 1e9);
        assert!(zoom.aspect_ratio() <= MAX_ZOOM);
    }
}
