// SPDX-License-Identifier: MIT OR Apache-2.0
//! Current frame indicator.

use crate::zoom::{ZoomContext, ZoomPoint};
use egui::Pos2;

/// Current frame and the frame range it may move in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeline {
    current_frame: i32,
    /// First frame of the range
    pub first_frame: i32,
    /// Last frame of the range
    pub last_frame: i32,
}

impl Timeline {
    /// Create a timeline over `[first_frame, last_frame]`, positioned on the first frame
    pub fn new(first_frame: i32, last_frame: i32) -> Self {
        let (first_frame, last_frame) = (first_frame.min(last_frame), first_frame.max(last_frame));
        Self {
            current_frame: first_frame,
            first_frame,
            last_frame,
        }
    }

    /// Current frame
    pub fn current_frame(&self) -> i32 {
        self.current_frame
    }

    /// Move to a frame, clamped to the range
    pub fn seek(&mut self, frame: i32) {
        self.current_frame = frame.clamp(self.first_frame, self.last_frame);
    }

    /// Marker triangles for the current frame in this view
    pub fn markers(&self, zoom: &ZoomContext, cursor_width: f64, cursor_height: f64) -> TimelineMarkers {
        TimelineMarkers::new(zoom, f64::from(self.current_frame), cursor_width, cursor_height)
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new(1, 250)
    }
}

/// The two triangles marking the current frame at the top and bottom of the view.
///
/// Each triangle has its base on the view edge, `cursor_width` pixels wide,
/// and its apex `cursor_height` pixels inside. Vertices are in zoom
/// coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelineMarkers {
    /// Apex, then base left and base right of the top marker
    pub top: [ZoomPoint; 3],
    /// Apex, then base left and base right of the bottom marker
    pub bottom: [ZoomPoint; 3],
}

impl TimelineMarkers {
    /// Compute both markers for `frame`
    pub fn new(zoom: &ZoomContext, frame: f64, cursor_width: f64, cursor_height: f64) -> Self {
        let wx = zoom.widget_x(frame);
        let btm_wy = zoom.screen_height() - 1.0;
        let top_wy = 0.0;
        let half = cursor_width / 2.0;
        let at = |x: f64, y: f64| ZoomPoint::new(zoom.zoom_x(x), zoom.zoom_y(y));

        Self {
            top: [
                at(wx, top_wy + cursor_height),
                at(wx - half, top_wy),
                at(wx + half, top_wy),
            ],
            bottom: [
                at(wx, btm_wy - cursor_height),
                at(wx - half, btm_wy),
                at(wx + half, btm_wy),
            ],
        }
    }

    /// Top marker in widget coordinates
    pub fn top_widget(&self, zoom: &ZoomContext) -> Vec<Pos2> {
        self.top.iter().map(|p| zoom.to_widget_coordinates(*p)).collect()
    }

    /// Bottom marker in widget coordinates
    pub fn bottom_widget(&self, zoom: &ZoomContext) -> Vec<Pos2> {
        self.bottom.iter().map(|p| zoom.to_widget_coordinates(*p)).collect()
    }
}

/// Even-odd point in polygon test
pub fn polygon_contains(polygon: &[ZoomPoint], p: ZoomPoint) -> bool {
    let mut inside = false;
    let n = polygon.len();
    if n < 3 {
        return false;
    }
    let mut j = n - 1;
    for i in 0..n {
        let (a, b) = (polygon[i], polygon[j]);
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}
