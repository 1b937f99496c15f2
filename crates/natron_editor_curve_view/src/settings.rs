// SPDX-License-Identifier: MIT OR Apache-2.0
//! Curve editor settings, stored as RON.

use crate::zoom::ZoomRect;
use egui::Color32;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Current settings format version
pub const SETTINGS_FORMAT_VERSION: u32 = 1;

/// Largest accepted `ticks_max`, leaving room for the origin class of `10 * ticks_max`
pub const MAX_TICKS_MAX: i32 = i32::MAX / 10;

/// Tunables of the curve editor view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurveEditorSettings {
    /// Format version
    pub version: u32,
    /// Pixel distance under which the pointer is "nearby" an object
    pub click_tolerance: f64,
    /// Base width of the timeline marker triangles, in pixels
    pub cursor_width: f64,
    /// Height of the timeline marker triangles, in pixels
    pub cursor_height: f64,
    /// Half size of the drawn bounding box handles, in pixels
    pub bbox_handle_size: f64,
    /// Half length of the selection cross arms, in pixels
    pub cross_half_size: f64,
    /// Vertical gap between a point and its label, in pixels
    pub label_offset: f64,
    /// Decimal digits shown for derivatives
    pub derivative_precision: u32,
    /// Pointer travel that locks a constrained drag to one axis, in pixels
    pub drag_orientation_threshold: f64,
    /// On-screen tick spacing at which gridlines start to fade in
    pub min_tick_size_px: f64,
    /// On-screen tick spacing at which gridlines are fully opaque
    pub max_tick_size_px: f64,
    /// Largest tick size class before the next decade
    pub ticks_max: i32,
    /// Zoom multiplier per wheel unit
    pub wheel_zoom_per_delta: f64,
    /// Area shown initially and after a frame on nothing
    pub default_view: ZoomRect,
    /// Label font size in points
    pub font_size: f32,
    /// Background color
    pub background_color: [u8; 4],
    /// Gridline color
    pub grid_color: [u8; 4],
    /// Scale label color
    pub scale_color: [u8; 4],
    /// Fill color of selected keyframes
    pub selected_key_color: [u8; 4],
    /// Current frame indicator color
    pub timeline_color: [u8; 4],
    /// Selection bounding box color
    pub bbox_color: [u8; 4],
    /// Rubber band fill color
    pub selection_rect_color: [u8; 4],
}

impl Default for CurveEditorSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_FORMAT_VERSION,
            click_tolerance: 5.0,
            cursor_width: 15.0,
            cursor_height: 8.0,
            bbox_handle_size: 4.0,
            cross_half_size: 20.0,
            label_offset: 4.0,
            derivative_precision: 3,
            drag_orientation_threshold: 5.0,
            min_tick_size_px: 5.0,
            max_tick_size_px: 1000.0,
            ticks_max: 1000,
            wheel_zoom_per_delta: 1.00152,
            default_view: ZoomRect {
                left: -10.0,
                right: 500.0,
                bottom: -10.0,
                top: 10.0,
            },
            font_size: 11.0,
            background_color: [20, 20, 20, 255],
            grid_color: [128, 128, 128, 255],
            scale_color: [182, 182, 182, 255],
            selected_key_color: [255, 200, 100, 255],
            timeline_color: [195, 73, 73, 255],
            bbox_color: [128, 128, 128, 255],
            selection_rect_color: [77, 77, 77, 77],
        }
    }
}

impl CurveEditorSettings {
    /// Load settings from a RON file
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: CurveEditorSettings = ron::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;

        if settings.version > SETTINGS_FORMAT_VERSION {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!(
                    "Settings version {} is newer than supported version {}",
                    settings.version, SETTINGS_FORMAT_VERSION
                ),
            ));
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Whether the tick spacing tunables describe a usable scale
    pub fn has_valid_ticks(&self) -> bool {
        self.min_tick_size_px.is_finite()
            && self.min_tick_size_px > 0.0
            && self.max_tick_size_px.is_finite()
            && self.max_tick_size_px > self.min_tick_size_px
            && (1..=MAX_TICKS_MAX).contains(&self.ticks_max)
    }

    /// Reject values the view cannot work with
    pub fn validate(&self) -> std::io::Result<()> {
        let invalid = |msg: String| Err(std::io::Error::new(std::io::ErrorKind::InvalidData, msg));

        if !(self.min_tick_size_px > 0.0) || !self.min_tick_size_px.is_finite() {
            return invalid(format!("min_tick_size_px must be positive, got {}", self.min_tick_size_px));
        }
        if !(self.max_tick_size_px > self.min_tick_size_px) || !self.max_tick_size_px.is_finite() {
            return invalid(format!(
                "max_tick_size_px ({}) must exceed min_tick_size_px ({})",
                self.max_tick_size_px, self.min_tick_size_px
            ));
        }
        if !(1..=MAX_TICKS_MAX).contains(&self.ticks_max) {
            return invalid(format!("ticks_max must be in 1..={MAX_TICKS_MAX}, got {}", self.ticks_max));
        }
        if !(self.click_tolerance >= 0.0) || !self.click_tolerance.is_finite() {
            return invalid(format!("click_tolerance must not be negative, got {}", self.click_tolerance));
        }
        Ok(())
    }

    /// Save settings to a RON file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let config = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);

        let content = ron::ser::to_string_pretty(self, config).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;

        std::fs::write(path, content)
    }

    /// Convert a stored color
    pub fn color(rgba: [u8; 4]) -> Color32 {
        Color32::from_rgba_unmultiplied(rgba[0], rgba[1], rgba[2], rgba[3])
    }
}
