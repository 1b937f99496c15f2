// SPDX-License-Identifier: MIT OR Apache-2.0
//! Font metrics used to size label hit boxes.

use egui::{Color32, Context, FontId};

/// Measures rendered text
pub trait TextMetrics {
    /// Width in pixels of `text` on one line
    fn text_width(&self, text: &str) -> f64;
    /// Height in pixels of one line
    fn line_height(&self) -> f64;
}

/// Fixed-advance metrics, for headless use
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonospaceMetrics {
    /// Advance of every character
    pub char_width: f64,
    /// Line height
    pub line_height: f64,
}

impl MonospaceMetrics {
    /// Create metrics with the given advance and line height
    pub fn new(char_width: f64, line_height: f64) -> Self {
        Self { char_width, line_height }
    }
}

impl Default for MonospaceMetrics {
    fn default() -> Self {
        Self::new(7.0, 14.0)
    }
}

impl TextMetrics for MonospaceMetrics {
    fn text_width(&self, text: &str) -> f64 {
        self.char_width * text.chars().count() as f64
    }

    fn line_height(&self) -> f64 {
        self.line_height
    }
}

/// Metrics of an egui font
pub struct EguiTextMetrics<'a> {
    ctx: &'a Context,
    font: FontId,
}

impl<'a> EguiTextMetrics<'a> {
    /// Measure with `font` in `ctx`
    pub fn new(ctx: &'a Context, font: FontId) -> Self {
        Self { ctx, font }
    }
}

impl TextMetrics for EguiTextMetrics<'_> {
    fn text_width(&self, text: &str) -> f64 {
        let galley = self
            .ctx
            .fonts(|fonts| fonts.layout_no_wrap(text.to_owned(), self.font.clone(), Color32::WHITE));
        f64::from(galley.size().x)
    }

    fn line_height(&self) -> f64 {
        f64::from(self.ctx.fonts(|fonts| fonts.row_height(&self.font)))
    }
}
