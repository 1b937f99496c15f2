// SPDX-License-Identifier: MIT OR Apache-2.0
//! Curve editor view for the Natron curve editor.
//!
//! This crate provides everything between the curve model and the screen:
//! - Zoom context mapping curve units to widget pixels
//! - Axis tick placement and label fading
//! - Hit-testing of curves, keys, tangents, labels, bbox handles and timeline markers
//! - The drag-state machine and the editing actions it drives
//! - An egui panel painting the view and feeding it pointer input
//!
//! ## Architecture
//!
//! The view is built on:
//! - Pure functions for tick placement
//! - Borrowing probes ([`CurveHitTester`]) that never mutate
//! - A single owner of mutable state ([`CurveEditorState`])
//! - A [`TextMetrics`] seam so hit-testing runs without a GUI context

pub mod error;
pub mod hit_test;
pub mod interaction;
pub mod selection;
pub mod settings;
pub mod text;
pub mod ticks;
pub mod timeline;
pub mod ui;
pub mod zoom;

pub use error::{EditorError, Result};
pub use hit_test::{CurveHit, CurveHitTester, KeyFrameHit};
pub use interaction::{
    CurveEditorState, CursorShape, DoubleClickOutcome, DragOrientation, EventState, MouseButtons, PressOutcome,
    PressTarget,
};
pub use selection::{BboxHandle, KeySelection, SelectedKey, TangentSide};
pub use settings::CurveEditorSettings;
pub use text::{EguiTextMetrics, MonospaceMetrics, TextMetrics};
pub use ticks::{scale_ticks, ticks, ticks_alpha, ticks_bounds, ticks_fill, ticks_size, ScaleTick, Tick};
pub use timeline::{Timeline, TimelineMarkers};
pub use ui::CurveEditorPanel;
pub use zoom::{ZoomContext, ZoomPoint, ZoomRect};
