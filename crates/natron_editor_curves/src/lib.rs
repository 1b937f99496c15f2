// SPDX-License-Identifier: MIT OR Apache-2.0
//! Animation curve model for the Natron curve editor.
//!
//! This crate provides the data the curve editor works on:
//! - Keyframes with per-side derivatives
//! - Interpolation kinds (constant, linear, smooth, Catmull-Rom, cubic, ...)
//! - Periodic curves with wrap-around neighbours
//! - Built-in curve expressions (loop, negate, reverse)
//! - A curve registry indexed by stable IDs
//! - Plain-text export and import of sampled curves
//!
//! ## Architecture
//!
//! Curves own their keyframes sorted by time. The editor never holds
//! references into a curve; it stores `CurveId`/`KeyFrameId` pairs and looks
//! the data up again in a [`CurveSet`] whenever it needs it.

pub mod ascii;
pub mod curve;
pub mod curve_set;
pub mod error;
pub mod expression;
pub mod keyframe;

pub use ascii::{export_ascii, import_ascii, AsciiSampling};
pub use curve::{Curve, CurveId, CurveKind, ValueKind};
pub use curve_set::CurveSet;
pub use error::{CurveError, Result};
pub use expression::CurveExpression;
pub use keyframe::{Interpolation, KeyFrame, KeyFrameId, KeyframeType};
