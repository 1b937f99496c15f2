// SPDX-License-Identifier: MIT OR Apache-2.0
//! Curve model errors.

use crate::curve::CurveId;
use thiserror::Error;

/// Errors raised by curve evaluation and editing
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CurveError {
    /// The curve expression could not be evaluated
    #[error("Expression evaluation failed: {0}")]
    Expression(String),

    /// Evaluation produced NaN or infinity
    #[error("Curve evaluation at {time} is not finite")]
    NonFinite {
        /// Time the curve was evaluated at
        time: f64,
    },

    /// No curve with this ID in the set
    #[error("Unknown curve {0:?}")]
    UnknownCurve(CurveId),

    /// The keyframe does not belong to the curve
    #[error("Keyframe not found")]
    KeyFrameNotFound,

    /// Another keyframe already sits at this time
    #[error("A keyframe already exists at time {time}")]
    TimeOccupied {
        /// Requested time
        time: f64,
    },

    /// A value lies outside the curve's allowed range
    #[error("Value {value} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Offending value
        value: f64,
        /// Lower bound
        min: f64,
        /// Upper bound
        max: f64,
    },

    /// The curve only takes keys at integer times
    #[error("{curve} doesn't support time values that are not integers")]
    NonIntegerTimes {
        /// Curve name
        curve: String,
    },

    /// Plain-text import or export failed
    #[error("Curve exchange failed: {0}")]
    Ascii(String),
}

/// Result type for curve operations
pub type Result<T> = std::result::Result<T, CurveError>;
