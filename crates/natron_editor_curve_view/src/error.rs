// SPDX-License-Identifier: MIT OR Apache-2.0
//! Curve editor errors.

use natron_editor_curves::CurveError;
use thiserror::Error;

/// Errors raised by editor actions
#[derive(Debug, Error)]
pub enum EditorError {
    /// A curve edit failed
    #[error(transparent)]
    Curve(#[from] CurveError),

    /// The action needs a selected curve
    #[error("No curve selected")]
    NoCurveSelected,

    /// Nothing was copied yet
    #[error("Clipboard is empty")]
    EmptyClipboard,

    /// Settings file access failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for editor actions
pub type Result<T> = std::result::Result<T, EditorError>;
