// SPDX-License-Identifier: MIT OR Apache-2.0
//! Keyframe definitions for animation curves.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a keyframe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyFrameId(pub Uuid);

impl KeyFrameId {
    /// Create a new random keyframe ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for KeyFrameId {
    fn default() -> Self {
        Self::new()
    }
}

/// Interpolation kind of a keyframe
///
/// Every kind except `Free` and `Broken` recomputes its derivatives from the
/// neighbouring keys whenever the curve changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Default)]
pub enum KeyframeType {
    /// Hold the value until the next key
    Constant,
    /// Straight segments
    Linear,
    /// Catmull-Rom, flattened at local extrema
    #[default]
    Smooth,
    /// Catmull-Rom spline
    CatmullRom,
    /// Cubic spline
    Cubic,
    /// Flat tangents
    Horizontal,
    /// User-set derivatives, equal on both sides
    Free,
    /// User-set derivatives, independent on each side
    Broken,
}

impl KeyframeType {
    /// Get the display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Constant => "Constant",
            Self::Linear => "Linear",
            Self::Smooth => "Smooth",
            Self::CatmullRom => "Catmull-Rom",
            Self::Cubic => "Cubic",
            Self::Horizontal => "Horizontal",
            Self::Free => "Free",
            Self::Broken => "Break",
        }
    }

    /// All interpolation kinds in menu order
    pub fn all() -> &'static [KeyframeType] {
        &[
            Self::Constant,
            Self::Linear,
            Self::Smooth,
            Self::CatmullRom,
            Self::Cubic,
            Self::Horizontal,
            Self::Free,
            Self::Broken,
        ]
    }

    /// Whether the derivatives are computed from the neighbours
    pub fn is_automatic(&self) -> bool {
        !matches!(self, Self::Free | Self::Broken)
    }
}

/// A keyframe on a curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeyFrame {
    /// Unique keyframe ID
    pub id: KeyFrameId,
    /// Time of the key
    pub time: f64,
    /// Value at this key
    pub value: f64,
    /// Derivative of the incoming segment, in value units per time unit
    pub left_derivative: f64,
    /// Derivative of the outgoing segment, in value units per time unit
    pub right_derivative: f64,
    /// Interpolation kind
    pub interpolation: KeyframeType,
}

impl KeyFrame {
    /// Create a new keyframe with flat derivatives
    pub fn new(time: f64, value: f64) -> Self {
        Self {
            id: KeyFrameId::new(),
            time,
            value,
            left_derivative: 0.0,
            right_derivative: 0.0,
            interpolation: KeyframeType::default(),
        }
    }

    /// Set interpolation kind
    pub fn with_interpolation(mut self, kind: KeyframeType) -> Self {
        self.interpolation = kind;
        self
    }

    /// Set both derivatives
    pub fn with_derivatives(mut self, left: f64, right: f64) -> Self {
        self.left_derivative = left;
        self.right_derivative = right;
        self
    }

    /// Copy of this key moved in time by `offset`, same ID
    pub fn shifted(&self, offset: f64) -> Self {
        Self {
            time: self.time + offset,
            ..*self
        }
    }
}

/// Interpolation utilities
pub struct Interpolation;

impl Interpolation {
    /// Linear interpolation between two values
    pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
        a + (b - a) * t
    }

    /// Hermite spline interpolation on the unit interval
    pub fn hermite(p0: f64, m0: f64, p1: f64, m1: f64, t: f64) -> f64 {
        let t2 = t * t;
        let t3 = t2 * t;

        let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
        let h10 = t3 - 2.0 * t2 + t;
        let h01 = -2.0 * t3 + 3.0 * t2;
        let h11 = t3 - t2;

        h00 * p0 + h10 * m0 + h01 * p1 + h11 * m1
    }

    /// Evaluate the segment between `cur` and `next` at absolute time `time`
    pub fn segment(cur: &KeyFrame, next: &KeyFrame, time: f64) -> f64 {
        let span = next.time - cur.time;
        if span <= 0.0 {
            return next.value;
        }
        let t = (time - cur.time) / span;

        if cur.interpolation == KeyframeType::Constant {
            return if t < 1.0 { cur.value } else { next.value };
        }

        // Derivatives are per time unit; the unit interval needs them scaled by the span.
        Self::hermite(
            cur.value,
            cur.right_derivative * span,
            next.value,
            next.left_derivative * span,
            t,
        )
    }

    /// Compute `(left, right)` derivatives for an automatic keyframe kind.
    ///
    /// `prev`/`next` are `(time, value)` of the neighbours, already shifted by
    /// the period for wrapped neighbours. Returns `None` for `Free` and `Broken`.
    pub fn auto_derivatives(
        kind: KeyframeType,
        prev: Option<(f64, f64)>,
        cur: (f64, f64),
        next: Option<(f64, f64)>,
    ) -> Option<(f64, f64)> {
        let (tc, vc) = cur;
        let secant = |(ta, va): (f64, f64), (tb, vb): (f64, f64)| {
            if (tb - ta).abs() > f64::EPSILON {
                (vb - va) / (tb - ta)
            } else {
                0.0
            }
        };
        let left_secant = prev.map(|p| secant(p, cur));
        let right_secant = next.map(|n| secant(cur, n));

        let derivatives = match kind {
            KeyframeType::Free | KeyframeType::Broken => return None,
            KeyframeType::Constant | KeyframeType::Horizontal => (0.0, 0.0),
            KeyframeType::Linear => match (left_secant, right_secant) {
                (Some(l), Some(r)) => (l, r),
                (Some(d), None) | (None, Some(d)) => (d, d),
                (None, None) => (0.0, 0.0),
            },
            KeyframeType::CatmullRom | KeyframeType::Smooth | KeyframeType::Cubic => {
                let d = match (prev, next) {
                    (Some(p), Some(n)) => {
                        let is_extremum = (vc - p.1) * (n.1 - vc) <= 0.0;
                        if kind == KeyframeType::Smooth && is_extremum {
                            0.0
                        } else if kind == KeyframeType::Cubic {
                            let hp = tc - p.0;
                            let hn = n.0 - tc;
                            let sp = left_secant.unwrap_or(0.0);
                            let sn = right_secant.unwrap_or(0.0);
                            if hp + hn > 0.0 {
                                (hn * sp + hp * sn) / (hp + hn)
                            } else {
                                0.0
                            }
                        } else {
                            secant(p, n)
                        }
                    }
                    (Some(_), None) => left_secant.unwrap_or(0.0),
                    (None, Some(_)) => right_secant.unwrap_or(0.0),
                    (None, None) => 0.0,
                };
                (d, d)
            }
        };

        Some(derivatives)
    }
}
