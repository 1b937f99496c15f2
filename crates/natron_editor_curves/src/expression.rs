// SPDX-License-Identifier: MIT OR Apache-2.0
//! Built-in curve expressions.

use crate::error::{CurveError, Result};
use serde::{Deserialize, Serialize};

/// Expression layered on top of a curve's keyframes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CurveExpression {
    /// Repeat the frames `first..=last` forever
    Loop {
        /// First looped frame
        first: i32,
        /// Last looped frame
        last: i32,
    },
    /// Mirror values around zero
    Negate,
    /// Play the curve backwards in time
    Reverse,
}

impl CurveExpression {
    /// Get the display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Loop { .. } => "Loop",
            Self::Negate => "Negate",
            Self::Reverse => "Reverse",
        }
    }

    /// Evaluate the expression at `time`, sampling the raw curve through `raw`
    pub fn evaluate<F>(&self, time: f64, raw: F) -> Result<f64>
    where
        F: Fn(f64) -> Result<f64>,
    {
        match *self {
            Self::Loop { first, last } => {
                let length = f64::from(last) - f64::from(first) + 1.0;
                if length <= 0.0 {
                    return Err(CurveError::Expression(format!(
                        "loop range {first}..{last} is empty"
                    )));
                }
                let first = f64::from(first);
                raw((time - first).rem_euclid(length) + first)
            }
            Self::Negate => raw(time).map(|v| -v),
            Self::Reverse => raw(-time),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(t: f64) -> Result<f64> {
        Ok(t)
    }

    #[test]
    fn test_loop_wraps_time() {
        let expr = CurveExpression::Loop { first: 10, last: 19 };
        assert_eq!(expr.evaluate(10.0, identity).unwrap(), 10.0);
        assert_eq!(expr.evaluate(20.0, identity).unwrap(), 10.0);
        assert_eq!(expr.evaluate(25.0, identity).unwrap(), 15.0);
        assert_eq!(expr.evaluate(5.0, identity).unwrap(), 15.0);
    }

    #[test]
    fn test_empty_loop_fails() {
        let expr = CurveExpression::Loop { first: 10, last: 5 };
        assert!(matches!(expr.evaluate(0.0, identity), Err(CurveError::Expression(_))));
    }

    #[test]
    fn test_negate_and_reverse() {
        assert_eq!(CurveExpression::Negate.evaluate(3.0, identity).unwrap(), -3.0);
        assert_eq!(CurveExpression::Reverse.evaluate(3.0, identity).unwrap(), -3.0);
        assert_eq!(CurveExpression::Reverse.evaluate(3.0, |t| Ok(t * 2.0)).unwrap(), -6.0);
    }
}
