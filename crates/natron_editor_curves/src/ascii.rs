// SPDX-License-Identifier: MIT OR Apache-2.0
//! Plain-text curve exchange.
//!
//! One line per sample, one `_`-separated column per curve. Export samples
//! the curves at a fixed time step; import turns every row into a linear
//! key, starting at a given time and advancing by the same step.

use crate::curve::{Curve, CurveId};
use crate::error::{CurveError, Result};
use crate::keyframe::{KeyFrame, KeyframeType};

/// Column separator
pub const ASCII_SEPARATOR: char = '_';

/// Upper bound on exported rows
pub const MAX_ASCII_ROWS: usize = 1_000_000;

/// Decimals written per value
const ASCII_PRECISION: usize = 10;

/// Time sampling of an exchange
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AsciiSampling {
    /// Time of the first row
    pub start: f64,
    /// Last exported time, inclusive. Unused on import.
    pub end: f64,
    /// Time step between rows
    pub increment: f64,
}

impl AsciiSampling {
    /// Sampling from `start` to `end` every `increment`
    pub fn new(start: f64, end: f64, increment: f64) -> Self {
        Self { start, end, increment }
    }

    fn check(&self, curves: &[(usize, &Curve)], check_end: bool) -> Result<()> {
        if curves.is_empty() {
            return Err(CurveError::Ascii("no curve to exchange".to_string()));
        }
        if !(self.increment > 0.0) || !self.increment.is_finite() || !self.start.is_finite() {
            return Err(CurveError::Ascii(format!("invalid time step {}", self.increment)));
        }
        if check_end && (!self.end.is_finite() || self.end < self.start) {
            return Err(CurveError::Ascii(format!("end {} is before start {}", self.end, self.start)));
        }

        let is_integer = |v: f64| v.floor() == v;
        let integral = is_integer(self.start) && is_integer(self.increment) && (!check_end || is_integer(self.end));
        if let Some((_, curve)) = curves
            .iter()
            .find(|(_, curve)| curve.time_clamped_to_integers && !integral)
        {
            return Err(CurveError::NonIntegerTimes {
                curve: curve.name.clone(),
            });
        }

        for (i, (column, curve)) in curves.iter().enumerate() {
            if curves[..i].iter().any(|(other, c)| other == column || c.id == curve.id) {
                return Err(CurveError::Ascii(format!("column {column} is mapped twice")));
            }
        }
        Ok(())
    }

    fn rows(&self) -> Result<usize> {
        let rows = ((self.end - self.start) / self.increment + 1e-9).floor() + 1.0;
        if rows > MAX_ASCII_ROWS as f64 {
            return Err(CurveError::Ascii(format!("{rows} rows exceed the limit of {MAX_ASCII_ROWS}")));
        }
        Ok(rows as usize)
    }
}

/// Sample `curves` into text. Each curve is written in its column; columns
/// no curve maps to are written as `0`.
pub fn export_ascii(curves: &[(usize, &Curve)], sampling: &AsciiSampling) -> Result<String> {
    sampling.check(curves, true)?;
    let rows = sampling.rows()?;
    let column_count = curves.iter().map(|(column, _)| column + 1).max().unwrap_or(0);

    let mut out = String::new();
    for row in 0..rows {
        let time = sampling.start + row as f64 * sampling.increment;
        for column in 0..column_count {
            if column > 0 {
                out.push(ASCII_SEPARATOR);
            }
            match curves.iter().find(|(c, _)| *c == column) {
                Some((_, curve)) => {
                    let value = curve.evaluate(true, time)?;
                    out.push_str(&format!("{:.*}", ASCII_PRECISION, value));
                }
                None => out.push('0'),
            }
        }
        out.push('\n');
    }
    Ok(out)
}

/// Parse text into linear keys for each mapped curve. Nothing is modified;
/// the caller replaces the keys of each returned curve.
pub fn import_ascii(
    text: &str,
    curves: &[(usize, &Curve)],
    sampling: &AsciiSampling,
) -> Result<Vec<(CurveId, Vec<KeyFrame>)>> {
    sampling.check(curves, false)?;

    let mut keys: Vec<(CurveId, Vec<KeyFrame>)> = curves.iter().map(|(_, c)| (c.id, Vec::new())).collect();
    let mut time = sampling.start;
    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let values = line
            .split(ASCII_SEPARATOR)
            .map(|field| field.trim().parse::<f64>())
            .collect::<std::result::Result<Vec<f64>, _>>()
            .map_err(|e| CurveError::Ascii(format!("line {}: {e}", line_no + 1)))?;

        if values.len() < curves.len() {
            return Err(CurveError::Ascii(format!(
                "line {} has {} columns for {} curves",
                line_no + 1,
                values.len(),
                curves.len()
            )));
        }
        for ((column, _), (_, curve_keys)) in curves.iter().zip(keys.iter_mut()) {
            let value = *values.get(*column).ok_or_else(|| {
                CurveError::Ascii(format!("line {} has no column {column}", line_no + 1))
            })?;
            curve_keys.push(
                KeyFrame::new(time, value)
                    .with_interpolation(KeyframeType::Linear)
                    .with_derivatives(0.0, 0.0),
            );
        }
        time += sampling.increment;
    }
    Ok(keys)
}
