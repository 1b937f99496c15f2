// SPDX-License-Identifier: MIT OR Apache-2.0
//! Animation curves.

use crate::error::{CurveError, Result};
use crate::expression::CurveExpression;
use crate::keyframe::{Interpolation, KeyFrame, KeyFrameId, KeyframeType};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Two keys closer than this in time are the same key
const TIME_EPSILON: f64 = 1e-9;

/// Unique identifier for a curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CurveId(pub Uuid);

impl CurveId {
    /// Create a new random curve ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CurveId {
    fn default() -> Self {
        Self::new()
    }
}

/// What a curve animates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[derive(Default)]
pub enum CurveKind {
    /// A parameter curve with editable tangents
    #[default]
    Parametric,
    /// A Bezier control point track, no tangent editing
    BezierControlPoint,
}

/// Value domain of a curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[derive(Default)]
pub enum ValueKind {
    /// Real values
    #[default]
    Double,
    /// Values rounded to integers
    Int,
    /// Values snapped to 0 or 1
    Bool,
}

impl ValueKind {
    /// Clamp a value to this domain
    pub fn clamp(&self, value: f64) -> f64 {
        match self {
            Self::Double => value,
            Self::Int => (value + 0.5).floor(),
            Self::Bool => {
                if value >= 0.5 {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

/// An animation curve: keyframes sorted by time plus display metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Curve {
    /// Unique curve ID
    pub id: CurveId,
    /// Display name
    pub name: String,
    /// Curve kind
    pub kind: CurveKind,
    /// Value domain
    pub value_kind: ValueKind,
    /// Keyframes, strictly increasing in time
    keyframes: Vec<KeyFrame>,
    /// Whether the curve is drawn and hit-tested
    pub visible: bool,
    /// Whether the keyframe pattern repeats over `x_range`
    pub periodic: bool,
    /// Parametric range, the period of periodic curves
    pub x_range: (f64, f64),
    /// Allowed value range
    pub y_range: (f64, f64),
    /// Whether key times snap to integer frames
    pub time_clamped_to_integers: bool,
    /// Whether keys may move vertically
    pub y_movable: bool,
    /// Value of a curve without keyframes
    pub default_value: f64,
    /// Optional expression applied on evaluation
    pub expression: Option<CurveExpression>,
    /// Display color
    pub color: [u8; 3],
}

impl Curve {
    /// Create a new empty curve
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: CurveId::new(),
            name: name.into(),
            kind: CurveKind::Parametric,
            value_kind: ValueKind::Double,
            keyframes: Vec::new(),
            visible: true,
            periodic: false,
            x_range: (f64::NEG_INFINITY, f64::INFINITY),
            y_range: (f64::NEG_INFINITY, f64::INFINITY),
            time_clamped_to_integers: true,
            y_movable: true,
            default_value: 0.0,
            expression: None,
            color: [200, 200, 200],
        }
    }

    /// Set the curve kind
    pub fn with_kind(mut self, kind: CurveKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set the value domain
    pub fn with_value_kind(mut self, value_kind: ValueKind) -> Self {
        self.value_kind = value_kind;
        self
    }

    /// Make the curve periodic over `[first, last]`
    pub fn with_period(mut self, first: f64, last: f64) -> Self {
        self.periodic = true;
        self.x_range = (first, last);
        self.refresh_derivatives();
        self
    }

    /// Restrict the value range
    pub fn with_y_range(mut self, min: f64, max: f64) -> Self {
        self.y_range = (min, max);
        self
    }

    /// Allow fractional key times
    pub fn with_fractional_time(mut self) -> Self {
        self.time_clamped_to_integers = false;
        self
    }

    /// Set display color
    pub fn with_color(mut self, color: [u8; 3]) -> Self {
        self.color = color;
        self
    }

    /// Add keyframes given as `(time, value)` pairs
    pub fn with_keyframes(mut self, keys: &[(f64, f64)], kind: KeyframeType) -> Self {
        for &(time, value) in keys {
            self.insert_keyframe(KeyFrame::new(time, value).with_interpolation(kind));
        }
        self
    }

    /// Whether tangent editing is disabled for this curve
    pub fn is_bezier(&self) -> bool {
        self.kind == CurveKind::BezierControlPoint
    }

    /// Period of a periodic curve with a finite, non-empty range
    pub fn period(&self) -> Option<f64> {
        let period = self.x_range.1 - self.x_range.0;
        (self.periodic && period.is_finite() && period > 0.0).then_some(period)
    }

    /// Keyframes in time order
    pub fn keyframes(&self) -> &[KeyFrame] {
        &self.keyframes
    }

    /// Number of keyframes
    pub fn keyframe_count(&self) -> usize {
        self.keyframes.len()
    }

    /// Get keyframe by ID
    pub fn keyframe(&self, id: KeyFrameId) -> Option<&KeyFrame> {
        self.keyframes.iter().find(|k| k.id == id)
    }

    /// Index of a keyframe by ID
    pub fn index_of(&self, id: KeyFrameId) -> Option<usize> {
        self.keyframes.iter().position(|k| k.id == id)
    }

    /// Keyframe at exactly `time`
    pub fn keyframe_at(&self, time: f64) -> Option<&KeyFrame> {
        self.keyframes.iter().find(|k| (k.time - time).abs() < TIME_EPSILON)
    }

    /// Neighbours of the key at `index`.
    ///
    /// On periodic curves with more than one key the first key's predecessor
    /// is the last key shifted back by the period, and the last key's
    /// successor is the first key shifted forward by the period.
    pub fn prev_next(&self, index: usize) -> (Option<KeyFrame>, Option<KeyFrame>) {
        let len = self.keyframes.len();
        if index >= len {
            return (None, None);
        }
        let wrap = self.period().filter(|_| len > 1);

        let prev = if index > 0 {
            Some(self.keyframes[index - 1])
        } else {
            wrap.map(|period| self.keyframes[len - 1].shifted(-period))
        };
        let next = if index + 1 < len {
            Some(self.keyframes[index + 1])
        } else {
            wrap.map(|period| self.keyframes[0].shifted(period))
        };

        (prev, next)
    }

    /// Keyframes inside a time/value rectangle, bounds inclusive
    pub fn keyframes_in_rect(&self, left: f64, right: f64, bottom: f64, top: f64) -> Vec<KeyFrame> {
        self.keyframes
            .iter()
            .filter(|k| k.time >= left && k.time <= right && k.value >= bottom && k.value <= top)
            .copied()
            .collect()
    }

    /// Time and value bounds of all keys as `(tmin, tmax, vmin, vmax)`
    pub fn keyframe_bounds(&self) -> Option<(f64, f64, f64, f64)> {
        let first = self.keyframes.first()?;
        let init = (first.time, first.time, first.value, first.value);
        Some(self.keyframes.iter().fold(init, |(t0, t1, v0, v1), k| {
            (t0.min(k.time), t1.max(k.time), v0.min(k.value), v1.max(k.value))
        }))
    }

    /// Snap a time to the curve's time domain
    pub fn clamp_time(&self, time: f64) -> f64 {
        if self.time_clamped_to_integers {
            time.round()
        } else {
            time
        }
    }

    /// Reject values outside `y_range`
    pub fn check_y_range(&self, value: f64) -> Result<()> {
        let (min, max) = self.y_range;
        if value < min || value > max {
            return Err(CurveError::OutOfRange { value, min, max });
        }
        Ok(())
    }

    /// Evaluate the curve at `time`.
    ///
    /// With `use_expression` the curve expression, if any, is applied on top of
    /// the keyframes. Fails on an invalid expression or a non-finite result.
    pub fn evaluate(&self, use_expression: bool, time: f64) -> Result<f64> {
        let value = match self.expression {
            Some(expression) if use_expression => {
                expression.evaluate(time, |t| self.evaluate_keyframes(t))?
            }
            _ => self.evaluate_keyframes(time)?,
        };
        Ok(self.value_kind.clamp(value))
    }

    fn evaluate_keyframes(&self, time: f64) -> Result<f64> {
        let (Some(first), Some(last)) = (self.keyframes.first(), self.keyframes.last()) else {
            return Ok(self.default_value);
        };

        let period = self.period();
        let time = match period {
            Some(period) => self.x_range.0 + (time - self.x_range.0).rem_euclid(period),
            None => time,
        };

        let upper = self.keyframes.partition_point(|k| k.time <= time);
        let value = if upper == 0 {
            match period {
                Some(period) if self.keyframes.len() > 1 => {
                    Interpolation::segment(&last.shifted(-period), first, time)
                }
                _ => Self::extrapolate(first, time, first.left_derivative),
            }
        } else if upper == self.keyframes.len() {
            match period {
                Some(period) if self.keyframes.len() > 1 => {
                    Interpolation::segment(last, &first.shifted(period), time)
                }
                _ => Self::extrapolate(last, time, last.right_derivative),
            }
        } else {
            Interpolation::segment(&self.keyframes[upper - 1], &self.keyframes[upper], time)
        };

        if value.is_finite() {
            Ok(value)
        } else {
            Err(CurveError::NonFinite { time })
        }
    }

    /// Constant outside the keys, except linear keys which extend along their slope
    fn extrapolate(key: &KeyFrame, time: f64, derivative: f64) -> f64 {
        if key.interpolation == KeyframeType::Linear {
            key.value + derivative * (time - key.time)
        } else {
            key.value
        }
    }

    /// Insert a keyframe, replacing any key at the same time. Returns its ID.
    pub fn insert_keyframe(&mut self, mut key: KeyFrame) -> KeyFrameId {
        key.time = self.clamp_time(key.time);
        key.value = self.value_kind.clamp(key.value);

        if let Some(existing) = self
            .keyframes
            .iter_mut()
            .find(|k| (k.time - key.time).abs() < TIME_EPSILON)
        {
            existing.value = key.value;
            existing.interpolation = key.interpolation;
            existing.left_derivative = key.left_derivative;
            existing.right_derivative = key.right_derivative;
            let id = existing.id;
            self.refresh_derivatives();
            return id;
        }

        let id = key.id;
        self.keyframes.push(key);
        self.sort_keyframes();
        self.refresh_derivatives();
        id
    }

    /// Add a smooth keyframe at `(time, value)`
    pub fn add_keyframe(&mut self, time: f64, value: f64) -> KeyFrameId {
        self.insert_keyframe(KeyFrame::new(time, value))
    }

    /// Remove a keyframe
    pub fn remove_keyframe(&mut self, id: KeyFrameId) -> Result<KeyFrame> {
        let index = self.index_of(id).ok_or(CurveError::KeyFrameNotFound)?;
        let removed = self.keyframes.remove(index);
        self.refresh_derivatives();
        Ok(removed)
    }

    /// Remove all keyframes
    pub fn clear_keyframes(&mut self) {
        self.keyframes.clear();
    }

    /// Replace every keyframe
    pub fn set_keyframes(&mut self, keys: Vec<KeyFrame>) {
        self.keyframes.clear();
        for key in keys {
            self.insert_keyframe(key);
        }
    }

    /// Move a key by `(dt, dv)`
    pub fn move_keyframe(&mut self, id: KeyFrameId, dt: f64, dv: f64) -> Result<KeyFrame> {
        let key = *self.keyframe(id).ok_or(CurveError::KeyFrameNotFound)?;
        self.set_keyframe_time_value(id, key.time + dt, key.value + dv)
    }

    /// Scale a key about `center` by `(sx, sy)`
    pub fn transform_keyframe(
        &mut self,
        id: KeyFrameId,
        center: (f64, f64),
        sx: f64,
        sy: f64,
    ) -> Result<KeyFrame> {
        let key = *self.keyframe(id).ok_or(CurveError::KeyFrameNotFound)?;
        let time = center.0 + (key.time - center.0) * sx;
        let value = center.1 + (key.value - center.1) * sy;
        self.set_keyframe_time_value(id, time, value)
    }

    /// Place a key at a new time and value
    pub fn set_keyframe_time_value(&mut self, id: KeyFrameId, time: f64, value: f64) -> Result<KeyFrame> {
        let index = self.index_of(id).ok_or(CurveError::KeyFrameNotFound)?;
        let time = self.clamp_time(time);
        let value = self.value_kind.clamp(value);

        if self
            .keyframes
            .iter()
            .any(|k| k.id != id && (k.time - time).abs() < TIME_EPSILON)
        {
            return Err(CurveError::TimeOccupied { time });
        }

        self.keyframes[index].time = time;
        self.keyframes[index].value = value;
        self.sort_keyframes();
        self.refresh_derivatives();
        self.keyframe(id).copied().ok_or(CurveError::KeyFrameNotFound)
    }

    /// Set the incoming derivative. Keys that are not broken keep both sides equal.
    pub fn set_left_derivative(&mut self, id: KeyFrameId, derivative: f64) -> Result<KeyFrame> {
        let key = self.keyframe(id).ok_or(CurveError::KeyFrameNotFound)?;
        if key.interpolation == KeyframeType::Broken {
            let right = key.right_derivative;
            self.set_derivatives(id, derivative, right)
        } else {
            self.set_derivatives(id, derivative, derivative)
        }
    }

    /// Set the outgoing derivative. Keys that are not broken keep both sides equal.
    pub fn set_right_derivative(&mut self, id: KeyFrameId, derivative: f64) -> Result<KeyFrame> {
        let key = self.keyframe(id).ok_or(CurveError::KeyFrameNotFound)?;
        if key.interpolation == KeyframeType::Broken {
            let left = key.left_derivative;
            self.set_derivatives(id, left, derivative)
        } else {
            self.set_derivatives(id, derivative, derivative)
        }
    }

    /// Set both derivatives; automatic keys become `Free`
    pub fn set_derivatives(&mut self, id: KeyFrameId, left: f64, right: f64) -> Result<KeyFrame> {
        let index = self.index_of(id).ok_or(CurveError::KeyFrameNotFound)?;
        let key = &mut self.keyframes[index];
        key.left_derivative = left;
        key.right_derivative = right;
        if key.interpolation.is_automatic() {
            key.interpolation = KeyframeType::Free;
        }
        let key = *key;
        self.refresh_derivatives();
        Ok(key)
    }

    /// Change the interpolation kind of a key
    pub fn set_interpolation(&mut self, id: KeyFrameId, kind: KeyframeType) -> Result<KeyFrame> {
        let index = self.index_of(id).ok_or(CurveError::KeyFrameNotFound)?;
        self.keyframes[index].interpolation = kind;
        self.refresh_derivatives();
        self.keyframe(id).copied().ok_or(CurveError::KeyFrameNotFound)
    }

    /// Recompute derivatives of every automatic key
    pub fn refresh_derivatives(&mut self) {
        for index in 0..self.keyframes.len() {
            let key = self.keyframes[index];
            let (prev, next) = self.prev_next(index);
            if let Some((left, right)) = Interpolation::auto_derivatives(
                key.interpolation,
                prev.map(|k| (k.time, k.value)),
                (key.time, key.value),
                next.map(|k| (k.time, k.value)),
            ) {
                self.keyframes[index].left_derivative = left;
                self.keyframes[index].right_derivative = right;
            }
        }
    }

    fn sort_keyframes(&mut self) {
        self.keyframes.sort_by(|a, b| a.time.total_cmp(&b.time));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear_curve() -> Curve {
        Curve::new("linear").with_keyframes(&[(0.0, 0.0), (10.0, 10.0), (20.0, 0.0)], KeyframeType::Linear)
    }

    #[test]
    fn test_keys_stay_sorted() {
        let mut curve = Curve::new("c");
        curve.add_keyframe(20.0, 1.0);
        curve.add_keyframe(0.0, 2.0);
        curve.add_keyframe(10.0, 3.0);
        let times: Vec<f64> = curve.keyframes().iter().map(|k| k.time).collect();
        assert_eq!(times, vec![0.0, 10.0, 20.0]);

        // Same time replaces the value
        curve.add_keyframe(10.0, 5.0);
        assert_eq!(curve.keyframe_count(), 3);
        assert_eq!(curve.keyframe_at(10.0).unwrap().value, 5.0);
    }

    #[test]
    fn test_set_keyframes_replaces_all() {
        let mut curve = linear_curve();
        curve.set_keyframes(vec![KeyFrame::new(30.0, 1.0), KeyFrame::new(5.0, 2.0)]);
        let times: Vec<f64> = curve.keyframes().iter().map(|k| k.time).collect();
        assert_eq!(times, vec![5.0, 30.0]);
    }

    #[test]
    fn test_evaluate_linear() {
        let curve = linear_curve();
        assert!((curve.evaluate(false, 5.0).unwrap() - 5.0).abs() < 1e-9);
        assert!((curve.evaluate(false, 15.0).unwrap() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_evaluate_empty_uses_default() {
        let mut curve = Curve::new("empty");
        curve.default_value = 3.5;
        assert_eq!(curve.evaluate(true, 42.0).unwrap(), 3.5);
    }

    #[test]
    fn test_periodic_neighbours_wrap() {
        let curve = Curve::new("p")
            .with_keyframes(&[(0.0, 0.0), (10.0, 1.0), (15.0, 0.5)], KeyframeType::Smooth)
            .with_period(0.0, 20.0);

        let (prev, next) = curve.prev_next(0);
        let prev = prev.unwrap();
        assert_eq!(prev.time, -5.0);
        assert_eq!(prev.id, curve.keyframes()[2].id);
        assert_eq!(next.unwrap().time, 10.0);

        let (_, next) = curve.prev_next(2);
        assert_eq!(next.unwrap().time, 20.0);
    }

    #[test]
    fn test_non_periodic_has_no_wrap() {
        let curve = linear_curve();
        let (prev, _) = curve.prev_next(0);
        assert!(prev.is_none());
        let (_, next) = curve.prev_next(2);
        assert!(next.is_none());
    }

    #[test]
    fn test_periodic_evaluation_repeats() {
        let curve = Curve::new("p")
            .with_keyframes(&[(0.0, 0.0), (10.0, 10.0)], KeyframeType::Linear)
            .with_period(0.0, 20.0);
        let a = curve.evaluate(false, 5.0).unwrap();
        let b = curve.evaluate(false, 25.0).unwrap();
        assert!((a - b).abs() < 1e-9);
    }

    #[test]
    fn test_value_kinds_clamp() {
        let curve = Curve::new("i")
            .with_value_kind(ValueKind::Int)
            .with_keyframes(&[(0.0, 0.0), (10.0, 10.0)], KeyframeType::Linear);
        assert_eq!(curve.evaluate(false, 3.3).unwrap(), 3.0);

        let curve = Curve::new("b")
            .with_value_kind(ValueKind::Bool)
            .with_keyframes(&[(0.0, 0.0), (10.0, 1.0)], KeyframeType::Linear);
        assert_eq!(curve.evaluate(false, 6.0).unwrap(), 1.0);
        assert_eq!(curve.evaluate(false, 4.0).unwrap(), 0.0);
    }

    #[test]
    fn test_expression_failure_and_fallback() {
        let mut curve = linear_curve();
        curve.expression = Some(CurveExpression::Loop { first: 5, last: 1 });
        assert!(curve.evaluate(true, 3.0).is_err());
        assert!(curve.evaluate(false, 3.0).is_ok());
    }

    #[test]
    fn test_move_rejects_occupied_time() {
        let mut curve = linear_curve();
        let id = curve.keyframes()[0].id;
        assert!(matches!(
            curve.move_keyframe(id, 10.0, 0.0),
            Err(CurveError::TimeOccupied { .. })
        ));
        let moved = curve.move_keyframe(id, 2.4, 1.0).unwrap();
        assert_eq!(moved.time, 2.0);
        assert_eq!(moved.value, 1.0);
    }

    #[test]
    fn test_set_derivative_frees_key() {
        let mut curve = linear_curve();
        let id = curve.keyframes()[1].id;
        let key = curve.set_left_derivative(id, 2.0).unwrap();
        assert_eq!(key.interpolation, KeyframeType::Free);
        assert_eq!(key.right_derivative, 2.0);

        curve.set_interpolation(id, KeyframeType::Broken).unwrap();
        let key = curve.set_right_derivative(id, -1.0).unwrap();
        assert_eq!(key.left_derivative, 2.0);
        assert_eq!(key.right_derivative, -1.0);
    }

    #[test]
    fn test_y_range_check() {
        let curve = Curve::new("r").with_y_range(0.0, 1.0);
        assert!(curve.check_y_range(0.5).is_ok());
        assert!(matches!(curve.check_y_range(2.0), Err(CurveError::OutOfRange { .. })));
    }

    #[test]
    fn test_serialization() {
        let curve = linear_curve().with_y_range(-100.0, 100.0).with_period(0.0, 30.0);
        let ron_str = ron::ser::to_string_pretty(&curve, ron::ser::PrettyConfig::default()).unwrap();
        let loaded: Curve = ron::from_str(&ron_str).unwrap();
        assert_eq!(loaded.keyframe_count(), 3);
        assert_eq!(loaded.id, curve.id);
    }
}
