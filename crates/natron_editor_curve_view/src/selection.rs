// SPDX-License-Identifier: MIT OR Apache-2.0
//! Keyframe selection and its bounding box.

use crate::zoom::{ZoomContext, ZoomPoint, ZoomRect};
use natron_editor_curves::{Curve, CurveId, CurveSet, KeyFrame, KeyFrameId};

/// Side of a keyframe tangent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TangentSide {
    /// Incoming tangent
    Left,
    /// Outgoing tangent
    Right,
}

/// A selected keyframe with its tangent handle positions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectedKey {
    /// Owning curve
    pub curve: CurveId,
    /// Snapshot of the key
    pub key: KeyFrame,
    /// End of the left tangent handle, zoom coordinates
    pub left_tangent: ZoomPoint,
    /// End of the right tangent handle, zoom coordinates
    pub right_tangent: ZoomPoint,
}

impl SelectedKey {
    /// Select the key at `index` of `curve`
    pub fn new(zoom: &ZoomContext, curve: &Curve, index: usize) -> Option<Self> {
        let key = *curve.keyframes().get(index)?;
        let (left_tangent, right_tangent) = tangent_endpoints(zoom, curve, index);
        Some(Self {
            curve: curve.id,
            key,
            left_tangent,
            right_tangent,
        })
    }

    /// Key position in zoom coordinates
    pub fn position(&self) -> ZoomPoint {
        ZoomPoint::new(self.key.time, self.key.value)
    }

    /// Tangent handle end on one side
    pub fn tangent(&self, side: TangentSide) -> ZoomPoint {
        match side {
            TangentSide::Left => self.left_tangent,
            TangentSide::Right => self.right_tangent,
        }
    }

    /// Derivative on one side
    pub fn derivative(&self, side: TangentSide) -> f64 {
        match side {
            TangentSide::Left => self.key.left_derivative,
            TangentSide::Right => self.key.right_derivative,
        }
    }
}

/// Tangent handle ends of the key at `index`, in zoom coordinates.
///
/// A handle follows the key's derivative and is clipped to a pixel box: at
/// most an eighth of the view width, and a third of the distance to the
/// neighbouring key on that side; vertically at most an eighth of the view
/// height and never more than horizontally.
pub fn tangent_endpoints(zoom: &ZoomContext, curve: &Curve, index: usize) -> (ZoomPoint, ZoomPoint) {
    let keys = curve.keyframes();
    let Some(key) = keys.get(index) else {
        return (ZoomPoint::default(), ZoomPoint::default());
    };
    let w = zoom.screen_width();
    let h = zoom.screen_height();
    let (x, y) = (key.time, key.value);
    let key_wx = zoom.widget_x(x);
    let key_wy = zoom.widget_y(y);

    let mut left_max_px = w / 8.0;
    if let Some(prev) = index.checked_sub(1).and_then(|i| keys.get(i)) {
        left_max_px = left_max_px.min((key_wx - zoom.widget_x(prev.time)) / 3.0);
    }
    let mut right_max_px = w / 8.0;
    if let Some(next) = keys.get(index + 1) {
        right_max_px = right_max_px.min((zoom.widget_x(next.time) - key_wx) / 3.0);
    }

    let clipped = |max_px: f64, derivative: f64| {
        let max_py = (h / 8.0).min(max_px);
        let tan_max = ZoomPoint::new(
            zoom.zoom_x(key_wx + max_px) - x,
            zoom.zoom_y(key_wy - max_py) - y,
        );
        if tan_max.x * derivative.abs() < tan_max.y || derivative == 0.0 {
            ZoomPoint::new(tan_max.x, tan_max.x * derivative)
        } else {
            let sign = if derivative > 0.0 { 1.0 } else { -1.0 };
            ZoomPoint::new(tan_max.y / derivative.abs(), tan_max.y * sign)
        }
    };

    let left = clipped(left_max_px, key.left_derivative);
    let right = clipped(right_max_px, key.right_derivative);

    (
        ZoomPoint::new(x - left.x, y - left.y),
        ZoomPoint::new(x + right.x, y + right.y),
    )
}

/// Selected keyframes in selection order
#[derive(Debug, Clone, Default)]
pub struct KeySelection {
    keys: Vec<SelectedKey>,
}

impl KeySelection {
    /// Create an empty selection
    pub fn new() -> Self {
        Self::default()
    }

    /// Selected keys
    pub fn keys(&self) -> &[SelectedKey] {
        &self.keys
    }

    /// Number of selected keys
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether nothing is selected
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Whether a key is selected
    pub fn contains(&self, curve: CurveId, key: KeyFrameId) -> bool {
        self.keys.iter().any(|k| k.curve == curve && k.key.id == key)
    }

    /// Add a key unless it is already selected, in which case refresh it
    pub fn insert_conditionally(&mut self, selected: SelectedKey) {
        match self
            .keys
            .iter_mut()
            .find(|k| k.curve == selected.curve && k.key.id == selected.key.id)
        {
            Some(existing) => *existing = selected,
            None => self.keys.push(selected),
        }
    }

    /// Remove one key
    pub fn remove(&mut self, curve: CurveId, key: KeyFrameId) {
        self.keys.retain(|k| !(k.curve == curve && k.key.id == key));
    }

    /// Clear the selection
    pub fn clear(&mut self) {
        self.keys.clear();
    }

    /// Replace the selection
    pub fn set(&mut self, keys: Vec<SelectedKey>) {
        self.keys = keys;
    }

    /// IDs of the curves owning selected keys, in selection order
    pub fn curves(&self) -> Vec<CurveId> {
        let mut curves = Vec::new();
        for key in &self.keys {
            if !curves.contains(&key.curve) {
                curves.push(key.curve);
            }
        }
        curves
    }

    /// Re-read every key from its curve and recompute tangents; keys that no
    /// longer exist are dropped
    pub fn refresh(&mut self, zoom: &ZoomContext, curves: &CurveSet) {
        self.keys.retain_mut(|selected| {
            let Some(curve) = curves.curve(selected.curve) else {
                return false;
            };
            let Some(index) = curve.index_of(selected.key.id) else {
                return false;
            };
            match SelectedKey::new(zoom, curve, index) {
                Some(fresh) => {
                    *selected = fresh;
                    true
                }
                None => false,
            }
        });
    }

    /// Rectangle enclosing all selected keys
    pub fn bounding_box(&self) -> Option<ZoomRect> {
        let first = self.keys.first()?;
        let mut rect = ZoomRect::from_corners(first.position(), first.position());
        for key in &self.keys[1..] {
            rect.left = rect.left.min(key.key.time);
            rect.right = rect.right.max(key.key.time);
            rect.bottom = rect.bottom.min(key.key.value);
            rect.top = rect.top.max(key.key.value);
        }
        Some(rect)
    }
}

/// One of the eight handles of the selection bounding box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BboxHandle {
    /// Top-left corner
    TopLeft,
    /// Middle of the left edge
    MidLeft,
    /// Bottom-left corner
    BtmLeft,
    /// Middle of the bottom edge
    MidBtm,
    /// Bottom-right corner
    BtmRight,
    /// Middle of the right edge
    MidRight,
    /// Top-right corner
    TopRight,
    /// Middle of the top edge
    MidTop,
}

impl BboxHandle {
    /// Handles in the order a press tests them
    pub fn all() -> &'static [BboxHandle] {
        &[
            Self::BtmLeft,
            Self::MidLeft,
            Self::TopLeft,
            Self::MidTop,
            Self::TopRight,
            Self::MidRight,
            Self::BtmRight,
            Self::MidBtm,
        ]
    }

    /// Handle position on `rect`
    pub fn position(&self, rect: &ZoomRect) -> ZoomPoint {
        match self {
            Self::TopLeft => ZoomPoint::new(rect.left, rect.top),
            Self::MidLeft => ZoomPoint::new(rect.left, rect.mid_y()),
            Self::BtmLeft => ZoomPoint::new(rect.left, rect.bottom),
            Self::MidBtm => ZoomPoint::new(rect.mid_x(), rect.bottom),
            Self::BtmRight => ZoomPoint::new(rect.right, rect.bottom),
            Self::MidRight => ZoomPoint::new(rect.right, rect.mid_y()),
            Self::TopRight => ZoomPoint::new(rect.right, rect.top),
            Self::MidTop => ZoomPoint::new(rect.mid_x(), rect.top),
        }
    }

    /// Whether this is a corner handle
    pub fn is_corner(&self) -> bool {
        matches!(self, Self::TopLeft | Self::BtmLeft | Self::BtmRight | Self::TopRight)
    }

    /// Whether dragging scales the horizontal axis
    pub fn scales_x(&self) -> bool {
        !matches!(self, Self::MidTop | Self::MidBtm)
    }

    /// Whether dragging scales the vertical axis
    pub fn scales_y(&self) -> bool {
        !matches!(self, Self::MidLeft | Self::MidRight)
    }

    /// Scale center when the opposite edge is anchored
    pub fn opposite_anchor(&self, rect: &ZoomRect) -> Option<ZoomPoint> {
        match self {
            Self::MidTop => Some(ZoomPoint::new(rect.mid_x(), rect.bottom)),
            Self::MidBtm => Some(ZoomPoint::new(rect.mid_x(), rect.top)),
            Self::MidLeft => Some(ZoomPoint::new(rect.right, rect.mid_y())),
            Self::MidRight => Some(ZoomPoint::new(rect.left, rect.mid_y())),
            _ => None,
        }
    }
}
