// SPDX-License-Identifier: MIT OR Apache-2.0
//! Registry of the curves shown in an editor.

use crate::curve::{Curve, CurveId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Curves in insertion order, plus the curve picked by the user
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CurveSet {
    /// Curves keyed by ID, iteration follows insertion order
    curves: IndexMap<CurveId, Curve>,
    /// Curve selected in the view, target of paste and expressions
    selected: Option<CurveId>,
}

impl CurveSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a curve
    pub fn add_curve(&mut self, curve: Curve) -> CurveId {
        let id = curve.id;
        self.curves.insert(id, curve);
        id
    }

    /// Remove a curve, keeping the order of the others
    pub fn remove_curve(&mut self, id: CurveId) -> Option<Curve> {
        if self.selected == Some(id) {
            self.selected = None;
        }
        self.curves.shift_remove(&id)
    }

    /// Get a curve
    pub fn curve(&self, id: CurveId) -> Option<&Curve> {
        self.curves.get(&id)
    }

    /// Get a mutable curve
    pub fn curve_mut(&mut self, id: CurveId) -> Option<&mut Curve> {
        self.curves.get_mut(&id)
    }

    /// All curves in insertion order
    pub fn curves(&self) -> impl Iterator<Item = &Curve> {
        self.curves.values()
    }

    /// Visible curves in insertion order
    pub fn visible_curves(&self) -> impl Iterator<Item = &Curve> {
        self.curves.values().filter(|c| c.visible)
    }

    /// Number of curves
    pub fn len(&self) -> usize {
        self.curves.len()
    }

    /// Whether the set holds no curve
    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }

    /// Curve currently selected in the view
    pub fn selected_curve(&self) -> Option<&Curve> {
        self.selected.and_then(|id| self.curves.get(&id))
    }

    /// ID of the selected curve
    pub fn selected_curve_id(&self) -> Option<CurveId> {
        self.selected.filter(|id| self.curves.contains_key(id))
    }

    /// Select a curve, or clear with `None`
    pub fn select_curve(&mut self, id: Option<CurveId>) {
        self.selected = id.filter(|id| self.curves.contains_key(id));
    }

    /// Show exactly the given curves and hide every other one
    pub fn show_only(&mut self, ids: &[CurveId]) {
        for (id, curve) in &mut self.curves {
            curve.visible = ids.contains(id);
        }
    }
}
