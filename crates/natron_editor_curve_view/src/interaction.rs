// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pointer interaction and editing actions of the curve editor.
//!
//! [`CurveEditorState`] owns the curves and the view. Pointer events are
//! resolved against the hit-testing probes and move the editor through
//! [`EventState`]; while a drag is active, pointer moves edit keys, tangents,
//! the view or the current frame.

use crate::error::{EditorError, Result};
use crate::hit_test::{keys_in_rect, CurveHit, CurveHitTester, KeyFrameHit};
use crate::selection::{BboxHandle, KeySelection, SelectedKey, TangentSide};
use crate::settings::CurveEditorSettings;
use crate::text::TextMetrics;
use crate::timeline::Timeline;
use crate::zoom::{ZoomContext, ZoomPoint, ZoomRect};
use egui::{Modifiers, Pos2};
use natron_editor_curves::{
    export_ascii, import_ascii, AsciiSampling, Curve, CurveError, CurveExpression, CurveId, CurveSet, KeyFrame,
    KeyFrameId, KeyframeType, ValueKind,
};

/// What a drag currently does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventState {
    /// No drag
    #[default]
    None,
    /// Panning
    DraggingView,
    /// Moving the selected keys
    DraggingKeys,
    /// Rubber band selection
    Selecting,
    /// Moving a tangent handle
    DraggingTangent,
    /// Scrubbing the current frame
    DraggingTimeline,
    /// Zooming with the pointer
    Zooming,
    /// Scaling the selection with a bounding box handle
    DraggingBbox(BboxHandle),
}

/// Axis a constrained drag is locked to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragOrientation {
    /// Time only
    Horizontal,
    /// Value only
    Vertical,
}

/// Mouse buttons held during a press
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MouseButtons {
    /// Primary button
    pub left: bool,
    /// Middle button
    pub middle: bool,
    /// Secondary button
    pub right: bool,
}

impl MouseButtons {
    /// Only the primary button
    pub const LEFT: Self = Self { left: true, middle: false, right: false };
    /// Only the middle button
    pub const MIDDLE: Self = Self { left: false, middle: true, right: false };
    /// Only the secondary button
    pub const RIGHT: Self = Self { left: false, middle: false, right: true };
}

/// What lies under the pointer, in press precedence
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PressTarget {
    /// Move cross of the selection bounding box
    BboxCross,
    /// Handle of the selection bounding box
    BboxHandle(BboxHandle),
    /// Tangent handle of a selected key
    Tangent(TangentSide, SelectedKey),
    /// A keyframe
    KeyFrame(KeyFrameHit),
    /// Label of the single selected key
    KeyText(SelectedKey),
    /// Derivative label of the single selected key
    TangentText(TangentSide, SelectedKey),
    /// One of the current frame markers
    TimelineMarker,
    /// A curve body
    Curve(CurveHit),
    /// Empty space
    Nothing,
}

/// Result of a mouse press
#[derive(Debug, Clone, PartialEq)]
pub enum PressOutcome {
    /// The host should open the context menu
    OpenContextMenu,
    /// A key was added on a curve and is now being dragged
    KeyAdded {
        /// Curve the key was added to
        curve: CurveId,
        /// The new key
        key: KeyFrameId,
    },
    /// A key could not be added
    Rejected(CurveError),
    /// A drag started
    Started(EventState),
    /// The press hit a label and started nothing
    Consumed,
}

/// Result of a double click
#[derive(Debug, Clone, PartialEq)]
pub enum DoubleClickOutcome {
    /// Edit the time and value of a key
    EditKey(SelectedKey),
    /// Edit one derivative of a key
    EditDerivative(TangentSide, SelectedKey),
    /// A key was added on a curve
    KeyAdded {
        /// Curve the key was added to
        curve: CurveId,
        /// The new key
        key: KeyFrameId,
    },
    /// A key could not be added
    Rejected(CurveError),
    /// Nothing to do
    Nothing,
}

/// Pointer shape requested while hovering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorShape {
    /// Arrow
    #[default]
    Default,
    /// Move in all directions
    Move,
    /// Diagonal resize, top-left to bottom-right
    ResizeNwSe,
    /// Diagonal resize, top-right to bottom-left
    ResizeNeSw,
    /// Horizontal resize
    ResizeHorizontal,
    /// Vertical resize
    ResizeVertical,
    /// Precise pick
    Crosshair,
    /// Text
    Text,
}

impl CursorShape {
    fn for_handle(handle: BboxHandle) -> Self {
        match handle {
            BboxHandle::TopLeft | BboxHandle::BtmRight => Self::ResizeNwSe,
            BboxHandle::TopRight | BboxHandle::BtmLeft => Self::ResizeNeSw,
            BboxHandle::MidLeft | BboxHandle::MidRight => Self::ResizeHorizontal,
            BboxHandle::MidTop | BboxHandle::MidBtm => Self::ResizeVertical,
        }
    }
}

fn is_ctrl(modifiers: &Modifiers) -> bool {
    modifiers.ctrl || modifiers.command
}

/// Curve editor model, view and drag bookkeeping
pub struct CurveEditorState {
    /// Edited curves
    pub curves: CurveSet,
    /// View mapping
    pub zoom: ZoomContext,
    /// Selected keys
    pub selection: KeySelection,
    /// Current frame
    pub timeline: Timeline,
    /// Editor settings
    pub settings: CurveEditorSettings,
    state: EventState,
    /// Press position, widget pixels
    drag_start: Pos2,
    last_mouse_pos: Pos2,
    key_drag_last_movement: ZoomPoint,
    drag_orientation: Option<DragOrientation>,
    selected_tangent: Option<(TangentSide, SelectedKey)>,
    selection_rect: Option<ZoomRect>,
    bbox_drawn: bool,
    clipboard: Vec<KeyFrame>,
    view_initialized: bool,
}

impl CurveEditorState {
    /// Create an editor over `curves`
    pub fn new(curves: CurveSet, settings: CurveEditorSettings) -> Self {
        Self {
            curves,
            zoom: ZoomContext::new(),
            selection: KeySelection::new(),
            timeline: Timeline::default(),
            settings,
            state: EventState::None,
            drag_start: Pos2::ZERO,
            last_mouse_pos: Pos2::ZERO,
            key_drag_last_movement: ZoomPoint::default(),
            drag_orientation: None,
            selected_tangent: None,
            selection_rect: None,
            bbox_drawn: false,
            clipboard: Vec::new(),
            view_initialized: false,
        }
    }

    /// Current drag state
    pub fn state(&self) -> EventState {
        self.state
    }

    /// Whether the selection bounding box is shown and grabbable
    pub fn bbox_drawn(&self) -> bool {
        self.bbox_drawn
    }

    /// Rubber band rectangle while selecting
    pub fn selection_rect(&self) -> Option<ZoomRect> {
        self.selection_rect
    }

    /// Tangent being dragged
    pub fn selected_tangent(&self) -> Option<(TangentSide, SelectedKey)> {
        self.selected_tangent
    }

    /// Axis the current drag is locked to
    pub fn drag_orientation(&self) -> Option<DragOrientation> {
        self.drag_orientation
    }

    /// Keys held by the clipboard
    pub fn clipboard(&self) -> &[KeyFrame] {
        &self.clipboard
    }

    /// Resize the view. The first resize shows the default area.
    pub fn resize(&mut self, width: f64, height: f64) {
        if width == self.zoom.screen_width() && height == self.zoom.screen_height() && self.view_initialized {
            return;
        }
        self.zoom.set_screen_size(width, height);
        if !self.view_initialized {
            let view = self.settings.default_view;
            self.zoom.fit(view.left, view.right, view.bottom, view.top);
            self.view_initialized = true;
        }
        self.refresh_tangents();
    }

    /// Probes over the current state
    pub fn hit_tester<'a>(&'a self, metrics: &'a dyn TextMetrics) -> CurveHitTester<'a> {
        CurveHitTester::new(
            &self.zoom,
            &self.curves,
            &self.selection,
            &self.timeline,
            &self.settings,
            metrics,
        )
    }

    /// Resolve what a press at `pt` would grab
    pub fn resolve_press_target(&self, pt: Pos2, metrics: &dyn TextMetrics) -> PressTarget {
        let tester = self.hit_tester(metrics);

        if self.bbox_drawn {
            if tester.is_nearby_selected_keyframes_cross_widget(pt) {
                return PressTarget::BboxCross;
            }
            if let Some(handle) = tester.nearby_bbox_handle(pt) {
                return PressTarget::BboxHandle(handle);
            }
        }
        if let Some((side, selected)) = tester.is_nearby_tangent(pt) {
            if selected.key.interpolation != KeyframeType::Constant {
                return PressTarget::Tangent(side, selected);
            }
        }
        if let Some(hit) = tester.is_nearby_keyframe(pt) {
            return PressTarget::KeyFrame(hit);
        }
        if let Some(selected) = tester.is_nearby_keyframe_text(pt) {
            return PressTarget::KeyText(selected);
        }
        if let Some((side, selected)) = tester.is_nearby_selected_tangent_text(pt) {
            return PressTarget::TangentText(side, selected);
        }
        if tester.is_nearby_timeline_btm_poly(pt) || tester.is_nearby_timeline_top_poly(pt) {
            return PressTarget::TimelineMarker;
        }
        if let Some(hit) = tester.is_nearby_curve(pt) {
            return PressTarget::Curve(hit);
        }
        PressTarget::Nothing
    }

    fn begin_drag(&mut self, state: EventState, pt: Pos2) {
        tracing::debug!("Curve editor drag: {:?} -> {:?}", self.state, state);
        self.state = state;
        self.drag_start = pt;
        self.last_mouse_pos = pt;
        self.key_drag_last_movement = ZoomPoint::default();
        self.drag_orientation = None;
    }

    /// Handle a mouse press at `pt`, in widget pixels
    pub fn mouse_press(
        &mut self,
        pt: Pos2,
        buttons: MouseButtons,
        modifiers: Modifiers,
        metrics: &dyn TextMetrics,
    ) -> PressOutcome {
        if buttons.right {
            self.drag_start = pt;
            return PressOutcome::OpenContextMenu;
        }

        let ctrl = is_ctrl(&modifiers);
        if ctrl && modifiers.alt {
            let hit = self.hit_tester(metrics).is_nearby_curve(pt);
            if let Some(hit) = hit {
                self.curves.select_curve(Some(hit.curve));
                return match self.add_key_on_curve(&hit) {
                    Ok(key) => {
                        self.bbox_drawn = false;
                        self.selection.clear();
                        self.select_key(hit.curve, key);
                        self.begin_drag(EventState::DraggingKeys, pt);
                        PressOutcome::KeyAdded { curve: hit.curve, key }
                    }
                    Err(err) => PressOutcome::Rejected(err),
                };
            }
        }

        if buttons.middle && !buttons.left && !modifiers.alt {
            self.begin_drag(EventState::DraggingView, pt);
            return PressOutcome::Started(EventState::DraggingView);
        }
        let zoom_drag = (buttons.middle && (modifiers.alt || buttons.left))
            || (buttons.left && modifiers.alt && modifiers.mac_cmd);
        if zoom_drag {
            self.begin_drag(EventState::Zooming, pt);
            return PressOutcome::Started(EventState::Zooming);
        }

        let state = match self.resolve_press_target(pt, metrics) {
            PressTarget::BboxCross => EventState::DraggingKeys,
            PressTarget::BboxHandle(handle) => EventState::DraggingBbox(handle),
            PressTarget::Tangent(side, selected) => {
                self.selected_tangent = Some((side, selected));
                EventState::DraggingTangent
            }
            PressTarget::KeyFrame(hit) => {
                self.bbox_drawn = false;
                if !ctrl {
                    self.selection.clear();
                }
                self.curves.select_curve(Some(hit.curve));
                self.select_key(hit.curve, hit.key.id);
                EventState::DraggingKeys
            }
            PressTarget::KeyText(_) | PressTarget::TangentText(..) => return PressOutcome::Consumed,
            PressTarget::TimelineMarker => EventState::DraggingTimeline,
            PressTarget::Curve(hit) => {
                self.curves.select_curve(Some(hit.curve));
                self.start_selecting(ctrl)
            }
            PressTarget::Nothing => self.start_selecting(ctrl),
        };

        self.begin_drag(state, pt);
        PressOutcome::Started(state)
    }

    fn start_selecting(&mut self, ctrl: bool) -> EventState {
        self.bbox_drawn = false;
        if !ctrl {
            self.selection.clear();
        }
        EventState::Selecting
    }

    fn select_key(&mut self, curve_id: CurveId, key: KeyFrameId) {
        let Some(curve) = self.curves.curve(curve_id) else {
            return;
        };
        if let Some(selected) = curve
            .index_of(key)
            .and_then(|index| SelectedKey::new(&self.zoom, curve, index))
        {
            self.selection.insert_conditionally(selected);
        }
    }

    /// Add a key where a curve passes under the pointer
    fn add_key_on_curve(&mut self, hit: &CurveHit) -> std::result::Result<KeyFrameId, CurveError> {
        let curve = self
            .curves
            .curve_mut(hit.curve)
            .ok_or(CurveError::UnknownCurve(hit.curve))?;
        if let Err(err) = curve.check_y_range(hit.y) {
            tracing::warn!("Cannot add a key on '{}': {}", curve.name, err);
            return Err(err);
        }
        let time = curve.clamp_time(hit.x);
        let key = curve.add_keyframe(time, hit.y);
        tracing::debug!("Added key at ({}, {}) on '{}'", time, hit.y, curve.name);
        Ok(key)
    }

    /// Pointer shape for hovering at `pt`
    pub fn hover_cursor(&self, pt: Pos2, metrics: &dyn TextMetrics) -> CursorShape {
        let tester = self.hit_tester(metrics);
        if self.bbox_drawn {
            if tester.is_nearby_selected_keyframes_cross_widget(pt) {
                return CursorShape::Move;
            }
            if let Some(handle) = tester.nearby_bbox_handle(pt) {
                return CursorShape::for_handle(handle);
            }
        }
        if tester.is_nearby_keyframe(pt).is_some() || tester.is_nearby_tangent(pt).is_some() {
            return CursorShape::Crosshair;
        }
        if tester.is_nearby_keyframe_text(pt).is_some()
            || tester.is_nearby_selected_tangent_text(pt).is_some()
        {
            return CursorShape::Text;
        }
        if tester.is_nearby_timeline_btm_poly(pt) || tester.is_nearby_timeline_top_poly(pt) {
            return CursorShape::ResizeHorizontal;
        }
        CursorShape::Default
    }

    /// Handle a pointer move to `pt`. Returns the cursor to show.
    pub fn mouse_move(&mut self, pt: Pos2, modifiers: Modifiers, metrics: &dyn TextMetrics) -> CursorShape {
        let cursor = self.hover_cursor(pt, metrics);
        if self.state == EventState::None {
            self.last_mouse_pos = pt;
            return cursor;
        }

        if self.drag_orientation.is_none() {
            let diff = pt - self.drag_start;
            if f64::from(diff.x.abs() + diff.y.abs()) > self.settings.drag_orientation_threshold {
                self.drag_orientation = Some(if diff.x.abs() > diff.y.abs() {
                    DragOrientation::Horizontal
                } else {
                    DragOrientation::Vertical
                });
            }
        }

        let new = self.zoom.to_zoom_coordinates(pt);
        let old = self.zoom.to_zoom_coordinates(self.last_mouse_pos);

        match self.state {
            EventState::None => {}
            EventState::DraggingView => {
                self.zoom.translate(old.x - new.x, old.y - new.y);
                self.refresh_tangents();
            }
            EventState::DraggingKeys => {
                if !self.selection.is_empty() && self.drag_orientation.is_some() {
                    self.move_selected_keyframes(old, new, is_ctrl(&modifiers));
                }
            }
            EventState::DraggingBbox(handle) => {
                if !self.selection.is_empty() {
                    self.transform_selected_keyframes(handle, old, new, modifiers.shift);
                }
            }
            EventState::Selecting => self.refresh_selection_rectangle(pt),
            EventState::DraggingTangent => self.move_selected_tangent(new),
            EventState::DraggingTimeline => self.timeline.seek(new.x.floor() as i32),
            EventState::Zooming => {
                let delta_x = 2.0 * f64::from(pt.x - self.last_mouse_pos.x);
                let delta_y = -2.0 * f64::from(pt.y - self.last_mouse_pos.y);
                let center = self.zoom.to_zoom_coordinates(self.drag_start);
                let per_delta = self.settings.wheel_zoom_per_delta;
                self.zoom.zoomy(center.y, per_delta.powf(delta_y));
                self.zoom.zoomx(center.x, per_delta.powf(delta_x));
                self.refresh_tangents();
            }
        }

        self.last_mouse_pos = pt;
        cursor
    }

    /// Handle the end of a press
    pub fn mouse_release(&mut self) {
        if self.state != EventState::None {
            tracing::debug!("Curve editor drag: {:?} -> None", self.state);
        }
        self.state = EventState::None;
        self.selection_rect = None;
        self.selected_tangent = None;
        if self.selection.len() > 1 {
            self.bbox_drawn = true;
        }
    }

    /// Zoom with the wheel about `pt`. Ctrl zooms time only, Ctrl+Shift values only.
    pub fn wheel(&mut self, pt: Pos2, delta: f64, modifiers: Modifiers) {
        let scale = self.settings.wheel_zoom_per_delta.powf(delta);
        let center = self.zoom.to_zoom_coordinates(pt);
        let ctrl = is_ctrl(&modifiers);

        if ctrl && modifiers.shift {
            self.zoom.zoomy(center.y, scale);
        } else if ctrl {
            self.zoom.zoomx(center.x, scale);
        } else {
            self.zoom.zoom(center, scale);
        }
        self.refresh_tangents();
    }

    /// Handle a double click at `pt`
    pub fn mouse_double_click(&mut self, pt: Pos2, metrics: &dyn TextMetrics) -> DoubleClickOutcome {
        let hit = {
            let tester = self.hit_tester(metrics);
            if tester.is_nearby_keyframe(pt).is_some() || tester.is_nearby_tangent(pt).is_some() {
                return DoubleClickOutcome::Nothing;
            }
            if let Some(selected) = tester.is_nearby_keyframe_text(pt) {
                return DoubleClickOutcome::EditKey(selected);
            }
            if let Some((side, selected)) = tester.is_nearby_selected_tangent_text(pt) {
                return DoubleClickOutcome::EditDerivative(side, selected);
            }
            tester.is_nearby_curve(pt)
        };

        let Some(hit) = hit else {
            return DoubleClickOutcome::Nothing;
        };
        match self.add_key_on_curve(&hit) {
            Ok(key) => {
                self.on_curves_changed();
                DoubleClickOutcome::KeyAdded { curve: hit.curve, key }
            }
            Err(err) => DoubleClickOutcome::Rejected(err),
        }
    }

    /// Snap a drag movement to the value domain of the selected curves
    fn clamp_movement_value(&self, mut movement: ZoomPoint) -> ZoomPoint {
        for selected in self.selection.keys() {
            match self.curves.curve(selected.curve).map(|c| c.value_kind) {
                Some(ValueKind::Bool) => {
                    movement.y = (movement.y + 0.5).floor().clamp(0.0, 1.0);
                    break;
                }
                Some(ValueKind::Int) => movement.y = (movement.y + 0.5).floor(),
                _ => {}
            }
        }
        movement
    }

    /// Move the selected keys for a pointer move from `old` to `new`.
    ///
    /// On time-clamped curves, or with `ctrl`, the move is measured from the
    /// press point and only applied along the locked drag axis. Keys never
    /// cross an unselected neighbour.
    pub fn move_selected_keyframes(&mut self, old: ZoomPoint, new: ZoomPoint, ctrl: bool) {
        let Some(first) = self.selection.keys().first() else {
            return;
        };
        let clamp_to_integers = self
            .curves
            .curve(first.curve)
            .is_some_and(|c| c.time_clamped_to_integers);
        let one_direction = ctrl || clamp_to_integers;
        let drag_start = self.zoom.to_zoom_coordinates(self.drag_start);

        let mut total = if one_direction { new - drag_start } else { new - old };
        if clamp_to_integers {
            total.x = (total.x + 0.5).floor();
            total = self.clamp_movement_value(total);
        }

        let horizontal = self.drag_orientation == Some(DragOrientation::Horizontal);
        let vertical = self.drag_orientation == Some(DragOrientation::Vertical);
        let last = self.key_drag_last_movement;

        let mut dt = match (one_direction, horizontal) {
            (false, _) => total.x,
            (true, true) => total.x - last.x,
            (true, false) => 0.0,
        };
        let mut dv = match (one_direction, vertical) {
            (false, _) => total.y,
            (true, true) => total.y - last.y,
            (true, false) => 0.0,
        };

        let epsilon = if clamp_to_integers { 1.0 } else { 1e-4 };
        let mut max_left = f64::MIN;
        let mut max_right = f64::MAX;
        for selected in self.selection.keys() {
            let Some(curve) = self.curves.curve(selected.curve) else {
                continue;
            };
            if !curve.y_movable {
                dv = 0.0;
            }
            let Some(index) = curve.index_of(selected.key.id) else {
                continue;
            };
            let keys = curve.keyframes();
            let time = keys[index].time;
            if let Some(next) = keys.get(index + 1) {
                if !self.selection.contains(curve.id, next.id) {
                    max_right = (next.time - time - epsilon).min(max_right).max(0.0);
                }
            }
            if let Some(prev) = index.checked_sub(1).and_then(|i| keys.get(i)) {
                if !self.selection.contains(curve.id, prev.id) {
                    max_left = (prev.time - time + epsilon).max(max_left).min(0.0);
                }
            }
        }
        dt = dt.min(max_right).max(max_left);

        if dt != 0.0 || dv != 0.0 {
            let mut ordered: Vec<(CurveId, KeyFrame)> =
                self.selection.keys().iter().map(|k| (k.curve, k.key)).collect();
            if dt < 0.0 {
                ordered.sort_by(|a, b| a.1.time.total_cmp(&b.1.time));
            } else {
                ordered.sort_by(|a, b| b.1.time.total_cmp(&a.1.time));
            }
            for (curve_id, key) in ordered {
                if let Some(curve) = self.curves.curve_mut(curve_id) {
                    if let Err(err) = curve.move_keyframe(key.id, dt, dv) {
                        tracing::warn!("Failed to move key at {}: {}", key.time, err);
                    }
                }
            }
            self.refresh_tangents();
        }

        if !one_direction || horizontal {
            self.key_drag_last_movement.x = total.x;
        }
        if !one_direction || vertical {
            self.key_drag_last_movement.y = total.y;
        }
    }

    /// Scale the selected keys for a drag of `handle` from `old` to `new`
    pub fn transform_selected_keyframes(
        &mut self,
        handle: BboxHandle,
        old: ZoomPoint,
        new: ZoomPoint,
        shift: bool,
    ) {
        if new == old {
            return;
        }
        let drag_start = self.zoom.to_zoom_coordinates(self.drag_start);
        let total = self.clamp_movement_value(new - drag_start);
        let dt = total.x - self.key_drag_last_movement.x;
        let dv = total.y - self.key_drag_last_movement.y;

        if dt != 0.0 || dv != 0.0 {
            let Some(bbox) = self.selection.bounding_box() else {
                return;
            };
            let mut center = bbox.center();
            if shift {
                if let Some(anchor) = handle.opposite_anchor(&bbox) {
                    center = anchor;
                }
            }

            let previous = ZoomPoint::new(new.x - dt, new.y - dv);
            let prev_dist = previous.distance(center);
            let (mut sx, mut sy) = (1.0, 1.0);
            if prev_dist != 0.0 {
                let ratio = new.distance(center) / prev_dist;
                if handle.is_corner() {
                    sx = ratio;
                    sy = ratio;
                } else if handle.scales_x() {
                    sx = ratio;
                } else {
                    sy = ratio;
                }
            }

            let mut ordered: Vec<(CurveId, KeyFrame)> =
                self.selection.keys().iter().map(|k| (k.curve, k.key)).collect();
            // Keys moving away from the center go first when growing, last when shrinking
            let from_center = |key: &KeyFrame| (key.time - center.x).abs();
            if sx > 1.0 {
                ordered.sort_by(|a, b| from_center(&b.1).total_cmp(&from_center(&a.1)));
            } else {
                ordered.sort_by(|a, b| from_center(&a.1).total_cmp(&from_center(&b.1)));
            }
            for (curve_id, key) in ordered {
                if let Some(curve) = self.curves.curve_mut(curve_id) {
                    if let Err(err) = curve.transform_keyframe(key.id, (center.x, center.y), sx, sy) {
                        tracing::warn!("Failed to scale key at {}: {}", key.time, err);
                    }
                }
            }
            self.refresh_tangents();
        }

        if dt != 0.0 {
            self.key_drag_last_movement.x = total.x;
        }
        if dv != 0.0 {
            self.key_drag_last_movement.y = total.y;
        }
    }

    /// Point the dragged tangent at `pos`
    pub fn move_selected_tangent(&mut self, pos: ZoomPoint) {
        let Some((side, selected)) = self.selected_tangent else {
            return;
        };
        let Some(key) = self
            .curves
            .curve(selected.curve)
            .and_then(|c| c.keyframe(selected.key.id))
            .copied()
        else {
            return;
        };
        let dx = key.time - pos.x;
        let dy = key.value - pos.y;
        if dx.abs() < 1e-12 {
            return;
        }
        let derivative = dy / dx;

        let Some(curve) = self.curves.curve_mut(selected.curve) else {
            return;
        };
        let result = match side {
            TangentSide::Left => curve.set_left_derivative(key.id, derivative),
            TangentSide::Right => curve.set_right_derivative(key.id, derivative),
        };
        if let Err(err) = result {
            tracing::warn!("Failed to set derivative: {}", err);
            return;
        }

        self.refresh_tangents();
        self.selected_tangent = self
            .selection
            .keys()
            .iter()
            .find(|k| k.curve == selected.curve && k.key.id == key.id)
            .map(|k| (side, *k));
    }

    /// Select the keys inside the rectangle from the press point to `pt`
    pub fn refresh_selection_rectangle(&mut self, pt: Pos2) {
        let rect = ZoomRect::from_corners(
            self.zoom.to_zoom_coordinates(self.drag_start),
            self.zoom.to_zoom_coordinates(pt),
        );
        self.selection.set(keys_in_rect(&self.zoom, &self.curves, &rect));
        self.selection_rect = Some(rect);
    }

    /// Recompute selected key snapshots and tangent handles
    pub fn refresh_tangents(&mut self) {
        self.selection.refresh(&self.zoom, &self.curves);
    }

    /// Resynchronize the selection after curves changed outside the editor
    pub fn on_curves_changed(&mut self) {
        self.refresh_tangents();
        if self.selection.len() < 2 {
            self.bbox_drawn = false;
        }
        if let Some((_, selected)) = self.selected_tangent {
            if !self.selection.contains(selected.curve, selected.key.id) {
                self.selected_tangent = None;
            }
        }
    }

    /// Select every key of the visible curves
    pub fn select_all_keyframes(&mut self) {
        let all = ZoomRect {
            left: f64::NEG_INFINITY,
            right: f64::INFINITY,
            bottom: f64::NEG_INFINITY,
            top: f64::INFINITY,
        };
        self.selection.set(keys_in_rect(&self.zoom, &self.curves, &all));
        self.bbox_drawn = self.selection.len() > 1;
    }

    /// Delete the selected keys. Returns how many were removed.
    pub fn delete_selected_keyframes(&mut self) -> usize {
        let mut removed = 0;
        for selected in self.selection.keys() {
            if let Some(curve) = self.curves.curve_mut(selected.curve) {
                if curve.remove_keyframe(selected.key.id).is_ok() {
                    removed += 1;
                }
            }
        }
        self.selection.clear();
        self.bbox_drawn = false;
        tracing::debug!("Deleted {} keys", removed);
        removed
    }

    /// Copy the selected keys of the first selected curve
    pub fn copy_selected_keyframes(&mut self) -> usize {
        let Some(first) = self.selection.keys().first().map(|k| k.curve) else {
            return 0;
        };
        self.clipboard = self
            .selection
            .keys()
            .iter()
            .filter(|k| k.curve == first)
            .map(|k| k.key)
            .collect();
        self.clipboard.len()
    }

    /// Paste the clipboard into the selected curve
    pub fn paste_keyframes_to_selected_curve(&mut self) -> Result<usize> {
        let Some(id) = self.curves.selected_curve_id() else {
            tracing::warn!("Paste needs a selected curve");
            return Err(EditorError::NoCurveSelected);
        };
        if self.clipboard.is_empty() {
            tracing::warn!("Nothing to paste");
            return Err(EditorError::EmptyClipboard);
        }
        let curve = self.curves.curve_mut(id).ok_or(CurveError::UnknownCurve(id))?;
        for key in &self.clipboard {
            curve.insert_keyframe(
                KeyFrame::new(key.time, key.value)
                    .with_interpolation(key.interpolation)
                    .with_derivatives(key.left_derivative, key.right_derivative),
            );
        }
        let pasted = self.clipboard.len();
        self.on_curves_changed();
        Ok(pasted)
    }

    /// Change the interpolation of every selected key
    pub fn set_selected_interpolation(&mut self, kind: KeyframeType) {
        for selected in self.selection.keys() {
            if let Some(curve) = self.curves.curve_mut(selected.curve) {
                if let Err(err) = curve.set_interpolation(selected.key.id, kind) {
                    tracing::warn!("Failed to set interpolation: {}", err);
                }
            }
        }
        self.refresh_tangents();
    }

    /// Show the keys of the given curves, padded by a tenth on each side
    pub fn center_on(&mut self, ids: &[CurveId]) {
        let mut bounds: Option<(f64, f64, f64, f64)> = None;
        for curve in ids.iter().filter_map(|id| self.curves.curve(*id)) {
            if let Some((t0, t1, v0, v1)) = curve.keyframe_bounds() {
                bounds = Some(match bounds {
                    Some((l, r, b, t)) => (l.min(t0), r.max(t1), b.min(v0), t.max(v1)),
                    None => (t0, t1, v0, v1),
                });
            }
        }
        let Some((left, right, bottom, top)) = bounds else {
            return;
        };
        self.fit_padded(left, right, bottom, top);
    }

    fn fit_padded(&mut self, left: f64, right: f64, bottom: f64, top: f64) {
        let pad = |min: f64, max: f64| {
            let extent = max - min;
            if extent > 0.0 {
                (min - extent / 10.0, max + extent / 10.0)
            } else {
                (min - 1.0, max + 1.0)
            }
        };
        let (left, right) = pad(left, right);
        let (bottom, top) = pad(bottom, top);
        self.zoom.fit(left, right, bottom, top);
        self.refresh_tangents();
    }

    /// Frame the curves owning selected keys, the selected curve, or all visible curves
    pub fn center_on_selected_curves(&mut self) {
        let mut ids = self.selection.curves();
        if ids.is_empty() {
            ids.extend(self.curves.selected_curve_id());
        }
        if ids.is_empty() {
            ids = self.curves.visible_curves().map(|c| c.id).collect();
        }
        self.center_on(&ids);
    }

    /// Frame the selected keys, or the selected curves when no key is selected
    pub fn frame_selected(&mut self) {
        match self.selection.bounding_box() {
            Some(bbox) => self.fit_padded(bbox.left, bbox.right, bbox.bottom, bbox.top),
            None => self.center_on_selected_curves(),
        }
    }

    fn set_selected_expression(&mut self, expression: Option<CurveExpression>) -> Result<()> {
        let id = self.curves.selected_curve_id().ok_or(EditorError::NoCurveSelected)?;
        let curve = self.curves.curve_mut(id).ok_or(CurveError::UnknownCurve(id))?;
        curve.expression = expression;
        tracing::info!(
            "Expression of '{}' set to {}",
            curve.name,
            expression.map_or("none", |e| e.name())
        );
        Ok(())
    }

    /// Loop the selected curve over `first..=last`
    pub fn loop_selected_curve(&mut self, first: i32, last: i32) -> Result<()> {
        if last < first {
            return Err(CurveError::Expression(format!("loop range {first}..{last} is empty")).into());
        }
        self.set_selected_expression(Some(CurveExpression::Loop { first, last }))
    }

    /// Mirror the selected curve around zero
    pub fn negate_selected_curve(&mut self) -> Result<()> {
        self.set_selected_expression(Some(CurveExpression::Negate))
    }

    /// Play the selected curve backwards
    pub fn reverse_selected_curve(&mut self) -> Result<()> {
        self.set_selected_expression(Some(CurveExpression::Reverse))
    }

    /// Remove the expression of the selected curve
    pub fn clear_selected_curve_expression(&mut self) -> Result<()> {
        self.set_selected_expression(None)
    }

    fn ascii_columns(&self, columns: &[(usize, CurveId)]) -> Result<Vec<(usize, &Curve)>> {
        columns
            .iter()
            .map(|&(column, id)| {
                let curve = self.curves.curve(id).ok_or(CurveError::UnknownCurve(id))?;
                if !curve.visible {
                    return Err(CurveError::Ascii(format!("curve '{}' is hidden", curve.name)).into());
                }
                Ok((column, curve))
            })
            .collect()
    }

    /// Sample visible curves to text, one column per `(column, curve)` pair
    pub fn export_curves_ascii(&self, columns: &[(usize, CurveId)], sampling: &AsciiSampling) -> Result<String> {
        let curves = self.ascii_columns(columns)?;
        let text = export_ascii(&curves, sampling)?;
        tracing::info!("Exported {} curves", curves.len());
        Ok(text)
    }

    /// Replace the keys of visible curves with the rows of `text`
    pub fn import_curves_ascii(
        &mut self,
        text: &str,
        columns: &[(usize, CurveId)],
        sampling: &AsciiSampling,
    ) -> Result<()> {
        let imported = import_ascii(text, &self.ascii_columns(columns)?, sampling)?;
        for (id, keys) in imported {
            if let Some(curve) = self.curves.curve_mut(id) {
                tracing::info!("Imported {} keys into '{}'", keys.len(), curve.name);
                curve.set_keyframes(keys);
            }
        }
        self.selection.clear();
        self.on_curves_changed();
        Ok(())
    }

    /// Set the time and value of a key
    pub fn set_key_time_value(&mut self, selected: &SelectedKey, time: f64, value: f64) -> Result<()> {
        let curve = self
            .curves
            .curve_mut(selected.curve)
            .ok_or(CurveError::UnknownCurve(selected.curve))?;
        curve.check_y_range(value)?;
        curve.set_keyframe_time_value(selected.key.id, time, value)?;
        self.on_curves_changed();
        Ok(())
    }

    /// Set one derivative of a key
    pub fn set_key_derivative(&mut self, selected: &SelectedKey, side: TangentSide, derivative: f64) -> Result<()> {
        let curve = self
            .curves
            .curve_mut(selected.curve)
            .ok_or(CurveError::UnknownCurve(selected.curve))?;
        match side {
            TangentSide::Left => curve.set_left_derivative(selected.key.id, derivative)?,
            TangentSide::Right => curve.set_right_derivative(selected.key.id, derivative)?,
        };
        self.on_curves_changed();
        Ok(())
    }

    /// Show only the given curves
    pub fn show_only_curves(&mut self, ids: &[CurveId]) {
        self.curves.show_only(ids);
        self.on_curves_changed();
    }
}
