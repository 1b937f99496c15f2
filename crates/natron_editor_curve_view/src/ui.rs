// SPDX-License-Identifier: MIT OR Apache-2.0
//! Curve editor UI rendering.
//!
//! Features:
//! - Grid and scale labels on both axes
//! - Curves sampled per pixel column
//! - Keyframes, tangent handles and their labels
//! - Selection bounding box and rubber band
//! - Current frame markers
//! - Context menu, keyboard shortcuts and a numeric edit window
//! - Plain-text export and import of curves

use crate::error::EditorError;
use crate::hit_test::{derivative_label, evaluate_with_fallback, key_label};
use crate::interaction::{CurveEditorState, CursorShape, DoubleClickOutcome, EventState, MouseButtons};
use crate::selection::{BboxHandle, SelectedKey, TangentSide};
use crate::settings::CurveEditorSettings;
use crate::text::{EguiTextMetrics, TextMetrics};
use crate::ticks::scale_ticks;
use crate::zoom::ZoomPoint;
use egui::{Align2, Color32, CursorIcon, FontId, Key, PointerButton, Pos2, Rect, Sense, Shape, Stroke, Vec2};
use natron_editor_curves::{AsciiSampling, CurveId, CurveSet, KeyframeType};

const KEY_RADIUS: f32 = 3.0;
const TANGENT_HANDLE_RADIUS: f32 = 2.5;
const CURVE_WIDTH: f32 = 1.5;
const SELECTED_CURVE_WIDTH: f32 = 2.5;
/// Wheel units per line step, one notch of a classic mouse wheel
const WHEEL_UNITS_PER_LINE: f64 = 120.0;

/// Numeric edit opened by double-clicking a label
#[derive(Debug, Clone, Copy)]
enum EditRequest {
    Key { selected: SelectedKey, time: f64, value: f64 },
    Derivative { side: TangentSide, selected: SelectedKey, value: f64 },
}

/// Curve mapped to a text column
#[derive(Debug, Clone)]
struct AsciiColumn {
    curve: CurveId,
    name: String,
    column: usize,
    enabled: bool,
}

/// Plain-text export or import settings
#[derive(Debug, Clone)]
struct AsciiDialog {
    export: bool,
    path: String,
    start: f64,
    end: f64,
    increment: f64,
    columns: Vec<AsciiColumn>,
}

impl AsciiDialog {
    /// One column per visible curve, in display order
    fn new(export: bool, curves: &CurveSet) -> Self {
        let columns = curves
            .visible_curves()
            .enumerate()
            .map(|(column, curve)| AsciiColumn {
                curve: curve.id,
                name: curve.name.clone(),
                column,
                enabled: true,
            })
            .collect();
        Self {
            export,
            path: "curves.txt".to_string(),
            start: 0.0,
            end: 100.0,
            increment: 1.0,
            columns,
        }
    }

    fn sampling(&self) -> AsciiSampling {
        AsciiSampling::new(self.start, self.end, self.increment)
    }

    fn mapping(&self) -> Vec<(usize, CurveId)> {
        self.columns
            .iter()
            .filter(|c| c.enabled)
            .map(|c| (c.column, c.curve))
            .collect()
    }
}

/// Interpolation shortcut keys
const INTERPOLATION_KEYS: [(Key, KeyframeType); 7] = [
    (Key::K, KeyframeType::Constant),
    (Key::L, KeyframeType::Linear),
    (Key::R, KeyframeType::Smooth),
    (Key::C, KeyframeType::CatmullRom),
    (Key::X, KeyframeType::Cubic),
    (Key::Z, KeyframeType::Horizontal),
    (Key::H, KeyframeType::Broken),
];

/// Convert a wheel event to wheel units
pub fn wheel_units(unit: egui::MouseWheelUnit, delta: f32, page_height: f32) -> f64 {
    let delta = f64::from(delta);
    match unit {
        egui::MouseWheelUnit::Point => delta,
        egui::MouseWheelUnit::Line => delta * WHEEL_UNITS_PER_LINE,
        egui::MouseWheelUnit::Page => delta * f64::from(page_height),
    }
}

/// egui cursor for a cursor shape
pub fn cursor_icon(shape: CursorShape) -> CursorIcon {
    match shape {
        CursorShape::Default => CursorIcon::Default,
        CursorShape::Move => CursorIcon::Move,
        CursorShape::ResizeNwSe => CursorIcon::ResizeNwSe,
        CursorShape::ResizeNeSw => CursorIcon::ResizeNeSw,
        CursorShape::ResizeHorizontal => CursorIcon::ResizeHorizontal,
        CursorShape::ResizeVertical => CursorIcon::ResizeVertical,
        CursorShape::Crosshair => CursorIcon::Crosshair,
        CursorShape::Text => CursorIcon::Text,
    }
}

/// Curve editor panel for integration with an egui host
pub struct CurveEditorPanel {
    /// Panel name
    pub name: String,
    /// Editor state
    pub state: CurveEditorState,
    edit: Option<EditRequest>,
    ascii: Option<AsciiDialog>,
    cursor: CursorShape,
    loop_range: (i32, i32),
    status: Option<String>,
}

impl CurveEditorPanel {
    /// Create a panel over `curves`
    pub fn new(name: impl Into<String>, curves: CurveSet, settings: CurveEditorSettings) -> Self {
        Self {
            name: name.into(),
            state: CurveEditorState::new(curves, settings),
            edit: None,
            ascii: None,
            cursor: CursorShape::Default,
            loop_range: (1, 100),
            status: None,
        }
    }

    fn report<T>(&mut self, what: &str, result: crate::error::Result<T>) {
        match result {
            Ok(_) => self.status = None,
            Err(err) => {
                tracing::warn!("{} failed: {}", what, err);
                self.status = Some(format!("{what}: {err}"));
            }
        }
    }

    /// Render the panel UI
    pub fn ui(&mut self, ui: &mut egui::Ui) {
        let rect = ui.available_rect_before_wrap();
        let response = ui.interact(rect, ui.id().with("curve_editor_view"), Sense::click_and_drag());
        self.state.resize(f64::from(rect.width()), f64::from(rect.height()));

        let font = FontId::monospace(self.state.settings.font_size);
        let ctx = ui.ctx().clone();
        let metrics = EguiTextMetrics::new(&ctx, font.clone());

        self.handle_pointer(ui, rect, &response, &metrics);
        self.handle_keyboard(ui, &response);
        self.context_menu(&response);

        let painter = ui.painter_at(rect);
        self.paint_background(&painter, rect);
        self.paint_grid(&painter, rect, &font, &metrics);
        self.paint_curves(&painter, rect);
        self.paint_keys(&painter, rect, &font);
        self.paint_bbox(&painter, rect);
        self.paint_selection_rect(&painter, rect);
        self.paint_timeline(&painter, rect);

        if let Some(status) = &self.status {
            painter.text(
                rect.left_bottom() + Vec2::new(8.0, -8.0),
                Align2::LEFT_BOTTOM,
                status,
                font,
                Color32::from_rgb(255, 150, 100),
            );
        }

        if response.hovered() || self.state.state() != EventState::None {
            ctx.set_cursor_icon(cursor_icon(self.cursor));
        }

        self.edit_window(&ctx);
        self.ascii_window(&ctx);
    }

    /// Feed pointer events to the state machine
    fn handle_pointer(&mut self, ui: &egui::Ui, rect: Rect, response: &egui::Response, metrics: &dyn TextMetrics) {
        let to_local = |p: Pos2| (p - rect.min).to_pos2();
        let (events, modifiers, buttons) = ui.input(|i| {
            let buttons = MouseButtons {
                left: i.pointer.button_down(PointerButton::Primary),
                middle: i.pointer.button_down(PointerButton::Middle),
                right: i.pointer.button_down(PointerButton::Secondary),
            };
            (i.events.clone(), i.modifiers, buttons)
        });

        for event in events {
            match event {
                egui::Event::PointerButton { pos, button, pressed: true, modifiers } if response.hovered() => {
                    let pressed = MouseButtons {
                        left: buttons.left || button == PointerButton::Primary,
                        middle: buttons.middle || button == PointerButton::Middle,
                        right: button == PointerButton::Secondary,
                    };
                    let outcome = self.state.mouse_press(to_local(pos), pressed, modifiers, metrics);
                    tracing::trace!("Press outcome: {:?}", outcome);
                }
                egui::Event::PointerButton { pressed: false, .. } => self.state.mouse_release(),
                egui::Event::PointerMoved(pos)
                    if response.hovered() || self.state.state() != EventState::None =>
                {
                    self.cursor = self.state.mouse_move(to_local(pos), modifiers, metrics);
                }
                egui::Event::MouseWheel { unit, delta, modifiers } if response.hovered() => {
                    if let Some(pos) = response.hover_pos() {
                        let units = wheel_units(unit, delta.y, rect.height());
                        self.state.wheel(to_local(pos), units, modifiers);
                    }
                }
                _ => {}
            }
        }

        if response.double_clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                match self.state.mouse_double_click(to_local(pos), metrics) {
                    DoubleClickOutcome::EditKey(selected) => {
                        self.edit = Some(EditRequest::Key {
                            selected,
                            time: selected.key.time,
                            value: selected.key.value,
                        });
                    }
                    DoubleClickOutcome::EditDerivative(side, selected) => {
                        self.edit = Some(EditRequest::Derivative {
                            side,
                            selected,
                            value: selected.derivative(side),
                        });
                    }
                    DoubleClickOutcome::Rejected(err) => self.status = Some(err.to_string()),
                    DoubleClickOutcome::KeyAdded { .. } | DoubleClickOutcome::Nothing => {}
                }
            }
        }
    }

    /// Keyboard shortcuts while the view is hovered
    fn handle_keyboard(&mut self, ui: &egui::Ui, response: &egui::Response) {
        if !response.hovered() || self.edit.is_some() {
            return;
        }
        let (delete, select_all, copy, paste, frame, interpolation) = ui.input(|i| {
            let command = i.modifiers.command;
            let interpolation = INTERPOLATION_KEYS
                .iter()
                .find(|(key, _)| !command && i.key_pressed(*key))
                .map(|(_, kind)| *kind);
            (
                i.key_pressed(Key::Delete) || i.key_pressed(Key::Backspace),
                command && i.key_pressed(Key::A),
                i.events.iter().any(|e| matches!(e, egui::Event::Copy)) || (command && i.key_pressed(Key::C)),
                i.events.iter().any(|e| matches!(e, egui::Event::Paste(_))) || (command && i.key_pressed(Key::V)),
                !command && i.key_pressed(Key::F),
                interpolation,
            )
        });

        if delete {
            self.state.delete_selected_keyframes();
        }
        if select_all {
            self.state.select_all_keyframes();
        }
        if copy {
            self.state.copy_selected_keyframes();
        }
        if paste {
            let result = self.state.paste_keyframes_to_selected_curve();
            self.report("Paste", result);
        }
        if frame {
            self.state.frame_selected();
        }
        if let Some(kind) = interpolation {
            self.state.set_selected_interpolation(kind);
        }
    }

    fn context_menu(&mut self, response: &egui::Response) {
        response.context_menu(|ui| {
            let has_selection = !self.state.selection.is_empty();

            if ui.add_enabled(has_selection, egui::Button::new("Delete keyframes")).clicked() {
                self.state.delete_selected_keyframes();
                ui.close_menu();
            }
            if ui.add_enabled(has_selection, egui::Button::new("Copy keyframes")).clicked() {
                self.state.copy_selected_keyframes();
                ui.close_menu();
            }
            if ui
                .add_enabled(!self.state.clipboard().is_empty(), egui::Button::new("Paste keyframes"))
                .clicked()
            {
                let result = self.state.paste_keyframes_to_selected_curve();
                self.report("Paste", result);
                ui.close_menu();
            }
            if ui.button("Select all keyframes").clicked() {
                self.state.select_all_keyframes();
                ui.close_menu();
            }

            ui.separator();

            ui.add_enabled_ui(has_selection, |ui| {
                ui.menu_button("Interpolation", |ui| {
                    for kind in KeyframeType::all() {
                        if ui.button(kind.name()).clicked() {
                            self.state.set_selected_interpolation(*kind);
                            ui.close_menu();
                        }
                    }
                });
            });

            let has_curve = self.state.curves.selected_curve_id().is_some();
            ui.add_enabled_ui(has_curve, |ui| {
                ui.menu_button("Expression", |ui| {
                    ui.horizontal(|ui| {
                        ui.add(egui::DragValue::new(&mut self.loop_range.0).prefix("from "));
                        ui.add(egui::DragValue::new(&mut self.loop_range.1).prefix("to "));
                        if ui.button("Loop").clicked() {
                            let (first, last) = self.loop_range;
                            let result = self.state.loop_selected_curve(first, last);
                            self.report("Loop", result);
                            ui.close_menu();
                        }
                    });
                    if ui.button("Negate").clicked() {
                        let result = self.state.negate_selected_curve();
                        self.report("Negate", result);
                        ui.close_menu();
                    }
                    if ui.button("Reverse").clicked() {
                        let result = self.state.reverse_selected_curve();
                        self.report("Reverse", result);
                        ui.close_menu();
                    }
                    if ui.button("Clear expression").clicked() {
                        let result = self.state.clear_selected_curve_expression();
                        self.report("Clear expression", result);
                        ui.close_menu();
                    }
                });
                if ui.button("Show only this curve").clicked() {
                    let ids: Vec<_> = self.state.curves.selected_curve_id().into_iter().collect();
                    self.state.show_only_curves(&ids);
                    ui.close_menu();
                }
            });
            if ui.button("Show all curves").clicked() {
                let ids: Vec<_> = self.state.curves.curves().map(|c| c.id).collect();
                self.state.show_only_curves(&ids);
                ui.close_menu();
            }

            ui.separator();

            if ui.button("Center on curves").clicked() {
                self.state.center_on_selected_curves();
                ui.close_menu();
            }
            if ui.button("Frame selection (F)").clicked() {
                self.state.frame_selected();
                ui.close_menu();
            }

            ui.separator();

            let has_visible = self.state.curves.visible_curves().next().is_some();
            if ui.add_enabled(has_visible, egui::Button::new("Export curve to Ascii")).clicked() {
                self.ascii = Some(AsciiDialog::new(true, &self.state.curves));
                ui.close_menu();
            }
            if ui.add_enabled(has_visible, egui::Button::new("Import curve from Ascii")).clicked() {
                self.ascii = Some(AsciiDialog::new(false, &self.state.curves));
                ui.close_menu();
            }
        });
    }

    fn ascii_window(&mut self, ctx: &egui::Context) {
        let Some(dialog) = &mut self.ascii else {
            return;
        };
        let mut open = true;
        let mut run = false;
        let title = if dialog.export { "Export curves" } else { "Import curves" };

        egui::Window::new(title)
            .collapsible(false)
            .resizable(false)
            .open(&mut open)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label("File:");
                    ui.text_edit_singleline(&mut dialog.path);
                });
                ui.horizontal(|ui| {
                    ui.add(egui::DragValue::new(&mut dialog.start).prefix("start "));
                    if dialog.export {
                        ui.add(egui::DragValue::new(&mut dialog.end).prefix("end "));
                    }
                    ui.add(
                        egui::DragValue::new(&mut dialog.increment)
                            .prefix("step ")
                            .range(0.001..=f64::MAX),
                    );
                });
                ui.separator();
                for column in &mut dialog.columns {
                    ui.horizontal(|ui| {
                        ui.checkbox(&mut column.enabled, column.name.as_str());
                        ui.add(egui::DragValue::new(&mut column.column).prefix("column "));
                    });
                }
                run = ui.button(if dialog.export { "Export" } else { "Import" }).clicked();
            });

        if run {
            let path = std::path::PathBuf::from(&dialog.path);
            let (mapping, sampling) = (dialog.mapping(), dialog.sampling());
            if dialog.export {
                let result = self
                    .state
                    .export_curves_ascii(&mapping, &sampling)
                    .and_then(|text| std::fs::write(&path, text).map_err(EditorError::from));
                self.report("Export", result);
            } else {
                let result = std::fs::read_to_string(&path)
                    .map_err(EditorError::from)
                    .and_then(|text| self.state.import_curves_ascii(&text, &mapping, &sampling));
                self.report("Import", result);
            }
            self.ascii = None;
        } else if !open {
            self.ascii = None;
        }
    }

    fn edit_window(&mut self, ctx: &egui::Context) {
        let Some(mut request) = self.edit else {
            return;
        };
        let mut open = true;
        let mut apply = false;
        let title = match request {
            EditRequest::Key { .. } => "Edit keyframe",
            EditRequest::Derivative { .. } => "Edit derivative",
        };

        egui::Window::new(title)
            .collapsible(false)
            .resizable(false)
            .open(&mut open)
            .show(ctx, |ui| {
                match &mut request {
                    EditRequest::Key { time, value, .. } => {
                        ui.horizontal(|ui| {
                            ui.label("Time:");
                            ui.add(egui::DragValue::new(time).speed(1.0));
                        });
                        ui.horizontal(|ui| {
                            ui.label("Value:");
                            ui.add(egui::DragValue::new(value).speed(0.01));
                        });
                    }
                    EditRequest::Derivative { side, value, .. } => {
                        let label = match side {
                            TangentSide::Left => "Left derivative:",
                            TangentSide::Right => "Right derivative:",
                        };
                        ui.horizontal(|ui| {
                            ui.label(label);
                            ui.add(egui::DragValue::new(value).speed(0.01));
                        });
                    }
                }
                apply = ui.button("Apply").clicked();
            });

        if apply {
            let result = match request {
                EditRequest::Key { selected, time, value } => self.state.set_key_time_value(&selected, time, value),
                EditRequest::Derivative { side, selected, value } => {
                    self.state.set_key_derivative(&selected, side, value)
                }
            };
            self.report("Edit", result);
            self.edit = None;
        } else if open {
            self.edit = Some(request);
        } else {
            self.edit = None;
        }
    }

    fn to_screen(&self, rect: Rect, p: ZoomPoint) -> Pos2 {
        self.state.zoom.to_widget_coordinates(p) + rect.min.to_vec2()
    }

    fn paint_background(&self, painter: &egui::Painter, rect: Rect) {
        painter.rect_filled(rect, 0.0, CurveEditorSettings::color(self.state.settings.background_color));
    }

    fn paint_grid(&self, painter: &egui::Painter, rect: Rect, font: &FontId, metrics: &dyn TextMetrics) {
        let settings = &self.state.settings;
        let zoom = &self.state.zoom;
        let grid = CurveEditorSettings::color(settings.grid_color);
        let scale = CurveEditorSettings::color(settings.scale_color);
        let line_height = metrics.line_height();

        let horizontal = scale_ticks(
            zoom.left(),
            zoom.right(),
            f64::from(rect.width()),
            metrics.text_width("00"),
            settings,
            &|text| metrics.text_width(text),
        );
        for tick in horizontal {
            let x = rect.min.x + zoom.widget_x(tick.value) as f32;
            painter.line_segment(
                [Pos2::new(x, rect.min.y), Pos2::new(x, rect.max.y)],
                Stroke::new(1.0, grid.gamma_multiply(tick.alpha as f32)),
            );
            if let Some(label) = tick.label {
                painter.text(
                    Pos2::new(x, rect.max.y - line_height as f32 - 2.0),
                    Align2::CENTER_TOP,
                    label.text,
                    font.clone(),
                    scale.gamma_multiply(label.alpha as f32),
                );
            }
        }

        let vertical = scale_ticks(
            zoom.bottom(),
            zoom.top(),
            f64::from(rect.height()),
            line_height,
            settings,
            &|_| line_height,
        );
        for tick in vertical {
            let y = rect.min.y + zoom.widget_y(tick.value) as f32;
            painter.line_segment(
                [Pos2::new(rect.min.x, y), Pos2::new(rect.max.x, y)],
                Stroke::new(1.0, grid.gamma_multiply(tick.alpha as f32)),
            );
            if let Some(label) = tick.label {
                painter.text(
                    Pos2::new(rect.min.x + 4.0, y),
                    Align2::LEFT_CENTER,
                    label.text,
                    font.clone(),
                    scale.gamma_multiply(label.alpha as f32),
                );
            }
        }

        // Zero axes
        let axis = Stroke::new(1.0, scale.gamma_multiply(0.5));
        let origin = self.to_screen(rect, ZoomPoint::new(0.0, 0.0));
        if rect.x_range().contains(origin.x) {
            painter.line_segment([Pos2::new(origin.x, rect.min.y), Pos2::new(origin.x, rect.max.y)], axis);
        }
        if rect.y_range().contains(origin.y) {
            painter.line_segment([Pos2::new(rect.min.x, origin.y), Pos2::new(rect.max.x, origin.y)], axis);
        }
    }

    fn paint_curves(&self, painter: &egui::Painter, rect: Rect) {
        let zoom = &self.state.zoom;
        let selected = self.state.curves.selected_curve_id();
        let columns = rect.width().max(1.0) as usize;

        for curve in self.state.curves.visible_curves() {
            let [r, g, b] = curve.color;
            let width = if selected == Some(curve.id) { SELECTED_CURVE_WIDTH } else { CURVE_WIDTH };
            let stroke = Stroke::new(width, Color32::from_rgb(r, g, b));

            // Segments break where the curve cannot be evaluated
            let mut points = Vec::with_capacity(columns + 1);
            for column in 0..=columns {
                let x = zoom.zoom_x(column as f64);
                match evaluate_with_fallback(curve, x) {
                    Some(y) => points.push(self.to_screen(rect, ZoomPoint::new(x, y))),
                    None => {
                        if points.len() > 1 {
                            painter.add(Shape::line(std::mem::take(&mut points), stroke));
                        }
                        points.clear();
                    }
                }
            }
            if points.len() > 1 {
                painter.add(Shape::line(points, stroke));
            }
        }
    }

    fn paint_keys(&self, painter: &egui::Painter, rect: Rect, font: &FontId) {
        let settings = &self.state.settings;
        let selection = &self.state.selection;
        let highlight = CurveEditorSettings::color(settings.selected_key_color);

        for curve in self.state.curves.visible_curves() {
            let [r, g, b] = curve.color;
            let color = Color32::from_rgb(r, g, b);
            for key in curve.keyframes() {
                let pos = self.to_screen(rect, ZoomPoint::new(key.time, key.value));
                if !rect.expand(KEY_RADIUS).contains(pos) {
                    continue;
                }
                let fill = if selection.contains(curve.id, key.id) { highlight } else { color };
                painter.circle_filled(pos, KEY_RADIUS, fill);
            }
        }

        let single = selection.len() == 1;
        for selected in selection.keys() {
            let Some(curve) = self.state.curves.curve(selected.curve) else {
                continue;
            };
            if !curve.visible || curve.is_bezier() {
                continue;
            }
            let pos = self.to_screen(rect, selected.position());

            if single {
                painter.text(
                    pos + Vec2::new(0.0, settings.label_offset as f32),
                    Align2::LEFT_TOP,
                    key_label(&selected.key),
                    font.clone(),
                    highlight,
                );
            }
            if selected.key.interpolation == KeyframeType::Constant {
                continue;
            }

            for side in [TangentSide::Left, TangentSide::Right] {
                let end = self.to_screen(rect, selected.tangent(side));
                painter.line_segment([pos, end], Stroke::new(1.0, highlight));
                painter.circle_filled(end, TANGENT_HANDLE_RADIUS, highlight);
                if single {
                    painter.text(
                        end + Vec2::new(0.0, settings.label_offset as f32),
                        Align2::LEFT_TOP,
                        derivative_label(side, selected.derivative(side), settings.derivative_precision),
                        font.clone(),
                        highlight,
                    );
                }
            }
        }
    }

    fn paint_bbox(&self, painter: &egui::Painter, rect: Rect) {
        if !self.state.bbox_drawn() {
            return;
        }
        let Some(bbox) = self.state.selection.bounding_box() else {
            return;
        };
        let settings = &self.state.settings;
        let stroke = Stroke::new(1.0, CurveEditorSettings::color(settings.bbox_color));

        let top_left = self.to_screen(rect, ZoomPoint::new(bbox.left, bbox.top));
        let btm_right = self.to_screen(rect, ZoomPoint::new(bbox.right, bbox.bottom));
        painter.rect_stroke(Rect::from_two_pos(top_left, btm_right), 0.0, stroke);

        let half = settings.bbox_handle_size as f32;
        for handle in BboxHandle::all() {
            let center = self.to_screen(rect, handle.position(&bbox));
            painter.rect_stroke(Rect::from_center_size(center, Vec2::splat(half * 2.0)), 0.0, stroke);
        }

        let mid = self.to_screen(rect, bbox.center());
        let arm = settings.cross_half_size as f32;
        painter.line_segment([mid - Vec2::new(arm, 0.0), mid + Vec2::new(arm, 0.0)], stroke);
        painter.line_segment([mid - Vec2::new(0.0, arm), mid + Vec2::new(0.0, arm)], stroke);
    }

    fn paint_selection_rect(&self, painter: &egui::Painter, rect: Rect) {
        if self.state.state() != EventState::Selecting {
            return;
        }
        let Some(selection) = self.state.selection_rect() else {
            return;
        };
        let color = CurveEditorSettings::color(self.state.settings.selection_rect_color);
        let area = Rect::from_two_pos(
            self.to_screen(rect, ZoomPoint::new(selection.left, selection.top)),
            self.to_screen(rect, ZoomPoint::new(selection.right, selection.bottom)),
        );
        painter.rect_filled(area, 0.0, color);
        painter.rect_stroke(area, 0.0, Stroke::new(1.0, color.to_opaque()));
    }

    fn paint_timeline(&self, painter: &egui::Painter, rect: Rect) {
        let settings = &self.state.settings;
        let zoom = &self.state.zoom;
        let color = CurveEditorSettings::color(settings.timeline_color);
        let timeline = &self.state.timeline;

        let x = rect.min.x + zoom.widget_x(f64::from(timeline.current_frame())) as f32;
        painter.line_segment(
            [Pos2::new(x, rect.min.y), Pos2::new(x, rect.max.y)],
            Stroke::new(1.0, color),
        );

        let markers = timeline.markers(zoom, settings.cursor_width, settings.cursor_height);
        let offset = rect.min.to_vec2();
        for triangle in [markers.top_widget(zoom), markers.bottom_widget(zoom)] {
            let points = triangle.into_iter().map(|p| p + offset).collect();
            painter.add(Shape::convex_polygon(points, color, Stroke::NONE));
        }
    }
}
