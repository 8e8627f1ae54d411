// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Drawing canvas for frame display and box annotation.
//!
//! This module provides the main canvas area where the current frame is
//! shown with its boxes, and where boxes are drawn by dragging and deleted
//! by double-clicking.

use crate::models::annotation::{BoundingBox, ClassList};
use crate::models::registry::BoxRegistry;

/// Result of canvas interaction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CanvasAction {
    None,
    /// A drag finished; the box is in frame pixel coordinates.
    BoxDrawn(BoundingBox),
    /// Double-click at a point in frame pixel coordinates.
    DeleteAt(f64, f64),
}

/// An in-progress drag, in frame pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragState {
    pub start: (f64, f64),
    pub current: (f64, f64),
}

impl DragState {
    /// Begin a drag at the position where the button went down. `pointer`
    /// is where egui recognized the drag, already past the click threshold.
    fn begin(mapping: &FrameMapping, press_origin: Option<egui::Pos2>, pointer: Option<egui::Pos2>) -> Option<Self> {
        let start = mapping.to_frame(press_origin.or(pointer)?);
        let current = pointer.map_or(start, |pos| mapping.to_frame(pos));
        Some(Self { start, current })
    }
}

/// Everything the canvas needs to draw one frame.
pub struct CanvasView<'a> {
    pub texture: &'a egui::TextureHandle,
    pub frame_size: (u32, u32),
    pub registry: &'a BoxRegistry,
    pub classes: &'a ClassList,
    /// A drawn box waiting for its class.
    pub pending: Option<BoundingBox>,
    /// Whether boxes can be drawn and deleted (paused, no dialog open).
    pub editable: bool,
    pub tracking: bool,
}

/// Maps between screen positions and frame pixels for the displayed image.
#[derive(Debug, Clone, Copy)]
struct FrameMapping {
    rect: egui::Rect,
    frame_size: (u32, u32),
}

impl FrameMapping {
    fn to_frame(&self, pos: egui::Pos2) -> (f64, f64) {
        let (fw, fh) = (self.frame_size.0 as f64, self.frame_size.1 as f64);
        let x = (pos.x - self.rect.min.x) as f64 / self.rect.width() as f64 * fw;
        let y = (pos.y - self.rect.min.y) as f64 / self.rect.height() as f64 * fh;
        (x.clamp(0.0, fw), y.clamp(0.0, fh))
    }

    fn to_screen(&self, x: f64, y: f64) -> egui::Pos2 {
        egui::pos2(
            self.rect.min.x + (x / self.frame_size.0 as f64) as f32 * self.rect.width(),
            self.rect.min.y + (y / self.frame_size.1 as f64) as f32 * self.rect.height(),
        )
    }

    fn box_rect(&self, bbox: &BoundingBox) -> egui::Rect {
        egui::Rect::from_two_pos(self.to_screen(bbox.x1, bbox.y1), self.to_screen(bbox.x2, bbox.y2))
    }
}

/// Display the canvas and handle mouse interactions.
pub fn show(ui: &mut egui::Ui, view: &CanvasView<'_>, drag: &mut Option<DragState>) -> CanvasAction {
    let mut action = CanvasAction::None;
    ui.style_mut().visuals.extreme_bg_color = egui::Color32::from_gray(40);

    let available = ui.available_size();
    let (img_width, img_height) = view.frame_size;

    // Fit the frame into the available space, keeping its aspect ratio
    let img_aspect = img_width as f32 / img_height as f32;
    let available_aspect = available.x / available.y;
    let (display_width, display_height) = if img_aspect > available_aspect {
        (available.x, available.x / img_aspect)
    } else {
        (available.y * img_aspect, available.y)
    };

    let x_offset = (available.x - display_width) / 2.0;
    let y_offset = (available.y - display_height) / 2.0;
    let image_rect = egui::Rect::from_min_size(
        ui.min_rect().min + egui::vec2(x_offset, y_offset),
        egui::vec2(display_width, display_height),
    );
    let mapping = FrameMapping {
        rect: image_rect,
        frame_size: view.frame_size,
    };

    let sense = if view.editable {
        egui::Sense::click_and_drag()
    } else {
        egui::Sense::hover()
    };
    let response = ui.allocate_rect(image_rect, sense);

    if view.editable {
        if response.drag_started() {
            let press_origin = ui.input(|i| i.pointer.press_origin());
            *drag = DragState::begin(&mapping, press_origin, response.interact_pointer_pos());
        }

        if response.dragged() {
            if let (Some(state), Some(pos)) = (drag.as_mut(), response.interact_pointer_pos()) {
                state.current = mapping.to_frame(pos);
            }
        }

        if response.drag_stopped() {
            if let Some(state) = drag.take() {
                action = CanvasAction::BoxDrawn(BoundingBox::from_corners(state.start, state.current));
            }
        }

        if response.double_clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                let (x, y) = mapping.to_frame(pos);
                action = CanvasAction::DeleteAt(x, y);
            }
        }
    } else {
        *drag = None;
    }

    let painter = ui.painter_at(image_rect);
    painter.image(
        view.texture.id(),
        image_rect,
        egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
        egui::Color32::WHITE,
    );

    let box_color = if view.tracking {
        egui::Color32::GREEN
    } else {
        egui::Color32::YELLOW
    };
    for (label, bbox) in view.registry.iter() {
        let rect = mapping.box_rect(bbox);
        painter.rect_stroke(rect, 0.0, egui::Stroke::new(2.0, box_color));
        painter.text(
            rect.left_top(),
            egui::Align2::LEFT_BOTTOM,
            view.classes.name(label),
            egui::FontId::proportional(13.0),
            box_color,
        );
    }

    let in_progress = drag
        .map(|state| BoundingBox::from_corners(state.start, state.current))
        .or(view.pending);
    if let Some(bbox) = in_progress {
        painter.rect_stroke(mapping.box_rect(&bbox), 0.0, egui::Stroke::new(1.5, egui::Color32::LIGHT_BLUE));
    }

    // Crosshair guides while paused
    if !view.tracking {
        if let Some(pos) = response.hover_pos() {
            let stroke = egui::Stroke::new(1.0, egui::Color32::from_white_alpha(140));
            painter.hline(image_rect.x_range(), pos.y, stroke);
            painter.vline(pos.x, image_rect.y_range(), stroke);
        }
    }

    action
}
