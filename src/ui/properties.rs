// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Box list panel.
//!
//! This module lists the current boxes grouped by class, with their pixel
//! coordinates, and lets individual boxes be deleted while paused.

use crate::models::annotation::{ClassId, ClassList};
use crate::models::registry::BoxRegistry;

/// Result of properties panel interaction.
pub enum PropertiesAction {
    None,
    DeleteBox(ClassId, usize),
}

/// Display the box list.
pub fn show(ui: &mut egui::Ui, registry: &BoxRegistry, classes: &ClassList, editable: bool) -> PropertiesAction {
    let mut action = PropertiesAction::None;

    ui.heading("Boxes");
    ui.separator();

    if registry.is_empty() {
        ui.label(egui::RichText::new("Drag on the frame to draw a box").weak());
        return action;
    }

    egui::ScrollArea::vertical().show(ui, |ui| {
        for label in classes.ids() {
            let boxes = registry.boxes_for(label);
            if boxes.is_empty() {
                continue;
            }

            ui.label(egui::RichText::new(format!("{} ({})", classes.name(label), label.index())).strong());
            for (index, bbox) in boxes.iter().enumerate() {
                ui.horizontal(|ui| {
                    ui.monospace(format!(
                        "{:>4.0},{:>4.0} – {:>4.0},{:>4.0}",
                        bbox.x1, bbox.y1, bbox.x2, bbox.y2
                    ));
                    if ui
                        .add_enabled(editable, egui::Button::new("✖").small())
                        .on_hover_text("Delete box")
                        .clicked()
                    {
                        action = PropertiesAction::DeleteBox(label, index);
                    }
                });
            }
            ui.add_space(6.0);
        }
    });

    action
}
