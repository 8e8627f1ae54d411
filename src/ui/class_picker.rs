// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Class selection dialog shown after a box is drawn.
//!
//! The dialog is modal: while it is open the application ignores canvas
//! input and keyboard shortcuts, and playback cannot resume. It only closes
//! once one of the configured classes has been chosen.

use crate::models::annotation::{BoundingBox, ClassId, ClassList};

pub enum PickerAction {
    None,
    Chosen(ClassId, BoundingBox),
}

pub struct ClassPicker {
    pending: BoundingBox,
    selected: Option<ClassId>,
}

impl ClassPicker {
    /// Open the dialog for a freshly drawn box, preselecting the last used class.
    pub fn new(pending: BoundingBox, last_used: Option<ClassId>) -> Self {
        Self {
            pending,
            selected: last_used,
        }
    }

    pub fn pending(&self) -> &BoundingBox {
        &self.pending
    }

    pub fn show(&mut self, ctx: &egui::Context, classes: &ClassList) -> PickerAction {
        let mut action = PickerAction::None;

        egui::Window::new("Class Selection")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                let selected_text = self
                    .selected
                    .map(|id| classes.name(id).to_string())
                    .unwrap_or_else(|| "class".to_string());

                egui::ComboBox::from_label("Class")
                    .selected_text(selected_text)
                    .show_ui(ui, |ui| {
                        for id in classes.ids() {
                            ui.selectable_value(&mut self.selected, Some(id), classes.name(id));
                        }
                    });

                // Number keys pick a class directly
                let typed = ctx.input(|i| {
                    NUMBER_KEYS
                        .iter()
                        .position(|key| i.key_pressed(*key))
                        .and_then(|index| classes.id(index))
                });
                if typed.is_some() {
                    self.selected = typed;
                }

                let confirm = ui
                    .add_enabled(self.selected.is_some(), egui::Button::new("Select"))
                    .clicked()
                    || ctx.input(|i| i.key_pressed(egui::Key::Enter));
                if confirm {
                    if let Some(id) = self.selected {
                        action = PickerAction::Chosen(id, self.pending);
                    }
                }
            });

        action
    }
}

const NUMBER_KEYS: [egui::Key; 9] = [
    egui::Key::Num1,
    egui::Key::Num2,
    egui::Key::Num3,
    egui::Key::Num4,
    egui::Key::Num5,
    egui::Key::Num6,
    egui::Key::Num7,
    egui::Key::Num8,
    egui::Key::Num9,
];
