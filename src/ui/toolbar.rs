// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Status bar with session mode, counters and key hints.

use crate::session::{Mode, Session};

/// Display the status bar.
pub fn show(ui: &mut egui::Ui, session: &Session) {
    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;

        let (mode_text, mode_color) = match session.mode() {
            Mode::Paused => ("⏸ Paused", egui::Color32::YELLOW),
            Mode::Tracking => ("▶ Tracking", egui::Color32::GREEN),
        };
        ui.label(egui::RichText::new(mode_text).strong().color(mode_color));

        ui.separator();
        let state = session.state();
        ui.label(format!("Frame {}", state.frame_index));
        ui.separator();
        ui.label(format!("Counter {} (every {})", state.save_counter, state.save_every));
        ui.separator();
        ui.label(format!("Boxes {}", session.registry().len()));

        ui.separator();
        let hint = match session.mode() {
            Mode::Paused => "Drag to draw a box, double-click to delete, P to track, Q to quit",
            Mode::Tracking => "P to pause and edit, Q to quit",
        };
        ui.label(egui::RichText::new(hint).italics().weak());
    });
}
