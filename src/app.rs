// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Main application state and egui App implementation.
//!
//! This module runs the annotation control loop. Each `update` call first
//! dispatches user input (keys, canvas, box list, class dialog), then, while
//! tracking and once the frame delay has elapsed, reads the next frame and
//! lets the session track and export it, and finally renders.

use crate::io::media::{Frame, FrameScaler, VideoSource};
use crate::models::annotation::ClassId;
use crate::session::{EditOutcome, Session};
use crate::ui::{canvas, class_picker, properties, toolbar};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Slot for an error that ended the session, read by `main` after the
/// window closes.
pub type FatalError = Rc<RefCell<Option<anyhow::Error>>>;

pub struct AnnotatorApp {
    session: Session,
    source: Box<dyn VideoSource>,
    scaler: FrameScaler,

    /// The frame currently displayed and edited
    frame: Frame,

    /// Texture holding `frame`
    texture: Option<egui::TextureHandle>,

    /// Whether `frame` changed since the texture was uploaded
    texture_stale: bool,

    /// In-progress mouse drag
    drag: Option<canvas::DragState>,

    /// Open class dialog for a freshly drawn box
    picker: Option<class_picker::ClassPicker>,

    /// Class chosen for the previous box
    last_class: Option<ClassId>,

    frame_delay: Duration,
    last_advance: Instant,
    finished: bool,
    fatal: FatalError,
}

impl AnnotatorApp {
    pub fn new(
        session: Session,
        source: Box<dyn VideoSource>,
        scaler: FrameScaler,
        first_frame: Frame,
        frame_delay: Duration,
        fatal: FatalError,
    ) -> Self {
        Self {
            session,
            source,
            scaler,
            frame: first_frame,
            texture: None,
            texture_stale: true,
            drag: None,
            picker: None,
            last_class: None,
            frame_delay,
            last_advance: Instant::now(),
            finished: false,
            fatal,
        }
    }

    /// End the session and close the window.
    fn finish(&mut self, ctx: &egui::Context) {
        if !self.finished {
            self.session.quit();
            self.finished = true;
        }
        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
    }

    fn fail(&mut self, ctx: &egui::Context, error: anyhow::Error) {
        log::error!("{:#}", error);
        *self.fatal.borrow_mut() = Some(error);
        self.finish(ctx);
    }

    /// Read, track and export the next frame.
    fn advance(&mut self, ctx: &egui::Context) {
        self.last_advance = Instant::now();

        let frame = match self.source.next_frame() {
            Ok(Some(frame)) => self.scaler.apply(frame),
            Ok(None) => {
                log::info!("Reached the end of the input");
                self.finish(ctx);
                return;
            }
            Err(e) => {
                self.fail(ctx, e.context("Failed to read the next frame"));
                return;
            }
        };

        match self.session.process_frame(&frame) {
            Ok(report) => {
                if report.lost > 0 {
                    log::info!("Frame {}: {} objects lost", report.frame_index, report.lost);
                }
            }
            Err(e) => {
                self.fail(ctx, e);
                return;
            }
        }

        self.frame = frame;
        self.texture_stale = true;
    }

    fn handle_keys(&mut self, ctx: &egui::Context) {
        if ctx.input(|i| i.key_pressed(egui::Key::Q)) {
            log::info!("Quit requested");
            self.finish(ctx);
            return;
        }

        if ctx.input(|i| i.key_pressed(egui::Key::P)) {
            self.drag = None;
            self.session.toggle(&self.frame);
            self.last_advance = Instant::now();
        }
    }

    fn handle_edit(&mut self, outcome: EditOutcome) {
        if outcome == EditOutcome::Frozen {
            log::debug!("Ignored box edit while tracking");
        }
    }

    fn upload_texture(&mut self, ctx: &egui::Context) {
        if !self.texture_stale && self.texture.is_some() {
            return;
        }
        let size = [self.frame.width() as usize, self.frame.height() as usize];
        let image = egui::ColorImage::from_rgb(size, self.frame.as_raw());
        match self.texture.as_mut() {
            Some(texture) => texture.set(image, egui::TextureOptions::LINEAR),
            None => {
                self.texture = Some(ctx.load_texture("frame", image, egui::TextureOptions::LINEAR));
            }
        }
        self.texture_stale = false;
    }
}

impl eframe::App for AnnotatorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.finished {
            return;
        }

        if ctx.input(|i| i.viewport().close_requested()) {
            self.finish(ctx);
            return;
        }

        // The class dialog holds every other input until a class is chosen
        if let Some(picker) = self.picker.as_mut() {
            if let class_picker::PickerAction::Chosen(label, bbox) = picker.show(ctx, self.session.classes()) {
                self.picker = None;
                self.last_class = Some(label);
                let outcome = self.session.add_box(label, bbox);
                self.handle_edit(outcome);
            }
        } else {
            self.handle_keys(ctx);
            if self.finished {
                return;
            }
        }

        let editable = self.picker.is_none() && !self.session.is_tracking();

        // Status bar
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            toolbar::show(ui, &self.session);
        });

        // Box list (right side)
        let properties_action = egui::SidePanel::right("boxes")
            .default_width(230.0)
            .show(ctx, |ui| {
                properties::show(ui, self.session.registry(), self.session.classes(), editable)
            })
            .inner;

        if let properties::PropertiesAction::DeleteBox(label, index) = properties_action {
            let outcome = self.session.remove_box_at(label, index);
            self.handle_edit(outcome);
        }

        // Main canvas (center)
        self.upload_texture(ctx);
        let canvas_action = match self.texture.as_ref() {
            Some(texture) => {
                let view = canvas::CanvasView {
                    texture,
                    frame_size: self.session.frame_size(),
                    registry: self.session.registry(),
                    classes: self.session.classes(),
                    pending: self.picker.as_ref().map(|p| *p.pending()),
                    editable,
                    tracking: self.session.is_tracking(),
                };
                let drag = &mut self.drag;
                egui::CentralPanel::default()
                    .show(ctx, |ui| canvas::show(ui, &view, drag))
                    .inner
            }
            None => canvas::CanvasAction::None,
        };

        match canvas_action {
            canvas::CanvasAction::BoxDrawn(bbox) => {
                if self.session.accepts_box(&bbox) {
                    self.picker = Some(class_picker::ClassPicker::new(bbox, self.last_class));
                } else {
                    log::debug!("Ignored empty or undersized box: {:?}", bbox);
                }
            }
            canvas::CanvasAction::DeleteAt(x, y) => {
                let outcome = self.session.remove_box_hit(x, y);
                self.handle_edit(outcome);
            }
            canvas::CanvasAction::None => {}
        }

        // Playback only runs while tracking; a paused session waits for input
        if self.session.is_tracking() && self.picker.is_none() {
            let elapsed = self.last_advance.elapsed();
            if elapsed >= self.frame_delay {
                self.advance(ctx);
                ctx.request_repaint_after(self.frame_delay);
            } else {
                ctx.request_repaint_after(self.frame_delay - elapsed);
            }
        }
    }
}
