// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation session state machine.
//!
//! A session starts paused. While paused the user edits boxes; resuming seeds
//! a tracker for every box from the current frame, and from then on each new
//! frame gets exactly one tracking pass followed by the export decision.
//! Pausing drops the trackers but keeps the boxes where they were last seen.

use crate::config::SessionConfig;
use crate::io::export::{ExportDecision, Exporter};
use crate::io::media::Frame;
use crate::models::annotation::{BoundingBox, ClassId, ClassList};
use crate::models::registry::BoxRegistry;
use crate::tracking::{TrackerFactory, TrackingCoordinator};
use anyhow::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Paused,
    Tracking,
}

/// Counters and settings mutated only by the session.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub mode: Mode,
    /// Number of frames processed so far.
    pub frame_index: u64,
    /// Value the next eligible frame is counted as.
    pub save_counter: u64,
    pub save_every: u64,
    pub classes: ClassList,
}

impl SessionState {
    pub fn new(classes: ClassList, save_every: u64, start_number: u64) -> Self {
        Self {
            mode: Mode::Paused,
            frame_index: 0,
            save_counter: start_number,
            save_every,
            classes,
        }
    }
}

/// Result of a box edit request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Added,
    /// Below the minimum area; the box was discarded.
    TooSmall,
    Removed,
    /// Nothing matched the requested position.
    NotFound,
    /// Edits are ignored while tracking.
    Frozen,
}

/// What happened while processing one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub frame_index: u64,
    /// Boxes dropped because their tracker lost the object.
    pub lost: usize,
    pub export: ExportDecision,
}

pub struct Session {
    state: SessionState,
    registry: BoxRegistry,
    coordinator: TrackingCoordinator,
    factory: Box<dyn TrackerFactory>,
    exporter: Exporter,
    frame_size: (u32, u32),
    min_area_percent: f64,
}

impl Session {
    /// Start a paused session for frames of `frame_size`.
    pub fn new(
        config: &SessionConfig,
        frame_size: (u32, u32),
        factory: Box<dyn TrackerFactory>,
        exporter: Exporter,
    ) -> Self {
        Self {
            state: SessionState::new(config.classes.clone(), config.save_every, config.start_number),
            registry: BoxRegistry::new(config.classes.len()),
            coordinator: TrackingCoordinator::new(),
            factory,
            exporter,
            frame_size,
            min_area_percent: config.min_area_percent,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn registry(&self) -> &BoxRegistry {
        &self.registry
    }

    pub fn classes(&self) -> &ClassList {
        &self.state.classes
    }

    pub fn mode(&self) -> Mode {
        self.state.mode
    }

    pub fn is_tracking(&self) -> bool {
        self.state.mode == Mode::Tracking
    }

    pub fn frame_size(&self) -> (u32, u32) {
        self.frame_size
    }

    /// Number of live tracker handles.
    pub fn tracker_count(&self) -> usize {
        self.coordinator.len()
    }

    /// Whether a drawn box would pass the small-object filter.
    pub fn accepts_box(&self, bbox: &BoundingBox) -> bool {
        BoxRegistry::admissible(bbox, self.frame_size, self.min_area_percent).is_some()
    }

    /// Start tracking every box from `frame`, the frame currently displayed.
    pub fn resume(&mut self, frame: &Frame) {
        if self.is_tracking() {
            return;
        }
        let dropped = self
            .coordinator
            .seed_all(frame, &mut self.registry, self.factory.as_ref());
        if dropped > 0 {
            log::warn!("{} boxes could not be tracked and were removed", dropped);
        }
        self.state.mode = Mode::Tracking;
        log::info!(
            "Tracking {} boxes from frame {}",
            self.coordinator.len(),
            self.state.frame_index
        );
    }

    /// Stop tracking. Boxes stay at their last tracked positions.
    pub fn pause(&mut self) {
        if !self.is_tracking() {
            return;
        }
        self.coordinator.clear();
        self.state.mode = Mode::Paused;
        log::info!("Paused at: {}", self.state.save_counter);
    }

    /// The pause/resume action.
    pub fn toggle(&mut self, frame: &Frame) {
        match self.state.mode {
            Mode::Paused => self.resume(frame),
            Mode::Tracking => self.pause(),
        }
    }

    pub fn add_box(&mut self, label: ClassId, bbox: BoundingBox) -> EditOutcome {
        if self.is_tracking() {
            return EditOutcome::Frozen;
        }
        if self
            .registry
            .add(label, bbox, self.frame_size, self.min_area_percent)
        {
            log::info!("Added {} box, total: {}", self.classes().name(label), self.registry.len());
            EditOutcome::Added
        } else {
            log::debug!("Ignored empty or undersized box: {:?}", bbox);
            EditOutcome::TooSmall
        }
    }

    pub fn remove_box_at(&mut self, label: ClassId, index: usize) -> EditOutcome {
        if self.is_tracking() {
            return EditOutcome::Frozen;
        }
        match self.registry.remove_at(label, index) {
            Some(_) => {
                log::info!("Deleted box, total: {}", self.registry.len());
                EditOutcome::Removed
            }
            None => EditOutcome::NotFound,
        }
    }

    /// Delete the first box under the point (frame pixel coordinates).
    pub fn remove_box_hit(&mut self, x: f64, y: f64) -> EditOutcome {
        if self.is_tracking() {
            return EditOutcome::Frozen;
        }
        match self.registry.remove_hit(x, y) {
            Some((label, _, _)) => {
                log::info!(
                    "Deleted {} box at ({:.0}, {:.0}), total: {}",
                    self.classes().name(label),
                    x,
                    y,
                    self.registry.len()
                );
                EditOutcome::Removed
            }
            None => EditOutcome::NotFound,
        }
    }

    /// Run the per-frame update for a newly read frame, then the export decision.
    pub fn process_frame(&mut self, frame: &Frame) -> Result<FrameReport> {
        let frame_index = self.state.frame_index;
        self.state.frame_index += 1;

        let mut lost = 0;
        if self.is_tracking() {
            let pass = self.coordinator.update_all(frame, &mut self.registry);
            lost = pass.lost.len();
        }

        let export = self.exporter.evaluate(&mut self.state, &self.registry, frame)?;
        Ok(FrameReport {
            frame_index,
            lost,
            export,
        })
    }

    /// End the session, releasing every tracker.
    pub fn quit(&mut self) {
        self.coordinator.clear();
        log::info!(
            "Session ended after {} frames, next counter {}",
            self.state.frame_index,
            self.state.save_counter
        );
    }
}
