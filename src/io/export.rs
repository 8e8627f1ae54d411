// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Dataset export in YOLO detection format.
//!
//! This module creates the output directory layout, writes the class list
//! once, and decides for every processed frame whether it is persisted as an
//! image plus a normalized annotation file.

use crate::error::ConfigError;
use crate::io::media::Frame;
use crate::models::annotation::{AnnotationLine, ClassList};
use crate::models::registry::BoxRegistry;
use crate::session::{Mode, SessionState};
use crate::util::geometry::normalize;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// What the exporter did with a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportDecision {
    /// Paused, or tracking without any box: the counter is untouched.
    Ineligible,
    /// Counted but not sampled.
    Skipped { counter: u64 },
    /// Written as `images/<counter>.jpg` and `annotations/<counter>.txt`.
    Saved { counter: u64 },
}

/// Writes annotation records under an output directory.
#[derive(Debug, Clone)]
pub struct Exporter {
    images_dir: PathBuf,
    annotations_dir: PathBuf,
}

impl Exporter {
    /// Create the output layout and write `annotations/classes.txt`.
    ///
    /// Fails without touching the filesystem when `root` already exists.
    pub fn create(root: &Path, classes: &ClassList) -> Result<Self> {
        if root.exists() {
            return Err(ConfigError::OutputExists(root.to_path_buf()).into());
        }

        let images_dir = root.join("images");
        let annotations_dir = root.join("annotations");
        for dir in [root, images_dir.as_path(), annotations_dir.as_path()] {
            std::fs::create_dir(dir)
                .with_context(|| format!("Failed to create directory {}", dir.display()))?;
        }

        let classes_path = annotations_dir.join("classes.txt");
        std::fs::write(&classes_path, classes.to_file_contents())
            .with_context(|| format!("Failed to write {}", classes_path.display()))?;

        log::info!("Saving annotations to {}", root.display());
        Ok(Self {
            images_dir,
            annotations_dir,
        })
    }

    /// Count an eligible frame and persist it when the counter is sampled.
    ///
    /// The counter value checked against the interval is the one used in
    /// both file names; it is incremented afterwards.
    pub fn evaluate(
        &self,
        state: &mut SessionState,
        registry: &BoxRegistry,
        frame: &Frame,
    ) -> Result<ExportDecision> {
        if state.mode != Mode::Tracking || registry.is_empty() {
            return Ok(ExportDecision::Ineligible);
        }

        let counter = state.save_counter;
        state.save_counter = counter
            .checked_add(1)
            .with_context(|| format!("Save counter cannot advance past {}", counter))?;
        if counter % state.save_every != 0 {
            return Ok(ExportDecision::Skipped { counter });
        }

        self.write_record(counter, registry, frame)?;
        log::debug!("Saved frame {} with {} boxes", counter, registry.len());
        Ok(ExportDecision::Saved { counter })
    }

    fn write_record(&self, counter: u64, registry: &BoxRegistry, frame: &Frame) -> Result<()> {
        let image_path = self.images_dir.join(format!("{}.jpg", counter));
        frame
            .save(&image_path)
            .with_context(|| format!("Failed to write {}", image_path.display()))?;

        let annotation_path = self.annotations_dir.join(format!("{}.txt", counter));
        std::fs::write(&annotation_path, annotation_text(registry, frame.dimensions()))
            .with_context(|| format!("Failed to write {}", annotation_path.display()))?;
        Ok(())
    }
}

/// One normalized line per box, newline separated, without a trailing newline.
pub fn annotation_text(registry: &BoxRegistry, frame_size: (u32, u32)) -> String {
    registry
        .iter()
        .map(|(label, bbox)| {
            AnnotationLine {
                class_index: label.index(),
                bbox: normalize(bbox, frame_size.0, frame_size.1),
            }
            .to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}
