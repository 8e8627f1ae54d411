// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! OpenCV KCF tracker backend.

use super::{Tracker, TrackerFactory, TrackingFrame};
use crate::models::annotation::BoundingBox;
use anyhow::{Context, Result};
use opencv::{
    core::{Ptr, Rect},
    prelude::*,
    tracking::{TrackerKCF, TrackerKCF_Params},
};

pub struct KcfTrackerFactory;

impl TrackerFactory for KcfTrackerFactory {
    fn seed(&self, frame: &TrackingFrame<'_>, bbox: &BoundingBox) -> Result<Box<dyn Tracker>> {
        let params = TrackerKCF_Params::default()?;
        let mut tracker = TrackerKCF::create(params).context("Failed to create KCF tracker")?;

        let rect = Rect::new(
            bbox.x1.round() as i32,
            bbox.y1.round() as i32,
            bbox.width().round() as i32,
            bbox.height().round() as i32,
        );
        tracker.init(frame.mat()?, rect).context("Failed to initialise KCF tracker")?;

        Ok(Box::new(KcfTracker { tracker, rect }))
    }
}

struct KcfTracker {
    tracker: Ptr<TrackerKCF>,
    rect: Rect,
}

impl Tracker for KcfTracker {
    fn update(&mut self, frame: &TrackingFrame<'_>) -> Option<BoundingBox> {
        let mat = match frame.mat() {
            Ok(mat) => mat,
            Err(e) => {
                log::warn!("Failed to convert frame for KCF update: {:#}", e);
                return None;
            }
        };

        match self.tracker.update(mat, &mut self.rect) {
            Ok(true) => Some(BoundingBox::new(
                self.rect.x as f64,
                self.rect.y as f64,
                (self.rect.x + self.rect.width) as f64,
                (self.rect.y + self.rect.height) as f64,
            )),
            _ => None,
        }
    }
}
