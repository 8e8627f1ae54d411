// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Grayscale template matching tracker.
//!
//! The object's appearance at seed time is kept as a grayscale patch. Each
//! update searches a window around the previous position for the offset with
//! the lowest mean absolute difference, first on a coarse grid and then
//! pixel by pixel around the best coarse hit. When even the best match
//! differs too much the object is reported lost.

use super::{Tracker, TrackerFactory, TrackingFrame};
use crate::models::annotation::BoundingBox;
use crate::util::geometry::clamp_to_frame;
use anyhow::{bail, Result};
use image::{imageops, GrayImage};

/// Patches are sampled on a grid of at most this many points per side.
const MAX_SAMPLES_PER_SIDE: u32 = 32;

/// Step of the coarse search grid in pixels.
const COARSE_STEP: usize = 2;

#[derive(Debug, Clone, Copy)]
pub struct TemplateTrackerFactory {
    /// How far, in pixels, the object may move between two frames.
    pub search_radius: u32,
    /// Mean absolute difference (0–255) above which the object is lost.
    pub max_difference: f64,
}

impl Default for TemplateTrackerFactory {
    fn default() -> Self {
        Self {
            search_radius: 24,
            max_difference: 40.0,
        }
    }
}

impl TrackerFactory for TemplateTrackerFactory {
    fn seed(&self, frame: &TrackingFrame<'_>, bbox: &BoundingBox) -> Result<Box<dyn Tracker>> {
        let (width, height) = frame.dimensions();
        let clamped = clamp_to_frame(bbox, width, height);

        let x = (clamped.x1.round() as u32).min(width.saturating_sub(1));
        let y = (clamped.y1.round() as u32).min(height.saturating_sub(1));
        let w = (clamped.width().round() as u32).min(width - x);
        let h = (clamped.height().round() as u32).min(height - y);
        if w == 0 || h == 0 {
            bail!("cannot track an empty box {:?}", bbox);
        }

        let template = imageops::crop_imm(frame.gray(), x, y, w, h).to_image();
        let stride = (w.max(h) / MAX_SAMPLES_PER_SIDE).max(1);

        Ok(Box::new(TemplateTracker {
            template,
            position: (x, y),
            stride,
            search_radius: self.search_radius as i64,
            max_difference: self.max_difference,
        }))
    }
}

struct TemplateTracker {
    template: GrayImage,
    /// Top-left corner of the last match.
    position: (u32, u32),
    stride: u32,
    search_radius: i64,
    max_difference: f64,
}

impl TemplateTracker {
    /// Mean absolute difference between the template and the frame patch at `(x, y)`.
    fn score(&self, gray: &GrayImage, x: u32, y: u32) -> f64 {
        let (w, h) = self.template.dimensions();
        let mut total = 0u64;
        let mut count = 0u64;
        for ty in (0..h).step_by(self.stride as usize) {
            for tx in (0..w).step_by(self.stride as usize) {
                let a = self.template.get_pixel(tx, ty)[0] as i32;
                let b = gray.get_pixel(x + tx, y + ty)[0] as i32;
                total += a.abs_diff(b) as u64;
                count += 1;
            }
        }
        total as f64 / count.max(1) as f64
    }

    /// Best position among candidate offsets from `center`, kept inside the frame.
    fn search(
        &self,
        gray: &GrayImage,
        center: (u32, u32),
        radius: i64,
        step: usize,
        limit: (u32, u32),
        best: &mut ((u32, u32), f64),
    ) {
        for dy in (-radius..=radius).step_by(step) {
            for dx in (-radius..=radius).step_by(step) {
                let x = (center.0 as i64 + dx).clamp(0, limit.0 as i64) as u32;
                let y = (center.1 as i64 + dy).clamp(0, limit.1 as i64) as u32;
                let score = self.score(gray, x, y);
                if score < best.1 {
                    *best = ((x, y), score);
                }
            }
        }
    }
}

impl Tracker for TemplateTracker {
    fn update(&mut self, frame: &TrackingFrame<'_>) -> Option<BoundingBox> {
        let (width, height) = frame.dimensions();
        let (w, h) = self.template.dimensions();
        if w > width || h > height {
            return None;
        }

        let gray = frame.gray();
        let limit = (width - w, height - h);

        let mut best = (self.position, f64::INFINITY);
        self.search(gray, self.position, self.search_radius, COARSE_STEP, limit, &mut best);
        let coarse = best.0;
        self.search(gray, coarse, COARSE_STEP as i64 - 1, 1, limit, &mut best);

        if best.1 > self.max_difference {
            log::debug!("Best template match differs by {:.1}", best.1);
            return None;
        }

        self.position = best.0;
        let (x, y) = (best.0 .0 as f64, best.0 .1 as f64);
        Some(BoundingBox::new(x, y, x + w as f64, y + h as f64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::media::Frame;
    use image::Rgb;

    /// Dark frame with a bright textured square whose top-left is at `(x, y)`.
    fn frame_with_square(x: u32, y: u32) -> Frame {
        let mut frame = Frame::from_pixel(160, 120, Rgb([20, 20, 20]));
        for dy in 0..20 {
            for dx in 0..20 {
                let shade = 150 + ((dx * 5 + dy * 3) % 100) as u8;
                frame.put_pixel(x + dx, y + dy, Rgb([shade, shade, shade]));
            }
        }
        frame
    }

    #[test]
    fn test_follows_moving_square() {
        let factory = TemplateTrackerFactory::default();
        let seed_frame = frame_with_square(40, 40);
        let mut tracker = factory
            .seed(&TrackingFrame::new(&seed_frame), &BoundingBox::new(35.0, 35.0, 65.0, 65.0))
            .unwrap();

        let moved = tracker.update(&TrackingFrame::new(&frame_with_square(45, 43))).unwrap();
        assert_eq!(moved, BoundingBox::new(40.0, 38.0, 70.0, 68.0));

        let moved = tracker.update(&TrackingFrame::new(&frame_with_square(52, 40))).unwrap();
        assert_eq!(moved, BoundingBox::new(47.0, 35.0, 77.0, 65.0));
    }

    #[test]
    fn test_reports_loss_when_object_disappears() {
        let factory = TemplateTrackerFactory::default();
        let mut tracker = factory
            .seed(&TrackingFrame::new(&frame_with_square(40, 40)), &BoundingBox::new(40.0, 40.0, 60.0, 60.0))
            .unwrap();

        let empty = Frame::from_pixel(160, 120, Rgb([20, 20, 20]));
        assert!(tracker.update(&TrackingFrame::new(&empty)).is_none());
    }

    #[test]
    fn test_rejects_empty_seed_box() {
        let factory = TemplateTrackerFactory::default();
        let frame = frame_with_square(40, 40);
        assert!(factory.seed(&TrackingFrame::new(&frame), &BoundingBox::new(10.0, 10.0, 10.0, 30.0)).is_err());
        assert!(factory.seed(&TrackingFrame::new(&frame), &BoundingBox::new(200.0, 10.0, 260.0, 30.0)).is_err());
    }

    #[test]
    fn test_match_stays_inside_frame() {
        let factory = TemplateTrackerFactory::default();
        let mut tracker = factory
            .seed(&TrackingFrame::new(&frame_with_square(0, 0)), &BoundingBox::new(0.0, 0.0, 20.0, 20.0))
            .unwrap();

        let found = tracker.update(&TrackingFrame::new(&frame_with_square(0, 0))).unwrap();
        assert_eq!(found, BoundingBox::new(0.0, 0.0, 20.0, 20.0));
    }
}
