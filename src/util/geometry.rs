// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Geometric utility functions.
//!
//! This module converts pixel-space boxes to the normalized center/size form
//! used in annotation files and back, and provides the small-object filter
//! and point hit test used while editing.

use crate::models::annotation::{BoundingBox, NormalizedBox};

/// Convert a pixel box to center/size fractions of the frame.
pub fn normalize(bbox: &BoundingBox, frame_w: u32, frame_h: u32) -> NormalizedBox {
    let fw = frame_w as f64;
    let fh = frame_h as f64;
    NormalizedBox {
        cx: (bbox.x1 + bbox.x2) / 2.0 / fw,
        cy: (bbox.y1 + bbox.y2) / 2.0 / fh,
        w: bbox.width() / fw,
        h: bbox.height() / fh,
    }
}

/// Convert a normalized box back to pixel coordinates.
pub fn denormalize(nbox: &NormalizedBox, frame_w: u32, frame_h: u32) -> BoundingBox {
    let fw = frame_w as f64;
    let fh = frame_h as f64;
    let cx = nbox.cx * fw;
    let cy = nbox.cy * fh;
    let half_w = nbox.w * fw / 2.0;
    let half_h = nbox.h * fh / 2.0;
    BoundingBox::new(cx - half_w, cy - half_h, cx + half_w, cy + half_h)
}

/// Whether a box covers at least `threshold_percent` of the frame area.
pub fn is_large_enough(bbox: &BoundingBox, frame_w: u32, frame_h: u32, threshold_percent: f64) -> bool {
    let min_area = threshold_percent / 100.0 * frame_w as f64 * frame_h as f64;
    bbox.area() >= min_area
}

/// Half-open point-in-rectangle test.
pub fn hit_test(bbox: &BoundingBox, x: f64, y: f64) -> bool {
    bbox.x1 <= x && x < bbox.x2 && bbox.y1 <= y && y < bbox.y2
}

/// Restrict a box to the frame rectangle. The result may be empty when the
/// box lies entirely outside the frame.
pub fn clamp_to_frame(bbox: &BoundingBox, frame_w: u32, frame_h: u32) -> BoundingBox {
    let fw = frame_w as f64;
    let fh = frame_h as f64;
    BoundingBox::new(
        bbox.x1.clamp(0.0, fw),
        bbox.y1.clamp(0.0, fh),
        bbox.x2.clamp(0.0, fw),
        bbox.y2.clamp(0.0, fh),
    )
}
