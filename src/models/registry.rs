// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! The set of labeled boxes currently on screen.
//!
//! Boxes are grouped per class and kept in draw order within each class.
//! Iteration is always class-list order first, then insertion order, which
//! is the order used for deletion by point and for export.

use super::annotation::{BoundingBox, ClassId};
use crate::util::geometry::{clamp_to_frame, hit_test, is_large_enough};

#[derive(Debug, Clone, Default)]
pub struct BoxRegistry {
    /// One sequence per class, indexed by `ClassId::index`.
    boxes: Vec<Vec<BoundingBox>>,
}

impl BoxRegistry {
    /// Create an empty registry for a class list of the given length.
    pub fn new(class_count: usize) -> Self {
        Self {
            boxes: vec![Vec::new(); class_count],
        }
    }

    /// The box as it would be stored: clamped to the frame, or `None` when
    /// what remains is empty or below the area threshold.
    pub fn admissible(bbox: &BoundingBox, frame_size: (u32, u32), threshold_percent: f64) -> Option<BoundingBox> {
        let clamped = clamp_to_frame(bbox, frame_size.0, frame_size.1);
        if clamped.is_empty() || !is_large_enough(&clamped, frame_size.0, frame_size.1, threshold_percent) {
            return None;
        }
        Some(clamped)
    }

    /// Append a box under `label`, clamped to the frame. Empty boxes and
    /// boxes below the area threshold are dropped.
    ///
    /// Returns whether the box was kept.
    pub fn add(
        &mut self,
        label: ClassId,
        bbox: BoundingBox,
        frame_size: (u32, u32),
        threshold_percent: f64,
    ) -> bool {
        let Some(bbox) = Self::admissible(&bbox, frame_size, threshold_percent) else {
            return false;
        };
        match self.boxes.get_mut(label.index()) {
            Some(list) => {
                list.push(bbox);
                true
            }
            None => false,
        }
    }

    /// Remove the box at `index` under `label`.
    pub fn remove_at(&mut self, label: ClassId, index: usize) -> Option<BoundingBox> {
        let list = self.boxes.get_mut(label.index())?;
        (index < list.len()).then(|| list.remove(index))
    }

    /// Remove the first box, in class-then-insertion order, containing the point.
    ///
    /// At most one box is removed even when several overlap the point.
    pub fn remove_hit(&mut self, x: f64, y: f64) -> Option<(ClassId, usize, BoundingBox)> {
        let (label, index) = self
            .iter_indexed()
            .find(|(_, _, bbox)| hit_test(bbox, x, y))
            .map(|(label, index, _)| (label, index))?;
        self.remove_at(label, index).map(|bbox| (label, index, bbox))
    }

    /// Overwrite the box at `index` under `label`.
    pub fn update(&mut self, label: ClassId, index: usize, bbox: BoundingBox) -> bool {
        match self.boxes.get_mut(label.index()).and_then(|list| list.get_mut(index)) {
            Some(slot) => {
                *slot = bbox;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, label: ClassId, index: usize) -> Option<&BoundingBox> {
        self.boxes.get(label.index())?.get(index)
    }

    /// Boxes stored under one label, in draw order.
    pub fn boxes_for(&self, label: ClassId) -> &[BoundingBox] {
        self.boxes.get(label.index()).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All boxes with their label, in class-then-insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (ClassId, &BoundingBox)> + '_ {
        self.iter_indexed().map(|(label, _, bbox)| (label, bbox))
    }

    /// Like [`iter`](Self::iter) but also yields each box's position under its label.
    pub fn iter_indexed(&self) -> impl Iterator<Item = (ClassId, usize, &BoundingBox)> + '_ {
        self.boxes.iter().enumerate().flat_map(|(class, list)| {
            let label = ClassId::from_index(class);
            list.iter().enumerate().map(move |(index, bbox)| (label, index, bbox))
        })
    }

    pub fn len(&self) -> usize {
        self.boxes.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.iter().all(Vec::is_empty)
    }

    pub fn clear(&mut self) {
        self.boxes.iter_mut().for_each(Vec::clear);
    }
}
