// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Single-object trackers and the coordinator that drives them.
//!
//! The coordinator keeps one tracker handle per registered box while the
//! session is tracking and writes each frame's results back into the
//! [`BoxRegistry`]. A lost object is dropped from both for the rest of the
//! run; it is never re-acquired.

#[cfg(feature = "video-opencv")]
pub mod kcf;
pub mod template;

use crate::config::TrackerKind;
use crate::error::ConfigError;
use crate::io::media::Frame;
use crate::models::annotation::{BoundingBox, ClassId};
use crate::models::registry::BoxRegistry;
use crate::util::geometry::clamp_to_frame;
use anyhow::Result;
use image::{imageops, GrayImage};
use std::cell::OnceCell;

/// One frame as handed to every tracker of a pass.
///
/// Derived images are built on first use and shared by all trackers that
/// look at the same frame.
pub struct TrackingFrame<'a> {
    rgb: &'a Frame,
    gray: OnceCell<GrayImage>,
    #[cfg(feature = "video-opencv")]
    mat: OnceCell<opencv::core::Mat>,
}

impl<'a> TrackingFrame<'a> {
    pub fn new(rgb: &'a Frame) -> Self {
        Self {
            rgb,
            gray: OnceCell::new(),
            #[cfg(feature = "video-opencv")]
            mat: OnceCell::new(),
        }
    }

    pub fn rgb(&self) -> &Frame {
        self.rgb
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.rgb.dimensions()
    }

    /// Luma version of the frame.
    pub fn gray(&self) -> &GrayImage {
        self.gray.get_or_init(|| imageops::grayscale(self.rgb))
    }

    /// BGR matrix of the frame for OpenCV trackers.
    #[cfg(feature = "video-opencv")]
    pub fn mat(&self) -> Result<&opencv::core::Mat> {
        if let Some(mat) = self.mat.get() {
            return Ok(mat);
        }
        let mat = crate::io::media::frame_to_mat(self.rgb)?;
        Ok(self.mat.get_or_init(|| mat))
    }
}

/// A tracker seeded on one object.
pub trait Tracker {
    /// Locate the object in `frame`. `None` means the object was lost.
    fn update(&mut self, frame: &TrackingFrame<'_>) -> Option<BoundingBox>;
}

/// Creates trackers seeded with a box on a frame.
pub trait TrackerFactory {
    fn seed(&self, frame: &TrackingFrame<'_>, bbox: &BoundingBox) -> Result<Box<dyn Tracker>>;
}

/// Build the factory for the configured backend.
pub fn factory_for(kind: TrackerKind) -> Result<Box<dyn TrackerFactory>, ConfigError> {
    match kind {
        TrackerKind::Template => Ok(Box::new(template::TemplateTrackerFactory::default())),
        #[cfg(feature = "video-opencv")]
        TrackerKind::Kcf => Ok(Box::new(kcf::KcfTrackerFactory)),
        #[cfg(not(feature = "video-opencv"))]
        TrackerKind::Kcf => Err(ConfigError::UnsupportedTracker("kcf".to_string())),
    }
}

/// A tracker handle bound to a registry position.
struct TrackedObject {
    label: ClassId,
    index: usize,
    handle: Box<dyn Tracker>,
}

/// Outcome of one per-frame update pass.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TrackingPass {
    /// Surviving boxes with their registry positions after the pass.
    pub updated: Vec<(ClassId, usize, BoundingBox)>,
    /// Boxes dropped because their tracker lost the object.
    pub lost: Vec<(ClassId, BoundingBox)>,
}

#[derive(Default)]
pub struct TrackingCoordinator {
    objects: Vec<TrackedObject>,
}

impl TrackingCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every handle with a fresh tracker per registered box.
    ///
    /// Boxes whose tracker cannot be seeded are dropped from the registry.
    /// Returns the number of boxes dropped.
    pub fn seed_all(
        &mut self,
        frame: &Frame,
        registry: &mut BoxRegistry,
        factory: &dyn TrackerFactory,
    ) -> usize {
        self.objects.clear();

        let view = TrackingFrame::new(frame);
        let mut failed = Vec::new();
        for (label, index, bbox) in registry.iter_indexed() {
            match factory.seed(&view, bbox) {
                Ok(handle) => self.objects.push(TrackedObject { label, index, handle }),
                Err(e) => {
                    log::warn!("Failed to start tracker for box {:?}: {:#}", bbox, e);
                    failed.push((label, index));
                }
            }
        }

        let dropped = self.drop_entries(registry, failed).len();
        log::debug!("Seeded {} trackers", self.objects.len());
        dropped
    }

    /// Advance every tracker by one frame and write the results back.
    pub fn update_all(&mut self, frame: &Frame, registry: &mut BoxRegistry) -> TrackingPass {
        let (width, height) = frame.dimensions();
        let view = TrackingFrame::new(frame);

        let mut lost = Vec::new();
        for object in &mut self.objects {
            let located = object
                .handle
                .update(&view)
                .map(|bbox| clamp_to_frame(&bbox, width, height))
                .filter(|bbox| !bbox.is_empty());

            match located {
                Some(bbox) => {
                    if !registry.update(object.label, object.index, bbox) {
                        log::debug!("No registry entry for tracker at {:?}/{}", object.label, object.index);
                    }
                }
                None => lost.push((object.label, object.index)),
            }
        }

        self.objects
            .retain(|object| !lost.contains(&(object.label, object.index)));
        let lost = self.drop_entries(registry, lost);
        for (label, bbox) in &lost {
            log::warn!("Lost track of {:?} box at {:?}", label, bbox);
        }

        let updated = self
            .objects
            .iter()
            .filter_map(|object| {
                registry
                    .get(object.label, object.index)
                    .map(|bbox| (object.label, object.index, *bbox))
            })
            .collect();
        TrackingPass { updated, lost }
    }

    /// Drop all handles. The registry keeps the last known boxes.
    pub fn clear(&mut self) {
        self.objects.clear();
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Remove registry entries that no longer have a tracker and shift the
    /// positions of the handles that follow them under the same label.
    fn drop_entries(
        &mut self,
        registry: &mut BoxRegistry,
        mut entries: Vec<(ClassId, usize)>,
    ) -> Vec<(ClassId, BoundingBox)> {
        // Highest index first so earlier positions stay valid while removing.
        entries.sort_by(|a, b| b.cmp(a));

        let mut removed = Vec::with_capacity(entries.len());
        for (label, index) in entries {
            if let Some(bbox) = registry.remove_at(label, index) {
                removed.push((label, bbox));
            }
            for object in &mut self.objects {
                if object.label == label && object.index > index {
                    object.index -= 1;
                }
            }
        }
        removed.reverse();
        removed
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedFactory;
    use super::*;
    use crate::models::annotation::ClassList;

    const FRAME: (u32, u32) = (640, 480);

    fn setup() -> (ClassList, BoxRegistry, Frame) {
        let classes = ClassList::parse("car,person").unwrap();
        let registry = BoxRegistry::new(classes.len());
        (classes, registry, Frame::new(FRAME.0, FRAME.1))
    }

    fn bbox(x1: f64, y1: f64, x2: f64, y2: f64) -> BoundingBox {
        BoundingBox::new(x1, y1, x2, y2)
    }

    #[test]
    fn test_seed_all_creates_one_handle_per_box() {
        let (classes, mut registry, frame) = setup();
        let car = classes.resolve("car").unwrap();
        let person = classes.resolve("person").unwrap();
        registry.add(person, bbox(0.0, 0.0, 50.0, 50.0), FRAME, 0.1);
        registry.add(car, bbox(100.0, 100.0, 150.0, 150.0), FRAME, 0.1);

        let factory = ScriptedFactory::moving(0.0, 0.0);
        let mut coordinator = TrackingCoordinator::new();
        assert_eq!(coordinator.seed_all(&frame, &mut registry, &factory), 0);
        assert_eq!(coordinator.len(), 2);
        // Seeded in label-then-insertion order.
        assert_eq!(
            *factory.seeded.borrow(),
            vec![bbox(100.0, 100.0, 150.0, 150.0), bbox(0.0, 0.0, 50.0, 50.0)]
        );

        // Reseeding replaces the handle set instead of adding to it.
        coordinator.seed_all(&frame, &mut registry, &factory);
        assert_eq!(coordinator.len(), 2);
    }

    #[test]
    fn test_update_all_writes_back_into_registry() {
        let (classes, mut registry, frame) = setup();
        let car = classes.resolve("car").unwrap();
        registry.add(car, bbox(100.0, 100.0, 150.0, 150.0), FRAME, 0.1);

        let factory = ScriptedFactory::moving(5.0, -2.0);
        let mut coordinator = TrackingCoordinator::new();
        coordinator.seed_all(&frame, &mut registry, &factory);

        let pass = coordinator.update_all(&frame, &mut registry);
        assert!(pass.lost.is_empty());
        assert_eq!(pass.updated, vec![(car, 0, bbox(105.0, 98.0, 155.0, 148.0))]);
        assert_eq!(registry.get(car, 0), Some(&bbox(105.0, 98.0, 155.0, 148.0)));
    }

    #[test]
    fn test_lost_object_is_dropped_and_indices_shift() {
        let (classes, mut registry, frame) = setup();
        let car = classes.resolve("car").unwrap();
        registry.add(car, bbox(0.0, 0.0, 50.0, 50.0), FRAME, 0.1);
        registry.add(car, bbox(100.0, 0.0, 150.0, 50.0), FRAME, 0.1);
        registry.add(car, bbox(200.0, 0.0, 250.0, 50.0), FRAME, 0.1);

        // The middle car is lost on the second update.
        let factory = ScriptedFactory::moving(1.0, 0.0).with_lifetimes(&[None, Some(1), None]);
        let mut coordinator = TrackingCoordinator::new();
        coordinator.seed_all(&frame, &mut registry, &factory);

        let first = coordinator.update_all(&frame, &mut registry);
        assert!(first.lost.is_empty());
        assert_eq!(registry.len(), 3);

        let second = coordinator.update_all(&frame, &mut registry);
        assert_eq!(second.lost, vec![(car, bbox(101.0, 0.0, 151.0, 50.0))]);
        assert_eq!(coordinator.len(), 2);
        assert_eq!(
            registry.boxes_for(car),
            &[bbox(2.0, 0.0, 52.0, 50.0), bbox(202.0, 0.0, 252.0, 50.0)]
        );

        // The third car now lives at index 1 and keeps updating there.
        let third = coordinator.update_all(&frame, &mut registry);
        assert!(third.lost.is_empty());
        assert_eq!(third.updated[1], (car, 1, bbox(203.0, 0.0, 253.0, 50.0)));
    }

    #[test]
    fn test_results_are_clamped_and_empty_results_are_lost() {
        let (classes, mut registry, frame) = setup();
        let person = classes.resolve("person").unwrap();
        registry.add(person, bbox(560.0, 10.0, 630.0, 80.0), FRAME, 0.1);

        let factory = ScriptedFactory::moving(40.0, 0.0);
        let mut coordinator = TrackingCoordinator::new();
        coordinator.seed_all(&frame, &mut registry, &factory);

        coordinator.update_all(&frame, &mut registry);
        assert_eq!(registry.get(person, 0), Some(&bbox(600.0, 10.0, 640.0, 80.0)));

        // Next step moves the tracker's box fully outside the frame.
        let pass = coordinator.update_all(&frame, &mut registry);
        assert_eq!(pass.lost.len(), 1);
        assert!(registry.is_empty());
        assert!(coordinator.is_empty());
    }

    #[test]
    fn test_seed_failure_drops_box() {
        let (classes, mut registry, frame) = setup();
        let car = classes.resolve("car").unwrap();
        registry.add(car, bbox(0.0, 0.0, 50.0, 50.0), FRAME, 0.1);
        registry.add(car, bbox(100.0, 0.0, 150.0, 50.0), FRAME, 0.1);

        let factory = ScriptedFactory::moving(0.0, 0.0).with_seed_failures(&[true, false]);
        let mut coordinator = TrackingCoordinator::new();
        assert_eq!(coordinator.seed_all(&frame, &mut registry, &factory), 1);
        assert_eq!(registry.boxes_for(car), &[bbox(100.0, 0.0, 150.0, 50.0)]);

        let pass = coordinator.update_all(&frame, &mut registry);
        assert_eq!(pass.updated, vec![(car, 0, bbox(100.0, 0.0, 150.0, 50.0))]);
    }

    #[test]
    fn test_clear_keeps_registry() {
        let (classes, mut registry, frame) = setup();
        let car = classes.resolve("car").unwrap();
        registry.add(car, bbox(0.0, 0.0, 50.0, 50.0), FRAME, 0.1);

        let factory = ScriptedFactory::moving(3.0, 3.0);
        let mut coordinator = TrackingCoordinator::new();
        coordinator.seed_all(&frame, &mut registry, &factory);
        coordinator.update_all(&frame, &mut registry);
        coordinator.clear();

        assert!(coordinator.is_empty());
        assert_eq!(registry.get(car, 0), Some(&bbox(3.0, 3.0, 53.0, 53.0)));
    }

    #[test]
    fn test_tracking_frame_converts_once() {
        let mut frame = Frame::new(4, 2);
        frame.put_pixel(1, 0, image::Rgb([255, 255, 255]));
        let view = TrackingFrame::new(&frame);

        let first = view.gray();
        assert_eq!(first.get_pixel(1, 0)[0], 255);
        assert_eq!(first.get_pixel(0, 0)[0], 0);
        assert!(std::ptr::eq(first, view.gray()));
        assert_eq!(view.dimensions(), (4, 2));
    }

    #[test]
    fn test_factory_for_template() {
        assert!(factory_for(TrackerKind::Template).is_ok());
    }
}
