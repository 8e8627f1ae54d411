// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation data structures.
//!
//! This module defines pixel-space bounding boxes as drawn over the displayed
//! frame, their normalized detection-format counterpart, and the fixed class
//! list a session labels boxes with.

use crate::error::ConfigError;
use std::fmt;

/// Axis-aligned rectangle in displayed-frame pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl BoundingBox {
    /// Create a box from already ordered edges.
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Create a box from the two corners of a mouse drag, in any direction.
    pub fn from_corners(a: (f64, f64), b: (f64, f64)) -> Self {
        Self {
            x1: a.0.min(b.0),
            y1: a.1.min(b.1),
            x2: a.0.max(b.0),
            y2: a.1.max(b.1),
        }
    }

    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    pub fn area(&self) -> f64 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    /// True when the box encloses no pixels.
    pub fn is_empty(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    /// Shift the box by the given offset.
    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x1 + dx, self.y1 + dy, self.x2 + dx, self.y2 + dy)
    }
}

/// Box center and size as fractions of the frame dimensions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedBox {
    pub cx: f64,
    pub cy: f64,
    pub w: f64,
    pub h: f64,
}

/// One line of a persisted annotation file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnotationLine {
    pub class_index: usize,
    pub bbox: NormalizedBox,
}

impl fmt::Display for AnnotationLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:.6} {:.6} {:.6} {:.6}",
            self.class_index, self.bbox.cx, self.bbox.cy, self.bbox.w, self.bbox.h
        )
    }
}

/// Index of a label within the session's class list.
///
/// Handed out by [`ClassList`], so every id outside this crate refers to a
/// configured class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClassId(usize);

impl ClassId {
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

/// The ordered, immutable set of class names for a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassList {
    names: Vec<String>,
}

impl ClassList {
    /// Build a class list, trimming names and rejecting empty or duplicate ones.
    pub fn new<I, S>(names: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list: Vec<String> = Vec::new();
        for name in names {
            let name = name.as_ref().trim();
            if name.is_empty() {
                continue;
            }
            if list.iter().any(|existing| existing == name) {
                return Err(ConfigError::DuplicateClass(name.to_string()));
            }
            list.push(name.to_string());
        }

        if list.is_empty() {
            return Err(ConfigError::NoClasses);
        }
        Ok(Self { names: list })
    }

    /// Parse a comma separated list such as `"car, person"`.
    pub fn parse(list: &str) -> Result<Self, ConfigError> {
        Self::new(list.split(','))
    }

    /// Look up a class by name. Surrounding whitespace is ignored.
    pub fn resolve(&self, name: &str) -> Option<ClassId> {
        let name = name.trim();
        self.names.iter().position(|n| n == name).map(ClassId)
    }

    /// Class id for a position in the list, if in range.
    pub fn id(&self, index: usize) -> Option<ClassId> {
        (index < self.names.len()).then_some(ClassId(index))
    }

    pub fn name(&self, id: ClassId) -> &str {
        &self.names[id.0]
    }

    pub fn ids(&self) -> impl Iterator<Item = ClassId> {
        (0..self.names.len()).map(ClassId)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Contents of `classes.txt`: names joined by newlines, no trailing newline.
    pub fn to_file_contents(&self) -> String {
        self.names.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_corners_orders_edges() {
        let b = BoundingBox::from_corners((300.0, 40.0), (100.0, 250.0));
        assert_eq!(b, BoundingBox::new(100.0, 40.0, 300.0, 250.0));
        assert_eq!(b.width(), 200.0);
        assert_eq!(b.height(), 210.0);
    }

    #[test]
    fn test_zero_drag_is_empty() {
        let b = BoundingBox::from_corners((50.0, 50.0), (50.0, 80.0));
        assert!(b.is_empty());
        assert_eq!(b.area(), 0.0);
    }

    #[test]
    fn test_annotation_line_format() {
        let line = AnnotationLine {
            class_index: 0,
            bbox: NormalizedBox { cx: 0.2, cy: 0.25, w: 0.2, h: 0.25 },
        };
        assert_eq!(line.to_string(), "0 0.200000 0.250000 0.200000 0.250000");
    }

    #[test]
    fn test_class_list_parse_trims() {
        let classes = ClassList::parse(" car , person").unwrap();
        assert_eq!(classes.names(), &["car".to_string(), "person".to_string()]);
        assert_eq!(classes.resolve("person").map(ClassId::index), Some(1));
        assert_eq!(classes.resolve(" car ").map(ClassId::index), Some(0));
        assert!(classes.resolve("truck").is_none());
    }

    #[test]
    fn test_class_list_rejects_empty() {
        assert!(matches!(ClassList::parse(""), Err(ConfigError::NoClasses)));
        assert!(matches!(ClassList::parse(" , ,"), Err(ConfigError::NoClasses)));
    }

    #[test]
    fn test_class_list_rejects_duplicates() {
        assert!(matches!(
            ClassList::parse("car,person,car"),
            Err(ConfigError::DuplicateClass(name)) if name == "car"
        ));
    }

    #[test]
    fn test_classes_file_contents() {
        let classes = ClassList::parse("car,person").unwrap();
        assert_eq!(classes.to_file_contents(), "car\nperson");
    }

    #[test]
    fn test_class_id_range() {
        let classes = ClassList::parse("a,b").unwrap();
        assert!(classes.id(1).is_some());
        assert!(classes.id(2).is_none());
        assert_eq!(classes.ids().count(), 2);
    }
}
