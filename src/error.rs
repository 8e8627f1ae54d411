// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Startup precondition failures.
//!
//! Every variant is detected before the output directory is touched, so a
//! failed start never leaves a partial dataset behind.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("the save path {} already exists, please choose a new path", .0.display())]
    OutputExists(PathBuf),
    #[error("at least one class name is required")]
    NoClasses,
    #[error("class name {0:?} is listed more than once")]
    DuplicateClass(String),
    #[error("save interval must be a positive integer")]
    ZeroSaveEvery,
    #[error("display width must be positive")]
    ZeroDisplayWidth,
    #[error("minimum area percentage must be within 0..=100, got {0}")]
    InvalidAreaThreshold(f64),
    #[error("missing required option --{0}")]
    MissingOption(&'static str),
    #[error("tracker backend {0:?} is not available in this build")]
    UnsupportedTracker(String),
}
