// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! trackmark - tracked bounding box annotation for detection datasets
//!
//! Boxes are drawn on a paused frame, followed through the video by
//! single-object trackers, and every n-th tracked frame is saved as an image
//! plus a YOLO format annotation file.

pub mod app;
pub mod config;
pub mod error;
pub mod io;
pub mod models;
pub mod session;
pub mod tracking;
pub mod ui;
pub mod util;
