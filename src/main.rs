// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! trackmark - tracked bounding box annotation for detection datasets
//!
//! Opens a video (or a directory of frames) paused on its first frame. Draw
//! boxes, pick a class for each, press P to let the trackers follow them and
//! every n-th frame is written to the output directory in YOLO format.

use anyhow::{Context, Result};
use clap::Parser;
use std::cell::RefCell;
use std::rc::Rc;
use trackmark::app::{AnnotatorApp, FatalError};
use trackmark::config::{Args, SessionConfig};
use trackmark::io::{export::Exporter, media};
use trackmark::session::Session;
use trackmark::tracking;

fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    // Every precondition is checked before the output directory is created
    let config = SessionConfig::from_args(Args::parse())?;
    let factory = tracking::factory_for(config.tracker)?;

    let mut source = media::open_source(&config.input)?;
    let first = source
        .next_frame()?
        .with_context(|| format!("No frames could be read from {}", config.input.display()))?;
    let scaler = media::FrameScaler::for_source(first.dimensions(), config.max_width, config.display_width);
    let first = scaler.apply(first);
    let (width, height) = first.dimensions();

    let exporter = Exporter::create(&config.save_path, &config.classes)?;
    let mut session = Session::new(&config, (width, height), factory, exporter);
    session.process_frame(&first)?;
    log::info!(
        "Annotating {} at {}x{} with classes [{}]",
        config.input.display(),
        width,
        height,
        config.classes.names().join(", ")
    );

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([width as f32 + 260.0, height as f32 + 60.0])
            .with_min_inner_size([480.0, 320.0])
            .with_title("trackmark - Automated Labelling"),
        ..Default::default()
    };

    let fatal: FatalError = Rc::new(RefCell::new(None));
    let app_fatal = fatal.clone();
    let frame_delay = config.frame_delay;
    eframe::run_native(
        "trackmark",
        options,
        Box::new(move |_cc| {
            Ok(Box::new(AnnotatorApp::new(
                session,
                source,
                scaler,
                first,
                frame_delay,
                app_fatal,
            )))
        }),
    )
    .map_err(|e| anyhow::anyhow!("Application error: {}", e))?;

    let failure = fatal.borrow_mut().take();
    match failure {
        Some(error) => Err(error),
        None => Ok(()),
    }
}
