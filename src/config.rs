// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Command line options and settings files.
//!
//! Options can be given on the command line or in a YAML settings file passed
//! with `--config`. Command line values win over file values, which win over
//! the built-in defaults. [`SessionConfig::resolve`] checks every startup
//! precondition before anything is written to disk.

use crate::error::ConfigError;
use crate::models::annotation::ClassList;
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_SAVE_EVERY: u64 = 10;
pub const DEFAULT_DISPLAY_WIDTH: u32 = 600;
pub const DEFAULT_MAX_WIDTH: u32 = 1000;
pub const DEFAULT_MIN_AREA_PERCENT: f64 = 0.1;
pub const DEFAULT_FRAME_DELAY_MS: u64 = 1;

/// Single-object tracker backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackerKind {
    /// Built-in grayscale template matching
    #[default]
    Template,
    /// OpenCV KCF (requires the `video-opencv` feature)
    Kcf,
}

#[derive(Parser, Debug, Default)]
#[command(name = "trackmark", version, about = "Draw boxes once, track them through a video, export YOLO annotations")]
pub struct Args {
    /// Video file, or a directory of frame images
    #[arg(short = 'i', long, value_name = "PATH")]
    pub input_video: Option<PathBuf>,

    /// Directory to create for images and annotations (must not exist)
    #[arg(short = 's', long, value_name = "PATH")]
    pub save_path: Option<PathBuf>,

    /// Only every n-th tracked frame is saved [default: 10]
    #[arg(short = 'n', long)]
    pub save_every: Option<u64>,

    /// Starting number of the annotation naming sequence [default: 0]
    #[arg(short = 'o', long)]
    pub start_number: Option<u64>,

    /// Class names separated by ','
    #[arg(short = 'c', long)]
    pub classes: Option<String>,

    /// Width frames are scaled to when wider than --max-width [default: 600]
    #[arg(long)]
    pub display_width: Option<u32>,

    /// Frames wider than this are scaled down for display [default: 1000]
    #[arg(long)]
    pub max_width: Option<u32>,

    /// Boxes smaller than this percentage of the frame area are ignored [default: 0.1]
    #[arg(long)]
    pub min_area_percent: Option<f64>,

    /// Delay between frames while tracking, in milliseconds [default: 1]
    #[arg(long)]
    pub frame_delay_ms: Option<u64>,

    /// Tracker backend [default: template]
    #[arg(long, value_enum)]
    pub tracker: Option<TrackerKind>,

    /// YAML settings file providing defaults for the options above
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Class names in a settings file, either as a list or comma separated.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ClassesSetting {
    List(Vec<String>),
    Joined(String),
}

/// Contents of a YAML settings file. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub input_video: Option<PathBuf>,
    pub save_path: Option<PathBuf>,
    pub save_every: Option<u64>,
    pub start_number: Option<u64>,
    pub classes: Option<ClassesSetting>,
    pub display_width: Option<u32>,
    pub max_width: Option<u32>,
    pub min_area_percent: Option<f64>,
    pub frame_delay_ms: Option<u64>,
    pub tracker: Option<TrackerKind>,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        let settings = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse settings file {}", path.display()))?;
        Ok(settings)
    }
}

/// Validated options for one annotation session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub input: PathBuf,
    pub save_path: PathBuf,
    pub save_every: u64,
    pub start_number: u64,
    pub classes: ClassList,
    pub display_width: u32,
    pub max_width: u32,
    pub min_area_percent: f64,
    pub frame_delay: Duration,
    pub tracker: TrackerKind,
}

impl SessionConfig {
    /// Parse the command line and any settings file it names.
    pub fn from_args(args: Args) -> Result<Self> {
        let settings = match args.config.as_deref() {
            Some(path) => Settings::load(path)?,
            None => Settings::default(),
        };
        Ok(Self::resolve(args, settings)?)
    }

    /// Merge command line and file values and check startup preconditions.
    pub fn resolve(args: Args, settings: Settings) -> Result<Self, ConfigError> {
        let input = args
            .input_video
            .or(settings.input_video)
            .ok_or(ConfigError::MissingOption("input-video"))?;
        let save_path = args
            .save_path
            .or(settings.save_path)
            .ok_or(ConfigError::MissingOption("save-path"))?;

        let classes = match (args.classes, settings.classes) {
            (Some(joined), _) | (None, Some(ClassesSetting::Joined(joined))) => ClassList::parse(&joined)?,
            (None, Some(ClassesSetting::List(names))) => ClassList::new(names)?,
            (None, None) => return Err(ConfigError::MissingOption("classes")),
        };

        let save_every = args
            .save_every
            .or(settings.save_every)
            .unwrap_or(DEFAULT_SAVE_EVERY);
        if save_every == 0 {
            return Err(ConfigError::ZeroSaveEvery);
        }

        let display_width = args
            .display_width
            .or(settings.display_width)
            .unwrap_or(DEFAULT_DISPLAY_WIDTH);
        if display_width == 0 {
            return Err(ConfigError::ZeroDisplayWidth);
        }

        let min_area_percent = args
            .min_area_percent
            .or(settings.min_area_percent)
            .unwrap_or(DEFAULT_MIN_AREA_PERCENT);
        if !(0.0..=100.0).contains(&min_area_percent) {
            return Err(ConfigError::InvalidAreaThreshold(min_area_percent));
        }

        let tracker = args.tracker.or(settings.tracker).unwrap_or_default();
        if tracker == TrackerKind::Kcf && !cfg!(feature = "video-opencv") {
            return Err(ConfigError::UnsupportedTracker("kcf".to_string()));
        }

        if save_path.exists() {
            return Err(ConfigError::OutputExists(save_path));
        }

        Ok(Self {
            input,
            save_path,
            save_every,
            start_number: args.start_number.or(settings.start_number).unwrap_or(0),
            classes,
            display_width,
            max_width: args
                .max_width
                .or(settings.max_width)
                .unwrap_or(DEFAULT_MAX_WIDTH),
            min_area_percent,
            frame_delay: Duration::from_millis(
                args.frame_delay_ms
                    .or(settings.frame_delay_ms)
                    .unwrap_or(DEFAULT_FRAME_DELAY_MS),
            ),
            tracker,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(save_path: &Path) -> Args {
        Args {
            input_video: Some(PathBuf::from("video.mp4")),
            save_path: Some(save_path.to_path_buf()),
            classes: Some("car,person".to_string()),
            ..Args::default()
        }
    }

    #[test]
    fn test_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = SessionConfig::resolve(args(&dir.path().join("out")), Settings::default()).unwrap();

        assert_eq!(config.save_every, DEFAULT_SAVE_EVERY);
        assert_eq!(config.start_number, 0);
        assert_eq!(config.display_width, 600);
        assert_eq!(config.max_width, 1000);
        assert_eq!(config.min_area_percent, 0.1);
        assert_eq!(config.frame_delay, Duration::from_millis(1));
        assert_eq!(config.tracker, TrackerKind::Template);
        assert_eq!(config.classes.names(), &["car".to_string(), "person".to_string()]);
    }

    #[test]
    fn test_existing_output_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let result = SessionConfig::resolve(args(dir.path()), Settings::default());
        assert!(matches!(result, Err(ConfigError::OutputExists(_))));
    }

    #[test]
    fn test_empty_classes_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = args(&dir.path().join("out"));
        args.classes = Some(" , ".to_string());
        let result = SessionConfig::resolve(args, Settings::default());
        assert!(matches!(result, Err(ConfigError::NoClasses)));
    }

    #[test]
    fn test_zero_save_every_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = args(&dir.path().join("out"));
        args.save_every = Some(0);
        let result = SessionConfig::resolve(args, Settings::default());
        assert!(matches!(result, Err(ConfigError::ZeroSaveEvery)));
    }

    #[test]
    fn test_missing_required_options() {
        let result = SessionConfig::resolve(Args::default(), Settings::default());
        assert!(matches!(result, Err(ConfigError::MissingOption("input-video"))));
    }

    #[test]
    fn test_command_line_overrides_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        let settings: Settings = serde_yaml::from_str(
            "save_every: 5\nstart_number: 100\nclasses: [dog, cat]\nframe_delay_ms: 30\n",
        )
        .unwrap();

        let mut args = args(&dir.path().join("out"));
        args.classes = None;
        args.save_every = Some(2);

        let config = SessionConfig::resolve(args, settings).unwrap();
        assert_eq!(config.save_every, 2);
        assert_eq!(config.start_number, 100);
        assert_eq!(config.frame_delay, Duration::from_millis(30));
        assert_eq!(config.classes.names(), &["dog".to_string(), "cat".to_string()]);
    }

    #[test]
    fn test_settings_file_accepts_joined_classes() {
        let settings: Settings =
            serde_yaml::from_str("input_video: clip.mp4\nclasses: \"car, truck\"\ntracker: template\n").unwrap();
        assert_eq!(settings.classes, Some(ClassesSetting::Joined("car, truck".to_string())));
        assert_eq!(settings.tracker, Some(TrackerKind::Template));
    }

    #[test]
    fn test_settings_file_rejects_unknown_keys() {
        assert!(serde_yaml::from_str::<Settings>("save_evry: 3\n").is_err());
    }

    #[test]
    fn test_load_settings_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.yaml");
        std::fs::write(&path, "min_area_percent: 0.5\nmax_width: 1280\n").unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.min_area_percent, Some(0.5));
        assert_eq!(settings.max_width, Some(1280));
    }

    #[test]
    fn test_parse_command_line() {
        let args = Args::try_parse_from([
            "trackmark", "-i", "clip.mp4", "-s", "out", "-n", "3", "-o", "7", "-c", "car", "--tracker", "template",
        ])
        .unwrap();
        assert_eq!(args.save_every, Some(3));
        assert_eq!(args.start_number, Some(7));
        assert_eq!(args.tracker, Some(TrackerKind::Template));
    }
}
