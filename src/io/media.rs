// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Media sources (image sequences and videos).
//!
//! This module reads frames from a directory of images or, with the
//! `video-opencv` feature, from any video OpenCV can decode, and scales them
//! to the fixed display size used for the whole session.

use anyhow::{Context, Result};
use image::imageops::{self, FilterType};
use std::path::{Path, PathBuf};

/// An RGB frame as displayed, tracked and exported.
pub type Frame = image::RgbImage;

/// Image file extensions accepted in a frame directory.
const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "bmp", "tiff", "tif"];

/// A forward-only stream of frames.
pub trait VideoSource {
    /// Read the next frame, or `None` once the source is exhausted.
    fn next_frame(&mut self) -> Result<Option<Frame>>;
}

/// Open the input: directories are read as image sequences, anything else as
/// a video file.
pub fn open_source(input: &Path) -> Result<Box<dyn VideoSource>> {
    if input.is_dir() {
        return Ok(Box::new(ImageSequenceSource::open(input)?));
    }

    #[cfg(feature = "video-opencv")]
    {
        Ok(Box::new(opencv_source::OpenCvSource::open(input)?))
    }

    #[cfg(not(feature = "video-opencv"))]
    {
        anyhow::bail!(
            "cannot decode {}: video files need the `video-opencv` feature, pass a directory of frames instead",
            input.display()
        )
    }
}

/// Frames read from image files in a directory, in file name order.
pub struct ImageSequenceSource {
    paths: std::vec::IntoIter<PathBuf>,
}

impl ImageSequenceSource {
    pub fn open(dir: &Path) -> Result<Self> {
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)
            .with_context(|| format!("Failed to read frame directory {}", dir.display()))?
        {
            let path = entry?.path();
            let is_image = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                .unwrap_or(false);
            if is_image && path.is_file() {
                paths.push(path);
            }
        }
        paths.sort();

        log::info!("Found {} frames in {}", paths.len(), dir.display());
        Ok(Self {
            paths: paths.into_iter(),
        })
    }
}

impl VideoSource for ImageSequenceSource {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        let Some(path) = self.paths.next() else {
            return Ok(None);
        };
        let frame = image::open(&path)
            .with_context(|| format!("Failed to load frame {}", path.display()))?
            .to_rgb8();
        Ok(Some(frame))
    }
}

/// Scales every frame to the size chosen from the first one.
///
/// Sources wider than `max_width` are shrunk so their width becomes
/// `display_width`; narrower sources keep their size. The target never
/// changes afterwards, so box coordinates stay valid for the whole session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameScaler {
    target: (u32, u32),
}

impl FrameScaler {
    pub fn for_source(source_size: (u32, u32), max_width: u32, display_width: u32) -> Self {
        let (w, h) = source_size;
        if w <= max_width {
            return Self { target: (w, h) };
        }
        let ratio = display_width as f64 / w as f64;
        let height = ((h as f64 * ratio).round() as u32).max(1);
        Self {
            target: (display_width, height),
        }
    }

    pub fn target(&self) -> (u32, u32) {
        self.target
    }

    pub fn apply(&self, frame: Frame) -> Frame {
        if frame.dimensions() == self.target {
            return frame;
        }
        imageops::resize(&frame, self.target.0, self.target.1, FilterType::Triangle)
    }
}

#[cfg(feature = "video-opencv")]
pub use opencv_source::{frame_to_mat, OpenCvSource};

#[cfg(feature = "video-opencv")]
mod opencv_source {
    use super::{Frame, VideoSource};
    use anyhow::{bail, Context, Result};
    use opencv::{
        core::{self, Mat, Scalar},
        imgproc,
        prelude::*,
        videoio,
    };
    use std::path::Path;

    /// Frames decoded by OpenCV `VideoCapture`.
    pub struct OpenCvSource {
        capture: videoio::VideoCapture,
        buffer: Mat,
    }

    impl OpenCvSource {
        pub fn open(path: &Path) -> Result<Self> {
            let name = path
                .to_str()
                .with_context(|| format!("Input path is not valid UTF-8: {}", path.display()))?;
            let capture = videoio::VideoCapture::from_file(name, videoio::CAP_ANY)
                .with_context(|| format!("Failed to open input video: {}", name))?;
            if !capture.is_opened()? {
                bail!("Failed to open input video: {}", name);
            }
            Ok(Self {
                capture,
                buffer: Mat::default(),
            })
        }
    }

    impl VideoSource for OpenCvSource {
        fn next_frame(&mut self) -> Result<Option<Frame>> {
            if !self.capture.read(&mut self.buffer)? || self.buffer.empty() {
                return Ok(None);
            }
            mat_to_frame(&self.buffer).map(Some)
        }
    }

    /// Convert a BGR `Mat` into an RGB frame.
    pub fn mat_to_frame(mat: &Mat) -> Result<Frame> {
        let mut rgb = Mat::default();
        imgproc::cvt_color_def(mat, &mut rgb, imgproc::COLOR_BGR2RGB)
            .context("Failed to convert frame to RGB")?;
        let rgb = if rgb.is_continuous() { rgb } else { rgb.try_clone()? };

        let (width, height) = (rgb.cols() as u32, rgb.rows() as u32);
        let bytes = rgb.data_bytes()?.to_vec();
        Frame::from_raw(width, height, bytes).context("Decoded frame has an unexpected pixel layout")
    }

    /// Convert an RGB frame into a BGR `Mat` for OpenCV algorithms.
    pub fn frame_to_mat(frame: &Frame) -> Result<Mat> {
        let mut rgb = Mat::new_rows_cols_with_default(
            frame.height() as i32,
            frame.width() as i32,
            core::CV_8UC3,
            Scalar::all(0.0),
        )?;
        rgb.data_bytes_mut()?.copy_from_slice(frame.as_raw());

        let mut bgr = Mat::default();
        imgproc::cvt_color_def(&rgb, &mut bgr, imgproc::COLOR_RGB2BGR)
            .context("Failed to convert frame to BGR")?;
        Ok(bgr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_scaler_keeps_small_frames() {
        let scaler = FrameScaler::for_source((640, 480), 1000, 600);
        assert_eq!(scaler.target(), (640, 480));

        let frame = Frame::new(640, 480);
        assert_eq!(scaler.apply(frame).dimensions(), (640, 480));
    }

    #[test]
    fn test_scaler_shrinks_wide_frames() {
        let scaler = FrameScaler::for_source((1920, 1080), 1000, 600);
        assert_eq!(scaler.target(), (600, 338));

        let frame = Frame::from_pixel(1920, 1080, Rgb([10, 20, 30]));
        let scaled = scaler.apply(frame);
        assert_eq!(scaled.dimensions(), (600, 338));
        assert_eq!(scaled.get_pixel(300, 100), &Rgb([10, 20, 30]));
    }

    #[test]
    fn test_scaler_forces_fixed_size() {
        let scaler = FrameScaler::for_source((1200, 800), 1000, 600);
        let odd = Frame::new(1210, 790);
        assert_eq!(scaler.apply(odd).dimensions(), scaler.target());
    }

    #[test]
    fn test_image_sequence_reads_sorted_images() {
        let dir = tempfile::tempdir().unwrap();
        for (name, value) in [("b.png", 2u8), ("a.png", 1), ("c.png", 3)] {
            Frame::from_pixel(4, 3, Rgb([value, 0, 0]))
                .save(dir.path().join(name))
                .unwrap();
        }
        std::fs::write(dir.path().join("notes.txt"), "not a frame").unwrap();

        let mut source = ImageSequenceSource::open(dir.path()).unwrap();
        let mut reds = Vec::new();
        while let Some(frame) = source.next_frame().unwrap() {
            assert_eq!(frame.dimensions(), (4, 3));
            reds.push(frame.get_pixel(0, 0)[0]);
        }
        assert_eq!(reds, vec![1, 2, 3]);
    }

    #[test]
    fn test_open_source_accepts_directories() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = open_source(dir.path()).unwrap();
        assert!(source.next_frame().unwrap().is_none());
    }
}
