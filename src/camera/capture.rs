use anyhow::{Context, Result};
use opencv::{
    core::Mat,
    prelude::*,
    videoio::{self, VideoCapture, VideoCaptureAPIs},
};
use std::path::Path;

use super::CaptureSource;
use crate::config::CaptureConfig;
use crate::error::CaptureError;

#[derive(Debug, Clone)]
enum Origin {
    Device(i32),
    File(String),
}

/// OpenCV capture over a camera device or a video file
pub struct OpenCvCapture {
    capture: VideoCapture,
    origin: Origin,
    width: u32,
    height: u32,
}

impl OpenCvCapture {
    /// Open a camera, requesting a resolution and frame rate
    pub fn open_camera(index: i32, width: Option<u32>, height: Option<u32>, fps: Option<u32>) -> Result<Self> {
        let mut capture =
            VideoCapture::new(index, VideoCaptureAPIs::CAP_ANY as i32).context("Failed to open camera")?;

        if !capture.is_opened()? {
            anyhow::bail!("Camera {} is not available", index);
        }

        if let Some(w) = width {
            capture.set(videoio::CAP_PROP_FRAME_WIDTH, w as f64)?;
        }
        if let Some(h) = height {
            capture.set(videoio::CAP_PROP_FRAME_HEIGHT, h as f64)?;
        }
        if let Some(f) = fps {
            capture.set(videoio::CAP_PROP_FPS, f as f64)?;
        }
        capture.set(videoio::CAP_PROP_BUFFERSIZE, 1.0)?;

        Self::finish(capture, Origin::Device(index))
    }

    /// Open a video file for analysis
    pub fn open_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let name = path.to_string_lossy().into_owned();
        let capture = VideoCapture::from_file(&name, VideoCaptureAPIs::CAP_ANY as i32)
            .with_context(|| format!("Failed to open video {}", name))?;

        if !capture.is_opened()? {
            anyhow::bail!("Video {} could not be decoded", name);
        }

        Self::finish(capture, Origin::File(name))
    }

    /// Camera or file, whichever the config asks for
    pub fn from_config(config: &CaptureConfig) -> Result<Self> {
        match &config.video_path {
            Some(path) => Self::open_file(path),
            None => Self::open_camera(config.device_index, config.width, config.height, config.fps),
        }
    }

    fn finish(capture: VideoCapture, origin: Origin) -> Result<Self> {
        let width = capture.get(videoio::CAP_PROP_FRAME_WIDTH)? as u32;
        let height = capture.get(videoio::CAP_PROP_FRAME_HEIGHT)? as u32;
        let fps = capture.get(videoio::CAP_PROP_FPS)?;
        log::info!("{:?}: {}x{} @ {:.1} fps", origin, width, height, fps);

        Ok(Self {
            capture,
            origin,
            width,
            height,
        })
    }
}

impl CaptureSource for OpenCvCapture {
    type Frame = Mat;

    /// BGR frame
    fn read(&mut self) -> Result<Mat, CaptureError> {
        let mut frame = Mat::default();
        let ok = self
            .capture
            .read(&mut frame)
            .map_err(|e| CaptureError::Device(e.to_string()))?;

        if !ok || frame.empty() {
            return Err(match self.origin {
                Origin::File(_) => CaptureError::EndOfStream,
                Origin::Device(index) => CaptureError::Device(format!("camera {} returned no frame", index)),
            });
        }

        Ok(frame)
    }

    fn frame_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn describe(&self) -> String {
        match &self.origin {
            Origin::Device(index) => format!("camera {}", index),
            Origin::File(path) => path.clone(),
        }
    }
}

impl Drop for OpenCvCapture {
    fn drop(&mut self) {
        if let Err(e) = self.capture.release() {
            log::warn!("releasing {}: {}", self.describe(), e);
        }
    }
}
