//! Letterboxed model input.
//!
//! MoveNet wants a square RGB image. The frame is padded to a square with
//! black borders (centered) before resizing, so arms keep their proportions
//! and elbow angles are not skewed by a non-square camera.

#[cfg(feature = "desktop")]
use anyhow::{Context, Result};
#[cfg(feature = "desktop")]
use ndarray::Array4;
#[cfg(feature = "desktop")]
use opencv::{
    core::{self, AlgorithmHint, Mat, Scalar, Size},
    imgproc,
    prelude::*,
};

/// MoveNet input edge length
pub const MOVENET_INPUT_SIZE: i32 = 192;

/// Placement of a `width` x `height` frame inside its padded square
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Letterbox {
    pub width: u32,
    pub height: u32,
    pub side: u32,
    pub pad_left: u32,
    pub pad_top: u32,
}

impl Letterbox {
    pub fn for_frame(width: u32, height: u32) -> Self {
        let side = width.max(height);
        Self {
            width,
            height,
            side,
            pad_left: (side - width) / 2,
            pad_top: (side - height) / 2,
        }
    }

    /// Model coordinates (normalized to the square) to frame-normalized ones
    pub fn to_frame(&self, x: f32, y: f32) -> (f32, f32) {
        if self.width == 0 || self.height == 0 {
            return (x, y);
        }
        let side = self.side as f32;
        (
            (x * side - self.pad_left as f32) / self.width as f32,
            (y * side - self.pad_top as f32) / self.height as f32,
        )
    }
}

/// BGR frame to a `[1, 192, 192, 3]` RGB tensor (0.0-255.0), plus the
/// letterbox needed to map detections back
#[cfg(feature = "desktop")]
pub fn letterbox_for_movenet(frame: &Mat) -> Result<(Array4<f32>, Letterbox)> {
    let lb = Letterbox::for_frame(frame.cols().max(0) as u32, frame.rows().max(0) as u32);

    let mut square = Mat::default();
    core::copy_make_border(
        frame,
        &mut square,
        lb.pad_top as i32,
        (lb.side - lb.height - lb.pad_top) as i32,
        lb.pad_left as i32,
        (lb.side - lb.width - lb.pad_left) as i32,
        core::BORDER_CONSTANT,
        Scalar::all(0.0),
    )?;

    let mut resized = Mat::default();
    imgproc::resize(
        &square,
        &mut resized,
        Size::new(MOVENET_INPUT_SIZE, MOVENET_INPUT_SIZE),
        0.0,
        0.0,
        imgproc::INTER_AREA,
    )?;

    let mut rgb = Mat::default();
    imgproc::cvt_color(
        &resized,
        &mut rgb,
        imgproc::COLOR_BGR2RGB,
        0,
        AlgorithmHint::ALGO_HINT_DEFAULT,
    )?;

    let side = MOVENET_INPUT_SIZE as usize;
    let values: Vec<f32> = rgb.data_bytes()?.iter().map(|&b| b as f32).collect();
    let tensor = Array4::from_shape_vec((1, side, side, 3), values)
        .context("Unexpected model input layout")?;

    Ok((tensor, lb))
}
