use anyhow::{Context, Result};
use minifb::{Key, KeyRepeat, Window, WindowOptions};
use opencv::core::{Mat, Vec3b};
use opencv::prelude::*;

use crate::pose::Point2D;
use crate::session::{DisplaySink, PlotSink, SourceKind, UserCommand};

use super::buffer::{draw_trajectory, FrameBuffer};

fn open_window(title: &str, width: usize, height: usize) -> Result<Window> {
    let mut window = Window::new(
        title,
        width,
        height,
        WindowOptions {
            resize: false,
            ..WindowOptions::default()
        },
    )
    .with_context(|| format!("Failed to open window '{}'", title))?;
    // Pacing is done by the frame loop
    window.set_target_fps(0);
    Ok(window)
}

/// Live video window.
///
/// Keys: R toggles recording, S stops it, L opens the camera, O opens the
/// configured video, Esc quits.
pub struct VideoWindow {
    window: Window,
    buffer: FrameBuffer,
}

impl VideoWindow {
    pub fn new(title: &str, width: usize, height: usize) -> Result<Self> {
        Ok(Self {
            window: open_window(title, width, height)?,
            buffer: FrameBuffer::new(width, height),
        })
    }

    /// BGR Mat into the RGB buffer. Mismatched sizes are cropped.
    fn copy_frame(&mut self, frame: &Mat) -> Result<()> {
        let rows = (frame.rows().max(0) as usize).min(self.buffer.height());
        let cols = (frame.cols().max(0) as usize).min(self.buffer.width());

        for y in 0..rows {
            for x in 0..cols {
                let px = frame.at_2d::<Vec3b>(y as i32, x as i32)?;
                let rgb = ((px[2] as u32) << 16) | ((px[1] as u32) << 8) | px[0] as u32;
                self.buffer.set_pixel(x as i32, y as i32, rgb);
            }
        }
        Ok(())
    }
}

impl DisplaySink<Mat> for VideoWindow {
    fn show(&mut self, frame: &Mat) -> Result<()> {
        self.copy_frame(frame)?;
        self.window
            .update_with_buffer(self.buffer.pixels(), self.buffer.width(), self.buffer.height())?;
        Ok(())
    }

    fn refresh(&mut self) -> Result<()> {
        self.window
            .update_with_buffer(self.buffer.pixels(), self.buffer.width(), self.buffer.height())?;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.window.is_open()
    }

    fn poll_commands(&mut self) -> Vec<UserCommand> {
        self.window
            .get_keys_pressed(KeyRepeat::No)
            .into_iter()
            .filter_map(|key| match key {
                Key::R => Some(UserCommand::ToggleRecording),
                Key::S => Some(UserCommand::StopRecording),
                Key::L => Some(UserCommand::Open(SourceKind::Camera)),
                Key::O => Some(UserCommand::Open(SourceKind::Video)),
                Key::Escape => Some(UserCommand::Quit),
                _ => None,
            })
            .collect()
    }
}

/// Second window plotting the tracked joint's path
pub struct PlotWindow {
    window: Window,
    buffer: FrameBuffer,
}

impl PlotWindow {
    pub fn new(title: &str, width: usize, height: usize) -> Result<Self> {
        Ok(Self {
            window: open_window(title, width, height)?,
            buffer: FrameBuffer::new(width, height),
        })
    }
}

impl PlotSink for PlotWindow {
    fn redraw(&mut self, points: &[Point2D], source_size: (u32, u32)) -> Result<()> {
        if !self.window.is_open() {
            return Ok(());
        }
        draw_trajectory(&mut self.buffer, points, source_size);
        self.window
            .update_with_buffer(self.buffer.pixels(), self.buffer.width(), self.buffer.height())?;
        Ok(())
    }
}
