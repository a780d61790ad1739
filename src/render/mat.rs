use anyhow::Result;
use opencv::{
    core::{Mat, Point, Scalar},
    imgproc,
    prelude::*,
};

use super::overlay::Canvas;

/// 0xRRGGBB to an OpenCV BGR scalar
fn bgr(color: u32) -> Scalar {
    let r = ((color >> 16) & 0xFF) as f64;
    let g = ((color >> 8) & 0xFF) as f64;
    let b = (color & 0xFF) as f64;
    Scalar::new(b, g, r, 0.0)
}

impl Canvas for Mat {
    fn dimensions(&self) -> (u32, u32) {
        (self.cols().max(0) as u32, self.rows().max(0) as u32)
    }

    fn draw_circle(&mut self, center: (i32, i32), radius: i32, color: u32) -> Result<()> {
        imgproc::circle(
            self,
            Point::new(center.0, center.1),
            radius,
            bgr(color),
            imgproc::FILLED,
            imgproc::LINE_8,
            0,
        )?;
        Ok(())
    }

    fn draw_line(&mut self, from: (i32, i32), to: (i32, i32), thickness: i32, color: u32) -> Result<()> {
        imgproc::line(
            self,
            Point::new(from.0, from.1),
            Point::new(to.0, to.1),
            bgr(color),
            thickness,
            imgproc::LINE_8,
            0,
        )?;
        Ok(())
    }

    fn draw_label(&mut self, at: (i32, i32), text: &str, color: u32) -> Result<()> {
        // Dark outline first so the label reads on any background
        imgproc::put_text(
            self,
            text,
            Point::new(at.0, at.1),
            imgproc::FONT_HERSHEY_SIMPLEX,
            0.6,
            Scalar::new(0.0, 0.0, 0.0, 0.0),
            3,
            imgproc::LINE_8,
            false,
        )?;
        imgproc::put_text(
            self,
            text,
            Point::new(at.0, at.1),
            imgproc::FONT_HERSHEY_SIMPLEX,
            0.6,
            bgr(color),
            1,
            imgproc::LINE_8,
            false,
        )?;
        Ok(())
    }
}
