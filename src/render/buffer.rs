use anyhow::Result;

use crate::pose::Point2D;

use super::overlay::Canvas;

/// Plot background (RGB)
pub const PLOT_BACKGROUND: u32 = 0x101018;
/// Plot border (RGB)
pub const PLOT_BORDER: u32 = 0x505060;
/// Trajectory line (RGB)
pub const TRAJECTORY_COLOR: u32 = 0x40A0FF;
/// Latest trajectory point (RGB)
pub const TRAJECTORY_HEAD_COLOR: u32 = 0xFF4040;

/// 0x00RRGGBB pixel buffer, the layout minifb displays
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    pixels: Vec<u32>,
    width: usize,
    height: usize,
}

impl FrameBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            pixels: vec![0u32; width * height],
            width,
            height,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<u32> {
        self.in_bounds(x, y)
            .then(|| self.pixels[y as usize * self.width + x as usize])
    }

    pub fn clear(&mut self, color: u32) {
        self.pixels.fill(color);
    }

    /// Set a pixel; out-of-bounds writes are ignored
    pub fn set_pixel(&mut self, x: i32, y: i32, color: u32) {
        if self.in_bounds(x, y) {
            self.pixels[y as usize * self.width + x as usize] = color;
        }
    }

    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width as i32 && y >= 0 && y < self.height as i32
    }

    /// Square brush of side `size`
    fn stamp(&mut self, x: i32, y: i32, size: i32, color: u32) {
        let lo = -(size - 1) / 2;
        let hi = size / 2;
        for dy in lo..=hi {
            for dx in lo..=hi {
                self.set_pixel(x + dx, y + dy, color);
            }
        }
    }

    /// Bresenham line
    pub fn line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, thickness: i32, color: u32) {
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;

        let mut x = x0;
        let mut y = y0;

        loop {
            self.stamp(x, y, thickness.max(1), color);

            if x == x1 && y == y1 {
                break;
            }

            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// Filled circle
    pub fn circle(&mut self, cx: i32, cy: i32, radius: i32, color: u32) {
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx * dx + dy * dy <= radius * radius {
                    self.set_pixel(cx + dx, cy + dy, color);
                }
            }
        }
    }
}

impl Canvas for FrameBuffer {
    fn dimensions(&self) -> (u32, u32) {
        (self.width as u32, self.height as u32)
    }

    fn draw_circle(&mut self, center: (i32, i32), radius: i32, color: u32) -> Result<()> {
        self.circle(center.0, center.1, radius, color);
        Ok(())
    }

    fn draw_line(&mut self, from: (i32, i32), to: (i32, i32), thickness: i32, color: u32) -> Result<()> {
        self.line(from.0, from.1, to.0, to.1, thickness, color);
        Ok(())
    }
}

/// Render a trajectory recorded in a `source_size` frame, scaled to fill `buf`.
///
/// Image orientation is kept: y grows downwards, as on the video.
pub fn draw_trajectory(buf: &mut FrameBuffer, points: &[Point2D], source_size: (u32, u32)) {
    buf.clear(PLOT_BACKGROUND);

    let (bw, bh) = (buf.width() as i32, buf.height() as i32);
    if bw == 0 || bh == 0 {
        return;
    }
    buf.line(0, 0, bw - 1, 0, 1, PLOT_BORDER);
    buf.line(bw - 1, 0, bw - 1, bh - 1, 1, PLOT_BORDER);
    buf.line(bw - 1, bh - 1, 0, bh - 1, 1, PLOT_BORDER);
    buf.line(0, bh - 1, 0, 0, 1, PLOT_BORDER);

    let (sw, sh) = source_size;
    if sw == 0 || sh == 0 {
        return;
    }
    let sx = (bw - 1) as f32 / sw as f32;
    let sy = (bh - 1) as f32 / sh as f32;
    // Clamped to the plot so the line walk stays bounded
    let to_plot = |p: &Point2D| {
        (
            (p.x * sx).round().clamp(0.0, (bw - 1) as f32) as i32,
            (p.y * sy).round().clamp(0.0, (bh - 1) as f32) as i32,
        )
    };

    let plotted: Vec<(i32, i32)> = points
        .iter()
        .filter(|p| p.x.is_finite() && p.y.is_finite())
        .map(to_plot)
        .collect();

    for pair in plotted.windows(2) {
        let ((x0, y0), (x1, y1)) = (pair[0], pair[1]);
        buf.line(x0, y0, x1, y1, 1, TRAJECTORY_COLOR);
    }

    if let Some(&(x, y)) = plotted.last() {
        buf.circle(x, y, 3, TRAJECTORY_HEAD_COLOR);
    }
}
