use anyhow::Result;

use crate::exercise::AngleMeasurement;
use crate::pose::{JointName, Pose};

use super::skeleton::{
    ARM_SEGMENTS, JOINT_COLOR, JOINT_RADIUS, LABEL_COLOR, SEGMENT_COLOR, SEGMENT_THICKNESS,
    SKELETON_COLOR, SKELETON_CONNECTIONS,
};

/// Something the annotator can draw on. Colors are 0xRRGGBB.
pub trait Canvas {
    /// (width, height) in pixels
    fn dimensions(&self) -> (u32, u32);

    /// Filled circle
    fn draw_circle(&mut self, center: (i32, i32), radius: i32, color: u32) -> Result<()>;

    fn draw_line(&mut self, from: (i32, i32), to: (i32, i32), thickness: i32, color: u32) -> Result<()>;

    /// Text anchored at its bottom-left corner. Canvases without fonts skip it.
    fn draw_label(&mut self, _at: (i32, i32), _text: &str, _color: u32) -> Result<()> {
        Ok(())
    }
}

/// Overlay a detected pose and its angle readouts onto `canvas`.
///
/// Joints below `min_confidence` are left out.
pub fn annotate<C: Canvas + ?Sized>(
    canvas: &mut C,
    pose: &Pose,
    measurements: &[AngleMeasurement],
    min_confidence: f32,
) -> Result<()> {
    let (w, h) = canvas.dimensions();
    let pixel = |joint: JointName| {
        pose.visible_point(joint, min_confidence, w, h)
            .map(|p| p.to_pixel())
    };

    for (start, end) in SKELETON_CONNECTIONS.iter() {
        if let (Some(a), Some(b)) = (pixel(*start), pixel(*end)) {
            canvas.draw_line(a, b, 1, SKELETON_COLOR)?;
        }
    }

    for (start, end) in ARM_SEGMENTS.iter() {
        if let (Some(a), Some(b)) = (pixel(*start), pixel(*end)) {
            canvas.draw_line(a, b, SEGMENT_THICKNESS, SEGMENT_COLOR)?;
        }
    }

    for joint in JointName::ARM {
        if let Some(p) = pixel(joint) {
            canvas.draw_circle(p, JOINT_RADIUS, JOINT_COLOR)?;
        }
    }

    for m in measurements {
        if let Some((x, y)) = pixel(m.vertex) {
            let text = format!("{:.0} deg", m.value_degrees);
            canvas.draw_label((x + 8, y - 8), &text, LABEL_COLOR)?;
        }
    }

    Ok(())
}
