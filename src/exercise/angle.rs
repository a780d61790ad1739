//! Joint angle from three landmarks.
//!
//! The angle at vertex `b` is the angle between `a - b` and `c - b`,
//! so a fully extended elbow reads close to 180° and a tight curl
//! reads low.

use std::time::Instant;

use crate::error::AngleError;
use crate::pose::{JointName, Point2D, Pose};

/// Three joints measured at the middle one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JointAngle {
    pub first: JointName,
    pub vertex: JointName,
    pub last: JointName,
}

impl JointAngle {
    pub const LEFT_ELBOW: JointAngle = JointAngle {
        first: JointName::LeftShoulder,
        vertex: JointName::LeftElbow,
        last: JointName::LeftWrist,
    };

    pub const RIGHT_ELBOW: JointAngle = JointAngle {
        first: JointName::RightShoulder,
        vertex: JointName::RightElbow,
        last: JointName::RightWrist,
    };

    /// The shoulder-elbow-wrist triple for an elbow joint
    pub fn for_vertex(vertex: JointName) -> Option<JointAngle> {
        match vertex {
            JointName::LeftElbow => Some(Self::LEFT_ELBOW),
            JointName::RightElbow => Some(Self::RIGHT_ELBOW),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleMeasurement {
    pub vertex: JointName,
    pub value_degrees: f32,
    pub timestamp: Instant,
}

/// Angle at `b` in degrees, within [0, 180]
pub fn compute_angle(a: Point2D, b: Point2D, c: Point2D) -> Result<f32, AngleError> {
    let ab = a.sub(&b);
    let cb = c.sub(&b);

    let mag_ab = ab.length();
    let mag_cb = cb.length();
    if mag_ab == 0.0 || mag_cb == 0.0 {
        return Err(AngleError::DegenerateGeometry);
    }

    // Noisy landmarks can push the ratio just past 1.0
    let cos = (ab.dot(&cb) / (mag_ab * mag_cb)).clamp(-1.0, 1.0);
    Ok(cos.acos().to_degrees())
}

/// Measure one joint angle on a detected pose.
///
/// Returns `None` when any of the three joints is below `min_confidence`
/// or the geometry is degenerate; the caller skips that joint for the tick.
pub fn measure(
    pose: &Pose,
    angle: &JointAngle,
    frame_size: (u32, u32),
    min_confidence: f32,
    now: Instant,
) -> Option<AngleMeasurement> {
    let (w, h) = frame_size;
    let a = pose.visible_point(angle.first, min_confidence, w, h)?;
    let b = pose.visible_point(angle.vertex, min_confidence, w, h)?;
    let c = pose.visible_point(angle.last, min_confidence, w, h)?;

    match compute_angle(a, b, c) {
        Ok(value_degrees) => Some(AngleMeasurement {
            vertex: angle.vertex,
            value_degrees,
            timestamp: now,
        }),
        Err(e) => {
            log::debug!("skipping {}: {}", angle.vertex.label(), e);
            None
        }
    }
}
