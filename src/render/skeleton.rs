use crate::pose::JointName;

/// Skeleton edges (start, end)
pub const SKELETON_CONNECTIONS: [(JointName, JointName); 16] = [
    // face
    (JointName::LeftEar, JointName::LeftEye),
    (JointName::LeftEye, JointName::Nose),
    (JointName::Nose, JointName::RightEye),
    (JointName::RightEye, JointName::RightEar),
    // upper body
    (JointName::LeftShoulder, JointName::RightShoulder),
    (JointName::LeftShoulder, JointName::LeftElbow),
    (JointName::LeftElbow, JointName::LeftWrist),
    (JointName::RightShoulder, JointName::RightElbow),
    (JointName::RightElbow, JointName::RightWrist),
    // torso
    (JointName::LeftShoulder, JointName::LeftHip),
    (JointName::RightShoulder, JointName::RightHip),
    (JointName::LeftHip, JointName::RightHip),
    // legs
    (JointName::LeftHip, JointName::LeftKnee),
    (JointName::LeftKnee, JointName::LeftAnkle),
    (JointName::RightHip, JointName::RightKnee),
    (JointName::RightKnee, JointName::RightAnkle),
];

/// Upper-arm segments drawn bold over the skeleton
pub const ARM_SEGMENTS: [(JointName, JointName); 2] = [
    (JointName::LeftShoulder, JointName::LeftElbow),
    (JointName::RightShoulder, JointName::RightElbow),
];

/// Thin skeleton lines (RGB)
pub const SKELETON_COLOR: u32 = 0xC8C8C8;

/// Arm joint markers (RGB)
pub const JOINT_COLOR: u32 = 0x0000FF; // blue

/// Upper-arm segments (RGB)
pub const SEGMENT_COLOR: u32 = 0x00FFFF; // cyan

/// Angle readouts (RGB)
pub const LABEL_COLOR: u32 = 0xFFFF00; // yellow

pub const JOINT_RADIUS: i32 = 5;
pub const SEGMENT_THICKNESS: i32 = 2;
