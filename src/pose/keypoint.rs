use serde::{Deserialize, Serialize};

/// The 17 MoveNet joints, in model output order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(usize)]
pub enum JointName {
    Nose = 0,
    LeftEye = 1,
    RightEye = 2,
    LeftEar = 3,
    RightEar = 4,
    LeftShoulder = 5,
    RightShoulder = 6,
    LeftElbow = 7,
    RightElbow = 8,
    LeftWrist = 9,
    RightWrist = 10,
    LeftHip = 11,
    RightHip = 12,
    LeftKnee = 13,
    RightKnee = 14,
    LeftAnkle = 15,
    RightAnkle = 16,
}

impl JointName {
    pub const COUNT: usize = 17;

    /// Shoulders, elbows and wrists: the joints a dumbbell curl is judged on
    pub const ARM: [JointName; 6] = [
        JointName::LeftShoulder,
        JointName::RightShoulder,
        JointName::LeftElbow,
        JointName::RightElbow,
        JointName::LeftWrist,
        JointName::RightWrist,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Nose),
            1 => Some(Self::LeftEye),
            2 => Some(Self::RightEye),
            3 => Some(Self::LeftEar),
            4 => Some(Self::RightEar),
            5 => Some(Self::LeftShoulder),
            6 => Some(Self::RightShoulder),
            7 => Some(Self::LeftElbow),
            8 => Some(Self::RightElbow),
            9 => Some(Self::LeftWrist),
            10 => Some(Self::RightWrist),
            11 => Some(Self::LeftHip),
            12 => Some(Self::RightHip),
            13 => Some(Self::LeftKnee),
            14 => Some(Self::RightKnee),
            15 => Some(Self::LeftAnkle),
            16 => Some(Self::RightAnkle),
            _ => None,
        }
    }

    /// Human-readable label used in logs and overlays
    pub fn label(&self) -> &'static str {
        match self {
            Self::Nose => "nose",
            Self::LeftEye => "left eye",
            Self::RightEye => "right eye",
            Self::LeftEar => "left ear",
            Self::RightEar => "right ear",
            Self::LeftShoulder => "left shoulder",
            Self::RightShoulder => "right shoulder",
            Self::LeftElbow => "left elbow",
            Self::RightElbow => "right elbow",
            Self::LeftWrist => "left wrist",
            Self::RightWrist => "right wrist",
            Self::LeftHip => "left hip",
            Self::RightHip => "right hip",
            Self::LeftKnee => "left knee",
            Self::RightKnee => "right knee",
            Self::LeftAnkle => "left ankle",
            Self::RightAnkle => "right ankle",
        }
    }
}

/// Pixel-space coordinate
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point2D {
    pub x: f32,
    pub y: f32,
}

impl Point2D {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn sub(&self, other: &Point2D) -> Point2D {
        Point2D::new(self.x - other.x, self.y - other.y)
    }

    pub fn dot(&self, other: &Point2D) -> f32 {
        self.x * other.x + self.y * other.y
    }

    pub fn length(&self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Rounded integer pixel, for drawing
    pub fn to_pixel(&self) -> (i32, i32) {
        (self.x.round() as i32, self.y.round() as i32)
    }
}

/// One detected joint
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointSample {
    /// Normalized X (0.0..1.0)
    pub x: f32,
    /// Normalized Y (0.0..1.0)
    pub y: f32,
    /// Detector confidence (0.0..1.0)
    pub visibility: f32,
}

impl JointSample {
    pub fn new(x: f32, y: f32, visibility: f32) -> Self {
        Self { x, y, visibility }
    }

    /// Confident enough, with coordinates that can be drawn
    pub fn is_visible(&self, threshold: f32) -> bool {
        self.visibility >= threshold && self.x.is_finite() && self.y.is_finite()
    }

    /// Scale into a frame of `width` x `height` pixels
    pub fn to_point(&self, width: u32, height: u32) -> Point2D {
        Point2D::new(self.x * width as f32, self.y * height as f32)
    }
}

impl Default for JointSample {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            visibility: 0.0,
        }
    }
}

/// Every joint detected in one frame. A frame without a body has no `Pose`.
#[derive(Debug, Clone)]
pub struct Pose {
    pub joints: [JointSample; JointName::COUNT],
}

impl Pose {
    pub fn new(joints: [JointSample; JointName::COUNT]) -> Self {
        Self { joints }
    }

    pub fn get(&self, name: JointName) -> &JointSample {
        &self.joints[name as usize]
    }

    pub fn set(&mut self, name: JointName, sample: JointSample) {
        self.joints[name as usize] = sample;
    }

    /// Pixel position of `name` if it clears the confidence threshold
    pub fn visible_point(
        &self,
        name: JointName,
        threshold: f32,
        width: u32,
        height: u32,
    ) -> Option<Point2D> {
        let sample = self.get(name);
        sample
            .is_visible(threshold)
            .then(|| sample.to_point(width, height))
    }

    /// Mean confidence over the six arm joints
    pub fn arm_confidence(&self) -> f32 {
        let sum: f32 = JointName::ARM.iter().map(|j| self.get(*j).visibility).sum();
        sum / JointName::ARM.len() as f32
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            joints: [JointSample::default(); JointName::COUNT],
        }
    }
}
