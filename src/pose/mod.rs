#[cfg(feature = "desktop")]
pub mod detector;
pub mod keypoint;
pub mod preprocess;
pub mod source;

#[cfg(feature = "desktop")]
pub use detector::MoveNetDetector;
pub use keypoint::{JointName, JointSample, Point2D, Pose};
#[cfg(feature = "desktop")]
pub use preprocess::letterbox_for_movenet;
pub use preprocess::Letterbox;
pub use source::LandmarkSource;
