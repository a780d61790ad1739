pub mod angle;
pub mod feedback;
pub mod trajectory;

pub use angle::{compute_angle, measure, AngleMeasurement, JointAngle};
pub use feedback::{FeedbackController, FeedbackDecision, FeedbackPhase};
pub use trajectory::TrajectoryBuffer;
