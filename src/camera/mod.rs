#[cfg(feature = "desktop")]
pub mod capture;

#[cfg(feature = "desktop")]
pub use capture::OpenCvCapture;

use crate::error::CaptureError;

/// A live camera or a decoded video file, read one frame at a time
pub trait CaptureSource {
    type Frame;

    /// Next frame. Any error means the source is finished.
    fn read(&mut self) -> Result<Self::Frame, CaptureError>;

    /// (width, height) of the frames this source delivers
    fn frame_size(&self) -> (u32, u32);

    /// Short name for logs
    fn describe(&self) -> String {
        "capture source".to_string()
    }
}
