use std::path::PathBuf;

use thiserror::Error;

/// Angle measurement failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AngleError {
    /// One of the outer joints sits exactly on the vertex
    #[error("degenerate geometry: joint collapsed onto the vertex")]
    DegenerateGeometry,
}

/// Recording lifecycle errors
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("no capture source is open")]
    NoActiveCapture,

    #[error("already recording to {}", .0.display())]
    AlreadyRecording(PathBuf),

    #[error("video writer failed for {}: {reason}", .path.display())]
    WriterIo { path: PathBuf, reason: String },
}

impl RecordError {
    pub fn writer_io(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::WriterIo {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Capture source read failures. Both end the tick loop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("end of stream")]
    EndOfStream,

    #[error("capture device error: {0}")]
    Device(String),
}
