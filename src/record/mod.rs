//! Session recording.
//!
//! `RecordingManager` owns at most one open writer. Every way out of the
//! Recording state (`stop`, a failed write, drop) releases it.

#[cfg(feature = "desktop")]
pub mod writer;

#[cfg(feature = "desktop")]
pub use writer::{OpenCvVideoWriter, OpenCvWriterFactory};

use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::config::RecordingConfig;
use crate::error::RecordError;

/// (width, height) in pixels
pub type FrameSize = (u32, u32);

/// Parameters a writer is opened with
#[derive(Debug, Clone, PartialEq)]
pub struct WriterSpec {
    pub fourcc: String,
    pub fps: f64,
    pub frame_size: FrameSize,
}

/// An open video file
pub trait VideoWriter {
    type Frame;

    fn write(&mut self, frame: &Self::Frame) -> Result<(), RecordError>;

    /// Flush and close the file
    fn release(self) -> Result<(), RecordError>;
}

/// Opens writers for new sessions
pub trait WriterFactory {
    type Writer: VideoWriter;

    fn open(&mut self, path: &Path, spec: &WriterSpec) -> Result<Self::Writer, RecordError>;
}

/// The active recording
pub struct RecordingSession<W> {
    pub output_path: PathBuf,
    pub start_time: DateTime<Local>,
    pub frame_size: FrameSize,
    started: Instant,
    frames: u64,
    writer: W,
}

impl<W> RecordingSession<W> {
    /// Frames written so far
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

/// What a finished session produced
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingSummary {
    pub output_path: PathBuf,
    pub frames: u64,
    pub duration: Duration,
}

pub struct RecordingManager<F: WriterFactory> {
    factory: F,
    output_dir: PathBuf,
    fourcc: String,
    fps: f64,
    extension: String,
    session: Option<RecordingSession<F::Writer>>,
}

impl<F: WriterFactory> RecordingManager<F> {
    pub fn new(factory: F, config: &RecordingConfig) -> Self {
        Self {
            factory,
            output_dir: PathBuf::from(&config.output_dir),
            fourcc: config.fourcc.clone(),
            fps: config.fps,
            extension: config.extension.clone(),
            session: None,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&RecordingSession<F::Writer>> {
        self.session.as_ref()
    }

    /// Open a writer for a new session.
    ///
    /// `active_capture` is the frame size of the open capture source, or
    /// `None` when nothing is open. Never replaces a running session.
    pub fn start(
        &mut self,
        active_capture: Option<FrameSize>,
        now: DateTime<Local>,
    ) -> Result<PathBuf, RecordError> {
        if let Some(session) = &self.session {
            return Err(RecordError::AlreadyRecording(session.output_path.clone()));
        }
        let frame_size = active_capture.ok_or(RecordError::NoActiveCapture)?;

        fs::create_dir_all(&self.output_dir)
            .map_err(|e| RecordError::writer_io(&self.output_dir, e))?;
        let path = self.next_path(now);

        let spec = WriterSpec {
            fourcc: self.fourcc.clone(),
            fps: self.fps,
            frame_size,
        };
        let writer = self.factory.open(&path, &spec)?;

        log::info!(
            "Recording started: {} ({}x{} @ {} fps)",
            path.display(),
            frame_size.0,
            frame_size.1,
            self.fps
        );
        self.session = Some(RecordingSession {
            output_path: path.clone(),
            start_time: now,
            frame_size,
            started: Instant::now(),
            frames: 0,
            writer,
        });
        Ok(path)
    }

    /// Append a frame if recording. Returns whether it was written.
    ///
    /// A writer error aborts the session; the writer is released and the
    /// error returned.
    pub fn write_frame(
        &mut self,
        frame: &<F::Writer as VideoWriter>::Frame,
    ) -> Result<bool, RecordError> {
        let Some(session) = self.session.as_mut() else {
            return Ok(false);
        };

        match session.writer.write(frame) {
            Ok(()) => {
                session.frames += 1;
                Ok(true)
            }
            Err(e) => {
                if let Some(session) = self.session.take() {
                    log::warn!(
                        "Recording aborted after {} frames: {}",
                        session.frames,
                        e
                    );
                    if let Err(release_err) = session.writer.release() {
                        log::warn!("releasing aborted writer: {}", release_err);
                    }
                }
                Err(e)
            }
        }
    }

    /// Close the active session, if any. Safe to call repeatedly.
    pub fn stop(&mut self) -> Result<Option<RecordingSummary>, RecordError> {
        let Some(session) = self.session.take() else {
            return Ok(None);
        };

        let summary = RecordingSummary {
            output_path: session.output_path,
            frames: session.frames,
            duration: session.started.elapsed(),
        };
        session.writer.release()?;

        log::info!(
            "Recording stopped: {} ({} frames, {:.1}s)",
            summary.output_path.display(),
            summary.frames,
            summary.duration.as_secs_f32()
        );
        Ok(Some(summary))
    }

    /// `recorded_video_<timestamp>.<ext>`, suffixed when that name is taken
    fn next_path(&self, now: DateTime<Local>) -> PathBuf {
        let stem = format!("recorded_video_{}", now.format("%Y-%m-%d_%H-%M-%S"));
        let mut path = self.output_dir.join(format!("{}.{}", stem, self.extension));
        let mut n = 1;
        while path.exists() {
            path = self
                .output_dir
                .join(format!("{}_{}.{}", stem, n, self.extension));
            n += 1;
        }
        path
    }
}

impl<F: WriterFactory> Drop for RecordingManager<F> {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            log::warn!("closing recording on shutdown: {}", e);
        }
    }
}
