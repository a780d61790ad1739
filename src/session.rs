//! The frame loop.
//!
//! One `FrameLoop` owns the capture source and every per-session record.
//! `tick` threads a single frame through detection, angle rules,
//! annotation, recording and the trajectory, in that order, against the
//! same pose. `run` drives `tick` on a fixed period and keeps the windows
//! alive between sources, so the last trajectory stays on screen until the
//! next source is opened.

use anyhow::Result;
use chrono::Local;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use crate::camera::CaptureSource;
use crate::config::Config;
use crate::error::{CaptureError, RecordError};
use crate::exercise::{measure, AngleMeasurement, FeedbackController, FeedbackDecision, JointAngle, TrajectoryBuffer};
use crate::pose::{JointName, LandmarkSource, Point2D};
use crate::record::{RecordingManager, RecordingSummary, VideoWriter, WriterFactory};
use crate::render::{annotate, Canvas};
use crate::speech::AnnounceSink;

/// Which kind of source the user asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Live camera
    Camera,
    /// The configured video file
    Video,
}

/// Requests coming from the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserCommand {
    ToggleRecording,
    StopRecording,
    Open(SourceKind),
    Quit,
}

/// Where finished frames go
pub trait DisplaySink<F> {
    fn show(&mut self, frame: &F) -> Result<()>;

    /// Keep the last frame on screen while no source is open
    fn refresh(&mut self) -> Result<()> {
        Ok(())
    }

    fn is_open(&self) -> bool {
        true
    }

    /// Commands issued since the last call
    fn poll_commands(&mut self) -> Vec<UserCommand> {
        Vec::new()
    }
}

/// Trajectory plot. `source_size` is the frame size the points were taken in.
pub trait PlotSink {
    fn redraw(&mut self, points: &[Point2D], source_size: (u32, u32)) -> Result<()>;
}

/// Builds capture sources on request
pub trait SourceOpener<C> {
    fn open(&mut self, kind: SourceKind) -> Result<C>;
}

impl<C, F> SourceOpener<C> for F
where
    F: FnMut(SourceKind) -> Result<C>,
{
    fn open(&mut self, kind: SourceKind) -> Result<C> {
        self(kind)
    }
}

/// Which joints are measured and tracked
#[derive(Debug, Clone)]
pub struct AnalysisSettings {
    pub angles: Vec<JointAngle>,
    pub tracked_joint: JointName,
    pub min_joint_confidence: f32,
}

impl AnalysisSettings {
    /// Measure every elbow a feedback rule watches
    pub fn from_config(config: &Config) -> Self {
        let mut angles: Vec<JointAngle> = Vec::new();
        for rule in &config.feedback.rules {
            match JointAngle::for_vertex(rule.joint) {
                Some(angle) if !angles.contains(&angle) => angles.push(angle),
                Some(_) => {}
                None => log::warn!("no angle defined at {}, rule ignored", rule.joint.label()),
            }
        }

        Self {
            angles,
            tracked_joint: config.trajectory.joint,
            min_joint_confidence: config.pose.min_joint_confidence,
        }
    }
}

/// What happened during one tick
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    pub pose_detected: bool,
    pub measurements: Vec<AngleMeasurement>,
    pub announced: bool,
    pub recorded: bool,
    pub recording_aborted: bool,
    pub trajectory_point: Option<Point2D>,
}

#[derive(Debug)]
pub enum TickOutcome<F> {
    /// A processed frame, ready for display
    Frame { frame: F, report: TickReport },
    /// Nothing to read from
    NoSource,
    /// The source failed or ran out and has been closed
    Ended(CaptureError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    WindowClosed,
    Quit,
}

pub struct FrameLoop<C, L, W: WriterFactory> {
    capture: Option<C>,
    landmarks: L,
    settings: AnalysisSettings,
    feedback: FeedbackController,
    announcer: Box<dyn AnnounceSink>,
    recorder: RecordingManager<W>,
    trajectory: TrajectoryBuffer,
}

impl<C, L, W: WriterFactory> FrameLoop<C, L, W> {
    pub fn new(
        landmarks: L,
        settings: AnalysisSettings,
        feedback: FeedbackController,
        announcer: Box<dyn AnnounceSink>,
        recorder: RecordingManager<W>,
    ) -> Self {
        Self {
            capture: None,
            landmarks,
            settings,
            feedback,
            announcer,
            recorder,
            trajectory: TrajectoryBuffer::new(),
        }
    }

    pub fn has_source(&self) -> bool {
        self.capture.is_some()
    }

    pub fn trajectory(&self) -> &TrajectoryBuffer {
        &self.trajectory
    }

    pub fn feedback(&self) -> &FeedbackController {
        &self.feedback
    }

    pub fn recorder(&self) -> &RecordingManager<W> {
        &self.recorder
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_recording()
    }

    pub fn stop_recording(&mut self) -> Result<Option<RecordingSummary>, RecordError> {
        self.recorder.stop()
    }

    /// Release the capture source, then any recording tied to it
    pub fn close_source(&mut self) {
        if self.capture.take().is_some() {
            log::info!("capture source closed");
        }
        if let Err(e) = self.recorder.stop() {
            log::warn!("closing recording: {}", e);
        }
    }
}

impl<C, L, W> FrameLoop<C, L, W>
where
    C: CaptureSource,
    C::Frame: Canvas,
    L: LandmarkSource<C::Frame>,
    W: WriterFactory,
    W::Writer: VideoWriter<Frame = C::Frame>,
{
    /// Switch to a new capture source. Starts a fresh session: the previous
    /// source and its recording are closed, trajectory and cooldown reset.
    pub fn open_source(&mut self, capture: C) {
        self.close_source();
        self.trajectory.reset();
        self.feedback.reset();
        log::info!("capture source opened: {}", capture.describe());
        self.capture = Some(capture);
    }

    pub fn frame_size(&self) -> Option<(u32, u32)> {
        self.capture.as_ref().map(|c| c.frame_size())
    }

    pub fn start_recording(&mut self) -> Result<PathBuf, RecordError> {
        let frame_size = self.frame_size();
        self.recorder.start(frame_size, Local::now())
    }

    pub fn toggle_recording(&mut self) {
        if self.recorder.is_recording() {
            if let Err(e) = self.stop_recording() {
                log::warn!("stopping recording: {}", e);
            }
        } else if let Err(e) = self.start_recording() {
            log::warn!("cannot start recording: {}", e);
        }
    }

    pub fn tick(&mut self) -> TickOutcome<C::Frame> {
        self.tick_at(Instant::now())
    }

    /// One pass of the pipeline with `now` as the measurement time
    pub fn tick_at(&mut self, now: Instant) -> TickOutcome<C::Frame> {
        let Some(capture) = self.capture.as_mut() else {
            return TickOutcome::NoSource;
        };

        let mut frame = match capture.read() {
            Ok(frame) => frame,
            Err(e) => {
                log::info!("capture stopped: {}", e);
                self.close_source();
                return TickOutcome::Ended(e);
            }
        };

        let frame_size = frame.dimensions();
        let min_confidence = self.settings.min_joint_confidence;
        let pose = self.landmarks.detect(&frame);

        let mut report = TickReport {
            pose_detected: pose.is_some(),
            ..TickReport::default()
        };

        if let Some(pose) = &pose {
            report.measurements = self
                .settings
                .angles
                .iter()
                .filter_map(|angle| measure(pose, angle, frame_size, min_confidence, now))
                .collect();

            for m in &report.measurements {
                if self.feedback.observe(m, self.announcer.as_ref()) == FeedbackDecision::Announced {
                    report.announced = true;
                }
            }

            if let Err(e) = annotate(&mut frame, pose, &report.measurements, min_confidence) {
                log::warn!("overlay failed: {e:#}");
            }
        }

        match self.recorder.write_frame(&frame) {
            Ok(written) => report.recorded = written,
            Err(e) => {
                log::warn!("recording aborted: {}", e);
                report.recording_aborted = true;
            }
        }

        let (w, h) = frame_size;
        if let Some(point) = pose
            .as_ref()
            .and_then(|p| p.visible_point(self.settings.tracked_joint, min_confidence, w, h))
        {
            self.trajectory.append(point);
            report.trajectory_point = Some(point);
        }

        TickOutcome::Frame { frame, report }
    }

    /// Tick every `period` until the user quits or the window closes.
    ///
    /// When a source ends the loop keeps pumping the display and plot and
    /// waits for `UserCommand::Open`, which goes through `opener`. The
    /// capture source and recording are closed on return.
    pub fn run(
        &mut self,
        period: Duration,
        display: &mut dyn DisplaySink<C::Frame>,
        mut plot: Option<&mut dyn PlotSink>,
        opener: &mut dyn SourceOpener<C>,
    ) -> StopReason {
        let mut frame_count = 0u32;
        let mut fps_timer = Instant::now();
        let mut plot_size = self.frame_size();

        let reason = loop {
            let tick_start = Instant::now();

            if !display.is_open() {
                break StopReason::WindowClosed;
            }

            let mut quit = false;
            for command in display.poll_commands() {
                match command {
                    UserCommand::ToggleRecording => self.toggle_recording(),
                    UserCommand::StopRecording => {
                        if let Err(e) = self.stop_recording() {
                            log::warn!("stopping recording: {}", e);
                        }
                    }
                    UserCommand::Open(kind) => match opener.open(kind) {
                        Ok(capture) => {
                            self.open_source(capture);
                            plot_size = self.frame_size();
                        }
                        Err(e) => log::warn!("cannot open {:?}: {e:#}", kind),
                    },
                    UserCommand::Quit => quit = true,
                }
            }
            if quit {
                break StopReason::Quit;
            }

            let redraw_plot = match self.tick() {
                TickOutcome::Frame { frame, report } => {
                    if let Err(e) = display.show(&frame) {
                        log::warn!("display failed: {e:#}");
                    }
                    frame_count += 1;
                    report.trajectory_point.is_some()
                }
                TickOutcome::Ended(e) => {
                    log::info!(
                        "{}: keeping {} trajectory points, waiting for a new source",
                        e,
                        self.trajectory.len()
                    );
                    true
                }
                TickOutcome::NoSource => {
                    if let Err(e) = display.refresh() {
                        log::warn!("display failed: {e:#}");
                    }
                    true
                }
            };

            if redraw_plot {
                if let (Some(plot), Some(size)) = (plot.as_mut(), plot_size) {
                    if let Err(e) = plot.redraw(self.trajectory.points(), size) {
                        log::warn!("plot failed: {e:#}");
                    }
                }
            }

            let elapsed = fps_timer.elapsed().as_secs_f32();
            if elapsed >= 1.0 {
                if self.has_source() {
                    log::debug!(
                        "FPS: {:.1}, trajectory: {} points{}",
                        frame_count as f32 / elapsed,
                        self.trajectory.len(),
                        if self.recorder.is_recording() { " [REC]" } else { "" }
                    );
                }
                frame_count = 0;
                fps_timer = Instant::now();
            }

            if let Some(rest) = period.checked_sub(tick_start.elapsed()) {
                thread::sleep(rest);
            }
        };

        self.close_source();
        log::info!("frame loop stopped: {:?}", reason);
        reason
    }
}

impl<C, L, W: WriterFactory> Drop for FrameLoop<C, L, W> {
    fn drop(&mut self) {
        self.close_source();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FeedbackRule, RecordingConfig};
    use crate::pose::{JointSample, Pose};
    use crate::render::skeleton::JOINT_COLOR;
    use crate::render::FrameBuffer;
    use crate::record::WriterSpec;
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;
    use std::path::Path;
    use std::rc::Rc;

    const W: u32 = 200;
    const H: u32 = 100;

    struct ScriptedCapture {
        remaining: usize,
    }

    impl CaptureSource for ScriptedCapture {
        type Frame = FrameBuffer;

        fn read(&mut self) -> Result<FrameBuffer, CaptureError> {
            if self.remaining == 0 {
                return Err(CaptureError::EndOfStream);
            }
            self.remaining -= 1;
            Ok(FrameBuffer::new(W as usize, H as usize))
        }

        fn frame_size(&self) -> (u32, u32) {
            (W, H)
        }
    }

    struct ScriptedLandmarks {
        poses: VecDeque<Option<Pose>>,
    }

    impl LandmarkSource<FrameBuffer> for ScriptedLandmarks {
        fn detect(&mut self, _frame: &FrameBuffer) -> Option<Pose> {
            self.poses.pop_front().flatten()
        }
    }

    #[derive(Clone, Default)]
    struct SharedSink(Rc<RefCell<Vec<String>>>);

    impl AnnounceSink for SharedSink {
        fn announce(&self, text: &str) -> Result<()> {
            self.0.borrow_mut().push(text.to_string());
            Ok(())
        }
    }

    #[derive(Default)]
    struct WriterLog {
        opened: Cell<usize>,
        released: Cell<usize>,
        /// Writes beyond this many fail
        fail_after: Cell<Option<usize>>,
        frames: RefCell<Vec<FrameBuffer>>,
    }

    struct MemoryWriter(Rc<WriterLog>);

    impl VideoWriter for MemoryWriter {
        type Frame = FrameBuffer;

        fn write(&mut self, frame: &FrameBuffer) -> Result<(), RecordError> {
            if self.0.fail_after.get().is_some_and(|n| self.0.frames.borrow().len() >= n) {
                return Err(RecordError::writer_io("memory.avi", "disk full"));
            }
            self.0.frames.borrow_mut().push(frame.clone());
            Ok(())
        }

        fn release(self) -> Result<(), RecordError> {
            self.0.released.set(self.0.released.get() + 1);
            Ok(())
        }
    }

    struct MemoryFactory(Rc<WriterLog>);

    impl WriterFactory for MemoryFactory {
        type Writer = MemoryWriter;

        fn open(&mut self, _path: &Path, _spec: &WriterSpec) -> Result<MemoryWriter, RecordError> {
            self.0.opened.set(self.0.opened.get() + 1);
            Ok(MemoryWriter(self.0.clone()))
        }
    }

    type TestLoop = FrameLoop<ScriptedCapture, ScriptedLandmarks, MemoryFactory>;

    struct Harness {
        frame_loop: TestLoop,
        spoken: SharedSink,
        writer: Rc<WriterLog>,
        dir: PathBuf,
    }

    impl Drop for Harness {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.dir);
        }
    }

    fn harness(name: &str, poses: Vec<Option<Pose>>) -> Harness {
        let dir = std::env::temp_dir().join(format!("dumbbell-coach-loop-{}-{}", name, std::process::id()));
        let spoken = SharedSink::default();
        let writer = Rc::new(WriterLog::default());

        let recorder = RecordingManager::new(
            MemoryFactory(writer.clone()),
            &RecordingConfig {
                output_dir: dir.to_string_lossy().into_owned(),
                ..RecordingConfig::default()
            },
        );
        let feedback = FeedbackController::new(
            vec![FeedbackRule {
                joint: JointName::LeftElbow,
                threshold_degrees: 40.0,
                message: "Extend your arm more!".to_string(),
            }],
            Duration::from_millis(2000),
        );
        let settings = AnalysisSettings {
            angles: vec![JointAngle::LEFT_ELBOW],
            tracked_joint: JointName::LeftWrist,
            min_joint_confidence: 0.3,
        };

        let frame_loop = FrameLoop::new(
            ScriptedLandmarks { poses: poses.into() },
            settings,
            feedback,
            Box::new(spoken.clone()),
            recorder,
        );

        Harness {
            frame_loop,
            spoken,
            writer,
            dir,
        }
    }

    fn wrist_only(x: f32, y: f32) -> Pose {
        let mut pose = Pose::default();
        pose.set(JointName::LeftWrist, JointSample::new(x, y, 0.9));
        pose
    }

    /// Elbow bent to about 22 degrees in a 200x100 frame
    fn curled_arm() -> Pose {
        let mut pose = Pose::default();
        pose.set(JointName::LeftShoulder, JointSample::new(0.5, 0.2, 0.9));
        pose.set(JointName::LeftElbow, JointSample::new(0.5, 0.5, 0.9));
        pose.set(JointName::LeftWrist, JointSample::new(0.55, 0.25, 0.9));
        pose
    }

    #[test]
    fn test_no_source() {
        let mut h = harness("no-source", vec![]);
        assert!(matches!(h.frame_loop.tick(), TickOutcome::NoSource));
        assert!(matches!(h.frame_loop.start_recording(), Err(RecordError::NoActiveCapture)));
    }

    #[test]
    fn test_horizontal_wrist_path_with_gap() {
        let poses: Vec<Option<Pose>> = (0..100)
            .map(|i| {
                if (50..60).contains(&i) {
                    None
                } else {
                    Some(wrist_only(i as f32 / 100.0, 0.5))
                }
            })
            .collect();
        let mut h = harness("gap", poses);
        h.frame_loop.open_source(ScriptedCapture { remaining: 100 });

        for i in 0..100 {
            match h.frame_loop.tick() {
                TickOutcome::Frame { report, .. } => {
                    assert_eq!(report.pose_detected, !(50..60).contains(&i));
                }
                other => panic!("tick {} ended early: {:?}", i, other),
            }
        }

        let points = h.frame_loop.trajectory().points();
        assert_eq!(points.len(), 90);
        assert!(points.iter().all(|p| p.y == 50.0));
        assert!(points.windows(2).all(|w| w[0].x < w[1].x));
        assert!((points[50].x - 120.0).abs() < 1e-3);

        assert!(matches!(
            h.frame_loop.tick(),
            TickOutcome::Ended(CaptureError::EndOfStream)
        ));
        assert!(!h.frame_loop.has_source());
        // Buffer survives the end of the stream until the next source opens
        assert_eq!(h.frame_loop.trajectory().len(), 90);
    }

    #[test]
    fn test_trajectory_length_matches_ticks() {
        let poses = (0..7).map(|i| Some(wrist_only(0.1 * i as f32, 0.3))).collect();
        let mut h = harness("count", poses);
        h.frame_loop.open_source(ScriptedCapture { remaining: 7 });
        for _ in 0..7 {
            h.frame_loop.tick();
        }
        assert_eq!(h.frame_loop.trajectory().len(), 7);
    }

    #[test]
    fn test_feedback_debounced_across_ticks() {
        let mut h = harness("feedback", vec![Some(curled_arm()); 4]);
        h.frame_loop.open_source(ScriptedCapture { remaining: 4 });
        let t0 = Instant::now();

        let mut announced = Vec::new();
        for ms in [0u64, 30, 60, 2100] {
            if let TickOutcome::Frame { report, .. } = h.frame_loop.tick_at(t0 + Duration::from_millis(ms)) {
                assert_eq!(report.measurements.len(), 1);
                assert!(report.measurements[0].value_degrees < 40.0);
                announced.push(report.announced);
            }
        }

        assert_eq!(announced, vec![true, false, false, true]);
        assert_eq!(h.spoken.0.borrow().len(), 2);
    }

    #[test]
    fn test_absent_pose_leaves_feedback_untouched() {
        let mut h = harness("absent", vec![None, None]);
        h.frame_loop.open_source(ScriptedCapture { remaining: 2 });
        h.frame_loop.tick();
        h.frame_loop.tick();
        assert!(h.frame_loop.feedback().last_alert().is_none());
        assert!(h.spoken.0.borrow().is_empty());
        assert!(h.frame_loop.trajectory().is_empty());
    }

    #[test]
    fn test_recording_gets_annotated_frames_and_closes_at_end() {
        let mut h = harness("record", vec![Some(curled_arm()); 3]);
        h.frame_loop.open_source(ScriptedCapture { remaining: 3 });

        let path = h.frame_loop.start_recording().unwrap();
        assert!(path.starts_with(&h.dir));
        assert!(matches!(
            h.frame_loop.start_recording(),
            Err(RecordError::AlreadyRecording(_))
        ));

        for _ in 0..3 {
            match h.frame_loop.tick() {
                TickOutcome::Frame { report, .. } => assert!(report.recorded),
                other => panic!("unexpected {:?}", other),
            }
        }
        let session = h.frame_loop.recorder().session().unwrap();
        assert_eq!(session.frames(), 3);
        assert_eq!(session.output_path, path);

        {
            let frames = h.writer.frames.borrow();
            assert_eq!(frames.len(), 3);
            // Elbow marker at (100, 50)
            assert_eq!(frames[0].pixel(100, 50), Some(JOINT_COLOR));
        }

        assert!(matches!(h.frame_loop.tick(), TickOutcome::Ended(_)));
        assert!(!h.frame_loop.is_recording());
        assert_eq!(h.writer.opened.get(), 1);
        assert_eq!(h.writer.released.get(), 1);
    }

    #[test]
    fn test_writer_failure_aborts_recording_but_not_capture() {
        let mut h = harness("abort", vec![Some(wrist_only(0.5, 0.5)); 4]);
        h.writer.fail_after.set(Some(1));
        h.frame_loop.open_source(ScriptedCapture { remaining: 4 });
        h.frame_loop.start_recording().unwrap();

        let reports: Vec<TickReport> = (0..4)
            .map(|i| match h.frame_loop.tick() {
                TickOutcome::Frame { report, .. } => report,
                other => panic!("tick {} ended early: {:?}", i, other),
            })
            .collect();

        assert!(reports[0].recorded && !reports[0].recording_aborted);
        assert!(!reports[1].recorded && reports[1].recording_aborted);
        assert!(reports[2..].iter().all(|r| !r.recorded && !r.recording_aborted));
        assert!(!h.frame_loop.is_recording());
        assert!(h.frame_loop.has_source());
        assert_eq!(h.frame_loop.trajectory().len(), 4);
        assert_eq!(h.writer.frames.borrow().len(), 1);
        assert_eq!(h.writer.released.get(), 1);
    }

    #[test]
    fn test_stop_recording_returns_summary() {
        let mut h = harness("summary", vec![None; 2]);
        h.frame_loop.open_source(ScriptedCapture { remaining: 5 });
        let path = h.frame_loop.start_recording().unwrap();
        h.frame_loop.tick();
        h.frame_loop.tick();

        let summary = h.frame_loop.stop_recording().unwrap().unwrap();
        assert_eq!(summary.output_path, path);
        assert_eq!(summary.frames, 2);
        assert!(h.frame_loop.stop_recording().unwrap().is_none());
        assert!(h.frame_loop.has_source());
    }

    #[test]
    fn test_open_source_starts_fresh_session() {
        let mut h = harness("reopen", vec![Some(curled_arm()); 3]);
        h.frame_loop.open_source(ScriptedCapture { remaining: 10 });
        h.frame_loop.start_recording().unwrap();
        h.frame_loop.tick();
        assert_eq!(h.frame_loop.trajectory().len(), 1);
        assert!(h.frame_loop.feedback().last_alert().is_some());

        h.frame_loop.open_source(ScriptedCapture { remaining: 10 });
        assert!(h.frame_loop.trajectory().is_empty());
        assert!(h.frame_loop.feedback().last_alert().is_none());
        assert!(!h.frame_loop.is_recording());
        assert_eq!(h.writer.released.get(), 1);
    }

    #[test]
    fn test_drop_releases_writer() {
        let mut h = harness("drop", vec![]);
        h.frame_loop.open_source(ScriptedCapture { remaining: 10 });
        h.frame_loop.start_recording().unwrap();
        let writer = h.writer.clone();
        drop(h);
        assert_eq!(writer.released.get(), 1);
    }

    /// Plays back one command batch per poll. Once the script runs out it
    /// quits, or stays silent when `quit_when_done` is off.
    struct FakeDisplay {
        shown: usize,
        refreshed: usize,
        script: VecDeque<Vec<UserCommand>>,
        quit_when_done: bool,
        close_after: Option<usize>,
    }

    impl FakeDisplay {
        fn scripted(script: Vec<Vec<UserCommand>>) -> Self {
            Self {
                shown: 0,
                refreshed: 0,
                script: script.into(),
                quit_when_done: true,
                close_after: None,
            }
        }
    }

    impl DisplaySink<FrameBuffer> for FakeDisplay {
        fn show(&mut self, _frame: &FrameBuffer) -> Result<()> {
            self.shown += 1;
            Ok(())
        }

        fn refresh(&mut self) -> Result<()> {
            self.refreshed += 1;
            Ok(())
        }

        fn is_open(&self) -> bool {
            self.close_after.map_or(true, |n| self.shown < n)
        }

        fn poll_commands(&mut self) -> Vec<UserCommand> {
            match self.script.pop_front() {
                Some(batch) => batch,
                None if self.quit_when_done => vec![UserCommand::Quit],
                None => Vec::new(),
            }
        }
    }

    #[derive(Default)]
    struct CountingPlot {
        lengths: Vec<usize>,
        sizes: Vec<(u32, u32)>,
    }

    impl PlotSink for CountingPlot {
        fn redraw(&mut self, points: &[Point2D], source_size: (u32, u32)) -> Result<()> {
            self.lengths.push(points.len());
            self.sizes.push(source_size);
            Ok(())
        }
    }

    fn no_opener(kind: SourceKind) -> Result<ScriptedCapture> {
        anyhow::bail!("no {:?} available", kind)
    }

    #[test]
    fn test_run_keeps_windows_alive_after_end_of_stream() {
        let poses = vec![Some(wrist_only(0.1, 0.1)), None, Some(wrist_only(0.2, 0.1)), None, None];
        let mut h = harness("run", poses);
        h.frame_loop.open_source(ScriptedCapture { remaining: 5 });

        // Toggle, five frames, end of stream, one idle pass, then quit
        let mut script = vec![vec![UserCommand::ToggleRecording]];
        script.extend(std::iter::repeat(Vec::new()).take(6));
        let mut display = FakeDisplay::scripted(script);
        let mut plot = CountingPlot::default();

        let reason = h
            .frame_loop
            .run(Duration::ZERO, &mut display, Some(&mut plot), &mut no_opener);

        assert_eq!(reason, StopReason::Quit);
        assert_eq!(display.shown, 5);
        assert_eq!(display.refreshed, 1);
        // Two appended points, the end of stream, the idle pass
        assert_eq!(plot.lengths, vec![1, 2, 2, 2]);
        assert!(plot.sizes.iter().all(|s| *s == (W, H)));
        assert_eq!(h.frame_loop.trajectory().len(), 2);
        assert_eq!(h.writer.frames.borrow().len(), 5);
        assert_eq!(h.writer.released.get(), 1);
        assert!(!h.frame_loop.has_source());
    }

    #[test]
    fn test_run_reopens_source_with_empty_trajectory() {
        let poses = vec![
            Some(wrist_only(0.1, 0.1)),
            Some(wrist_only(0.2, 0.1)),
            Some(curled_arm()),
        ];
        let mut h = harness("run-reopen", poses);
        h.frame_loop.open_source(ScriptedCapture { remaining: 2 });

        let mut requests = Vec::new();
        let mut opener = |kind: SourceKind| -> Result<ScriptedCapture> {
            requests.push(kind);
            match kind {
                SourceKind::Video => Ok(ScriptedCapture { remaining: 1 }),
                SourceKind::Camera => anyhow::bail!("no camera attached"),
            }
        };
        let mut display = FakeDisplay::scripted(vec![
            vec![],
            vec![],
            vec![],
            vec![UserCommand::Open(SourceKind::Camera)],
            vec![UserCommand::Open(SourceKind::Video)],
            vec![],
        ]);
        let mut plot = CountingPlot::default();

        let reason = h
            .frame_loop
            .run(Duration::ZERO, &mut display, Some(&mut plot), &mut opener);

        assert_eq!(reason, StopReason::Quit);
        assert_eq!(requests, vec![SourceKind::Camera, SourceKind::Video]);
        assert_eq!(display.shown, 3);
        // First source: 1, 2, end. Failed camera open: idle. Second source
        // starts empty and gains the curled wrist, then ends.
        assert_eq!(plot.lengths, vec![1, 2, 2, 2, 1, 1]);
        assert_eq!(h.frame_loop.trajectory().len(), 1);
        assert_eq!(h.spoken.0.borrow().len(), 1);
    }

    #[test]
    fn test_run_quit_command() {
        let mut h = harness("quit", vec![]);
        h.frame_loop.open_source(ScriptedCapture { remaining: 100 });
        let mut display = FakeDisplay::scripted(vec![vec![], vec![], vec![UserCommand::Quit]]);

        let reason = h.frame_loop.run(Duration::ZERO, &mut display, None, &mut no_opener);
        assert_eq!(reason, StopReason::Quit);
        assert_eq!(display.shown, 2);
        assert!(!h.frame_loop.has_source());
    }

    #[test]
    fn test_run_window_closed() {
        let mut h = harness("closed", vec![]);
        h.frame_loop.open_source(ScriptedCapture { remaining: 100 });
        let mut display = FakeDisplay {
            quit_when_done: false,
            close_after: Some(3),
            ..FakeDisplay::scripted(vec![])
        };

        assert_eq!(
            h.frame_loop.run(Duration::ZERO, &mut display, None, &mut no_opener),
            StopReason::WindowClosed
        );
        assert_eq!(display.shown, 3);
    }

    #[test]
    fn test_settings_from_config_dedupes_and_skips_unknown() {
        let mut config = Config::default();
        config.feedback.rules = vec![
            FeedbackRule {
                joint: JointName::LeftElbow,
                threshold_degrees: 40.0,
                message: "a".to_string(),
            },
            FeedbackRule {
                joint: JointName::LeftElbow,
                threshold_degrees: 30.0,
                message: "b".to_string(),
            },
            FeedbackRule {
                joint: JointName::RightElbow,
                threshold_degrees: 40.0,
                message: "c".to_string(),
            },
            FeedbackRule {
                joint: JointName::LeftKnee,
                threshold_degrees: 40.0,
                message: "d".to_string(),
            },
        ];
        let settings = AnalysisSettings::from_config(&config);
        assert_eq!(settings.angles, vec![JointAngle::LEFT_ELBOW, JointAngle::RIGHT_ELBOW]);
        assert_eq!(settings.tracked_joint, JointName::LeftWrist);
    }
}
