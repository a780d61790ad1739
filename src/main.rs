use anyhow::Result;
use env_logger::Env;
use std::time::Duration;

use dumbbell_coach::camera::{CaptureSource, OpenCvCapture};
use dumbbell_coach::config::Config;
use dumbbell_coach::exercise::FeedbackController;
use dumbbell_coach::pose::MoveNetDetector;
use dumbbell_coach::record::{OpenCvWriterFactory, RecordingManager};
use dumbbell_coach::render::{PlotWindow, VideoWindow};
use dumbbell_coach::session::{AnalysisSettings, FrameLoop, PlotSink, SourceKind};
use dumbbell_coach::speech::SpeechAnnouncer;

const CONFIG_PATH: &str = "config.toml";

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    log::info!("dumbbell-coach {}", env!("GIT_VERSION"));

    let mut config = Config::load_or_default(CONFIG_PATH);
    // A video file on the command line replaces the camera
    if let Some(path) = std::env::args().nth(1) {
        config.capture.video_path = Some(path);
    }

    let capture = OpenCvCapture::from_config(&config.capture)?;
    let (width, height) = capture.frame_size();

    log::info!("Loading model from {}", config.pose.model_path);
    let detector = MoveNetDetector::new(&config.pose.model_path, config.pose.min_pose_confidence)?;

    let announcer = SpeechAnnouncer::from_config(&config.speech)?;
    let recorder = RecordingManager::new(OpenCvWriterFactory, &config.recording);

    let mut frame_loop = FrameLoop::new(
        detector,
        AnalysisSettings::from_config(&config),
        FeedbackController::from_config(&config.feedback),
        Box::new(announcer),
        recorder,
    );
    frame_loop.open_source(capture);

    let mut video = VideoWindow::new("Dumbbell Coach", width as usize, height as usize)?;
    let mut plot = if config.display.show_plot {
        Some(PlotWindow::new(
            "Trajectory",
            config.display.plot_width,
            config.display.plot_height,
        )?)
    } else {
        None
    };

    log::info!("R: start/stop recording, S: stop recording, L: camera, O: video file, Esc: quit");

    let capture_config = config.capture.clone();
    let mut opener = move |kind: SourceKind| -> Result<OpenCvCapture> {
        match kind {
            SourceKind::Camera => OpenCvCapture::open_camera(
                capture_config.device_index,
                capture_config.width,
                capture_config.height,
                capture_config.fps,
            ),
            SourceKind::Video => match &capture_config.video_path {
                Some(path) => OpenCvCapture::open_file(path),
                None => anyhow::bail!("no video_path configured"),
            },
        }
    };

    let period = Duration::from_millis(config.capture.tick_interval_ms);
    let reason = frame_loop.run(
        period,
        &mut video,
        plot.as_mut().map(|p| p as &mut dyn PlotSink),
        &mut opener,
    );

    log::info!("Shutting down ({:?})", reason);
    Ok(())
}
