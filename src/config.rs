use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::pose::JointName;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub pose: PoseConfig,
    #[serde(default)]
    pub feedback: FeedbackConfig,
    #[serde(default)]
    pub recording: RecordingConfig,
    #[serde(default)]
    pub trajectory: TrajectoryConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Camera index for the live feed
    #[serde(default)]
    pub device_index: i32,
    /// Requested resolution; the driver may pick another
    #[serde(default = "default_capture_width")]
    pub width: Option<u32>,
    #[serde(default = "default_capture_height")]
    pub height: Option<u32>,
    #[serde(default = "default_capture_fps")]
    pub fps: Option<u32>,
    /// Analyze a video file instead of the camera
    #[serde(default)]
    pub video_path: Option<String>,
    /// Frame loop period
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

fn default_capture_width() -> Option<u32> { Some(640) }
fn default_capture_height() -> Option<u32> { Some(480) }
fn default_capture_fps() -> Option<u32> { Some(30) }
fn default_tick_interval_ms() -> u64 { 30 }

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            device_index: 0,
            width: default_capture_width(),
            height: default_capture_height(),
            fps: default_capture_fps(),
            video_path: None,
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoseConfig {
    #[serde(default = "default_model_path")]
    pub model_path: String,
    /// Mean arm-joint confidence below which no body is reported
    #[serde(default = "default_min_pose_confidence")]
    pub min_pose_confidence: f32,
    /// Joints below this are ignored for angles and trajectory
    #[serde(default = "default_min_joint_confidence")]
    pub min_joint_confidence: f32,
}

fn default_model_path() -> String { "models/movenet_lightning.onnx".to_string() }
fn default_min_pose_confidence() -> f32 { 0.3 }
fn default_min_joint_confidence() -> f32 { 0.3 }

impl Default for PoseConfig {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
            min_pose_confidence: default_min_pose_confidence(),
            min_joint_confidence: default_min_joint_confidence(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackConfig {
    /// Minimum gap between two announcements
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,
    #[serde(default = "default_rules")]
    pub rules: Vec<FeedbackRule>,
}

/// Announce `message` when the angle at `joint` drops below `threshold_degrees`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRule {
    pub joint: JointName,
    #[serde(default = "default_threshold_degrees")]
    pub threshold_degrees: f32,
    #[serde(default = "default_message")]
    pub message: String,
}

fn default_cooldown_ms() -> u64 { 2000 }
fn default_threshold_degrees() -> f32 { 40.0 }
fn default_message() -> String { "Extend your arm more!".to_string() }

fn default_rules() -> Vec<FeedbackRule> {
    vec![FeedbackRule {
        joint: JointName::LeftElbow,
        threshold_degrees: default_threshold_degrees(),
        message: default_message(),
    }]
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: default_cooldown_ms(),
            rules: default_rules(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    /// Four-character codec tag handed to the writer
    #[serde(default = "default_fourcc")]
    pub fourcc: String,
    #[serde(default = "default_recording_fps")]
    pub fps: f64,
    /// Container file extension, without the dot
    #[serde(default = "default_extension")]
    pub extension: String,
}

fn default_output_dir() -> String { "recordings".to_string() }
fn default_fourcc() -> String { "XVID".to_string() }
fn default_recording_fps() -> f64 { 30.0 }
fn default_extension() -> String { "avi".to_string() }

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            fourcc: default_fourcc(),
            fps: default_recording_fps(),
            extension: default_extension(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrajectoryConfig {
    #[serde(default = "default_tracked_joint")]
    pub joint: JointName,
}

fn default_tracked_joint() -> JointName { JointName::LeftWrist }

impl Default for TrajectoryConfig {
    fn default() -> Self {
        Self {
            joint: default_tracked_joint(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    /// When false, feedback is only logged
    #[serde(default = "default_speech_enabled")]
    pub enabled: bool,
    /// Text-to-speech program; the text is passed as the last argument
    #[serde(default = "default_speech_command")]
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
}

fn default_speech_enabled() -> bool { true }

fn default_speech_command() -> String {
    if cfg!(target_os = "macos") {
        "say".to_string()
    } else {
        "espeak".to_string()
    }
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: default_speech_enabled(),
            command: default_speech_command(),
            args: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_show_plot")]
    pub show_plot: bool,
    #[serde(default = "default_plot_size")]
    pub plot_width: usize,
    #[serde(default = "default_plot_size")]
    pub plot_height: usize,
}

fn default_show_plot() -> bool { true }
fn default_plot_size() -> usize { 480 }

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            show_plot: default_show_plot(),
            plot_width: default_plot_size(),
            plot_height: default_plot_size(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Missing file means defaults; a broken file is reported and ignored
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            log::info!("{} not found, using defaults", path.display());
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("{e:#}; using defaults");
                Self::default()
            }
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}
