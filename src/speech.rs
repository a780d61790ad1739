//! Spoken feedback.
//!
//! Speech backends block until the text has been spoken, so they run on a
//! dedicated worker thread. The frame loop only hands text over a queue
//! with room for one pending announcement.

use anyhow::{bail, Context, Result};
use crossbeam_channel::{bounded, Sender, TrySendError};
use std::process::Command;
use std::thread;

use crate::config::SpeechConfig;

/// Fire-and-forget announcement target
pub trait AnnounceSink {
    fn announce(&self, text: &str) -> Result<()>;
}

/// Blocking text-to-speech backend
pub trait Speaker: Send {
    fn say(&mut self, text: &str) -> Result<()>;
}

/// Runs an external TTS program (`espeak`, `say`, ...) with the text as last argument
pub struct CommandSpeaker {
    command: String,
    args: Vec<String>,
}

impl CommandSpeaker {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }
}

impl Speaker for CommandSpeaker {
    fn say(&mut self, text: &str) -> Result<()> {
        let status = Command::new(&self.command)
            .args(&self.args)
            .arg(text)
            .status()
            .with_context(|| format!("Failed to run {}", self.command))?;
        if !status.success() {
            bail!("{} exited with {}", self.command, status);
        }
        Ok(())
    }
}

/// Speaks into the log; used when speech is disabled
pub struct LogSpeaker;

impl Speaker for LogSpeaker {
    fn say(&mut self, text: &str) -> Result<()> {
        log::info!("[speech] {}", text);
        Ok(())
    }
}

/// Background speech worker
pub struct SpeechAnnouncer {
    tx: Option<Sender<String>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl SpeechAnnouncer {
    pub fn spawn<S: Speaker + 'static>(mut speaker: S) -> Result<Self> {
        let (tx, rx) = bounded::<String>(1);

        let handle = thread::Builder::new()
            .name("speech".to_string())
            .spawn(move || {
                for text in rx {
                    if let Err(e) = speaker.say(&text) {
                        log::warn!("speech failed: {e:#}");
                    }
                }
            })
            .context("Failed to start speech thread")?;

        Ok(Self {
            tx: Some(tx),
            handle: Some(handle),
        })
    }

    pub fn from_config(config: &SpeechConfig) -> Result<Self> {
        if config.enabled {
            Self::spawn(CommandSpeaker::new(&config.command, config.args.clone()))
        } else {
            Self::spawn(LogSpeaker)
        }
    }
}

impl AnnounceSink for SpeechAnnouncer {
    fn announce(&self, text: &str) -> Result<()> {
        let Some(tx) = &self.tx else {
            bail!("speech worker stopped");
        };
        match tx.try_send(text.to_string()) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                log::debug!("speech busy, dropping \"{}\"", text);
                Ok(())
            }
            Err(TrySendError::Disconnected(_)) => bail!("speech worker stopped"),
        }
    }
}

impl Drop for SpeechAnnouncer {
    fn drop(&mut self) {
        // Closing the queue ends the worker after its current utterance
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("speech thread panicked");
            }
        }
    }
}
