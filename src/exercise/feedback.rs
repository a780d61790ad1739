use std::time::{Duration, Instant};

use crate::config::{FeedbackConfig, FeedbackRule};
use crate::speech::AnnounceSink;

use super::angle::AngleMeasurement;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackPhase {
    Idle,
    /// An alert went out less than `cooldown` ago
    Cooldown,
}

/// What the controller did with one measurement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackDecision {
    /// No rule watches this joint
    Unwatched,
    /// At or above the rule threshold
    InRange,
    Announced,
    /// Below threshold but still inside the cooldown window
    Suppressed,
}

/// Debounced angle rules driving the announce sink.
///
/// A single cooldown clock is shared by every rule so that two
/// announcements never overlap, whichever joint triggered them.
pub struct FeedbackController {
    rules: Vec<FeedbackRule>,
    cooldown: Duration,
    last_alert: Option<Instant>,
}

impl FeedbackController {
    pub fn new(rules: Vec<FeedbackRule>, cooldown: Duration) -> Self {
        Self {
            rules,
            cooldown,
            last_alert: None,
        }
    }

    pub fn from_config(config: &FeedbackConfig) -> Self {
        Self::new(config.rules.clone(), Duration::from_millis(config.cooldown_ms))
    }

    pub fn rules(&self) -> &[FeedbackRule] {
        &self.rules
    }

    pub fn last_alert(&self) -> Option<Instant> {
        self.last_alert
    }

    pub fn phase(&self, now: Instant) -> FeedbackPhase {
        match self.last_alert {
            Some(at) if now.saturating_duration_since(at) < self.cooldown => FeedbackPhase::Cooldown,
            _ => FeedbackPhase::Idle,
        }
    }

    /// Feed one reading. Every rule on the joint is checked in config
    /// order; the first one whose threshold is crossed speaks.
    pub fn observe(&mut self, measurement: &AngleMeasurement, sink: &dyn AnnounceSink) -> FeedbackDecision {
        let mut watching = self
            .rules
            .iter()
            .filter(|r| r.joint == measurement.vertex)
            .peekable();
        if watching.peek().is_none() {
            return FeedbackDecision::Unwatched;
        }
        let Some(rule) = watching.find(|r| measurement.value_degrees < r.threshold_degrees) else {
            return FeedbackDecision::InRange;
        };

        let now = measurement.timestamp;
        if self.phase(now) == FeedbackPhase::Cooldown {
            return FeedbackDecision::Suppressed;
        }

        log::info!(
            "{} at {:.1}° (< {:.0}°): {}",
            rule.joint.label(),
            measurement.value_degrees,
            rule.threshold_degrees,
            rule.message
        );
        if let Err(e) = sink.announce(&rule.message) {
            log::warn!("announce failed: {e:#}");
        }
        self.last_alert = Some(now);
        FeedbackDecision::Announced
    }

    /// Back to Idle, for a freshly opened capture source
    pub fn reset(&mut self) {
        self.last_alert = None;
    }
}
