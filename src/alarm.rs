// Edge-triggered memory threshold alarm (one notification per excursion above the limit).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Whether the last evaluated sample left the alarm above or below its limit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlarmState {
    #[default]
    Below,
    Above,
}

/// Transition emitted by [`ThresholdAlarm::evaluate`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum AlarmEvent {
    /// Sample went strictly above the limit after being at or below it.
    CrossedHigh { value: f64, limit: f64 },
    /// Sample fell back to or below the limit; the alarm is re-armed.
    Cleared,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LimitError {
    #[error("memory limit must be between 0 and 100, got {0}")]
    OutOfRange(u16),
}

/// Memory usage limit as an integer percentage in 0..=100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct MemoryLimit(u8);

impl MemoryLimit {
    pub fn new(percent: u16) -> Result<Self, LimitError> {
        if percent > 100 {
            return Err(LimitError::OutOfRange(percent));
        }
        Ok(Self(percent as u8))
    }

    pub fn percent(self) -> u8 {
        self.0
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.0)
    }
}

impl TryFrom<u16> for MemoryLimit {
    type Error = LimitError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MemoryLimit> for u16 {
    fn from(limit: MemoryLimit) -> Self {
        u16::from(limit.0)
    }
}

/// Hysteresis alarm over the RAM sample stream.
///
/// Fires `CrossedHigh` once when a sample goes strictly above the limit, stays silent while
/// samples remain above it, and emits `Cleared` once a sample is back at or below the limit.
/// An unset limit makes the alarm inert.
#[derive(Debug, Clone, Default)]
pub struct ThresholdAlarm {
    limit: Option<f64>,
    crossed: bool,
}

impl ThresholdAlarm {
    pub fn new(limit: Option<MemoryLimit>) -> Self {
        Self {
            limit: limit.map(MemoryLimit::as_f64),
            crossed: false,
        }
    }

    /// Replaces the limit and re-arms the alarm, even if the current value is still above it.
    /// The next evaluated sample decides whether to fire.
    pub fn set_limit(&mut self, limit: Option<MemoryLimit>) {
        self.limit = limit.map(MemoryLimit::as_f64);
        self.crossed = false;
    }

    pub fn limit(&self) -> Option<f64> {
        self.limit
    }

    pub fn state(&self) -> AlarmState {
        if self.crossed {
            AlarmState::Above
        } else {
            AlarmState::Below
        }
    }

    /// Feeds one sample through the state machine. Equality with the limit counts as not crossed.
    pub fn evaluate(&mut self, sample: f64) -> Option<AlarmEvent> {
        let limit = self.limit?;
        if sample > limit && !self.crossed {
            self.crossed = true;
            Some(AlarmEvent::CrossedHigh {
                value: sample,
                limit,
            })
        } else if sample <= limit && self.crossed {
            self.crossed = false;
            Some(AlarmEvent::Cleared)
        } else {
            None
        }
    }
}
