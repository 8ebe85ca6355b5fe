//! Trainer configuration.

use crate::progress::WeightCurve;
use crate::queue::DEFAULT_QUEUE_LEN;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::time::Duration;

/// Largest look-ahead the queue may be configured with.
const MAX_QUEUE_LEN: usize = 32;

/// Configuration for a practice session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    /// Lowest pitch the sampler may draw (inclusive). Default: 36 (C2).
    pub min_midi: u8,
    /// Highest pitch the sampler may draw (inclusive). Default: 84 (C6).
    pub max_midi: u8,
    /// Number of upcoming notes kept in the queue. Default: 6.
    pub queue_len: usize,
    pub weight_curve: WeightCurve,
    /// Length of the feedback tone played on a correct answer.
    pub tone_duration_ms: u64,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            min_midi: 36,
            max_midi: 84,
            queue_len: DEFAULT_QUEUE_LEN,
            weight_curve: WeightCurve::default(),
            tone_duration_ms: 300,
        }
    }
}

impl TrainerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.min_midi > self.max_midi || self.max_midi > 127 {
            return Err(Error::InvalidRange {
                min: self.min_midi,
                max: self.max_midi,
            });
        }
        if self.queue_len == 0 || self.queue_len > MAX_QUEUE_LEN {
            return Err(Error::InvalidConfig(format!(
                "queue_len {} out of range (1-{})",
                self.queue_len, MAX_QUEUE_LEN
            )));
        }
        if self.tone_duration_ms == 0 {
            return Err(Error::InvalidConfig(
                "tone_duration_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse and validate a JSON config. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn pitch_range(&self) -> RangeInclusive<u8> {
        self.min_midi..=self.max_midi
    }

    pub fn tone_duration(&self) -> Duration {
        Duration::from_millis(self.tone_duration_ms)
    }
}
