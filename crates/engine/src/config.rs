//! Configuration for the event generator.

use crate::error::ConfigError;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use trainsim_types::TrainId;

/// Configuration for one simulated train.
///
/// Durations are unsigned, so the "non-negative interval" requirement holds by
/// construction. The remaining constraints are checked by [`SimConfig::validate`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimConfig {
    /// Train identifier, used in every event and topic.
    pub train: TrainId,

    /// Number of carriages.
    pub carriages: u32,

    /// Number of seats in each carriage.
    pub seats_per_carriage: u32,

    /// Base interval between publish cycles of one carriage.
    pub base_interval: Duration,

    /// Bound of the random offset added to or subtracted from the base interval.
    pub jitter: Duration,

    /// Random seed. 0 derives a seed from the current time.
    pub seed: u64,
}

impl SimConfig {
    /// Create a configuration for the given train with default sizing.
    pub fn new(train: impl Into<TrainId>) -> Self {
        Self {
            train: train.into(),
            carriages: 2,
            seats_per_carriage: 32,
            base_interval: Duration::from_secs(2),
            jitter: Duration::from_millis(500),
            seed: 0,
        }
    }

    /// Set the number of carriages.
    pub fn with_carriages(mut self, carriages: u32) -> Self {
        self.carriages = carriages;
        self
    }

    /// Set the number of seats per carriage.
    pub fn with_seats_per_carriage(mut self, seats: u32) -> Self {
        self.seats_per_carriage = seats;
        self
    }

    /// Set the base interval.
    pub fn with_base_interval(mut self, interval: Duration) -> Self {
        self.base_interval = interval;
        self
    }

    /// Set the jitter bound.
    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    /// Set the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Total number of seats across the train.
    pub fn total_seats(&self) -> usize {
        self.carriages as usize * self.seats_per_carriage as usize
    }

    /// Check that the configuration describes a valid train.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let train = self.train.as_str();
        if train.trim().is_empty() {
            return Err(ConfigError::EmptyTrainId);
        }
        if train.contains(['/', '+', '#']) {
            return Err(ConfigError::ReservedTopicCharacter(train.to_string()));
        }
        if self.carriages == 0 {
            return Err(ConfigError::NoCarriages);
        }
        if self.seats_per_carriage == 0 {
            return Err(ConfigError::NoSeats);
        }
        Ok(())
    }

    /// The seed to use for this run.
    ///
    /// Returns the configured seed, or one derived from the wall clock when the
    /// configured seed is 0. Never returns 0.
    pub fn resolved_seed(&self) -> u64 {
        if self.seed != 0 {
            return self.seed;
        }
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or_default();
        nanos.max(1)
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self::new("IC-123")
    }
}
