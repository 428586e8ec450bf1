//! Configuration types for the simulator.

use std::time::Duration;
use trainsim_engine::SimConfig;

/// Configuration for a simulation run.
#[derive(Clone, Debug)]
pub struct SimulatorConfig {
    /// Train and pacing configuration for the engine.
    pub sim: SimConfig,

    /// How often the monitor checks for a day cycle phase change.
    pub phase_poll_interval: Duration,

    /// How often the monitor logs per-carriage occupancy.
    pub occupancy_report_interval: Duration,
}

impl SimulatorConfig {
    /// Create a simulator configuration around an engine configuration.
    pub fn new(sim: SimConfig) -> Self {
        Self {
            sim,
            phase_poll_interval: Duration::from_secs(5),
            occupancy_report_interval: Duration::from_secs(15),
        }
    }

    /// Set the phase poll interval.
    pub fn with_phase_poll_interval(mut self, interval: Duration) -> Self {
        self.phase_poll_interval = interval;
        self
    }

    /// Set the occupancy report interval.
    pub fn with_occupancy_report_interval(mut self, interval: Duration) -> Self {
        self.occupancy_report_interval = interval;
        self
    }
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self::new(SimConfig::default())
    }
}
