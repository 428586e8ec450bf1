//! Time-of-day demand model.
//!
//! The day is compressed into a 240 second cycle of four equal 60 second
//! phases. Each phase fixes a target occupancy and a base ambient temperature.
//! The phase depends only on how much wall-clock time has passed since the
//! cycle started, so two cycles with the same start agree at every instant.

use std::fmt;
use std::time::{Duration, Instant};

/// Length of one phase.
pub const PHASE_DURATION: Duration = Duration::from_secs(60);

/// Number of phases in a cycle.
pub const PHASE_COUNT: u8 = 4;

/// Length of a full cycle.
pub const CYCLE_DURATION: Duration = Duration::from_secs(60 * PHASE_COUNT as u64);

/// One phase of the day cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    MorningRush,
    MiddayLull,
    AfternoonRush,
    EveningLull,
}

impl Phase {
    /// Phases in cycle order.
    pub const ALL: [Phase; PHASE_COUNT as usize] = [
        Phase::MorningRush,
        Phase::MiddayLull,
        Phase::AfternoonRush,
        Phase::EveningLull,
    ];

    /// Phase at the given position; positions wrap around the cycle.
    pub fn from_index(index: u8) -> Self {
        Self::ALL[(index % PHASE_COUNT) as usize]
    }

    /// Position of this phase in the cycle, in `0..4`.
    pub fn index(self) -> u8 {
        match self {
            Phase::MorningRush => 0,
            Phase::MiddayLull => 1,
            Phase::AfternoonRush => 2,
            Phase::EveningLull => 3,
        }
    }

    /// Human-readable name. Both lulls share a name.
    pub fn name(self) -> &'static str {
        match self {
            Phase::MorningRush => "Morning Rush",
            Phase::MiddayLull => "Slow Period",
            Phase::AfternoonRush => "Afternoon Rush",
            Phase::EveningLull => "Slow Period",
        }
    }

    /// Fraction of seats that should be occupied during this phase.
    pub fn target_occupancy(self) -> f64 {
        match self {
            Phase::MorningRush => 0.85,
            Phase::MiddayLull => 0.25,
            Phase::AfternoonRush => 0.99,
            Phase::EveningLull => 0.20,
        }
    }

    /// Ambient temperature (Celsius) of an empty carriage during this phase.
    pub fn base_temperature(self) -> f64 {
        match self {
            Phase::MorningRush => 18.0,
            Phase::MiddayLull => 20.0,
            Phase::AfternoonRush => 25.0,
            Phase::EveningLull => 19.0,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Repeating four-phase cycle anchored at a start instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayCycle {
    start: Instant,
}

impl DayCycle {
    /// Start a cycle now.
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    /// Start a cycle at the given instant.
    pub fn starting_at(start: Instant) -> Self {
        Self { start }
    }

    /// Instant the cycle started.
    pub fn start(&self) -> Instant {
        self.start
    }

    /// Phase at the given instant. Instants before the start map to the first phase.
    pub fn phase_at(&self, now: Instant) -> Phase {
        let elapsed = now.saturating_duration_since(self.start);
        let into_cycle = elapsed.as_nanos() % CYCLE_DURATION.as_nanos();
        Phase::from_index((into_cycle / PHASE_DURATION.as_nanos()) as u8)
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase_at(Instant::now())
    }

    /// Name of the current phase.
    pub fn phase_name(&self) -> &'static str {
        self.phase().name()
    }

    /// Target occupancy of the current phase.
    pub fn target_occupancy(&self) -> f64 {
        self.phase().target_occupancy()
    }

    /// Base temperature of the current phase.
    pub fn base_temperature(&self) -> f64 {
        self.phase().base_temperature()
    }
}

impl Default for DayCycle {
    fn default() -> Self {
        Self::new()
    }
}
