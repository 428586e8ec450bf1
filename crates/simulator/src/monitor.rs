//! Background logging of the day cycle and carriage occupancy.

use crate::stats::SimStats;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::info;
use trainsim_engine::{DayCycle, Phase};

/// Logs day cycle phase changes and periodic occupancy.
pub struct Monitor {
    day_cycle: DayCycle,
    stats: Arc<SimStats>,
    phase_poll_interval: Duration,
    occupancy_report_interval: Duration,
}

impl Monitor {
    /// Create a monitor.
    pub fn new(
        day_cycle: DayCycle,
        stats: Arc<SimStats>,
        phase_poll_interval: Duration,
        occupancy_report_interval: Duration,
    ) -> Self {
        Self {
            day_cycle,
            stats,
            phase_poll_interval,
            occupancy_report_interval,
        }
    }

    /// Run until cancelled.
    pub async fn run(self, cancel: CancellationToken) {
        let mut last_phase = self.current_phase();
        log_phase(last_phase);

        let mut phase_tick = interval(self.phase_poll_interval);
        phase_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut occupancy_tick = interval_at(
            Instant::now() + self.occupancy_report_interval,
            self.occupancy_report_interval,
        );
        occupancy_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = phase_tick.tick() => {
                    let phase = self.current_phase();
                    if phase != last_phase {
                        log_phase(phase);
                        last_phase = phase;
                    }
                }
                _ = occupancy_tick.tick() => {
                    for (carriage, occupancy) in self.stats.occupancies() {
                        info!(
                            carriage = carriage.0,
                            occupancy_pct = (occupancy * 100.0).round(),
                            "Carriage occupancy"
                        );
                    }
                }
            }
        }
    }

    /// Phase on the runtime clock, so paused test clocks drive it too.
    fn current_phase(&self) -> Phase {
        self.day_cycle.phase_at(Instant::now().into_std())
    }
}

fn log_phase(phase: Phase) {
    info!(
        phase = %phase,
        target_occupancy_pct = (phase.target_occupancy() * 100.0).round(),
        base_temperature = phase.base_temperature(),
        "Day cycle phase changed"
    );
}
