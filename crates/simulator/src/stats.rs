//! Run statistics and the end-of-run report.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use trainsim_types::{CarriageId, EventKind};

/// Counters shared by all carriage workers.
pub struct SimStats {
    /// Messages handed to the publisher successfully.
    pub published: AtomicU64,
    /// Publishes that returned an error.
    pub failed: AtomicU64,
    /// Successful publishes per event kind, indexed like [`EventKind::ALL`].
    per_kind: [AtomicU64; 3],
    /// Latest occupancy per carriage, stored as `f64` bits.
    occupancy: Vec<AtomicU64>,
}

impl SimStats {
    /// Create zeroed statistics for a train with `carriages` carriages.
    pub fn new(carriages: usize) -> Self {
        Self {
            published: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            per_kind: Default::default(),
            occupancy: (0..carriages).map(|_| AtomicU64::new(0f64.to_bits())).collect(),
        }
    }

    /// Count a successful publish.
    pub fn record_published(&self, kind: EventKind) {
        self.published.fetch_add(1, Ordering::SeqCst);
        self.per_kind[kind_slot(kind)].fetch_add(1, Ordering::SeqCst);
    }

    /// Count a failed publish.
    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::SeqCst);
    }

    /// Store the latest occupancy of a carriage. Unknown carriages are ignored.
    pub fn record_occupancy(&self, carriage: CarriageId, occupancy: f64) {
        if let Some(slot) = self.occupancy.get(carriage.index()) {
            slot.store(occupancy.to_bits(), Ordering::Relaxed);
        }
    }

    /// Successful publishes of one kind.
    pub fn published_of(&self, kind: EventKind) -> u64 {
        self.per_kind[kind_slot(kind)].load(Ordering::SeqCst)
    }

    /// Latest occupancy of every carriage, in carriage order.
    pub fn occupancies(&self) -> Vec<(CarriageId, f64)> {
        self.occupancy
            .iter()
            .enumerate()
            .map(|(i, bits)| {
                (
                    CarriageId::from_index(i),
                    f64::from_bits(bits.load(Ordering::Relaxed)),
                )
            })
            .collect()
    }

    /// Publish rate over the given elapsed time.
    pub fn rate(&self, elapsed: Duration) -> f64 {
        let secs = elapsed.as_secs_f64();
        if secs > 0.0 {
            self.published.load(Ordering::SeqCst) as f64 / secs
        } else {
            0.0
        }
    }

    /// Snapshot into a report.
    pub fn report(&self, duration: Duration, seed: u64) -> SimulationReport {
        SimulationReport {
            duration,
            seed,
            total_published: self.published.load(Ordering::SeqCst),
            total_failed: self.failed.load(Ordering::SeqCst),
            per_kind: EventKind::ALL.map(|kind| (kind, self.published_of(kind))),
            final_occupancy: self.occupancies(),
            avg_rate: self.rate(duration),
        }
    }
}

fn kind_slot(kind: EventKind) -> usize {
    match kind {
        EventKind::Seat => 0,
        EventKind::Noise => 1,
        EventKind::Temperature => 2,
    }
}

/// Report generated after a simulation run.
#[derive(Debug, Clone)]
pub struct SimulationReport {
    /// Total duration of the run.
    pub duration: Duration,
    /// Seed the run used.
    pub seed: u64,
    /// Messages published successfully.
    pub total_published: u64,
    /// Publishes that failed.
    pub total_failed: u64,
    /// Successful publishes per kind.
    pub per_kind: [(EventKind, u64); 3],
    /// Occupancy of each carriage when the run stopped.
    pub final_occupancy: Vec<(CarriageId, f64)>,
    /// Average messages per second.
    pub avg_rate: f64,
}

impl SimulationReport {
    /// Print the report to stderr, away from the published event stream.
    pub fn print(&self) {
        eprintln!("\n=== Simulation Report ===");
        eprintln!("Duration: {:?}", self.duration);
        eprintln!("Seed: {}", self.seed);
        eprintln!("Published: {}", self.total_published);
        for (kind, count) in &self.per_kind {
            eprintln!("  {}: {}", kind, count);
        }
        eprintln!("Failed: {}", self.total_failed);
        eprintln!("Avg msg/s: {:.2}", self.avg_rate);
        for (carriage, occupancy) in &self.final_occupancy {
            eprintln!("Carriage {} occupancy: {:.0}%", carriage, occupancy * 100.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_per_kind() {
        let stats = SimStats::new(1);
        stats.record_published(EventKind::Seat);
        stats.record_published(EventKind::Seat);
        stats.record_published(EventKind::Temperature);
        stats.record_failed();

        let report = stats.report(Duration::from_secs(3), 42);
        assert_eq!(report.total_published, 3);
        assert_eq!(report.total_failed, 1);
        assert_eq!(
            report.per_kind,
            [
                (EventKind::Seat, 2),
                (EventKind::Noise, 0),
                (EventKind::Temperature, 1)
            ]
        );
        assert!((report.avg_rate - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_occupancy_slots() {
        let stats = SimStats::new(2);
        stats.record_occupancy(CarriageId(2), 0.75);
        stats.record_occupancy(CarriageId(9), 1.0);

        assert_eq!(
            stats.occupancies(),
            vec![(CarriageId(1), 0.0), (CarriageId(2), 0.75)]
        );
    }

    #[test]
    fn test_rate_with_zero_elapsed() {
        let stats = SimStats::new(1);
        stats.record_published(EventKind::Noise);
        assert_eq!(stats.rate(Duration::ZERO), 0.0);
    }
}
