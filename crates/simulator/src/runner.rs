//! Simulator runner that drives one worker per carriage.

use crate::config::SimulatorConfig;
use crate::monitor::Monitor;
use crate::stats::{SimStats, SimulationReport};
use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use trainsim_engine::{CarriageGenerator, ConfigError, Envelope, Generator};
use trainsim_publisher::Publisher;
use trainsim_types::CodecError;

/// Publishes sensor events for every carriage of one train.
///
/// Each carriage runs as its own task and owns its seats and random source,
/// so workers never contend with each other. Workers share only the publisher
/// and the statistics counters.
pub struct Simulator {
    config: SimulatorConfig,
    generator: Generator,
    publisher: Arc<dyn Publisher>,
    stats: Arc<SimStats>,
}

impl Simulator {
    /// Create a simulator publishing through `publisher`.
    pub fn new(
        config: SimulatorConfig,
        publisher: Arc<dyn Publisher>,
    ) -> Result<Self, SimulatorError> {
        let generator = Generator::new(config.sim.clone())?;
        let stats = Arc::new(SimStats::new(generator.carriages().len()));

        Ok(Self {
            config,
            generator,
            publisher,
            stats,
        })
    }

    /// Seed in use for this run.
    pub fn seed(&self) -> u64 {
        self.generator.seed()
    }

    /// Live statistics.
    pub fn stats(&self) -> Arc<SimStats> {
        Arc::clone(&self.stats)
    }

    /// Run for a fixed duration.
    pub async fn run_for(self, duration: Duration) -> Result<SimulationReport, SimulatorError> {
        let cancel = CancellationToken::new();
        let cancel_clone = cancel.clone();

        // Spawn a task to cancel after duration
        let timer = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            cancel_clone.cancel();
        });

        let report = self.run_until_cancelled(cancel).await;
        timer.abort();
        report
    }

    /// Run until the cancellation token is triggered.
    ///
    /// Returns once every carriage worker has stopped and the publisher has
    /// been closed. A worker hitting an encoding failure stops the whole run.
    pub async fn run_until_cancelled(
        self,
        cancel: CancellationToken,
    ) -> Result<SimulationReport, SimulatorError> {
        let start = Instant::now();
        let seed = self.generator.seed();
        let sim = &self.config.sim;

        info!(
            train = %sim.train,
            carriages = sim.carriages,
            seats_per_carriage = sim.seats_per_carriage,
            base_interval_ms = sim.base_interval.as_millis() as u64,
            jitter_ms = sim.jitter.as_millis() as u64,
            seed,
            "Starting simulator"
        );

        let shutdown = cancel.child_token();

        let monitor = Monitor::new(
            *self.generator.day_cycle(),
            Arc::clone(&self.stats),
            self.config.phase_poll_interval,
            self.config.occupancy_report_interval,
        );
        let monitor_handle = tokio::spawn(monitor.run(shutdown.clone()));

        let handles: Vec<_> = self
            .generator
            .into_carriages()
            .into_iter()
            .map(|generator| {
                let worker = CarriageWorker {
                    generator,
                    publisher: Arc::clone(&self.publisher),
                    stats: Arc::clone(&self.stats),
                };
                let shutdown = shutdown.clone();
                tokio::spawn(async move { worker.run(shutdown).await })
            })
            .collect();

        // Wait for every worker, stopping the rest if one fails.
        let mut failure = None;
        let workers = handles.into_iter().map(|handle| {
            let shutdown = shutdown.clone();
            async move {
                let result = handle.await;
                if !matches!(result, Ok(Ok(()))) {
                    shutdown.cancel();
                }
                result
            }
        });
        for result in join_all(workers).await {
            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    error!(error = %e, "Carriage worker failed to encode an event");
                    failure.get_or_insert(SimulatorError::Codec(e));
                }
                Err(e) => {
                    error!(error = %e, "Carriage worker panicked");
                    failure.get_or_insert(SimulatorError::WorkerPanicked(e.to_string()));
                }
            }
        }

        shutdown.cancel();
        if let Err(e) = monitor_handle.await {
            warn!(error = %e, "Monitor task failed");
        }

        info!("All carriages stopped, closing publisher");
        if let Err(e) = self.publisher.close().await {
            warn!(error = %e, "Failed to close publisher");
        }

        match failure {
            Some(e) => Err(e),
            None => Ok(self.stats.report(start.elapsed(), seed)),
        }
    }
}

/// A task publishing one carriage's events.
struct CarriageWorker {
    generator: CarriageGenerator,
    publisher: Arc<dyn Publisher>,
    stats: Arc<SimStats>,
}

impl CarriageWorker {
    async fn run(mut self, cancel: CancellationToken) -> Result<(), CodecError> {
        let carriage = self.generator.carriage();

        // Spread carriages out so they do not publish in lockstep.
        let offset = self.generator.startup_offset();
        debug!(
            carriage = carriage.0,
            offset_ms = offset.as_millis() as u64,
            "Carriage starting"
        );
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(()),
            _ = tokio::time::sleep(offset) => {}
        }

        loop {
            if cancel.is_cancelled() {
                break;
            }

            let envelopes = self.generator.next_cycle()?;
            self.stats
                .record_occupancy(carriage, self.generator.current_occupancy());

            for envelope in envelopes {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Ok(()),
                    _ = self.publish(envelope) => {}
                }
            }

            let delay = self.generator.next_delay();
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        debug!(carriage = carriage.0, "Carriage stopped");
        Ok(())
    }

    async fn publish(&self, envelope: Envelope) {
        let kind = envelope.event.kind();
        match self.publisher.publish(&envelope.topic, envelope.payload).await {
            Ok(()) => self.stats.record_published(kind),
            Err(e) => {
                self.stats.record_failed();
                warn!(topic = %envelope.topic, error = %e, "Failed to publish event");
            }
        }
    }
}

/// Errors that can occur while running the simulator.
#[derive(Debug, thiserror::Error)]
pub enum SimulatorError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Event encoding failed: {0}")]
    Codec(#[from] CodecError),

    #[error("Carriage worker panicked: {0}")]
    WorkerPanicked(String),
}
