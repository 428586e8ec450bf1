//! Train Sensor Simulator
//!
//! Publishes seat, noise and temperature events for every carriage of a train,
//! following a repeating day cycle of rush hours and lulls.
//!
//! # Architecture
//!
//! The simulator builds on `trainsim-engine` for event generation and
//! `trainsim-publisher` for delivery:
//!
//! - **Carriage workers**: one task per carriage, each owning its seats and random source
//! - **Monitor**: logs day cycle phase changes and periodic occupancy
//! - **Statistics**: publish counts per event kind and final occupancy
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use trainsim_engine::SimConfig;
//! use trainsim_publisher::LocalPublisher;
//! use trainsim_simulator::{Simulator, SimulatorConfig};
//!
//! let config = SimulatorConfig::new(SimConfig::new("IC-123").with_carriages(4));
//! let simulator = Simulator::new(config, Arc::new(LocalPublisher::stdout()))?;
//! let report = simulator.run_for(Duration::from_secs(60)).await?;
//! report.print();
//! ```

pub mod config;
pub mod monitor;
pub mod runner;
pub mod stats;

pub use config::SimulatorConfig;
pub use monitor::Monitor;
pub use runner::{Simulator, SimulatorError};
pub use stats::{SimStats, SimulationReport};
