//! Event-generation engine for the train sensor simulator.
//!
//! # Architecture
//!
//! - **Day Cycle** ([`DayCycle`]): a 240 second, four-phase demand cycle giving
//!   a target occupancy and a base temperature
//! - **Occupancy Model** ([`OccupancyModel`]): seat flags of one carriage,
//!   relaxed toward the day cycle's target one random seat at a time
//! - **Delay Scheduler** ([`DelayScheduler`]): base interval plus symmetric jitter
//! - **Event Generator** ([`Generator`], [`CarriageGenerator`]): seat, noise and
//!   temperature events derived from the two models above
//!
//! # Example
//!
//! ```ignore
//! use trainsim_engine::{Generator, SimConfig};
//! use trainsim_types::CarriageId;
//!
//! let config = SimConfig::new("IC-123").with_carriages(4).with_seed(42);
//! let mut generator = Generator::new(config)?;
//!
//! let carriage = generator.carriage_mut(CarriageId(1)).unwrap();
//! for envelope in carriage.next_cycle()? {
//!     println!("{} {:?}", envelope.topic, envelope.payload);
//! }
//! ```

pub mod config;
pub mod day_cycle;
pub mod error;
pub mod generator;
pub mod occupancy;
pub mod scheduler;

pub use config::SimConfig;
pub use day_cycle::{DayCycle, Phase, CYCLE_DURATION, PHASE_COUNT, PHASE_DURATION};
pub use error::ConfigError;
pub use generator::{CarriageGenerator, Envelope, Generator, NOISE_LOCATIONS, SENSOR_LOCATIONS};
pub use occupancy::{OccupancyModel, SeatStep, EMPTY_PROBABILITY, FILL_PROBABILITY};
pub use scheduler::DelayScheduler;
