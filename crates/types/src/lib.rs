//! Core types for the train sensor simulator.
//!
//! - [`identifiers`]: train, carriage and seat identifiers
//! - [`event`]: the closed set of sensor events and their JSON wire format
//! - [`topic`]: hierarchical topic naming

pub mod event;
pub mod identifiers;
pub mod topic;

pub use event::{
    CodecError, Event, EventHeader, EventKind, NoiseEvent, SeatEvent, TemperatureEvent,
};
pub use identifiers::{CarriageId, SeatNumber, TrainId};
pub use topic::{carriage_topic, event_topic, topic};
