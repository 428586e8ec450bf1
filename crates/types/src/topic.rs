//! Topic naming.
//!
//! Topics are hierarchical: `train/{train}/carriage/{carriage}` addresses a
//! whole carriage and `train/{train}/carriage/{carriage}/{kind}` one of its
//! event streams.

use crate::event::EventKind;
use crate::identifiers::{CarriageId, TrainId};

/// Topic covering every event stream of a carriage.
pub fn carriage_topic(train: &TrainId, carriage: CarriageId) -> String {
    format!("train/{}/carriage/{}", train, carriage)
}

/// Topic for one event kind of a carriage.
pub fn event_topic(train: &TrainId, carriage: CarriageId, kind: EventKind) -> String {
    format!("{}/{}", carriage_topic(train, carriage), kind.as_str())
}

/// Topic for a carriage, optionally narrowed to one event kind.
pub fn topic(train: &TrainId, carriage: CarriageId, kind: Option<EventKind>) -> String {
    match kind {
        Some(kind) => event_topic(train, carriage, kind),
        None => carriage_topic(train, carriage),
    }
}
