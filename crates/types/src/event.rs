//! Sensor event types and their wire encoding.
//!
//! # Wire Format
//!
//! Every event is a single JSON object. The `event_type` field names the
//! variant, followed by the common header fields and the kind-specific fields:
//!
//! ```text
//! {"event_type":"seat","timestamp":"2024-05-01T08:00:00.000000Z","train":"IC-123","carriage":1,"seat":4,"available":false}
//! ```
//!
//! Field names are the contract with downstream consumers and must not change.

use crate::identifiers::{CarriageId, SeatNumber, TrainId};
use bytes::Bytes;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Errors that can occur during event encoding/decoding.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("JSON encode error: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("JSON decode error: {0}")]
    Decode(#[source] serde_json::Error),
}

/// The three kinds of sensor readings a carriage reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Seat,
    Noise,
    Temperature,
}

impl EventKind {
    /// All kinds, in the order a carriage publishes them each cycle.
    pub const ALL: [EventKind; 3] = [EventKind::Seat, EventKind::Noise, EventKind::Temperature];

    /// Wire name of this kind, also used as the last topic segment.
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Seat => "seat",
            EventKind::Noise => "noise",
            EventKind::Temperature => "temperature",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields shared by every event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventHeader {
    /// Generation time (UTC), RFC 3339 on the wire.
    #[serde(
        serialize_with = "serialize_timestamp",
        deserialize_with = "deserialize_timestamp"
    )]
    pub timestamp: SystemTime,
    pub train: TrainId,
    pub carriage: CarriageId,
}

impl EventHeader {
    /// Header stamped with the current time.
    ///
    /// The timestamp is truncated to the microsecond precision of the wire
    /// format, so a decoded event compares equal to the one that was sent.
    pub fn now(train: TrainId, carriage: CarriageId) -> Self {
        let now = SystemTime::now();
        let sub_micros = now
            .duration_since(UNIX_EPOCH)
            .map(|d| d.subsec_nanos() % 1_000)
            .unwrap_or_default();
        Self {
            timestamp: now - Duration::from_nanos(sub_micros as u64),
            train,
            carriage,
        }
    }
}

/// Seat availability change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeatEvent {
    #[serde(flatten)]
    pub header: EventHeader,
    pub seat: SeatNumber,
    /// `true` when the seat is free.
    pub available: bool,
}

/// Ambient noise reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoiseEvent {
    #[serde(flatten)]
    pub header: EventHeader,
    pub decibel_level: f64,
    pub location: String,
}

/// Temperature and humidity reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureEvent {
    #[serde(flatten)]
    pub header: EventHeader,
    pub temperature_celsius: f64,
    pub humidity: f64,
    pub sensor_location: String,
}

/// A sensor event from one carriage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum Event {
    Seat(SeatEvent),
    Noise(NoiseEvent),
    Temperature(TemperatureEvent),
}

impl Event {
    /// The kind of this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Seat(_) => EventKind::Seat,
            Event::Noise(_) => EventKind::Noise,
            Event::Temperature(_) => EventKind::Temperature,
        }
    }

    /// The common header.
    pub fn header(&self) -> &EventHeader {
        match self {
            Event::Seat(e) => &e.header,
            Event::Noise(e) => &e.header,
            Event::Temperature(e) => &e.header,
        }
    }

    /// Topic this event is published on.
    pub fn topic(&self) -> String {
        let header = self.header();
        crate::topic::event_topic(&header.train, header.carriage, self.kind())
    }

    /// Encode this event to its JSON wire form.
    pub fn encode(&self) -> Result<Bytes, CodecError> {
        serde_json::to_vec(self)
            .map(Bytes::from)
            .map_err(CodecError::Encode)
    }

    /// Decode an event from its JSON wire form.
    pub fn decode(payload: &[u8]) -> Result<Self, CodecError> {
        serde_json::from_slice(payload).map_err(CodecError::Decode)
    }
}

impl From<SeatEvent> for Event {
    fn from(event: SeatEvent) -> Self {
        Event::Seat(event)
    }
}

impl From<NoiseEvent> for Event {
    fn from(event: NoiseEvent) -> Self {
        Event::Noise(event)
    }
}

impl From<TemperatureEvent> for Event {
    fn from(event: TemperatureEvent) -> Self {
        Event::Temperature(event)
    }
}

fn serialize_timestamp<S: Serializer>(ts: &SystemTime, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&humantime::format_rfc3339_micros(*ts))
}

fn deserialize_timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SystemTime, D::Error> {
    let s = String::deserialize(deserializer)?;
    humantime::parse_rfc3339(&s).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn header() -> EventHeader {
        EventHeader {
            timestamp: UNIX_EPOCH + Duration::from_secs(1_714_550_400),
            train: TrainId::new("IC-123"),
            carriage: CarriageId(2),
        }
    }

    fn as_json(event: &Event) -> Value {
        serde_json::from_slice(&event.encode().unwrap()).unwrap()
    }

    #[test]
    fn test_seat_event_wire_fields() {
        let event = Event::Seat(SeatEvent {
            header: header(),
            seat: SeatNumber(4),
            available: false,
        });
        let json = as_json(&event);

        assert_eq!(json["event_type"], "seat");
        assert_eq!(json["timestamp"], "2024-05-01T08:00:00.000000Z");
        assert_eq!(json["train"], "IC-123");
        assert_eq!(json["carriage"], 2);
        assert_eq!(json["seat"], 4);
        assert_eq!(json["available"], false);
        assert_eq!(json.as_object().unwrap().len(), 6);
    }

    #[test]
    fn test_noise_event_wire_fields() {
        let event = Event::Noise(NoiseEvent {
            header: header(),
            decibel_level: 55.5,
            location: "middle".to_string(),
        });
        let json = as_json(&event);

        assert_eq!(json["event_type"], "noise");
        assert_eq!(json["decibel_level"], 55.5);
        assert_eq!(json["location"], "middle");
        assert_eq!(json.as_object().unwrap().len(), 6);
    }

    #[test]
    fn test_temperature_event_wire_fields() {
        let event = Event::Temperature(TemperatureEvent {
            header: header(),
            temperature_celsius: 21.25,
            humidity: 40.5,
            sensor_location: "window".to_string(),
        });
        let json = as_json(&event);

        assert_eq!(json["event_type"], "temperature");
        assert_eq!(json["temperature_celsius"], 21.25);
        assert_eq!(json["humidity"], 40.5);
        assert_eq!(json["sensor_location"], "window");
        assert_eq!(json.as_object().unwrap().len(), 7);
    }

    #[test]
    fn test_decode_restores_kind_and_header() {
        let event = Event::Seat(SeatEvent {
            header: header(),
            seat: SeatNumber(1),
            available: true,
        });
        let decoded = Event::decode(&event.encode().unwrap()).unwrap();

        assert_eq!(decoded.kind(), EventKind::Seat);
        assert_eq!(decoded, event);
    }

    #[test]
    fn test_decode_rejects_unknown_event_type() {
        let payload = br#"{"event_type":"humidity","timestamp":"2024-05-01T08:00:00Z","train":"X","carriage":1}"#;
        assert!(matches!(Event::decode(payload), Err(CodecError::Decode(_))));
    }

    #[test]
    fn test_event_topic_follows_kind() {
        let event = Event::Noise(NoiseEvent {
            header: header(),
            decibel_level: 45.0,
            location: "front".to_string(),
        });
        assert_eq!(event.topic(), "train/IC-123/carriage/2/noise");
    }
}
