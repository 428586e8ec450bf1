//! Domain-specific identifier types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Train identifier (e.g. `IC-123`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrainId(pub String);

impl TrainId {
    /// Create a train identifier.
    pub fn new(id: impl Into<String>) -> Self {
        TrainId(id.into())
    }

    /// Get the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TrainId {
    fn from(id: &str) -> Self {
        TrainId(id.to_string())
    }
}

impl From<String> for TrainId {
    fn from(id: String) -> Self {
        TrainId(id)
    }
}

/// Carriage number within a train.
///
/// Carriages are numbered from 1, matching the numbering used in topics and
/// on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CarriageId(pub u32);

impl CarriageId {
    /// The first carriage of a train.
    pub const FIRST: Self = CarriageId(1);

    /// Zero-based position of this carriage, for indexing per-carriage arrays.
    pub fn index(self) -> usize {
        (self.0 as usize).saturating_sub(1)
    }

    /// Carriage at the given zero-based position.
    pub fn from_index(index: usize) -> Self {
        CarriageId(index as u32 + 1)
    }

    /// Iterate over the carriages of a train with `count` carriages.
    pub fn all(count: u32) -> impl Iterator<Item = CarriageId> {
        (1..=count).map(CarriageId)
    }
}

impl fmt::Display for CarriageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Seat number within a carriage (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeatNumber(pub u32);

impl SeatNumber {
    /// Seat at the given zero-based position in the seat array.
    pub fn from_index(index: usize) -> Self {
        SeatNumber(index as u32 + 1)
    }

    /// Zero-based position of this seat in the seat array.
    pub fn index(self) -> usize {
        (self.0 as usize).saturating_sub(1)
    }
}

impl fmt::Display for SeatNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Seat({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_carriage_index_round_trip() {
        assert_eq!(CarriageId::from_index(0), CarriageId::FIRST);
        assert_eq!(CarriageId(3).index(), 2);
    }

    #[test]
    fn test_all_carriages_are_one_based() {
        let carriages: Vec<_> = CarriageId::all(3).collect();
        assert_eq!(carriages, vec![CarriageId(1), CarriageId(2), CarriageId(3)]);
    }

    #[test]
    fn test_seat_number_from_index() {
        assert_eq!(SeatNumber::from_index(0), SeatNumber(1));
        assert_eq!(SeatNumber(10).index(), 9);
    }

    #[test]
    fn test_identifiers_serialize_transparently() {
        assert_eq!(serde_json::to_string(&TrainId::new("IC-123")).unwrap(), "\"IC-123\"");
        assert_eq!(serde_json::to_string(&CarriageId(2)).unwrap(), "2");
        assert_eq!(serde_json::to_string(&SeatNumber(7)).unwrap(), "7");
    }
}
