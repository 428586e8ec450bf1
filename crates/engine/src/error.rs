//! Error types for the engine.

use thiserror::Error;

/// Errors detected while validating a [`SimConfig`](crate::SimConfig).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Train identifier is empty.
    #[error("Train identifier must not be empty")]
    EmptyTrainId,

    /// Train identifier contains a character that is reserved in topics.
    #[error("Train identifier {0:?} contains a reserved topic character ('/', '+' or '#')")]
    ReservedTopicCharacter(String),

    /// A train needs at least one carriage.
    #[error("Carriage count must be positive")]
    NoCarriages,

    /// A carriage needs at least one seat.
    #[error("Seats per carriage must be positive")]
    NoSeats,
}
