//! Publish sinks for simulator events.
//!
//! The simulator hands every encoded event to a [`Publisher`] together with its
//! topic. Sinks never retry: a failed publish is reported to the caller, which
//! logs it and carries on.
//!
//! - [`LocalPublisher`]: writes `PUB {topic} {payload}` lines to stdout or any writer
//! - [`MqttPublisher`]: publishes to an MQTT broker
//! - `MemoryPublisher` (feature `test-utils`): records messages in memory

mod local;
#[cfg(any(test, feature = "test-utils"))]
mod memory;
pub mod mqtt;

pub use local::LocalPublisher;
#[cfg(any(test, feature = "test-utils"))]
pub use memory::{MemoryPublisher, PublishedMessage};
pub use mqtt::{BrokerAddress, MqttConfig, MqttPublisher};

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Errors that can occur while publishing.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("MQTT client error: {0}")]
    Client(#[from] rumqttc::ClientError),

    #[error("MQTT connection error: {0}")]
    Connection(#[from] rumqttc::ConnectionError),

    #[error("Timed out connecting to broker {0}")]
    ConnectTimeout(String),

    #[error("Invalid broker URL {url:?}: {reason}")]
    InvalidBrokerUrl { url: String, reason: String },

    #[error("Invalid QoS level {0}, expected 0, 1 or 2")]
    InvalidQos(u8),

    #[error("Publisher is closed")]
    Closed,
}

/// A destination for encoded events.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publish one payload on a topic.
    async fn publish(&self, topic: &str, payload: Bytes) -> Result<(), PublishError>;

    /// Flush and release the sink. Later publishes fail with [`PublishError::Closed`].
    async fn close(&self) -> Result<(), PublishError>;
}
