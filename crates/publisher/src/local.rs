//! Human-readable local sink.

use crate::{PublishError, Publisher};
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::io::{self, Stdout, Write};
use std::sync::atomic::{AtomicBool, Ordering};

/// Writes one `PUB {topic} {payload}` line per message.
pub struct LocalPublisher<W: Write + Send> {
    out: Mutex<W>,
    closed: AtomicBool,
}

impl LocalPublisher<Stdout> {
    /// Sink writing to standard output.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> LocalPublisher<W> {
    /// Sink writing to the given writer.
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
            closed: AtomicBool::new(false),
        }
    }

    /// Consume the sink and return the writer.
    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

#[async_trait]
impl<W: Write + Send> Publisher for LocalPublisher<W> {
    async fn publish(&self, topic: &str, payload: Bytes) -> Result<(), PublishError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(PublishError::Closed);
        }
        let mut out = self.out.lock();
        writeln!(out, "PUB {} {}", topic, String::from_utf8_lossy(&payload))?;
        out.flush()?;
        Ok(())
    }

    async fn close(&self) -> Result<(), PublishError> {
        self.closed.store(true, Ordering::Release);
        self.out.lock().flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_writes_pub_lines() {
        let publisher = LocalPublisher::new(Vec::new());
        publisher
            .publish("train/IC-123/carriage/1/seat", Bytes::from_static(b"{\"seat\":1}"))
            .await
            .unwrap();
        publisher
            .publish("train/IC-123/carriage/1/noise", Bytes::from_static(b"{}"))
            .await
            .unwrap();

        let out = String::from_utf8(publisher.into_inner()).unwrap();
        assert_eq!(
            out,
            "PUB train/IC-123/carriage/1/seat {\"seat\":1}\nPUB train/IC-123/carriage/1/noise {}\n"
        );
    }

    #[tokio::test]
    async fn test_publish_after_close_fails() {
        let publisher = LocalPublisher::new(Vec::new());
        publisher.close().await.unwrap();

        let result = publisher.publish("t", Bytes::new()).await;
        assert!(matches!(result, Err(PublishError::Closed)));
        assert!(publisher.into_inner().is_empty());
    }
}
