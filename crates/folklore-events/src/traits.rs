//! Publisher abstraction
//!
//! The ingestion services depend on this trait, never a concrete queue
//! client, so tests can swap in an in-memory publisher and capture exactly
//! what would have been enqueued.

use async_trait::async_trait;
use folklore_core::EventEnvelope;
use thiserror::Error;

/// Publish operation errors
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Failed to serialize event: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to deliver event: {0}")]
    Delivery(String),

    #[error("Publisher configuration error: {0}")]
    Config(String),
}

/// Result type for publish operations
pub type PublishResult<T> = Result<T, PublishError>;

/// Event queue abstraction.
///
/// Delivery is at-least-once; consumers deduplicate on the envelope `id`.
/// Callers on the request path treat publish failures as non-fatal: the
/// durable record is the source of truth and processing can be re-triggered.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, envelope: &EventEnvelope) -> PublishResult<()>;
}
