use crate::traits::{EventPublisher, PublishResult};
use async_trait::async_trait;
use folklore_core::EventEnvelope;

/// Log-only publisher for development. Events are serialized and traced at
/// info level but never delivered anywhere.
#[derive(Debug, Clone, Default)]
pub struct LoggingPublisher;

impl LoggingPublisher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EventPublisher for LoggingPublisher {
    async fn publish(&self, envelope: &EventEnvelope) -> PublishResult<()> {
        let body = serde_json::to_string(envelope)?;

        tracing::info!(
            event_id = %envelope.id,
            event_type = %envelope.event.event_type(),
            body = %body,
            "Event published (logging backend)"
        );

        Ok(())
    }
}
