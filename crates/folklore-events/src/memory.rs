use crate::traits::{EventPublisher, PublishError, PublishResult};
use async_trait::async_trait;
use folklore_core::EventEnvelope;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// In-memory publisher used by tests to assert on what the request path
/// enqueued. Can be switched into a failing mode to exercise the
/// publish-failure compensation paths.
#[derive(Debug, Default)]
pub struct InMemoryPublisher {
    published: Mutex<Vec<EventEnvelope>>,
    fail_next: AtomicBool,
}

impl InMemoryPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything published so far, in publish order.
    pub fn published(&self) -> Vec<EventEnvelope> {
        self.published.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.published.lock().unwrap().clear();
    }

    /// Make every subsequent publish fail until switched back off.
    pub fn set_failing(&self, failing: bool) {
        self.fail_next.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl EventPublisher for InMemoryPublisher {
    async fn publish(&self, envelope: &EventEnvelope) -> PublishResult<()> {
        if self.fail_next.load(Ordering::SeqCst) {
            return Err(PublishError::Delivery(
                "in-memory publisher set to failing".to_string(),
            ));
        }

        // Exercise the same serialization path real backends use.
        serde_json::to_string(envelope)?;

        self.published.lock().unwrap().push(envelope.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folklore_core::{Event, EventEnvelope, EventMetadata};
    use uuid::Uuid;

    fn envelope() -> EventEnvelope {
        EventEnvelope::new(
            Event::ResponseTranscribed {
                response_id: Uuid::new_v4(),
                story_id: None,
            },
            EventMetadata {
                user_id: Uuid::new_v4(),
                family_id: Uuid::new_v4(),
                source: "app_text".to_string(),
            },
        )
    }

    #[tokio::test]
    async fn test_captures_published_events_in_order() {
        let publisher = InMemoryPublisher::new();
        let first = envelope();
        let second = envelope();

        publisher.publish(&first).await.unwrap();
        publisher.publish(&second).await.unwrap();

        let published = publisher.published();
        assert_eq!(published.len(), 2);
        assert_eq!(published[0].id, first.id);
        assert_eq!(published[1].id, second.id);
    }

    #[tokio::test]
    async fn test_failing_mode() {
        let publisher = InMemoryPublisher::new();
        publisher.set_failing(true);

        let result = publisher.publish(&envelope()).await;
        assert!(matches!(result, Err(PublishError::Delivery(_))));
        assert!(publisher.published().is_empty());

        publisher.set_failing(false);
        publisher.publish(&envelope()).await.unwrap();
        assert_eq!(publisher.published().len(), 1);
    }
}
