use crate::traits::{EventPublisher, PublishError, PublishResult};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_sqs::config::Region;
use aws_sdk_sqs::types::MessageAttributeValue;
use folklore_core::EventEnvelope;

/// SQS publisher. The envelope is sent as the JSON message body, with the
/// event type duplicated into a message attribute so consumers can route
/// without parsing the body.
#[derive(Clone)]
pub struct SqsPublisher {
    client: aws_sdk_sqs::Client,
    queue_url: String,
}

impl SqsPublisher {
    pub async fn new(queue_url: String, region: Option<String>) -> PublishResult<Self> {
        if queue_url.trim().is_empty() {
            return Err(PublishError::Config("SQS queue URL is empty".to_string()));
        }

        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(Region::new(region));
        }
        let shared_config = loader.load().await;

        Ok(SqsPublisher {
            client: aws_sdk_sqs::Client::new(&shared_config),
            queue_url,
        })
    }
}

#[async_trait]
impl EventPublisher for SqsPublisher {
    async fn publish(&self, envelope: &EventEnvelope) -> PublishResult<()> {
        let body = serde_json::to_string(envelope)?;
        let event_type = envelope.event.event_type();
        let start = std::time::Instant::now();

        let type_attribute = MessageAttributeValue::builder()
            .data_type("String")
            .string_value(event_type)
            .build()
            .map_err(|e| PublishError::Config(e.to_string()))?;

        self.client
            .send_message()
            .queue_url(&self.queue_url)
            .message_body(body)
            .message_attributes("event_type", type_attribute)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    event_id = %envelope.id,
                    event_type = %event_type,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "SQS publish failed"
                );
                PublishError::Delivery(e.to_string())
            })?;

        tracing::info!(
            event_id = %envelope.id,
            event_type = %event_type,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "SQS publish successful"
        );

        Ok(())
    }
}
