use crate::LoggingPublisher;
#[cfg(feature = "queue-sqs")]
use crate::SqsPublisher;
use crate::{EventPublisher, PublishError, PublishResult};
use folklore_core::{Config, QueueBackend};
use std::sync::Arc;

/// Create an event publisher based on configuration
pub async fn create_publisher(config: &Config) -> PublishResult<Arc<dyn EventPublisher>> {
    match config.queue_backend {
        QueueBackend::Logging => Ok(Arc::new(LoggingPublisher::new())),

        #[cfg(feature = "queue-sqs")]
        QueueBackend::Sqs => {
            let queue_url = config.sqs_queue_url.clone().ok_or_else(|| {
                PublishError::Config("SQS_QUEUE_URL not configured".to_string())
            })?;

            let publisher = SqsPublisher::new(queue_url, config.aws_region.clone()).await?;
            Ok(Arc::new(publisher))
        }

        #[cfg(not(feature = "queue-sqs"))]
        QueueBackend::Sqs => Err(PublishError::Config(
            "SQS queue backend not available (queue-sqs feature not enabled)".to_string(),
        )),
    }
}
