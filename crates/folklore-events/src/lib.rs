//! Folklore Events Library
//!
//! This crate provides the event publisher abstraction and implementations
//! for handing [`folklore_core::EventEnvelope`]s to background workers. It
//! includes an SQS backend, a log-only development backend, and an in-memory
//! backend for tests.

pub mod factory;
pub mod logging;
pub mod memory;
#[cfg(feature = "queue-sqs")]
pub mod sqs;
pub mod traits;

// Re-export commonly used types
pub use factory::create_publisher;
pub use folklore_core::QueueBackend;
pub use logging::LoggingPublisher;
pub use memory::InMemoryPublisher;
#[cfg(feature = "queue-sqs")]
pub use sqs::SqsPublisher;
pub use traits::{EventPublisher, PublishError, PublishResult};
