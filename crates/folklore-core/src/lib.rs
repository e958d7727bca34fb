//! Folklore Core Library
//!
//! This crate provides the domain models, media classifier, event contract,
//! error types, and configuration shared across all folklore components.

pub mod classifier;
pub mod config;
pub mod error;
pub mod events;
pub mod models;
pub mod summarize;

// Re-export commonly used types
pub use classifier::{classify, MediaClass};
pub use config::{Config, QueueBackend, StorageBackend};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use events::{
    DiaryPageRef, Event, EventEnvelope, EventMetadata, EVENT_SCHEMA_VERSION,
};
