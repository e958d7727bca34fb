//! Folklore Storage Library
//!
//! This crate provides the blob storage abstraction and implementations for
//! the ingestion pipeline. It includes the ObjectStorage trait and backends
//! for S3 and the local filesystem.
//!
//! # Storage key format
//!
//! All backends share the same key layout, built by the [`keys`] module:
//!
//! - **Responses**: `responses/{user_id}/{timestamp_ms}_{sanitized_filename}`
//! - **Diary pages**: `diary/{upload_id}/diary_{upload_id}_page_{page_order}.jpg`
//!
//! Diary page keys are derivable from `(upload_id, page_order)` alone. Keys
//! must not contain `..` or a leading `/`.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use folklore_core::StorageBackend;
pub use keys::{diary_page_key, response_key, sanitize_filename};
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{ObjectStorage, StorageError, StorageResult};
