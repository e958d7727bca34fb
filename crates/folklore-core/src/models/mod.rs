//! Data models for the ingestion pipeline
//!
//! This module contains the durable record types and their API response
//! shapes, organized by domain.

mod diary;
mod response;
mod story;

pub use crate::classifier::MediaClass;
pub use diary::*;
pub use response::*;
pub use story::*;
