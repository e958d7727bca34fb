//! Folklore Database Library
//!
//! sqlx/Postgres repositories for the ingestion pipeline. Status transitions
//! are expressed as conditional UPDATEs (claim, complete, fan-in) so that
//! concurrent requests and redelivered worker messages can never move a
//! record backwards.

pub mod db;

pub use db::{DiaryRepository, ResponseRepository, StoryRepository};
