//! Request-path services: ingestion gateway, diary orchestrator, and the
//! read-only status projections.

pub mod diary;
pub mod ingest;
pub mod status;
