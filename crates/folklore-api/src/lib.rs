//! Folklore ingestion API.
//!
//! HTTP surface, orchestration services and startup wiring. Exposed as a
//! library so integration tests can assemble the router with in-memory
//! backends.

pub mod api_doc;
pub mod auth;
pub mod constants;
pub mod error;
pub mod handlers;
pub mod services;
pub mod setup;
pub mod state;
pub mod telemetry;
