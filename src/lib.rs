//! Asynchronous notification fan-out for comment events.
//!
//! The comment backend submits created comments without waiting; a single
//! worker per [`notify::NotifyService`] delivers them to every configured
//! destination concurrently.

// Core
pub mod destinations;
pub mod notify;

// Infrastructure
pub mod config;
pub mod error;
pub mod metrics;
pub mod telemetry;

// Application layer
pub mod api;
pub mod server;
pub mod triggers;

// Supporting modules
pub mod shutdown;
