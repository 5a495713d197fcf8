//! Alertrix: a strategy-completion engine for webhook market alerts.
//!
//! Alerts arrive on the API server's webhook endpoint, are stored
//! append-only, and trigger an evaluation pass in the worker: every
//! enabled strategy's AND/OR rule composition is matched against the
//! alerts seen for that ticker inside a bounded time window, scored,
//! classified, and persisted and delivered as a notification once per
//! completion episode.

pub mod config;
pub mod core;
pub mod db;
pub mod error;
pub mod indicators;
pub mod ingest;
pub mod jobs;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod signals;
pub mod strategies;

pub use error::{EngineError, Result};
