//! Apalis job chain between ingestion and evaluation.

pub mod context;
pub mod handlers;
pub mod types;
