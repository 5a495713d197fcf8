//! Collaborator interfaces the evaluation engine depends on.
//!
//! The core only ever talks to these traits; Postgres, Redis and the chat
//! webhook are adapters wired in at startup.

pub mod gate;
pub mod memory;
pub mod notifier;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::error::Result;
use crate::models::{Alert, CompletionResult, NotificationPayload, Strategy};

/// Append-only alert source.
#[async_trait]
pub trait AlertStore: Send + Sync {
    /// Alerts for one ticker at or after `since`, newest first.
    async fn query_alerts(&self, ticker: &str, since: DateTime<Utc>) -> Result<Vec<Alert>>;

    /// Alerts across all tickers at or after `since`, newest first. Feeds
    /// the dashboard sweep.
    async fn query_window(&self, since: DateTime<Utc>) -> Result<Vec<Alert>>;
}

/// Source of enabled strategy definitions. Rule shapes are normalized at
/// read time; consumers never see the legacy flat form.
#[async_trait]
pub trait StrategyRegistry: Send + Sync {
    async fn list_enabled(&self) -> Result<Vec<Strategy>>;
}

/// Lookup table mapping (indicator, trigger) to a numeric weight.
///
/// Infallible by contract: unknown pairs and provider failures both yield
/// 0, never an error.
#[async_trait]
pub trait WeightProvider: Send + Sync {
    async fn weight(&self, indicator: &str, trigger: &str) -> f64;
}

/// Persistence sink for completion records.
#[async_trait]
pub trait CompletionSink: Send + Sync {
    async fn record_completion(&self, result: &CompletionResult) -> Result<()>;
}

/// Outbound delivery of a completion payload. Best-effort only.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn notify(&self, payload: &NotificationPayload) -> Result<()>;
}

/// Cooldown gate suppressing repeat completions for the same
/// (strategy, ticker) while a prior completion's window is still open.
#[async_trait]
pub trait CompletionGate: Send + Sync {
    /// Claim the right to emit a completion. Returns `false` while an
    /// earlier claim's window has not yet expired.
    async fn try_claim(&self, strategy_id: i64, ticker: &str, window: Duration) -> bool;
}
