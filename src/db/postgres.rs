//! Postgres persistence for alerts, strategies, weights and completions.

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use chrono::{DateTime, Utc};
use tokio_postgres::{Client, NoTls, Row};
use tracing::{error, warn};

use crate::config;
use crate::error::{EngineError, Result};
use crate::models::{
    Action, Alert, CompletionResult, RuleSpec, SearchWindow, Strategy, Timeframe, TimeframeBucket,
};
use crate::services::{AlertStore, CompletionSink, StrategyRegistry, WeightProvider};

pub struct PostgresStore {
    client: Client,
}

impl PostgresStore {
    /// Connect using `DATABASE_URL`, retrying with exponential backoff, and
    /// create the schema if missing.
    pub async fn new() -> Result<Self> {
        let url = config::get_database_url();
        let (client, connection) = (|| async { tokio_postgres::connect(&url, NoTls).await })
            .retry(ExponentialBuilder::default())
            .notify(|err, dur| {
                warn!(error = %err, retry_in = ?dur, "database connection failed, retrying");
            })
            .await?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!(error = %e, "postgres connection error");
            }
        });

        let store = Self { client };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<()> {
        self.client
            .batch_execute(
                "CREATE TABLE IF NOT EXISTS alerts (
                    id BIGSERIAL PRIMARY KEY,
                    ticker TEXT NOT NULL,
                    indicator TEXT NOT NULL,
                    trigger_name TEXT NOT NULL,
                    timeframe_label TEXT NOT NULL,
                    price DOUBLE PRECISION,
                    received_at TIMESTAMPTZ NOT NULL
                );
                CREATE INDEX IF NOT EXISTS alerts_ticker_time_idx
                    ON alerts (ticker, received_at DESC);

                CREATE TABLE IF NOT EXISTS strategies (
                    id BIGSERIAL PRIMARY KEY,
                    name TEXT NOT NULL,
                    enabled BOOLEAN NOT NULL DEFAULT TRUE,
                    timeframe_minutes BIGINT,
                    threshold_sign SMALLINT,
                    rules_json TEXT NOT NULL,
                    created_at TIMESTAMPTZ NOT NULL,
                    updated_at TIMESTAMPTZ NOT NULL
                );

                CREATE TABLE IF NOT EXISTS condition_weights (
                    indicator TEXT NOT NULL,
                    trigger_name TEXT NOT NULL,
                    weight DOUBLE PRECISION NOT NULL,
                    PRIMARY KEY (indicator, trigger_name)
                );

                CREATE TABLE IF NOT EXISTS completions (
                    id BIGSERIAL PRIMARY KEY,
                    strategy_id BIGINT NOT NULL,
                    strategy_name TEXT NOT NULL,
                    ticker TEXT NOT NULL,
                    timeframe_used TEXT NOT NULL,
                    matched_json TEXT NOT NULL,
                    missing_json TEXT NOT NULL,
                    score DOUBLE PRECISION NOT NULL,
                    action TEXT NOT NULL,
                    price DOUBLE PRECISION,
                    completed_at TIMESTAMPTZ NOT NULL
                );",
            )
            .await?;
        Ok(())
    }

    /// Append one alert, returning its generated id.
    pub async fn insert_alert(&self, alert: &Alert) -> Result<i64> {
        let row = self
            .client
            .query_one(
                "INSERT INTO alerts (ticker, indicator, trigger_name, timeframe_label, price, received_at)
                 VALUES ($1, $2, $3, $4, $5, $6)
                 RETURNING id",
                &[
                    &alert.ticker,
                    &alert.indicator,
                    &alert.trigger,
                    &alert.timeframe_label,
                    &alert.price,
                    &alert.timestamp,
                ],
            )
            .await?;
        Ok(row.get(0))
    }

    pub async fn create_strategy(&self, strategy: &Strategy) -> Result<i64> {
        let rules_json = serde_json::to_string(&strategy.rules)?;
        let row = self
            .client
            .query_one(
                "INSERT INTO strategies (name, enabled, timeframe_minutes, threshold_sign, rules_json, created_at, updated_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)
                 RETURNING id",
                &[
                    &strategy.name,
                    &strategy.enabled,
                    &strategy.timeframe.fixed_minutes(),
                    &strategy.threshold_sign,
                    &rules_json,
                    &strategy.created_at,
                    &strategy.updated_at,
                ],
            )
            .await?;
        Ok(row.get(0))
    }

    pub async fn get_strategy(&self, id: i64) -> Result<Strategy> {
        let row = self
            .client
            .query_opt(
                "SELECT id, name, enabled, timeframe_minutes, threshold_sign, rules_json, created_at, updated_at
                 FROM strategies WHERE id = $1",
                &[&id],
            )
            .await?
            .ok_or_else(|| EngineError::Lookup(format!("strategy {} not found", id)))?;
        row_to_strategy(&row)
    }

    pub async fn get_strategies(&self) -> Result<Vec<Strategy>> {
        let rows = self
            .client
            .query(
                "SELECT id, name, enabled, timeframe_minutes, threshold_sign, rules_json, created_at, updated_at
                 FROM strategies ORDER BY id",
                &[],
            )
            .await?;
        rows.iter().map(row_to_strategy).collect()
    }

    pub async fn update_strategy(&self, id: i64, strategy: &Strategy) -> Result<()> {
        let rules_json = serde_json::to_string(&strategy.rules)?;
        let updated = self
            .client
            .execute(
                "UPDATE strategies
                 SET name = $2, enabled = $3, timeframe_minutes = $4, threshold_sign = $5,
                     rules_json = $6, updated_at = $7
                 WHERE id = $1",
                &[
                    &id,
                    &strategy.name,
                    &strategy.enabled,
                    &strategy.timeframe.fixed_minutes(),
                    &strategy.threshold_sign,
                    &rules_json,
                    &strategy.updated_at,
                ],
            )
            .await?;
        if updated == 0 {
            return Err(EngineError::Lookup(format!("strategy {} not found", id)));
        }
        Ok(())
    }

    pub async fn delete_strategy(&self, id: i64) -> Result<()> {
        let deleted = self
            .client
            .execute("DELETE FROM strategies WHERE id = $1", &[&id])
            .await?;
        if deleted == 0 {
            return Err(EngineError::Lookup(format!("strategy {} not found", id)));
        }
        Ok(())
    }

    pub async fn upsert_weight(&self, indicator: &str, trigger: &str, weight: f64) -> Result<()> {
        self.client
            .execute(
                "INSERT INTO condition_weights (indicator, trigger_name, weight)
                 VALUES ($1, $2, $3)
                 ON CONFLICT (indicator, trigger_name) DO UPDATE SET weight = EXCLUDED.weight",
                &[&indicator, &trigger, &weight],
            )
            .await?;
        Ok(())
    }

    pub async fn list_completions(&self, limit: i64) -> Result<Vec<CompletionResult>> {
        let rows = self
            .client
            .query(
                "SELECT strategy_id, strategy_name, ticker, timeframe_used, matched_json,
                        missing_json, score, action, price, completed_at
                 FROM completions ORDER BY completed_at DESC LIMIT $1",
                &[&limit],
            )
            .await?;
        rows.iter().map(row_to_completion).collect()
    }
}

fn row_to_strategy(row: &Row) -> Result<Strategy> {
    let timeframe = match row.get::<_, Option<i64>>("timeframe_minutes") {
        Some(minutes) => Timeframe::FixedMinutes(minutes),
        None => Timeframe::Any,
    };
    let rules_json: String = row.get("rules_json");
    let spec: RuleSpec = serde_json::from_str(&rules_json)?;

    Ok(Strategy {
        id: Some(row.get("id")),
        name: row.get("name"),
        enabled: row.get("enabled"),
        timeframe,
        threshold_sign: row.get("threshold_sign"),
        rules: spec.normalize(),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn row_to_completion(row: &Row) -> Result<CompletionResult> {
    let timeframe_label: String = row.get("timeframe_used");
    let action = match row.get::<_, String>("action").as_str() {
        "Buy" => Action::Buy,
        _ => Action::Sell,
    };
    Ok(CompletionResult {
        strategy_id: row.get("strategy_id"),
        strategy_name: row.get("strategy_name"),
        ticker: row.get("ticker"),
        timeframe_used: parse_window_label(&timeframe_label),
        matched: serde_json::from_str(&row.get::<_, String>("matched_json"))?,
        missing: serde_json::from_str(&row.get::<_, String>("missing_json"))?,
        score: row.get("score"),
        action,
        price: row.get("price"),
        timestamp: row.get("completed_at"),
    })
}

/// Completions store the window as its display label; map known bucket
/// labels back, anything else is a fixed-minutes window.
fn parse_window_label(label: &str) -> SearchWindow {
    for bucket in TimeframeBucket::ALL {
        if bucket.label() == label {
            return SearchWindow::Bucket(bucket);
        }
    }
    let minutes = label
        .strip_suffix('m')
        .and_then(|n| n.parse().ok())
        .unwrap_or(0);
    SearchWindow::FixedMinutes(minutes)
}

#[async_trait]
impl AlertStore for PostgresStore {
    async fn query_alerts(&self, ticker: &str, since: DateTime<Utc>) -> Result<Vec<Alert>> {
        let rows = self
            .client
            .query(
                "SELECT id, ticker, indicator, trigger_name, timeframe_label, price, received_at
                 FROM alerts
                 WHERE ticker = $1 AND received_at >= $2
                 ORDER BY received_at DESC",
                &[&ticker, &since],
            )
            .await?;
        Ok(rows.iter().map(row_to_alert).collect())
    }

    async fn query_window(&self, since: DateTime<Utc>) -> Result<Vec<Alert>> {
        let rows = self
            .client
            .query(
                "SELECT id, ticker, indicator, trigger_name, timeframe_label, price, received_at
                 FROM alerts
                 WHERE received_at >= $1
                 ORDER BY received_at DESC",
                &[&since],
            )
            .await?;
        Ok(rows.iter().map(row_to_alert).collect())
    }
}

fn row_to_alert(row: &Row) -> Alert {
    Alert {
        id: Some(row.get("id")),
        ticker: row.get("ticker"),
        indicator: row.get("indicator"),
        trigger: row.get("trigger_name"),
        timeframe_label: row.get("timeframe_label"),
        price: row.get("price"),
        timestamp: row.get("received_at"),
    }
}

#[async_trait]
impl StrategyRegistry for PostgresStore {
    async fn list_enabled(&self) -> Result<Vec<Strategy>> {
        let rows = self
            .client
            .query(
                "SELECT id, name, enabled, timeframe_minutes, threshold_sign, rules_json, created_at, updated_at
                 FROM strategies WHERE enabled ORDER BY id",
                &[],
            )
            .await?;
        rows.iter().map(row_to_strategy).collect()
    }
}

#[async_trait]
impl WeightProvider for PostgresStore {
    /// Infallible by contract: lookup failures are logged and score 0.
    async fn weight(&self, indicator: &str, trigger: &str) -> f64 {
        let result = self
            .client
            .query_opt(
                "SELECT weight FROM condition_weights WHERE indicator = $1 AND trigger_name = $2",
                &[&indicator, &trigger],
            )
            .await;
        match result {
            Ok(Some(row)) => row.get(0),
            Ok(None) => 0.0,
            Err(e) => {
                warn!(indicator, trigger, error = %e, "weight lookup failed, scoring 0");
                0.0
            }
        }
    }
}

#[async_trait]
impl CompletionSink for PostgresStore {
    async fn record_completion(&self, result: &CompletionResult) -> Result<()> {
        self.client
            .execute(
                "INSERT INTO completions (strategy_id, strategy_name, ticker, timeframe_used,
                        matched_json, missing_json, score, action, price, completed_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
                &[
                    &result.strategy_id,
                    &result.strategy_name,
                    &result.ticker,
                    &result.timeframe_used.label(),
                    &serde_json::to_string(&result.matched)?,
                    &serde_json::to_string(&result.missing)?,
                    &result.score,
                    &result.action.to_string(),
                    &result.price,
                    &result.timestamp,
                ],
            )
            .await?;
        Ok(())
    }
}
