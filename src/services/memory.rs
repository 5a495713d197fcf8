//! In-memory collaborator implementations for tests and local development.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

use crate::error::Result;
use crate::models::{Alert, CompletionResult, NotificationPayload, Strategy};
use crate::services::{
    AlertStore, CompletionGate, CompletionSink, NotificationDispatcher, StrategyRegistry,
    WeightProvider,
};

/// Alert store backed by a plain vector.
#[derive(Default)]
pub struct MemoryAlertStore {
    alerts: Mutex<Vec<Alert>>,
}

impl MemoryAlertStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_alerts(alerts: Vec<Alert>) -> Self {
        Self {
            alerts: Mutex::new(alerts),
        }
    }

    pub fn push(&self, alert: Alert) {
        self.alerts.lock().unwrap().push(alert);
    }
}

#[async_trait]
impl AlertStore for MemoryAlertStore {
    async fn query_alerts(&self, ticker: &str, since: DateTime<Utc>) -> Result<Vec<Alert>> {
        let mut hits: Vec<Alert> = self
            .alerts
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.ticker == ticker && a.timestamp >= since)
            .cloned()
            .collect();
        hits.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(hits)
    }

    async fn query_window(&self, since: DateTime<Utc>) -> Result<Vec<Alert>> {
        let mut hits: Vec<Alert> = self
            .alerts
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.timestamp >= since)
            .cloned()
            .collect();
        hits.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(hits)
    }
}

/// Registry serving a fixed strategy list.
#[derive(Default)]
pub struct MemoryRegistry {
    strategies: Vec<Strategy>,
}

impl MemoryRegistry {
    pub fn new(strategies: Vec<Strategy>) -> Self {
        Self { strategies }
    }
}

#[async_trait]
impl StrategyRegistry for MemoryRegistry {
    async fn list_enabled(&self) -> Result<Vec<Strategy>> {
        Ok(self
            .strategies
            .iter()
            .filter(|s| s.enabled)
            .cloned()
            .collect())
    }
}

/// Static weight table keyed by (indicator display name, trigger).
#[derive(Default)]
pub struct StaticWeights {
    table: HashMap<(String, String), f64>,
}

impl StaticWeights {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, indicator: &str, trigger: &str, weight: f64) -> Self {
        self.table
            .insert((indicator.to_string(), trigger.to_string()), weight);
        self
    }
}

#[async_trait]
impl WeightProvider for StaticWeights {
    async fn weight(&self, indicator: &str, trigger: &str) -> f64 {
        self.table
            .get(&(indicator.to_string(), trigger.to_string()))
            .copied()
            .unwrap_or(0.0)
    }
}

/// Completion sink that keeps records in memory.
#[derive(Default)]
pub struct MemorySink {
    pub completions: Mutex<Vec<CompletionResult>>,
}

#[async_trait]
impl CompletionSink for MemorySink {
    async fn record_completion(&self, result: &CompletionResult) -> Result<()> {
        self.completions.lock().unwrap().push(result.clone());
        Ok(())
    }
}

/// Dispatcher that records payloads instead of delivering them.
#[derive(Default)]
pub struct MemoryDispatcher {
    pub payloads: Mutex<Vec<NotificationPayload>>,
}

#[async_trait]
impl NotificationDispatcher for MemoryDispatcher {
    async fn notify(&self, payload: &NotificationPayload) -> Result<()> {
        self.payloads.lock().unwrap().push(payload.clone());
        Ok(())
    }
}

/// Single-process cooldown gate.
#[derive(Default)]
pub struct MemoryGate {
    claims: Mutex<HashMap<(i64, String), Instant>>,
}

impl MemoryGate {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CompletionGate for MemoryGate {
    async fn try_claim(&self, strategy_id: i64, ticker: &str, window: Duration) -> bool {
        let mut claims = self.claims.lock().unwrap();
        let key = (strategy_id, ticker.to_string());
        let now = Instant::now();
        if let Some(expires) = claims.get(&key) {
            if *expires > now {
                return false;
            }
        }
        claims.insert(key, now + window);
        true
    }
}
