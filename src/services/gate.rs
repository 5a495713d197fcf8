//! Redis-backed completion cooldown gate.
//!
//! One key per (strategy, ticker), set NX with the cooldown as TTL. A
//! claim succeeds only when no unexpired key exists, so a completion
//! episode fires once even with several worker processes.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use std::time::Duration;
use tracing::warn;

use crate::error::{EngineError, Result};
use crate::services::CompletionGate;

pub struct RedisGate {
    conn: ConnectionManager,
}

impl RedisGate {
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| EngineError::Lookup(format!("invalid redis url: {}", e)))?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| EngineError::Lookup(format!("redis connection failed: {}", e)))?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl CompletionGate for RedisGate {
    async fn try_claim(&self, strategy_id: i64, ticker: &str, window: Duration) -> bool {
        let key = format!("alertrix:cooldown:{}:{}", strategy_id, ticker);
        let mut conn = self.conn.clone();
        let result: redis::RedisResult<Option<String>> = redis::cmd("SET")
            .arg(&key)
            .arg(1)
            .arg("NX")
            .arg("PX")
            .arg(window.as_millis() as u64)
            .query_async(&mut conn)
            .await;

        match result {
            Ok(Some(_)) => true,
            Ok(None) => false,
            Err(e) => {
                // An unreachable gate must not silence completions.
                warn!(key, error = %e, "cooldown gate unavailable, emitting anyway");
                true
            }
        }
    }
}
