//! Evaluation orchestrator: fans one ingested alert out across all enabled
//! strategies and collects completion records.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use futures_util::stream::{self, StreamExt};
use std::collections::HashMap;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::models::{Alert, CompletionResult, ScoreboardRow, Strategy};
use crate::services::{AlertStore, CompletionGate, StrategyRegistry, WeightProvider};
use crate::signals::classify::{ActionClassifier, TokenHeuristicClassifier};
use crate::signals::scoring;
use crate::signals::search::TimeframeSearch;
use crate::strategies::RuleMatcher;

/// Tuning knobs for one orchestrator pass.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum strategies evaluated concurrently. Each evaluation issues
    /// its own store reads, so this bounds pressure on the alert store.
    pub concurrency: usize,
    /// Overall pass deadline. Strategies not evaluated in time are skipped
    /// for this pass; no partial completion is emitted.
    pub deadline: StdDuration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            concurrency: 8,
            deadline: StdDuration::from_millis(10_000),
        }
    }
}

/// Top-level evaluation engine.
///
/// Strategies are evaluated as independent read-only snapshots fanned out
/// over a bounded pool; results are collected from the stream, never
/// through shared mutable accumulation.
pub struct EvaluationEngine {
    store: Arc<dyn AlertStore>,
    registry: Arc<dyn StrategyRegistry>,
    weights: Arc<dyn WeightProvider>,
    gate: Arc<dyn CompletionGate>,
    classifier: Arc<dyn ActionClassifier>,
    config: EngineConfig,
}

impl EvaluationEngine {
    pub fn new(
        store: Arc<dyn AlertStore>,
        registry: Arc<dyn StrategyRegistry>,
        weights: Arc<dyn WeightProvider>,
        gate: Arc<dyn CompletionGate>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            registry,
            weights,
            gate,
            classifier: Arc::new(TokenHeuristicClassifier),
            config,
        }
    }

    /// Swap the directional classifier (e.g. for an explicit-tag scheme).
    pub fn with_classifier(mut self, classifier: Arc<dyn ActionClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// One orchestrator pass for a newly stored alert.
    ///
    /// Returns the completion records that cleared the cooldown gate. The
    /// caller forwards them to persistence and notification; neither write
    /// happens here.
    pub async fn evaluate_alert(&self, ticker: &str, alert: &Alert) -> Result<Vec<CompletionResult>> {
        let strategies = self.registry.list_enabled().await?;
        let total = strategies.len();
        let now = Utc::now();
        let deadline = Instant::now() + self.config.deadline;

        let mut results = stream::iter(
            strategies
                .into_iter()
                .map(|s| self.evaluate_strategy(s, ticker, alert.price, now)),
        )
        .buffer_unordered(self.config.concurrency.max(1));

        let mut completions = Vec::new();
        let mut evaluated = 0usize;
        loop {
            match timeout_at(deadline, results.next()).await {
                Ok(Some(result)) => {
                    evaluated += 1;
                    if let Some(completion) = result {
                        completions.push(completion);
                    }
                }
                Ok(None) => break,
                Err(_) => {
                    warn!(
                        ticker,
                        evaluated,
                        skipped = total - evaluated,
                        "evaluation deadline reached, skipping remaining strategies"
                    );
                    break;
                }
            }
        }

        let mut emitted = Vec::new();
        for completion in completions {
            let window =
                StdDuration::from_secs((completion.timeframe_used.minutes().max(0) as u64) * 60);
            if self
                .gate
                .try_claim(completion.strategy_id, &completion.ticker, window)
                .await
            {
                info!(
                    ticker = %completion.ticker,
                    strategy = %completion.strategy_name,
                    timeframe = %completion.timeframe_used,
                    score = completion.score,
                    action = %completion.action,
                    "strategy completed"
                );
                emitted.push(completion);
            } else {
                debug!(
                    ticker = %completion.ticker,
                    strategy = %completion.strategy_name,
                    "completion suppressed by cooldown gate"
                );
            }
        }
        Ok(emitted)
    }

    /// Evaluate a single strategy snapshot. Failures are logged and yield
    /// `None`; they never abort sibling evaluations.
    async fn evaluate_strategy(
        &self,
        strategy: Strategy,
        ticker: &str,
        price: Option<f64>,
        now: DateTime<Utc>,
    ) -> Option<CompletionResult> {
        let Some(strategy_id) = strategy.id else {
            warn!(strategy = %strategy.name, "enabled strategy without id, skipping");
            return None;
        };

        let outcome = match TimeframeSearch::search(self.store.as_ref(), &strategy, ticker, now).await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(
                    ticker,
                    strategy = %strategy.name,
                    error = %e,
                    "strategy evaluation failed, omitting from this pass"
                );
                return None;
            }
        };

        if !outcome.is_complete {
            debug!(
                ticker,
                strategy = %strategy.name,
                matched = outcome.matched.len(),
                missing = outcome.missing.len(),
                "strategy incomplete"
            );
            return None;
        }

        let score = scoring::score_conditions(&outcome.matched, self.weights.as_ref()).await;
        let action = self.classifier.classify(&strategy, &outcome.matched);

        Some(CompletionResult {
            strategy_id,
            strategy_name: strategy.name,
            ticker: ticker.to_string(),
            timeframe_used: outcome.timeframe_used,
            matched: outcome.matched,
            missing: outcome.missing,
            score,
            action,
            price,
            timestamp: now,
        })
    }

    /// Pull-based dashboard view: for every enabled strategy, match against
    /// each ticker seen in the window and keep the ticker with the most
    /// matched conditions as the representative row.
    ///
    /// Ties go to the first ticker encountered; grouping preserves
    /// first-appearance order of the store's newest-first listing, so the
    /// result is deterministic for a given snapshot.
    pub async fn score_all_strategies(&self, window_minutes: i64) -> Result<Vec<ScoreboardRow>> {
        let strategies = self.registry.list_enabled().await?;
        let since = Utc::now() - Duration::minutes(window_minutes);
        let alerts = self.store.query_window(since).await?;

        let mut ticker_order: Vec<String> = Vec::new();
        let mut by_ticker: HashMap<String, Vec<Alert>> = HashMap::new();
        for alert in alerts {
            if !by_ticker.contains_key(&alert.ticker) {
                ticker_order.push(alert.ticker.clone());
            }
            by_ticker.entry(alert.ticker.clone()).or_default().push(alert);
        }

        let mut rows = Vec::with_capacity(strategies.len());
        for strategy in &strategies {
            let mut best: Option<(String, crate::models::MatchOutcome)> = None;
            for ticker in &ticker_order {
                let candidates = &by_ticker[ticker];
                let outcome = RuleMatcher::match_rules(&strategy.rules, candidates);
                let improves = best
                    .as_ref()
                    .map_or(true, |(_, b)| outcome.matched.len() > b.matched.len());
                if improves {
                    best = Some((ticker.clone(), outcome));
                }
            }

            if let Some((ticker, outcome)) = best {
                let score = scoring::score_conditions(&outcome.matched, self.weights.as_ref()).await;
                rows.push(ScoreboardRow {
                    strategy_id: strategy.id,
                    strategy_name: strategy.name.clone(),
                    ticker,
                    matched: outcome.matched,
                    missing: outcome.missing,
                    score,
                    is_complete: outcome.is_complete,
                });
            }
        }
        Ok(rows)
    }
}
