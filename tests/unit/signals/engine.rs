//! Unit tests for the evaluation orchestrator

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

use alertrix::error::{EngineError, Result};
use alertrix::models::{
    Action, Alert, Condition, GroupOperator, RuleComposition, RuleGroup, Strategy, Timeframe,
};
use alertrix::services::memory::{MemoryAlertStore, MemoryGate, MemoryRegistry, StaticWeights};
use alertrix::services::AlertStore;
use alertrix::signals::{EngineConfig, EvaluationEngine};

fn alert(indicator: &str, trigger: &str, minutes_ago: i64, label: &str) -> Alert {
    Alert {
        id: None,
        ticker: "BTCUSDT".to_string(),
        indicator: indicator.to_string(),
        trigger: trigger.to_string(),
        timeframe_label: label.to_string(),
        price: Some(64_230.5),
        timestamp: Utc::now() - Duration::minutes(minutes_ago),
    }
}

fn and_strategy(id: i64, name: &str, timeframe: Timeframe, conditions: Vec<Condition>) -> Strategy {
    Strategy {
        id: Some(id),
        name: name.to_string(),
        enabled: true,
        timeframe,
        threshold_sign: None,
        rules: RuleComposition {
            groups: vec![RuleGroup {
                operator: GroupOperator::And,
                conditions,
            }],
            inter_group_operator: GroupOperator::And,
        },
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn engine(
    store: Arc<MemoryAlertStore>,
    strategies: Vec<Strategy>,
    weights: StaticWeights,
) -> EvaluationEngine {
    EvaluationEngine::new(
        store,
        Arc::new(MemoryRegistry::new(strategies)),
        Arc::new(weights),
        Arc::new(MemoryGate::new()),
        EngineConfig::default(),
    )
}

#[tokio::test]
async fn completed_strategy_yields_scored_completion() {
    let trigger_alert = alert("Nautilus™", "Bullish Divergence", 0, "15");
    let store = Arc::new(MemoryAlertStore::with_alerts(vec![trigger_alert.clone()]));
    let strategies = vec![and_strategy(
        1,
        "Nautilus Divergence",
        Timeframe::FixedMinutes(15),
        vec![Condition::new("nautilus", "Bullish Divergence")],
    )];
    let weights = StaticWeights::new().set("Nautilus™", "Bullish Divergence", 2.5);

    let engine = engine(store, strategies, weights);
    let completions = engine
        .evaluate_alert("BTCUSDT", &trigger_alert)
        .await
        .unwrap();

    assert_eq!(completions.len(), 1);
    let completion = &completions[0];
    assert_eq!(completion.strategy_id, 1);
    assert_eq!(completion.ticker, "BTCUSDT");
    assert_eq!(completion.score, 2.5);
    assert_eq!(completion.action, Action::Buy);
    assert_eq!(completion.price, Some(64_230.5));
    assert!(completion.missing.is_empty());
}

#[tokio::test]
async fn incomplete_strategy_emits_nothing() {
    let trigger_alert = alert("Nautilus™", "Bullish Divergence", 0, "15");
    let store = Arc::new(MemoryAlertStore::with_alerts(vec![trigger_alert.clone()]));
    let strategies = vec![and_strategy(
        1,
        "Two Part Confluence",
        Timeframe::FixedMinutes(15),
        vec![
            Condition::new("nautilus", "Bullish Divergence"),
            Condition::new("extreme_zones", "Discount Zone"),
        ],
    )];

    let engine = engine(store, strategies, StaticWeights::new());
    let completions = engine
        .evaluate_alert("BTCUSDT", &trigger_alert)
        .await
        .unwrap();
    assert!(completions.is_empty());
}

#[tokio::test]
async fn cooldown_gate_suppresses_refire_within_window() {
    let trigger_alert = alert("Nautilus™", "Bullish Divergence", 0, "15");
    let store = Arc::new(MemoryAlertStore::with_alerts(vec![trigger_alert.clone()]));
    let strategies = vec![and_strategy(
        1,
        "Nautilus Divergence",
        Timeframe::FixedMinutes(15),
        vec![Condition::new("nautilus", "Bullish Divergence")],
    )];

    let engine = engine(store, strategies, StaticWeights::new());
    let first = engine
        .evaluate_alert("BTCUSDT", &trigger_alert)
        .await
        .unwrap();
    assert_eq!(first.len(), 1);

    // A reconfirming alert inside the window must not re-fire.
    let second = engine
        .evaluate_alert("BTCUSDT", &trigger_alert)
        .await
        .unwrap();
    assert!(second.is_empty());
}

#[tokio::test]
async fn cooldown_is_scoped_per_ticker() {
    let btc_alert = alert("Nautilus™", "Bullish Divergence", 0, "15");
    let mut eth_alert = btc_alert.clone();
    eth_alert.ticker = "ETHUSDT".to_string();
    let store = Arc::new(MemoryAlertStore::with_alerts(vec![
        btc_alert.clone(),
        eth_alert.clone(),
    ]));
    let strategies = vec![and_strategy(
        1,
        "Nautilus Divergence",
        Timeframe::FixedMinutes(15),
        vec![Condition::new("nautilus", "Bullish Divergence")],
    )];

    let engine = engine(store, strategies, StaticWeights::new());
    assert_eq!(
        engine.evaluate_alert("BTCUSDT", &btc_alert).await.unwrap().len(),
        1
    );
    assert_eq!(
        engine.evaluate_alert("ETHUSDT", &eth_alert).await.unwrap().len(),
        1
    );
}

/// Store whose reads always fail, for exercising per-strategy isolation.
struct FailingStore;

#[async_trait]
impl AlertStore for FailingStore {
    async fn query_alerts(&self, _ticker: &str, _since: DateTime<Utc>) -> Result<Vec<Alert>> {
        Err(EngineError::Lookup("store unreachable".to_string()))
    }

    async fn query_window(&self, _since: DateTime<Utc>) -> Result<Vec<Alert>> {
        Err(EngineError::Lookup("store unreachable".to_string()))
    }
}

#[tokio::test]
async fn store_failures_are_contained_per_strategy() {
    let trigger_alert = alert("Nautilus™", "Bullish Divergence", 0, "15");
    let strategies = vec![
        and_strategy(
            1,
            "First",
            Timeframe::FixedMinutes(15),
            vec![Condition::new("nautilus", "Bullish Divergence")],
        ),
        and_strategy(
            2,
            "Second",
            Timeframe::FixedMinutes(15),
            vec![Condition::new("nautilus", "Bullish Divergence")],
        ),
    ];

    let engine = EvaluationEngine::new(
        Arc::new(FailingStore),
        Arc::new(MemoryRegistry::new(strategies)),
        Arc::new(StaticWeights::new()),
        Arc::new(MemoryGate::new()),
        EngineConfig::default(),
    );

    // Every strategy's lookup fails; the pass itself still succeeds with
    // no completions rather than propagating the store error.
    let completions = engine
        .evaluate_alert("BTCUSDT", &trigger_alert)
        .await
        .unwrap();
    assert!(completions.is_empty());
}

#[tokio::test]
async fn disabled_strategies_are_not_evaluated() {
    let trigger_alert = alert("Nautilus™", "Bullish Divergence", 0, "15");
    let store = Arc::new(MemoryAlertStore::with_alerts(vec![trigger_alert.clone()]));
    let mut disabled = and_strategy(
        1,
        "Nautilus Divergence",
        Timeframe::FixedMinutes(15),
        vec![Condition::new("nautilus", "Bullish Divergence")],
    );
    disabled.enabled = false;

    let engine = engine(store, vec![disabled], StaticWeights::new());
    let completions = engine
        .evaluate_alert("BTCUSDT", &trigger_alert)
        .await
        .unwrap();
    assert!(completions.is_empty());
}

#[tokio::test]
async fn scoreboard_picks_ticker_with_most_matches() {
    let mut alerts = vec![
        alert("Nautilus™", "Bullish Divergence", 5, "15"),
        alert("Extreme Zones", "Discount Zone", 8, "15"),
    ];
    let mut eth = alert("Nautilus™", "Bullish Divergence", 3, "15");
    eth.ticker = "ETHUSDT".to_string();
    alerts.push(eth);
    let store = Arc::new(MemoryAlertStore::with_alerts(alerts));

    let strategies = vec![and_strategy(
        1,
        "Two Part Confluence",
        Timeframe::Any,
        vec![
            Condition::new("nautilus", "Bullish Divergence"),
            Condition::new("extreme_zones", "Discount Zone"),
        ],
    )];
    let weights = StaticWeights::new()
        .set("Nautilus™", "Bullish Divergence", 2.0)
        .set("Extreme Zones", "Discount Zone", 1.5);

    let engine = engine(store, strategies, weights);
    let rows = engine.score_all_strategies(60).await.unwrap();

    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    // BTCUSDT matches both conditions, ETHUSDT only one.
    assert_eq!(row.ticker, "BTCUSDT");
    assert!(row.is_complete);
    assert_eq!(row.matched.len(), 2);
    assert_eq!(row.score, 3.5);
}

#[tokio::test]
async fn scoreboard_returns_no_row_without_alerts() {
    let store = Arc::new(MemoryAlertStore::new());
    let strategies = vec![and_strategy(
        1,
        "Two Part Confluence",
        Timeframe::Any,
        vec![Condition::new("nautilus", "Bullish Divergence")],
    )];

    let engine = engine(store, strategies, StaticWeights::new());
    let rows = engine.score_all_strategies(60).await.unwrap();
    assert!(rows.is_empty());
}
