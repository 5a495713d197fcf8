//! Unit tests for the timeframe search controller

use chrono::{DateTime, Duration, Utc};

use alertrix::models::{
    Alert, Condition, GroupOperator, RuleComposition, RuleGroup, SearchWindow, Strategy, Timeframe,
    TimeframeBucket,
};
use alertrix::services::memory::MemoryAlertStore;
use alertrix::signals::TimeframeSearch;

fn alert(indicator: &str, trigger: &str, minutes_ago: i64, label: &str) -> Alert {
    Alert {
        id: None,
        ticker: "BTCUSDT".to_string(),
        indicator: indicator.to_string(),
        trigger: trigger.to_string(),
        timeframe_label: label.to_string(),
        price: None,
        timestamp: Utc::now() - Duration::minutes(minutes_ago),
    }
}

fn and_strategy(timeframe: Timeframe, conditions: Vec<Condition>) -> Strategy {
    Strategy {
        id: Some(1),
        name: "Test Strategy".to_string(),
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

fn now() -> DateTime<Utc> {
    Utc::now()
}

#[tokio::test]
async fn fixed_window_completes_on_alert_inside_window() {
    let store = MemoryAlertStore::with_alerts(vec![alert(
        "Nautilus™",
        "Bullish Divergence",
        10,
        "15",
    )]);
    let strategy = and_strategy(
        Timeframe::FixedMinutes(15),
        vec![Condition::new("nautilus", "Bullish Divergence")],
    );

    let outcome = TimeframeSearch::search(&store, &strategy, "BTCUSDT", now())
        .await
        .unwrap();
    assert!(outcome.is_complete);
    assert_eq!(outcome.timeframe_used, SearchWindow::FixedMinutes(15));
}

#[tokio::test]
async fn fixed_window_excludes_older_alerts() {
    let store = MemoryAlertStore::with_alerts(vec![alert(
        "Nautilus™",
        "Bullish Divergence",
        20,
        "15",
    )]);
    let strategy = and_strategy(
        Timeframe::FixedMinutes(15),
        vec![Condition::new("nautilus", "Bullish Divergence")],
    );

    let outcome = TimeframeSearch::search(&store, &strategy, "BTCUSDT", now())
        .await
        .unwrap();
    assert!(!outcome.is_complete);
    assert_eq!(outcome.missing.len(), 1);
}

#[tokio::test]
async fn any_search_returns_smallest_qualifying_bucket() {
    // Satisfiable at both 15m and 1h; the 15m bucket must win.
    let store = MemoryAlertStore::with_alerts(vec![
        alert("Nautilus™", "Bullish Divergence", 10, "15m"),
        alert("Nautilus™", "Bullish Divergence", 30, "1h"),
    ]);
    let strategy = and_strategy(
        Timeframe::Any,
        vec![Condition::new("nautilus", "Bullish Divergence")],
    );

    let outcome = TimeframeSearch::search(&store, &strategy, "BTCUSDT", now())
        .await
        .unwrap();
    assert!(outcome.is_complete);
    assert_eq!(
        outcome.timeframe_used,
        SearchWindow::Bucket(TimeframeBucket::M15)
    );
}

#[tokio::test]
async fn any_search_never_mixes_buckets() {
    // One condition only satisfiable by a 3-minute-old 5m-chart alert, the
    // other only by a 50-minute-old 1h-chart alert. No single bucket holds
    // both, so a two-condition AND strategy must not complete.
    let store = MemoryAlertStore::with_alerts(vec![
        alert("Nautilus™", "Bullish Divergence", 3, "5m"),
        alert("Extreme Zones", "Discount Zone", 50, "1h"),
    ]);
    let strategy = and_strategy(
        Timeframe::Any,
        vec![
            Condition::new("nautilus", "Bullish Divergence"),
            Condition::new("extreme_zones", "Discount Zone"),
        ],
    );

    let outcome = TimeframeSearch::search(&store, &strategy, "BTCUSDT", now())
        .await
        .unwrap();
    assert!(!outcome.is_complete);
    // Both buckets match one condition; the tie goes to the smallest.
    assert_eq!(
        outcome.timeframe_used,
        SearchWindow::Bucket(TimeframeBucket::M5)
    );
    assert_eq!(outcome.matched.len(), 1);
}

#[tokio::test]
async fn any_search_keeps_best_partial_bucket_for_reporting() {
    let store = MemoryAlertStore::with_alerts(vec![
        alert("Nautilus™", "Bullish Divergence", 30, "1h"),
        alert("Extreme Zones", "Discount Zone", 45, "1h"),
    ]);
    let strategy = and_strategy(
        Timeframe::Any,
        vec![
            Condition::new("nautilus", "Bullish Divergence"),
            Condition::new("extreme_zones", "Discount Zone"),
            Condition::new("osc_matrix", "Hyper Wave"),
        ],
    );

    let outcome = TimeframeSearch::search(&store, &strategy, "BTCUSDT", now())
        .await
        .unwrap();
    assert!(!outcome.is_complete);
    assert_eq!(
        outcome.timeframe_used,
        SearchWindow::Bucket(TimeframeBucket::H1)
    );
    assert_eq!(outcome.matched.len(), 2);
    assert_eq!(outcome.missing.len(), 1);
}

#[tokio::test]
async fn any_search_ignores_other_tickers() {
    let mut other = alert("Nautilus™", "Bullish Divergence", 2, "5m");
    other.ticker = "ETHUSDT".to_string();
    let store = MemoryAlertStore::with_alerts(vec![other]);
    let strategy = and_strategy(
        Timeframe::Any,
        vec![Condition::new("nautilus", "Bullish Divergence")],
    );

    let outcome = TimeframeSearch::search(&store, &strategy, "BTCUSDT", now())
        .await
        .unwrap();
    assert!(!outcome.is_complete);
}
