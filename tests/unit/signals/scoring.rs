//! Unit tests for weight aggregation

use alertrix::models::Condition;
use alertrix::services::memory::StaticWeights;
use alertrix::signals::scoring::{round_one_decimal, score_conditions};

#[test]
fn rounds_half_away_from_zero() {
    assert_eq!(round_one_decimal(1.25), 1.3);
    assert_eq!(round_one_decimal(-1.25), -1.3);
    assert_eq!(round_one_decimal(2.04), 2.0);
    assert_eq!(round_one_decimal(2.0), 2.0);
}

#[tokio::test]
async fn sums_weights_over_matched_conditions() {
    let weights = StaticWeights::new()
        .set("Nautilus™", "Bullish Divergence", 2.5)
        .set("Extreme Zones", "Discount Zone", 1.0);
    let matched = vec![
        Condition::new("Nautilus™", "Bullish Divergence"),
        Condition::new("Extreme Zones", "Discount Zone"),
    ];

    assert_eq!(score_conditions(&matched, &weights).await, 3.5);
}

#[tokio::test]
async fn abbreviated_keys_hit_display_name_weights() {
    // The weight table is keyed by display names; a rule written with the
    // short key must still score.
    let weights = StaticWeights::new().set("Nautilus™", "Bullish Divergence", 2.5);
    let matched = vec![Condition::new("nautilus", "Bullish Divergence")];

    assert_eq!(score_conditions(&matched, &weights).await, 2.5);
}

#[tokio::test]
async fn unknown_pairs_contribute_zero() {
    let weights = StaticWeights::new().set("Nautilus™", "Bullish Divergence", 2.5);
    let matched = vec![
        Condition::new("Nautilus™", "Bullish Divergence"),
        Condition::new("Unknown Indicator", "Unknown Trigger"),
    ];

    assert_eq!(score_conditions(&matched, &weights).await, 2.5);
}

#[tokio::test]
async fn empty_match_set_scores_zero() {
    let weights = StaticWeights::new();
    assert_eq!(score_conditions(&[], &weights).await, 0.0);
}

#[tokio::test]
async fn fractional_sum_is_rounded_to_one_decimal() {
    let weights = StaticWeights::new()
        .set("Nautilus™", "Bullish Divergence", 1.11)
        .set("Extreme Zones", "Discount Zone", 1.15);
    let matched = vec![
        Condition::new("Nautilus™", "Bullish Divergence"),
        Condition::new("Extreme Zones", "Discount Zone"),
    ];

    assert_eq!(score_conditions(&matched, &weights).await, 2.3);
}
