//! Weight aggregation for matched conditions.

use crate::indicators::names;
use crate::models::Condition;
use crate::services::WeightProvider;

/// Sum provider weights over the matched leaf conditions.
///
/// Conditions written with abbreviated indicator keys are resolved to
/// display names before the lookup, so rules and alerts hit the same table
/// rows. Unknown pairs contribute 0. The scorer never re-derives matches;
/// it only aggregates what the matcher already determined.
pub async fn score_conditions(matched: &[Condition], provider: &dyn WeightProvider) -> f64 {
    let mut sum = 0.0;
    for condition in matched {
        sum += provider
            .weight(names::display_name(&condition.indicator), &condition.trigger)
            .await;
    }
    round_one_decimal(sum)
}

/// Round to one decimal place, half away from zero.
pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
