//! Boolean rule matching against a candidate alert set.

use crate::indicators::names;
use crate::models::{Alert, Condition, GroupOperator, MatchOutcome, RuleComposition};

pub struct RuleMatcher;

impl RuleMatcher {
    /// Evaluate one normalized rule composition against candidates that the
    /// caller has already restricted to a single ticker and a single time
    /// window.
    ///
    /// Pure function: same inputs, same matched/missing sets. Which alert
    /// satisfied a condition is not significant to completion, so the first
    /// qualifying hit per condition suffices.
    pub fn match_rules(rules: &RuleComposition, candidates: &[Alert]) -> MatchOutcome {
        let mut matched = Vec::new();
        let mut missing = Vec::new();
        let mut group_results = Vec::with_capacity(rules.groups.len());

        for group in &rules.groups {
            let mut hits = Vec::with_capacity(group.conditions.len());
            for condition in &group.conditions {
                let hit = candidates
                    .iter()
                    .any(|alert| Self::condition_matches(condition, alert));
                if hit {
                    matched.push(condition.clone());
                } else {
                    missing.push(condition.clone());
                }
                hits.push(hit);
            }

            // A group with no conditions is unsatisfiable rather than
            // vacuously true.
            let group_ok = !hits.is_empty()
                && match group.operator {
                    GroupOperator::And => hits.iter().all(|&h| h),
                    GroupOperator::Or => hits.iter().any(|&h| h),
                };
            group_results.push(group_ok);
        }

        let is_complete = !group_results.is_empty()
            && match rules.inter_group_operator {
                GroupOperator::And => group_results.iter().all(|&g| g),
                GroupOperator::Or => group_results.iter().any(|&g| g),
            };

        MatchOutcome {
            is_complete,
            matched,
            missing,
        }
    }

    fn condition_matches(condition: &Condition, alert: &Alert) -> bool {
        names::same_indicator(&condition.indicator, &alert.indicator)
            && condition.trigger == alert.trigger
    }
}
