//! Timeframe window search driving the rule matcher.

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::models::{SearchOutcome, SearchWindow, Strategy, Timeframe, TimeframeBucket};
use crate::services::AlertStore;
use crate::strategies::RuleMatcher;

pub struct TimeframeSearch;

impl TimeframeSearch {
    /// Find the window in which `strategy` is satisfied for `ticker`.
    ///
    /// Fixed-timeframe strategies get exactly one fetch over `[now-n, now]`.
    /// `Any` strategies walk the bucket set in ascending duration order,
    /// fetching each bucket's window separately, and stop at the first full
    /// completion, so the smallest qualifying window wins. Alerts from two
    /// buckets are never combined to satisfy one strategy.
    ///
    /// When no bucket completes, the bucket with the most matched
    /// conditions (ties to the smallest) is returned for reporting; its
    /// `is_complete` stays false.
    pub async fn search(
        store: &dyn AlertStore,
        strategy: &Strategy,
        ticker: &str,
        now: DateTime<Utc>,
    ) -> Result<SearchOutcome> {
        match strategy.timeframe {
            Timeframe::FixedMinutes(minutes) => {
                let since = now - Duration::minutes(minutes);
                let candidates = store.query_alerts(ticker, since).await?;
                let outcome = RuleMatcher::match_rules(&strategy.rules, &candidates);
                Ok(SearchOutcome {
                    is_complete: outcome.is_complete,
                    matched: outcome.matched,
                    missing: outcome.missing,
                    timeframe_used: SearchWindow::FixedMinutes(minutes),
                })
            }
            Timeframe::Any => {
                let mut best: Option<SearchOutcome> = None;
                for bucket in TimeframeBucket::ALL {
                    // One bucket, one candidate set: alerts inside the
                    // bucket's window that were produced on that chart
                    // timeframe. Alerts from other buckets never leak in,
                    // so no strategy completes on a cross-bucket union.
                    let candidates: Vec<_> = store
                        .query_alerts(ticker, bucket.window_start(now))
                        .await?
                        .into_iter()
                        .filter(|a| TimeframeBucket::from_label(&a.timeframe_label) == Some(bucket))
                        .collect();
                    let outcome = RuleMatcher::match_rules(&strategy.rules, &candidates);
                    let search_outcome = SearchOutcome {
                        is_complete: outcome.is_complete,
                        matched: outcome.matched,
                        missing: outcome.missing,
                        timeframe_used: SearchWindow::Bucket(bucket),
                    };

                    if search_outcome.is_complete {
                        debug!(
                            ticker,
                            strategy = %strategy.name,
                            bucket = %bucket,
                            "strategy satisfied at smallest qualifying bucket"
                        );
                        return Ok(search_outcome);
                    }

                    // Strict greater-than keeps the smaller bucket on ties.
                    let improves = best
                        .as_ref()
                        .map_or(true, |b| search_outcome.matched.len() > b.matched.len());
                    if improves {
                        best = Some(search_outcome);
                    }
                }

                best.ok_or_else(|| EngineError::Config("empty timeframe bucket set".to_string()))
            }
        }
    }
}
