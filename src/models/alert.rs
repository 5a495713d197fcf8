//! Canonical alert record and the fixed timeframe bucket set.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A single ingested market-signal event.
///
/// Alerts are created by the webhook front door, stored append-only, and
/// treated as immutable by every downstream consumer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: Option<i64>,
    pub ticker: String,
    pub indicator: String,
    pub trigger: String,
    /// Chart timeframe the alert was produced on (e.g. "15", "1h"). Carried
    /// for reporting; window selection never reads it.
    pub timeframe_label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

/// Candidate windows searched when a strategy declares no fixed timeframe.
///
/// Ordered ascending by duration. The search stops at the first bucket that
/// fully satisfies a strategy, so the smallest qualifying window wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeframeBucket {
    M5,
    M15,
    H1,
    H4,
    D1,
}

impl TimeframeBucket {
    pub const ALL: [TimeframeBucket; 5] = [
        TimeframeBucket::M5,
        TimeframeBucket::M15,
        TimeframeBucket::H1,
        TimeframeBucket::H4,
        TimeframeBucket::D1,
    ];

    pub fn minutes(self) -> i64 {
        match self {
            TimeframeBucket::M5 => 5,
            TimeframeBucket::M15 => 15,
            TimeframeBucket::H1 => 60,
            TimeframeBucket::H4 => 240,
            TimeframeBucket::D1 => 1440,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TimeframeBucket::M5 => "5m",
            TimeframeBucket::M15 => "15m",
            TimeframeBucket::H1 => "1h",
            TimeframeBucket::H4 => "4h",
            TimeframeBucket::D1 => "1d",
        }
    }

    /// Lower bound of this bucket's window ending at `now`.
    pub fn window_start(self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::minutes(self.minutes())
    }

    /// Map an alert's chart timeframe label onto its bucket. Labels arrive
    /// in several forms ("15", "15m", "60", "1h"); anything unrecognized
    /// belongs to no bucket.
    pub fn from_label(label: &str) -> Option<TimeframeBucket> {
        match label.trim().to_lowercase().as_str() {
            "5" | "5m" => Some(TimeframeBucket::M5),
            "15" | "15m" => Some(TimeframeBucket::M15),
            "60" | "1h" => Some(TimeframeBucket::H1),
            "240" | "4h" => Some(TimeframeBucket::H4),
            "1440" | "1d" | "d" => Some(TimeframeBucket::D1),
            _ => None,
        }
    }
}

impl std::fmt::Display for TimeframeBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// The window a search outcome was produced from: either a strategy's own
/// fixed window or one of the candidate buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchWindow {
    FixedMinutes(i64),
    Bucket(TimeframeBucket),
}

impl SearchWindow {
    pub fn minutes(self) -> i64 {
        match self {
            SearchWindow::FixedMinutes(n) => n,
            SearchWindow::Bucket(b) => b.minutes(),
        }
    }

    pub fn label(self) -> String {
        match self {
            SearchWindow::FixedMinutes(n) => format!("{}m", n),
            SearchWindow::Bucket(b) => b.label().to_string(),
        }
    }
}

impl std::fmt::Display for SearchWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label())
    }
}
