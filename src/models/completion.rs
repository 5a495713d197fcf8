//! Completion records, match outcomes, and notification payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::alert::SearchWindow;
use crate::models::strategy::Condition;

/// Directional classification attached to a completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum Action {
    Buy,
    Sell,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Buy => f.write_str("Buy"),
            Action::Sell => f.write_str("Sell"),
        }
    }
}

/// Result of matching one rule composition against one candidate set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub is_complete: bool,
    pub matched: Vec<Condition>,
    pub missing: Vec<Condition>,
}

/// Result of a timeframe search: a match outcome plus the window it came
/// from. A partial outcome (`is_complete == false`) is reporting-only and
/// must never be treated as a completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub is_complete: bool,
    pub matched: Vec<Condition>,
    pub missing: Vec<Condition>,
    pub timeframe_used: SearchWindow,
}

/// Immutable record emitted once per completed strategy evaluation that
/// clears the cooldown gate. Handed to persistence and notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResult {
    pub strategy_id: i64,
    pub strategy_name: String,
    pub ticker: String,
    pub timeframe_used: SearchWindow,
    pub matched: Vec<Condition>,
    pub missing: Vec<Condition>,
    pub score: f64,
    pub action: Action,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

/// Wire payload for the notification dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub action: Action,
    pub ticker: String,
    pub strategy_name: String,
    pub matched_triggers: Vec<String>,
    pub score: f64,
    pub timeframe_used: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

impl From<&CompletionResult> for NotificationPayload {
    fn from(result: &CompletionResult) -> Self {
        Self {
            action: result.action,
            ticker: result.ticker.clone(),
            strategy_name: result.strategy_name.clone(),
            matched_triggers: result.matched.iter().map(|c| c.trigger.clone()).collect(),
            score: result.score,
            timeframe_used: result.timeframe_used.label(),
            price: result.price,
        }
    }
}

/// One dashboard row: the representative ticker for a strategy over a
/// caller-supplied window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreboardRow {
    pub strategy_id: Option<i64>,
    pub strategy_name: String,
    pub ticker: String,
    pub matched: Vec<Condition>,
    pub missing: Vec<Condition>,
    pub score: f64,
    pub is_complete: bool,
}
