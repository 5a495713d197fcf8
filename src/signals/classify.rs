//! Directional classification of completed strategies.

use crate::models::{Action, Condition, Strategy};

/// Derives the Buy/Sell label for a completion.
///
/// Kept behind a trait so the token heuristic below can be replaced by an
/// explicit per-rule directional tag without touching the orchestrator.
pub trait ActionClassifier: Send + Sync {
    fn classify(&self, strategy: &Strategy, matched: &[Condition]) -> Action;
}

const BULLISH_NAME_TOKENS: &[&str] = &["buy", "discount", "equilibrium"];
const BULLISH_TRIGGER_TOKENS: &[&str] = &["bullish", "discount", "oversold"];
const BEARISH_TRIGGER_TOKENS: &[&str] = &["bearish", "premium", "overbought"];

/// Substring heuristic inherited from the legacy engine. Precedence:
/// bullish strategy-name tokens, then bullish trigger tokens, then bearish
/// trigger tokens, then a reversal fallback, then Sell.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokenHeuristicClassifier;

impl ActionClassifier for TokenHeuristicClassifier {
    fn classify(&self, strategy: &Strategy, matched: &[Condition]) -> Action {
        let name = strategy.name.to_lowercase();
        if BULLISH_NAME_TOKENS.iter().any(|t| name.contains(t)) {
            return Action::Buy;
        }

        let trigger_text = matched
            .iter()
            .map(|c| c.trigger.to_lowercase())
            .collect::<Vec<_>>()
            .join(" ");

        if BULLISH_TRIGGER_TOKENS.iter().any(|t| trigger_text.contains(t)) {
            return Action::Buy;
        }
        if BEARISH_TRIGGER_TOKENS.iter().any(|t| trigger_text.contains(t)) {
            return Action::Sell;
        }
        if trigger_text.contains("reversal") {
            return Action::Buy;
        }

        Action::Sell
    }
}
