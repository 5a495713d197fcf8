//! Webhook wire-format parsing.
//!
//! Alerts arrive as a single pipe-delimited line:
//! `TICKER|[PRICE|]TIMEFRAME|INDICATOR|TRIGGER...`
//!
//! The PRICE segment is optional and detected heuristically: if the second
//! field parses entirely as a number (after stripping a leading currency
//! symbol and thousands separators) it is treated as price and the
//! remaining fields shift right by one. Trigger text may legitimately
//! contain pipes from embedded sub-indicator data, so everything past the
//! indicator field is rejoined into one trigger string.

use chrono::{DateTime, Utc};

use crate::error::EngineError;
use crate::models::Alert;

/// Parse one webhook line into a canonical alert stamped `received_at`.
pub fn parse_alert_line(line: &str, received_at: DateTime<Utc>) -> Result<Alert, EngineError> {
    let fields: Vec<&str> = line.trim().split('|').map(str::trim).collect();
    if fields.len() < 4 {
        return Err(EngineError::Validation(format!(
            "expected at least 4 pipe-delimited fields, got {}",
            fields.len()
        )));
    }

    let ticker = fields[0];
    if ticker.is_empty() {
        return Err(EngineError::Validation("empty ticker field".to_string()));
    }

    // Price interpretation only holds if enough fields remain for
    // timeframe, indicator and trigger; otherwise the numeric second field
    // is a plain timeframe label (e.g. "15").
    let (price, rest) = match parse_price(fields[1]) {
        Some(p) if fields.len() >= 5 => (Some(p), &fields[2..]),
        _ => (None, &fields[1..]),
    };

    let timeframe_label = rest[0];
    let indicator = rest[1];
    let trigger = rest[2..].join("|");
    if timeframe_label.is_empty() || indicator.is_empty() || trigger.is_empty() {
        return Err(EngineError::Validation(
            "empty timeframe, indicator or trigger field".to_string(),
        ));
    }

    Ok(Alert {
        id: None,
        ticker: ticker.to_string(),
        indicator: indicator.to_string(),
        trigger,
        timeframe_label: timeframe_label.to_string(),
        price,
        timestamp: received_at,
    })
}

/// Parse a price field, tolerating a leading currency symbol and thousands
/// separators (`$64,230.50`). Returns `None` unless the whole field is
/// numeric.
fn parse_price(field: &str) -> Option<f64> {
    let stripped = field.strip_prefix(['$', '€', '£', '¥']).unwrap_or(field);
    let cleaned = stripped.replace(',', "");
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok()
}
