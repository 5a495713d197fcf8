//! Job types for the alert evaluation workflow.

use serde::{Deserialize, Serialize};

use crate::models::{Alert, CompletionResult};

/// Job to run one orchestrator pass for a newly stored alert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluateAlertJob {
    pub ticker: String,
    pub alert: Alert,
}

/// Job to persist and deliver one completion record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordCompletionJob {
    pub completion: CompletionResult,
}
