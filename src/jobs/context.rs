//! Job context for dependency injection.

use std::sync::Arc;

use crate::metrics::Metrics;
use crate::services::{CompletionSink, NotificationDispatcher};
use crate::signals::EvaluationEngine;

/// Context passed to job handlers via the apalis `Data<T>` pattern.
///
/// Holds the evaluation engine plus the write-side collaborators the
/// engine itself never touches: completion persistence and notification
/// delivery stay in the job layer so their failures can be swallowed
/// without reaching the evaluation path.
pub struct JobContext {
    pub engine: Arc<EvaluationEngine>,
    pub sink: Arc<dyn CompletionSink>,
    pub dispatcher: Option<Arc<dyn NotificationDispatcher>>,
    pub metrics: Option<Arc<Metrics>>,
}

impl JobContext {
    pub fn new(
        engine: Arc<EvaluationEngine>,
        sink: Arc<dyn CompletionSink>,
        dispatcher: Option<Arc<dyn NotificationDispatcher>>,
        metrics: Option<Arc<Metrics>>,
    ) -> Self {
        Self {
            engine,
            sink,
            dispatcher,
            metrics,
        }
    }
}
