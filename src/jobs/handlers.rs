//! Job handlers for the alert evaluation workflow.

use apalis::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

use crate::jobs::context::JobContext;
use crate::jobs::types::{EvaluateAlertJob, RecordCompletionJob};
use crate::models::NotificationPayload;

/// Handler for one orchestrator pass.
///
/// Runs the engine across all enabled strategies and enqueues a
/// `RecordCompletionJob` per completion that cleared the cooldown gate.
pub async fn handle_evaluate_alert(
    job: EvaluateAlertJob,
    ctx: Data<Arc<JobContext>>,
    record_storage: Data<apalis_redis::RedisStorage<RecordCompletionJob>>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let start = Instant::now();
    if let Some(ref metrics) = ctx.metrics {
        metrics.alert_evaluations_active.inc();
    }

    debug!(ticker = %job.ticker, "EvaluateAlertJob: evaluating strategies for {}", job.ticker);

    let outcome = ctx.engine.evaluate_alert(&job.ticker, &job.alert).await;

    if let Some(ref metrics) = ctx.metrics {
        metrics.alert_evaluations_total.inc();
        metrics
            .alert_evaluation_duration_seconds
            .observe(start.elapsed().as_secs_f64());
        metrics.alert_evaluations_active.dec();
    }

    let completions = outcome.map_err(|e| {
        Box::new(std::io::Error::other(format!("evaluation pass failed: {}", e)))
            as Box<dyn std::error::Error + Send + Sync>
    })?;

    for completion in completions {
        info!(
            ticker = %completion.ticker,
            strategy = %completion.strategy_name,
            score = completion.score,
            "EvaluateAlertJob: enqueuing completion for '{}'",
            completion.strategy_name
        );
        let next_job = RecordCompletionJob { completion };
        let mut storage = (*record_storage).clone();
        storage.push(next_job).await.map_err(|e| {
            Box::new(std::io::Error::other(format!(
                "failed to enqueue RecordCompletionJob: {}",
                e
            ))) as Box<dyn std::error::Error + Send + Sync>
        })?;
    }

    Ok(())
}

/// Handler for persisting and delivering one completion.
///
/// Both writes are best-effort: failures are logged and swallowed so they
/// never feed back into evaluation or each other.
pub async fn handle_record_completion(
    job: RecordCompletionJob,
    ctx: Data<Arc<JobContext>>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let completion = &job.completion;

    if let Err(e) = ctx.sink.record_completion(completion).await {
        error!(
            ticker = %completion.ticker,
            strategy = %completion.strategy_name,
            error = %e,
            "RecordCompletionJob: failed to persist completion"
        );
    }

    if let Some(ref dispatcher) = ctx.dispatcher {
        let payload = NotificationPayload::from(completion);
        if let Err(e) = dispatcher.notify(&payload).await {
            error!(
                ticker = %completion.ticker,
                strategy = %completion.strategy_name,
                error = %e,
                "RecordCompletionJob: notification delivery failed"
            );
            if let Some(ref metrics) = ctx.metrics {
                metrics.notification_failures_total.inc();
            }
        }
    }

    if let Some(ref metrics) = ctx.metrics {
        metrics.completions_total.inc();
    }

    Ok(())
}
