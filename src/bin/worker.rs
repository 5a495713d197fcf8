//! Alertrix Worker
//!
//! Processes alert evaluation jobs from the Redis queue. Runs as a
//! separate process from the API server.

use apalis_redis::RedisStorage;
use dotenvy::dotenv;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};

use alertrix::config;
use alertrix::core::runtime::EvalRuntime;
use alertrix::db::PostgresStore;
use alertrix::jobs::context::JobContext;
use alertrix::jobs::types::{EvaluateAlertJob, RecordCompletionJob};
use alertrix::logging;
use alertrix::metrics::Metrics;
use alertrix::services::gate::RedisGate;
use alertrix::services::memory::MemoryGate;
use alertrix::services::notifier::WebhookNotifier;
use alertrix::services::{CompletionGate, NotificationDispatcher};
use alertrix::signals::EvaluationEngine;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    logging::init_logging();

    let env = config::get_environment();
    info!("Starting Alertrix Worker");
    info!(environment = %env, "Environment");

    let metrics = Arc::new(Metrics::new()?);

    info!("Initializing Postgres connection...");
    let database = Arc::new(
        PostgresStore::new()
            .await
            .map_err(|e| format!("Postgres connection required for worker: {}", e))?,
    );
    info!("Postgres connected");

    info!("Initializing Apalis Redis storage...");
    let redis_url = config::get_redis_url();
    let conn = apalis_redis::connect(redis_url.clone()).await?;
    let eval_storage: Arc<RedisStorage<EvaluateAlertJob>> =
        Arc::new(RedisStorage::new(conn.clone()));
    let record_storage: Arc<RedisStorage<RecordCompletionJob>> = Arc::new(RedisStorage::new(conn));
    info!("Apalis Redis storage initialized");

    let gate: Arc<dyn CompletionGate> = match RedisGate::connect(&redis_url).await {
        Ok(gate) => Arc::new(gate),
        Err(e) => {
            warn!(error = %e, "Redis cooldown gate unavailable, using in-process gate");
            Arc::new(MemoryGate::new())
        }
    };

    let engine = Arc::new(EvaluationEngine::new(
        database.clone(),
        database.clone(),
        database.clone(),
        gate,
        config::engine_config(),
    ));

    let dispatcher: Option<Arc<dyn NotificationDispatcher>> =
        match config::get_notification_webhook_url() {
            Some(url) => {
                info!("Notification webhook configured");
                Some(Arc::new(WebhookNotifier::new(url)))
            }
            None => {
                warn!("ALERTRIX_NOTIFY_WEBHOOK_URL not set - completions will be stored but not delivered");
                None
            }
        };

    let job_context = Arc::new(JobContext::new(
        engine,
        database.clone(),
        dispatcher,
        Some(metrics.clone()),
    ));

    info!("Starting Apalis workers...");
    let runtime = EvalRuntime::new(job_context, eval_storage, record_storage);
    let worker_handles = runtime
        .start_workers()
        .await
        .map_err(|e| format!("Failed to start workers: {}", e))?;

    info!("Worker started, waiting for shutdown signal...");
    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("Shutting down worker...");
            for handle in worker_handles {
                handle.abort();
            }
            info!("Worker stopped");
        }
    }

    Ok(())
}
