//! Apalis worker setup for the evaluation job chain.

use apalis::prelude::*;
use apalis_redis::RedisStorage;
use std::sync::Arc;
use tracing::info;

use crate::jobs::context::JobContext;
use crate::jobs::handlers;
use crate::jobs::types::{EvaluateAlertJob, RecordCompletionJob};

/// Evaluation runtime hosting the two workers of the job chain:
/// `EvaluateAlertJob` → `RecordCompletionJob`.
pub struct EvalRuntime {
    job_context: Arc<JobContext>,
    eval_storage: Arc<RedisStorage<EvaluateAlertJob>>,
    record_storage: Arc<RedisStorage<RecordCompletionJob>>,
}

impl EvalRuntime {
    pub fn new(
        job_context: Arc<JobContext>,
        eval_storage: Arc<RedisStorage<EvaluateAlertJob>>,
        record_storage: Arc<RedisStorage<RecordCompletionJob>>,
    ) -> Self {
        Self {
            job_context,
            eval_storage,
            record_storage,
        }
    }

    /// Start all workers and return handles for graceful shutdown.
    pub async fn start_workers(
        &self,
    ) -> Result<Vec<tokio::task::JoinHandle<()>>, Box<dyn std::error::Error + Send + Sync>> {
        let mut handles = Vec::new();

        let eval_storage = (*self.eval_storage).clone();
        let record_storage = self.record_storage.clone();
        let job_context = self.job_context.clone();
        let eval_handle = tokio::spawn(async move {
            let worker = WorkerBuilder::new("evaluate-alert-worker")
                .data(job_context.clone())
                .data(record_storage.clone())
                .backend(eval_storage)
                .build_fn(handlers::handle_evaluate_alert);

            info!("EvalRuntime: EvaluateAlertJob worker started");
            worker.run().await;
        });
        handles.push(eval_handle);

        let record_storage_worker = (*self.record_storage).clone();
        let job_context_record = self.job_context.clone();
        let record_handle = tokio::spawn(async move {
            let worker = WorkerBuilder::new("record-completion-worker")
                .data(job_context_record.clone())
                .backend(record_storage_worker)
                .build_fn(handlers::handle_record_completion);

            info!("EvalRuntime: RecordCompletionJob worker started");
            worker.run().await;
        });
        handles.push(record_handle);

        info!("EvalRuntime: all workers started");
        Ok(handles)
    }
}
