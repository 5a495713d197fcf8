//! HTTP endpoint server using Axum.

use apalis::prelude::Storage;
use axum::{
    extract::{Path, Query, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{Json, Response},
    routing::{delete, get, post, put},
    Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{error, info, warn, Level};

use crate::db::PostgresStore;
use crate::error::EngineError;
use crate::ingest::parse_alert_line;
use crate::jobs::types::EvaluateAlertJob;
use crate::metrics::Metrics;
use crate::models::{RuleComposition, RuleSpec, Strategy, Timeframe};
use crate::services::gate::RedisGate;
use crate::services::memory::MemoryGate;
use crate::services::CompletionGate;
use crate::signals::EvaluationEngine;

#[derive(Clone)]
pub struct AppState {
    pub health: Arc<RwLock<HealthStatus>>,
    pub metrics: Arc<Metrics>,
    pub start_time: Arc<Instant>,
    pub database: Option<Arc<PostgresStore>>,
    pub engine: Option<Arc<EvaluationEngine>>,
    pub eval_queue: Option<apalis_redis::RedisStorage<EvaluateAlertJob>>,
}

#[derive(Clone, Debug)]
pub struct HealthStatus {
    pub status: String,
}

impl Default for HealthStatus {
    fn default() -> Self {
        Self {
            status: "healthy".to_string(),
        }
    }
}

pub async fn health_check(State(state): State<AppState>) -> Result<Json<Value>, StatusCode> {
    let health = state.health.read().await;
    let uptime_seconds = state.start_time.elapsed().as_secs();
    Ok(Json(json!({
        "status": health.status,
        "uptime_seconds": uptime_seconds,
        "service": "alertrix-strategy-engine"
    })))
}

pub async fn metrics_handler(State(state): State<AppState>) -> Result<String, StatusCode> {
    state
        .metrics
        .export()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// Middleware to track HTTP request metrics.
async fn metrics_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    state.metrics.http_requests_in_flight.inc();
    let response = next.run(request).await;
    let status = response.status();
    let duration = start.elapsed();
    state.metrics.http_requests_in_flight.dec();

    state.metrics.http_requests_total.inc();
    state
        .metrics
        .http_request_duration_seconds
        .observe(duration.as_secs_f64());

    if status.is_server_error() {
        tracing::error!(
            method = %method,
            path = %path,
            status = %status,
            duration_ms = duration.as_millis(),
            "HTTP request error"
        );
    }

    response
}

/// Accept one pipe-delimited webhook line, store it, and hand evaluation
/// to the worker queue. The response acknowledges storage only; evaluation
/// latency never blocks the caller.
async fn ingest_alert(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<Value>, StatusCode> {
    let db = state
        .database
        .as_ref()
        .ok_or(StatusCode::SERVICE_UNAVAILABLE)?;

    let alert = parse_alert_line(&body, Utc::now()).map_err(|e| match e {
        EngineError::Validation(reason) => {
            warn!(reason = %reason, "rejected malformed webhook line");
            StatusCode::BAD_REQUEST
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    })?;

    let id = db.insert_alert(&alert).await.map_err(|e| {
        error!(error = %e, "failed to store alert");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    state.metrics.alerts_ingested_total.inc();

    let mut stored = alert;
    stored.id = Some(id);

    if let Some(queue) = &state.eval_queue {
        let job = EvaluateAlertJob {
            ticker: stored.ticker.clone(),
            alert: stored,
        };
        let mut queue = queue.clone();
        if let Err(e) = queue.push(job).await {
            // Alert is already stored and acknowledged; the pass is lost,
            // not the data.
            error!(error = %e, "failed to enqueue evaluation job");
        }
    }

    Ok(Json(json!({"status": "accepted", "id": id})))
}

#[derive(Debug, Deserialize)]
struct ScoreboardQuery {
    window_minutes: Option<i64>,
}

/// Pull-based dashboard: best-matching ticker per enabled strategy.
async fn scoreboard(
    State(state): State<AppState>,
    Query(params): Query<ScoreboardQuery>,
) -> Result<Json<Value>, StatusCode> {
    let engine = state.engine.as_ref().ok_or(StatusCode::SERVICE_UNAVAILABLE)?;
    let window = params.window_minutes.unwrap_or(60).max(1);

    let rows = engine.score_all_strategies(window).await.map_err(|e| {
        error!(error = %e, "scoreboard sweep failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok(Json(json!(rows)))
}

#[derive(Debug, Deserialize)]
struct CompletionsQuery {
    limit: Option<i64>,
}

async fn list_completions(
    State(state): State<AppState>,
    Query(params): Query<CompletionsQuery>,
) -> Result<Json<Value>, StatusCode> {
    let db = state
        .database
        .as_ref()
        .ok_or(StatusCode::SERVICE_UNAVAILABLE)?;
    let limit = params.limit.unwrap_or(50).clamp(1, 500);

    let completions = db.list_completions(limit).await.map_err(|e| {
        error!(error = %e, "failed to list completions");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok(Json(json!(completions)))
}

#[derive(Debug, Deserialize)]
struct WeightRequest {
    indicator: String,
    trigger: String,
    weight: f64,
}

async fn upsert_weight(
    State(state): State<AppState>,
    Json(request): Json<WeightRequest>,
) -> Result<StatusCode, StatusCode> {
    let db = state
        .database
        .as_ref()
        .ok_or(StatusCode::SERVICE_UNAVAILABLE)?;

    db.upsert_weight(&request.indicator, &request.trigger, request.weight)
        .await
        .map_err(|e| {
            error!(error = %e, "failed to upsert weight");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize, Deserialize)]
struct CreateStrategyRequest {
    name: String,
    #[serde(default = "default_enabled")]
    enabled: bool,
    timeframe: Timeframe,
    #[serde(default)]
    threshold_sign: Option<i16>,
    rules: RuleSpec,
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Serialize, Deserialize)]
struct UpdateStrategyRequest {
    name: Option<String>,
    enabled: Option<bool>,
    timeframe: Option<Timeframe>,
    threshold_sign: Option<i16>,
    rules: Option<RuleSpec>,
}

#[derive(Debug, Serialize)]
struct StrategyResponse {
    id: i64,
    name: String,
    enabled: bool,
    timeframe: Timeframe,
    threshold_sign: Option<i16>,
    rules: RuleComposition,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<Strategy> for StrategyResponse {
    fn from(strategy: Strategy) -> Self {
        Self {
            id: strategy.id.unwrap_or(0),
            name: strategy.name,
            enabled: strategy.enabled,
            timeframe: strategy.timeframe,
            threshold_sign: strategy.threshold_sign,
            rules: strategy.rules,
            created_at: strategy.created_at,
            updated_at: strategy.updated_at,
        }
    }
}

async fn list_strategies(State(state): State<AppState>) -> Result<Json<Value>, StatusCode> {
    let db = state
        .database
        .as_ref()
        .ok_or(StatusCode::SERVICE_UNAVAILABLE)?;

    let strategies = db.get_strategies().await.map_err(|e| {
        error!(error = %e, "Failed to load strategies");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let responses: Vec<StrategyResponse> = strategies.into_iter().map(Into::into).collect();
    Ok(Json(json!(responses)))
}

async fn get_strategy(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<StrategyResponse>, StatusCode> {
    let db = state
        .database
        .as_ref()
        .ok_or(StatusCode::SERVICE_UNAVAILABLE)?;

    let strategy = db.get_strategy(id).await.map_err(|e| match e {
        EngineError::Lookup(_) => StatusCode::NOT_FOUND,
        _ => {
            error!(error = %e, strategy_id = id, "Failed to load strategy");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    })?;

    Ok(Json(strategy.into()))
}

async fn create_strategy(
    State(state): State<AppState>,
    Json(request): Json<CreateStrategyRequest>,
) -> Result<Json<StrategyResponse>, StatusCode> {
    let db = state
        .database
        .as_ref()
        .ok_or(StatusCode::SERVICE_UNAVAILABLE)?;

    let now = chrono::Utc::now();
    let strategy = Strategy {
        id: None,
        name: request.name,
        enabled: request.enabled,
        timeframe: request.timeframe,
        threshold_sign: request.threshold_sign,
        rules: request.rules.normalize(),
        created_at: now,
        updated_at: now,
    };

    let id = db.create_strategy(&strategy).await.map_err(|e| {
        error!(error = %e, "Failed to create strategy");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let created = db.get_strategy(id).await.map_err(|e| {
        error!(error = %e, strategy_id = id, "Failed to load created strategy");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(created.into()))
}

async fn update_strategy(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateStrategyRequest>,
) -> Result<Json<StrategyResponse>, StatusCode> {
    let db = state
        .database
        .as_ref()
        .ok_or(StatusCode::SERVICE_UNAVAILABLE)?;

    let mut strategy = db.get_strategy(id).await.map_err(|e| match e {
        EngineError::Lookup(_) => StatusCode::NOT_FOUND,
        _ => {
            error!(error = %e, strategy_id = id, "Failed to load strategy");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    })?;

    if let Some(name) = request.name {
        strategy.name = name;
    }
    if let Some(enabled) = request.enabled {
        strategy.enabled = enabled;
    }
    if let Some(timeframe) = request.timeframe {
        strategy.timeframe = timeframe;
    }
    if let Some(sign) = request.threshold_sign {
        strategy.threshold_sign = Some(sign);
    }
    if let Some(rules) = request.rules {
        strategy.rules = rules.normalize();
    }
    strategy.updated_at = chrono::Utc::now();

    db.update_strategy(id, &strategy).await.map_err(|e| {
        error!(error = %e, strategy_id = id, "Failed to update strategy");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(strategy.into()))
}

async fn delete_strategy(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, StatusCode> {
    let db = state
        .database
        .as_ref()
        .ok_or(StatusCode::SERVICE_UNAVAILABLE)?;

    db.delete_strategy(id).await.map_err(|e| match e {
        EngineError::Lookup(_) => StatusCode::NOT_FOUND,
        _ => {
            error!(error = %e, strategy_id = id, "Failed to delete strategy");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    })?;

    Ok(StatusCode::NO_CONTENT)
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .route("/webhook", post(ingest_alert))
        .route("/api/scoreboard", get(scoreboard))
        .route("/api/completions", get(list_completions))
        .route("/api/weights", put(upsert_weight))
        .route("/api/strategies", get(list_strategies))
        .route("/api/strategies", post(create_strategy))
        .route("/api/strategies/{id}", get(get_strategy))
        .route("/api/strategies/{id}", put(update_strategy))
        .route("/api/strategies/{id}", delete(delete_strategy))
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
                        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                        .on_response(DefaultOnResponse::new().level(Level::DEBUG)),
                )
                .layer(axum::middleware::from_fn_with_state(
                    state.clone(),
                    metrics_middleware,
                ))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

pub async fn start_server(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let metrics = Arc::new(Metrics::new()?);
    let start_time = Arc::new(Instant::now());

    // Database is optional: the server still answers health/metrics
    // without it, but ingestion and strategy endpoints return 503.
    let database = match PostgresStore::new().await {
        Ok(db) => {
            info!("Postgres connected for API server");
            Some(Arc::new(db))
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to connect to Postgres - ingestion and strategy endpoints will be unavailable");
            None
        }
    };

    let redis_url = crate::config::get_redis_url();
    let eval_queue = match apalis_redis::connect(redis_url.clone()).await {
        Ok(conn) => Some(apalis_redis::RedisStorage::new(conn)),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to connect to Redis - alerts will be stored but not evaluated");
            None
        }
    };

    let engine = match &database {
        Some(db) => {
            let gate: Arc<dyn CompletionGate> = match RedisGate::connect(&redis_url).await {
                Ok(gate) => Arc::new(gate),
                Err(e) => {
                    tracing::warn!(error = %e, "Redis cooldown gate unavailable, using in-process gate");
                    Arc::new(MemoryGate::new())
                }
            };
            Some(Arc::new(EvaluationEngine::new(
                db.clone(),
                db.clone(),
                db.clone(),
                gate,
                crate::config::engine_config(),
            )))
        }
        None => None,
    };

    let state = AppState {
        health: Arc::new(RwLock::new(HealthStatus::default())),
        metrics: metrics.clone(),
        start_time: start_time.clone(),
        database,
        engine,
        eval_queue,
    };
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!(port = port, "HTTP server listening on port {}", port);
    axum::serve(listener, app).await?;

    Ok(())
}
