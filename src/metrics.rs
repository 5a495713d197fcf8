//! Prometheus metrics for the HTTP surface and the evaluation pipeline.

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Opts, Registry, TextEncoder,
};

pub struct Metrics {
    registry: Registry,
    pub http_requests_total: IntCounter,
    pub http_request_duration_seconds: Histogram,
    pub http_requests_in_flight: IntGauge,
    pub alerts_ingested_total: IntCounter,
    pub alert_evaluations_total: IntCounter,
    pub alert_evaluations_active: IntGauge,
    pub alert_evaluation_duration_seconds: Histogram,
    pub completions_total: IntCounter,
    pub notification_failures_total: IntCounter,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let http_requests_total = IntCounter::with_opts(Opts::new(
            "http_requests_total",
            "Total HTTP requests received",
        ))?;
        let http_request_duration_seconds = Histogram::with_opts(HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request latency",
        ))?;
        let http_requests_in_flight = IntGauge::with_opts(Opts::new(
            "http_requests_in_flight",
            "HTTP requests currently being served",
        ))?;
        let alerts_ingested_total = IntCounter::with_opts(Opts::new(
            "alerts_ingested_total",
            "Webhook alerts accepted and stored",
        ))?;
        let alert_evaluations_total = IntCounter::with_opts(Opts::new(
            "alert_evaluations_total",
            "Orchestrator passes completed",
        ))?;
        let alert_evaluations_active = IntGauge::with_opts(Opts::new(
            "alert_evaluations_active",
            "Orchestrator passes currently running",
        ))?;
        let alert_evaluation_duration_seconds = Histogram::with_opts(HistogramOpts::new(
            "alert_evaluation_duration_seconds",
            "Orchestrator pass latency",
        ))?;
        let completions_total = IntCounter::with_opts(Opts::new(
            "completions_total",
            "Strategy completions emitted",
        ))?;
        let notification_failures_total = IntCounter::with_opts(Opts::new(
            "notification_failures_total",
            "Completion notifications that failed to deliver",
        ))?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;
        registry.register(Box::new(http_requests_in_flight.clone()))?;
        registry.register(Box::new(alerts_ingested_total.clone()))?;
        registry.register(Box::new(alert_evaluations_total.clone()))?;
        registry.register(Box::new(alert_evaluations_active.clone()))?;
        registry.register(Box::new(alert_evaluation_duration_seconds.clone()))?;
        registry.register(Box::new(completions_total.clone()))?;
        registry.register(Box::new(notification_failures_total.clone()))?;

        Ok(Self {
            registry,
            http_requests_total,
            http_request_duration_seconds,
            http_requests_in_flight,
            alerts_ingested_total,
            alert_evaluations_total,
            alert_evaluations_active,
            alert_evaluation_duration_seconds,
            completions_total,
            notification_failures_total,
        })
    }

    /// Render the registry in Prometheus text exposition format.
    pub fn export(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
