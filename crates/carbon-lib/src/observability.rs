//! Observability infrastructure
//!
//! Provides:
//! - Prometheus metrics (query latency, index build time, outcomes, errors)
//! - Structured JSON logging with tracing

use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Histogram, IntCounter, IntCounterVec, IntGauge,
};
use std::sync::OnceLock;
use tracing::{info, warn};

use crate::error::CarbonError;
use crate::recommender::{RecommendationOutcome, RecommendationResult};
use crate::savings::SavingsReport;
use crate::session::Session;

/// Histogram buckets for query latency (in seconds)
const QUERY_LATENCY_BUCKETS: &[f64] = &[
    0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5,
];

/// Histogram buckets for the one-off index build (in seconds)
const BUILD_LATENCY_BUCKETS: &[f64] = &[0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<CarbonMetricsInner> = OnceLock::new();

struct CarbonMetricsInner {
    recommendation_latency_seconds: Histogram,
    index_build_seconds: Histogram,
    datacenters_indexed: IntGauge,
    recommendations: IntCounterVec,
    query_errors: IntCounterVec,
    savings_projections: IntCounter,
}

impl CarbonMetricsInner {
    fn new() -> Self {
        Self {
            recommendation_latency_seconds: register_histogram!(
                "carbon_recommendation_latency_seconds",
                "Time spent answering a recommendation query",
                QUERY_LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register recommendation_latency_seconds"),

            index_build_seconds: register_histogram!(
                "carbon_distance_index_build_seconds",
                "Time spent building the pairwise distance index",
                BUILD_LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register index_build_seconds"),

            datacenters_indexed: register_int_gauge!(
                "carbon_datacenters_indexed",
                "Number of datacenters in the distance index"
            )
            .expect("Failed to register datacenters_indexed"),

            recommendations: register_int_counter_vec!(
                "carbon_recommendations_total",
                "Recommendation queries answered, by outcome",
                &["outcome"]
            )
            .expect("Failed to register recommendations_total"),

            query_errors: register_int_counter_vec!(
                "carbon_query_errors_total",
                "Queries rejected, by error kind",
                &["kind"]
            )
            .expect("Failed to register query_errors_total"),

            savings_projections: register_int_counter!(
                "carbon_savings_projections_total",
                "Annual savings projections computed"
            )
            .expect("Failed to register savings_projections_total"),
        }
    }
}

/// Handle to the process-wide metrics
///
/// Multiple clones share the same underlying metrics.
#[derive(Clone)]
pub struct CarbonMetrics {
    _private: (),
}

impl Default for CarbonMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl CarbonMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(CarbonMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &CarbonMetricsInner {
        GLOBAL_METRICS.get_or_init(CarbonMetricsInner::new)
    }

    pub fn observe_recommendation_latency(&self, duration_secs: f64) {
        self.inner()
            .recommendation_latency_seconds
            .observe(duration_secs);
    }

    pub fn observe_index_build(&self, duration_secs: f64) {
        self.inner().index_build_seconds.observe(duration_secs);
    }

    pub fn set_datacenters_indexed(&self, count: i64) {
        self.inner().datacenters_indexed.set(count);
    }

    pub fn inc_recommendations(&self, outcome: &str) {
        self.inner()
            .recommendations
            .with_label_values(&[outcome])
            .inc();
    }

    pub fn inc_query_errors(&self, kind: &str) {
        self.inner().query_errors.with_label_values(&[kind]).inc();
    }

    pub fn inc_savings_projections(&self) {
        self.inner().savings_projections.inc();
    }
}

/// Structured logger for query and lifecycle events
///
/// Every event carries an `event` field so logs can be filtered by kind.
#[derive(Clone)]
pub struct StructuredLogger {
    node_name: String,
}

impl StructuredLogger {
    pub fn new(node_name: impl Into<String>) -> Self {
        Self {
            node_name: node_name.into(),
        }
    }

    pub fn log_startup(&self, version: &str, dataset_source: &str) {
        info!(
            event = "service_started",
            node = %self.node_name,
            version = %version,
            dataset = %dataset_source,
            "Carbon recommender started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            node = %self.node_name,
            reason = %reason,
            "Carbon recommender shutting down"
        );
    }

    /// Log a freshly built session
    pub fn log_session_ready(&self, session: &Session) {
        let dataset = session.dataset();
        info!(
            event = "dataset_loaded",
            node = %self.node_name,
            source = %session.source(),
            datacenters = dataset.locations().len(),
            records = dataset.records().len(),
            subtypes = dataset.subtypes().len(),
            "Dataset loaded"
        );
        info!(
            event = "distance_index_built",
            node = %self.node_name,
            datacenters = session.index().len(),
            build_ms = session.index_build_time().as_secs_f64() * 1000.0,
            path_adjustment_pct = session.model().path_adjustment_pct,
            equipment_latency_ms = session.model().equipment_latency_ms,
            "Distance index built"
        );
        if session.index().len() < 2 {
            warn!(
                event = "distance_index_built",
                node = %self.node_name,
                datacenters = session.index().len(),
                "Fewer than two datacenters, no alternative can ever be recommended"
            );
        }
    }

    pub fn log_recommendation(&self, result: &RecommendationResult) {
        match &result.outcome {
            RecommendationOutcome::Alternative(best) => {
                info!(
                    event = "recommendation",
                    node = %self.node_name,
                    current = %result.current_datacenter,
                    latency_budget_ms = result.latency_budget_ms,
                    distance_budget_km = result.distance_budget_km,
                    outcome = %result.outcome.as_str(),
                    best = %best.datacenter,
                    co2e_delta = best.co2e_delta,
                    latency_ms = best.latency_ms,
                    candidates = result.candidates.len(),
                    "Lower-emission alternative found"
                );
            }
            _ => {
                info!(
                    event = "recommendation",
                    node = %self.node_name,
                    current = %result.current_datacenter,
                    latency_budget_ms = result.latency_budget_ms,
                    distance_budget_km = result.distance_budget_km,
                    outcome = %result.outcome.as_str(),
                    "No alternative recommended"
                );
            }
        }
    }

    pub fn log_savings(&self, report: &SavingsReport) {
        info!(
            event = "savings_projected",
            node = %self.node_name,
            target = %report.target,
            instances = report.usage.instance_count,
            cores = report.usage.cores_per_instance,
            current_annual_co2e_kg = report.current_annual_co2e_kg,
            potential_savings_kg = report.potential_savings_kg,
            "Projected annual savings"
        );
    }

    pub fn log_query_failed(&self, query: &str, error: &CarbonError) {
        warn!(
            event = "query_failed",
            node = %self.node_name,
            query = %query,
            kind = %error.kind(),
            error = %error,
            "Query rejected"
        );
    }
}
