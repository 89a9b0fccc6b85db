//! Loaded dataset plus everything derived from it
//!
//! A session is built once (dataset load, emissions grouping, O(n²)
//! distance index) and then answers any number of queries read-only.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::dataset::{Dataset, DatasetSource};
use crate::distance::{DistanceIndex, DistanceModel};
use crate::emissions::EmissionsTable;
use crate::error::Result;
use crate::observability::CarbonMetrics;
use crate::recommender::{RecommendationResult, Recommender};

/// One row of the datacenter overview
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatacenterSummary {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Mean over every subtype; `None` if the datacenter has no records
    pub mean_co2e: Option<f64>,
    pub record_count: usize,
}

/// Immutable query context shared by every request
#[derive(Debug)]
pub struct Session {
    dataset: Dataset,
    emissions: EmissionsTable,
    index: DistanceIndex,
    model: DistanceModel,
    source: String,
    index_build_time: Duration,
}

impl Session {
    /// Derive the emissions table and distance index from a dataset
    pub fn build(dataset: Dataset, model: DistanceModel, source: impl Into<String>) -> Self {
        let metrics = CarbonMetrics::new();

        let started = Instant::now();
        let index = DistanceIndex::build(dataset.locations());
        let index_build_time = started.elapsed();
        metrics.observe_index_build(index_build_time.as_secs_f64());
        metrics.set_datacenters_indexed(index.len() as i64);

        let emissions = EmissionsTable::from_records(dataset.records());

        Self {
            dataset,
            emissions,
            index,
            model,
            source: source.into(),
            index_build_time,
        }
    }

    /// Load a dataset from `source` and build a session from it
    pub fn load(source: &dyn DatasetSource, model: DistanceModel) -> Result<Self> {
        let dataset = source.load()?;
        Ok(Self::build(dataset, model, source.describe()))
    }

    pub fn recommender(&self) -> Recommender<'_> {
        Recommender::new(&self.index).with_model(self.model)
    }

    /// Run a recommendation query, recording latency and outcome metrics
    pub fn recommend(
        &self,
        current: &str,
        subtypes: &[String],
        latency_budget_ms: f64,
    ) -> Result<RecommendationResult> {
        let metrics = CarbonMetrics::new();
        let started = Instant::now();

        let result = self
            .recommender()
            .recommend(current, subtypes, latency_budget_ms, &self.emissions);
        metrics.observe_recommendation_latency(started.elapsed().as_secs_f64());

        match &result {
            Ok(r) => metrics.inc_recommendations(r.outcome.as_str()),
            Err(e) => metrics.inc_query_errors(e.kind()),
        }

        result
    }

    /// Every datacenter with its all-subtype mean emissions
    pub fn overview(&self) -> Vec<DatacenterSummary> {
        self.dataset
            .locations()
            .iter()
            .map(|loc| DatacenterSummary {
                id: loc.id.clone(),
                latitude: loc.latitude,
                longitude: loc.longitude,
                mean_co2e: self.emissions.mean(&loc.id, &[]),
                record_count: self
                    .dataset
                    .records()
                    .iter()
                    .filter(|r| r.datacenter == loc.id)
                    .count(),
            })
            .collect()
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn emissions(&self) -> &EmissionsTable {
        &self.emissions
    }

    pub fn index(&self) -> &DistanceIndex {
        &self.index
    }

    pub fn model(&self) -> &DistanceModel {
        &self.model
    }

    /// Where the dataset came from
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn index_build_time(&self) -> Duration {
        self.index_build_time
    }
}
