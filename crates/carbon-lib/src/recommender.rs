//! Lower-emission datacenter recommendations within a latency budget
//!
//! Candidates are the datacenters strictly closer than the distance the
//! latency budget allows. Those with lower mean emissions than the current
//! datacenter are ranked by absolute emissions, lowest first.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

use crate::distance::{DistanceIndex, DistanceModel};
use crate::emissions::EmissionsTable;
use crate::error::Result;

/// Label shown when nothing is reachable within the budget
pub const NO_ALTERNATIVE_LABEL: &str = "(No alternative in range)";

/// Label shown when reachable datacenters do not improve on the current one
pub const NO_BETTER_ALTERNATIVE_LABEL: &str = "(No better alternative in range)";

/// A reachable datacenter with lower emissions than the current one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub datacenter: String,
    /// Mean emissions under the active subtype filter
    pub co2e: f64,
    /// Current emissions minus this candidate's, always positive
    pub co2e_delta: f64,
    pub distance_km: f64,
    /// Estimated round-trip latency from the current datacenter
    pub latency_ms: f64,
}

/// What the recommender found
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RecommendationOutcome {
    /// No datacenter lies within the latency budget
    NoAlternativeInRange,
    /// Datacenters are in range but none has lower emissions
    NoBetterAlternativeInRange,
    /// The lowest-emission datacenter in range
    Alternative(Candidate),
}

impl RecommendationOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationOutcome::NoAlternativeInRange => "no_alternative_in_range",
            RecommendationOutcome::NoBetterAlternativeInRange => "no_better_alternative_in_range",
            RecommendationOutcome::Alternative(_) => "alternative",
        }
    }
}

/// Full answer to a recommendation query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResult {
    pub current_datacenter: String,
    pub subtypes: Vec<String>,
    pub latency_budget_ms: f64,
    /// Geodesic distance the latency budget allows
    pub distance_budget_km: f64,
    /// Mean emissions of the current datacenter under the subtype filter
    pub current_co2e: f64,
    pub outcome: RecommendationOutcome,
    /// Improving candidates, lowest emissions first
    pub candidates: Vec<Candidate>,
}

impl RecommendationResult {
    pub fn best(&self) -> Option<&Candidate> {
        match &self.outcome {
            RecommendationOutcome::Alternative(best) => Some(best),
            _ => None,
        }
    }

    /// Emissions saved per unit by moving to the best candidate, zero without one
    pub fn co2e_delta(&self) -> f64 {
        self.best().map(|c| c.co2e_delta).unwrap_or(0.0)
    }

    /// Name of the recommended datacenter, or a sentinel label
    pub fn target_label(&self) -> &str {
        match &self.outcome {
            RecommendationOutcome::NoAlternativeInRange => NO_ALTERNATIVE_LABEL,
            RecommendationOutcome::NoBetterAlternativeInRange => NO_BETTER_ALTERNATIVE_LABEL,
            RecommendationOutcome::Alternative(best) => &best.datacenter,
        }
    }
}

/// Finds lower-emission datacenters reachable within a latency budget
#[derive(Debug, Clone, Copy)]
pub struct Recommender<'a> {
    index: &'a DistanceIndex,
    model: DistanceModel,
}

impl<'a> Recommender<'a> {
    pub fn new(index: &'a DistanceIndex) -> Self {
        Self {
            index,
            model: DistanceModel::default(),
        }
    }

    pub fn with_model(mut self, model: DistanceModel) -> Self {
        self.model = model;
        self
    }

    /// Recommend an alternative to `current` within `latency_budget_ms`
    ///
    /// # Arguments
    /// * `current` - Datacenter the workload runs in today
    /// * `subtypes` - Activity subtypes to average over, empty for all
    /// * `latency_budget_ms` - Acceptable round-trip latency
    /// * `emissions` - Emission records of every datacenter
    ///
    /// # Errors
    /// * `UnknownDatacenter` if `current` is not indexed
    /// * `MissingData` if `current` has no records under the filter
    pub fn recommend(
        &self,
        current: &str,
        subtypes: &[String],
        latency_budget_ms: f64,
        emissions: &EmissionsTable,
    ) -> Result<RecommendationResult> {
        let distance_budget_km = self.model.latency_to_distance_km(latency_budget_ms);
        let in_range = self.index.within(current, distance_budget_km)?;
        let current_co2e = emissions.require_mean(current, subtypes)?;

        let mut result = RecommendationResult {
            current_datacenter: current.to_string(),
            subtypes: subtypes.to_vec(),
            latency_budget_ms,
            distance_budget_km,
            current_co2e,
            outcome: RecommendationOutcome::NoAlternativeInRange,
            candidates: Vec::new(),
        };

        if in_range.is_empty() {
            return Ok(result);
        }

        let mut candidates: Vec<Candidate> = in_range
            .into_iter()
            .filter_map(|(id, distance_km)| {
                let Some(co2e) = emissions.mean(id, subtypes) else {
                    debug!(datacenter = %id, "Skipping candidate without matching emission records");
                    return None;
                };
                Some(Candidate {
                    datacenter: id.to_string(),
                    co2e,
                    co2e_delta: current_co2e - co2e,
                    distance_km,
                    latency_ms: self.model.distance_to_latency_ms(distance_km),
                })
            })
            .collect();

        // Stable: equal emissions keep identifier order
        candidates.sort_by(|a, b| a.co2e.partial_cmp(&b.co2e).unwrap_or(Ordering::Equal));
        candidates.retain(|c| c.co2e_delta > 0.0);

        result.outcome = match candidates.first() {
            Some(best) => RecommendationOutcome::Alternative(best.clone()),
            None => RecommendationOutcome::NoBetterAlternativeInRange,
        };
        result.candidates = candidates;

        Ok(result)
    }
}
