//! Per-datacenter emissions lookup

use std::collections::BTreeMap;

use crate::error::{CarbonError, Result};
use crate::models::EmissionsRecord;

#[derive(Debug, Clone)]
struct SubtypeEmissions {
    subtype: String,
    co2e: f64,
}

/// Emission figures grouped by datacenter
///
/// A datacenter's representative emissions are the mean over its records,
/// optionally restricted to a set of activity subtypes.
#[derive(Debug, Clone, Default)]
pub struct EmissionsTable {
    by_datacenter: BTreeMap<String, Vec<SubtypeEmissions>>,
}

impl EmissionsTable {
    pub fn from_records(records: &[EmissionsRecord]) -> Self {
        let mut by_datacenter: BTreeMap<String, Vec<SubtypeEmissions>> = BTreeMap::new();
        for record in records {
            by_datacenter
                .entry(record.datacenter.clone())
                .or_default()
                .push(SubtypeEmissions {
                    subtype: record.activity_subtype.clone(),
                    co2e: record.co2e,
                });
        }
        Self { by_datacenter }
    }

    /// Mean emissions of a datacenter, `None` if no record matches
    ///
    /// An empty `subtypes` filter matches every record.
    pub fn mean(&self, datacenter: &str, subtypes: &[String]) -> Option<f64> {
        let entries = self.by_datacenter.get(datacenter)?;

        let (sum, count) = entries
            .iter()
            .filter(|e| subtypes.is_empty() || subtypes.iter().any(|s| *s == e.subtype))
            .fold((0.0, 0usize), |(sum, count), e| (sum + e.co2e, count + 1));

        if count == 0 {
            None
        } else {
            Some(sum / count as f64)
        }
    }

    /// Mean emissions of a datacenter, failing when no record matches
    pub fn require_mean(&self, datacenter: &str, subtypes: &[String]) -> Result<f64> {
        self.mean(datacenter, subtypes)
            .ok_or_else(|| CarbonError::MissingData {
                datacenter: datacenter.to_string(),
                subtypes: subtypes.to_vec(),
            })
    }

    pub fn len(&self) -> usize {
        self.by_datacenter.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_datacenter.is_empty()
    }
}
