//! Precomputed pairwise geodesic distances

use std::collections::BTreeMap;

use geo::{GeodesicDistance, Point};

use crate::dataset::merge_locations;
use crate::error::{CarbonError, Result};
use crate::models::DatacenterLocation;

/// Geodesic distance on the WGS-84 ellipsoid between two lat/lon points, in km
pub fn geodesic_distance_km(from: &DatacenterLocation, to: &DatacenterLocation) -> f64 {
    let a = Point::new(from.longitude, from.latitude);
    let b = Point::new(to.longitude, to.latitude);
    a.geodesic_distance(&b) / 1000.0
}

/// Distances from every datacenter to every other datacenter
///
/// Built once per dataset. Self-distances are never stored, so a
/// datacenter never shows up as its own neighbour.
#[derive(Debug, Clone, Default)]
pub struct DistanceIndex {
    distances: BTreeMap<String, BTreeMap<String, f64>>,
}

impl DistanceIndex {
    /// Build the full matrix from a set of locations
    ///
    /// Duplicate identifiers are collapsed by averaging their coordinates.
    /// Each unordered pair is computed once and stored in both directions.
    pub fn build(locations: &[DatacenterLocation]) -> Self {
        let locations = merge_locations(locations.iter().cloned());

        let mut distances: BTreeMap<String, BTreeMap<String, f64>> = locations
            .iter()
            .map(|loc| (loc.id.clone(), BTreeMap::new()))
            .collect();

        for (i, origin) in locations.iter().enumerate() {
            for dest in &locations[i + 1..] {
                let km = geodesic_distance_km(origin, dest);
                if let Some(row) = distances.get_mut(&origin.id) {
                    row.insert(dest.id.clone(), km);
                }
                if let Some(row) = distances.get_mut(&dest.id) {
                    row.insert(origin.id.clone(), km);
                }
            }
        }

        Self { distances }
    }

    /// Distance between two distinct datacenters, `None` for self-pairs or unknown ids
    pub fn distance_km(&self, a: &str, b: &str) -> Option<f64> {
        self.distances.get(a)?.get(b).copied()
    }

    /// All other datacenters with their distance from `origin`
    pub fn neighbours(&self, origin: &str) -> Result<&BTreeMap<String, f64>> {
        self.distances
            .get(origin)
            .ok_or_else(|| CarbonError::UnknownDatacenter(origin.to_string()))
    }

    /// Datacenters strictly closer to `origin` than `budget_km`, ordered by id
    pub fn within(&self, origin: &str, budget_km: f64) -> Result<Vec<(&str, f64)>> {
        Ok(self
            .neighbours(origin)?
            .iter()
            .filter(|(_, km)| **km < budget_km)
            .map(|(id, km)| (id.as_str(), *km))
            .collect())
    }

    /// Whether the index knows about a datacenter
    pub fn contains(&self, id: &str) -> bool {
        self.distances.contains_key(id)
    }

    /// Identifiers of all indexed datacenters, ordered
    pub fn datacenters(&self) -> impl Iterator<Item = &str> {
        self.distances.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.distances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }
}
