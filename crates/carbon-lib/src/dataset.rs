//! Dataset normalization
//!
//! Turns the raw per-instance dataset into the two inputs the core needs:
//! one location per datacenter and a flat list of emission records.

use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::PathBuf;

use crate::error::{CarbonError, Result};
use crate::models::{DatacenterLocation, EmissionsRecord};

/// Anything that can produce a dataset for a session
pub trait DatasetSource {
    /// Load and normalize the dataset
    fn load(&self) -> Result<Dataset>;

    /// Human readable origin of the data, used in logs
    fn describe(&self) -> String;
}

/// Reads the instance dataset from a JSON file
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DatasetSource for JsonFileSource {
    fn load(&self) -> Result<Dataset> {
        let file = File::open(&self.path).map_err(|e| {
            CarbonError::Dataset(format!("cannot open {}: {}", self.path.display(), e))
        })?;
        Dataset::from_reader(BufReader::new(file))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[derive(Debug, Deserialize)]
struct RawInstanceRecord {
    dc_cq_id: String,
    geo: RawGeo,
    activity_type: String,
    activity_sub_type: String,
    emission_details: RawEmissionDetails,
}

#[derive(Debug, Deserialize)]
struct RawGeo {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Deserialize)]
struct RawEmissionDetails {
    co2e: f64,
}

/// Normalized, immutable dataset for one session
#[derive(Debug, Clone)]
pub struct Dataset {
    locations: Vec<DatacenterLocation>,
    records: Vec<EmissionsRecord>,
}

impl Dataset {
    /// Build a dataset from already-normalized parts
    ///
    /// Locations are merged per identifier. Every record must refer to a
    /// datacenter with a known location.
    pub fn new(locations: Vec<DatacenterLocation>, records: Vec<EmissionsRecord>) -> Result<Self> {
        if records.is_empty() {
            return Err(CarbonError::Dataset("dataset has no emission records".to_string()));
        }

        for loc in &locations {
            if !(-90.0..=90.0).contains(&loc.latitude) || !(-180.0..=180.0).contains(&loc.longitude)
            {
                return Err(CarbonError::Dataset(format!(
                    "datacenter '{}' has invalid coordinates ({}, {})",
                    loc.id, loc.latitude, loc.longitude
                )));
            }
        }

        let locations = merge_locations(locations);
        let known: BTreeSet<&str> = locations.iter().map(|l| l.id.as_str()).collect();

        if let Some(orphan) = records
            .iter()
            .find(|r| !known.contains(r.datacenter.as_str()))
        {
            return Err(CarbonError::Dataset(format!(
                "emission record for datacenter '{}' has no location",
                orphan.datacenter
            )));
        }

        if let Some(bad) = records.iter().find(|r| !r.co2e.is_finite()) {
            return Err(CarbonError::Dataset(format!(
                "emission record for datacenter '{}' has a non-finite co2e",
                bad.datacenter
            )));
        }

        Ok(Self { locations, records })
    }

    /// Parse the raw instance dataset (a JSON array of instance records)
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: Vec<RawInstanceRecord> = serde_json::from_str(json)?;
        Self::from_raw(raw)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let raw: Vec<RawInstanceRecord> = serde_json::from_reader(reader)?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: Vec<RawInstanceRecord>) -> Result<Self> {
        let mut locations = Vec::with_capacity(raw.len());
        let mut records = Vec::with_capacity(raw.len());

        for r in raw {
            locations.push(DatacenterLocation::new(
                r.dc_cq_id.clone(),
                r.geo.latitude,
                r.geo.longitude,
            ));
            records.push(EmissionsRecord {
                datacenter: r.dc_cq_id,
                activity_type: r.activity_type,
                activity_subtype: r.activity_sub_type,
                co2e: r.emission_details.co2e,
            });
        }

        Self::new(locations, records)
    }

    /// One location per datacenter, ordered by identifier
    pub fn locations(&self) -> &[DatacenterLocation] {
        &self.locations
    }

    pub fn records(&self) -> &[EmissionsRecord] {
        &self.records
    }

    /// Distinct activity subtypes, ordered
    pub fn subtypes(&self) -> Vec<&str> {
        self.records
            .iter()
            .map(|r| r.activity_subtype.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Distinct activity types, ordered
    pub fn activity_types(&self) -> Vec<&str> {
        self.records
            .iter()
            .map(|r| r.activity_type.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Collapse locations to one per identifier, averaging duplicate coordinates
pub fn merge_locations<I>(locations: I) -> Vec<DatacenterLocation>
where
    I: IntoIterator<Item = DatacenterLocation>,
{
    let mut sums: BTreeMap<String, (f64, f64, u32)> = BTreeMap::new();
    for loc in locations {
        let entry = sums.entry(loc.id).or_insert((0.0, 0.0, 0));
        entry.0 += loc.latitude;
        entry.1 += loc.longitude;
        entry.2 += 1;
    }

    sums.into_iter()
        .map(|(id, (lat, lon, n))| DatacenterLocation::new(id, lat / n as f64, lon / n as f64))
        .collect()
}
