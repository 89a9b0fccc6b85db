//! Core data models for datacenter emissions

use serde::{Deserialize, Serialize};

use crate::error::{CarbonError, Result};

/// Maximum cores per instance accepted in a usage profile
pub const MAX_CORES_PER_INSTANCE: u32 = 1024;

/// Maximum hours a workload can run per day
pub const MAX_HOURS_PER_DAY: u32 = 24;

/// Maximum days a workload can run per week
pub const MAX_DAYS_PER_WEEK: u32 = 7;

/// Geographic location of a datacenter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatacenterLocation {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl DatacenterLocation {
    pub fn new(id: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            id: id.into(),
            latitude,
            longitude,
        }
    }
}

/// A single emissions figure for one activity subtype in a datacenter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmissionsRecord {
    pub datacenter: String,
    pub activity_type: String,
    pub activity_subtype: String,
    /// kg CO2e per unit of measurement (e.g. per core hour)
    pub co2e: f64,
}

/// How a workload is run, used to scale per-core emissions to a year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageProfile {
    pub instance_count: u32,
    pub cores_per_instance: u32,
    pub hours_per_day: u32,
    pub days_per_week: u32,
}

impl Default for UsageProfile {
    fn default() -> Self {
        Self {
            instance_count: 1,
            cores_per_instance: 4,
            hours_per_day: 4,
            days_per_week: 7,
        }
    }
}

impl UsageProfile {
    /// Create a validated usage profile
    pub fn new(
        instance_count: u32,
        cores_per_instance: u32,
        hours_per_day: u32,
        days_per_week: u32,
    ) -> Result<Self> {
        let profile = Self {
            instance_count,
            cores_per_instance,
            hours_per_day,
            days_per_week,
        };
        profile.validate()?;
        Ok(profile)
    }

    /// Check every field against its bounds
    pub fn validate(&self) -> Result<()> {
        check_range("instance_count", self.instance_count, u32::MAX)?;
        check_range(
            "cores_per_instance",
            self.cores_per_instance,
            MAX_CORES_PER_INSTANCE,
        )?;
        check_range("hours_per_day", self.hours_per_day, MAX_HOURS_PER_DAY)?;
        check_range("days_per_week", self.days_per_week, MAX_DAYS_PER_WEEK)?;
        Ok(())
    }

    /// Core-hours accumulated by the whole workload over a year
    pub fn core_hours_per_year(&self) -> f64 {
        (self.days_per_week as f64 / 7.0)
            * self.hours_per_day as f64
            * 365.0
            * self.instance_count as f64
            * self.cores_per_instance as f64
    }
}

fn check_range(field: &'static str, value: u32, max: u32) -> Result<()> {
    if value == 0 || value > max {
        return Err(CarbonError::InvalidUsageProfile {
            field,
            value,
            min: 1,
            max,
        });
    }
    Ok(())
}
