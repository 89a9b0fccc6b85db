//! Annual CO2e projections and human-relatable equivalences

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::distance::round_to_hundredths;
use crate::error::{CarbonError, Result};
use crate::models::UsageProfile;
use crate::recommender::RecommendationResult;

/// Kilometres driven by a Toyota Corolla 2020 per kg CO2e
pub const CAR_KM_PER_KG_CO2E: f64 = 0.196974607;

/// Supported equivalence kinds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquivalenceKind {
    #[default]
    CarKilometers,
}

impl EquivalenceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EquivalenceKind::CarKilometers => "car_kilometers",
        }
    }

    pub fn factor(&self) -> f64 {
        match self {
            EquivalenceKind::CarKilometers => CAR_KM_PER_KG_CO2E,
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            EquivalenceKind::CarKilometers => "km",
        }
    }

    /// Express `kg` of CO2e in this kind, e.g. `"19.7 km"`
    pub fn describe(&self, kg: f64) -> String {
        format!(
            "{} {}",
            format_decimal(round_to_hundredths(kg * self.factor())),
            self.unit()
        )
    }
}

impl FromStr for EquivalenceKind {
    type Err = CarbonError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "car_kilometers" => Ok(EquivalenceKind::CarKilometers),
            other => Err(CarbonError::UnsupportedEquivalenceKind(other.to_string())),
        }
    }
}

impl fmt::Display for EquivalenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shortest decimal form, always with a fractional part ("19.7", "100.0")
fn format_decimal(value: f64) -> String {
    let s = value.to_string();
    if s.contains('.') || !value.is_finite() {
        s
    } else {
        format!("{}.0", s)
    }
}

/// Potential savings section for a recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsReport {
    /// Recommended datacenter or a "no alternative" label
    pub target: String,
    pub usage: UsageProfile,
    pub equivalence: EquivalenceKind,
    pub current_annual_co2e_kg: f64,
    pub current_equivalent: String,
    pub potential_savings_kg: f64,
    pub savings_equivalent: String,
}

/// Scales per-core emissions to a year of usage
#[derive(Debug, Clone, Copy, Default)]
pub struct SavingsProjector {
    equivalence: EquivalenceKind,
}

impl SavingsProjector {
    pub fn new(equivalence: EquivalenceKind) -> Self {
        Self { equivalence }
    }

    /// Annual kg CO2e for a per-core figure under a usage profile
    pub fn project_annual_co2e(&self, per_core_kg: f64, usage: &UsageProfile) -> Result<f64> {
        usage.validate()?;
        Ok(usage.core_hours_per_year() * per_core_kg)
    }

    /// Express `kg` in the named equivalence kind
    pub fn to_equivalent(&self, kg: f64, kind: &str) -> Result<String> {
        Ok(kind.parse::<EquivalenceKind>()?.describe(kg))
    }

    /// Current yearly emissions and the savings of moving to the recommendation
    pub fn report(
        &self,
        recommendation: &RecommendationResult,
        usage: &UsageProfile,
    ) -> Result<SavingsReport> {
        let current = self.project_annual_co2e(recommendation.current_co2e, usage)?;
        let savings = self.project_annual_co2e(recommendation.co2e_delta(), usage)?;

        Ok(SavingsReport {
            target: recommendation.target_label().to_string(),
            usage: *usage,
            equivalence: self.equivalence,
            current_annual_co2e_kg: current,
            current_equivalent: self.equivalence.describe(current),
            potential_savings_kg: savings,
            savings_equivalent: self.equivalence.describe(savings),
        })
    }
}
