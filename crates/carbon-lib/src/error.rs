//! Error taxonomy for recommendation and savings queries

use thiserror::Error;

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, CarbonError>;

/// Errors surfaced to the presentation layer
#[derive(Error, Debug)]
pub enum CarbonError {
    /// No emission records for the datacenter under the active subtype filter
    #[error("No emissions data for datacenter '{datacenter}'{}", describe_filter(.subtypes))]
    MissingData {
        datacenter: String,
        subtypes: Vec<String>,
    },

    #[error("Unknown datacenter '{0}'")]
    UnknownDatacenter(String),

    #[error("Unsupported equivalence kind '{0}'")]
    UnsupportedEquivalenceKind(String),

    /// A usage profile field is outside its allowed range
    #[error("Invalid usage profile: {field} = {value} (allowed {min}..={max})")]
    InvalidUsageProfile {
        field: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },

    #[error("Dataset error: {0}")]
    Dataset(String),

    #[error("Failed to parse dataset: {0}")]
    Parse(#[from] serde_json::Error),
}

impl CarbonError {
    /// Short machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            CarbonError::MissingData { .. } => "missing_data",
            CarbonError::UnknownDatacenter(_) => "unknown_datacenter",
            CarbonError::UnsupportedEquivalenceKind(_) => "unsupported_equivalence_kind",
            CarbonError::InvalidUsageProfile { .. } => "invalid_usage_profile",
            CarbonError::Dataset(_) | CarbonError::Parse(_) => "dataset",
        }
    }
}

fn describe_filter(subtypes: &[String]) -> String {
    if subtypes.is_empty() {
        String::new()
    } else {
        format!(" with subtypes [{}]", subtypes.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_data_message_without_filter() {
        let err = CarbonError::MissingData {
            datacenter: "west_europe".to_string(),
            subtypes: vec![],
        };
        assert_eq!(
            err.to_string(),
            "No emissions data for datacenter 'west_europe'"
        );
        assert_eq!(err.kind(), "missing_data");
    }

    #[test]
    fn test_missing_data_message_with_filter() {
        let err = CarbonError::MissingData {
            datacenter: "west_europe".to_string(),
            subtypes: vec!["D2s".to_string(), "D4s".to_string()],
        };
        assert!(err.to_string().ends_with("with subtypes [D2s, D4s]"));
    }

    #[test]
    fn test_invalid_usage_profile_message() {
        let err = CarbonError::InvalidUsageProfile {
            field: "hours_per_day",
            value: 25,
            min: 1,
            max: 24,
        };
        assert_eq!(
            err.to_string(),
            "Invalid usage profile: hours_per_day = 25 (allowed 1..=24)"
        );
    }
}
