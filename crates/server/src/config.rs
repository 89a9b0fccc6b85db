//! Service configuration

use anyhow::{Context, Result};
use carbon_lib::distance::{
    DistanceModel, DEFAULT_EQUIPMENT_LATENCY_MS, DEFAULT_PATH_ADJUSTMENT_PCT,
};
use serde::Deserialize;

/// Service configuration, read from `CARBON_*` environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Name reported in structured logs
    #[serde(default = "default_node_name")]
    pub node_name: String,

    /// Port for the query API and health/metrics endpoints
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Instance dataset (JSON array of instance records)
    #[serde(default = "default_dataset_path")]
    pub dataset_path: String,

    /// Extra network path length relative to the geodesic
    #[serde(default = "default_path_adjustment_pct")]
    pub path_adjustment_pct: f64,

    /// Latency added by network equipment
    #[serde(default = "default_equipment_latency_ms")]
    pub equipment_latency_ms: f64,
}

fn default_node_name() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown".to_string())
}

fn default_api_port() -> u16 {
    8080
}

fn default_dataset_path() -> String {
    "data/instance_data.json".to_string()
}

fn default_path_adjustment_pct() -> f64 {
    DEFAULT_PATH_ADJUSTMENT_PCT
}

fn default_equipment_latency_ms() -> f64 {
    DEFAULT_EQUIPMENT_LATENCY_MS
}

impl ServerConfig {
    /// Load configuration from the process environment
    pub fn load() -> Result<Self> {
        Self::from_environment(config::Environment::with_prefix("CARBON"))
    }

    fn from_environment(env: config::Environment) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(env.try_parsing(true))
            .build()
            .context("Failed to read configuration")?;

        let config: ServerConfig = config
            .try_deserialize()
            .context("Invalid CARBON_* configuration")?;

        if config.path_adjustment_pct.is_nan() || config.path_adjustment_pct <= -1.0 {
            anyhow::bail!(
                "CARBON_PATH_ADJUSTMENT_PCT must be greater than -1, got {}",
                config.path_adjustment_pct
            );
        }

        if !config.equipment_latency_ms.is_finite() || config.equipment_latency_ms < 0.0 {
            anyhow::bail!(
                "CARBON_EQUIPMENT_LATENCY_MS must be a non-negative number, got {}",
                config.equipment_latency_ms
            );
        }

        Ok(config)
    }

    pub fn distance_model(&self) -> DistanceModel {
        DistanceModel::new(self.path_adjustment_pct, self.equipment_latency_ms)
    }
}
