//! Datacenter carbon library
//!
//! This crate provides the core functionality for:
//! - Latency/distance conversion and pairwise geodesic distances
//! - Lower-emission datacenter recommendations within a latency budget
//! - Annual CO2e savings projections and equivalences
//! - Dataset normalization, health checks and observability

pub mod dataset;
pub mod distance;
pub mod emissions;
pub mod error;
pub mod health;
pub mod models;
pub mod observability;
pub mod recommender;
pub mod savings;
pub mod session;

pub use dataset::{Dataset, DatasetSource, JsonFileSource};
pub use distance::{DistanceIndex, DistanceModel};
pub use emissions::EmissionsTable;
pub use error::{CarbonError, Result};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{CarbonMetrics, StructuredLogger};
pub use recommender::{Candidate, RecommendationOutcome, RecommendationResult, Recommender};
pub use savings::{EquivalenceKind, SavingsProjector, SavingsReport};
pub use session::{DatacenterSummary, Session};
