//! Distance between datacenters
//!
//! Network latency is approximated by geodesic distance over fibre:
//! - [`DistanceModel`] converts a latency budget to kilometres and back
//! - [`DistanceIndex`] holds the precomputed pairwise distances

mod index;
mod model;

pub use index::{geodesic_distance_km, DistanceIndex};
pub(crate) use model::round_to_hundredths;
pub use model::{
    DistanceModel, DEFAULT_EQUIPMENT_LATENCY_MS, DEFAULT_PATH_ADJUSTMENT_PCT,
    FIBRE_SPEED_KM_PER_MS, ROUND_TRIP_FACTOR,
};
