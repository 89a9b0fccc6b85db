//! Latency/distance conversion over optical fibre

use serde::{Deserialize, Serialize};

/// Signal speed in fibre, km per millisecond
pub const FIBRE_SPEED_KM_PER_MS: f64 = 200.0;

/// A latency figure covers the path there and back
pub const ROUND_TRIP_FACTOR: f64 = 2.0;

/// Real paths are longer than the straight line (10%)
pub const DEFAULT_PATH_ADJUSTMENT_PCT: f64 = 0.1;

/// Fixed latency added by switching and routing equipment
pub const DEFAULT_EQUIPMENT_LATENCY_MS: f64 = 1.0;

/// Converts between a latency in milliseconds and a geodesic distance in km
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistanceModel {
    /// Extra path length relative to the geodesic (0.1 = 10%)
    pub path_adjustment_pct: f64,
    /// Latency contributed by network equipment
    pub equipment_latency_ms: f64,
}

impl Default for DistanceModel {
    fn default() -> Self {
        Self {
            path_adjustment_pct: DEFAULT_PATH_ADJUSTMENT_PCT,
            equipment_latency_ms: DEFAULT_EQUIPMENT_LATENCY_MS,
        }
    }
}

impl DistanceModel {
    pub fn new(path_adjustment_pct: f64, equipment_latency_ms: f64) -> Self {
        Self {
            path_adjustment_pct,
            equipment_latency_ms,
        }
    }

    /// Geodesic distance reachable within a round-trip latency, in whole km
    ///
    /// A latency below the equipment latency yields zero or a negative
    /// distance, which callers treat as "nothing reachable".
    pub fn latency_to_distance_km(&self, latency_ms: f64) -> f64 {
        let km = (latency_ms - self.equipment_latency_ms) / ROUND_TRIP_FACTOR
            * FIBRE_SPEED_KM_PER_MS;
        let adjusted_km = km / (1.0 + self.path_adjustment_pct);

        adjusted_km.round_ties_even()
    }

    /// Round-trip latency to a datacenter `km` away, to 2 decimal places
    pub fn distance_to_latency_ms(&self, km: f64) -> f64 {
        let adjusted_km = km * (1.0 + self.path_adjustment_pct) * ROUND_TRIP_FACTOR;
        let latency = adjusted_km / FIBRE_SPEED_KM_PER_MS + self.equipment_latency_ms;

        round_to_hundredths(latency)
    }
}

/// Round to two decimal places, ties to even
pub(crate) fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latency_to_distance_default() {
        let model = DistanceModel::default();
        // (50 - 1) / 2 * 200 / 1.1 = 4454.54...
        assert_eq!(model.latency_to_distance_km(50.0), 4455.0);
        assert_eq!(model.latency_to_distance_km(1.0), 0.0);
    }

    #[test]
    fn test_latency_below_equipment_is_not_reachable() {
        let model = DistanceModel::default();
        assert!(model.latency_to_distance_km(0.0) <= 0.0);
        assert!(model.latency_to_distance_km(0.5) <= 0.0);
    }

    #[test]
    fn test_distance_to_latency_default() {
        let model = DistanceModel::default();
        // 1000 * 1.1 * 2 / 200 + 1 = 12.0
        assert_eq!(model.distance_to_latency_ms(1000.0), 12.0);
        assert_eq!(model.distance_to_latency_ms(0.0), 1.0);
        // 111.32 * 2.2 / 200 + 1 = 2.22452
        assert_eq!(model.distance_to_latency_ms(111.32), 2.22);
    }

    #[test]
    fn test_round_trip_stability() {
        for model in [DistanceModel::default(), DistanceModel::new(0.25, 3.0)] {
            let mut latency = model.equipment_latency_ms;
            while latency <= 200.0 {
                let km = model.latency_to_distance_km(latency);
                let back = model.distance_to_latency_ms(km);
                assert!(
                    (back - latency).abs() <= 0.05,
                    "latency {latency} -> {km} km -> {back}"
                );
                latency += 0.37;
            }
        }
    }

    #[test]
    fn test_custom_adjustment_shrinks_range() {
        let loose = DistanceModel::new(0.0, 1.0);
        let strict = DistanceModel::new(0.5, 1.0);
        assert_eq!(loose.latency_to_distance_km(11.0), 1000.0);
        assert!(strict.latency_to_distance_km(11.0) < 1000.0);
    }

    #[test]
    fn test_round_to_hundredths() {
        assert_eq!(round_to_hundredths(19.6974607), 19.7);
        assert_eq!(round_to_hundredths(2.22452), 2.22);
    }
}
