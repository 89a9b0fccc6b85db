//! Distance and latency conversion commands

use anyhow::Result;
use carbon_lib::{CarbonError, DistanceModel, Session};
use serde::Serialize;

use crate::output::{format_km, format_latency, print_json, OutputFormat};

#[derive(Serialize)]
struct DistanceOutput<'a> {
    from: &'a str,
    to: &'a str,
    distance_km: f64,
    latency_ms: f64,
}

#[derive(Serialize)]
struct ConversionOutput {
    latency_ms: f64,
    distance_km: f64,
}

/// Geodesic distance and round-trip latency between two datacenters
pub fn show_distance(session: &Session, from: &str, to: &str, format: OutputFormat) -> Result<()> {
    let index = session.index();
    for id in [from, to] {
        if !index.contains(id) {
            return Err(CarbonError::UnknownDatacenter(id.to_string()).into());
        }
    }

    let distance_km = if from == to {
        0.0
    } else {
        index
            .distance_km(from, to)
            .ok_or_else(|| CarbonError::UnknownDatacenter(to.to_string()))?
    };
    let latency_ms = session.model().distance_to_latency_ms(distance_km);

    match format {
        OutputFormat::Json => print_json(&DistanceOutput {
            from,
            to,
            distance_km,
            latency_ms,
        })?,
        OutputFormat::Table => {
            println!("{} -> {}", from, to);
            println!("Distance:               {}", format_km(distance_km));
            println!("Round-trip latency:     {}", format_latency(latency_ms));
        }
    }

    Ok(())
}

/// Distance reachable within a round-trip latency
pub fn show_range(model: &DistanceModel, latency_ms: f64, format: OutputFormat) -> Result<()> {
    let distance_km = model.latency_to_distance_km(latency_ms);

    match format {
        OutputFormat::Json => print_json(&ConversionOutput {
            latency_ms,
            distance_km,
        })?,
        OutputFormat::Table => {
            println!(
                "{} round trip reaches {}",
                format_latency(latency_ms),
                format_km(distance_km.max(0.0))
            );
        }
    }

    Ok(())
}

/// Round-trip latency to a datacenter at a given distance
pub fn show_latency(model: &DistanceModel, distance_km: f64, format: OutputFormat) -> Result<()> {
    let latency_ms = model.distance_to_latency_ms(distance_km);

    match format {
        OutputFormat::Json => print_json(&ConversionOutput {
            latency_ms,
            distance_km,
        })?,
        OutputFormat::Table => {
            println!(
                "{} away is {} round trip",
                format_km(distance_km),
                format_latency(latency_ms)
            );
        }
    }

    Ok(())
}
