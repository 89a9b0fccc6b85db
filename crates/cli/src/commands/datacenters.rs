//! Datacenter overview command

use anyhow::Result;
use carbon_lib::{DatacenterSummary, Session};
use colored::Colorize;
use tabled::Tabled;

use crate::output::{format_co2e, print_json, print_table, OutputFormat};

/// Row for the datacenter table
#[derive(Tabled)]
struct DatacenterRow {
    #[tabled(rename = "Datacenter")]
    id: String,
    #[tabled(rename = "Latitude")]
    latitude: String,
    #[tabled(rename = "Longitude")]
    longitude: String,
    #[tabled(rename = "Mean CO2e")]
    mean_co2e: String,
    #[tabled(rename = "Records")]
    records: usize,
}

impl From<&DatacenterSummary> for DatacenterRow {
    fn from(dc: &DatacenterSummary) -> Self {
        Self {
            id: dc.id.clone(),
            latitude: format!("{:.4}", dc.latitude),
            longitude: format!("{:.4}", dc.longitude),
            mean_co2e: dc
                .mean_co2e
                .map(format_co2e)
                .unwrap_or_else(|| "-".dimmed().to_string()),
            records: dc.record_count,
        }
    }
}

/// List every datacenter with its mean emissions over all subtypes
pub fn list_datacenters(session: &Session, format: OutputFormat) -> Result<()> {
    let overview = session.overview();

    match format {
        OutputFormat::Json => print_json(&overview)?,
        OutputFormat::Table => {
            let rows: Vec<DatacenterRow> = overview.iter().map(DatacenterRow::from).collect();
            print_table(&rows, "No datacenters in dataset");
            println!("\nTotal: {} datacenters", rows.len());
            println!(
                "Subtypes: {}",
                session.dataset().subtypes().join(", ").dimmed()
            );
        }
    }

    Ok(())
}
