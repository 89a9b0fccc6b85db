//! Recommendation and savings command

use anyhow::Result;
use carbon_lib::{
    EquivalenceKind, RecommendationOutcome, RecommendationResult, SavingsProjector,
    SavingsReport, Session, UsageProfile,
};
use colored::Colorize;
use serde::Serialize;
use tabled::Tabled;

use crate::output::{
    format_annual_kg, format_co2e, format_km, format_latency, print_info, print_json, print_success,
    print_table, print_warning, OutputFormat,
};

/// Row for the ranked candidates table
#[derive(Tabled)]
struct CandidateRow {
    #[tabled(rename = "Rank")]
    rank: usize,
    #[tabled(rename = "Datacenter")]
    datacenter: String,
    #[tabled(rename = "CO2e")]
    co2e: String,
    #[tabled(rename = "Saving")]
    co2e_delta: String,
    #[tabled(rename = "Distance")]
    distance: String,
    #[tabled(rename = "Latency")]
    latency: String,
}

#[derive(Serialize)]
struct RecommendOutput<'a> {
    recommendation: &'a RecommendationResult,
    savings: &'a SavingsReport,
}

/// Recommend a lower-emission datacenter and project the yearly savings
pub fn recommend(
    session: &Session,
    datacenter: &str,
    subtypes: &[String],
    latency_ms: f64,
    usage: &UsageProfile,
    equivalence: &str,
    format: OutputFormat,
) -> Result<()> {
    let equivalence: EquivalenceKind = equivalence.parse()?;
    let result = session.recommend(datacenter, subtypes, latency_ms)?;
    let savings = SavingsProjector::new(equivalence).report(&result, usage)?;

    match format {
        OutputFormat::Json => {
            print_json(&RecommendOutput {
                recommendation: &result,
                savings: &savings,
            })?;
        }
        OutputFormat::Table => {
            print_recommendation(&result);
            println!();
            print_savings(&savings);
        }
    }

    Ok(())
}

fn print_recommendation(result: &RecommendationResult) {
    let filter = if result.subtypes.is_empty() {
        "all subtypes".to_string()
    } else {
        result.subtypes.join(", ")
    };

    println!("{}", "Recommendation".bold());
    println!("{}", "=".repeat(50));
    println!("Current datacenter:     {}", result.current_datacenter.cyan());
    println!("Subtypes:               {}", filter);
    println!(
        "Latency budget:         {} ({} reachable)",
        format_latency(result.latency_budget_ms),
        format_km(result.distance_budget_km)
    );
    println!("Current CO2e:           {}", format_co2e(result.current_co2e));
    println!();

    let rows: Vec<CandidateRow> = result
        .candidates
        .iter()
        .enumerate()
        .map(|(i, c)| CandidateRow {
            rank: i + 1,
            datacenter: c.datacenter.clone(),
            co2e: format_co2e(c.co2e),
            co2e_delta: format_co2e(c.co2e_delta).green().to_string(),
            distance: format_km(c.distance_km),
            latency: format_latency(c.latency_ms),
        })
        .collect();
    print_table(&rows, "No lower-emission datacenter within the latency budget");
    println!();

    match &result.outcome {
        RecommendationOutcome::Alternative(best) => print_success(&format!(
            "Move to {} to save {} kg CO2e per core hour",
            best.datacenter.bold(),
            format_co2e(best.co2e_delta)
        )),
        RecommendationOutcome::NoAlternativeInRange
        | RecommendationOutcome::NoBetterAlternativeInRange => {
            print_warning(result.target_label())
        }
    }
}

fn print_savings(report: &SavingsReport) {
    let usage = &report.usage;

    println!("{}", "Potential Savings".bold());
    println!("{}", "-".repeat(50));
    print_info(&format!(
        "{} instance(s) x {} cores, {} h/day, {} days/week",
        usage.instance_count, usage.cores_per_instance, usage.hours_per_day, usage.days_per_week
    ));
    println!("Target:                 {}", report.target);
    println!(
        "Current yearly CO2e:    {} ({})",
        format_annual_kg(report.current_annual_co2e_kg),
        report.current_equivalent
    );
    println!(
        "{} {} ({})",
        "Yearly savings:        ".bold(),
        format_annual_kg(report.potential_savings_kg).green().bold(),
        report.savings_equivalent
    );
}
