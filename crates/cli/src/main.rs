//! Datacenter CO2 CLI
//!
//! A command-line tool for finding lower-emission datacenters within a
//! latency budget and projecting the yearly savings of moving there.

mod commands;
mod config;
mod output;

use anyhow::{Context, Result};
use carbon_lib::{
    distance::{DEFAULT_EQUIPMENT_LATENCY_MS, DEFAULT_PATH_ADJUSTMENT_PCT},
    models::UsageProfile,
    DistanceModel, JsonFileSource, Session,
};
use clap::{Parser, Subcommand};
use commands::{datacenters, distance, recommend};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Datacenter CO2 CLI
#[derive(Parser)]
#[command(name = "dcco2")]
#[command(author, version, about = "Find lower-emission datacenters within a latency budget", long_about = None)]
pub struct Cli {
    /// Instance dataset (JSON); falls back to the config file
    #[arg(long, env = "DCCO2_DATASET")]
    pub dataset: Option<String>,

    /// Output format (defaults to the config file, then table)
    #[arg(long, short)]
    pub format: Option<output::OutputFormat>,

    /// Enable verbose output
    #[arg(long, short)]
    pub verbose: bool,

    /// Extra network path length relative to the geodesic (0.1 = 10%)
    #[arg(long, default_value_t = DEFAULT_PATH_ADJUSTMENT_PCT, allow_negative_numbers = true)]
    pub path_adjustment: f64,

    /// Latency added by network equipment, in ms
    #[arg(long, default_value_t = DEFAULT_EQUIPMENT_LATENCY_MS, allow_negative_numbers = true)]
    pub equipment_latency: f64,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Recommend a lower-emission datacenter and project the savings
    Recommend {
        /// Datacenter the workload runs in today
        #[arg(long, short)]
        datacenter: String,

        /// Round-trip latency budget in ms
        #[arg(long, short, default_value_t = 50.0)]
        latency: f64,

        /// Activity subtype to average over (repeatable, all if omitted)
        #[arg(long = "subtype", short)]
        subtypes: Vec<String>,

        /// Number of instances
        #[arg(long, default_value_t = 1)]
        instances: u32,

        /// Cores per instance
        #[arg(long, default_value_t = 4)]
        cores: u32,

        /// Hours per day the workload runs
        #[arg(long, default_value_t = 4)]
        hours: u32,

        /// Days per week the workload runs
        #[arg(long, default_value_t = 7)]
        days: u32,

        /// Equivalence used to express the savings
        #[arg(long, default_value = "car_kilometers")]
        equivalence: String,
    },

    /// List datacenters with their mean emissions
    Datacenters,

    /// Distance and round-trip latency between two datacenters
    Distance {
        /// First datacenter
        from: String,
        /// Second datacenter
        to: String,
    },

    /// Latency/distance conversions
    #[command(subcommand)]
    Latency(LatencyCommands),
}

#[derive(Subcommand)]
pub enum LatencyCommands {
    /// Geodesic distance reachable within a latency budget
    Range {
        /// Round-trip latency in ms
        ms: f64,
    },

    /// Round-trip latency to a datacenter at a given distance
    Of {
        /// Geodesic distance in km
        km: f64,
    },
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_session(dataset: Option<&str>, cfg: &config::Config, model: DistanceModel) -> Result<Session> {
    let path = dataset
        .map(str::to_string)
        .or_else(|| cfg.dataset_path.clone())
        .context("No dataset given: pass --dataset, set DCCO2_DATASET, or set dataset_path in the config file")?;

    debug!(dataset = %path, "Loading dataset");
    let session = Session::load(&JsonFileSource::new(&path), model)
        .with_context(|| format!("Failed to load dataset {}", path))?;
    debug!(
        datacenters = session.index().len(),
        build_ms = session.index_build_time().as_millis() as u64,
        "Distance index built"
    );

    Ok(session)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cfg = config::Config::load()?;
    let format = match cli.format {
        Some(format) => format,
        None => cfg.output_format()?,
    };

    if cli.path_adjustment.is_nan() || cli.path_adjustment <= -1.0 {
        anyhow::bail!(
            "--path-adjustment must be greater than -1, got {}",
            cli.path_adjustment
        );
    }
    if !cli.equipment_latency.is_finite() || cli.equipment_latency < 0.0 {
        anyhow::bail!(
            "--equipment-latency must be a non-negative number, got {}",
            cli.equipment_latency
        );
    }
    let model = DistanceModel::new(cli.path_adjustment, cli.equipment_latency);

    // Execute command
    match cli.command {
        Commands::Recommend {
            datacenter,
            latency,
            subtypes,
            instances,
            cores,
            hours,
            days,
            equivalence,
        } => {
            let usage = UsageProfile::new(instances, cores, hours, days)?;
            let session = load_session(cli.dataset.as_deref(), &cfg, model)?;
            recommend::recommend(&session, &datacenter, &subtypes, latency, &usage, &equivalence, format)?;
        }
        Commands::Datacenters => {
            let session = load_session(cli.dataset.as_deref(), &cfg, model)?;
            datacenters::list_datacenters(&session, format)?;
        }
        Commands::Distance { from, to } => {
            let session = load_session(cli.dataset.as_deref(), &cfg, model)?;
            distance::show_distance(&session, &from, &to, format)?;
        }
        Commands::Latency(latency_cmd) => match latency_cmd {
            LatencyCommands::Range { ms } => {
                distance::show_range(&model, ms, format)?;
            }
            LatencyCommands::Of { km } => {
                distance::show_latency(&model, km, format)?;
            }
        },
    }

    Ok(())
}
