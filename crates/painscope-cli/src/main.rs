mod input;
mod pipeline;
mod trend;

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use painscope_scoring::Pipeline;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "painscope")]
#[command(about = "Score pain signals and rank clusters as build opportunities")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Normalize and dedup signals, printing fingerprint records for new ones
    Ingest {
        /// JSON Lines file of raw signals
        #[arg(long)]
        signals: PathBuf,
        /// JSON Lines file of fingerprint records from earlier runs
        #[arg(long)]
        existing: Option<PathBuf>,
    },
    /// Score signals and print one pain instance per line
    Score {
        /// JSON Lines file of raw signals
        #[arg(long)]
        signals: PathBuf,
    },
    /// Run the full pipeline and print a recommendation per cluster
    Analyze {
        /// JSON Lines file of raw signals
        #[arg(long)]
        signals: PathBuf,
        /// JSON object mapping cluster id to member signal ids
        #[arg(long)]
        assignments: PathBuf,
        /// Evaluation date (YYYY-MM-DD); defaults to the newest signal's day
        #[arg(long)]
        as_of: Option<NaiveDate>,
        /// Print one JSON object per cluster instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Print per-day trend payloads from stored daily metrics
    Trend {
        /// JSON array of daily metric rows
        #[arg(long)]
        metrics: PathBuf,
        /// Last day of the series (YYYY-MM-DD)
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },
    /// Print the resolved configuration
    Config,
}

fn main() -> anyhow::Result<()> {
    // --help and usage errors must not depend on the environment.
    let cli = Cli::parse();

    let config = painscope_core::load_pipeline_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Some(Commands::Ingest { signals, existing }) => {
            let pipeline = Pipeline::from_config(config)?;
            pipeline::run_ingest(&pipeline, &signals, existing.as_deref())?;
        }
        Some(Commands::Score { signals }) => {
            let pipeline = Pipeline::from_config(config)?;
            pipeline::run_score(&pipeline, &signals)?;
        }
        Some(Commands::Analyze {
            signals,
            assignments,
            as_of,
            json,
        }) => {
            let pipeline = Pipeline::from_config(config)?;
            pipeline::run_analyze(&pipeline, &signals, &assignments, as_of, json)?;
        }
        Some(Commands::Trend { metrics, as_of }) => {
            trend::run_trend(&config.trend, &metrics, as_of)?;
        }
        Some(Commands::Config) => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        None => println!("painscope: pass --help to list commands"),
    }

    Ok(())
}
