mod analytics;
mod config;
mod dashboard;
mod dataset;
mod error;
mod logging;
mod types;
mod web;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use analytics::{
    calculate_metrics, hit_intervals, overall_metrics, pair_distribution, record_streaks, GroupBy,
};
use config::{load_config, to_toml, AppConfig};
use dataset::{export_to_file, Dataset, RecordFilter};
use types::HitColumn;
use web::{start_dashboard_server, AppState};

#[derive(Parser)]
#[command(name = "prediction-dashboard")]
#[command(version)]
#[command(about = "Hit-rate analytics dashboard for prediction records", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: PathBuf,

    /// Prediction CSV (overrides data.csv_path)
    #[arg(short, long, global = true)]
    data: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the web dashboard
    Serve {
        /// Dashboard port (overrides server.port)
        #[arg(short, long)]
        port: Option<u16>,
        /// Bind address (overrides server.host)
        #[arg(long)]
        host: Option<String>,
    },
    /// Print overall hit rates for the filtered records
    Summary {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Print hit rates grouped by one or more keys
    Metrics {
        /// Comma separated keys: hour, day_of_week, period_of_day, pair, date
        #[arg(short, long, default_value = "hour")]
        group_by: String,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Print hit/miss streaks
    Streaks {
        /// Hit column: without_delta or with_delta
        #[arg(long, default_value = "without_delta")]
        column: String,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Write the filtered records to CSV
    Export {
        /// Output CSV file path
        #[arg(short, long, default_value = dataset::EXPORT_FILE_NAME)]
        output: PathBuf,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Print the effective configuration as TOML
    ShowConfig,
}

#[derive(Args, Debug)]
struct FilterArgs {
    /// Currency pair ("Todos" for all)
    #[arg(long)]
    pair: Option<String>,
    /// Start date or timestamp (YYYY-MM-DD[ HH:MM:SS])
    #[arg(long)]
    start: Option<String>,
    /// End date or timestamp; a bare date covers the whole day
    #[arg(long)]
    end: Option<String>,
    /// Day of week (Monday..Sunday)
    #[arg(long)]
    day: Option<String>,
}

impl FilterArgs {
    fn to_filter(&self) -> Result<RecordFilter> {
        Ok(RecordFilter::from_params(
            self.pair.as_deref(),
            self.start.as_deref(),
            self.end.as_deref(),
            self.day.as_deref(),
        )?)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = load_config(Some(&cli.config))
        .with_context(|| format!("failed to load configuration from {}", cli.config.display()))?;
    if let Some(data) = &cli.data {
        config.data.csv_path = data.clone();
    }

    logging::init_logging(&config.logging, cli.verbose)?;
    info!("Prediction Dashboard v{}", env!("CARGO_PKG_VERSION"));

    if let Commands::ShowConfig = cli.command {
        print!("{}", to_toml(&config)?);
        return Ok(());
    }

    let dataset = load_dataset(&config.data.csv_path)?;

    match cli.command {
        Commands::Serve { port, host } => {
            let port = port.unwrap_or(config.server.port);
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let state = AppState::new(dataset, config.analysis.clone());
            start_dashboard_server(state, &host, port).await?;
        }
        Commands::Summary { filter } => {
            print_summary(&dataset, &filter.to_filter()?, &config);
        }
        Commands::Metrics { group_by, filter } => {
            let keys = GroupBy::parse_list(&group_by)?;
            print_metrics(&dataset, &filter.to_filter()?, &keys);
        }
        Commands::Streaks { column, filter } => {
            let column = HitColumn::from_str(&column)
                .ok_or_else(|| anyhow!("Invalid column: {}. Use without_delta or with_delta", column))?;
            print_streaks(&dataset, &filter.to_filter()?, column);
        }
        Commands::Export { output, filter } => {
            let view = dataset.filter(&filter.to_filter()?);
            let written = export_to_file(&view, &output)?;
            info!("Wrote {} rows to {}", written, output.display());
        }
        Commands::ShowConfig => {}
    }

    Ok(())
}

fn load_dataset(path: &Path) -> Result<Dataset> {
    let dataset = Dataset::load(path).with_context(|| format!("failed to load {}", path.display()))?;
    if dataset.is_empty() {
        warn!("{} contains no prediction rows", path.display());
    }
    Ok(dataset)
}

fn print_summary(dataset: &Dataset, filter: &RecordFilter, config: &AppConfig) {
    let view = dataset.filter(filter);
    let overall = overall_metrics(&view);

    println!("\n=== Prediction Summary ===");
    println!("Total predictions:        {}", overall.total_predictions);
    println!(
        "Hit rate (without delta): {:.2}% ({} hits)",
        overall.hit_rate_without_delta, overall.hits_without_delta
    );
    println!(
        "Hit rate (with delta):    {:.2}% ({} hits)",
        overall.hit_rate_with_delta, overall.hits_with_delta
    );

    println!("\n--- Pairs ---");
    for pair in pair_distribution(&view) {
        println!("{:<12} {:>8}", pair.label, pair.count);
    }

    println!("\n--- Minutes between hits ---");
    let policy = config.analysis.interval_policy();
    for column in HitColumn::all() {
        let summary = analytics::intervals::summarize(&hit_intervals(&view, column, &policy));
        match (summary.mean_minutes, summary.median_minutes) {
            (Some(mean), Some(median)) => println!(
                "{:<14} mean {:>8.1} | median {:>8.1} | n={}",
                column.label(),
                mean,
                median,
                summary.count
            ),
            _ => println!("{:<14} fewer than two hits", column.label()),
        }
    }
}

fn print_metrics(dataset: &Dataset, filter: &RecordFilter, keys: &[GroupBy]) {
    let view = dataset.filter(filter);
    let header: Vec<&str> = keys.iter().map(|k| k.as_str()).collect();

    println!("\n=== Hit Rate by {} ===", header.join(", "));
    println!("{:<30} {:>10} {:>10} {:>8}", "Group", "No delta %", "Delta %", "Count");
    println!("{}", "-".repeat(61));
    for m in calculate_metrics(&view, keys) {
        println!(
            "{:<30} {:>10.2} {:>10.2} {:>8}",
            m.label, m.hit_rate_without_delta, m.hit_rate_with_delta, m.total_without_delta
        );
    }
}

fn print_streaks(dataset: &Dataset, filter: &RecordFilter, column: HitColumn) {
    let view = dataset.filter(filter);
    let runs = record_streaks(&view, column);
    let summary = analytics::streaks::summarize(&runs);

    println!("\n=== Streaks ({}) ===", column.label());
    println!("Current streak:      {}", summary.current_streak);
    println!("Longest hit streak:  {}", summary.max_hit_streak);
    println!("Longest miss streak: {}", summary.max_miss_streak);
    println!("Average hit streak:  {:.2}", summary.avg_hit_streak);
    println!("Average miss streak: {:.2}", summary.avg_miss_streak);

    println!("\n{:<8} {:>8} {:>10}", "Outcome", "Length", "Frequency");
    for row in analytics::streak_histogram(&runs) {
        println!("{:<8} {:>8} {:>10}", row.outcome.as_str(), row.length, row.frequency);
    }
}
