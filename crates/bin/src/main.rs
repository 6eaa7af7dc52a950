//! Hobart CLI binary.
//!
//! Reads price and factor tables from CSV, runs the factor-model pipeline
//! and writes every result table to disk.

mod integration;

use clap::{Parser, Subcommand, ValueEnum};
use hobart::data::{DescriptiveStats, describe, log_returns_by_column};
use hobart::output::{ExportFormat, ScalarTable};
use hobart::regression::FactorModel;
use hobart::{Pipeline, PipelineConfig};
use integration::csv_source::read_table;
use std::path::{Path, PathBuf};
use std::process;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hobart")]
#[command(about = "Hobart: factor-model regressions and residual diagnostics", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit a factor model and run the diagnostic battery for one dataset
    Run {
        /// Closing prices (first column: date)
        #[arg(long)]
        prices: PathBuf,

        /// Risk-free rate and factor returns (first column: date)
        #[arg(long)]
        factors: PathBuf,

        /// Factor model, overriding the configuration file
        #[arg(long, value_enum)]
        model: Option<ModelArg>,

        /// JSON configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Dataset name used in output file names
        #[arg(long, default_value = "dataset")]
        dataset: String,

        /// Output directory
        #[arg(long, default_value = "output")]
        out: PathBuf,

        /// Output format (csv, json or pretty-json)
        #[arg(long, default_value = "csv")]
        format: String,
    },

    /// Print descriptive statistics of log returns
    Describe {
        /// Closing prices (first column: date)
        #[arg(long)]
        prices: PathBuf,

        /// JSON configuration file (for the return convention)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModelArg {
    /// Single-factor CAPM on `Mkt-RF`
    Capm,
    /// Fama-French on `Mkt-RF`, `SMB` and `HML`
    FamaFrench,
}

impl From<ModelArg> for FactorModel {
    fn from(arg: ModelArg) -> Self {
        match arg {
            ModelArg::Capm => Self::capm(),
            ModelArg::FamaFrench => Self::fama_french(),
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            prices,
            factors,
            model,
            config,
            dataset,
            out,
            format,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(model) = model {
                config.model = model.into();
            }
            let format: ExportFormat = format.parse()?;
            run_dataset(&dataset, &prices, &factors, config, &out, format)?;
        }
        Commands::Describe { prices, config } => {
            let config = load_config(config.as_deref())?;
            describe_prices(&prices, &config)?;
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        return Ok(PipelineConfig::default());
    };
    info!(path = %path.display(), "Loading configuration");
    Ok(PipelineConfig::from_file(path)?)
}

fn run_dataset(
    dataset: &str,
    prices: &Path,
    factors: &Path,
    config: PipelineConfig,
    out: &Path,
    format: ExportFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let prices = read_table(prices)?;
    let factors = read_table(factors)?;
    info!(
        instruments = prices.width(),
        factors = factors.width(),
        "Loaded input tables"
    );

    let report = Pipeline::new(config).run(dataset, &prices, &factors)?;
    println!("{}", report.regression.to_ascii_table());

    let failures = report.failures();
    if !failures.is_empty() {
        println!("{} failed computation(s):", failures.len());
        for failure in &failures {
            println!("  {}", failure);
        }
        println!();
    }

    let written = report.export(out, format)?;
    println!("Wrote {} file(s) to {}", written.len(), out.display());
    Ok(())
}

fn describe_prices(path: &Path, config: &PipelineConfig) -> Result<(), Box<dyn std::error::Error>> {
    let prices = read_table(path)?;
    let (returns, skipped) = log_returns_by_column(&prices, config.return_convention)?;
    let returns = returns.sorted_ascending()?;
    for failure in &skipped {
        println!("  {}", failure);
    }

    let mut table = ScalarTable::new("Log returns", DescriptiveStats::FIELDS);
    for stats in describe(&returns) {
        table.push_row(&stats.series, stats.values())?;
    }
    println!("{}", table.to_ascii_table());
    Ok(())
}
