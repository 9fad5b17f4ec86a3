//! gridreport CLI - Merge sharded device-test results into one report.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use gridreport::artifact::ArtifactLocator;
use gridreport::config::{self, Config};
use gridreport::dispatcher::ReportDispatcher;
use gridreport::matrix::RunMatrixMap;

#[derive(Parser)]
#[command(name = "gridreport")]
#[command(about = "Merge sharded device-test results into one report", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "gridreport.toml")]
    config: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge a run's results, render reports and update the timing baseline
    Report {
        /// Override the run directory
        #[arg(long)]
        run_root: Option<PathBuf>,
    },

    /// List the artifacts that would be collected from a run
    Locate {
        /// Override the run directory
        #[arg(long)]
        run_root: Option<PathBuf>,
    },

    /// Validate configuration file
    Validate,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Report { run_root } => generate_report(&cli.config, run_root).await,
        Commands::Locate { run_root } => locate_artifacts(&cli.config, run_root),
        Commands::Validate => validate_config(&cli.config),
    }
}

fn load(config_path: &Path, run_root: Option<PathBuf>) -> Result<Config> {
    let mut config = config::load_config(config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    if let Some(run_root) = run_root {
        config.report.run_root = run_root;
    }

    info!("Loaded configuration from {}", config_path.display());
    Ok(config)
}

async fn generate_report(config_path: &Path, run_root: Option<PathBuf>) -> Result<()> {
    let config = load(config_path, run_root)?;
    let matrices = RunMatrixMap::load(&config.report.run_root)?;
    info!(
        "Generating report for {} matrices in {}",
        matrices.len(),
        config.report.run_root.display()
    );

    let status = ReportDispatcher::from_config(&config)
        .generate(&matrices)
        .await?;
    std::process::exit(status.code());
}

fn locate_artifacts(config_path: &Path, run_root: Option<PathBuf>) -> Result<()> {
    let config = load(config_path, run_root)?;
    let locator = ArtifactLocator::new(&config.report.files_to_download[..])?;
    let artifacts = locator.locate(&config.report.run_root)?;

    println!("Found {} artifacts:", artifacts.len());
    for path in &artifacts {
        println!("  {}", path.display());
    }

    Ok(())
}

fn validate_config(config_path: &Path) -> Result<()> {
    match config::load_config(config_path) {
        Ok(config) => {
            println!("Configuration is valid!");
            println!();
            println!("Settings:");
            println!("  Run root: {}", config.report.run_root.display());
            println!("  Platform: {:?}", config.report.platform);
            println!("  Flaky test attempts: {}", config.report.flaky_test_attempts);
            println!("  Timing store: {}", config.timing.store_dir.display());
            println!("  JUnit file: {}", config.output.junit_file);

            if let Err(e) = ArtifactLocator::new(&config.report.files_to_download[..]) {
                eprintln!("Configuration error: {}", e);
                std::process::exit(1);
            }
            if let Err(e) = config.report.load_shard_chunks() {
                eprintln!("Configuration error: {:#}", e);
                std::process::exit(1);
            }

            Ok(())
        }
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            std::process::exit(1);
        }
    }
}
