// src/bin/cli.rs

//! DCAT Harvester CLI
//!
//! Local execution entry point.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use harvester::{
    config::load_config,
    convert::{local_to_remote, remote_to_local},
    error::{AppError, Result},
    models::{ConverterProfile, LocalDataset, RemoteDataset},
    pipeline::Harvester,
    storage::LocalStorage,
};

/// DCAT Harvester - DCAT JSON catalog synchronizer
#[derive(Parser, Debug)]
#[command(
    name = "harvester",
    version,
    about = "Harvests DCAT JSON catalogs into a local catalog"
)]
struct Cli {
    /// Path to storage directory holding records, work items and run reports
    #[arg(short, long, default_value = "storage")]
    storage_dir: PathBuf,

    /// Path to config file (default: {storage_dir}/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Harvest configured sources
    Run {
        /// Only harvest the source with this id
        #[arg(long)]
        source: Option<String>,
    },

    /// Validate the configuration file
    Validate,

    /// Show stored records and the latest run of each source
    Info,

    /// Convert a single dataset file between remote and local shapes
    Convert {
        /// JSON file holding one dataset
        file: PathBuf,

        /// Convert a local record back into a remote dataset
        #[arg(long)]
        reverse: bool,
    },
}

/// Initialize logging based on verbosity flag and configured level.
fn init_logging(verbose: bool, level: &str) {
    let level = if verbose { "debug" } else { level };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| cli.storage_dir.join("config.toml"));
    let config = match load_config(&config_path) {
        Ok(config) => config,
        Err(e) => {
            init_logging(cli.verbose, "info");
            log::error!("Config validation failed: {}", e);
            return Err(e);
        }
    };
    init_logging(cli.verbose, &config.logging.level);

    log::info!("Loaded configuration from {}", config_path.display());

    let storage = Arc::new(LocalStorage::with_site_user(
        &cli.storage_dir,
        config.storage.site_user.clone(),
    ));

    match cli.command {
        Command::Run { source } => {
            let sources: Vec<_> = match source.as_deref() {
                Some(id) => vec![
                    config
                        .source(id)
                        .cloned()
                        .ok_or_else(|| AppError::config(format!("Unknown source: {id}")))?,
                ],
                None => config.sources.clone(),
            };
            if sources.is_empty() {
                log::warn!("No sources configured in {}", config_path.display());
                return Ok(());
            }

            let harvester = Harvester::new(&config, storage.clone(), storage.clone());
            let mut failed = 0;
            for (i, source) in sources.iter().enumerate() {
                log::info!("Source {}/{}: {}", i + 1, sources.len(), source.id);
                let report = harvester.run(source).await?;
                if !report.is_clean() {
                    failed += 1;
                }
            }

            if failed > 0 {
                log::warn!("{} of {} sources finished with errors", failed, sources.len());
            } else {
                log::info!("Harvest complete!");
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");
            log::info!("✓ Config OK ({} sources)", config.sources.len());
            log::info!("All validations passed!");
        }

        Command::Info => {
            log::info!("Storage directory: {}", cli.storage_dir.display());

            let records = storage.list_records().await?;
            let active = records.iter().filter(|r| r.is_active()).count();
            log::info!("Records: {} active, {} deleted", active, records.len() - active);

            for source in &config.sources {
                match storage.latest_run(&source.id).await? {
                    Some(report) => log::info!(
                        "Last run of {} at {}: {}",
                        source.id,
                        report.started_at,
                        report.summary()
                    ),
                    None => log::info!("No runs of {} yet.", source.id),
                }
            }
        }

        Command::Convert { file, reverse } => {
            let content = tokio::fs::read_to_string(&file).await?;
            let output = if reverse {
                let local: LocalDataset = serde_json::from_str(&content)?;
                serde_json::to_string_pretty(&local_to_remote(&local))?
            } else {
                let remote: RemoteDataset = serde_json::from_str(&content)?;
                let conversion = remote_to_local(&remote, &ConverterProfile::default());
                for warning in &conversion.warnings {
                    log::warn!("{}", warning);
                }
                serde_json::to_string_pretty(&conversion.record)?
            };
            println!("{output}");
        }
    }

    log::info!("Done!");

    Ok(())
}
