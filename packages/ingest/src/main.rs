#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the hazard dataset ingestion tool.

use clap::{Parser, Subcommand};
use hazard_map_database::paths;
use hazard_map_database::store::ZoneStore;
use hazard_map_hazard_models::HazardDataset;
use hazard_map_ingest::{all_datasets, sync_all, sync_dataset};
use hazard_map_source::registry;

#[derive(Parser)]
#[command(name = "hazard_map_ingest", about = "Hazard dataset ingestion tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest every dataset whose table is absent or empty
    SyncAll {
        /// Ingest all datasets even if their tables are populated
        #[arg(long)]
        force: bool,
    },
    /// Ingest a specific dataset
    Sync {
        /// Dataset identifier (e.g. "liquefaction")
        dataset: HazardDataset,
        /// Ingest even if the dataset's table is populated
        #[arg(long)]
        force: bool,
    },
    /// List all configured datasets
    Datasets,
    /// Drop a dataset's table (irreversible)
    Drop {
        /// Dataset identifier, or nothing with `--all`
        dataset: Option<HazardDataset>,
        /// Drop every dataset table
        #[arg(long)]
        all: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();

    match cli.command {
        Commands::SyncAll { force } => {
            let store = ZoneStore::open(&paths::zones_db_path())?;
            let (loaded, failed) = sync_all(&store, force).await;
            log::info!("Sync complete: {loaded} datasets loaded, {failed} failed");
            if failed > 0 {
                return Err(format!("{failed} dataset(s) failed to ingest").into());
            }
        }
        Commands::Sync { dataset, force } => {
            let store = ZoneStore::open(&paths::zones_db_path())?;

            if !force {
                let needing = store.needing_ingest(&[dataset])?;
                if needing.is_empty() {
                    log::info!(
                        "{dataset}: table exists and is populated, skipping (use --force to refresh)"
                    );
                    return Ok(());
                }
            }

            let def = registry::find_dataset(dataset)
                .ok_or_else(|| format!("no definition configured for dataset {dataset}"))?;
            let count = sync_dataset(&store, &def).await?;
            log::info!("{dataset}: {count} zones loaded");
        }
        Commands::Datasets => {
            println!("{:<16} SRID   NAME", "DATASET");
            println!("{}", "-".repeat(60));
            for def in all_datasets() {
                println!("{:<16} {:<6} {}", def.dataset.to_string(), def.source_srid, def.name);
            }
        }
        Commands::Drop { dataset, all } => {
            let store = ZoneStore::open(&paths::zones_db_path())?;
            match (dataset, all) {
                (Some(dataset), false) => {
                    store.drop_dataset(dataset)?;
                    log::info!("{dataset}: dropped");
                }
                (None, true) => {
                    for &dataset in HazardDataset::all() {
                        store.drop_dataset(dataset)?;
                    }
                    log::info!("All dataset tables dropped");
                }
                _ => return Err("pass exactly one dataset, or --all".into()),
            }
        }
    }

    Ok(())
}
