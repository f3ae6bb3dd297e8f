//! zone-reconcile binary entry point.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};
use zone_reconcile::{telemetry, Config, FileClient, Record, Reconciler, RetryPolicy, Rr};

/// Apply record changes to zones kept in a file-backed store.
#[derive(Parser, Debug)]
#[command(name = "zone-reconcile")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (TOML).
    #[arg(short, long, default_value = "zone-reconcile.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the zones in the store.
    Zones,
    /// Print every record of a zone.
    Get {
        /// Zone name.
        zone: String,
    },
    /// Add records to a zone.
    Append {
        /// Zone name.
        zone: String,
        /// JSON file with a list of records.
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Replace records sharing name and type with the given ones.
    Set {
        /// Zone name.
        zone: String,
        /// JSON file with a list of records.
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Delete records matching the given (partial) records.
    Delete {
        /// Zone name.
        zone: String,
        /// JSON file with a list of deletion criteria.
        #[arg(short, long)]
        file: PathBuf,
    },
}

fn read_records(path: &Path) -> Result<Vec<Record>, Box<dyn std::error::Error>> {
    let bytes = std::fs::read(path)?;
    let records: Vec<Rr> = serde_json::from_slice(&bytes)?;
    Ok(records.into_iter().map(Record::Raw).collect())
}

fn print_records(records: &[Record]) -> Result<(), Box<dyn std::error::Error>> {
    for record in records {
        println!("{}", serde_json::to_string(record.rr().as_ref())?);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Load configuration
    let config = Config::load(&args.config)?;

    // Initialize telemetry
    telemetry::init(&config.telemetry).map_err(|e| e as Box<dyn std::error::Error>)?;

    debug!(
        config_file = %args.config.display(),
        store = %config.store.path.display(),
        lock = ?config.store.lock,
        "Starting zone-reconcile"
    );

    let mut reconciler = Reconciler::new(FileClient::new(&config.store.path))
        .with_retry_policy(RetryPolicy::from(&config.retry));
    if let Some(lock) = config.store.lock.build() {
        reconciler = reconciler.with_lock(lock);
    }

    // Ctrl-C cancels the running operation
    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        }
    });

    let result = match args.command {
        Command::Zones => reconciler.list_zones(&cancel).await.map(|zones| {
            for zone in zones {
                println!("{zone}");
            }
            Vec::new()
        }),
        Command::Get { zone } => reconciler.get_records(&zone, &cancel).await,
        Command::Append { zone, file } => {
            let records = read_records(&file)?;
            reconciler.append_records(&zone, &records, &cancel).await
        }
        Command::Set { zone, file } => {
            let records = read_records(&file)?;
            reconciler.set_records(&zone, &records, &cancel).await
        }
        Command::Delete { zone, file } => {
            let records = read_records(&file)?;
            reconciler.delete_records(&zone, &records, &cancel).await
        }
    };

    match result {
        Ok(records) => print_records(&records),
        Err(e) => {
            error!("zone-reconcile failed: {}", e);
            Err(e.into())
        }
    }
}
