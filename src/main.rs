// claimtrie - command line front end
//
// Ingests a JSON-lines update log into the sled store and answers queries
// against the restored registry. Query output is JSON on stdout; logs go to
// stderr.

use clap::{Parser, Subcommand};
use claimtrie::config::{ConfigError, RegistryConfig};
use claimtrie::event::{ChainUpdate, ChannelSource};
use claimtrie::ident::IdError;
use claimtrie::registry::{run_feed, Registry, RegistryError, SharedRegistry};
use claimtrie::storage::{RegistryStore, StoreError};
use claimtrie::{AccountId, ClaimId};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "claimtrie")]
#[command(about = "Claim trie index and staking ledger")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "claimtrie.toml")]
    config: PathBuf,

    /// Data directory (overrides config file)
    #[arg(short, long, env = "CLAIMTRIE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply a JSON-lines file of chain updates and append them to the log
    Ingest {
        /// File with one JSON ChainUpdate per line
        file: PathBuf,
        /// Save a snapshot after ingesting
        #[arg(long)]
        snapshot: bool,
    },
    /// Resolve one or more URIs
    Resolve {
        #[arg(required = true)]
        uris: Vec<String>,
    },
    /// List the content claims of a channel
    Channel {
        uri: String,
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long, default_value_t = 20)]
        page_size: usize,
    },
    /// Show an account balance
    Balance {
        account: String,
        /// Minimum confirmations (defaults to the configured level)
        #[arg(long)]
        confirmations: Option<u64>,
    },
    /// Show a claim by id, abandoned claims included
    Claim { claim_id: String },
    /// Save a registry snapshot
    Snapshot,
    /// Registry and storage statistics
    Stats,
}

#[derive(Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Invalid claim id: {0}")]
    ClaimId(#[from] IdError),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Line {line}: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write output: {0}")]
    Output(#[from] serde_json::Error),

    #[error("Claim not found: {0}")]
    ClaimNotFound(String),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {}", err);
            std::process::exit(2);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(cli.command, config).await {
        error!(error = %err, "Command failed");
        std::process::exit(1);
    }
}

fn load_config(cli: &Cli) -> Result<RegistryConfig, ConfigError> {
    let mut config = if cli.config.exists() {
        RegistryConfig::load(&cli.config)?
    } else {
        RegistryConfig::default()
    };
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    config.validate()?;
    Ok(config)
}

async fn run(command: Command, config: RegistryConfig) -> Result<(), CliError> {
    let store = RegistryStore::open(&config.data_dir)?;
    info!(data_dir = %config.data_dir.display(), "Opened store");

    match command {
        Command::Ingest { file, snapshot } => {
            let updates = read_updates(&file)?;
            let registry = SharedRegistry::new(store.restore(config)?);

            let (tx, mut source) = ChannelSource::new(256);
            let producer = tokio::spawn(async move {
                for update in updates {
                    if tx.send(update).await.is_err() {
                        break;
                    }
                }
            });

            let stats = run_feed(&mut source, &registry, Some(&store)).await?;
            // The feed only ends once the producer dropped its sender
            let _ = producer.await;

            if snapshot {
                store.save_snapshot(&registry.snapshot())?;
                store.flush()?;
            }
            print_json(&stats)
        }
        Command::Resolve { uris } => {
            let registry = store.restore(config)?;
            print_json(&registry.resolve_many(uris.as_slice()))
        }
        Command::Channel { uri, page, page_size } => {
            let registry = store.restore(config)?;
            print_json(&registry.list_channel(&uri, page, page_size)?)
        }
        Command::Balance { account, confirmations } => {
            let confirmations = confirmations.unwrap_or(config.default_confirmations);
            let registry = store.restore(config)?;
            let account = AccountId::new(account);
            print_json(&BalanceReport {
                balance: registry.balance(&account, confirmations).to_string(),
                unconfirmed: registry.unconfirmed_balance(&account).to_string(),
                account,
                confirmations,
            })
        }
        Command::Claim { claim_id } => {
            let id: ClaimId = claim_id.parse()?;
            let registry = store.restore(config)?;
            let claim = registry
                .claim(&id)
                .ok_or_else(|| CliError::ClaimNotFound(claim_id.clone()))?;
            print_json(&registry.resolver().summarize(claim))
        }
        Command::Snapshot => {
            let registry = store.restore(config)?;
            store.save_snapshot(&registry)?;
            store.flush()?;
            print_json(&registry.statistics())
        }
        Command::Stats => {
            let registry: Registry = store.restore(config)?;
            let storage = store.stats()?;
            print_json(&StatsReport {
                registry: registry.statistics(),
                log_entries: storage.log_entries,
                has_snapshot: storage.has_snapshot,
                disk_size_bytes: storage.disk_size_bytes,
            })
        }
    }
}

#[derive(Serialize)]
struct BalanceReport {
    account: AccountId,
    confirmations: u64,
    balance: String,
    unconfirmed: String,
}

#[derive(Serialize)]
struct StatsReport {
    registry: claimtrie::registry::RegistryStatistics,
    log_entries: u64,
    has_snapshot: bool,
    disk_size_bytes: u64,
}

/// Parse a JSON-lines file; blank lines and `#` comments are skipped
fn read_updates(path: &Path) -> Result<Vec<ChainUpdate>, CliError> {
    let text = std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty() && !line.trim_start().starts_with('#'))
        .map(|(index, line)| {
            serde_json::from_str(line).map_err(|source| CliError::Json {
                line: index + 1,
                source,
            })
        })
        .collect()
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
