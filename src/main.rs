//! config-road
//!
//! Mirrors one group of a Nacos config service into memory and a local
//! cache directory, then follows changes until stopped.
//!
//! # Architecture Overview
//!
//! ```text
//!   road.toml ──▶ config ──▶ sync::engine ──discover/fetch──▶ remote (Nacos HTTP)
//!                                │    ▲                           │
//!                                │    └──── change sink ◀─────────┘ (poller per id)
//!                                ▼
//!                       store::memory + store::disk
//! ```

use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use config_road::config::load_config;
use config_road::document::DocumentId;
use config_road::lifecycle::signals::wait_for_signal;
use config_road::observability::{logging, metrics};
use config_road::store::{lookup_key, CacheStore};
use config_road::sync::discover_ids;
use config_road::{NacosHttpSource, RemoteSource, SyncEngine};

#[derive(Parser)]
#[command(name = "config-road")]
#[command(about = "Mirror a Nacos config group into memory and a local cache", long_about = None)]
struct Cli {
    /// Bootstrap configuration file.
    #[arg(short, long, default_value = "road.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sync the group and follow changes until interrupted (default)
    Run,
    /// List the document ids the configured search matches
    Discover,
    /// Print one document, or one dotted key inside it
    Get {
        id: String,
        /// Dotted TOML key, e.g. `server.port`
        #[arg(short, long)]
        key: Option<String>,
        /// Read from the local cache instead of the server
        #[arg(long)]
        cached: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    let _log_guard = logging::init_logging(
        &config.nacos_client.log_level,
        std::path::Path::new(&config.nacos_client.log_dir),
    )?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        "config-road starting"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let source = NacosHttpSource::new(&config)?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let engine = SyncEngine::start(config, source).await?;
            tracing::info!(documents = engine.documents().len(), "Following changes");

            wait_for_signal().await;
            engine.shutdown().await;
            tracing::info!("Shutdown complete");
        }
        Commands::Discover => {
            let base = &config.base_config;
            let discovered = discover_ids(
                &source,
                &base.group,
                &base.data_id,
                base.search_pattern,
                base.page_size,
            )
            .await?;
            for id in &discovered.ids {
                println!("{}", id);
            }
        }
        Commands::Get { id, key, cached } => {
            let id = DocumentId::new(id);
            let content = if cached {
                let cache = CacheStore::new(&config.base_config.cache_dir);
                match cache.read(&id).await? {
                    Some(content) => content,
                    None => return Err(format!("'{}' is not in the cache at {}", id, cache.root().display()).into()),
                }
            } else {
                source.fetch(&id, &config.base_config.group).await?
            };

            match key {
                Some(key) => match lookup_key(&id, content.as_bytes(), &key)? {
                    Some(value) => println!("{}", value),
                    None => return Err(format!("key '{}' not found in '{}'", key, id).into()),
                },
                None => std::io::stdout().write_all(content.as_bytes())?,
            }
        }
    }

    Ok(())
}
