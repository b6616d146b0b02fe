//! itemdb CLI
//!
//! Ingest items from the upstream API and query the local catalog.

use std::time::Duration;

use clap::{Parser, Subcommand};
use itemdb::config::{Config, IngestConfig, DEFAULT_ENDPOINT};
use itemdb::{Catalog, Item};
use tracing_subscriber::{fmt, EnvFilter};

/// Local game-item catalog
#[derive(Parser, Debug)]
#[command(name = "itemdb")]
#[command(about = "Rate-limited item price ingestion with prefix search")]
#[command(version)]
struct Args {
    /// Store directory
    #[arg(short, long, default_value = "./items.db")]
    data_dir: String,

    /// Upstream URL template, `{id}` is replaced by the item id
    #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Seconds between upstream requests
    #[arg(short, long, default_value = "5")]
    interval_secs: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch items by id and save them
    Ingest {
        /// Upstream item ids
        #[arg(required = true)]
        ids: Vec<i64>,
    },

    /// List items whose name starts with a prefix
    Search {
        /// Name prefix (case-insensitive)
        prefix: String,

        /// Maximum number of results
        #[arg(short, long, default_value = "50")]
        limit: usize,
    },

    /// Show one item by name
    Get {
        /// Item name (case-insensitive)
        name: String,
    },
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,itemdb=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("itemdb v{}", itemdb::VERSION);
    tracing::info!("Data directory: {}", args.data_dir);

    let limit = match &args.command {
        Commands::Search { limit, .. } => *limit,
        _ => Config::default().search_limit,
    };

    let config = Config::builder()
        .data_dir(&args.data_dir)
        .search_limit(limit)
        .build();

    let ingest_config = IngestConfig::builder()
        .endpoint_template(&args.endpoint)
        .rate_limit_interval(Duration::from_secs(args.interval_secs))
        .build();

    let catalog = match Catalog::open(config, ingest_config) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Failed to open catalog: {}", e);
            std::process::exit(1);
        }
    };

    let mut failed = false;
    match &args.command {
        Commands::Ingest { ids } => {
            for id in ids {
                let status = catalog.ingest_item(*id);
                failed |= !status.starts_with("Saved:");
                println!("{}", status);
            }
        }
        Commands::Search { prefix, .. } => {
            let items = catalog.search(prefix);
            if items.is_empty() {
                println!("No results found!");
            }
            for item in &items {
                print_item(item);
            }
        }
        Commands::Get { name } => match catalog.store().get_item(name) {
            Ok(item) => print_item(&item),
            Err(e) => {
                println!("{}", e);
                failed = true;
            }
        },
    }

    if let Err(e) = catalog.shutdown() {
        tracing::error!("Failed to close catalog: {}", e);
        std::process::exit(1);
    }

    if failed {
        std::process::exit(1);
    }
}

fn print_item(item: &Item) {
    println!(
        "Found: {} - {} [{} | members: {} | price: {} ({}) | today: {} ({})]",
        item.name,
        item.description,
        item.item_type,
        item.members,
        item.current_price,
        item.current_trend,
        item.today_price_change,
        item.today_trend,
    );
}
