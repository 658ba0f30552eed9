//! File Cache - command line front end
//!
//! Reads and writes entries of a filesystem cache directory and can run the
//! periodic expiry cleanup until interrupted.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use file_cache::{
    spawn_cleanup_task, CacheConfig, CacheError, CacheValue, ConfigUpdate, FileCache,
};

#[derive(Debug, Parser)]
#[command(name = "file_cache", version, about = "Filesystem-backed key/value cache")]
struct Cli {
    /// Cache root directory (overrides FILE_CACHE_DIR)
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Write records without gzip compression
    #[arg(long, global = true)]
    no_gzip: bool,

    /// Cache file extension (overrides FILE_CACHE_EXTENSION)
    #[arg(long, global = true)]
    extension: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print a live value
    Get { key: String },
    /// Print the stored content, even if expired
    GetLast { key: String },
    /// Store a value
    Set {
        key: String,
        value: String,
        /// 0 = never, <= 30 days = seconds from now, otherwise a Unix timestamp
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        expiry: i64,
        /// Parse VALUE as JSON instead of storing it as text
        #[arg(long)]
        json: bool,
    },
    /// Overwrite a value only if a live, truthy one exists
    Replace {
        key: String,
        value: String,
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        expiry: i64,
        #[arg(long)]
        json: bool,
    },
    /// Remove a value
    Delete { key: String },
    /// Remove every expired entry
    Clean,
    /// Remove every entry, keeping `.keep` files
    Flush,
    /// Run the expiry cleanup periodically until Ctrl+C
    Watch {
        /// Seconds between cleanup passes
        #[arg(long, default_value_t = 60)]
        interval: u64,
    },
}

fn parse_value(value: String, json: bool) -> anyhow::Result<CacheValue> {
    if json {
        let parsed: serde_json::Value =
            serde_json::from_str(&value).context("VALUE is not valid JSON")?;
        Ok(CacheValue::from(parsed))
    } else {
        Ok(CacheValue::from(value))
    }
}

/// Reports a cache miss and exits with status 1 without an error chain.
fn exit_miss(err: &CacheError) -> ! {
    warn!("{}", err);
    std::process::exit(1)
}

/// Main entry point.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables, then apply CLI flags
/// 3. Run the requested command
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "file_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut cache = FileCache::with_config(CacheConfig::from_env());
    cache.apply_config(ConfigUpdate {
        gzip_compression: cli.no_gzip.then_some(false),
        cache_directory: cli.dir,
        file_extension: cli.extension,
    });

    match cli.command {
        Command::Get { key } => match cache.get(&key) {
            Ok(value) => println!("{}", value),
            Err(e) if e.is_miss() => exit_miss(&e),
            Err(e) => return Err(e).with_context(|| format!("get {}", key)),
        },
        Command::GetLast { key } => match cache.get_last(&key) {
            Ok(content) => println!("{}", content),
            Err(e) if e.is_miss() => exit_miss(&e),
            Err(e) => return Err(e).with_context(|| format!("get-last {}", key)),
        },
        Command::Set {
            key,
            value,
            expiry,
            json,
        } => {
            cache
                .set(&key, parse_value(value, json)?, expiry)
                .with_context(|| format!("set {}", key))?;
            info!("Stored {} at {}", key, cache.path_for(&key).display());
        }
        Command::Replace {
            key,
            value,
            expiry,
            json,
        } => {
            cache
                .replace(&key, parse_value(value, json)?, expiry)
                .with_context(|| format!("replace {}", key))?;
            info!("Replaced {}", key);
        }
        Command::Delete { key } => {
            cache.delete(&key).with_context(|| format!("delete {}", key))?;
            info!("Deleted {}", key);
        }
        Command::Clean => {
            let removed = cache.clean().context("clean")?;
            println!("{}", removed);
        }
        Command::Flush => {
            cache.flush().context("flush")?;
        }
        Command::Watch { interval } => {
            let cleanup_handle = spawn_cleanup_task(cache, interval);
            signal::ctrl_c()
                .await
                .context("Failed to install Ctrl+C handler")?;
            info!("Received Ctrl+C, stopping cleanup task");
            cleanup_handle.abort();
            warn!("Cleanup task aborted");
        }
    }

    Ok(())
}
