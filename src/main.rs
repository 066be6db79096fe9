//! Nearby CLI - discover places around you
//!
//! Fetches the home feed and profile from the discovery API through the
//! location-aware response cache, and exposes cache maintenance commands.

use std::sync::Arc;

use clap::Parser;
use serde_json::{json, Value};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use nearby::cache::{CacheNamespace, CacheService};
use nearby::cli::{parse_location, refresh_mode, Cli, Command};
use nearby::data::DiscoveryClient;
use nearby::loader::{Loaded, Origin, ResourceLoader};
use nearby::store::{DurableStore, FileStore, MemoryStore};

/// Installs the log subscriber, writing to stderr so stdout stays JSON
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("nearby=info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Picks the durable store for this run
fn open_store(cli: &Cli) -> Arc<dyn DurableStore> {
    if cli.ephemeral {
        return Arc::new(MemoryStore::new());
    }
    match cli.cache_dir.clone().map(FileStore::with_dir).or_else(FileStore::new) {
        Some(store) => {
            info!(cache_dir = ?store.dir(), "Using file cache");
            Arc::new(store)
        }
        None => {
            warn!("No cache directory available, caching in memory only");
            Arc::new(MemoryStore::new())
        }
    }
}

/// Renders a loaded value with its origin
fn describe<T: serde::Serialize>(loaded: &Loaded<T>) -> Result<Value, serde_json::Error> {
    let origin = match loaded.origin {
        Origin::Cache { age } => json!({ "source": "cache", "age_secs": age.num_seconds() }),
        Origin::Network => json!({ "source": "network" }),
    };
    Ok(json!({ "origin": origin, "data": serde_json::to_value(&loaded.value)? }))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let cli = Cli::parse();
    let config = cli.cache_config()?;

    let cache = Arc::new(CacheService::new(open_store(&cli), config));

    // Startup order matters: a format change must wipe entries before
    // anything tries to decode them
    cache.reset_all_if_version_mismatched().await;
    let snapshot = cache.preload_all().await;

    let client = DiscoveryClient::new(cli.api_url.clone()).with_token(cli.token.clone());
    let loader = ResourceLoader::new(cache.clone(), client);

    let output = match cli.command.clone() {
        Command::Feed {
            lat,
            lng,
            manual,
            refresh,
        } => {
            let location = parse_location(lat, lng, manual)?;
            let loaded = loader.home_feed(location.as_ref(), refresh_mode(refresh)).await?;
            describe(&loaded)?
        }
        Command::Profile { refresh } => {
            let loaded = loader.user_profile(refresh_mode(refresh)).await?;
            describe(&loaded)?
        }
        Command::Invalidate { namespace } => {
            cache.invalidate(namespace).await;
            json!({ "invalidated": namespace.to_string() })
        }
        Command::Status => {
            let policies: Vec<Value> = CacheNamespace::ALL
                .iter()
                .map(|ns| {
                    let policy = cache.config().policy(*ns);
                    json!({
                        "namespace": ns.to_string(),
                        "ttl_secs": policy.ttl.map(|ttl| ttl.num_seconds()),
                        "proximity_km": policy.proximity_km,
                    })
                })
                .collect();
            let preloaded: Vec<String> =
                snapshot.namespaces().iter().map(|ns| ns.to_string()).collect();
            json!({
                "format_version": cache.config().format_version,
                "preloaded": preloaded,
                "policies": policies,
                "stats": cache.stats(),
            })
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
