//! Command-line interface parsing
//!
//! Handles parsing of CLI arguments using clap. Every setting can also come
//! from a `NEARBY_*` environment variable; cache policy values are validated
//! into a `CacheConfig`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use thiserror::Error;

use crate::cache::{
    CacheConfig, CacheNamespace, ConfigError, DEFAULT_HOME_FEED_TTL_SECS, DEFAULT_PROFILE_TTL_SECS,
    DEFAULT_PROXIMITY_KM,
};
use crate::data::discovery::DEFAULT_API_URL;
use crate::geo::{Coordinates, LocationContext, LocationSource};
use crate::loader::Refresh;

/// Error types for CLI argument handling
#[derive(Debug, Error)]
pub enum CliError {
    /// Coordinates outside the valid latitude/longitude range
    #[error("Invalid coordinates: latitude {0} must be within ±90 and longitude {1} within ±180")]
    InvalidCoordinates(f64, f64),

    /// A cache policy value was rejected
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Nearby - discover restaurants, attractions and offers around you
#[derive(Parser, Debug)]
#[command(name = "nearby")]
#[command(about = "Local discovery client with a location-aware response cache")]
#[command(version)]
pub struct Cli {
    /// Base URL of the discovery API
    #[arg(long, env = "NEARBY_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Bearer token for authenticated requests
    #[arg(long, env = "NEARBY_API_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Directory for persisted cache entries (defaults to the platform cache dir)
    #[arg(long, env = "NEARBY_CACHE_DIR", value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Keep the cache in memory only for this run
    #[arg(long)]
    pub ephemeral: bool,

    /// Home feed time-to-live in seconds
    #[arg(long, env = "NEARBY_HOME_FEED_TTL_SECS", default_value_t = DEFAULT_HOME_FEED_TTL_SECS)]
    pub home_feed_ttl_secs: u64,

    /// User profile time-to-live in seconds
    #[arg(long, env = "NEARBY_PROFILE_TTL_SECS", default_value_t = DEFAULT_PROFILE_TTL_SECS)]
    pub profile_ttl_secs: u64,

    /// Distance in kilometers after which the cached home feed is dropped
    #[arg(long, env = "NEARBY_PROXIMITY_KM", default_value_t = DEFAULT_PROXIMITY_KM)]
    pub proximity_km: f64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Show the home feed, from cache when still valid
    ///
    /// Examples:
    ///   nearby feed --lat 22.3569 --lng 91.7832
    ///   nearby feed --lat 22.3569 --lng 91.7832 --manual --refresh
    Feed {
        /// Current latitude
        #[arg(long, requires = "lng", allow_negative_numbers = true)]
        lat: Option<f64>,
        /// Current longitude
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lng: Option<f64>,
        /// Coordinates were picked by hand rather than from GPS
        #[arg(long)]
        manual: bool,
        /// Ignore the cache and fetch fresh data
        #[arg(long)]
        refresh: bool,
    },
    /// Show the signed-in user's profile
    Profile {
        /// Ignore the cache and fetch fresh data
        #[arg(long)]
        refresh: bool,
    },
    /// Drop a cached resource (home-feed, user-profile)
    Invalidate {
        #[arg(value_name = "NAMESPACE")]
        namespace: CacheNamespace,
    },
    /// Show what is cached and the active policies
    Status,
}

impl Cli {
    /// Builds the cache configuration from policy arguments
    pub fn cache_config(&self) -> Result<CacheConfig, CliError> {
        let config = CacheConfig::default()
            .with_ttl_secs(CacheNamespace::HomeFeed, self.home_feed_ttl_secs)?
            .with_ttl_secs(CacheNamespace::UserProfile, self.profile_ttl_secs)?
            .with_proximity_km(CacheNamespace::HomeFeed, self.proximity_km)?;
        Ok(config)
    }
}

/// Converts optional `--lat/--lng` into a location context
///
/// # Returns
/// * `Ok(None)` when no coordinates were given
/// * `Ok(Some(LocationContext))` for valid coordinates
/// * `Err(CliError::InvalidCoordinates)` when either value is out of range
pub fn parse_location(
    lat: Option<f64>,
    lng: Option<f64>,
    manual: bool,
) -> Result<Option<LocationContext>, CliError> {
    let (Some(lat), Some(lng)) = (lat, lng) else {
        return Ok(None);
    };
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
        return Err(CliError::InvalidCoordinates(lat, lng));
    }
    let source = if manual {
        LocationSource::Manual
    } else {
        LocationSource::Gps
    };
    Ok(Some(LocationContext::new(Coordinates::new(lat, lng), source)))
}

/// Maps a `--refresh` flag to a refresh mode
pub fn refresh_mode(refresh: bool) -> Refresh {
    if refresh {
        Refresh::Force
    } else {
        Refresh::IfStale
    }
}
