//! Cache policy configuration
//!
//! TTLs and the proximity threshold are product policy, so they are runtime
//! values with the reference numbers as defaults.

use std::collections::HashMap;

use chrono::Duration;
use thiserror::Error;

use super::namespace::CacheNamespace;
use super::policy::NamespacePolicy;

/// Format version this build reads and writes.
///
/// Bump whenever a cached payload's shape changes; the next startup wipes
/// every persisted entry.
pub const CACHE_FORMAT_VERSION: u32 = 1;

/// Home feed time-to-live in seconds (1 hour)
pub const DEFAULT_HOME_FEED_TTL_SECS: u64 = 60 * 60;

/// User profile time-to-live in seconds (2 hours)
pub const DEFAULT_PROFILE_TTL_SECS: u64 = 2 * 60 * 60;

/// Displacement in kilometers after which the home feed is stale
pub const DEFAULT_PROXIMITY_KM: f64 = 1.0;

/// Upper bound accepted for any TTL (one year)
const MAX_TTL_SECS: u64 = 365 * 24 * 60 * 60;

/// Errors for invalid policy values
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("TTL for {0} must be between 1 second and one year, got {1}s")]
    InvalidTtl(CacheNamespace, u64),

    #[error("Proximity threshold for {0} must be a positive number of kilometers, got {1}")]
    InvalidProximity(CacheNamespace, f64),
}

/// Policies for every namespace plus the expected format version
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Version compared against the persisted one at startup
    pub format_version: u32,
    policies: HashMap<CacheNamespace, NamespacePolicy>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        let policies = CacheNamespace::ALL
            .iter()
            .map(|ns| (*ns, default_policy(*ns)))
            .collect();
        Self {
            format_version: CACHE_FORMAT_VERSION,
            policies,
        }
    }
}

/// Reference policy for a namespace
pub fn default_policy(namespace: CacheNamespace) -> NamespacePolicy {
    match namespace {
        CacheNamespace::HomeFeed => {
            NamespacePolicy::ttl(Duration::seconds(DEFAULT_HOME_FEED_TTL_SECS as i64))
                .with_proximity_km(DEFAULT_PROXIMITY_KM)
        }
        CacheNamespace::UserProfile => {
            NamespacePolicy::ttl(Duration::seconds(DEFAULT_PROFILE_TTL_SECS as i64))
        }
    }
}

impl CacheConfig {
    /// Policy in effect for `namespace`
    pub fn policy(&self, namespace: CacheNamespace) -> NamespacePolicy {
        self.policies
            .get(&namespace)
            .copied()
            .unwrap_or_else(|| default_policy(namespace))
    }

    /// Overrides the TTL of `namespace`
    pub fn with_ttl_secs(
        mut self,
        namespace: CacheNamespace,
        secs: u64,
    ) -> Result<Self, ConfigError> {
        if secs == 0 || secs > MAX_TTL_SECS {
            return Err(ConfigError::InvalidTtl(namespace, secs));
        }
        let mut policy = self.policy(namespace);
        policy.ttl = Some(Duration::seconds(secs as i64));
        self.policies.insert(namespace, policy);
        Ok(self)
    }

    /// Overrides the proximity threshold of `namespace`
    pub fn with_proximity_km(
        mut self,
        namespace: CacheNamespace,
        km: f64,
    ) -> Result<Self, ConfigError> {
        if !km.is_finite() || km <= 0.0 {
            return Err(ConfigError::InvalidProximity(namespace, km));
        }
        let policy = self.policy(namespace).with_proximity_km(km);
        self.policies.insert(namespace, policy);
        Ok(self)
    }

    /// Overrides the expected format version
    pub fn with_format_version(mut self, version: u32) -> Self {
        self.format_version = version;
        self
    }
}
