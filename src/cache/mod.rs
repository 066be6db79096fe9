//! Response cache between screens and the network
//!
//! This module decides whether a previously fetched response may be reused.
//! Records live in two tiers: a process-local memory tier of decoded values,
//! and a durable store of encoded strings that survives restarts. Each
//! namespace carries a validity policy (TTL, and for location-bound content a
//! proximity threshold) checked on every read.
//!
//! Any internal failure degrades to a cache miss so the caller fetches fresh
//! data instead of seeing an error.

mod clock;
mod config;
mod memory;
mod namespace;
mod policy;
mod record;
mod service;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{
    default_policy, CacheConfig, ConfigError, CACHE_FORMAT_VERSION, DEFAULT_HOME_FEED_TTL_SECS,
    DEFAULT_PROFILE_TTL_SECS, DEFAULT_PROXIMITY_KM,
};
pub use memory::MemoryTier;
pub use namespace::{CacheNamespace, Cacheable, NamespaceParseError, VERSION_KEY};
pub use policy::{NamespacePolicy, Validity};
pub use record::{CacheRecord, CodecError};
pub use service::{CacheLookup, CacheService, CacheStats, MissReason, PreloadSnapshot, ResetOutcome};
