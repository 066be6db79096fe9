//! Two-tier cache orchestration
//!
//! `CacheService` owns the memory tier and a handle to the durable store.
//! Screens never touch either tier directly; every read, write and eviction
//! goes through here so the two tiers stay consistent.
//!
//! Nothing in this module returns an error to the caller. Store failures,
//! corrupt entries and policy violations all end up as a miss, which sends
//! the caller down its normal network path.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Duration;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::clock::{Clock, SystemClock};
use super::config::CacheConfig;
use super::memory::MemoryTier;
use super::namespace::{CacheNamespace, Cacheable, VERSION_KEY};
use super::policy::Validity;
use super::record::CacheRecord;
use crate::data::{HomeFeed, UserProfile};
use crate::geo::LocationContext;
use crate::store::DurableStore;

/// Why a read did not produce a payload
///
/// Every variant means the same thing to the caller (fetch fresh data);
/// the distinction is only for logging.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MissReason {
    /// Nothing cached for this namespace
    Absent,
    /// The record outlived its TTL
    Expired,
    /// The device moved beyond the namespace's proximity threshold
    MovedAway { distance_km: f64 },
    /// Location-bound record written without coordinates
    MissingAnchor,
    /// The persisted entry could not be decoded
    Corrupt,
    /// The durable store failed
    StoreUnavailable,
}

/// Result of `CacheService::read`
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup<T> {
    Hit {
        payload: T,
        /// Time since the record was written
        age: Duration,
    },
    Miss(MissReason),
}

impl<T> CacheLookup<T> {
    pub fn is_hit(&self) -> bool {
        matches!(self, CacheLookup::Hit { .. })
    }

    /// The payload on a hit
    pub fn into_payload(self) -> Option<T> {
        match self {
            CacheLookup::Hit { payload, .. } => Some(payload),
            CacheLookup::Miss(_) => None,
        }
    }

    pub fn miss_reason(&self) -> Option<MissReason> {
        match self {
            CacheLookup::Hit { .. } => None,
            CacheLookup::Miss(reason) => Some(*reason),
        }
    }
}

/// Payloads found in the durable store at startup, validity unchecked
#[derive(Debug, Clone, Default)]
pub struct PreloadSnapshot {
    pub home_feed: Option<HomeFeed>,
    pub user_profile: Option<UserProfile>,
}

impl PreloadSnapshot {
    /// Namespaces that had a decodable entry
    pub fn namespaces(&self) -> Vec<CacheNamespace> {
        let mut loaded = Vec::new();
        if self.home_feed.is_some() {
            loaded.push(CacheNamespace::HomeFeed);
        }
        if self.user_profile.is_some() {
            loaded.push(CacheNamespace::UserProfile);
        }
        loaded
    }
}

/// Outcome of the startup version check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetOutcome {
    /// Persisted version matched; nothing was touched
    Current,
    /// Every namespace entry was deleted
    Reset {
        /// Version found in the store, if any
        previous: Option<String>,
        /// Whether the expected version was persisted afterwards
        version_saved: bool,
    },
}

/// Statistics about cache usage since the service was created
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Misses caused by TTL expiry
    pub expired: u64,
    /// Misses caused by the proximity rule
    pub moved_away: u64,
    /// Reads that found an undecodable entry
    pub decode_failures: u64,
    pub store_failures: u64,
    pub writes: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    expired: AtomicU64,
    moved_away: AtomicU64,
    decode_failures: AtomicU64,
    store_failures: AtomicU64,
    writes: AtomicU64,
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

/// Response cache shared by every screen
pub struct CacheService {
    store: Arc<dyn DurableStore>,
    memory: MemoryTier,
    config: CacheConfig,
    clock: Arc<dyn Clock>,
    counters: Counters,
}

impl CacheService {
    /// Creates a service over `store` using the wall clock
    pub fn new(store: Arc<dyn DurableStore>, config: CacheConfig) -> Self {
        Self {
            store,
            memory: MemoryTier::new(),
            config,
            clock: Arc::new(SystemClock),
            counters: Counters::default(),
        }
    }

    /// Replaces the time source
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Returns the cached payload for `T` if it is still valid.
    ///
    /// Checks the memory tier first and falls back to the durable store. A
    /// record that fails its namespace policy is removed from both tiers.
    pub async fn read<T: Cacheable>(&self, context: Option<&LocationContext>) -> CacheLookup<T> {
        let namespace = T::NAMESPACE;

        let record = match self.memory.peek::<T>().await {
            Some(record) => record,
            None => match self.load::<T>().await {
                Ok(Some((record, generation))) => {
                    self.promote(generation, record.clone()).await;
                    record
                }
                Ok(None) => return self.miss(namespace, MissReason::Absent),
                Err(reason) => return self.miss(namespace, reason),
            },
        };

        let now = self.clock.now();
        let policy = self.config.policy(namespace);
        let current = context.map(|ctx| &ctx.coordinates);

        match policy.evaluate(&record, now, current) {
            Validity::Valid => {
                bump(&self.counters.hits);
                let age = record.age(now);
                debug!(namespace = %namespace, age_secs = age.num_seconds(), "Cache hit");
                CacheLookup::Hit {
                    payload: record.payload,
                    age,
                }
            }
            Validity::Expired { expires_at } => {
                debug!(namespace = %namespace, %expires_at, "Cache entry expired");
                self.evict_everywhere(namespace).await;
                self.miss(namespace, MissReason::Expired)
            }
            Validity::MovedAway { distance_km } => {
                debug!(
                    namespace = %namespace,
                    distance_km,
                    source = ?context.map(|ctx| ctx.source),
                    "Device moved away from cached location"
                );
                self.evict_everywhere(namespace).await;
                self.miss(namespace, MissReason::MovedAway { distance_km })
            }
            Validity::MissingAnchor => {
                self.evict_everywhere(namespace).await;
                self.miss(namespace, MissReason::MissingAnchor)
            }
        }
    }

    /// Stores freshly fetched `payload`, replacing any previous record.
    ///
    /// The memory tier is updated even if persisting fails, so the value
    /// stays available for the rest of the process.
    pub async fn write<T: Cacheable>(&self, payload: T, context: Option<&LocationContext>) {
        let namespace = T::NAMESPACE;
        let policy = self.config.policy(namespace);
        let now = self.clock.now();

        let record = CacheRecord {
            payload,
            written_at: now,
            expires_at: policy.expiry_for(now),
            anchor: if policy.uses_proximity() {
                context.map(|ctx| ctx.coordinates)
            } else {
                None
            },
        };

        let encoded = record.encode();
        self.memory.put(record).await;
        bump(&self.counters.writes);

        let raw = match encoded {
            Ok(raw) => raw,
            Err(e) => {
                warn!(
                    namespace = %namespace,
                    error = %e,
                    "Failed to encode cache entry; kept in memory only"
                );
                return;
            }
        };

        match self.store.set(namespace.storage_key(), &raw).await {
            Ok(()) => debug!(namespace = %namespace, bytes = raw.len(), "Cache entry written"),
            Err(e) => {
                bump(&self.counters.store_failures);
                warn!(
                    namespace = %namespace,
                    error = %e,
                    "Failed to persist cache entry; kept in memory only"
                );
            }
        }
    }

    /// Drops the namespace from both tiers. Safe to call repeatedly.
    pub async fn invalidate(&self, namespace: CacheNamespace) {
        debug!(namespace = %namespace, "Invalidating cache entry");
        self.evict_everywhere(namespace).await;
    }

    /// Loads every namespace from the durable store into the memory tier.
    ///
    /// Validity policies are not applied; this exists so the first screen can
    /// paint while fresh data is fetched. Namespaces that are missing or fail
    /// to decode are left out of the snapshot.
    pub async fn preload_all(&self) -> PreloadSnapshot {
        let (home_feed, user_profile) =
            futures::join!(self.preload::<HomeFeed>(), self.preload::<UserProfile>());

        let snapshot = PreloadSnapshot {
            home_feed,
            user_profile,
        };
        info!(loaded = ?snapshot.namespaces(), "Cache preloaded");
        snapshot
    }

    /// Wipes every namespace if the persisted format version is not the
    /// expected one, then records the expected version.
    ///
    /// Runs once at startup, before `preload_all`. If deleting entries fails
    /// the version is left untouched so the next start tries again.
    pub async fn reset_all_if_version_mismatched(&self) -> ResetOutcome {
        let expected = self.config.format_version.to_string();

        let stored = match self.store.get(VERSION_KEY).await {
            Ok(stored) => stored,
            Err(e) => {
                bump(&self.counters.store_failures);
                warn!(error = %e, "Failed to read cache version; treating as absent");
                None
            }
        };

        if stored.as_deref().map(str::trim) == Some(expected.as_str()) {
            debug!(version = %expected, "Cache format version is current");
            return ResetOutcome::Current;
        }

        info!(
            previous = ?stored,
            expected = %expected,
            "Cache format version mismatch, clearing all cached entries"
        );

        self.memory.clear().await;

        if let Err(e) = self.store.delete_many(&CacheNamespace::all_storage_keys()).await {
            bump(&self.counters.store_failures);
            warn!(error = %e, "Failed to clear cached entries during version reset");
            return ResetOutcome::Reset {
                previous: stored,
                version_saved: false,
            };
        }

        let version_saved = match self.store.set(VERSION_KEY, &expected).await {
            Ok(()) => true,
            Err(e) => {
                bump(&self.counters.store_failures);
                warn!(error = %e, "Failed to persist cache format version");
                false
            }
        };

        ResetOutcome::Reset {
            previous: stored,
            version_saved,
        }
    }

    /// Whether the memory tier currently holds `namespace`
    pub async fn is_in_memory(&self, namespace: CacheNamespace) -> bool {
        self.memory.contains(namespace).await
    }

    /// Snapshot of the counters
    pub fn stats(&self) -> CacheStats {
        let c = &self.counters;
        CacheStats {
            hits: c.hits.load(Ordering::Relaxed),
            misses: c.misses.load(Ordering::Relaxed),
            expired: c.expired.load(Ordering::Relaxed),
            moved_away: c.moved_away.load(Ordering::Relaxed),
            decode_failures: c.decode_failures.load(Ordering::Relaxed),
            store_failures: c.store_failures.load(Ordering::Relaxed),
            writes: c.writes.load(Ordering::Relaxed),
        }
    }

    /// Reads and decodes the persisted record for `T`, along with the memory
    /// tier generation observed before the store was asked.
    ///
    /// A corrupt entry is deleted so it is not parsed again on every read.
    async fn load<T: Cacheable>(&self) -> Result<Option<(CacheRecord<T>, u64)>, MissReason> {
        let namespace = T::NAMESPACE;
        let generation = self.memory.generation(namespace).await;

        let raw = match self.store.get(namespace.storage_key()).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Ok(None),
            Err(e) => {
                bump(&self.counters.store_failures);
                warn!(namespace = %namespace, error = %e, "Failed to read cache entry");
                return Err(MissReason::StoreUnavailable);
            }
        };

        match CacheRecord::<T>::decode(&raw) {
            Ok(record) => Ok(Some((record, generation))),
            Err(e) => {
                warn!(namespace = %namespace, error = %e, "Discarding unreadable cache entry");
                self.delete_persisted(namespace).await;
                Err(MissReason::Corrupt)
            }
        }
    }

    async fn preload<T: Cacheable>(&self) -> Option<T> {
        let (record, generation) = self.load::<T>().await.ok().flatten()?;
        let payload = record.payload.clone();
        self.promote(generation, record).await;
        Some(payload)
    }

    /// Copies a record loaded from the durable store into the memory tier,
    /// unless a write or eviction landed while the load was in flight
    async fn promote<T: Cacheable>(&self, generation: u64, record: CacheRecord<T>) {
        if !self.memory.put_if_generation(generation, record).await {
            debug!(namespace = %T::NAMESPACE, "Namespace changed during load, not caching");
        }
    }

    async fn evict_everywhere(&self, namespace: CacheNamespace) {
        self.memory.evict(namespace).await;
        self.delete_persisted(namespace).await;
    }

    async fn delete_persisted(&self, namespace: CacheNamespace) {
        if let Err(e) = self.store.delete(namespace.storage_key()).await {
            bump(&self.counters.store_failures);
            warn!(namespace = %namespace, error = %e, "Failed to delete cache entry");
        }
    }

    fn miss<T>(&self, namespace: CacheNamespace, reason: MissReason) -> CacheLookup<T> {
        bump(&self.counters.misses);
        match reason {
            MissReason::Expired => bump(&self.counters.expired),
            MissReason::MovedAway { .. } => bump(&self.counters.moved_away),
            MissReason::Corrupt => bump(&self.counters.decode_failures),
            // store failures are counted where the store call fails
            MissReason::Absent | MissReason::MissingAnchor | MissReason::StoreUnavailable => {}
        }
        debug!(namespace = %namespace, reason = ?reason, "Cache miss");
        CacheLookup::Miss(reason)
    }
}
