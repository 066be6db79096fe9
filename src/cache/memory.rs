//! Process-lifetime mirror of decoded records
//!
//! Holds at most one record per namespace. It is never authoritative: it
//! starts empty and is filled from the durable store or by writes.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::namespace::{CacheNamespace, Cacheable};
use super::record::CacheRecord;

type Entry = Arc<dyn Any + Send + Sync>;

#[derive(Default)]
struct Slots {
    entries: HashMap<CacheNamespace, Entry>,
    /// Bumped on every change to a namespace, so a record loaded from the
    /// durable store can tell whether it went stale while in flight
    generations: HashMap<CacheNamespace, u64>,
}

impl Slots {
    fn bump(&mut self, namespace: CacheNamespace) {
        *self.generations.entry(namespace).or_default() += 1;
    }
}

/// Decoded records keyed by namespace
#[derive(Default)]
pub struct MemoryTier {
    slots: RwLock<Slots>,
}

impl MemoryTier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the record held for `T`'s namespace
    pub async fn peek<T: Cacheable>(&self) -> Option<CacheRecord<T>> {
        let slots = self.slots.read().await;
        slots
            .entries
            .get(&T::NAMESPACE)
            .and_then(|entry| entry.downcast_ref::<CacheRecord<T>>())
            .cloned()
    }

    /// Current generation of `namespace`
    pub async fn generation(&self, namespace: CacheNamespace) -> u64 {
        let slots = self.slots.read().await;
        slots.generations.get(&namespace).copied().unwrap_or_default()
    }

    /// Stores `record`, replacing whatever the namespace held
    pub async fn put<T: Cacheable>(&self, record: CacheRecord<T>) {
        let mut slots = self.slots.write().await;
        slots.entries.insert(T::NAMESPACE, Arc::new(record));
        slots.bump(T::NAMESPACE);
    }

    /// Stores `record` only if nothing touched the namespace since
    /// `generation` was taken. Returns whether the record was stored.
    pub async fn put_if_generation<T: Cacheable>(
        &self,
        generation: u64,
        record: CacheRecord<T>,
    ) -> bool {
        let mut slots = self.slots.write().await;
        let current = slots.generations.get(&T::NAMESPACE).copied().unwrap_or_default();
        if current != generation {
            return false;
        }
        slots.entries.insert(T::NAMESPACE, Arc::new(record));
        slots.bump(T::NAMESPACE);
        true
    }

    pub async fn evict(&self, namespace: CacheNamespace) {
        let mut slots = self.slots.write().await;
        slots.entries.remove(&namespace);
        slots.bump(namespace);
    }

    pub async fn clear(&self) {
        let mut slots = self.slots.write().await;
        slots.entries.clear();
        for namespace in CacheNamespace::ALL {
            slots.bump(namespace);
        }
    }

    pub async fn contains(&self, namespace: CacheNamespace) -> bool {
        self.slots.read().await.entries.contains_key(&namespace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Feed(Vec<String>);

    impl Cacheable for Feed {
        const NAMESPACE: CacheNamespace = CacheNamespace::HomeFeed;
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Profile(String);

    impl Cacheable for Profile {
        const NAMESPACE: CacheNamespace = CacheNamespace::UserProfile;
    }

    fn record<T>(payload: T) -> CacheRecord<T> {
        CacheRecord {
            payload,
            written_at: Utc::now(),
            expires_at: None,
            anchor: None,
        }
    }

    #[tokio::test]
    async fn test_peek_empty_tier() {
        let tier = MemoryTier::new();
        assert!(tier.peek::<Feed>().await.is_none());
    }

    #[tokio::test]
    async fn test_put_then_peek() {
        let tier = MemoryTier::new();
        let feed = Feed(vec!["banner".to_string()]);

        tier.put(record(feed.clone())).await;

        let peeked = tier.peek::<Feed>().await.expect("record should be present");
        assert_eq!(peeked.payload, feed);
        assert!(tier.contains(CacheNamespace::HomeFeed).await);
        assert!(!tier.contains(CacheNamespace::UserProfile).await);
    }

    #[tokio::test]
    async fn test_put_replaces_previous_record() {
        let tier = MemoryTier::new();
        tier.put(record(Profile("first".to_string()))).await;
        tier.put(record(Profile("second".to_string()))).await;

        assert_eq!(tier.peek::<Profile>().await.unwrap().payload, Profile("second".to_string()));
    }

    #[tokio::test]
    async fn test_evict_and_clear() {
        let tier = MemoryTier::new();
        tier.put(record(Feed(vec![]))).await;
        tier.put(record(Profile("p".to_string()))).await;

        tier.evict(CacheNamespace::HomeFeed).await;
        assert!(tier.peek::<Feed>().await.is_none());
        assert!(tier.peek::<Profile>().await.is_some());

        tier.clear().await;
        assert!(tier.peek::<Profile>().await.is_none());
    }

    #[tokio::test]
    async fn test_put_if_generation_rejects_stale_record() {
        let tier = MemoryTier::new();
        tier.put(record(Profile("cached".to_string()))).await;
        let seen = tier.generation(CacheNamespace::UserProfile).await;

        tier.evict(CacheNamespace::UserProfile).await;

        assert!(!tier.put_if_generation(seen, record(Profile("cached".to_string()))).await);
        assert!(!tier.contains(CacheNamespace::UserProfile).await);
    }

    #[tokio::test]
    async fn test_put_if_generation_accepts_untouched_namespace() {
        let tier = MemoryTier::new();
        let seen = tier.generation(CacheNamespace::HomeFeed).await;
        tier.clear().await;
        assert!(!tier.put_if_generation(seen, record(Feed(vec![]))).await);

        let seen = tier.generation(CacheNamespace::HomeFeed).await;
        assert!(tier.put_if_generation(seen, record(Feed(vec![]))).await);
        assert!(tier.contains(CacheNamespace::HomeFeed).await);
    }
}
