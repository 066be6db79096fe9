//! Cache-first loading of screen resources
//!
//! Implements the caller side of the cache contract: try the cache, fetch on
//! a miss, write the fresh value back. Fetch errors reach the caller; cache
//! problems never do.

use std::future::Future;
use std::sync::Arc;

use chrono::Duration;
use tracing::{debug, info};

use crate::cache::{CacheLookup, CacheNamespace, CacheService, Cacheable};
use crate::data::{ApiError, DiscoveryApi, HomeFeed, UserProfile};
use crate::geo::LocationContext;

/// Whether a load may be served from the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Refresh {
    /// Use the cached value while it is valid
    #[default]
    IfStale,
    /// Drop the cached value and go to the network
    Force,
}

/// Where a loaded value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Cache { age: Duration },
    Network,
}

/// A loaded value and its origin
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded<T> {
    pub value: T,
    pub origin: Origin,
}

/// Loads screen resources through the response cache
pub struct ResourceLoader<A> {
    cache: Arc<CacheService>,
    api: A,
}

impl<A: DiscoveryApi> ResourceLoader<A> {
    pub fn new(cache: Arc<CacheService>, api: A) -> Self {
        Self { cache, api }
    }

    pub fn cache(&self) -> &CacheService {
        &self.cache
    }

    /// Home feed for the current location
    pub async fn home_feed(
        &self,
        context: Option<&LocationContext>,
        refresh: Refresh,
    ) -> Result<Loaded<HomeFeed>, ApiError> {
        let at = context.map(|ctx| &ctx.coordinates);
        self.load(context, refresh, || self.api.home_feed(at)).await
    }

    /// Signed-in user's profile
    pub async fn user_profile(&self, refresh: Refresh) -> Result<Loaded<UserProfile>, ApiError> {
        self.load(None, refresh, || self.api.user_profile()).await
    }

    /// Reacts to a location update from the tracker.
    ///
    /// Invalidates the home feed right away when the move exceeds the
    /// proximity threshold, instead of waiting for the next read to notice.
    /// Returns whether anything was invalidated.
    pub async fn location_changed(
        &self,
        previous: &LocationContext,
        current: &LocationContext,
    ) -> bool {
        let policy = self.cache.config().policy(CacheNamespace::HomeFeed);
        let Some(threshold_km) = policy.proximity_km else {
            return false;
        };

        let distance_km = previous.coordinates.distance_km(&current.coordinates);
        if distance_km <= threshold_km {
            return false;
        }

        info!(
            distance_km,
            source = ?current.source,
            "Location changed beyond threshold, dropping cached home feed"
        );
        self.cache.invalidate(CacheNamespace::HomeFeed).await;
        true
    }

    async fn load<T, F, Fut>(
        &self,
        context: Option<&LocationContext>,
        refresh: Refresh,
        fetch: F,
    ) -> Result<Loaded<T>, ApiError>
    where
        T: Cacheable,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        match refresh {
            Refresh::Force => self.cache.invalidate(T::NAMESPACE).await,
            Refresh::IfStale => {
                if let CacheLookup::Hit { payload, age } = self.cache.read::<T>(context).await {
                    return Ok(Loaded {
                        value: payload,
                        origin: Origin::Cache { age },
                    });
                }
            }
        }

        debug!(namespace = %T::NAMESPACE, "Fetching from network");
        let value = fetch().await?;
        self.cache.write(value.clone(), context).await;

        Ok(Loaded {
            value,
            origin: Origin::Network,
        })
    }
}
