//! The fixed set of cached resources
//!
//! Every cached resource is one `CacheNamespace` variant. A payload type is
//! tied to exactly one namespace through the `Cacheable` trait, which keeps
//! reads and writes statically typed.

use std::fmt;
use std::str::FromStr;

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Reserved storage key holding the persisted cache format version
pub const VERSION_KEY: &str = "cache/version";

/// Logical cache resources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CacheNamespace {
    /// Location-bound home screen content
    HomeFeed,
    /// The signed-in user's profile
    UserProfile,
}

impl CacheNamespace {
    /// Every namespace, in a stable order
    pub const ALL: [CacheNamespace; 2] = [CacheNamespace::HomeFeed, CacheNamespace::UserProfile];

    /// Stable, human-facing name
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheNamespace::HomeFeed => "home-feed",
            CacheNamespace::UserProfile => "user-profile",
        }
    }

    /// Key under which this namespace's record is persisted
    pub fn storage_key(&self) -> &'static str {
        match self {
            CacheNamespace::HomeFeed => "cache/home_feed",
            CacheNamespace::UserProfile => "cache/user_profile",
        }
    }

    /// Storage keys of every namespace
    pub fn all_storage_keys() -> Vec<&'static str> {
        Self::ALL.iter().map(|ns| ns.storage_key()).collect()
    }
}

impl fmt::Display for CacheNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a namespace name is not recognized
#[derive(Debug, Error)]
#[error("Invalid namespace: '{0}'. Valid namespaces: home-feed, user-profile")]
pub struct NamespaceParseError(pub String);

impl FromStr for CacheNamespace {
    type Err = NamespaceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "home-feed" | "home" | "feed" => Ok(CacheNamespace::HomeFeed),
            "user-profile" | "profile" => Ok(CacheNamespace::UserProfile),
            _ => Err(NamespaceParseError(s.to_string())),
        }
    }
}

/// A payload type that can be cached
///
/// Each implementation names the single namespace it lives in. Implementations
/// must be `Clone` (the memory tier hands out copies) and serde-serializable
/// (the entry codec is derived from them).
pub trait Cacheable: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Namespace this payload is stored under
    const NAMESPACE: CacheNamespace;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_storage_keys_are_distinct_and_not_reserved() {
        let keys: HashSet<_> = CacheNamespace::ALL.iter().map(|ns| ns.storage_key()).collect();
        assert_eq!(keys.len(), CacheNamespace::ALL.len());
        assert!(!keys.contains(VERSION_KEY));
    }

    #[test]
    fn test_parse_namespace_aliases() {
        assert_eq!("home-feed".parse::<CacheNamespace>().unwrap(), CacheNamespace::HomeFeed);
        assert_eq!("home_feed".parse::<CacheNamespace>().unwrap(), CacheNamespace::HomeFeed);
        assert_eq!("HOME".parse::<CacheNamespace>().unwrap(), CacheNamespace::HomeFeed);
        assert_eq!("user-profile".parse::<CacheNamespace>().unwrap(), CacheNamespace::UserProfile);
        assert_eq!("profile".parse::<CacheNamespace>().unwrap(), CacheNamespace::UserProfile);
    }

    #[test]
    fn test_parse_namespace_invalid() {
        let err = "offers".parse::<CacheNamespace>().unwrap_err();
        assert!(err.to_string().contains("Invalid namespace"));
        assert!(err.to_string().contains("offers"));
    }

    #[test]
    fn test_display_roundtrips_through_from_str() {
        for ns in CacheNamespace::ALL {
            assert_eq!(ns.to_string().parse::<CacheNamespace>().unwrap(), ns);
        }
    }

    #[test]
    fn test_all_storage_keys_follows_all_order() {
        assert_eq!(
            CacheNamespace::all_storage_keys(),
            vec!["cache/home_feed", "cache/user_profile"]
        );
    }
}
