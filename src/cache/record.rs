//! Cache records and the entry codec
//!
//! A record is persisted as a JSON object:
//!
//! ```json
//! {"payload": {...}, "written_at": "2026-01-01T10:00:00Z",
//!  "expires_at": "2026-01-01T11:00:00Z", "anchor": {"latitude": 22.35, "longitude": 91.78}}
//! ```
//!
//! `expires_at` and `anchor` are omitted when the namespace does not use them.

use chrono::{DateTime, Duration, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

use crate::geo::Coordinates;

/// Errors from encoding or decoding a record
#[derive(Debug, Error)]
pub enum CodecError {
    /// The persisted string is not a record of the expected shape
    #[error("Malformed cache entry: {0}")]
    Malformed(#[source] serde_json::Error),

    /// The payload could not be serialized
    #[error("Failed to encode cache entry: {0}")]
    Encode(#[source] serde_json::Error),
}

/// A cached payload plus the metadata needed to judge its validity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheRecord<T> {
    /// The cached response
    pub payload: T,
    /// When the record was written
    pub written_at: DateTime<Utc>,
    /// When the record stops being valid by time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Device coordinates at write time, for location-bound namespaces
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<Coordinates>,
}

impl<T> CacheRecord<T> {
    /// Time elapsed since the write, never negative
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.written_at).max(Duration::zero())
    }
}

impl<T: Serialize> CacheRecord<T> {
    /// Encodes the record into its persisted string form
    pub fn encode(&self) -> Result<String, CodecError> {
        serde_json::to_string(self).map_err(CodecError::Encode)
    }
}

impl<T: DeserializeOwned> CacheRecord<T> {
    /// Decodes a persisted string
    pub fn decode(raw: &str) -> Result<Self, CodecError> {
        serde_json::from_str(raw).map_err(CodecError::Malformed)
    }
}
