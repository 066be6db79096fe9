//! Validity rules applied to cached records at read time

use chrono::{DateTime, Duration, Utc};

use super::record::CacheRecord;
use crate::geo::Coordinates;

/// How long a namespace's records live and whether they are location-bound
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NamespacePolicy {
    /// Time-to-live from the moment of writing; `None` never expires by time
    pub ttl: Option<Duration>,
    /// Maximum displacement in kilometers before the record is stale;
    /// `None` disables the proximity rule
    pub proximity_km: Option<f64>,
}

/// Outcome of checking a record against its policy
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Validity {
    Valid,
    /// `now` is past the record's expiry
    Expired { expires_at: DateTime<Utc> },
    /// The device moved farther than the threshold since the write
    MovedAway { distance_km: f64 },
    /// Location-bound record that was written without an anchor
    MissingAnchor,
}

impl NamespacePolicy {
    /// Policy with a TTL only
    pub fn ttl(ttl: Duration) -> Self {
        Self {
            ttl: Some(ttl),
            proximity_km: None,
        }
    }

    /// Adds a proximity threshold
    pub fn with_proximity_km(mut self, threshold_km: f64) -> Self {
        self.proximity_km = Some(threshold_km);
        self
    }

    /// Whether records in this namespace carry an anchor
    pub fn uses_proximity(&self) -> bool {
        self.proximity_km.is_some()
    }

    /// Expiry for a record written at `written_at`
    pub fn expiry_for(&self, written_at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.ttl.map(|ttl| written_at + ttl)
    }

    /// Checks a record against the time rule, then the proximity rule.
    ///
    /// Either failing rule invalidates. The proximity rule is skipped when
    /// the current location is unknown.
    pub fn evaluate<T>(
        &self,
        record: &CacheRecord<T>,
        now: DateTime<Utc>,
        current: Option<&Coordinates>,
    ) -> Validity {
        if let Some(expires_at) = record.expires_at {
            if now > expires_at {
                return Validity::Expired { expires_at };
            }
        }

        if let (Some(threshold_km), Some(current)) = (self.proximity_km, current) {
            let Some(anchor) = record.anchor.as_ref() else {
                return Validity::MissingAnchor;
            };
            let distance_km = anchor.distance_km(current);
            if distance_km > threshold_km {
                return Validity::MovedAway { distance_km };
            }
        }

        Validity::Valid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_at(
        written_at: DateTime<Utc>,
        policy: &NamespacePolicy,
        anchor: Option<Coordinates>,
    ) -> CacheRecord<u32> {
        CacheRecord {
            payload: 7,
            written_at,
            expires_at: policy.expiry_for(written_at),
            anchor,
        }
    }

    fn home_policy() -> NamespacePolicy {
        NamespacePolicy::ttl(Duration::hours(1)).with_proximity_km(1.0)
    }

    #[test]
    fn test_valid_until_expiry_inclusive() {
        let policy = NamespacePolicy::ttl(Duration::hours(2));
        let t0 = Utc::now();
        let record = record_at(t0, &policy, None);

        assert_eq!(policy.evaluate(&record, t0, None), Validity::Valid);
        assert_eq!(policy.evaluate(&record, t0 + Duration::hours(2), None), Validity::Valid);
        assert!(matches!(
            policy.evaluate(&record, t0 + Duration::hours(2) + Duration::milliseconds(1), None),
            Validity::Expired { .. }
        ));
    }

    #[test]
    fn test_no_ttl_never_expires_by_time() {
        let policy = NamespacePolicy {
            ttl: None,
            proximity_km: None,
        };
        let t0 = Utc::now();
        let record = record_at(t0, &policy, None);

        assert!(record.expires_at.is_none());
        assert_eq!(policy.evaluate(&record, t0 + Duration::days(3650), None), Validity::Valid);
    }

    #[test]
    fn test_moved_away_beyond_threshold() {
        let policy = home_policy();
        let t0 = Utc::now();
        let anchor = Coordinates::new(22.3569, 91.7832);
        let record = record_at(t0, &policy, Some(anchor));

        let far = Coordinates::new(22.3700, 91.8000);
        match policy.evaluate(&record, t0, Some(&far)) {
            Validity::MovedAway { distance_km } => assert!(distance_km > 1.0),
            other => panic!("expected MovedAway, got {:?}", other),
        }
    }

    #[test]
    fn test_within_threshold_is_valid() {
        let policy = home_policy();
        let t0 = Utc::now();
        let anchor = Coordinates::new(22.3569, 91.7832);
        let record = record_at(t0, &policy, Some(anchor));

        // ~0.56 km north
        let near = Coordinates::new(22.3619, 91.7832);
        assert_eq!(policy.evaluate(&record, t0, Some(&near)), Validity::Valid);
    }

    #[test]
    fn test_unknown_location_skips_proximity() {
        let policy = home_policy();
        let t0 = Utc::now();
        let record = record_at(t0, &policy, Some(Coordinates::new(0.0, 0.0)));

        assert_eq!(policy.evaluate(&record, t0, None), Validity::Valid);
    }

    #[test]
    fn test_missing_anchor_with_known_location() {
        let policy = home_policy();
        let t0 = Utc::now();
        let record = record_at(t0, &policy, None);

        assert_eq!(
            policy.evaluate(&record, t0, Some(&Coordinates::new(1.0, 1.0))),
            Validity::MissingAnchor
        );
    }

    #[test]
    fn test_expiry_checked_before_proximity() {
        let policy = home_policy();
        let t0 = Utc::now();
        let anchor = Coordinates::new(0.0, 0.0);
        let record = record_at(t0, &policy, Some(anchor));

        let far = Coordinates::new(10.0, 10.0);
        assert!(matches!(
            policy.evaluate(&record, t0 + Duration::hours(5), Some(&far)),
            Validity::Expired { .. }
        ));
    }
}
