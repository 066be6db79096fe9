//! Geographic primitives for location-aware caching
//!
//! Provides coordinate pairs, the location context supplied by the device's
//! location tracker, and great-circle distance between two points.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometers
const EARTH_RADIUS_KM: f64 = 6371.0;

/// A latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude in degrees, positive north
    pub latitude: f64,
    /// Longitude in degrees, positive east
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great-circle distance to `other` in kilometers
    pub fn distance_km(&self, other: &Coordinates) -> f64 {
        distance_km(self, other)
    }
}

/// Where the current coordinates came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationSource {
    /// Reported by the device's positioning hardware
    #[default]
    Gps,
    /// Picked by the user (e.g. a city chosen from a list)
    Manual,
}

/// The location in effect for a request
///
/// Only `coordinates` participates in cache validity; `source` is carried
/// for logging.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationContext {
    pub coordinates: Coordinates,
    pub source: LocationSource,
}

impl LocationContext {
    pub fn new(coordinates: Coordinates, source: LocationSource) -> Self {
        Self {
            coordinates,
            source,
        }
    }

    /// Shorthand for a GPS-derived context
    pub fn gps(latitude: f64, longitude: f64) -> Self {
        Self::new(Coordinates::new(latitude, longitude), LocationSource::Gps)
    }

    /// Shorthand for a manually selected context
    pub fn manual(latitude: f64, longitude: f64) -> Self {
        Self::new(Coordinates::new(latitude, longitude), LocationSource::Manual)
    }
}

/// Computes the great-circle distance between two points using the
/// haversine formula.
///
/// # Example
///
/// ```
/// use nearby::geo::{distance_km, Coordinates};
///
/// let a = Coordinates::new(22.3569, 91.7832);
/// let b = Coordinates::new(22.3700, 91.8000);
/// let d = distance_km(&a, &b);
/// assert!(d > 1.0 && d < 3.0);
/// ```
pub fn distance_km(from: &Coordinates, to: &Coordinates) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let d_lat = (to.latitude - from.latitude).to_radians();
    let d_lon = (to.longitude - from.longitude).to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    // Rounding can push `a` a hair past 1.0 for antipodal points
    let c = 2.0 * a.sqrt().min(1.0).asin();

    EARTH_RADIUS_KM * c
}
