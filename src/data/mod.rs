//! Core data models for the discovery client
//!
//! This module contains the payload types returned by the discovery API and
//! cached by the response cache, plus the REST client that fetches them.

pub mod discovery;

pub use discovery::{ApiError, DiscoveryApi, DiscoveryClient};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::{CacheNamespace, Cacheable};

/// Promotional banner shown at the top of the home screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Banner {
    pub id: u64,
    pub title: String,
    pub image_url: String,
    /// Deep link opened when the banner is tapped
    #[serde(default)]
    pub link: Option<String>,
}

/// Kind of place listed in the feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceKind {
    Restaurant,
    Attraction,
    #[serde(other)]
    Other,
}

/// A restaurant or attraction near the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub id: u64,
    pub name: String,
    pub kind: PlaceKind,
    pub latitude: f64,
    pub longitude: f64,
    /// Average rating from 0.0 to 5.0, absent until the first review
    #[serde(default)]
    pub rating: Option<f32>,
    #[serde(default)]
    pub review_count: u32,
    #[serde(default)]
    pub image_url: Option<String>,
    /// Distance from the requested coordinates as computed by the server
    #[serde(default)]
    pub distance_km: Option<f64>,
}

/// A discount or deal offered by a place
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    pub id: u64,
    pub place_id: u64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub discount_percent: Option<u8>,
    #[serde(default)]
    pub valid_until: Option<DateTime<Utc>>,
}

/// Everything the home screen renders
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HomeFeed {
    #[serde(default)]
    pub banners: Vec<Banner>,
    #[serde(default)]
    pub restaurants: Vec<Place>,
    #[serde(default)]
    pub attractions: Vec<Place>,
    #[serde(default)]
    pub offers: Vec<Offer>,
}

impl HomeFeed {
    /// Total number of items across all sections
    pub fn item_count(&self) -> usize {
        self.banners.len() + self.restaurants.len() + self.attractions.len() + self.offers.len()
    }
}

impl Cacheable for HomeFeed {
    const NAMESPACE: CacheNamespace = CacheNamespace::HomeFeed;
}

/// The signed-in user's profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: u64,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub review_count: u32,
}

impl Cacheable for UserProfile {
    const NAMESPACE: CacheNamespace = CacheNamespace::UserProfile;
}
