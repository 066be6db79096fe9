//! Nearby client library
//!
//! Exposes the response cache, its storage backends, the discovery API client
//! and the cache-first loader for use by the binary and integration tests.

pub mod cache;
pub mod cli;
pub mod data;
pub mod geo;
pub mod loader;
pub mod store;
