//! # Creature Cache
//!
//! Read-through caching for creature lookups.
//!
//! [`CachingCreatureRepo`] wraps any [`CreatureStore`] and remembers both hits
//! and misses for a fixed TTL. Concurrent lookups of the same cold key share a
//! single store round-trip.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use creature_cache::{CachingCreatureRepo, CreatureStore};
//!
//! let cache = CachingCreatureRepo::new(store, Duration::from_secs(30));
//!
//! let bob = cache.create_creature("bob", "likes testing").await?;
//! // Served from the cache, no store round-trip
//! let again = cache.get_creature(bob.id).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod cache;
mod config;
mod locks;

pub use cache::{CacheStats, CachingCreatureRepo};
pub use config::{CacheConfig, LockMode};

// Re-export the store interface so callers need only this crate
pub use creature_core::traits::CreatureStore;
