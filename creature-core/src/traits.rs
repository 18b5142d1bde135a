//! Common traits for creature storage.
//!
//! Stores and caches satisfy the same interface, so a cache can wrap any
//! store (or another cache) without the caller noticing.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Creature, CreatureId, CreatureLookupResult};

// ═══════════════════════════════════════════════════════════════════════════════
// STORE TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Interface for creature storage and retrieval.
///
/// Implementations might use:
/// - In-memory storage (for testing/development)
/// - A local file (for single-node deployments)
/// - SQLite/libSQL (for production)
#[async_trait]
pub trait CreatureStore: Send + Sync {
    /// Creates a creature and returns it with its newly assigned id.
    async fn create_creature(&self, name: &str, description: &str) -> Result<Creature>;

    /// Looks a creature up by id.
    ///
    /// A missing creature is `Ok(CreatureLookupResult::NotFound)`; `Err` is
    /// reserved for store-level failures.
    async fn get_creature(&self, id: CreatureId) -> Result<CreatureLookupResult>;
}

#[async_trait]
impl<S: CreatureStore + ?Sized> CreatureStore for Arc<S> {
    async fn create_creature(&self, name: &str, description: &str) -> Result<Creature> {
        (**self).create_creature(name, description).await
    }

    async fn get_creature(&self, id: CreatureId) -> Result<CreatureLookupResult> {
        (**self).get_creature(id).await
    }
}
