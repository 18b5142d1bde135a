//! In-memory creature store.
//!
//! Fast, thread-safe storage suitable for development, testing,
//! and single-process deployments.

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::{debug, instrument};

use creature_core::constants::FIRST_CREATURE_ID;
use creature_core::error::{CreatureError, Result};
use creature_core::traits::CreatureStore;
use creature_core::types::{Creature, CreatureId, CreatureLookupResult};

/// In-memory creature store.
///
/// Ids are handed out sequentially starting at 1 and are never reused.
#[derive(Debug)]
pub struct MemoryCreatureStore {
    creatures: DashMap<CreatureId, Creature>,
    next_id: AtomicI64,
}

impl MemoryCreatureStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self {
            creatures: DashMap::new(),
            next_id: AtomicI64::new(FIRST_CREATURE_ID),
        }
    }

    /// Creates a store with preallocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            creatures: DashMap::with_capacity(capacity),
            next_id: AtomicI64::new(FIRST_CREATURE_ID),
        }
    }

    /// Deletes a creature, returning it if it existed.
    ///
    /// Caches sitting in front of this store are not told about the delete.
    pub fn delete(&self, id: CreatureId) -> Option<Creature> {
        self.creatures.remove(&id).map(|(_, creature)| creature)
    }

    /// Returns the number of creatures.
    pub fn len(&self) -> usize {
        self.creatures.len()
    }

    /// Returns true if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.creatures.is_empty()
    }

    /// Returns all creatures ordered by id (for export/backup).
    pub fn all_creatures(&self) -> Vec<Creature> {
        let mut creatures: Vec<Creature> = self
            .creatures
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        creatures.sort_by_key(|c| c.id);
        creatures
    }

    /// Imports creatures keeping their ids.
    ///
    /// The id counter moves past the highest imported id. Nothing is imported
    /// if that would leave no id to hand out next.
    pub fn import(&self, creatures: Vec<Creature>) -> Result<usize> {
        let next_id = match creatures.iter().map(|c| c.id).max() {
            Some(max_id) => max_id.checked_add(1).ok_or_else(|| {
                CreatureError::InvalidStoreFile(format!("creature id {} leaves no room for new ids", max_id))
            })?,
            None => return Ok(0),
        };

        let imported = creatures.len();
        for creature in creatures {
            self.creatures.insert(creature.id, creature);
        }
        self.next_id.fetch_max(next_id, Ordering::SeqCst);

        Ok(imported)
    }

    /// Removes every creature and resets the id counter.
    pub fn clear(&self) {
        self.creatures.clear();
        self.next_id.store(FIRST_CREATURE_ID, Ordering::SeqCst);
    }
}

impl Default for MemoryCreatureStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CreatureStore for MemoryCreatureStore {
    #[instrument(skip(self, description))]
    async fn create_creature(&self, name: &str, description: &str) -> Result<Creature> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let creature = Creature::new(id, name, description);

        debug!(id, "Storing creature");
        self.creatures.insert(id, creature.clone());

        Ok(creature)
    }

    #[instrument(skip(self))]
    async fn get_creature(&self, id: CreatureId) -> Result<CreatureLookupResult> {
        Ok(self.creatures.get(&id).map(|entry| entry.clone()).into())
    }
}
