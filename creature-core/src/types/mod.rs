//! Domain types for the creature cache.
//!
//! - [`Creature`]: a stored record keyed by [`CreatureId`]
//! - [`CreatureLookupResult`]: found or not found, both cacheable

mod creature;

pub use creature::*;
