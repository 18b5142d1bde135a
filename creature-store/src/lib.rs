//! # Creature Store
//!
//! Backing stores for creatures.
//!
//! - **Memory**: fast in-memory storage for development and testing
//! - **File**: persistent file-based storage for single-node deployments
//! - **SQL**: libSQL / Turso database (behind the `sql` feature)
//!
//! ## Example
//!
//! ```rust,ignore
//! use creature_store::{MemoryCreatureStore, CreatureStore};
//!
//! let store = MemoryCreatureStore::new();
//! let bob = store.create_creature("bob", "likes testing").await?;
//! let lookup = store.get_creature(bob.id).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod file;
mod memory;
#[cfg(feature = "sql")]
mod sql;

pub use file::FileCreatureStore;
pub use memory::MemoryCreatureStore;
#[cfg(feature = "sql")]
pub use sql::{SqlConfig, SqlCreatureStore};

// Re-export the trait from core
pub use creature_core::traits::CreatureStore;
