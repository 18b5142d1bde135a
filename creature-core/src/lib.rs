//! # Creature Core
//!
//! Core types, errors, and traits shared by the creature cache crates.
//!
//! - **Types**: [`Creature`] and the cacheable [`CreatureLookupResult`]
//! - **Errors**: [`CreatureError`] with store-failure classification
//! - **Constants**: defaults and environment variable names
//! - **Traits**: the [`CreatureStore`] capability every store and cache implements
//!
//! ## Example
//!
//! ```rust
//! use creature_core::{Creature, CreatureLookupResult};
//!
//! let bob = Creature::new(123, "bob", "likes testing");
//! let result = CreatureLookupResult::Found(bob.clone());
//! assert_eq!(result.creature(), Some(&bob));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod constants;
pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use constants::*;
pub use error::{CreatureError, Result};
pub use traits::*;
pub use types::*;
