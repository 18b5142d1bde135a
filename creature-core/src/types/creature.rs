//! Creature records and lookup results.

use serde::{Deserialize, Serialize};

/// Key under which creatures are stored and cached.
pub type CreatureId = i64;

/// A creature as held by a store.
///
/// The id is assigned by the store on creation; everything else is echoed
/// back from the create call.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Creature {
    /// Store-assigned identifier
    pub id: CreatureId,
    /// Display name
    pub name: String,
    /// Free-form description
    pub description: String,
}

impl Creature {
    /// Creates a creature record.
    pub fn new(id: CreatureId, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Outcome of looking a creature up by id.
///
/// A missing creature is a successful lookup, not an error, and is cached
/// just like a hit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "creature", rename_all = "snake_case")]
pub enum CreatureLookupResult {
    /// The store holds a creature with the requested id.
    Found(Creature),
    /// The store holds no creature with the requested id.
    NotFound,
}

impl CreatureLookupResult {
    /// Returns true for [`CreatureLookupResult::Found`].
    pub fn is_found(&self) -> bool {
        matches!(self, CreatureLookupResult::Found(_))
    }

    /// Borrows the creature, if one was found.
    pub fn creature(&self) -> Option<&Creature> {
        match self {
            CreatureLookupResult::Found(creature) => Some(creature),
            CreatureLookupResult::NotFound => None,
        }
    }

    /// Consumes the result, returning the creature if one was found.
    pub fn into_creature(self) -> Option<Creature> {
        match self {
            CreatureLookupResult::Found(creature) => Some(creature),
            CreatureLookupResult::NotFound => None,
        }
    }
}

impl From<Option<Creature>> for CreatureLookupResult {
    fn from(creature: Option<Creature>) -> Self {
        creature.map_or(CreatureLookupResult::NotFound, CreatureLookupResult::Found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creature_equality_covers_all_fields() {
        let bob = Creature::new(123, "bob", "likes testing");
        assert_eq!(bob, Creature::new(123, "bob", "likes testing"));
        assert_ne!(bob, Creature::new(123, "bob", "dislikes testing"));
        assert_ne!(bob, Creature::new(124, "bob", "likes testing"));
    }

    #[test]
    fn test_lookup_accessors() {
        let bob = Creature::new(1, "bob", "likes testing");
        let found = CreatureLookupResult::Found(bob.clone());
        assert!(found.is_found());
        assert_eq!(found.creature(), Some(&bob));
        assert_eq!(found.into_creature(), Some(bob));

        let missing = CreatureLookupResult::NotFound;
        assert!(!missing.is_found());
        assert!(missing.creature().is_none());
    }

    #[test]
    fn test_lookup_from_option() {
        let bob = Creature::new(1, "bob", "likes testing");
        assert_eq!(
            CreatureLookupResult::from(Some(bob.clone())),
            CreatureLookupResult::Found(bob)
        );
        assert_eq!(CreatureLookupResult::from(None), CreatureLookupResult::NotFound);
    }

    #[test]
    fn test_lookup_json_shape() {
        let found = CreatureLookupResult::Found(Creature::new(7, "gus", "a goose"));
        let json = serde_json::to_value(&found).unwrap();
        assert_eq!(json["status"], "found");
        assert_eq!(json["creature"]["id"], 7);

        let missing = serde_json::to_value(CreatureLookupResult::NotFound).unwrap();
        assert_eq!(missing["status"], "not_found");
    }
}
