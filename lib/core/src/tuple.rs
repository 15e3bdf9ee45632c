//! Relationship assertions: (subject, relation, object) triples.

use crate::entity::Entity;
use serde::{Deserialize, Serialize};

/// A relationship assertion or query shape.
///
/// Depending on the operation, some fields may be left unset: a
/// tuple-filter query can omit the subject, an expansion query always
/// omits it. Each operation validates the shape it requires before any
/// backend work happens. Tuples are plain values; every recursive
/// expansion branch builds its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tuple {
    /// The subject holding the relation, when the query specifies one.
    pub subject: Option<Entity>,
    /// The relation name (e.g., "viewer", "member").
    pub relation: String,
    /// The object the relation applies to.
    pub object: Entity,
}

impl Tuple {
    /// Creates a fully-specified relationship assertion.
    #[must_use]
    pub fn new(subject: Entity, relation: impl Into<String>, object: Entity) -> Self {
        Self {
            subject: Some(subject),
            relation: relation.into(),
            object,
        }
    }

    /// Creates an object-relation query with no subject, the shape used
    /// by userset expansion.
    #[must_use]
    pub fn expansion(object: Entity, relation: impl Into<String>) -> Self {
        Self {
            subject: None,
            relation: relation.into(),
            object,
        }
    }

    /// Creates a filter for matching stored tuples; any of subject,
    /// relation, or object id may be left unset.
    #[must_use]
    pub fn filter(subject: Option<Entity>, relation: impl Into<String>, object: Entity) -> Self {
        Self {
            subject,
            relation: relation.into(),
            object,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_sets_all_fields() {
        let tuple = Tuple::new(
            Entity::new("user", "alice"),
            "viewer",
            Entity::new("document", "readme"),
        );
        assert_eq!(tuple.subject, Some(Entity::new("user", "alice")));
        assert_eq!(tuple.relation, "viewer");
        assert_eq!(tuple.object, Entity::new("document", "readme"));
    }

    #[test]
    fn expansion_has_no_subject() {
        let tuple = Tuple::expansion(Entity::new("document", "readme"), "viewer");
        assert_eq!(tuple.subject, None);
    }

    #[test]
    fn tuple_serde_round_trip() {
        let tuple = Tuple::new(
            Entity::new("user", "alice"),
            "viewer",
            Entity::new("document", "readme"),
        );
        let json = serde_json::to_string(&tuple).expect("serialize");
        let parsed: Tuple = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, tuple);
    }
}
