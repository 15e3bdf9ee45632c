//! Typed identifiers for principals, objects, and userset references.
//!
//! The wire format throughout the system is `kind:id` for a concrete
//! principal or object, `kind:*` for a wildcard principal, and
//! `kind:id#relation` for a userset reference ("all principals holding
//! `relation` on `kind:id`").

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Error returned when parsing an identifier from a wire string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseEntityError {
    /// The input string was empty.
    Empty,
    /// No `:` separator between kind and id.
    MissingKindSeparator {
        /// The offending input.
        input: String,
    },
    /// More than one `#` separator.
    TooManyRelationSeparators {
        /// The offending input.
        input: String,
    },
    /// A segment (kind, id, or relation) was empty or contained a
    /// character outside its allowed charset.
    InvalidSegment {
        /// The offending input.
        input: String,
        /// Which segment failed: "kind", "id", or "relation".
        segment: &'static str,
    },
}

impl fmt::Display for ParseEntityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "identifier is empty"),
            Self::MissingKindSeparator { input } => {
                write!(f, "identifier '{input}' is missing the ':' kind separator")
            }
            Self::TooManyRelationSeparators { input } => {
                write!(f, "identifier '{input}' contains more than one '#'")
            }
            Self::InvalidSegment { input, segment } => {
                write!(f, "identifier '{input}' has an invalid {segment} segment")
            }
        }
    }
}

impl std::error::Error for ParseEntityError {}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn is_valid_kind(kind: &str) -> bool {
    !kind.is_empty() && kind.chars().all(is_ident_char)
}

fn is_valid_id(id: &str) -> bool {
    if id == "*" {
        return true;
    }
    let mut chars = id.chars();
    match chars.next() {
        Some(first) if is_ident_char(first) => {}
        _ => return false,
    }
    chars.all(|c| is_ident_char(c) || matches!(c, '.' | '-' | '+' | '@'))
}

fn is_valid_relation(relation: &str) -> bool {
    let mut chars = relation.chars();
    match chars.next() {
        Some(first) if is_ident_char(first) => {}
        _ => return false,
    }
    chars.all(|c| is_ident_char(c) || c == '-')
}

/// A principal, object, or userset reference.
///
/// A fully-resolved entity always has a non-empty `kind` and `id`;
/// `relation` is present exactly when the entity denotes a userset
/// reference rather than a single principal or object. Query filters
/// may construct partially-specified entities (empty `id`, or kind
/// only); the per-operation validators enforce which fields each query
/// shape requires.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Entity {
    /// The entity kind (e.g., "user", "document").
    pub kind: String,
    /// The entity id, or `*` for a wildcard principal.
    pub id: String,
    /// The userset relation, when this entity is a userset reference.
    pub relation: Option<String>,
}

impl Entity {
    /// Creates a concrete entity from a kind and id.
    #[must_use]
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
            relation: None,
        }
    }

    /// Creates a userset reference (`kind:id#relation`).
    #[must_use]
    pub fn userset(
        kind: impl Into<String>,
        id: impl Into<String>,
        relation: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
            relation: Some(relation.into()),
        }
    }

    /// Creates a kind-only entity, used by object-listing filters.
    #[must_use]
    pub fn kind_only(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: String::new(),
            relation: None,
        }
    }

    /// Parses a wire identifier of the form `kind:id[#relation]`.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseEntityError`] when the input is empty, lacks the
    /// `:` separator, carries more than one `#`, or any segment is empty
    /// or outside its allowed charset.
    pub fn parse(input: &str) -> Result<Self, ParseEntityError> {
        if input.is_empty() {
            return Err(ParseEntityError::Empty);
        }

        let (body, relation) = match input.split_once('#') {
            None => (input, None),
            Some((body, relation)) => {
                if relation.contains('#') {
                    return Err(ParseEntityError::TooManyRelationSeparators {
                        input: input.to_string(),
                    });
                }
                (body, Some(relation))
            }
        };

        let Some((kind, id)) = body.split_once(':') else {
            return Err(ParseEntityError::MissingKindSeparator {
                input: input.to_string(),
            });
        };

        if !is_valid_kind(kind) {
            return Err(ParseEntityError::InvalidSegment {
                input: input.to_string(),
                segment: "kind",
            });
        }
        if !is_valid_id(id) {
            return Err(ParseEntityError::InvalidSegment {
                input: input.to_string(),
                segment: "id",
            });
        }
        if let Some(relation) = relation
            && !is_valid_relation(relation)
        {
            return Err(ParseEntityError::InvalidSegment {
                input: input.to_string(),
                segment: "relation",
            });
        }

        Ok(Self {
            kind: kind.to_string(),
            id: id.to_string(),
            relation: relation.map(str::to_string),
        })
    }

    /// Returns true when both kind and id are present.
    #[must_use]
    pub fn is_fully_specified(&self) -> bool {
        !self.kind.is_empty() && !self.id.is_empty()
    }

    /// Returns true when this entity is the wildcard principal of its kind.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.id == "*"
    }

    /// Returns true when this entity denotes a userset reference.
    #[must_use]
    pub fn is_userset(&self) -> bool {
        self.relation.is_some()
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.relation {
            Some(relation) => write!(f, "{}:{}#{}", self.kind, self.id, relation),
            None => write!(f, "{}:{}", self.kind, self.id),
        }
    }
}

impl FromStr for Entity {
    type Err = ParseEntityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Entity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Entity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Classification of a raw identifier string from a backend response.
///
/// Plain identifiers pass through untouched; only strings carrying a
/// `#` are parsed, because a userset reference must be expanded
/// through a further backend query while a plain principal is already
/// terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentifierRef {
    /// A concrete principal or wildcard, kept verbatim.
    Plain(String),
    /// A userset reference to resolve through another expansion.
    Userset {
        /// The referenced object.
        object: Entity,
        /// The relation on that object.
        relation: String,
    },
}

impl IdentifierRef {
    /// Classifies a raw identifier string by its `#` separator.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseEntityError`] when the string carries more than
    /// one `#`, or when the object segment of a userset reference does
    /// not parse.
    pub fn classify(raw: &str) -> Result<Self, ParseEntityError> {
        match raw.split_once('#') {
            None => Ok(Self::Plain(raw.to_string())),
            Some((_, relation)) if relation.contains('#') => {
                Err(ParseEntityError::TooManyRelationSeparators {
                    input: raw.to_string(),
                })
            }
            Some((object, relation)) => {
                let object = Entity::parse(object)?;
                if !is_valid_relation(relation) {
                    return Err(ParseEntityError::InvalidSegment {
                        input: raw.to_string(),
                        segment: "relation",
                    });
                }
                Ok(Self::Userset {
                    object,
                    relation: relation.to_string(),
                })
            }
        }
    }
}
