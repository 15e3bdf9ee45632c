//! Expansion tree returned by the backend's expand query.
//!
//! The tree describes how a relation on an object is satisfied:
//! directly through stored relationships, by union over alternatives,
//! by a model-implied (computed) rewrite, or transitively through a
//! different object. Node alternatives are explicit enum variants, so
//! a leaf with no populated alternative is unrepresentable; the only
//! optionality kept from the wire shape is the tree root and the
//! userset string of a computed entry, both of which the engine rejects
//! when absent.

/// The backend's response to an expand query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpansionTree {
    /// The root node; a successful expansion always carries one, and
    /// its absence is treated as a protocol violation.
    pub root: Option<Node>,
}

impl ExpansionTree {
    /// Creates a tree with the given root.
    #[must_use]
    pub fn new(root: Node) -> Self {
        Self { root: Some(root) }
    }
}

/// One node of an expansion tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// The relation holds when any child resolves.
    Union {
        /// Child nodes of the union.
        children: Vec<Node>,
    },
    /// A terminal node.
    Leaf(Leaf),
}

/// A terminal node of an expansion tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Leaf {
    /// Literal stored-relationship principals and userset references.
    Direct {
        /// Raw identifier strings, `kind:id` or `kind:id#relation`.
        identifiers: Vec<String>,
    },
    /// A relation implied by the authorization model's rewrite rules
    /// (e.g., every writer is also a viewer).
    Computed(Computed),
    /// A relation implied transitively through a different object
    /// (e.g., editor of the parent folder is editor of the document).
    /// Only computed-shaped entries are meaningful; anything else is
    /// rejected by the engine.
    IndirectReference {
        /// The nested entries, expected to be computed leaves.
        entries: Vec<Node>,
    },
}

/// A computed rewrite entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Computed {
    /// The implied userset, `kind:id#relation`; absent on a malformed
    /// response.
    pub userset: Option<String>,
}

impl Computed {
    /// Creates a computed entry referencing the given userset.
    #[must_use]
    pub fn new(userset: impl Into<String>) -> Self {
        Self {
            userset: Some(userset.into()),
        }
    }
}

impl Node {
    /// Creates a direct-identifiers leaf.
    #[must_use]
    pub fn direct<I, S>(identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Leaf(Leaf::Direct {
            identifiers: identifiers.into_iter().map(Into::into).collect(),
        })
    }

    /// Creates a computed-rewrite leaf.
    #[must_use]
    pub fn computed(userset: impl Into<String>) -> Self {
        Self::Leaf(Leaf::Computed(Computed::new(userset)))
    }

    /// Creates an indirect-reference leaf over computed entries.
    #[must_use]
    pub fn indirect<I, S>(usersets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Leaf(Leaf::IndirectReference {
            entries: usersets
                .into_iter()
                .map(|u| Self::Leaf(Leaf::Computed(Computed::new(u))))
                .collect(),
        })
    }

    /// Creates a union over the given children.
    #[must_use]
    pub fn union(children: Vec<Node>) -> Self {
        Self::Union { children }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_builder_collects_identifiers() {
        let node = Node::direct(["user:alice", "user:bob"]);
        match node {
            Node::Leaf(Leaf::Direct { identifiers }) => {
                assert_eq!(identifiers, vec!["user:alice", "user:bob"]);
            }
            other => panic!("expected direct leaf, got {other:?}"),
        }
    }

    #[test]
    fn indirect_builder_wraps_computed_entries() {
        let node = Node::indirect(["folder:1#editor"]);
        match node {
            Node::Leaf(Leaf::IndirectReference { entries }) => {
                assert_eq!(entries.len(), 1);
                assert_eq!(
                    entries[0],
                    Node::Leaf(Leaf::Computed(Computed::new("folder:1#editor")))
                );
            }
            other => panic!("expected indirect leaf, got {other:?}"),
        }
    }
}
