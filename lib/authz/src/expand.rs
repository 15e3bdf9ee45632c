//! The userset expansion engine.
//!
//! Turns one relation-expansion query into the full, deduplicated set
//! of principal identifier strings by walking the backend's expansion
//! tree, following computed and indirect references through further
//! expand calls.
//!
//! The recursion is bounded by an explicit depth budget. The budget is
//! decremented in exactly one place, [`UsersetExpander::resolve`], once
//! per backend round trip; walking nodes of an already-fetched tree is
//! free. When the budget reaches zero the engine returns the unexpanded
//! userset reference itself instead of failing, so a caller can see
//! which references would need a deeper budget.
//!
//! Errors of any kind short-circuit the whole expansion: no partial
//! results, no retries. Dropping the returned future cancels every
//! pending recursive branch.

use crate::backend::RelationBackend;
use crate::error::QueryError;
use crate::tree::{Computed, Leaf, Node};
use futures::future::BoxFuture;
use lodestone_core::{Entity, IdentifierRef};
use std::collections::HashSet;
use tracing::debug;

/// One expansion run over a borrowed backend.
pub(crate) struct UsersetExpander<'a> {
    backend: &'a dyn RelationBackend,
    model_id: Option<&'a str>,
}

impl<'a> UsersetExpander<'a> {
    pub(crate) fn new(backend: &'a dyn RelationBackend, model_id: Option<&'a str>) -> Self {
        Self { backend, model_id }
    }

    /// Resolves `relation` on `object` into a flat identifier set with
    /// one backend round trip, recursing for any userset references the
    /// response contains.
    pub(crate) fn resolve(
        &self,
        object: Entity,
        relation: String,
        budget: u32,
    ) -> BoxFuture<'_, Result<HashSet<String>, QueryError>> {
        Box::pin(async move {
            let userset = format!("{object}#{relation}");
            if budget == 0 {
                debug!(%userset, "depth budget exhausted, keeping unexpanded reference");
                return Ok(HashSet::from([userset]));
            }

            debug!(%userset, budget, "expanding userset");
            let object_wire = object.to_string();
            let tree = self
                .backend
                .expand(&relation, &object_wire, self.model_id)
                .await
                .map_err(|e| QueryError::Backend {
                    operation: "expand",
                    details: e.to_string(),
                })?;

            let Some(root) = tree.root else {
                return Err(QueryError::MissingExpansionRoot { userset });
            };

            // The only budget decrement: one spent per expand round trip,
            // never per tree node visited.
            self.traverse(&root, budget - 1).await
        })
    }

    /// Flattens one tree node into an identifier set. The budget passes
    /// through unchanged; only a fresh backend call inside
    /// [`Self::resolve`] consumes it.
    fn traverse<'b>(
        &'b self,
        node: &'b Node,
        budget: u32,
    ) -> BoxFuture<'b, Result<HashSet<String>, QueryError>> {
        Box::pin(async move {
            match node {
                Node::Union { children } => {
                    let mut principals = HashSet::new();
                    for child in children {
                        principals.extend(self.traverse(child, budget).await?);
                    }
                    Ok(principals)
                }
                Node::Leaf(Leaf::Direct { identifiers }) => {
                    self.expand_identifiers(budget, identifiers).await
                }
                Node::Leaf(Leaf::Computed(computed)) => {
                    self.expand_computed(budget, std::slice::from_ref(computed))
                        .await
                }
                Node::Leaf(Leaf::IndirectReference { entries }) => {
                    let mut computed = Vec::with_capacity(entries.len());
                    for entry in entries {
                        match entry {
                            Node::Leaf(Leaf::Computed(c)) => computed.push(c.clone()),
                            _ => return Err(QueryError::UnsupportedIndirectEntry),
                        }
                    }
                    self.expand_computed(budget, &computed).await
                }
            }
        })
    }

    /// Splits raw identifier strings into concrete principals (kept
    /// verbatim) and userset references (resolved through a further
    /// backend round trip), unioning everything into one set.
    async fn expand_identifiers(
        &self,
        budget: u32,
        identifiers: &[String],
    ) -> Result<HashSet<String>, QueryError> {
        let mut principals = HashSet::new();
        for raw in identifiers {
            match IdentifierRef::classify(raw) {
                Ok(IdentifierRef::Plain(principal)) => {
                    principals.insert(principal);
                }
                Ok(IdentifierRef::Userset { object, relation }) => {
                    principals.extend(self.resolve(object, relation, budget).await?);
                }
                Err(err) => {
                    return Err(QueryError::UnrecognizedIdentifier {
                        identifier: raw.clone(),
                        details: err.to_string(),
                    });
                }
            }
        }
        Ok(principals)
    }

    /// Resolves computed rewrite entries, requiring each to carry a
    /// non-empty userset.
    async fn expand_computed(
        &self,
        budget: u32,
        entries: &[Computed],
    ) -> Result<HashSet<String>, QueryError> {
        let mut principals = HashSet::new();
        for entry in entries {
            let userset = entry
                .userset
                .as_deref()
                .filter(|u| !u.is_empty())
                .ok_or(QueryError::MissingComputedUserset)?;
            let single = [userset.to_string()];
            principals.extend(self.expand_identifiers(budget, &single).await?);
        }
        Ok(principals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendError;
    use crate::tree::ExpansionTree;
    use async_trait::async_trait;
    use lodestone_core::Tuple;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockBackend {
        trees: Mutex<HashMap<String, ExpansionTree>>,
        expand_calls: AtomicUsize,
    }

    impl MockBackend {
        fn new() -> Self {
            Self {
                trees: Mutex::new(HashMap::new()),
                expand_calls: AtomicUsize::new(0),
            }
        }

        fn script(self, object: &str, relation: &str, root: Node) -> Self {
            self.script_tree(object, relation, ExpansionTree::new(root))
        }

        fn script_tree(self, object: &str, relation: &str, tree: ExpansionTree) -> Self {
            self.trees
                .lock()
                .unwrap()
                .insert(format!("{object}#{relation}"), tree);
            self
        }

        fn expand_count(&self) -> usize {
            self.expand_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RelationBackend for MockBackend {
        async fn expand(
            &self,
            relation: &str,
            object: &str,
            _model_id: Option<&str>,
        ) -> Result<ExpansionTree, BackendError> {
            self.expand_calls.fetch_add(1, Ordering::SeqCst);
            self.trees
                .lock()
                .unwrap()
                .get(&format!("{object}#{relation}"))
                .cloned()
                .ok_or_else(|| BackendError::Status {
                    code: 404,
                    details: format!("no expansion scripted for {object}#{relation}"),
                })
        }

        async fn check(
            &self,
            _tuple: &Tuple,
            _model_id: Option<&str>,
        ) -> Result<bool, BackendError> {
            Ok(false)
        }

        async fn list_objects(
            &self,
            _subject: &str,
            _relation: &str,
            _object_kind: &str,
            _model_id: Option<&str>,
        ) -> Result<Vec<String>, BackendError> {
            Ok(Vec::new())
        }

        async fn read_tuples(&self, _filter: &Tuple) -> Result<Vec<Tuple>, BackendError> {
            Ok(Vec::new())
        }
    }

    fn set_of(identifiers: &[&str]) -> HashSet<String> {
        identifiers.iter().map(|s| s.to_string()).collect()
    }

    async fn resolve(
        backend: &MockBackend,
        object: &str,
        relation: &str,
        budget: u32,
    ) -> Result<HashSet<String>, QueryError> {
        let expander = UsersetExpander::new(backend, None);
        let object = Entity::parse(object).expect("valid object");
        expander.resolve(object, relation.to_string(), budget).await
    }

    #[tokio::test]
    async fn direct_leaf_resolves_principals() {
        let backend = MockBackend::new().script(
            "document:readme",
            "viewer",
            Node::direct(["user:alice", "user:bob"]),
        );

        let principals = resolve(&backend, "document:readme", "viewer", 1)
            .await
            .unwrap();
        assert_eq!(principals, set_of(&["user:alice", "user:bob"]));
        assert_eq!(backend.expand_count(), 1);
    }

    #[tokio::test]
    async fn union_of_two_leaves() {
        let backend = MockBackend::new().script(
            "document:readme",
            "viewer",
            Node::union(vec![Node::direct(["user:a"]), Node::direct(["user:b"])]),
        );

        let principals = resolve(&backend, "document:readme", "viewer", 1)
            .await
            .unwrap();
        assert_eq!(principals, set_of(&["user:a", "user:b"]));
    }

    #[tokio::test]
    async fn union_order_does_not_change_result() {
        let forward = MockBackend::new().script(
            "document:readme",
            "viewer",
            Node::union(vec![Node::direct(["user:a"]), Node::direct(["user:b"])]),
        );
        let reversed = MockBackend::new().script(
            "document:readme",
            "viewer",
            Node::union(vec![Node::direct(["user:b"]), Node::direct(["user:a"])]),
        );

        let a = resolve(&forward, "document:readme", "viewer", 1)
            .await
            .unwrap();
        let b = resolve(&reversed, "document:readme", "viewer", 1)
            .await
            .unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn duplicate_principals_across_branches_appear_once() {
        let backend = MockBackend::new()
            .script(
                "document:readme",
                "viewer",
                Node::union(vec![
                    Node::direct(["user:alice"]),
                    Node::direct(["user:alice", "team:eng#member"]),
                ]),
            )
            .script("team:eng", "member", Node::direct(["user:alice"]));

        let principals = resolve(&backend, "document:readme", "viewer", 2)
            .await
            .unwrap();
        assert_eq!(principals, set_of(&["user:alice"]));
    }

    #[tokio::test]
    async fn depth_zero_returns_unexpanded_userset() {
        let backend = MockBackend::new();

        let principals = resolve(&backend, "document:readme", "viewer", 0)
            .await
            .unwrap();
        assert_eq!(principals, set_of(&["document:readme#viewer"]));
        assert_eq!(backend.expand_count(), 0);
    }

    #[tokio::test]
    async fn indirect_reference_expands_through_follow_up_call() {
        let backend = MockBackend::new()
            .script(
                "document:readme",
                "editor",
                Node::indirect(["folder:1#editor"]),
            )
            .script("folder:1", "editor", Node::direct(["user:carol"]));

        let principals = resolve(&backend, "document:readme", "editor", 2)
            .await
            .unwrap();
        assert_eq!(principals, set_of(&["user:carol"]));
        // One initial expand plus exactly one follow-up.
        assert_eq!(backend.expand_count(), 2);
    }

    #[tokio::test]
    async fn indirect_reference_with_insufficient_depth_stays_unexpanded() {
        let backend = MockBackend::new().script(
            "document:readme",
            "editor",
            Node::indirect(["folder:1#editor"]),
        );

        let principals = resolve(&backend, "document:readme", "editor", 1)
            .await
            .unwrap();
        assert_eq!(principals, set_of(&["folder:1#editor"]));
        assert_eq!(backend.expand_count(), 1);
    }

    #[tokio::test]
    async fn computed_leaf_follows_rewrite() {
        let backend = MockBackend::new()
            .script(
                "document:readme",
                "viewer",
                Node::computed("document:readme#writer"),
            )
            .script("document:readme", "writer", Node::direct(["user:dave"]));

        let principals = resolve(&backend, "document:readme", "viewer", 2)
            .await
            .unwrap();
        assert_eq!(principals, set_of(&["user:dave"]));
    }

    #[tokio::test]
    async fn wildcard_principal_is_kept_verbatim() {
        let backend =
            MockBackend::new().script("document:readme", "viewer", Node::direct(["user:*"]));

        let principals = resolve(&backend, "document:readme", "viewer", 1)
            .await
            .unwrap();
        assert_eq!(principals, set_of(&["user:*"]));
    }

    #[tokio::test]
    async fn plain_identifiers_pass_through_without_backend_calls() {
        let backend = MockBackend::new();
        let expander = UsersetExpander::new(&backend, None);

        let identifiers = vec!["user:alice".to_string(), "user:bob".to_string()];
        let principals = expander.expand_identifiers(5, &identifiers).await.unwrap();
        assert_eq!(principals, set_of(&["user:alice", "user:bob"]));
        assert_eq!(backend.expand_count(), 0);
    }

    #[tokio::test]
    async fn malformed_identifier_deep_in_recursion_fails_whole_call() {
        let backend = MockBackend::new()
            .script(
                "document:readme",
                "viewer",
                Node::union(vec![
                    Node::direct(["user:a"]),
                    Node::direct(["team:eng#member"]),
                ]),
            )
            .script("team:eng", "member", Node::direct(["user:x#y#z"]));

        let err = resolve(&backend, "document:readme", "viewer", 3)
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::UnrecognizedIdentifier { .. }));
    }

    #[tokio::test]
    async fn missing_root_is_a_structural_error() {
        let backend = MockBackend::new().script_tree(
            "document:readme",
            "viewer",
            ExpansionTree { root: None },
        );

        let err = resolve(&backend, "document:readme", "viewer", 1)
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::MissingExpansionRoot { .. }));
    }

    #[tokio::test]
    async fn computed_entry_without_userset_is_rejected() {
        let backend = MockBackend::new().script(
            "document:readme",
            "viewer",
            Node::Leaf(Leaf::Computed(Computed { userset: None })),
        );

        let err = resolve(&backend, "document:readme", "viewer", 2)
            .await
            .unwrap_err();
        assert_eq!(err, QueryError::MissingComputedUserset);
    }

    #[tokio::test]
    async fn computed_entry_with_empty_userset_is_rejected() {
        let backend =
            MockBackend::new().script("document:readme", "viewer", Node::computed(""));

        let err = resolve(&backend, "document:readme", "viewer", 2)
            .await
            .unwrap_err();
        assert_eq!(err, QueryError::MissingComputedUserset);
    }

    #[tokio::test]
    async fn non_computed_indirect_entry_is_rejected() {
        let backend = MockBackend::new().script(
            "document:readme",
            "editor",
            Node::Leaf(Leaf::IndirectReference {
                entries: vec![Node::direct(["user:a"])],
            }),
        );

        let err = resolve(&backend, "document:readme", "editor", 2)
            .await
            .unwrap_err();
        assert_eq!(err, QueryError::UnsupportedIndirectEntry);
    }

    #[tokio::test]
    async fn backend_error_propagates_with_operation_context() {
        let backend = MockBackend::new();

        let err = resolve(&backend, "document:readme", "viewer", 1)
            .await
            .unwrap_err();
        match err {
            QueryError::Backend { operation, details } => {
                assert_eq!(operation, "expand");
                assert!(details.contains("404"));
            }
            other => panic!("expected backend error, got {other:?}"),
        }
    }
}
