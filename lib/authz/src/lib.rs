//! Userset expansion client for relationship-based authorization.
//!
//! Given a typed relationship assertion ("principal P has relation R to
//! object O"), this crate answers either whether the relationship holds
//! or which principals hold the relation, by recursively resolving the
//! expansion trees a [`RelationBackend`] returns. Connection setup and
//! wire marshaling belong to the backend implementation; this crate
//! owns validation, the depth-bounded expansion algorithm, and the
//! typed query surface.

mod backend;
mod client;
mod error;
mod expand;
mod tree;
mod validation;

pub use backend::{BackendError, RelationBackend};
pub use client::RelationClient;
pub use error::{QueryError, ValidationError};
pub use tree::{Computed, ExpansionTree, Leaf, Node};
