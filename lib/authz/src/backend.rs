//! Backend access abstraction.
//!
//! The client never speaks a wire protocol itself; it depends on a
//! [`RelationBackend`] implementation that owns connection setup,
//! authentication, and request marshaling. The engine treats the
//! backend as stateless and thread-safe and never retries it.

use crate::tree::ExpansionTree;
use async_trait::async_trait;
use lodestone_core::Tuple;
use std::fmt;

/// Errors surfaced by a backend implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The request never completed (connection, timeout, protocol).
    Transport {
        /// Error details.
        details: String,
    },
    /// The backend answered with a non-success status.
    Status {
        /// The status code.
        code: u16,
        /// Error details.
        details: String,
    },
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport { details } => write!(f, "transport failure: {details}"),
            Self::Status { code, details } => {
                write!(f, "backend returned status {code}: {details}")
            }
        }
    }
}

impl std::error::Error for BackendError {}

/// The authorization backend the client queries.
///
/// All methods take `&self`; implementations are expected to manage
/// their own connection pooling and be safe to share across concurrent
/// queries.
#[async_trait]
pub trait RelationBackend: Send + Sync {
    /// Returns the tree describing how `relation` on `object` is
    /// satisfied. `object` is in `kind:id` wire form.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    async fn expand(
        &self,
        relation: &str,
        object: &str,
        model_id: Option<&str>,
    ) -> Result<ExpansionTree, BackendError>;

    /// Checks whether the tuple's subject holds the tuple's relation on
    /// the tuple's object.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    async fn check(&self, tuple: &Tuple, model_id: Option<&str>) -> Result<bool, BackendError>;

    /// Lists objects of `object_kind` on which `subject` (wire form)
    /// holds `relation`. Results are `kind:id` strings.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    async fn list_objects(
        &self,
        subject: &str,
        relation: &str,
        object_kind: &str,
        model_id: Option<&str>,
    ) -> Result<Vec<String>, BackendError>;

    /// Reads stored tuples matching the filter.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    async fn read_tuples(&self, filter: &Tuple) -> Result<Vec<Tuple>, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_error_display() {
        let err = BackendError::Transport {
            details: "connection refused".to_string(),
        };
        assert!(err.to_string().contains("connection refused"));

        let err = BackendError::Status {
            code: 429,
            details: "rate limited".to_string(),
        };
        assert!(err.to_string().contains("429"));
    }
}
