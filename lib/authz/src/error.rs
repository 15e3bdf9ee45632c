//! Error types for authorization queries.
//!
//! Errors are designed for layered context using rootcause:
//! - `ValidationError`: malformed query shape, caught before any backend call
//! - `QueryError`: everything a running query can fail with (wraps
//!   validation, backend, and response-structure failures)
//!
//! The split keeps "bad input" distinguishable from "backend
//! unavailable" and from "backend returned something this client
//! cannot interpret".

use std::fmt;

/// Query-shape validation failures.
///
/// Each public operation requires a specific tuple shape; validation
/// runs first, so a failing query never reaches the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The object kind is required but missing.
    MissingObjectKind,
    /// The object id is required but missing.
    MissingObjectId,
    /// The object must not carry a userset relation for this operation.
    ObjectRelationNotAllowed,
    /// The object id must be unset for this operation.
    ObjectIdNotAllowed,
    /// The query relation is required but missing.
    MissingRelation,
    /// A fully-specified subject is required but missing.
    MissingSubject,
    /// A tuple filter must constrain either the object id or the subject.
    UnderspecifiedFilter,
    /// The expansion depth budget must be at least 1.
    InvalidDepthBudget {
        /// The rejected budget.
        max_depth: u32,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingObjectKind => write!(f, "query object must specify a kind"),
            Self::MissingObjectId => write!(f, "query object must specify an id"),
            Self::ObjectRelationNotAllowed => {
                write!(f, "query object must not carry a userset relation")
            }
            Self::ObjectIdNotAllowed => {
                write!(f, "query object must specify only a kind, not an id")
            }
            Self::MissingRelation => write!(f, "query must specify a relation"),
            Self::MissingSubject => write!(f, "query must specify a subject with kind and id"),
            Self::UnderspecifiedFilter => {
                write!(
                    f,
                    "tuple filter must specify an object id or a fully-specified subject"
                )
            }
            Self::InvalidDepthBudget { max_depth } => {
                write!(f, "expansion depth budget must be at least 1, got {max_depth}")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Failures of a running authorization query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// The query shape failed validation; no backend call was made.
    Validation(ValidationError),
    /// The backend call itself failed (transport or non-success status).
    Backend {
        /// The operation that was in flight.
        operation: &'static str,
        /// Error details from the backend.
        details: String,
    },
    /// An expansion response carried no root node.
    MissingExpansionRoot {
        /// The userset whose expansion was requested.
        userset: String,
    },
    /// A computed rewrite entry carried no userset.
    MissingComputedUserset,
    /// An indirect-reference leaf carried an entry that is not a
    /// computed rewrite.
    UnsupportedIndirectEntry,
    /// An identifier in a backend response could not be interpreted.
    UnrecognizedIdentifier {
        /// The offending identifier string.
        identifier: String,
        /// Why classification failed.
        details: String,
    },
    /// A final result string could not be parsed into an entity.
    MalformedResult {
        /// The offending identifier string.
        identifier: String,
        /// Why parsing failed.
        details: String,
    },
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "invalid query: {err}"),
            Self::Backend { operation, details } => {
                write!(f, "backend {operation} call failed: {details}")
            }
            Self::MissingExpansionRoot { userset } => {
                write!(f, "expansion of '{userset}' returned no tree root")
            }
            Self::MissingComputedUserset => {
                write!(f, "computed rewrite entry is missing its userset")
            }
            Self::UnsupportedIndirectEntry => {
                write!(f, "indirect reference contains a non-computed entry")
            }
            Self::UnrecognizedIdentifier {
                identifier,
                details,
            } => {
                write!(f, "unrecognized principal '{identifier}': {details}")
            }
            Self::MalformedResult {
                identifier,
                details,
            } => {
                write!(f, "backend returned malformed identifier '{identifier}': {details}")
            }
        }
    }
}

impl std::error::Error for QueryError {}

impl From<ValidationError> for QueryError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err)
    }
}
