//! The public query facade.
//!
//! Validates caller input, drives the userset expansion engine, and
//! converts raw backend identifier strings back into typed entities.
//! The backend collaborator is shared behind an `Arc` and treated as
//! stateless; the client holds no other state beyond an optional
//! authorization-model pin.

use crate::backend::RelationBackend;
use crate::error::{QueryError, ValidationError};
use crate::expand::UsersetExpander;
use crate::validation::{
    validate_check_query, validate_object_query, validate_principal_query, validate_tuple_filter,
};
use lodestone_core::{Entity, Tuple};
use rootcause::prelude::Report;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Client for querying a relationship-based authorization backend.
#[derive(Clone)]
pub struct RelationClient {
    backend: Arc<dyn RelationBackend>,
    model_id: Option<String>,
}

impl RelationClient {
    /// Creates a client over the given backend, querying the backend's
    /// latest authorization model.
    #[must_use]
    pub fn new(backend: Arc<dyn RelationBackend>) -> Self {
        Self {
            backend,
            model_id: None,
        }
    }

    /// Pins every query to a specific authorization model id.
    #[must_use]
    pub fn with_model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = Some(model_id.into());
        self
    }

    /// Resolves the complete set of principals that hold
    /// `query.relation` on `query.object`, following computed and
    /// indirect references through at most `max_depth` backend round
    /// trips.
    ///
    /// References that would need a deeper budget come back as
    /// unexpanded userset entities (`relation` set) rather than
    /// failing. Results are deduplicated and sorted by wire form.
    ///
    /// # Errors
    ///
    /// Fails on an invalid query shape, a `max_depth` of zero, any
    /// backend failure, or a response the engine cannot interpret.
    #[instrument(skip(self), fields(object = %query.object, relation = %query.relation, max_depth))]
    pub async fn find_principals_by_relation(
        &self,
        query: &Tuple,
        max_depth: u32,
    ) -> Result<Vec<Entity>, Report<QueryError>> {
        if max_depth == 0 {
            return Err(
                QueryError::Validation(ValidationError::InvalidDepthBudget { max_depth }).into(),
            );
        }
        validate_principal_query(query).map_err(QueryError::Validation)?;

        let expander = UsersetExpander::new(self.backend.as_ref(), self.model_id.as_deref());
        let raw = expander
            .resolve(query.object.clone(), query.relation.clone(), max_depth)
            .await?;

        let mut principals = Vec::with_capacity(raw.len());
        for identifier in &raw {
            let entity = Entity::parse(identifier).map_err(|e| QueryError::MalformedResult {
                identifier: identifier.clone(),
                details: e.to_string(),
            })?;
            principals.push(entity);
        }
        principals.sort_unstable_by_key(ToString::to_string);

        debug!(count = principals.len(), "resolved principal set");
        Ok(principals)
    }

    /// Checks whether the tuple's subject holds the tuple's relation on
    /// the tuple's object. A single backend round trip, no recursion.
    ///
    /// # Errors
    ///
    /// Fails on an invalid query shape or a backend failure.
    #[instrument(skip(self), fields(object = %tuple.object, relation = %tuple.relation))]
    pub async fn check_relation(&self, tuple: &Tuple) -> Result<bool, Report<QueryError>> {
        validate_check_query(tuple).map_err(QueryError::Validation)?;

        let allowed = self
            .backend
            .check(tuple, self.model_id.as_deref())
            .await
            .map_err(|e| QueryError::Backend {
                operation: "check",
                details: e.to_string(),
            })?;

        debug!(allowed, "relation check result");
        Ok(allowed)
    }

    /// Lists the objects of `query.object.kind` on which
    /// `query.subject` holds `query.relation`. A single backend round
    /// trip, no recursion.
    ///
    /// # Errors
    ///
    /// Fails on an invalid query shape, a backend failure, or a
    /// malformed identifier in the response.
    #[instrument(skip(self), fields(object_kind = %query.object.kind, relation = %query.relation))]
    pub async fn find_accessible_objects_by_relation(
        &self,
        query: &Tuple,
    ) -> Result<Vec<Entity>, Report<QueryError>> {
        validate_object_query(query).map_err(QueryError::Validation)?;
        let Some(subject) = query.subject.as_ref() else {
            return Err(QueryError::Validation(ValidationError::MissingSubject).into());
        };

        let raw = self
            .backend
            .list_objects(
                &subject.to_string(),
                &query.relation,
                &query.object.kind,
                self.model_id.as_deref(),
            )
            .await
            .map_err(|e| QueryError::Backend {
                operation: "list_objects",
                details: e.to_string(),
            })?;

        let mut objects = Vec::with_capacity(raw.len());
        for identifier in &raw {
            let entity = Entity::parse(identifier).map_err(|e| QueryError::MalformedResult {
                identifier: identifier.clone(),
                details: e.to_string(),
            })?;
            objects.push(entity);
        }
        objects.sort_unstable_by_key(ToString::to_string);

        debug!(count = objects.len(), "accessible objects result");
        Ok(objects)
    }

    /// Reads the stored tuples matching the filter. A single backend
    /// round trip, no recursion.
    ///
    /// # Errors
    ///
    /// Fails on an invalid filter shape or a backend failure.
    #[instrument(skip(self), fields(object_kind = %filter.object.kind))]
    pub async fn find_matching_tuples(
        &self,
        filter: &Tuple,
    ) -> Result<Vec<Tuple>, Report<QueryError>> {
        validate_tuple_filter(filter).map_err(QueryError::Validation)?;

        let tuples = self
            .backend
            .read_tuples(filter)
            .await
            .map_err(|e| QueryError::Backend {
                operation: "read_tuples",
                details: e.to_string(),
            })?;

        debug!(count = tuples.len(), "matching tuples result");
        Ok(tuples)
    }
}
