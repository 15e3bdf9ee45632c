//! Query-shape validation.
//!
//! One validator per public operation. Validation always runs before
//! any backend work, so a rejected query performs zero round trips.

use crate::error::ValidationError;
use lodestone_core::Tuple;

/// Validates a tuple filter for the matching-tuples query: the object
/// must name a kind and no userset relation, and either the object id
/// or a fully-specified subject must constrain the filter.
pub(crate) fn validate_tuple_filter(filter: &Tuple) -> Result<(), ValidationError> {
    if filter.object.kind.is_empty() {
        return Err(ValidationError::MissingObjectKind);
    }
    if filter.object.relation.is_some() {
        return Err(ValidationError::ObjectRelationNotAllowed);
    }
    let subject_specified = filter
        .subject
        .as_ref()
        .is_some_and(|s| s.is_fully_specified());
    if filter.object.id.is_empty() && !subject_specified {
        return Err(ValidationError::UnderspecifiedFilter);
    }
    Ok(())
}

/// Validates a user-by-relation query: a fully-specified object with no
/// userset relation, and a non-empty relation.
pub(crate) fn validate_principal_query(query: &Tuple) -> Result<(), ValidationError> {
    if query.object.kind.is_empty() {
        return Err(ValidationError::MissingObjectKind);
    }
    if query.object.id.is_empty() {
        return Err(ValidationError::MissingObjectId);
    }
    if query.object.relation.is_some() {
        return Err(ValidationError::ObjectRelationNotAllowed);
    }
    if query.relation.is_empty() {
        return Err(ValidationError::MissingRelation);
    }
    Ok(())
}

/// Validates an accessible-objects query: a fully-specified subject, a
/// non-empty relation, and an object naming only a kind.
pub(crate) fn validate_object_query(query: &Tuple) -> Result<(), ValidationError> {
    if !query
        .subject
        .as_ref()
        .is_some_and(|s| s.is_fully_specified())
    {
        return Err(ValidationError::MissingSubject);
    }
    if query.relation.is_empty() {
        return Err(ValidationError::MissingRelation);
    }
    if query.object.kind.is_empty() {
        return Err(ValidationError::MissingObjectKind);
    }
    if !query.object.id.is_empty() {
        return Err(ValidationError::ObjectIdNotAllowed);
    }
    if query.object.relation.is_some() {
        return Err(ValidationError::ObjectRelationNotAllowed);
    }
    Ok(())
}

/// Validates a check-relation query: a fully-specified subject and
/// object plus a non-empty relation.
pub(crate) fn validate_check_query(query: &Tuple) -> Result<(), ValidationError> {
    if !query
        .subject
        .as_ref()
        .is_some_and(|s| s.is_fully_specified())
    {
        return Err(ValidationError::MissingSubject);
    }
    validate_principal_query(query)
}
