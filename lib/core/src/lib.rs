//! Core domain types for the lodestone authorization client.
//!
//! This crate provides the foundational types shared across the
//! workspace: the `Entity` wire identifier, the `Tuple` relationship
//! assertion, and the error-handling `Result` alias.

pub mod entity;
pub mod error;
pub mod tuple;

pub use entity::{Entity, IdentifierRef, ParseEntityError};
pub use error::Result;
pub use tuple::Tuple;
