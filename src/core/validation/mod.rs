//! Validation system
//!
//! Routes declare the input they expect through a [`SchemaDescriptor`]. The
//! [`ValidationEngine`] checks raw request input against it before the handler
//! runs, and handlers pick up the decoded result through the [`Validated`]
//! extractor.

pub mod engine;
pub mod extractor;
pub mod messages;
pub mod schema;
pub mod validators;

pub use engine::{RawInput, ValidationEngine};
pub use extractor::Validated;
pub use schema::{
    CharClass, Constraint, DecodeSource, FieldSource, FieldSpec, FieldType, RegisteredSchema,
    Schema, SchemaDescriptor, ValidatedData,
};
