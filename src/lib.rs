//! Introspect a relational schema and emit Django-style model declarations.
#![warn(missing_docs)]

/// Errors that abort a whole generation run.
pub mod error;
/// Model generation: type inference, field synthesis, and rendering.
pub mod generator;
/// The catalog contract and the JSON snapshot backend.
pub mod introspection;
/// Writing generated modules to disk or stdout.
pub mod output;
/// Identifier normalization and DDL parsing.
pub mod parser;
