//! Core contracts and helpers for mapforge.
//!
//! This crate defines the schema snapshot consumed from introspection, the
//! resolved table descriptors the generators work on, and the naming and
//! type helpers shared by every other crate in the workspace.

pub mod constraints;
pub mod error;
pub mod java_type;
pub mod naming;
pub mod schema;
pub mod table;
pub mod types;
pub mod validation;

pub use constraints::{CheckConstraint, Constraint, ForeignKey, KeyColumns};
pub use error::{Error, Result};
pub use java_type::JavaType;
pub use schema::{Column, DatabaseSchema, Schema, Table, TableKind};
pub use table::{
    ColumnDescriptor, FullyQualifiedTable, GeneratedKey, KeyTiming, StatementToggles,
    TableDescriptor,
};
pub use types::{ColumnType, GeneratedExpression, GeneratedKind, IdentityGeneration};
pub use validation::validate_schema;

/// Current schema contract version for `schema.json` snapshots.
pub const SCHEMA_VERSION: &str = "0.1";
