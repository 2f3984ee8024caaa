//! The catalog contract the model generator reads from.
//!
//! A backend must describe tables; relation and index introspection are
//! optional and default to [`IntrospectionError::NotSupported`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// JSON catalog snapshots.
pub mod snapshot;

/// Failure reported by an introspection backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntrospectionError {
    /// The backend cannot provide this kind of metadata at all.
    #[error("{capability} introspection is not supported by this backend")]
    NotSupported {
        /// Which capability is missing (`table description`, `relations`, `indexes`).
        capability: &'static str,
    },
    /// The backend was asked about a table it does not know.
    #[error("unknown table '{0}'")]
    UnknownTable(String),
}

impl IntrospectionError {
    /// Shorthand for [`IntrospectionError::NotSupported`].
    pub fn not_supported(capability: &'static str) -> Self {
        Self::NotSupported { capability }
    }
}

/// One column as reported by the catalog, in table order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescription {
    /// Column name exactly as stored in the catalog.
    pub name: String,
    /// Backend-specific raw type code (an OID, a driver constant, or a declared type name).
    #[serde(deserialize_with = "snapshot::type_code_from_json")]
    pub type_code: String,
    /// Reported display size, if any.
    #[serde(default)]
    pub display_size: Option<u32>,
    /// Numeric precision, if any.
    #[serde(default)]
    pub precision: Option<u32>,
    /// Numeric scale, if any.
    #[serde(default)]
    pub scale: Option<u32>,
    /// Whether the column accepts NULL.
    #[serde(default)]
    pub null_ok: bool,
}

impl ColumnDescription {
    /// A non-null column with no size information.
    pub fn new(name: impl Into<String>, type_code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_code: type_code.into(),
            ..Self::default()
        }
    }

    /// Mark the column as nullable.
    pub fn nullable(mut self) -> Self {
        self.null_ok = true;
        self
    }

    /// Set the reported display size.
    pub fn with_display_size(mut self, size: u32) -> Self {
        self.display_size = Some(size);
        self
    }

    /// Set precision and scale.
    pub fn with_precision(mut self, precision: u32, scale: u32) -> Self {
        self.precision = Some(precision);
        self.scale = Some(scale);
        self
    }
}

/// Key flags for a single column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexInfo {
    /// Column is (part of) the primary key.
    #[serde(default)]
    pub primary_key: bool,
    /// Column carries a single-column unique constraint.
    #[serde(default)]
    pub unique: bool,
}

/// Foreign-key target of a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    /// Position of the referenced column in the target table.
    pub target_column: usize,
    /// Name of the referenced table, as stored in the catalog.
    pub target_table: String,
}

/// Column position → foreign-key target.
pub type RelationMap = BTreeMap<usize, Relation>;

/// Column name → key flags.
pub type KeyMap = BTreeMap<String, IndexInfo>;

/// Read-only view of a database catalog.
pub trait Introspection {
    /// Table names in the order they should be emitted.
    fn list_tables(&self) -> Vec<String>;

    /// Columns of `table` in catalog order.
    fn table_description(&self, table: &str)
        -> Result<Vec<ColumnDescription>, IntrospectionError>;

    /// Foreign keys of `table`, keyed by column position.
    fn relations(&self, _table: &str) -> Result<RelationMap, IntrospectionError> {
        Err(IntrospectionError::not_supported("relations"))
    }

    /// Primary-key and unique flags of `table`, keyed by column name.
    fn indexes(&self, _table: &str) -> Result<KeyMap, IntrospectionError> {
        Err(IntrospectionError::not_supported("indexes"))
    }
}

impl<T: Introspection + ?Sized> Introspection for &T {
    fn list_tables(&self) -> Vec<String> {
        (**self).list_tables()
    }

    fn table_description(
        &self,
        table: &str,
    ) -> Result<Vec<ColumnDescription>, IntrospectionError> {
        (**self).table_description(table)
    }

    fn relations(&self, table: &str) -> Result<RelationMap, IntrospectionError> {
        (**self).relations(table)
    }

    fn indexes(&self, table: &str) -> Result<KeyMap, IntrospectionError> {
        (**self).indexes(table)
    }
}
