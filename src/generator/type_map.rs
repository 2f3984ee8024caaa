use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::generator::field::{ParamValue, Params};
use crate::introspection::ColumnDescription;

/// Model field class used when a type code cannot be resolved.
pub const FALLBACK_FIELD_TYPE: &str = "TextField";

static SIZED_CHAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:var)?char\s*\(\s*(\d+)\s*\)\s*$").expect("valid sized char pattern")
});

/// A resolved model field class plus any parameters implied by the raw type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldType {
    /// Field class name, e.g. `CharField`.
    pub name: String,
    /// Parameters the type code itself implies (e.g. a parsed `max_length`).
    pub params: Params,
}

impl FieldType {
    /// A field class with no implied parameters.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Params::new(),
        }
    }

    /// Add an implied parameter.
    pub fn with_param(mut self, key: impl Into<String>, value: ParamValue) -> Self {
        self.params.insert(key.into(), value);
        self
    }
}

/// Maps a backend's raw column type codes onto model field classes.
pub trait TypeResolver {
    /// Resolve `type_code`; `None` means the code is unknown to this backend.
    fn resolve(&self, type_code: &str, column: &ColumnDescription) -> Option<FieldType>;

    /// Factor the reported `CharField` display size is divided by to get characters.
    fn display_size_divisor(&self) -> u32 {
        1
    }
}

impl<T: TypeResolver + ?Sized> TypeResolver for Box<T> {
    fn resolve(&self, type_code: &str, column: &ColumnDescription) -> Option<FieldType> {
        (**self).resolve(type_code, column)
    }

    fn display_size_divisor(&self) -> u32 {
        (**self).display_size_divisor()
    }
}

/// Database engines whose driver type codes are understood.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    /// `PostgreSQL`: codes are type OIDs.
    #[serde(alias = "postgres")]
    Postgresql,
    /// `MySQL`: codes are `FIELD_TYPE` constants; sizes are reported in bytes.
    Mysql,
    /// `SQLite`: codes are the declared column types.
    Sqlite,
}

impl TypeResolver for Engine {
    fn resolve(&self, type_code: &str, column: &ColumnDescription) -> Option<FieldType> {
        match self {
            Engine::Postgresql => postgres_field_type(type_code.trim()).map(FieldType::named),
            Engine::Mysql => mysql_field_type(type_code.trim()).map(FieldType::named),
            Engine::Sqlite => DeclaredTypes.resolve(type_code, column),
        }
    }

    fn display_size_divisor(&self) -> u32 {
        match self {
            // utf8 columns report three bytes per character
            Engine::Mysql => 3,
            Engine::Postgresql | Engine::Sqlite => 1,
        }
    }
}

fn postgres_field_type(oid: &str) -> Option<&'static str> {
    Some(match oid {
        "16" => "BooleanField",
        "20" => "BigIntegerField",
        "21" => "SmallIntegerField",
        "23" => "IntegerField",
        "25" => "TextField",
        "700" | "701" => "FloatField",
        "869" => "IPAddressField",
        "1042" | "1043" => "CharField",
        "1082" => "DateField",
        "1083" | "1266" => "TimeField",
        "1114" | "1184" => "DateTimeField",
        "1700" => "DecimalField",
        _ => return None,
    })
}

fn mysql_field_type(code: &str) -> Option<&'static str> {
    Some(match code {
        "0" | "246" => "DecimalField",
        "1" | "2" | "3" | "9" => "IntegerField",
        "4" | "5" => "FloatField",
        "7" | "12" => "DateTimeField",
        "8" => "BigIntegerField",
        "10" => "DateField",
        "11" => "TimeField",
        "249" | "250" | "251" | "252" => "TextField",
        "253" | "254" => "CharField",
        _ => return None,
    })
}

/// Resolves declared SQL type names (`varchar`, `integer`, `timestamp`, ...).
///
/// Used for `SQLite`, which reports declared types, and for catalogs built from DDL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeclaredTypes;

impl TypeResolver for DeclaredTypes {
    fn resolve(&self, type_code: &str, _column: &ColumnDescription) -> Option<FieldType> {
        let key = type_code
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();

        if let Some(name) = declared_field_type(&key) {
            return Some(FieldType::named(name));
        }

        let captures = SIZED_CHAR.captures(&key)?;
        let max_length = captures[1].parse::<i64>().ok()?;
        Some(FieldType::named("CharField").with_param("max_length", ParamValue::Int(max_length)))
    }
}

fn declared_field_type(name: &str) -> Option<&'static str> {
    Some(match name {
        "bool" | "boolean" => "BooleanField",
        "smallint" | "int2" | "tinyint" => "SmallIntegerField",
        "integer" | "int" | "int4" | "mediumint" => "IntegerField",
        "bigint" | "int8" => "BigIntegerField",
        "integer unsigned" | "int unsigned" => "PositiveIntegerField",
        "smallint unsigned" => "PositiveSmallIntegerField",
        "decimal" | "numeric" => "DecimalField",
        "real" | "float" | "float4" | "float8" | "double" | "double precision" => "FloatField",
        "text" | "tinytext" | "mediumtext" | "longtext" | "clob" => "TextField",
        "char" | "character" | "bpchar" | "nchar" | "varchar" | "character varying"
        | "nvarchar" => "CharField",
        "date" => "DateField",
        "datetime" | "timestamp" | "timestamptz" | "timestamp with time zone"
        | "timestamp without time zone" => "DateTimeField",
        "time" | "timetz" | "time with time zone" | "time without time zone" => "TimeField",
        "serial" | "serial4" => "AutoField",
        "bigserial" | "serial8" => "BigAutoField",
        "uuid" => "UUIDField",
        "ip" | "inet" => "GenericIPAddressField",
        "blob" | "bytea" | "binary" | "varbinary" => "BinaryField",
        "json" | "jsonb" => "JSONField",
        _ => return None,
    })
}
