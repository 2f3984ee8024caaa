use std::collections::BTreeMap;

use serde::de;
use serde::{Deserialize, Deserializer, Serialize};

use crate::generator::type_map::{DeclaredTypes, Engine, TypeResolver};
use crate::introspection::{
    ColumnDescription, Introspection, IntrospectionError, KeyMap, Relation, RelationMap,
};

/// In-memory catalog, loaded from a JSON snapshot or built from parsed DDL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// Engine whose raw type codes the columns carry; `None` means declared type names.
    #[serde(default)]
    pub engine: Option<Engine>,
    /// Tables in emission order.
    #[serde(default)]
    pub tables: Vec<CatalogTable>,
}

/// One table of a [`Catalog`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogTable {
    /// Table name as stored in the database.
    pub name: String,
    /// Columns in table order.
    #[serde(default)]
    pub columns: Vec<ColumnDescription>,
    /// Foreign keys by column position; absent when the source could not report them.
    ///
    /// Snapshots list them as `[{"column", "target_column", "target_table"}]`; an
    /// object keyed by column position is accepted too.
    #[serde(default, deserialize_with = "relations_from_json")]
    pub relations: Option<RelationMap>,
    /// Key flags by column name; absent when the source could not report them.
    #[serde(default)]
    pub indexes: Option<KeyMap>,
}

impl Catalog {
    /// Load a catalog from a JSON snapshot.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Look up a table by its exact catalog name.
    pub fn table(&self, name: &str) -> Option<&CatalogTable> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Resolver matching the type codes stored in this catalog.
    pub fn type_resolver(&self) -> Box<dyn TypeResolver> {
        match self.engine {
            Some(engine) => Box::new(engine),
            None => Box::new(DeclaredTypes),
        }
    }

    fn lookup(&self, name: &str) -> Result<&CatalogTable, IntrospectionError> {
        self.table(name)
            .ok_or_else(|| IntrospectionError::UnknownTable(name.to_string()))
    }
}

impl Introspection for Catalog {
    fn list_tables(&self) -> Vec<String> {
        self.tables.iter().map(|t| t.name.clone()).collect()
    }

    fn table_description(
        &self,
        table: &str,
    ) -> Result<Vec<ColumnDescription>, IntrospectionError> {
        Ok(self.lookup(table)?.columns.clone())
    }

    fn relations(&self, table: &str) -> Result<RelationMap, IntrospectionError> {
        self.lookup(table)?
            .relations
            .clone()
            .ok_or_else(|| IntrospectionError::not_supported("relations"))
    }

    fn indexes(&self, table: &str) -> Result<KeyMap, IntrospectionError> {
        self.lookup(table)?
            .indexes
            .clone()
            .ok_or_else(|| IntrospectionError::not_supported("indexes"))
    }
}

/// Accept a type code written either as a JSON string or as an integer.
pub(crate) fn type_code_from_json<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawTypeCode {
        Number(i64),
        Name(String),
    }

    Ok(match RawTypeCode::deserialize(deserializer)? {
        RawTypeCode::Number(code) => code.to_string(),
        RawTypeCode::Name(name) => name,
    })
}

fn relations_from_json<'de, D>(deserializer: D) -> Result<Option<RelationMap>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct RelationEntry {
        column: usize,
        target_column: usize,
        target_table: String,
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawRelations {
        Entries(Vec<RelationEntry>),
        Positions(BTreeMap<String, Relation>),
    }

    let Some(raw) = Option::<RawRelations>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let relations = match raw {
        RawRelations::Entries(entries) => entries
            .into_iter()
            .map(|entry| {
                let relation = Relation {
                    target_column: entry.target_column,
                    target_table: entry.target_table,
                };
                (entry.column, relation)
            })
            .collect(),
        RawRelations::Positions(positions) => positions
            .into_iter()
            .map(|(position, relation)| {
                position
                    .trim()
                    .parse::<usize>()
                    .map(|position| (position, relation))
                    .map_err(|_| {
                        de::Error::custom(format!("invalid relation column position '{position}'"))
                    })
            })
            .collect::<Result<RelationMap, D::Error>>()?,
    };
    Ok(Some(relations))
}
