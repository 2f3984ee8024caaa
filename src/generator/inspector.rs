use std::collections::VecDeque;

use crate::error::InspectError;
use crate::generator::field::{
    ClassDeclaration, FieldDeclaration, FieldKind, ParamValue, RelationTarget,
};
use crate::generator::type_map::{FieldType, TypeResolver, FALLBACK_FIELD_TYPE};
use crate::introspection::{
    ColumnDescription, Introspection, IntrospectionError, KeyMap, RelationMap,
};
use crate::parser::names::{is_keyword, to_attname, to_model};

/// Comment attached to fields whose type code could not be resolved.
pub const GUESS_NOTE: &str = "This field type is a guess.";

/// Knobs for model generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectOptions {
    /// Always emit `db_column`, even when it matches the attribute name.
    pub force_db_column: bool,
    /// Module the header imports `models` from.
    pub db_module: String,
}

impl Default for InspectOptions {
    fn default() -> Self {
        Self {
            force_db_column: false,
            db_module: "django.db".to_string(),
        }
    }
}

/// Turns catalog metadata into model class declarations.
#[derive(Debug)]
pub struct ModelInspector<I, R> {
    introspection: I,
    resolver: R,
    options: InspectOptions,
}

impl<I: Introspection, R: TypeResolver> ModelInspector<I, R> {
    /// Create an inspector over a catalog and the resolver for its type codes.
    pub fn new(introspection: I, resolver: R, options: InspectOptions) -> Self {
        Self {
            introspection,
            resolver,
            options,
        }
    }

    /// The import line every generated module starts with.
    pub fn header(&self) -> String {
        format!("from {} import models", self.options.db_module)
    }

    /// Lazily produce the module, one table at a time.
    ///
    /// After the first error the iterator is exhausted.
    pub fn lines(&self) -> ModelLines<'_, I, R> {
        ModelLines {
            inspector: self,
            tables: self.introspection.list_tables().into_iter(),
            pending: VecDeque::from([self.header()]),
            failed: false,
        }
    }

    /// Produce the whole module, or nothing if any table fails.
    pub fn render(&self) -> Result<String, InspectError> {
        let mut module = String::new();
        for line in self.lines() {
            module.push_str(&line?);
            module.push('\n');
        }
        Ok(module)
    }

    /// Build the class declaration for one table.
    pub fn inspect_table(&self, table: &str) -> Result<ClassDeclaration, InspectError> {
        let relations = degrade_unsupported(self.introspection.relations(table), table)?;
        let indexes = degrade_unsupported(self.introspection.indexes(table), table)?;
        let columns = self.introspection.table_description(table)?;

        let fields: Vec<FieldDeclaration> = columns
            .iter()
            .enumerate()
            .filter_map(|(position, column)| {
                self.field_for_column(table, position, column, &relations, &indexes)
            })
            .collect();

        log::debug!(
            "table '{table}': {} columns, {} fields emitted",
            columns.len(),
            fields.len()
        );

        Ok(ClassDeclaration {
            class_name: to_model(table),
            table_name: table.to_string(),
            fields,
        })
    }

    /// Build the declaration for the column at `position`, or `None` when the
    /// field would be the implicit `id` primary key.
    pub fn field_for_column(
        &self,
        table: &str,
        position: usize,
        column: &ColumnDescription,
        relations: &RelationMap,
        indexes: &KeyMap,
    ) -> Option<FieldDeclaration> {
        let column_name = column.name.as_str();
        let mut attname = to_attname(column_name);
        let mut field = FieldDeclaration::new(String::new(), FieldKind::Plain(String::new()));

        if column_name != attname || self.options.force_db_column {
            field.set_param("db_column", column_name);
        }

        if let Some(relation) = relations.get(&position) {
            let target = if relation.target_table == table {
                RelationTarget::SelfReference
            } else {
                RelationTarget::Model(to_model(&relation.target_table))
            };
            match attname.strip_suffix("_id").map(str::to_string) {
                Some(stripped) if !is_keyword(&stripped) => attname = stripped,
                Some(stripped) => {
                    attname = to_attname(&stripped);
                    field.set_param("db_column", column_name);
                }
                None => field.set_param("db_column", column_name),
            }
            field.kind = FieldKind::ForeignKey(target);
        } else {
            let (field_type, notes) = self.infer_field_type(table, column);
            field.params.extend(field_type.params);
            field.notes.extend(notes);

            if let Some(info) = indexes.get(column_name) {
                if info.primary_key {
                    field.set_param("primary_key", true);
                } else if info.unique {
                    field.set_param("unique", true);
                }
            }
            field.kind = FieldKind::Plain(field_type.name);
        }
        field.attname = attname;

        if field.is_implicit_primary_key() {
            return None;
        }

        if column.null_ok {
            field.set_param("blank", true);
            if !field.kind.is_text() {
                field.set_param("null", true);
            }
        }

        Some(field)
    }

    /// Resolve the field class and implied parameters for a plain column.
    ///
    /// Unknown type codes fall back to `TextField` with a guess note.
    pub fn infer_field_type(
        &self,
        table: &str,
        column: &ColumnDescription,
    ) -> (FieldType, Vec<String>) {
        let mut notes = Vec::new();
        let mut field_type = match self.resolver.resolve(&column.type_code, column) {
            Some(field_type) => field_type,
            None => {
                log::warn!(
                    "{table}.{}: unknown type code '{}', using {FALLBACK_FIELD_TYPE}",
                    column.name,
                    column.type_code
                );
                notes.push(GUESS_NOTE.to_string());
                FieldType::named(FALLBACK_FIELD_TYPE)
            }
        };

        match field_type.name.as_str() {
            "CharField" => {
                if let Some(size) = column.display_size.filter(|size| *size > 0) {
                    let divisor = self.resolver.display_size_divisor().max(1);
                    field_type
                        .params
                        .insert("max_length".to_string(), ParamValue::from(size / divisor));
                }
            }
            "DecimalField" => {
                field_type
                    .params
                    .insert("max_digits".to_string(), ParamValue::from(column.precision));
                field_type
                    .params
                    .insert("decimal_places".to_string(), ParamValue::from(column.scale));
            }
            _ => {}
        }

        (field_type, notes)
    }
}

fn degrade_unsupported<T: Default>(
    result: Result<T, IntrospectionError>,
    table: &str,
) -> Result<T, InspectError> {
    match result {
        Ok(value) => Ok(value),
        Err(IntrospectionError::NotSupported { capability }) => {
            log::debug!("table '{table}': {capability} introspection unavailable, assuming none");
            Ok(T::default())
        }
        Err(other) => Err(InspectError::Introspection(other)),
    }
}

/// Line iterator returned by [`ModelInspector::lines`].
#[derive(Debug)]
pub struct ModelLines<'a, I, R> {
    inspector: &'a ModelInspector<I, R>,
    tables: std::vec::IntoIter<String>,
    pending: VecDeque<String>,
    failed: bool,
}

impl<I: Introspection, R: TypeResolver> Iterator for ModelLines<'_, I, R> {
    type Item = Result<String, InspectError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(line) = self.pending.pop_front() {
                return Some(Ok(line));
            }
            if self.failed {
                return None;
            }
            let table = self.tables.next()?;
            match self.inspector.inspect_table(&table) {
                Ok(class) => self.pending.extend(class.lines()),
                Err(err) => {
                    self.failed = true;
                    return Some(Err(err));
                }
            }
        }
    }
}
