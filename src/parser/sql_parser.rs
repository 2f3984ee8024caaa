use std::collections::BTreeSet;
use std::fmt;

use sqlparser::ast::{ColumnDef, ColumnOption, CreateTable, Statement, TableConstraint};
use sqlparser::dialect::{Dialect, GenericDialect, MySqlDialect, PostgreSqlDialect, SQLiteDialect};
use sqlparser::keywords::Keyword;
use sqlparser::parser::{Parser, ParserError};
use sqlparser::tokenizer::Token;

use crate::introspection::snapshot::{Catalog, CatalogTable};
use crate::introspection::{ColumnDescription, IndexInfo, KeyMap, Relation, RelationMap};
use crate::parser::names::{relation_name, unquote_identifier};

/// SQL dialect used to parse DDL input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SqlDialect {
    /// `PostgreSQL` syntax.
    #[default]
    Postgresql,
    /// `MySQL` / `MariaDB` syntax.
    Mysql,
    /// `SQLite` syntax.
    Sqlite,
    /// Permissive ANSI-ish syntax.
    Generic,
}

impl SqlDialect {
    fn parser_dialect(self) -> Box<dyn Dialect> {
        match self {
            SqlDialect::Postgresql => Box::new(PostgreSqlDialect {}),
            SqlDialect::Mysql => Box::new(MySqlDialect {}),
            SqlDialect::Sqlite => Box::new(SQLiteDialect {}),
            SqlDialect::Generic => Box::new(GenericDialect {}),
        }
    }
}

impl fmt::Display for SqlDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlDialect::Postgresql => write!(f, "postgresql"),
            SqlDialect::Mysql => write!(f, "mysql"),
            SqlDialect::Sqlite => write!(f, "sqlite"),
            SqlDialect::Generic => write!(f, "generic"),
        }
    }
}

impl std::str::FromStr for SqlDialect {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgresql" | "postgres" | "pg" => Ok(SqlDialect::Postgresql),
            "mysql" | "mariadb" => Ok(SqlDialect::Mysql),
            "sqlite" | "sqlite3" => Ok(SqlDialect::Sqlite),
            "generic" => Ok(SqlDialect::Generic),
            _ => Err(format!("Invalid SQL dialect: {s}")),
        }
    }
}

/// Parse `CREATE TABLE` statements into a catalog; other statements are ignored.
pub fn parse_schema(sql: &str, dialect: SqlDialect) -> Result<Catalog, ParserError> {
    let statements = Parser::parse_sql(dialect.parser_dialect().as_ref(), sql)?;

    let mut tables = Vec::new();
    let mut pending_relations = Vec::new();
    for statement in &statements {
        let Statement::CreateTable(create) = statement else {
            continue;
        };
        let (table, foreign_keys) = table_from_create(create, dialect);
        log::debug!(
            "parsed table '{}' with {} columns",
            table.name,
            table.columns.len()
        );
        pending_relations.push(foreign_keys);
        tables.push(table);
    }

    // Targets are resolved once every table is known, so forward references work.
    let positions: Vec<Vec<usize>> = pending_relations
        .iter()
        .map(|foreign_keys| {
            foreign_keys
                .iter()
                .map(|fk| target_column_position(&tables, fk))
                .collect()
        })
        .collect();
    for ((table, foreign_keys), targets) in tables.iter_mut().zip(pending_relations).zip(positions)
    {
        let relations: RelationMap = foreign_keys
            .into_iter()
            .zip(targets)
            .map(|(fk, target_column)| {
                (
                    fk.position,
                    Relation {
                        target_column,
                        target_table: fk.target_table,
                    },
                )
            })
            .collect();
        table.relations = Some(relations);
    }

    Ok(Catalog {
        engine: None,
        tables,
    })
}

#[derive(Debug)]
struct ForeignKey {
    position: usize,
    target_table: String,
    target_column: Option<String>,
}

fn table_from_create(create: &CreateTable, dialect: SqlDialect) -> (CatalogTable, Vec<ForeignKey>) {
    let name = relation_name(&create.name.to_string());
    let column_names: Vec<&str> = create.columns.iter().map(|c| c.name.value.as_str()).collect();
    let position_of = |column: &str| column_names.iter().position(|name| *name == column);

    // Only single-column keys are flagged; members of a composite key are merely NOT NULL.
    let mut primary: BTreeSet<usize> = BTreeSet::new();
    let mut key_members: BTreeSet<usize> = BTreeSet::new();
    let mut unique: BTreeSet<usize> = BTreeSet::new();
    let mut not_null: BTreeSet<usize> = BTreeSet::new();
    let mut foreign_keys: Vec<ForeignKey> = Vec::new();

    for (position, column) in create.columns.iter().enumerate() {
        for option in &column.options {
            match &option.option {
                ColumnOption::NotNull => {
                    not_null.insert(position);
                }
                ColumnOption::Unique { is_primary, .. } => {
                    if *is_primary {
                        primary.insert(position);
                    } else {
                        unique.insert(position);
                    }
                }
                ColumnOption::ForeignKey {
                    foreign_table,
                    referred_columns,
                    ..
                } => foreign_keys.push(ForeignKey {
                    position,
                    target_table: relation_name(&foreign_table.to_string()),
                    target_column: referred_columns.first().map(|c| plain_name(c)),
                }),
                _ => {}
            }
        }
    }

    for constraint in &create.constraints {
        match constraint {
            TableConstraint::PrimaryKey { columns, .. } => {
                let positions: Vec<usize> = columns
                    .iter()
                    .filter_map(|c| position_of(&plain_name(c)))
                    .collect();
                if let [position] = positions.as_slice() {
                    primary.insert(*position);
                }
                key_members.extend(positions);
            }
            TableConstraint::Unique { columns, .. } if columns.len() == 1 => {
                unique.extend(columns.iter().filter_map(|c| position_of(&plain_name(c))));
            }
            TableConstraint::ForeignKey {
                columns,
                foreign_table,
                referred_columns,
                ..
            } if columns.len() == 1 => {
                if let Some(position) = position_of(&plain_name(&columns[0])) {
                    foreign_keys.push(ForeignKey {
                        position,
                        target_table: relation_name(&foreign_table.to_string()),
                        target_column: referred_columns.first().map(|c| plain_name(c)),
                    });
                }
            }
            _ => {}
        }
    }

    let columns = create
        .columns
        .iter()
        .enumerate()
        .map(|(position, column)| {
            let is_primary = primary.contains(&position);
            let required = is_primary
                || key_members.contains(&position)
                || not_null.contains(&position);
            describe_column(column, is_primary, !required, dialect)
        })
        .collect();

    let mut indexes = KeyMap::new();
    for (position, column_name) in column_names.iter().enumerate() {
        let info = IndexInfo {
            primary_key: primary.contains(&position),
            unique: primary.contains(&position) || unique.contains(&position),
        };
        if info.primary_key || info.unique {
            indexes.insert((*column_name).to_string(), info);
        }
    }

    let table = CatalogTable {
        name,
        columns,
        relations: None,
        indexes: Some(indexes),
    };
    (table, foreign_keys)
}

fn describe_column(
    column: &ColumnDef,
    is_primary: bool,
    null_ok: bool,
    dialect: SqlDialect,
) -> ColumnDescription {
    let (base, args) = split_declared_type(&column.data_type.to_string());

    let rowid_alias = dialect == SqlDialect::Sqlite && is_primary && base == "integer";
    let type_code = if rowid_alias || has_auto_increment(column) {
        match base.as_str() {
            "bigint" | "int8" => "bigserial".to_string(),
            _ => "serial".to_string(),
        }
    } else {
        base
    };

    ColumnDescription {
        name: column.name.value.clone(),
        type_code,
        display_size: args.first().copied(),
        precision: args.first().copied(),
        scale: args.get(1).copied(),
        null_ok,
    }
}

/// `AUTO_INCREMENT` (MySQL), `AUTOINCREMENT` (SQLite), `GENERATED ... AS IDENTITY`
/// (PostgreSQL) and `IDENTITY(seed, step)` (SQL Server).
fn has_auto_increment(column: &ColumnDef) -> bool {
    column.options.iter().any(|option| match &option.option {
        ColumnOption::DialectSpecific(tokens) => tokens.iter().any(|token| {
            matches!(
                token,
                Token::Word(word)
                    if matches!(word.keyword, Keyword::AUTO_INCREMENT | Keyword::AUTOINCREMENT)
            )
        }),
        ColumnOption::Generated {
            generation_expr: None,
            sequence_options: Some(_),
            ..
        } => true,
        ColumnOption::Identity(_) => true,
        _ => false,
    })
}

/// Split a rendered SQL type such as `INT(11) UNSIGNED` into `("int unsigned", [11])`.
fn split_declared_type(declared: &str) -> (String, Vec<u32>) {
    let (base, args) = match declared.find('(') {
        Some(open) => {
            let close = declared[open..]
                .find(')')
                .map_or(declared.len(), |offset| open + offset);
            let args = declared[open + 1..close]
                .split(',')
                .filter_map(|arg| arg.trim().parse::<u32>().ok())
                .collect();
            let suffix = declared.get(close + 1..).unwrap_or("");
            (format!("{} {suffix}", &declared[..open]), args)
        }
        None => (declared.to_string(), Vec::new()),
    };

    let base = base.split_whitespace().collect::<Vec<_>>().join(" ");
    (base.to_lowercase(), args)
}

fn plain_name(ident: &impl ToString) -> String {
    unquote_identifier(&ident.to_string()).to_string()
}

fn target_column_position(tables: &[CatalogTable], fk: &ForeignKey) -> usize {
    let Some(target) = tables.iter().find(|t| t.name == fk.target_table) else {
        return 0;
    };
    let by_name = fk
        .target_column
        .as_deref()
        .and_then(|name| target.columns.iter().position(|c| c.name == name));
    let by_primary_key = || {
        target.indexes.as_ref().and_then(|indexes| {
            target
                .columns
                .iter()
                .position(|c| indexes.get(&c.name).is_some_and(|info| info.primary_key))
        })
    };
    by_name.or_else(by_primary_key).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::introspection::Introspection;
    use std::str::FromStr;

    #[test]
    fn split_declared_type_separates_arguments_and_suffixes() {
        assert_eq!(
            split_declared_type("VARCHAR(100)"),
            ("varchar".to_string(), vec![100])
        );
        assert_eq!(
            split_declared_type("NUMERIC(10,2)"),
            ("numeric".to_string(), vec![10, 2])
        );
        assert_eq!(
            split_declared_type("INT(11) UNSIGNED"),
            ("int unsigned".to_string(), vec![11])
        );
        assert_eq!(
            split_declared_type("TIMESTAMP WITH TIME ZONE"),
            ("timestamp with time zone".to_string(), vec![])
        );
        assert_eq!(
            split_declared_type("ENUM('a', 'b')"),
            ("enum".to_string(), vec![])
        );
    }

    #[test]
    fn dialect_names_parse_case_insensitively() {
        assert_eq!(SqlDialect::from_str("Postgres"), Ok(SqlDialect::Postgresql));
        assert_eq!(SqlDialect::from_str("SQLITE3"), Ok(SqlDialect::Sqlite));
        assert_eq!(SqlDialect::Mysql.to_string(), "mysql");
        let err = SqlDialect::from_str("oracle").expect_err("unknown dialect should fail");
        assert!(err.contains("Invalid SQL dialect: oracle"));
    }

    #[test]
    fn parse_schema_reads_keys_and_nullability() {
        let sql = r#"
            CREATE TABLE customer (
                id SERIAL PRIMARY KEY,
                email VARCHAR(254) NOT NULL UNIQUE,
                nickname VARCHAR(40)
            );
            CREATE TABLE "public"."orders" (
                id SERIAL PRIMARY KEY,
                customer_id INTEGER NOT NULL REFERENCES customer (id),
                total NUMERIC(10, 2)
            );
        "#;
        let catalog = parse_schema(sql, SqlDialect::Postgresql).expect("DDL should parse");
        assert_eq!(catalog.tables.len(), 2);

        let customer = catalog.table("customer").expect("customer table");
        assert_eq!(customer.columns[0].type_code, "serial");
        assert!(!customer.columns[0].null_ok);
        assert_eq!(customer.columns[1].display_size, Some(254));
        assert!(!customer.columns[1].null_ok);
        assert!(customer.columns[2].null_ok);

        let indexes = catalog.indexes("customer").expect("indexes recorded");
        assert!(indexes["id"].primary_key);
        assert!(indexes["email"].unique);
        assert!(!indexes.contains_key("nickname"));

        let orders = catalog.table("orders").expect("schema prefix is dropped");
        let relations = orders.relations.as_ref().expect("relations recorded");
        assert_eq!(
            relations.get(&1),
            Some(&Relation {
                target_column: 0,
                target_table: "customer".to_string(),
            })
        );
        assert_eq!(orders.columns[2].precision, Some(10));
        assert_eq!(orders.columns[2].scale, Some(2));
    }

    #[test]
    fn table_constraints_mark_keys_and_forward_references() {
        let sql = r#"
            CREATE TABLE membership (
                member INTEGER NOT NULL,
                team_code VARCHAR(8),
                PRIMARY KEY (member),
                UNIQUE (team_code),
                FOREIGN KEY (team_code) REFERENCES team (code)
            );
            CREATE TABLE team (
                label TEXT,
                code VARCHAR(8) PRIMARY KEY
            );
        "#;
        let catalog = parse_schema(sql, SqlDialect::Generic).expect("DDL should parse");
        let membership = catalog.table("membership").expect("membership table");
        let relations = membership.relations.as_ref().expect("relations recorded");
        assert_eq!(
            relations.get(&1),
            Some(&Relation {
                target_column: 1,
                target_table: "team".to_string(),
            })
        );

        let indexes = catalog.indexes("membership").expect("indexes recorded");
        assert!(indexes["member"].primary_key);
        assert!(indexes["team_code"].unique);
        assert!(!indexes["team_code"].primary_key);
    }

    #[test]
    fn auto_increment_markers_become_serial_codes() {
        let mysql = parse_schema(
            "CREATE TABLE t (id BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY, n INT);",
            SqlDialect::Mysql,
        )
        .expect("MySQL DDL should parse");
        assert_eq!(mysql.tables[0].columns[0].type_code, "bigserial");
        assert_eq!(mysql.tables[0].columns[1].type_code, "int");

        let sqlite = parse_schema(
            "CREATE TABLE t (id INTEGER PRIMARY KEY, n INTEGER);",
            SqlDialect::Sqlite,
        )
        .expect("SQLite DDL should parse");
        assert_eq!(sqlite.tables[0].columns[0].type_code, "serial");
        assert_eq!(sqlite.tables[0].columns[1].type_code, "integer");
    }

    #[test]
    fn identity_columns_become_serial_codes() {
        let catalog = parse_schema(
            "CREATE TABLE t (
                id BIGINT GENERATED ALWAYS AS IDENTITY PRIMARY KEY,
                seq INTEGER GENERATED BY DEFAULT AS IDENTITY,
                total INTEGER GENERATED ALWAYS AS (1 + 1) STORED
            );",
            SqlDialect::Postgresql,
        )
        .expect("identity DDL should parse");
        let columns = &catalog.tables[0].columns;
        assert_eq!(columns[0].type_code, "bigserial");
        assert_eq!(columns[1].type_code, "serial");
        assert_eq!(columns[2].type_code, "integer");
    }

    #[test]
    fn marker_words_inside_other_options_are_not_auto_increment() {
        let catalog = parse_schema(
            "CREATE TABLE acct (
                kind TEXT NOT NULL CHECK (kind IN ('identity', 'group')),
                note TEXT DEFAULT 'AUTO_INCREMENT',
                n INTEGER CHECK (n <> 0)
            );",
            SqlDialect::Postgresql,
        )
        .expect("DDL should parse");
        let columns = &catalog.tables[0].columns;
        assert_eq!(columns[0].type_code, "text");
        assert_eq!(columns[1].type_code, "text");
        assert_eq!(columns[2].type_code, "integer");
    }

    #[test]
    fn composite_primary_keys_flag_no_column() {
        let catalog = parse_schema(
            "CREATE TABLE m (a INTEGER, b INTEGER, c TEXT, PRIMARY KEY (a, b));",
            SqlDialect::Sqlite,
        )
        .expect("DDL should parse");
        let columns = &catalog.tables[0].columns;
        assert_eq!(columns[0].type_code, "integer");
        assert_eq!(columns[1].type_code, "integer");
        assert!(!columns[0].null_ok, "key members are implicitly NOT NULL");
        assert!(!columns[1].null_ok);
        assert!(columns[2].null_ok);

        let indexes = catalog.indexes("m").expect("indexes recorded");
        assert!(indexes.is_empty(), "unexpected key flags: {indexes:?}");
    }

    #[test]
    fn single_column_table_primary_key_is_a_rowid_alias() {
        let catalog = parse_schema(
            "CREATE TABLE m (a INTEGER, label TEXT, PRIMARY KEY (a));",
            SqlDialect::Sqlite,
        )
        .expect("DDL should parse");
        assert_eq!(catalog.tables[0].columns[0].type_code, "serial");
        let indexes = catalog.indexes("m").expect("indexes recorded");
        assert!(indexes["a"].primary_key);
    }

    #[test]
    fn foreign_keys_to_tables_outside_the_input_are_kept() {
        let catalog = parse_schema(
            "CREATE TABLE user_groups (group_id INTEGER REFERENCES groups (id));",
            SqlDialect::Postgresql,
        )
        .expect("DDL should parse");
        let relations = catalog
            .relations("user_groups")
            .expect("relations recorded");
        assert_eq!(
            relations.get(&0),
            Some(&Relation {
                target_column: 0,
                target_table: "groups".to_string(),
            })
        );
    }

    #[test]
    fn non_table_statements_are_ignored() {
        let catalog = parse_schema(
            "CREATE INDEX idx ON t (a); CREATE TABLE t (a TEXT);",
            SqlDialect::Postgresql,
        )
        .expect("DDL should parse");
        assert_eq!(catalog.tables.len(), 1);
    }

    #[test]
    fn invalid_sql_is_an_error() {
        assert!(parse_schema("CREATE TABLE (", SqlDialect::Postgresql).is_err());
    }
}
