#![allow(dead_code)]

use std::path::PathBuf;

use db2model::generator::inspector::{InspectOptions, ModelInspector};
use db2model::introspection::snapshot::Catalog;
use db2model::parser::sql_parser::{self, SqlDialect};

pub(crate) fn fixture_dir(fixture: &str) -> PathBuf {
    PathBuf::from("tests/fixtures").join(fixture)
}

pub(crate) fn read_fixture(fixture: &str, file: &str) -> String {
    std::fs::read_to_string(fixture_dir(fixture).join(file)).expect("fixture should be readable")
}

pub(crate) fn parse_fixture_sql(fixture: &str, dialect: SqlDialect) -> Catalog {
    sql_parser::parse_schema(&read_fixture(fixture, "input.sql"), dialect)
        .expect("fixture SQL should parse")
}

pub(crate) fn load_fixture_snapshot(fixture: &str) -> Catalog {
    Catalog::from_json(&read_fixture(fixture, "catalog.json")).expect("fixture snapshot should parse")
}

pub(crate) fn render_catalog(catalog: &Catalog, options: InspectOptions) -> String {
    ModelInspector::new(catalog, catalog.type_resolver(), options)
        .render()
        .expect("catalog should render")
}
