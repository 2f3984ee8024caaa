/// Identifier normalization: class names and attribute names from catalog names.
pub mod names;
/// `CREATE TABLE` parsing into an in-memory catalog.
pub mod sql_parser;
