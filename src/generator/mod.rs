/// Field and class declarations and their Python rendering.
pub mod field;
/// Per-table mapping from catalog metadata to model classes.
pub mod inspector;
/// Raw type code to model field class resolvers.
pub mod type_map;
