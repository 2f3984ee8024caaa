/// Writes the generated module to a file or stdout.
pub mod formatter;
