use std::path::PathBuf;

use thiserror::Error;

use crate::introspection::IntrospectionError;

/// Errors that stop model generation for the whole run.
#[derive(Debug, Error)]
pub enum InspectError {
    /// The backend cannot describe tables at all.
    #[error("Database inspection isn't supported for the currently selected database backend.")]
    NotSupported,
    /// Any other introspection failure.
    #[error(transparent)]
    Introspection(IntrospectionError),
    /// The catalog snapshot is not valid JSON for the expected shape.
    #[error("invalid catalog snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),
    /// The DDL input could not be parsed.
    #[error("SQL parse error: {0}")]
    Sql(#[from] sqlparser::parser::ParserError),
    /// Reading input or writing output failed.
    #[error("{}: {source}", path.display())]
    Io {
        /// File being read or written.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl From<IntrospectionError> for InspectError {
    fn from(err: IntrospectionError) -> Self {
        match err {
            IntrospectionError::NotSupported { .. } => InspectError::NotSupported,
            other => InspectError::Introspection(other),
        }
    }
}

impl InspectError {
    /// Wrap an IO error with the path it concerns.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        InspectError::Io {
            path: path.into(),
            source,
        }
    }
}
