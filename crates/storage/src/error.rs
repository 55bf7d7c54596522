use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("i/o failure on `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed delimited table `{}`: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("destination already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    #[error("table not found: {0}")]
    TableNotFound(String),

    #[error("column `{column}` not found in {source_name}")]
    MissingColumn { source_name: String, column: String },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("core error: {0}")]
    Core(#[from] geofill_core::CoreError),
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Missing table or column: the inputs do not have the required shape.
    pub fn is_schema_error(&self) -> bool {
        matches!(self, Self::TableNotFound(_) | Self::MissingColumn { .. })
    }
}
