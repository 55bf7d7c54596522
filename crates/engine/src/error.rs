use std::path::PathBuf;

use geofill_core::CoreError;
use geofill_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("core error: {0}")]
    Core(#[from] CoreError),

    #[error("join field `{field}` not found in table {table}")]
    JoinFieldNotFound { table: String, field: String },

    #[error("table {table} already has a column named `{column}`")]
    GeometryColumnExists { table: String, column: String },

    #[error("source and destination are the same file: {}", .0.display())]
    SamePath(PathBuf),
}

impl EngineError {
    /// Required table, column or field is absent.
    pub fn is_schema_error(&self) -> bool {
        match self {
            Self::Storage(e) => e.is_schema_error(),
            Self::JoinFieldNotFound { .. } | Self::GeometryColumnExists { .. } => true,
            _ => false,
        }
    }
}
