use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("malformed geometry at offset {offset}: {reason}")]
    MalformedGeometry { offset: usize, reason: String },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("invalid data: {0}")]
    InvalidData(String),
}

impl CoreError {
    pub(crate) fn malformed(offset: usize, reason: impl Into<String>) -> Self {
        Self::MalformedGeometry {
            offset,
            reason: reason.into(),
        }
    }
}
