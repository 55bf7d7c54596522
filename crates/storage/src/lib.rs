pub mod error;
pub mod external;
pub mod sqlite;
pub mod traits;

pub use error::StorageError;
pub use external::{DuplicateKey, ExternalTable, ExternalTableOptions, KeyColumn};
pub use sqlite::{SqliteContainer, SqliteContainerWriter};
pub use traits::*;
