use std::path::PathBuf;

use geofill_core::KeyNormalization;
use geofill_storage::{ExternalTableOptions, KeyColumn};
use geofill_storage::external::DEFAULT_WKT_COLUMN;

pub const DEFAULT_TARGET_TABLE: &str = "municipalities";
pub const DEFAULT_GEOMETRY_COLUMN: &str = "Geometry";

/// Options for one injection run.
#[derive(Debug, Clone)]
pub struct InjectConfig {
    pub source_path: PathBuf,
    pub dest_path: PathBuf,
    pub external_table_path: PathBuf,
    pub target_table_name: String,
    /// Source field whose value is matched against the external key.
    pub join_key_field: String,
    pub external_key: KeyColumn,
    pub wkt_column: String,
    pub geometry_column: String,
    pub delimiter: u8,
    pub normalization: KeyNormalization,
    /// Replace an existing destination instead of failing.
    pub overwrite: bool,
}

impl InjectConfig {
    pub fn new(
        source_path: impl Into<PathBuf>,
        dest_path: impl Into<PathBuf>,
        external_table_path: impl Into<PathBuf>,
        join_key_field: impl Into<String>,
    ) -> Self {
        Self {
            source_path: source_path.into(),
            dest_path: dest_path.into(),
            external_table_path: external_table_path.into(),
            target_table_name: DEFAULT_TARGET_TABLE.to_string(),
            join_key_field: join_key_field.into(),
            external_key: KeyColumn::default(),
            wkt_column: DEFAULT_WKT_COLUMN.to_string(),
            geometry_column: DEFAULT_GEOMETRY_COLUMN.to_string(),
            delimiter: b',',
            normalization: KeyNormalization::default(),
            overwrite: false,
        }
    }

    pub fn external_options(&self) -> ExternalTableOptions {
        ExternalTableOptions {
            key_column: self.external_key.clone(),
            wkt_column: self.wkt_column.clone(),
            delimiter: self.delimiter,
            normalization: self.normalization,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_geocoding_conventions() {
        let config = InjectConfig::new("in.hyper", "out.hyper", "shapes.csv", "Name");
        assert_eq!(config.target_table_name, "municipalities");
        assert_eq!(config.geometry_column, "Geometry");
        assert!(!config.overwrite);

        let options = config.external_options();
        assert_eq!(options.key_column, KeyColumn::Name("NAME".into()));
        assert_eq!(options.wkt_column, "WKT");
        assert_eq!(options.normalization, KeyNormalization::default());
    }
}
