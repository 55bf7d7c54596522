//! Delimited text table of WKT shapes keyed by an identifier column.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use geofill_core::{ExternalGeoRow, JoinKey, KeyNormalization};

use crate::error::StorageError;

pub const DEFAULT_KEY_COLUMN: &str = "NAME";
pub const DEFAULT_WKT_COLUMN: &str = "WKT";

/// Which column of the external table carries the join key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyColumn {
    Name(String),
    /// 0-based column position.
    Index(usize),
}

impl Default for KeyColumn {
    fn default() -> Self {
        Self::Name(DEFAULT_KEY_COLUMN.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct ExternalTableOptions {
    pub key_column: KeyColumn,
    pub wkt_column: String,
    pub delimiter: u8,
    pub normalization: KeyNormalization,
}

impl Default for ExternalTableOptions {
    fn default() -> Self {
        Self {
            key_column: KeyColumn::default(),
            wkt_column: DEFAULT_WKT_COLUMN.to_string(),
            delimiter: b',',
            normalization: KeyNormalization::default(),
        }
    }
}

/// A later row whose key collided with an earlier one and was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateKey {
    pub key: JoinKey,
    pub kept_line: u64,
    pub dropped_line: u64,
}

#[derive(Debug, Clone, Default)]
pub struct ExternalTable {
    pub rows: BTreeMap<JoinKey, ExternalGeoRow>,
    pub duplicates: Vec<DuplicateKey>,
    pub blank_keys: u64,
    pub total_rows: u64,
}

impl ExternalTable {
    pub fn get(&self, key: &JoinKey) -> Option<&ExternalGeoRow> {
        self.rows.get(key)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Load the external table at `path`.
pub fn load(path: impl AsRef<Path>, options: &ExternalTableOptions) -> Result<ExternalTable, StorageError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| StorageError::io(path, e))?;
    load_from_reader(file, path, options)
}

/// Load an external table from any reader. `origin` names the source in errors.
pub fn load_from_reader<R: Read>(
    input: R,
    origin: impl AsRef<Path>,
    options: &ExternalTableOptions,
) -> Result<ExternalTable, StorageError> {
    let origin = origin.as_ref();
    let csv_err = |source: csv::Error| {
        if matches!(source.kind(), csv::ErrorKind::Io(_)) {
            StorageError::io(origin, std::io::Error::other(source.to_string()))
        } else {
            StorageError::Csv {
                path: origin.to_path_buf(),
                source,
            }
        }
    };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(input);

    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .enumerate()
        .map(|(i, h)| if i == 0 { h.trim_start_matches('\u{feff}') } else { h })
        .map(str::to_string)
        .collect();

    let missing = |column: String| StorageError::MissingColumn {
        source_name: origin.display().to_string(),
        column,
    };
    let wkt_idx = find_header(&headers, &options.wkt_column)
        .ok_or_else(|| missing(options.wkt_column.clone()))?;
    let key_idx = match &options.key_column {
        KeyColumn::Name(name) => find_header(&headers, name).ok_or_else(|| missing(name.clone()))?,
        KeyColumn::Index(idx) if *idx < headers.len() => *idx,
        KeyColumn::Index(idx) => return Err(missing(format!("#{idx}"))),
    };

    let mut table = ExternalTable::default();
    for record in reader.records() {
        let record = record.map_err(csv_err)?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        table.total_rows += 1;

        let raw_key = record.get(key_idx).unwrap_or_default();
        let key = options.normalization.normalize(raw_key);
        if key.is_empty() {
            table.blank_keys += 1;
            tracing::warn!(path = %origin.display(), line, "skipping row with blank key");
            continue;
        }

        if let Some(kept) = table.rows.get(&key) {
            tracing::warn!(path = %origin.display(), key = %key, kept_line = kept.line, dropped_line = line, "duplicate key, keeping first occurrence");
            table.duplicates.push(DuplicateKey {
                key,
                kept_line: kept.line,
                dropped_line: line,
            });
            continue;
        }

        let attributes = headers
            .iter()
            .zip(record.iter())
            .enumerate()
            .filter(|(i, _)| *i != key_idx && *i != wkt_idx)
            .map(|(_, (h, v))| (h.clone(), v.to_string()))
            .collect();
        table.rows.insert(
            key.clone(),
            ExternalGeoRow {
                key,
                raw_key: raw_key.to_string(),
                wkt: record.get(wkt_idx).unwrap_or_default().to_string(),
                line,
                attributes,
            },
        );
    }

    tracing::info!(
        path = %origin.display(),
        rows = table.total_rows,
        keys = table.rows.len(),
        duplicates = table.duplicates.len(),
        blank_keys = table.blank_keys,
        "loaded external table"
    );
    Ok(table)
}

fn find_header(headers: &[String], name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .or_else(|| headers.iter().position(|h| h.trim().eq_ignore_ascii_case(name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load_str(text: &str, options: &ExternalTableOptions) -> Result<ExternalTable, StorageError> {
        load_from_reader(text.as_bytes(), "inline.csv", options)
    }

    fn key(raw: &str) -> JoinKey {
        KeyNormalization::default().normalize(raw)
    }

    #[test]
    fn loads_keyed_rows_with_attributes() -> Result<(), Box<dyn std::error::Error>> {
        let text = "OBJECTID,NAME,WKT\n1,Springfield,\"POLYGON((0 0,0 1,1 1,1 0,0 0))\"\n2,Shelbyville,\"POLYGON((5 5,5 6,6 6,5 5))\"\n";
        let table = load_str(text, &ExternalTableOptions::default())?;
        assert_eq!(table.total_rows, 2);
        assert_eq!(table.len(), 2);

        let row = table.get(&key("springfield")).expect("springfield row");
        assert_eq!(row.raw_key, "Springfield");
        assert_eq!(row.wkt, "POLYGON((0 0,0 1,1 1,1 0,0 0))");
        assert_eq!(row.line, 2);
        assert_eq!(row.attributes, vec![("OBJECTID".to_string(), "1".to_string())]);
        Ok(())
    }

    #[test]
    fn duplicate_keys_keep_first_occurrence() -> Result<(), Box<dyn std::error::Error>> {
        let text = "NAME,WKT\nAmes,first\n AMES ,second\nBoone,x\names,third\n";
        let table = load_str(text, &ExternalTableOptions::default())?;
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(&key("Ames")).map(|r| r.wkt.as_str()), Some("first"));
        assert_eq!(table.duplicates.len(), 2);
        assert_eq!(table.duplicates[0].kept_line, 2);
        assert_eq!(table.duplicates[0].dropped_line, 3);
        assert_eq!(table.duplicates[1].dropped_line, 5);
        Ok(())
    }

    #[test]
    fn missing_wkt_column_is_schema_error() {
        let err = load_str("NAME,GEOM\nAmes,x\n", &ExternalTableOptions::default()).unwrap_err();
        assert!(err.is_schema_error());
        assert!(err.to_string().contains("WKT"));
    }

    #[test]
    fn missing_key_column_is_schema_error() {
        let err = load_str("ID,WKT\n1,x\n", &ExternalTableOptions::default()).unwrap_err();
        assert!(err.is_schema_error());

        let options = ExternalTableOptions {
            key_column: KeyColumn::Index(5),
            ..Default::default()
        };
        assert!(load_str("ID,WKT\n1,x\n", &options).unwrap_err().is_schema_error());
    }

    #[test]
    fn key_by_position_and_header_case() -> Result<(), Box<dyn std::error::Error>> {
        let options = ExternalTableOptions {
            key_column: KeyColumn::Index(0),
            ..Default::default()
        };
        let table = load_str("\u{feff}ParentID,wkt\n42,shape\n", &options)?;
        assert_eq!(table.get(&key("42")).map(|r| r.wkt.as_str()), Some("shape"));
        Ok(())
    }

    #[test]
    fn blank_keys_are_skipped_and_counted() -> Result<(), Box<dyn std::error::Error>> {
        let table = load_str("NAME,WKT\n  ,x\nAmes,y\n", &ExternalTableOptions::default())?;
        assert_eq!(table.blank_keys, 1);
        assert_eq!(table.total_rows, 2);
        assert_eq!(table.len(), 1);
        Ok(())
    }

    #[test]
    fn custom_delimiter_and_long_fields() -> Result<(), Box<dyn std::error::Error>> {
        let long = "1 2,".repeat(200_000);
        let text = format!("NAME;WKT\nAmes;POLYGON(({long}1 2))\n");
        let options = ExternalTableOptions {
            delimiter: b';',
            ..Default::default()
        };
        let table = load_str(&text, &options)?;
        assert!(table.get(&key("ames")).is_some_and(|r| r.wkt.len() > 800_000));
        Ok(())
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        match load(dir.path().join("absent.csv"), &ExternalTableOptions::default()) {
            Err(StorageError::Io { path, .. }) => assert!(path.ends_with("absent.csv")),
            other => panic!("unexpected {other:?}"),
        }
    }
}
