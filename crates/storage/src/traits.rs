use geofill_core::{Row, TableSchema};

use crate::error::StorageError;

/// Prefix custom geocoding containers put in front of user-data table names.
pub const LOCAL_DATA_PREFIX: &str = "LocalData";

/// Read side of a container: a catalog of named tables.
pub trait TableReader {
    fn table_names(&self) -> Result<Vec<String>, StorageError>;

    fn schema(&self, table: &str) -> Result<TableSchema, StorageError>;

    fn row_count(&self, table: &str) -> Result<u64, StorageError>;

    /// All rows in storage order. Calling again yields the same rows.
    fn rows(&self, table: &str) -> Result<Vec<Row>, StorageError>;
}

/// Write side of a container.
///
/// Callers create a table, write its rows, then `commit`. Nothing written is
/// visible as a container until `commit` returns; dropping the writer
/// earlier abandons everything.
pub trait TableWriter {
    fn create_table(&mut self, name: &str, schema: &TableSchema) -> Result<(), StorageError>;

    /// Appends rows to a table created by this writer. Returns rows written.
    fn write_rows(&mut self, name: &str, rows: &[Row]) -> Result<u64, StorageError>;

    fn commit(self) -> Result<(), StorageError>
    where
        Self: Sized;
}

/// Find the catalog entry for `name`.
///
/// Tries the exact name, then `LocalData<name>`, then a case-insensitive match
/// on either form. A case-insensitive match must be unique.
pub fn resolve_table<R: TableReader + ?Sized>(
    reader: &R,
    name: &str,
) -> Result<String, StorageError> {
    let names = reader.table_names()?;
    let prefixed = format!("{LOCAL_DATA_PREFIX}{name}");

    for wanted in [name, prefixed.as_str()] {
        if let Some(found) = names.iter().find(|n| n.as_str() == wanted) {
            return Ok(found.clone());
        }
    }

    let mut folded: Vec<&String> = names
        .iter()
        .filter(|n| n.eq_ignore_ascii_case(name) || n.eq_ignore_ascii_case(&prefixed))
        .collect();
    match folded.len() {
        1 => Ok(folded.remove(0).clone()),
        0 => Err(StorageError::TableNotFound(name.to_string())),
        _ => Err(StorageError::TableNotFound(format!(
            "{name} (ambiguous: {})",
            folded
                .iter()
                .map(|n| n.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Catalog(Vec<&'static str>);

    impl TableReader for Catalog {
        fn table_names(&self) -> Result<Vec<String>, StorageError> {
            Ok(self.0.iter().map(|s| s.to_string()).collect())
        }

        fn schema(&self, table: &str) -> Result<TableSchema, StorageError> {
            Err(StorageError::TableNotFound(table.to_string()))
        }

        fn row_count(&self, _table: &str) -> Result<u64, StorageError> {
            Ok(0)
        }

        fn rows(&self, _table: &str) -> Result<Vec<Row>, StorageError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn exact_name_wins() {
        let catalog = Catalog(vec!["LocalDatamunicipalities", "municipalities"]);
        assert_eq!(resolve_table(&catalog, "municipalities").unwrap(), "municipalities");
    }

    #[test]
    fn local_data_prefix_is_tried() {
        let catalog = Catalog(vec!["LocalDatamunicipalities", "Extract"]);
        assert_eq!(
            resolve_table(&catalog, "municipalities").unwrap(),
            "LocalDatamunicipalities"
        );
    }

    #[test]
    fn case_insensitive_fallback() {
        let catalog = Catalog(vec!["Municipalities"]);
        assert_eq!(resolve_table(&catalog, "municipalities").unwrap(), "Municipalities");
    }

    #[test]
    fn missing_and_ambiguous_tables() {
        let err = resolve_table(&Catalog(vec!["Extract"]), "municipalities").unwrap_err();
        assert!(err.is_schema_error());

        let catalog = Catalog(vec!["Municipalities", "MUNICIPALITIES"]);
        match resolve_table(&catalog, "municipalities") {
            Err(StorageError::TableNotFound(msg)) => assert!(msg.contains("ambiguous")),
            other => panic!("unexpected {other:?}"),
        }
    }
}
