use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::field_value::FieldValue;
use crate::geometry::Geometry;
use crate::join_key::JoinKey;

/// One stored row, values in schema column order.
pub type Row = Vec<FieldValue>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    Text,
    Integer,
    Float,
    Boolean,
    Bytes,
    Geometry,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Integer => "INTEGER",
            Self::Float => "REAL",
            Self::Boolean => "BOOLEAN",
            Self::Bytes => "BLOB",
            Self::Geometry => "GEOGRAPHY",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub field_type: FieldType,
    /// Type text as declared by the container, kept so copies are faithful.
    pub declared_type: String,
}

impl Column {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            declared_type: field_type.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub columns: Vec<Column>,
}

impl TableSchema {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Lookup by SQL identifier rules: ASCII case does not distinguish names.
    pub fn index_of_ignore_case(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn geometry_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns
            .iter()
            .filter(|c| c.field_type == FieldType::Geometry)
    }

    /// This schema with one geometry column appended.
    pub fn with_geometry_column(&self, name: &str) -> Self {
        let mut columns = self.columns.clone();
        columns.push(Column::new(name, FieldType::Geometry));
        Self { columns }
    }
}

/// A row of the target table on its way through the merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeoRecord {
    pub fields: Row,
    pub geometry: Option<Geometry>,
}

impl GeoRecord {
    pub fn from_row(fields: Row) -> Self {
        Self {
            fields,
            geometry: None,
        }
    }

    pub fn field(&self, index: usize) -> Option<&FieldValue> {
        self.fields.get(index)
    }

    /// The stored row: source fields followed by the geometry cell.
    pub fn into_row(self) -> Row {
        let mut row = self.fields;
        row.push(match self.geometry {
            Some(g) => FieldValue::Geometry(g),
            None => FieldValue::Null,
        });
        row
    }
}

/// One row of the external keyed table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalGeoRow {
    pub key: JoinKey,
    pub raw_key: String,
    pub wkt: String,
    /// 1-based line of the record in the source file, header included.
    pub line: u64,
    /// Remaining columns as `(header, value)`, unused by the merge.
    pub attributes: Vec<(String, String)>,
}

/// blake3 over the msgpack encoding of every row, in order.
pub fn rows_checksum<'a>(rows: impl IntoIterator<Item = &'a Row>) -> Result<[u8; 32], CoreError> {
    let mut hasher = blake3::Hasher::new();
    for row in rows {
        let bytes = rmp_serde::to_vec(row).map_err(|e| CoreError::Serialization(e.to_string()))?;
        hasher.update(&(bytes.len() as u64).to_be_bytes());
        hasher.update(&bytes);
    }
    Ok(*hasher.finalize().as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wkt;

    fn schema() -> TableSchema {
        TableSchema::new(vec![
            Column::new("Name", FieldType::Text),
            Column::new("ParentID", FieldType::Integer),
        ])
    }

    #[test]
    fn geometry_column_is_appended_last() {
        let base = schema();
        let augmented = base.with_geometry_column("Geometry");
        assert_eq!(augmented.len(), 3);
        assert_eq!(&augmented.columns[..2], &base.columns[..]);
        assert_eq!(augmented.columns[2].field_type, FieldType::Geometry);
        assert_eq!(augmented.columns[2].declared_type, "GEOGRAPHY");
        assert_eq!(augmented.geometry_columns().count(), 1);
    }

    #[test]
    fn index_of_is_exact() {
        assert_eq!(schema().index_of("ParentID"), Some(1));
        assert_eq!(schema().index_of("parentid"), None);
    }

    #[test]
    fn index_of_ignore_case_folds_ascii() {
        assert_eq!(schema().index_of_ignore_case("parentid"), Some(1));
        assert_eq!(schema().index_of_ignore_case("NAME"), Some(0));
        assert_eq!(schema().index_of_ignore_case("Geometry"), None);
    }

    #[test]
    fn into_row_appends_geometry_or_null() {
        let fields = vec![FieldValue::Text("Ames".into()), FieldValue::Integer(7)];
        let bare = GeoRecord::from_row(fields.clone()).into_row();
        assert_eq!(bare.last(), Some(&FieldValue::Null));

        let mut record = GeoRecord::from_row(fields);
        record.geometry = Some(wkt::parse("POLYGON((0 0,0 1,1 1,0 0))").unwrap());
        let row = record.into_row();
        assert_eq!(row.len(), 3);
        assert!(matches!(row[2], FieldValue::Geometry(_)));
    }

    #[test]
    fn checksum_depends_on_order_and_content() {
        let a = vec![FieldValue::Integer(1)];
        let b = vec![FieldValue::Integer(2)];
        let ab = rows_checksum([&a, &b]).unwrap();
        assert_eq!(ab, rows_checksum([&a, &b]).unwrap());
        assert_ne!(ab, rows_checksum([&b, &a]).unwrap());
        assert_ne!(ab, rows_checksum([&a]).unwrap());
    }
}
