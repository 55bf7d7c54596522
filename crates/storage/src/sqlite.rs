use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rusqlite::types::{Value, ValueRef};
use rusqlite::{Connection, OpenFlags};
use tempfile::NamedTempFile;

use geofill_core::{Column, FieldType, FieldValue, Row, TableSchema};

use crate::error::StorageError;
use crate::traits::{TableReader, TableWriter};

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Map a declared column type onto a [`FieldType`], following SQLite's
/// affinity rules with geography and boolean recognised first.
fn field_type_for(declared: &str) -> FieldType {
    let upper = declared.to_ascii_uppercase();
    if upper.contains("GEOGRAPHY") || upper.contains("GEOMETRY") {
        FieldType::Geometry
    } else if upper.contains("BOOL") {
        FieldType::Boolean
    } else if upper.contains("INT") {
        FieldType::Integer
    } else if upper.contains("CHAR") || upper.contains("CLOB") || upper.contains("TEXT") {
        FieldType::Text
    } else if upper.is_empty() || upper.contains("BLOB") {
        FieldType::Bytes
    } else {
        FieldType::Float
    }
}

fn read_value(value: ValueRef<'_>, field_type: FieldType) -> Result<FieldValue, StorageError> {
    Ok(match (value, field_type) {
        (ValueRef::Null, _) => FieldValue::Null,
        // SQLite stores any integer in a BOOLEAN column; only 0 and 1 are booleans.
        (ValueRef::Integer(n @ (0 | 1)), FieldType::Boolean) => FieldValue::Boolean(n == 1),
        (ValueRef::Integer(n), _) => FieldValue::Integer(n),
        (ValueRef::Real(f), _) => FieldValue::Float(f),
        (ValueRef::Text(bytes), _) => FieldValue::Text(
            std::str::from_utf8(bytes)
                .map_err(|e| StorageError::Serialization(format!("invalid utf-8 text: {e}")))?
                .to_string(),
        ),
        (ValueRef::Blob(bytes), _) => FieldValue::Bytes(bytes.to_vec()),
    })
}

fn to_sql_value(value: &FieldValue) -> Value {
    match value {
        FieldValue::Null => Value::Null,
        FieldValue::Text(s) => Value::Text(s.clone()),
        FieldValue::Integer(n) => Value::Integer(*n),
        FieldValue::Float(f) => Value::Real(*f),
        FieldValue::Boolean(b) => Value::Integer(i64::from(*b)),
        FieldValue::Bytes(b) => Value::Blob(b.clone()),
        FieldValue::Geometry(g) => Value::Text(g.to_wkt()),
    }
}

/// A container file opened read-only.
///
/// Geometry columns come back as their stored text, so rows copied through
/// this reader are written out unchanged.
pub struct SqliteContainer {
    conn: Connection,
}

impl SqliteContainer {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        std::fs::metadata(path).map_err(|e| StorageError::io(path, e))?;
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        // Touch the catalog so a non-database file fails here, not mid-run.
        conn.query_row("SELECT COUNT(*) FROM sqlite_master", [], |row| {
            row.get::<_, i64>(0)
        })?;
        Ok(Self { conn })
    }

    /// Storage order for `table`: rowid, or the primary key for tables
    /// declared `WITHOUT ROWID`.
    fn storage_order(&self, table: &str) -> Result<String, StorageError> {
        let without_rowid: bool = self.conn.query_row(
            "SELECT wr FROM pragma_table_list WHERE schema = 'main' AND name = ?1",
            rusqlite::params![table],
            |row| row.get(0),
        )?;
        if !without_rowid {
            return Ok("rowid".to_string());
        }
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM pragma_table_info(?1) WHERE pk > 0 ORDER BY pk")?;
        let keys = stmt
            .query_map(rusqlite::params![table], |row| row.get::<_, String>(0))?
            .map(|name| name.map(|n| quote_ident(&n)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(keys.join(", "))
    }
}

impl TableReader for SqliteContainer {
    fn table_names(&self) -> Result<Vec<String>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite\\_%' ESCAPE '\\' ORDER BY name",
        )?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }

    fn schema(&self, table: &str) -> Result<TableSchema, StorageError> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, type FROM pragma_table_info(?1) ORDER BY cid")?;
        let columns = stmt
            .query_map(rusqlite::params![table], |row| {
                let name: String = row.get(0)?;
                let declared_type: String = row.get(1)?;
                Ok(Column {
                    name,
                    field_type: field_type_for(&declared_type),
                    declared_type,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        if columns.is_empty() {
            return Err(StorageError::TableNotFound(table.to_string()));
        }
        Ok(TableSchema::new(columns))
    }

    fn row_count(&self, table: &str) -> Result<u64, StorageError> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", quote_ident(table)),
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn rows(&self, table: &str) -> Result<Vec<Row>, StorageError> {
        let schema = self.schema(table)?;
        let columns = schema
            .column_names()
            .map(quote_ident)
            .collect::<Vec<_>>()
            .join(", ");
        let order = self.storage_order(table)?;
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {columns} FROM {} ORDER BY {order}",
            quote_ident(table)
        ))?;
        let mut rows = stmt.query([])?;

        let mut result = Vec::new();
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(schema.len());
            for (i, column) in schema.columns.iter().enumerate() {
                values.push(read_value(row.get_ref(i)?, column.field_type)?);
            }
            result.push(values);
        }
        Ok(result)
    }
}

/// Writes a new container through a staging file next to the destination.
///
/// All writes share one transaction. `commit` ends it and renames the staging
/// file onto the destination; dropping the writer first deletes the staging
/// file and leaves the destination untouched.
pub struct SqliteContainerWriter {
    // Declared before `staging` so the connection closes before the file is removed.
    conn: Connection,
    staging: NamedTempFile,
    dest: PathBuf,
    overwrite: bool,
    tables: BTreeMap<String, usize>,
}

impl SqliteContainerWriter {
    pub fn create(dest: impl AsRef<Path>, overwrite: bool) -> Result<Self, StorageError> {
        let dest = dest.as_ref().to_path_buf();
        if !overwrite && dest.exists() {
            return Err(StorageError::AlreadyExists(dest));
        }
        let dir = match dest.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let staging = tempfile::Builder::new()
            .prefix(".geofill-")
            .suffix(".staging")
            .tempfile_in(&dir)
            .map_err(|e| StorageError::io(&dir, e))?;

        let conn = Connection::open(staging.path())?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = DELETE;
            PRAGMA synchronous = FULL;
            BEGIN IMMEDIATE;
        ",
        )?;
        tracing::debug!(staging = %staging.path().display(), dest = %dest.display(), "opened staging container");

        Ok(Self {
            conn,
            staging,
            dest,
            overwrite,
            tables: BTreeMap::new(),
        })
    }
}

impl TableWriter for SqliteContainerWriter {
    fn create_table(&mut self, name: &str, schema: &TableSchema) -> Result<(), StorageError> {
        let columns = schema
            .columns
            .iter()
            .map(|c| {
                if c.declared_type.is_empty() {
                    quote_ident(&c.name)
                } else {
                    format!("{} {}", quote_ident(&c.name), c.declared_type)
                }
            })
            .collect::<Vec<_>>()
            .join(", ");
        self.conn
            .execute_batch(&format!("CREATE TABLE {} ({columns})", quote_ident(name)))?;
        self.tables.insert(name.to_string(), schema.len());
        tracing::debug!(table = name, columns = schema.len(), "created table");
        Ok(())
    }

    fn write_rows(&mut self, name: &str, rows: &[Row]) -> Result<u64, StorageError> {
        let width = *self
            .tables
            .get(name)
            .ok_or_else(|| StorageError::TableNotFound(name.to_string()))?;
        let placeholders = vec!["?"; width].join(", ");
        let mut stmt = self.conn.prepare_cached(&format!(
            "INSERT INTO {} VALUES ({placeholders})",
            quote_ident(name)
        ))?;
        for (i, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(StorageError::Serialization(format!(
                    "row {i} of {name} has {} values, table has {width} columns",
                    row.len()
                )));
            }
            stmt.execute(rusqlite::params_from_iter(row.iter().map(to_sql_value)))?;
        }
        Ok(rows.len() as u64)
    }

    fn commit(self) -> Result<(), StorageError> {
        let Self {
            conn,
            staging,
            dest,
            overwrite,
            ..
        } = self;
        conn.execute_batch("COMMIT")?;
        conn.close().map_err(|(_, e)| StorageError::Sqlite(e))?;

        let persisted = if overwrite {
            staging.persist(&dest)
        } else {
            staging.persist_noclobber(&dest)
        };
        match persisted {
            Ok(_) => {}
            Err(e) if e.error.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(StorageError::AlreadyExists(dest));
            }
            Err(e) => return Err(StorageError::io(&dest, e.error)),
        }
        tracing::info!(dest = %dest.display(), "committed container");
        Ok(())
    }
}
