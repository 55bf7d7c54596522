use std::path::{Path, PathBuf};

use rusqlite::Connection;
use rusqlite::types::Value;
use tempfile::TempDir;

/// A scratch directory holding a source container and its companion files.
pub struct TestContainer {
    pub dir: TempDir,
    pub source: PathBuf,
    conn: Connection,
}

impl TestContainer {
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let source = dir.path().join("source.hyper");
        let conn = Connection::open(&source)?;
        Ok(Self { dir, source, conn })
    }

    /// The geocoding layout: a `LocalDatamunicipalities` table plus an
    /// unrelated `Extract` table that must be carried over untouched.
    pub fn municipalities(names: &[&str]) -> Result<Self, Box<dyn std::error::Error>> {
        let container = Self::new()?;
        container.create_table(
            "LocalDatamunicipalities",
            &[("ParentID", "INTEGER"), ("Name", "TEXT"), ("Population", "REAL")],
        )?;
        for (i, name) in names.iter().enumerate() {
            container.insert(
                "LocalDatamunicipalities",
                vec![
                    Value::Integer(i as i64 + 1),
                    Value::Text(name.to_string()),
                    Value::Real(1000.5 * (i as f64 + 1.0)),
                ],
            )?;
        }
        container.create_table("Extract", &[("Key", "TEXT"), ("Flag", "BOOLEAN"), ("Payload", "BLOB")])?;
        container.insert(
            "Extract",
            vec![Value::Text("a".into()), Value::Integer(1), Value::Blob(vec![0, 1, 2])],
        )?;
        container.insert("Extract", vec![Value::Null, Value::Integer(0), Value::Null])?;
        Ok(container)
    }

    pub fn create_table(&self, name: &str, columns: &[(&str, &str)]) -> Result<(), rusqlite::Error> {
        let columns = columns
            .iter()
            .map(|(n, t)| format!("\"{n}\" {t}"))
            .collect::<Vec<_>>()
            .join(", ");
        self.conn
            .execute_batch(&format!("CREATE TABLE \"{name}\" ({columns})"))
    }

    /// Run raw SQL against the source, for layouts `create_table` cannot express.
    pub fn execute(&self, sql: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(sql)
    }

    pub fn insert(&self, table: &str, values: Vec<Value>) -> Result<(), rusqlite::Error> {
        let placeholders = vec!["?"; values.len()].join(", ");
        self.conn.execute(
            &format!("INSERT INTO \"{table}\" VALUES ({placeholders})"),
            rusqlite::params_from_iter(values),
        )?;
        Ok(())
    }

    /// Write a CSV file next to the container and return its path.
    pub fn write_csv(&self, file_name: &str, contents: &str) -> Result<PathBuf, std::io::Error> {
        let path = self.dir.path().join(file_name);
        std::fs::write(&path, contents)?;
        Ok(path)
    }

    pub fn path(&self, file_name: &str) -> PathBuf {
        self.dir.path().join(file_name)
    }

    pub fn source(&self) -> &Path {
        &self.source
    }
}
