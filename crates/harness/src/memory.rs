use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use geofill_core::{Row, TableSchema};
use geofill_storage::{StorageError, TableReader, TableWriter};

/// In-memory catalog of tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pub tables: BTreeMap<String, (TableSchema, Vec<Row>)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, name: &str, schema: TableSchema, rows: Vec<Row>) -> Self {
        self.tables.insert(name.to_string(), (schema, rows));
        self
    }

    fn table(&self, name: &str) -> Result<&(TableSchema, Vec<Row>), StorageError> {
        self.tables
            .get(name)
            .ok_or_else(|| StorageError::TableNotFound(name.to_string()))
    }
}

impl TableReader for MemoryStore {
    fn table_names(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.tables.keys().cloned().collect())
    }

    fn schema(&self, table: &str) -> Result<TableSchema, StorageError> {
        Ok(self.table(table)?.0.clone())
    }

    fn row_count(&self, table: &str) -> Result<u64, StorageError> {
        Ok(self.table(table)?.1.len() as u64)
    }

    fn rows(&self, table: &str) -> Result<Vec<Row>, StorageError> {
        Ok(self.table(table)?.1.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriterCall {
    CreateTable(String),
    WriteRows(String, usize),
    Commit,
}

/// What a [`RecordingWriter`] saw, readable after the writer is consumed.
#[derive(Debug, Default)]
pub struct WriterLog {
    pub calls: Vec<WriterCall>,
    pub store: MemoryStore,
    pub committed: bool,
}

/// Writer that records every call into a shared [`WriterLog`].
pub struct RecordingWriter {
    log: Rc<RefCell<WriterLog>>,
    pending: MemoryStore,
    fail_on_write: Option<String>,
}

impl RecordingWriter {
    pub fn new() -> (Self, Rc<RefCell<WriterLog>>) {
        let log = Rc::new(RefCell::new(WriterLog::default()));
        let writer = Self {
            log: Rc::clone(&log),
            pending: MemoryStore::new(),
            fail_on_write: None,
        };
        (writer, log)
    }

    /// Make `write_rows` fail for `table`.
    pub fn failing_on(mut self, table: &str) -> Self {
        self.fail_on_write = Some(table.to_string());
        self
    }
}

impl TableWriter for RecordingWriter {
    fn create_table(&mut self, name: &str, schema: &TableSchema) -> Result<(), StorageError> {
        self.log
            .borrow_mut()
            .calls
            .push(WriterCall::CreateTable(name.to_string()));
        self.pending
            .tables
            .insert(name.to_string(), (schema.clone(), Vec::new()));
        Ok(())
    }

    fn write_rows(&mut self, name: &str, rows: &[Row]) -> Result<u64, StorageError> {
        self.log
            .borrow_mut()
            .calls
            .push(WriterCall::WriteRows(name.to_string(), rows.len()));
        if self.fail_on_write.as_deref() == Some(name) {
            return Err(StorageError::Serialization(format!("injected failure on {name}")));
        }
        let (_, stored) = self
            .pending
            .tables
            .get_mut(name)
            .ok_or_else(|| StorageError::TableNotFound(name.to_string()))?;
        stored.extend_from_slice(rows);
        Ok(rows.len() as u64)
    }

    fn commit(self) -> Result<(), StorageError> {
        let mut log = self.log.borrow_mut();
        log.calls.push(WriterCall::Commit);
        log.store = self.pending;
        log.committed = true;
        Ok(())
    }
}
