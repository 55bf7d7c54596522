//! Sequencing: read the source, merge, write the destination.

use std::path::Path;

use serde::Serialize;
use uuid::Uuid;

use geofill_core::{GeoRecord, Row, rows_checksum};
use geofill_storage::{
    ExternalTable, SqliteContainer, SqliteContainerWriter, TableReader, TableWriter, external,
    resolve_table,
};

use crate::config::InjectConfig;
use crate::error::EngineError;
use crate::merge::MergeEngine;
use crate::report::{ExternalStats, RunReport};

/// One entry of a container listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSummary {
    pub name: String,
    pub row_count: u64,
    pub geometry_columns: Vec<String>,
}

/// Every table in the container at `path` with its geometry-typed columns.
pub fn list_tables(path: impl AsRef<Path>) -> Result<Vec<TableSummary>, EngineError> {
    let container = SqliteContainer::open(path)?;
    describe_tables(&container)
}

pub fn describe_tables<R: TableReader>(reader: &R) -> Result<Vec<TableSummary>, EngineError> {
    let mut tables = Vec::new();
    for name in reader.table_names()? {
        let schema = reader.schema(&name)?;
        tables.push(TableSummary {
            row_count: reader.row_count(&name)?,
            geometry_columns: schema.geometry_columns().map(|c| c.name.clone()).collect(),
            name,
        });
    }
    Ok(tables)
}

/// Run the whole job against files on disk.
pub fn run(config: &InjectConfig) -> Result<RunReport, EngineError> {
    if same_file(&config.source_path, &config.dest_path) {
        return Err(EngineError::SamePath(config.dest_path.clone()));
    }
    tracing::info!(
        source = %config.source_path.display(),
        dest = %config.dest_path.display(),
        external = %config.external_table_path.display(),
        table = %config.target_table_name,
        "starting geometry injection"
    );

    let external = external::load(&config.external_table_path, &config.external_options())?;
    let source = SqliteContainer::open(&config.source_path)?;
    let writer = SqliteContainerWriter::create(&config.dest_path, config.overwrite)?;

    let mut report = inject(&source, writer, &external, config)?;
    report.dest_path = Some(config.dest_path.clone());
    tracing::info!(dest = %config.dest_path.display(), summary = %report.summary, "finished geometry injection");
    Ok(report)
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Copy `reader` into `writer`, augmenting the target table, then commit.
///
/// Every schema check happens before the first writer call. Any error drops
/// the writer uncommitted.
pub fn inject<R, W>(
    reader: &R,
    mut writer: W,
    external: &ExternalTable,
    config: &InjectConfig,
) -> Result<RunReport, EngineError>
where
    R: TableReader,
    W: TableWriter,
{
    let target = resolve_table(reader, &config.target_table_name)?;
    let schema = reader.schema(&target)?;
    let join_index =
        schema
            .index_of(&config.join_key_field)
            .ok_or_else(|| EngineError::JoinFieldNotFound {
                table: target.clone(),
                field: config.join_key_field.clone(),
            })?;
    if schema.index_of_ignore_case(&config.geometry_column).is_some() {
        return Err(EngineError::GeometryColumnExists {
            table: target,
            column: config.geometry_column.clone(),
        });
    }

    let mut copied_tables = Vec::new();
    for name in reader.table_names()? {
        if name == target {
            continue;
        }
        let table_schema = reader.schema(&name)?;
        writer.create_table(&name, &table_schema)?;
        let written = writer.write_rows(&name, &reader.rows(&name)?)?;
        tracing::info!(table = %name, rows = written, "copied table");
        copied_tables.push(name);
    }

    let engine = MergeEngine::new(join_index, config.normalization);
    let source_rows = reader.rows(&target)?;
    let merged = engine.merge(source_rows.into_iter().map(GeoRecord::from_row), external);

    let diagnostics = merged.diagnostics().cloned().collect();
    let summary = merged.summary;
    let rows: Vec<Row> = merged.records.into_iter().map(GeoRecord::into_row).collect();
    let checksum = rows_checksum(&rows)?;

    writer.create_table(&target, &schema.with_geometry_column(&config.geometry_column))?;
    let output_rows = writer.write_rows(&target, &rows)?;
    writer.commit()?;

    Ok(RunReport {
        run_id: Uuid::now_v7(),
        dest_path: None,
        target_table: target,
        geometry_column: config.geometry_column.clone(),
        summary,
        external: ExternalStats {
            rows: external.total_rows,
            keys: external.len() as u64,
            duplicate_keys: external.duplicates.len() as u64,
            blank_keys: external.blank_keys,
        },
        copied_tables,
        output_rows,
        diagnostics,
        checksum: blake3::Hash::from(checksum).to_hex().to_string(),
    })
}
