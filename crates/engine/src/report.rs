use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeOutcome {
    Matched,
    Unmatched,
    MalformedGeometry,
}

impl MergeOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Matched => "matched",
            Self::Unmatched => "unmatched",
            Self::MalformedGeometry => "malformed_geometry",
        }
    }
}

/// Outcome of one source row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowResult {
    /// 0-based position in the source table.
    pub row: usize,
    /// Normalized key, when the row had one.
    pub key: Option<String>,
    pub outcome: MergeOutcome,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeSummary {
    pub matched: u64,
    pub unmatched: u64,
    pub malformed: u64,
    /// External keys no source row asked for.
    pub unused_external_keys: u64,
}

impl MergeSummary {
    pub fn record(&mut self, outcome: MergeOutcome) {
        match outcome {
            MergeOutcome::Matched => self.matched += 1,
            MergeOutcome::Unmatched => self.unmatched += 1,
            MergeOutcome::MalformedGeometry => self.malformed += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.matched + self.unmatched + self.malformed
    }
}

impl fmt::Display for MergeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} matched, {} unmatched, {} malformed",
            self.matched, self.unmatched, self.malformed
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExternalStats {
    pub rows: u64,
    pub keys: u64,
    pub duplicate_keys: u64,
    pub blank_keys: u64,
}

/// Everything a run produced besides the container itself.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub dest_path: Option<PathBuf>,
    pub target_table: String,
    pub geometry_column: String,
    pub summary: MergeSummary,
    pub external: ExternalStats,
    pub copied_tables: Vec<String>,
    pub output_rows: u64,
    /// Rows that did not match, in source order.
    pub diagnostics: Vec<RowResult>,
    /// blake3 of the output rows, hex encoded.
    pub checksum: String,
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.target_table, self.summary)?;
        if self.external.duplicate_keys > 0 {
            write!(f, " ({} duplicate external keys ignored)", self.external.duplicate_keys)?;
        }
        Ok(())
    }
}
