//! Joins container rows to external WKT rows and attaches parsed polygons.

use std::collections::BTreeSet;

use geofill_core::{GeoRecord, JoinKey, KeyNormalization, wkt};
use geofill_storage::ExternalTable;

use crate::report::{MergeOutcome, MergeSummary, RowResult};

#[derive(Debug, Clone)]
pub struct MergeOutput {
    /// One record per input record, input order.
    pub records: Vec<GeoRecord>,
    /// One result per input record, input order.
    pub results: Vec<RowResult>,
    pub summary: MergeSummary,
}

impl MergeOutput {
    /// Results for rows that did not get a geometry.
    pub fn diagnostics(&self) -> impl Iterator<Item = &RowResult> {
        self.results
            .iter()
            .filter(|r| r.outcome != MergeOutcome::Matched)
    }
}

/// Single-pass join. Holds only configuration, so every call is independent.
#[derive(Debug, Clone, Copy)]
pub struct MergeEngine {
    join_index: usize,
    normalization: KeyNormalization,
}

impl MergeEngine {
    /// `join_index` is the position of the identifier among the record fields.
    pub fn new(join_index: usize, normalization: KeyNormalization) -> Self {
        Self {
            join_index,
            normalization,
        }
    }

    fn key_of(&self, record: &GeoRecord) -> Option<JoinKey> {
        let raw = record.field(self.join_index)?.key_text()?;
        let key = self.normalization.normalize(&raw);
        (!key.is_empty()).then_some(key)
    }

    pub fn merge(
        &self,
        records: impl IntoIterator<Item = GeoRecord>,
        external: &ExternalTable,
    ) -> MergeOutput {
        let mut out = Vec::new();
        let mut results = Vec::new();
        let mut summary = MergeSummary::default();
        let mut used: BTreeSet<&JoinKey> = BTreeSet::new();

        for (row, mut record) in records.into_iter().enumerate() {
            record.geometry = None;
            let key = self.key_of(&record);

            let (outcome, message) = match key.as_ref().map(|k| (k, external.get(k))) {
                None => (MergeOutcome::Unmatched, Some("no join key".to_string())),
                Some((k, None)) => (
                    MergeOutcome::Unmatched,
                    Some(format!("no external row for `{k}`")),
                ),
                Some((_, Some(ext))) => {
                    used.insert(&ext.key);
                    match wkt::parse(&ext.wkt) {
                        Ok(geometry) => {
                            record.geometry = Some(geometry);
                            (MergeOutcome::Matched, None)
                        }
                        Err(e) => {
                            tracing::warn!(row, key = %ext.key, line = ext.line, error = %e, "malformed geometry");
                            (
                                MergeOutcome::MalformedGeometry,
                                Some(format!("line {}: {e}", ext.line)),
                            )
                        }
                    }
                }
            };

            tracing::debug!(row, outcome = outcome.as_str(), "merged row");
            summary.record(outcome);
            results.push(RowResult {
                row,
                key: key.map(|k| k.to_string()),
                outcome,
                message,
            });
            out.push(record);
        }

        summary.unused_external_keys = (external.len() - used.len()) as u64;
        MergeOutput {
            records: out,
            results,
            summary,
        }
    }
}
