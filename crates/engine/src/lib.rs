pub mod config;
pub mod error;
pub mod merge;
pub mod pipeline;
pub mod report;

pub use config::InjectConfig;
pub use error::EngineError;
pub use merge::{MergeEngine, MergeOutput};
pub use pipeline::{TableSummary, describe_tables, inject, list_tables, run};
pub use report::{ExternalStats, MergeOutcome, MergeSummary, RowResult, RunReport};
