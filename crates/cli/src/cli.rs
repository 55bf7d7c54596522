use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use geofill_core::KeyNormalization;
use geofill_engine::InjectConfig;
use geofill_engine::config::{DEFAULT_GEOMETRY_COLUMN, DEFAULT_TARGET_TABLE};
use geofill_storage::KeyColumn;
use geofill_storage::external::{DEFAULT_KEY_COLUMN, DEFAULT_WKT_COLUMN};

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Engine(#[from] geofill_engine::EngineError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
}

#[derive(Debug, Parser)]
#[command(name = "geofill")]
#[command(about = "Inject WKT polygons from a CSV table into a geocoding container")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List every table with its row count and geometry columns.
    List(ListArgs),
    /// Write a copy of the container with polygons attached to the target table.
    Run(RunArgs),
}

#[derive(Debug, Args)]
pub struct ListArgs {
    #[arg(short = 'i', long = "input_file", env = "GEOFILL_INPUT")]
    pub input: PathBuf,

    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Source container, never modified.
    #[arg(short = 'i', long = "input_file", env = "GEOFILL_INPUT")]
    pub input: PathBuf,

    /// Destination container.
    #[arg(short = 'o', long = "output_file", env = "GEOFILL_OUTPUT")]
    pub output: PathBuf,

    /// Delimited table holding an identifier and a WKT polygon per row.
    #[arg(short = 'w', long = "wkt_file", env = "GEOFILL_WKT_FILE")]
    pub wkt_file: PathBuf,

    #[arg(long, env = "GEOFILL_TABLE", default_value = DEFAULT_TARGET_TABLE)]
    pub table: String,

    /// Source field matched against the external key.
    #[arg(long, env = "GEOFILL_JOIN_FIELD")]
    pub join_field: String,

    #[arg(long, env = "GEOFILL_KEY_COLUMN", default_value = DEFAULT_KEY_COLUMN)]
    pub key_column: String,

    /// 0-based key column position; overrides `--key-column`.
    #[arg(long, env = "GEOFILL_KEY_INDEX")]
    pub key_index: Option<usize>,

    #[arg(long, env = "GEOFILL_WKT_COLUMN", default_value = DEFAULT_WKT_COLUMN)]
    pub wkt_column: String,

    #[arg(long, env = "GEOFILL_GEOMETRY_COLUMN", default_value = DEFAULT_GEOMETRY_COLUMN)]
    pub geometry_column: String,

    #[arg(long, env = "GEOFILL_DELIMITER", default_value_t = ',')]
    pub delimiter: char,

    /// Match keys byte for byte instead of folding case and whitespace.
    #[arg(long, env = "GEOFILL_EXACT_KEYS")]
    pub exact_keys: bool,

    #[arg(long, env = "GEOFILL_OVERWRITE")]
    pub overwrite: bool,

    #[arg(long)]
    pub json: bool,
}

impl RunArgs {
    pub fn to_config(&self) -> Result<InjectConfig, CliError> {
        let delimiter = u8::try_from(self.delimiter)
            .ok()
            .filter(u8::is_ascii)
            .ok_or_else(|| {
                CliError::InvalidArgs(format!(
                    "delimiter must be a single ASCII character, got {:?}",
                    self.delimiter
                ))
            })?;

        let mut config = InjectConfig::new(
            &self.input,
            &self.output,
            &self.wkt_file,
            &self.join_field,
        );
        config.target_table_name = self.table.clone();
        config.external_key = match self.key_index {
            Some(index) => KeyColumn::Index(index),
            None => KeyColumn::Name(self.key_column.clone()),
        };
        config.wkt_column = self.wkt_column.clone();
        config.geometry_column = self.geometry_column.clone();
        config.delimiter = delimiter;
        config.normalization = if self.exact_keys {
            KeyNormalization::exact()
        } else {
            KeyNormalization::default()
        };
        config.overwrite = self.overwrite;
        Ok(config)
    }
}
