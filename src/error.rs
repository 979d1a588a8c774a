use std::path::PathBuf;

use thiserror::Error;

use crate::source::SourceId;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("missing source file for {chart} at {}", path.display())]
    MissingSource { chart: SourceId, path: PathBuf },

    #[error("malformed source {}: {reason}", path.display())]
    MalformedSource { path: PathBuf, reason: String },

    #[error("invalid census year label {label:?} in {chart}")]
    InvalidYearFormat { chart: SourceId, label: String },

    #[error("row {row}: no {dimension} entry for key {key:?}")]
    UnresolvedForeignKey {
        row: usize,
        dimension: &'static str,
        key: String,
    },

    #[error("{dimension} dimension is empty: unified table has no rows")]
    EmptyDimension { dimension: &'static str },

    #[error("{dimension} dimension key {key:?} is produced by more than one pair")]
    DuplicateDimensionKey {
        dimension: &'static str,
        key: String,
    },

    #[error("table {table} does not match its sink schema: {reason}")]
    SinkSchemaMismatch { table: String, reason: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error on {}: {err}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    pub(crate) fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        PipelineError::Io {
            path: path.into(),
            err,
        }
    }

    pub(crate) fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        PipelineError::MalformedSource {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
