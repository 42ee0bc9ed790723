//! Error types for CSV ingestion.

use std::path::PathBuf;

use roster_model::ModelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("CSV file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("file too large: {path} ({size} bytes, max {max_size} bytes)")]
    FileTooLarge {
        path: PathBuf,
        size: u64,
        max_size: u64,
    },

    #[error("unsupported encoding {encoding} in {path}; save the file as UTF-8")]
    UnsupportedEncoding {
        path: PathBuf,
        encoding: &'static str,
    },

    #[error("failed to parse CSV {source_name}: {source}")]
    CsvParse {
        source_name: String,
        #[source]
        source: csv::Error,
    },

    #[error("CSV {source_name} has no header row")]
    MissingHeader { source_name: String },

    #[error("CSV {source_name} has an inconsistent shape")]
    Shape {
        source_name: String,
        #[source]
        source: ModelError,
    },
}

pub type Result<T> = std::result::Result<T, IngestError>;
