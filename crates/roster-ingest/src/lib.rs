//! Decoding of registrar CSV exports into a [`SourceTable`].
//!
//! Every cell is kept as the string the file contained; typing happens in
//! the validator.
//!
//! [`SourceTable`]: roster_model::SourceTable

pub mod error;
pub mod reader;

pub use error::{IngestError, Result};
pub use reader::{
    CsvOptions, MAX_CSV_FILE_SIZE, detect_delimiter, read_table, read_table_from_reader,
    read_table_with_options,
};
