//! CSV reading.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;

use csv::{ReaderBuilder, Trim};
use roster_model::SourceTable;
use tracing::{debug, warn};

use crate::error::{IngestError, Result};

/// Maximum file size accepted by [`read_table`] (50 MB).
pub const MAX_CSV_FILE_SIZE: u64 = 50 * 1024 * 1024;

const UTF8_BOM: char = '\u{feff}';
const CANDIDATE_DELIMITERS: [u8; 3] = [b',', b';', b'\t'];

#[derive(Debug, Clone, Copy)]
pub struct CsvOptions {
    /// Field delimiter; detected from the header line when `None`.
    pub delimiter: Option<u8>,
    pub max_file_size: u64,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            max_file_size: MAX_CSV_FILE_SIZE,
        }
    }
}

/// Reads a CSV file with default options.
pub fn read_table(path: &Path) -> Result<SourceTable> {
    read_table_with_options(path, CsvOptions::default())
}

pub fn read_table_with_options(path: &Path, options: CsvOptions) -> Result<SourceTable> {
    let metadata = fs::metadata(path).map_err(|e| file_error(path, e))?;
    if metadata.len() > options.max_file_size {
        return Err(IngestError::FileTooLarge {
            path: path.to_path_buf(),
            size: metadata.len(),
            max_size: options.max_file_size,
        });
    }

    let mut bytes = Vec::with_capacity(metadata.len().try_into().unwrap_or_default());
    File::open(path)
        .and_then(|mut file| file.read_to_end(&mut bytes))
        .map_err(|e| file_error(path, e))?;

    if bytes.starts_with(&[0xFF, 0xFE]) || bytes.starts_with(&[0xFE, 0xFF]) {
        let encoding = if bytes[0] == 0xFF { "UTF-16 LE" } else { "UTF-16 BE" };
        return Err(IngestError::UnsupportedEncoding {
            path: path.to_path_buf(),
            encoding,
        });
    }

    let source_name = path.display().to_string();
    let table = read_table_from_reader(bytes.as_slice(), &source_name, options)?;
    debug!(
        path = %path.display(),
        columns = table.headers.len(),
        rows = table.row_count(),
        "read CSV table"
    );
    Ok(table)
}

/// Reads CSV data from any reader.
///
/// Headers are trimmed and a leading UTF-8 BOM is dropped. Cells are kept
/// verbatim. Blank lines are skipped, empty cells past the last header are
/// dropped, and rows with more non-empty cells than headers are rejected.
///
/// Rows are numbered by position in the returned table, so a skipped blank
/// line does not take a row index.
pub fn read_table_from_reader<R: Read>(
    mut reader: R,
    source_name: &str,
    options: CsvOptions,
) -> Result<SourceTable> {
    let mut text = String::new();
    reader
        .read_to_string(&mut text)
        .map_err(|source| IngestError::CsvParse {
            source_name: source_name.to_string(),
            source: csv::Error::from(source),
        })?;
    let text = text.strip_prefix(UTF8_BOM).unwrap_or(&text);

    let delimiter = options
        .delimiter
        .unwrap_or_else(|| detect_delimiter(text.lines().next().unwrap_or("")));

    let mut csv = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(delimiter)
        .trim(Trim::Headers)
        .from_reader(text.as_bytes());

    let parse_error = |source| IngestError::CsvParse {
        source_name: source_name.to_string(),
        source,
    };

    let headers: Vec<String> = csv
        .headers()
        .map_err(parse_error)?
        .iter()
        .map(str::to_string)
        .collect();
    if headers.iter().all(|header| header.is_empty()) {
        return Err(IngestError::MissingHeader {
            source_name: source_name.to_string(),
        });
    }

    let mut rows = Vec::new();
    for record in csv.records() {
        let record = record.map_err(parse_error)?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        let mut cells: Vec<String> = record.iter().map(str::to_string).collect();
        while cells.len() > headers.len() && cells.last().is_some_and(String::is_empty) {
            cells.pop();
        }
        rows.push(cells);
    }

    if headers.iter().any(String::is_empty) {
        warn!(source = source_name, "CSV has blank column headers");
    }

    let table = SourceTable::new(headers, rows);
    table.check_shape().map_err(|source| IngestError::Shape {
        source_name: source_name.to_string(),
        source,
    })?;
    Ok(table)
}

/// Picks the candidate delimiter that occurs most often outside quotes in
/// the header line, defaulting to a comma.
pub fn detect_delimiter(header_line: &str) -> u8 {
    let mut counts = [0usize; CANDIDATE_DELIMITERS.len()];
    let mut in_quotes = false;
    for byte in header_line.bytes() {
        if byte == b'"' {
            in_quotes = !in_quotes;
            continue;
        }
        if in_quotes {
            continue;
        }
        if let Some(pos) = CANDIDATE_DELIMITERS.iter().position(|d| *d == byte) {
            counts[pos] += 1;
        }
    }
    CANDIDATE_DELIMITERS
        .iter()
        .zip(counts)
        .filter(|(_, count)| *count > 0)
        .max_by_key(|(_, count)| *count)
        .map_or(b',', |(delimiter, _)| *delimiter)
}

fn file_error(path: &Path, error: io::Error) -> IngestError {
    if error.kind() == io::ErrorKind::NotFound {
        IngestError::FileNotFound {
            path: path.to_path_buf(),
        }
    } else {
        IngestError::FileRead {
            path: path.to_path_buf(),
            source: error,
        }
    }
}
