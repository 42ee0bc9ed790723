use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Decoded spreadsheet input: headers plus rows of string cells aligned by
/// position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl SourceTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Rejects rows that have more cells than there are headers.
    ///
    /// Short rows are allowed; missing trailing cells read as empty.
    pub fn check_shape(&self) -> Result<(), ModelError> {
        for (row, cells) in self.rows.iter().enumerate() {
            if cells.len() > self.headers.len() {
                return Err(ModelError::RaggedRow {
                    row,
                    cells: cells.len(),
                    headers: self.headers.len(),
                });
            }
        }
        Ok(())
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn header_index(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }

    /// Cell at `(row, column)`, or `""` when the row is short.
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .map_or("", String::as_str)
    }
}
