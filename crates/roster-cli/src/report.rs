//! Row-indexed CSV reports, so operators can fix and re-upload only the
//! affected rows.
//!
//! `row_index` counts data rows from 0, skipping blank lines: the first
//! non-blank row under the header is row 0, whatever its line number in
//! the file.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use roster_model::{ExecutionResult, RowClass, ValidatedRow};
use roster_validate::ValidationOutcome;
use serde::Serialize;

/// One report line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowReport {
    /// Position among the non-blank data rows, from 0.
    pub row_index: usize,
    pub status: String,
    pub error: String,
}

impl RowReport {
    fn from_validated(row: &ValidatedRow) -> Self {
        let class = row.classify();
        let (status, error) = match class {
            RowClass::Valid => ("valid", String::new()),
            RowClass::Error => ("error", row.error_summary()),
            RowClass::Duplicate => (
                "duplicate",
                row.duplicate
                    .as_ref()
                    .map(|dup| {
                        format!("matches {} by {}", dup.existing_record_id, dup.match_field)
                    })
                    .unwrap_or_default(),
            ),
        };
        Self {
            row_index: row.row_index,
            status: status.to_string(),
            error,
        }
    }
}

/// Report lines of a validation run, in source row order.
pub fn validation_rows(outcome: &ValidationOutcome) -> Vec<RowReport> {
    outcome
        .rows()
        .into_iter()
        .map(RowReport::from_validated)
        .collect()
}

/// Report lines of an execution run, in submission order.
pub fn execution_rows(result: &ExecutionResult) -> Vec<RowReport> {
    result
        .statuses
        .iter()
        .map(|(row_index, status)| RowReport {
            row_index: *row_index,
            status: status.as_str().to_string(),
            error: result.error_for(*row_index).unwrap_or_default().to_string(),
        })
        .collect()
}

pub fn write_rows<W: Write>(writer: W, rows: &[RowReport]) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for row in rows {
        csv.serialize(row).context("write report row")?;
    }
    csv.flush().context("flush report")?;
    Ok(())
}

pub fn write_report(path: &Path, rows: &[RowReport]) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("create report {}", path.display()))?;
    write_rows(file, rows).with_context(|| format!("write report {}", path.display()))
}
