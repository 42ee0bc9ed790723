//! Executor inputs and outputs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Caller-chosen policy for rows that duplicate an existing record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateAction {
    /// Leave the existing record untouched.
    #[default]
    Skip,
    /// Update the matched record in place.
    Overwrite,
    /// Defer to a human; treated like `Skip` by the executor.
    Manual,
}

impl DuplicateAction {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Skip => "skip",
            Self::Overwrite => "overwrite",
            Self::Manual => "manual",
        }
    }
}

impl fmt::Display for DuplicateAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DuplicateAction {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "overwrite" => Ok(Self::Overwrite),
            "manual" => Ok(Self::Manual),
            _ => Err(ModelError::UnknownDuplicateAction(s.to_string())),
        }
    }
}

/// Outcome of one row in an execution run, for row-level reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowStatus {
    Imported,
    Skipped,
    Updated,
    Failed,
}

impl RowStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Imported => "imported",
            Self::Skipped => "skipped",
            Self::Updated => "updated",
            Self::Failed => "failed",
        }
    }
}

/// A row whose persistence write failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowFailure {
    pub row_index: usize,
    pub error: String,
}

/// Aggregate counts of an execution run.
///
/// `imported + skipped + updated + failed` equals the number of rows the
/// executor attempted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub imported: usize,
    pub skipped: usize,
    pub updated: usize,
    pub failed: usize,
    pub errors: Vec<RowFailure>,
    /// Per-row outcome in submission order.
    pub statuses: Vec<(usize, RowStatus)>,
    /// Set when a deadline stopped submission before every row was attempted.
    pub stopped_early: bool,
}

impl ExecutionResult {
    pub fn total(&self) -> usize {
        self.imported + self.skipped + self.updated + self.failed
    }

    pub fn record(&mut self, row_index: usize, status: RowStatus) {
        match status {
            RowStatus::Imported => self.imported += 1,
            RowStatus::Skipped => self.skipped += 1,
            RowStatus::Updated => self.updated += 1,
            RowStatus::Failed => self.failed += 1,
        }
        self.statuses.push((row_index, status));
    }

    pub fn record_failure(&mut self, row_index: usize, error: impl Into<String>) {
        self.record(row_index, RowStatus::Failed);
        self.errors.push(RowFailure {
            row_index,
            error: error.into(),
        });
    }

    pub fn error_for(&self, row_index: usize) -> Option<&str> {
        self.errors
            .iter()
            .find(|failure| failure.row_index == row_index)
            .map(|failure| failure.error.as_str())
    }
}
