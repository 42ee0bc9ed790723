use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("invalid tenant id: {0:?}")]
    InvalidTenantId(String),
    #[error("unknown target field: {0}")]
    UnknownField(String),
    #[error("row {row} has {cells} cells but the table has {headers} headers")]
    RaggedRow {
        row: usize,
        cells: usize,
        headers: usize,
    },
    #[error("unknown duplicate action: {0}")]
    UnknownDuplicateAction(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
