//! Row validation and transformation.
//!
//! Each source row is coerced field by field against the fixed target
//! schema. Problems never abort a row: they are collected as
//! [`FieldError`](roster_model::FieldError)s so one pass reports every issue
//! in every row.

pub mod coerce;
pub mod datetime;
pub mod numeric;
pub mod report;
pub mod validator;

pub use coerce::coerce;
pub use datetime::{normalize_date, parse_date};
pub use report::{ValidationOutcome, ValidationSummary};
pub use validator::{RowValidator, validate_table};
