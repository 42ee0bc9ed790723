//! Column mapper for registrar spreadsheets.
//!
//! Guesses which source column feeds which [`TargetField`] using a pattern
//! dictionary and three confidence tiers, then assigns columns to fields
//! greedily so that every field is claimed by at most one column.
//!
//! [`TargetField`]: roster_model::TargetField

#![deny(unsafe_code)]

mod engine;
mod error;
mod patterns;
mod score;
mod state;
mod utils;

pub use engine::MappingEngine;
pub use error::MappingError;
pub use patterns::{PatternDictionary, field_patterns};
pub use score::{longest_common_substring, score_pair};
pub use state::{MappingState, MappingSummary, check_unique, missing_required};
pub use utils::normalize_text;
