//! Mapping engine implementation.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use rapidfuzz::distance::jaro_winkler::similarity as jaro_similarity;
use roster_model::mapping::CONFIDENCE_FUZZY;
use roster_model::{ColumnMapping, TargetField};

use crate::patterns::PatternDictionary;
use crate::score::score_pair;
use crate::utils::normalize_text;

/// Engine for mapping source column headers to target schema fields.
///
/// Every (header, field) pair is scored against the field's pattern
/// dictionary; the best tier per pair becomes a candidate. Candidates are
/// then assigned greedily, highest confidence first, skipping any whose
/// header or field is already claimed. A stronger match is therefore never
/// displaced by a weaker one for the same field.
///
/// # Example
///
/// ```
/// use roster_map::MappingEngine;
/// use roster_model::TargetField;
///
/// let engine = MappingEngine::new();
/// let mappings = engine.suggest(&["Visa Type".to_string(), "Notes".to_string()]);
/// assert_eq!(mappings[0].target_field, Some(TargetField::VisaType));
/// assert_eq!(mappings[1].target_field, None);
/// ```
#[derive(Debug, Clone)]
pub struct MappingEngine {
    dictionary: PatternDictionary,
    min_confidence: u8,
}

struct Candidate {
    column_idx: usize,
    field: TargetField,
    confidence: u8,
    /// Orders candidates within one confidence tier.
    similarity: f64,
}

impl Default for MappingEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MappingEngine {
    pub fn new() -> Self {
        Self {
            dictionary: PatternDictionary::build(),
            min_confidence: CONFIDENCE_FUZZY,
        }
    }

    /// Candidates scoring below `min_confidence` are left unmapped.
    pub fn with_min_confidence(mut self, min_confidence: u8) -> Self {
        self.min_confidence = min_confidence.max(1);
        self
    }

    pub fn min_confidence(&self) -> u8 {
        self.min_confidence
    }

    /// Returns one mapping per header, in header order.
    ///
    /// Blank headers are never candidates and come back unmapped.
    pub fn suggest(&self, headers: &[String]) -> Vec<ColumnMapping> {
        let normalized: Vec<String> = headers.iter().map(|h| normalize_text(h)).collect();

        let mut candidates = Vec::new();
        for (column_idx, header) in normalized.iter().enumerate() {
            if header.is_empty() {
                continue;
            }
            for (field, patterns) in self.dictionary.iter() {
                let Some((confidence, similarity)) = best_pattern_score(header, patterns) else {
                    continue;
                };
                if confidence < self.min_confidence {
                    continue;
                }
                candidates.push(Candidate {
                    column_idx,
                    field,
                    confidence,
                    similarity,
                });
            }
        }

        candidates.sort_by(|a, b| {
            b.confidence
                .cmp(&a.confidence)
                .then_with(|| {
                    b.similarity
                        .partial_cmp(&a.similarity)
                        .unwrap_or(Ordering::Equal)
                })
                .then_with(|| a.column_idx.cmp(&b.column_idx))
                .then_with(|| a.field.cmp(&b.field))
        });

        let mut mappings: Vec<ColumnMapping> =
            headers.iter().map(ColumnMapping::unmapped).collect();
        let mut assigned_fields = BTreeSet::new();
        let mut assigned_columns = BTreeSet::new();
        for candidate in candidates {
            if assigned_fields.contains(&candidate.field)
                || assigned_columns.contains(&candidate.column_idx)
            {
                continue;
            }
            assigned_fields.insert(candidate.field);
            assigned_columns.insert(candidate.column_idx);
            let mapping = &mut mappings[candidate.column_idx];
            mapping.target_field = Some(candidate.field);
            mapping.confidence = candidate.confidence;
        }
        mappings
    }

    /// Best tier a single header reaches for a single field.
    pub fn score(&self, header: &str, field: TargetField) -> u8 {
        let header = normalize_text(header);
        best_pattern_score(&header, self.dictionary.patterns(field)).map_or(0, |(score, _)| score)
    }
}

/// Highest tier over all patterns, with the Jaro-Winkler similarity of the
/// pattern that reached it. `None` when nothing matches.
fn best_pattern_score(header: &str, patterns: &[String]) -> Option<(u8, f64)> {
    let mut best: Option<(u8, f64)> = None;
    for pattern in patterns {
        let score = score_pair(header, pattern);
        if score == 0 {
            continue;
        }
        let similarity = jaro_similarity(header.chars(), pattern.chars());
        best = match best {
            Some((best_score, best_sim))
                if best_score > score || (best_score == score && best_sim >= similarity) =>
            {
                Some((best_score, best_sim))
            }
            _ => Some((score, similarity)),
        };
    }
    best
}
