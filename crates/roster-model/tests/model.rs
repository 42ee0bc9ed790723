//! Tests for roster-model types.

use std::collections::BTreeMap;

use roster_model::{
    ColumnMapping, ConfidenceLevel, DuplicateMatch, FieldValue, MatchField, RecordId,
    TargetField, ValidatedRow,
};

#[test]
fn column_mapping_serializes_with_camel_case_keys() {
    let mapping = ColumnMapping::suggested("Visa Type", TargetField::VisaType, 100);
    let json = serde_json::to_value(&mapping).expect("serialize mapping");
    assert_eq!(json["sourceColumn"], "Visa Type");
    assert_eq!(json["targetField"], "visaType");
    assert_eq!(json["confidence"], 100);
    assert_eq!(json["manuallyOverridden"], false);
}

#[test]
fn unmapped_column_serializes_null_target() {
    let json = serde_json::to_value(ColumnMapping::unmapped("Notes")).expect("serialize");
    assert!(json["targetField"].is_null());
    assert_eq!(json["confidence"], 0);
}

#[test]
fn confidence_levels_follow_tiers() {
    assert_eq!(ConfidenceLevel::from_score(100), Some(ConfidenceLevel::Exact));
    assert_eq!(ConfidenceLevel::from_score(90), Some(ConfidenceLevel::Partial));
    assert_eq!(ConfidenceLevel::from_score(75), Some(ConfidenceLevel::Fuzzy));
    assert_eq!(ConfidenceLevel::from_score(74), None);
    assert_eq!(ConfidenceLevel::from_score(0), None);
}

#[test]
fn validated_row_round_trips_through_json() {
    let mut fields = BTreeMap::new();
    fields.insert(
        TargetField::VisaExpiry,
        Some(FieldValue::Date(
            chrono::NaiveDate::from_ymd_opt(2025, 2, 28).expect("valid date"),
        )),
    );
    fields.insert(TargetField::Phone, None);
    let row = ValidatedRow {
        row_index: 7,
        fields,
        errors: vec![],
        duplicate: Some(DuplicateMatch {
            existing_record_id: RecordId::new(12),
            existing_display_name: "TRAN THI MAI".to_string(),
            match_field: MatchField::Registration,
        }),
    };
    let json = serde_json::to_string(&row).expect("serialize row");
    assert!(json.contains("\"2025-02-28\""));
    let round: ValidatedRow = serde_json::from_str(&json).expect("deserialize row");
    assert_eq!(round, row);
}
