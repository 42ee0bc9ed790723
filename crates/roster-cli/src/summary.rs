use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use roster_map::MappingState;
use roster_model::{
    ColumnMapping, ConfidenceLevel, ExecutionResult, FieldKind, RowClass, SCHEMA, ValidatedRow,
};
use roster_validate::ValidationOutcome;

pub fn print_schema() {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Field"),
        header_cell("Label"),
        header_cell("Kind"),
        header_cell("Required"),
        header_cell("Values"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 3, CellAlignment::Center);
    for spec in &SCHEMA {
        let required = if spec.required {
            Cell::new("yes").fg(Color::Yellow)
        } else {
            dim_cell("-")
        };
        table.add_row(vec![
            Cell::new(spec.field.as_str()).fg(Color::Blue),
            Cell::new(spec.label),
            Cell::new(kind_label(&spec.kind)),
            required,
            values_cell(&spec.kind),
        ]);
    }
    println!("{table}");
}

pub fn print_mapping(state: &MappingState) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Column"),
        header_cell("Field"),
        header_cell("Confidence"),
        header_cell("Source"),
        header_cell("Review"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Center);
    for mapping in state.mappings() {
        table.add_row(mapping_row(mapping));
    }
    println!("{table}");

    let summary = state.summary();
    println!(
        "Mapped {} of {} columns; {} of {} required fields covered.",
        summary.mapped, summary.columns, summary.required_mapped, summary.required_total
    );
    let missing = state.missing_required();
    if !missing.is_empty() {
        let labels: Vec<&str> = missing.iter().map(|field| field.label()).collect();
        eprintln!("Missing required fields: {}", labels.join(", "));
    }
}

fn mapping_row(mapping: &ColumnMapping) -> Vec<Cell> {
    let Some(field) = mapping.target_field else {
        return vec![
            Cell::new(&mapping.source_column),
            dim_cell("(unmapped)"),
            dim_cell("-"),
            source_cell(mapping.manually_overridden),
            dim_cell("-"),
        ];
    };
    let color = match mapping.level() {
        Some(ConfidenceLevel::Exact) => Color::Green,
        Some(ConfidenceLevel::Partial) => Color::Yellow,
        Some(ConfidenceLevel::Fuzzy) | None => Color::Red,
    };
    let review = match mapping.level() {
        _ if mapping.manually_overridden => dim_cell("confirmed"),
        Some(level) => Cell::new(level.description()).fg(color),
        None => dim_cell("-"),
    };
    vec![
        Cell::new(&mapping.source_column),
        Cell::new(field.as_str()).fg(Color::Blue),
        Cell::new(mapping.confidence).fg(color),
        source_cell(mapping.manually_overridden),
        review,
    ]
}

pub fn print_validation(outcome: &ValidationOutcome) {
    let summary = &outcome.summary;
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Rows"),
        header_cell("Valid"),
        header_cell("Errors"),
        header_cell("Duplicates"),
    ]);
    apply_summary_table_style(&mut table);
    for index in 0..4 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    table.add_row(vec![
        Cell::new(summary.total).add_attribute(Attribute::Bold),
        count_cell(Some(summary.valid), Color::Green),
        count_cell(Some(summary.errors), Color::Red),
        count_cell(Some(summary.duplicates), Color::Yellow),
    ]);
    println!("{table}");
    print_row_table(outcome);
}

fn print_row_table(outcome: &ValidationOutcome) {
    let rows: Vec<&ValidatedRow> = outcome
        .rows()
        .into_iter()
        .filter(|row| row.classify() != RowClass::Valid)
        .collect();
    if rows.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Row"),
        header_cell("Status"),
        header_cell("Detail"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    align_column(&mut table, 1, CellAlignment::Center);
    for row in rows {
        let (status, detail) = match &row.duplicate {
            Some(dup) if !row.has_errors() => (
                Cell::new("DUPLICATE").fg(Color::Yellow),
                format!("matches {} by {}", dup.existing_record_id, dup.match_field),
            ),
            _ => (Cell::new("ERROR").fg(Color::Red), row.error_summary()),
        };
        table.add_row(vec![Cell::new(row.row_index), status, Cell::new(detail)]);
    }
    println!("{table}");
}

pub fn print_execution(result: &ExecutionResult) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Imported"),
        header_cell("Updated"),
        header_cell("Skipped"),
        header_cell("Failed"),
        header_cell("Total"),
    ]);
    apply_summary_table_style(&mut table);
    for index in 0..5 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    table.add_row(vec![
        count_cell(Some(result.imported), Color::Green),
        count_cell(Some(result.updated), Color::Blue),
        count_cell(Some(result.skipped), Color::Yellow),
        count_cell(Some(result.failed), Color::Red),
        Cell::new(result.total()).add_attribute(Attribute::Bold),
    ]);
    println!("{table}");
    if result.stopped_early {
        eprintln!("Stopped at the deadline; rows not listed above were not submitted.");
    }
    if !result.errors.is_empty() {
        eprintln!("Failed rows:");
        for failure in &result.errors {
            eprintln!("- row {}: {}", failure.row_index, failure.error);
        }
    }
}

/// Mappings and summary counts as one JSON document.
pub fn mapping_json(state: &MappingState) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&serde_json::json!({
        "mappings": state.mappings(),
        "summary": state.summary(),
    }))
}

fn values_cell(kind: &FieldKind) -> Cell {
    match kind {
        FieldKind::Enum(domain) => Cell::new(domain.tokens().collect::<Vec<_>>().join(", ")),
        FieldKind::Scale { max } => Cell::new(format!("0 to {max}")),
        FieldKind::Percentage => Cell::new("0 to 100"),
        _ => dim_cell("-"),
    }
}

fn kind_label(kind: &FieldKind) -> &'static str {
    match kind {
        FieldKind::Text => "text",
        FieldKind::Enum(_) => "enum",
        FieldKind::Date => "date",
        FieldKind::Percentage => "percentage",
        FieldKind::Scale { .. } => "scale",
        FieldKind::Email => "email",
        FieldKind::Passthrough => "passthrough",
    }
}

fn source_cell(manual: bool) -> Cell {
    if manual {
        Cell::new("manual").fg(Color::Magenta)
    } else {
        dim_cell("auto")
    }
}

fn count_cell(count: Option<usize>, color: Color) -> Cell {
    match count {
        Some(value) if value > 0 => Cell::new(value).fg(color).add_attribute(Attribute::Bold),
        Some(value) => dim_cell(value),
        None => dim_cell("-"),
    }
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
