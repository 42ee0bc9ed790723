//! Numeric normalization utilities.

/// Parses a string as a finite f64, returning None for invalid or empty strings.
pub fn parse_f64(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parses a percentage, accepting an optional trailing `%`.
pub fn parse_percentage(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    parse_f64(trimmed.strip_suffix('%').unwrap_or(trimmed))
}

/// Formats a floating-point number as a string without trailing zeros.
pub fn format_numeric(v: f64) -> String {
    let s = format!("{v}");
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    }
}
