//! Number and date formatting shared by every screen.

use crate::models::parse_timestamp;

/// Dollar amount with two decimals: `12.5` renders as `$12.50`.
pub fn format_currency(value: f64) -> String {
    format_dollars(value, 2)
}

/// Per-share dividend rate with four decimals: `0.25` renders as `$0.2500`.
pub fn format_dividend_rate(value: f64) -> String {
    format_dollars(value, 4)
}

fn format_dollars(value: f64, decimals: usize) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    let rendered = format!("{:.*}", decimals, value.abs());
    // -0.001 rounds to zero and must not print as "-$0.00".
    if value < 0.0 && rendered.chars().any(|c| c.is_ascii_digit() && c != '0') {
        format!("-${}", rendered)
    } else {
        format!("${}", rendered)
    }
}

/// Share counts are shown as whole numbers, with halves rounding up.
pub fn format_quantity(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    // floor(x + 0.5) never yields -0, so "-0" cannot appear.
    format!("{:.0}", (value + 0.5).floor())
}

pub fn format_percentage(value: f64) -> String {
    format!("{:.2}%", value)
}

/// Percentage with an explicit sign for gains.
pub fn format_signed_percent(value: f64) -> String {
    if value >= 0.0 {
        format!("+{:.2}%", value)
    } else {
        format!("{:.2}%", value)
    }
}

/// Calendar date of a backend timestamp, or `N/A` when absent or unparseable.
pub fn format_date(raw: Option<&str>) -> String {
    raw.and_then(parse_timestamp)
        .map(|ts| ts.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "N/A".to_string())
}
