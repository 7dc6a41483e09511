//! Header and cell-value mapping: the worksheet grid turns into named,
//! stringly-typed record fields here.

use std::collections::{BTreeMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static NON_ALNUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-zA-Z0-9]+").unwrap());

const DATE_KEYWORDS: &[&str] = &[
    "date", "time", "created", "updated", "modified", "expires", "due", "deadline",
];

/// 0-based column index to an Excel column letter (A, B, ..., Z, AA, AB, ...).
pub fn column_label(col_index: usize) -> String {
    let mut label = String::new();
    let mut n = col_index + 1;
    while n > 0 {
        n -= 1;
        label.insert(0, (b'A' + (n % 26) as u8) as char);
        n /= 26;
    }
    label
}

/// SQL-compliant form of a column name: ASCII only, non-alphanumerics
/// collapsed to `_`, lowercase, `_`-prefixed when starting with a digit.
/// An empty result falls back to `column`.
pub fn normalize_column_name(name: &str) -> String {
    let ascii: String = name.chars().filter(|c| c.is_ascii()).collect();
    let replaced = NON_ALNUM.replace_all(&ascii, "_");
    let trimmed = replaced.trim_matches('_');
    let mut normalized = if trimmed
        .chars()
        .next()
        .map(|c| c.is_ascii_digit())
        .unwrap_or(false)
    {
        format!("_{}", trimmed)
    } else {
        trimmed.to_string()
    };
    normalized.make_ascii_lowercase();
    if normalized.is_empty() {
        "column".to_string()
    } else {
        normalized
    }
}

/// A repeated header gains a suffix from its cell position, so the second
/// `id` in column D becomes `id_D1`. Blank headers stay blank.
pub fn deduplicate_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut result = Vec::with_capacity(headers.len());
    for (idx, header) in headers.into_iter().enumerate() {
        if header.is_empty() {
            result.push(header);
            continue;
        }
        if seen.contains(&header) {
            result.push(format!("{}_{}1", header, column_label(idx)));
        } else {
            seen.insert(header.clone());
            result.push(header);
        }
    }
    result
}

/// Header row of raw cells into the processed header list plus the
/// index-to-name mapping used for record building. Blank headers are kept
/// positionally in the list but excluded from the mapping.
pub fn process_headers(
    raw: &[Value],
    names_conversion: bool,
) -> (Vec<String>, BTreeMap<usize, String>) {
    let headers: Vec<String> = raw
        .iter()
        .map(|cell| {
            let text = cell_text(cell);
            if names_conversion && !text.is_empty() {
                normalize_column_name(&text)
            } else {
                text
            }
        })
        .collect();
    let headers = deduplicate_headers(headers);
    let mapping = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| !h.is_empty())
        .map(|(idx, h)| (idx, h.clone()))
        .collect();
    (headers, mapping)
}

/// Excel stores dates as days since 1899-12-30 and pretends 1900 was a leap
/// year; serials from the phantom 1900-02-29 onward shift back by one day.
pub fn excel_serial_to_date(serial: f64) -> Option<String> {
    let mut days = serial;
    if days >= 60.0 {
        days -= 1.0;
    }
    let epoch = chrono::NaiveDate::from_ymd_opt(1899, 12, 30)?;
    let date = epoch.checked_add_signed(chrono::Duration::days(days as i64))?;
    Some(date.format("%Y-%m-%d").to_string())
}

/// Name-based heuristic for columns likely to hold Excel date serials.
pub fn is_date_column(column_name: &str) -> bool {
    let lower = column_name.to_lowercase();
    DATE_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

/// One cell into a record value. Blank cells disappear; integral serials in
/// date-named columns become ISO dates when `parse_dates` is on; everything
/// else stringifies.
pub fn parse_cell_value(value: &Value, column_name: &str, parse_dates: bool) -> Option<String> {
    let text = cell_text(value);
    if text.is_empty() {
        return None;
    }
    if parse_dates && is_date_column(column_name) {
        if let Ok(serial) = text.parse::<f64>() {
            if (1.0..=100_000.0).contains(&serial) && serial.fract() == 0.0 {
                if let Some(date) = excel_serial_to_date(serial) {
                    return Some(date);
                }
            }
        }
    }
    Some(text)
}

pub fn is_blank_row(row: &[Value]) -> bool {
    row.iter().all(|cell| cell_text(cell).is_empty())
}

fn cell_text(cell: &Value) -> String {
    match cell {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}
