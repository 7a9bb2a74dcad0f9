//! Property value formatting
//!
//! Turns raw property values into display strings according to their
//! declared [`PropertyType`]. Lenient by design: the UI must never crash on
//! partial plan data, so every recognized key produces *some* string and the
//! only hard failure is a structurally malformed key.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::models::constants::BLOCK_SIZE;
use super::props::{self, PropertyType};
use crate::utils::{FormatError, FormatResult};

/// Rendered in place of an absent value, never the string `"undefined"`.
pub const EMPTY_MARKER: &str = "-";

/// Keys outside the closed model are accepted when they look like a
/// plausible engine-specific property name.
static DYNAMIC_KEY_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9 ()*/_.-]*$").unwrap());

/// Format one property value for display.
///
/// `value: None` (or JSON null) renders as [`EMPTY_MARKER`]. Fails only when
/// `key` is structurally malformed: empty, or not a plausible property name.
pub fn format(key: &str, value: Option<&Value>) -> FormatResult<String> {
    if !DYNAMIC_KEY_REGEX.is_match(key) {
        return Err(FormatError::malformed_key(key));
    }

    let Some(value) = value else {
        return Ok(EMPTY_MARKER.to_string());
    };
    if value.is_null() {
        return Ok(EMPTY_MARKER.to_string());
    }

    let formatted = match props::type_of(key) {
        PropertyType::Duration => numeric(value).map(format_duration),
        PropertyType::Cost => numeric(value).map(format_cost),
        PropertyType::Rows => numeric(value).map(|n| group_digits(n.round() as u64)),
        PropertyType::Bytes => numeric(value).map(|n| format_bytes(n.max(0.0) as u64)),
        PropertyType::Blocks => {
            numeric(value).map(|n| format_bytes((n.max(0.0) as u64).saturating_mul(BLOCK_SIZE)))
        }
        PropertyType::Factor => numeric(value).map(|n| format!("{:.2}", n)),
        PropertyType::Percent => numeric(value).map(format_percent),
        PropertyType::List => format_list(value),
        PropertyType::Keys => format_keys(value),
        PropertyType::Boolean => value.as_bool().map(|b| b.to_string()),
        PropertyType::Text => None,
    };

    // Values that do not match their declared type fall back to a verbatim
    // rendering rather than failing.
    Ok(formatted.unwrap_or_else(|| verbatim(value)))
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', "").parse().ok(),
        _ => None,
    }
}

fn verbatim(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Adaptive ms/s duration with fixed 3-decimal precision.
///
/// Zero is a measurement, not an absence: it renders `"0.000 ms"`.
pub fn format_duration(ms: f64) -> String {
    if ms >= 1000.0 {
        format!("{:.3} s", ms / 1000.0)
    } else {
        format!("{:.3} ms", ms)
    }
}

pub fn format_cost(cost: f64) -> String {
    format!("{:.2}", cost)
}

fn format_percent(p: f64) -> String {
    if p.fract() == 0.0 {
        format!("{}%", p as i64)
    } else {
        format!("{:.2}%", p)
    }
}

/// Adaptive binary-prefix byte count.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.2} {}", size, UNITS[unit_index])
    }
}

/// Integer with thousands separators.
pub fn group_digits(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn format_list(value: &Value) -> Option<String> {
    match value {
        Value::Array(items) => Some(
            items
                .iter()
                .map(|v| match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(", "),
        ),
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

/// Key sets go through [`ordered_key_set`]: the array entries are the
/// declared grouping keys, kept in declaration order with duplicates
/// dropped.
fn format_keys(value: &Value) -> Option<String> {
    match value {
        Value::Array(items) => {
            let declared: Vec<String> = items
                .iter()
                .map(|v| match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect();
            Some(ordered_key_set(&declared, &[]))
        }
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

/// Deterministic ordering for a key set: declared grouping keys first, in
/// declaration order, then any remaining keys alphabetically.
///
/// The result doubles as a lookup key for the detail view, so the ordering
/// is contractual, not cosmetic. Duplicates keep their first occurrence.
pub fn ordered_key_set(declared: &[String], extra: &[String]) -> String {
    let mut ordered: Vec<&str> = Vec::with_capacity(declared.len() + extra.len());
    for key in declared {
        if !ordered.contains(&key.as_str()) {
            ordered.push(key);
        }
    }
    let mut rest: Vec<&str> = extra
        .iter()
        .map(String::as_str)
        .filter(|k| !ordered.contains(k))
        .collect();
    rest.sort_unstable();
    rest.dedup();
    ordered.extend(rest);
    ordered.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn duration_zero_is_visible() {
        assert_eq!(
            format(props::keys::ACTUAL_TOTAL_TIME, Some(&json!(0))).unwrap(),
            "0.000 ms"
        );
    }

    #[test]
    fn duration_absent_is_empty_marker() {
        assert_eq!(
            format(props::keys::ACTUAL_TOTAL_TIME, None).unwrap(),
            EMPTY_MARKER
        );
        assert_eq!(
            format(props::keys::ACTUAL_TOTAL_TIME, Some(&json!(null))).unwrap(),
            EMPTY_MARKER
        );
    }

    #[test]
    fn duration_adapts_units() {
        assert_eq!(
            format(props::keys::ACTUAL_TOTAL_TIME, Some(&json!(12.3456))).unwrap(),
            "12.346 ms"
        );
        assert_eq!(
            format(props::keys::ACTUAL_TOTAL_TIME, Some(&json!(1500.0))).unwrap(),
            "1.500 s"
        );
    }

    #[test]
    fn blocks_render_as_binary_bytes() {
        // 256 blocks * 8 KiB = 2 MiB
        assert_eq!(
            format(props::keys::SHARED_READ_BLOCKS, Some(&json!(256))).unwrap(),
            "2.00 MB"
        );
    }

    #[test]
    fn rows_are_grouped() {
        assert_eq!(
            format(props::keys::ACTUAL_ROWS, Some(&json!(1234567))).unwrap(),
            "1,234,567"
        );
        assert_eq!(group_digits(999), "999");
        assert_eq!(group_digits(1000), "1,000");
    }

    #[test]
    fn list_joins_with_commas() {
        assert_eq!(
            format(props::keys::OUTPUT, Some(&json!(["id", "name"]))).unwrap(),
            "id, name"
        );
    }

    #[test]
    fn key_set_format_dedups_and_keeps_declaration_order() {
        assert_eq!(
            format(
                props::keys::SORT_KEY,
                Some(&json!(["zone", "account", "zone"]))
            )
            .unwrap(),
            "zone, account"
        );
    }

    #[test]
    fn key_set_ordering_is_deterministic() {
        let declared = vec![
            "tenant_id".to_string(),
            "created_at".to_string(),
            "tenant_id".to_string(),
        ];
        let extra = vec![
            "zone".to_string(),
            "account".to_string(),
            "tenant_id".to_string(),
        ];
        assert_eq!(
            ordered_key_set(&declared, &extra),
            "tenant_id, created_at, account, zone"
        );
    }

    #[test]
    fn unknown_key_renders_verbatim() {
        assert_eq!(
            format("Custom Engine Counter", Some(&json!("abc"))).unwrap(),
            "abc"
        );
    }

    #[test]
    fn malformed_key_is_a_hard_error() {
        assert!(matches!(
            format("", Some(&json!(1))),
            Err(FormatError::MalformedKey { .. })
        ));
        assert!(matches!(
            format("\u{7f}bad\nkey", Some(&json!(1))),
            Err(FormatError::MalformedKey { .. })
        ));
    }

    #[test]
    fn mistyped_value_falls_back_verbatim() {
        // A duration key carrying a non-numeric string must still render.
        assert_eq!(
            format(props::keys::ACTUAL_TOTAL_TIME, Some(&json!("n/a"))).unwrap(),
            "n/a"
        );
    }
}
