//! Lenient property parsers
//!
//! CRM property values arrive as strings (occasionally numbers or null).
//! Every parser here degrades to `None` instead of failing.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};

/// Text property; numbers and booleans are rendered, null and absent are `None`
pub fn text(properties: &Map<String, Value>, key: &str) -> Option<String> {
    match properties.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Finite floating-point property; empty strings and garbage are `None`
pub fn float(properties: &Map<String, Value>, key: &str) -> Option<f64> {
    let parsed = match properties.get(key)? {
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            s.parse::<f64>().ok()?
        }
        Value::Number(n) => n.as_f64()?,
        _ => return None,
    };
    parsed.is_finite().then_some(parsed)
}

/// Integer property, `0` when absent, empty or unparseable
pub fn count(properties: &Map<String, Value>, key: &str) -> i64 {
    match properties.get(key) {
        Some(Value::String(s)) => s.trim().parse::<i64>().unwrap_or(0),
        Some(Value::Number(n)) => n.as_i64().unwrap_or(0),
        _ => 0,
    }
}

/// Timestamp property normalized to UTC
///
/// Accepts RFC 3339 (`2024-03-31T12:00:00Z`, offsets converted), naive
/// date-times (taken as UTC) and bare dates (midnight UTC).
pub fn timestamp(properties: &Map<String, Value>, key: &str) -> Option<DateTime<Utc>> {
    match properties.get(key)? {
        Value::String(s) => parse_timestamp(s),
        _ => None,
    }
}

pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;
    use test_case::test_case;

    fn props(value: Value) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("field".to_string(), value);
        map
    }

    #[test_case(json!("5000.00"), Some(5000.0) ; "decimal string")]
    #[test_case(json!(" 42 "), Some(42.0) ; "padded string")]
    #[test_case(json!(1250.5), Some(1250.5) ; "json number")]
    #[test_case(json!(""), None ; "empty string")]
    #[test_case(json!("abc"), None ; "garbage")]
    #[test_case(json!("NaN"), None ; "not a number")]
    #[test_case(json!("inf"), None ; "infinite")]
    #[test_case(Value::Null, None ; "null")]
    fn test_float(value: Value, expected: Option<f64>) {
        assert_eq!(float(&props(value), "field"), expected);
    }

    #[test]
    fn test_float_absent() {
        assert_eq!(float(&Map::new(), "field"), None);
    }

    #[test_case(json!("3"), 3 ; "integer string")]
    #[test_case(json!(7), 7 ; "json integer")]
    #[test_case(json!(""), 0 ; "empty string")]
    #[test_case(json!("2.5"), 0 ; "fractional string")]
    #[test_case(json!("many"), 0 ; "garbage")]
    #[test_case(Value::Null, 0 ; "null")]
    fn test_count(value: Value, expected: i64) {
        assert_eq!(count(&props(value), "field"), expected);
    }

    #[test_case("2024-03-31T00:00:00Z", Utc.with_ymd_and_hms(2024, 3, 31, 0, 0, 0).unwrap() ; "zulu")]
    #[test_case("2024-03-31T12:30:00.123Z", Utc.with_ymd_and_hms(2024, 3, 31, 12, 30, 0).unwrap() + chrono::Duration::milliseconds(123) ; "fractional seconds")]
    #[test_case("2024-03-31T14:00:00+02:00", Utc.with_ymd_and_hms(2024, 3, 31, 12, 0, 0).unwrap() ; "offset converted")]
    #[test_case("2024-03-31T08:15:00", Utc.with_ymd_and_hms(2024, 3, 31, 8, 15, 0).unwrap() ; "naive datetime")]
    #[test_case("2024-03-31", Utc.with_ymd_and_hms(2024, 3, 31, 0, 0, 0).unwrap() ; "date only")]
    fn test_parse_timestamp(raw: &str, expected: DateTime<Utc>) {
        assert_eq!(parse_timestamp(raw), Some(expected));
    }

    #[test_case("" ; "empty")]
    #[test_case("yesterday" ; "words")]
    #[test_case("2024-13-45" ; "impossible date")]
    fn test_parse_timestamp_invalid(raw: &str) {
        assert_eq!(parse_timestamp(raw), None);
    }

    #[test]
    fn test_text() {
        assert_eq!(text(&props(json!("Acme")), "field"), Some("Acme".to_string()));
        assert_eq!(text(&props(json!(12)), "field"), Some("12".to_string()));
        assert_eq!(text(&props(Value::Null), "field"), None);
        assert_eq!(text(&Map::new(), "field"), None);
    }
}
