use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

/// Render a response body: strings verbatim, everything else as indented JSON.
pub fn format_body(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

/// Split a comma-separated field into trimmed, non-empty items.
pub fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// A numeric field as a JSON number when it parses, otherwise the trimmed text.
pub fn numeric(input: &str) -> Value {
    let input = input.trim();
    if let Ok(n) = input.parse::<i64>() {
        return Value::from(n);
    }
    input
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(input.to_string()))
}

const LOCAL_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

/// Convert a datetime field to RFC 3339 UTC.
///
/// Inputs without an offset are local time. Empty input yields `None`;
/// anything unparseable is passed through unchanged for the backend to judge.
pub fn to_iso(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc).to_rfc3339());
    }

    for format in LOCAL_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            if let Some(local) = Local.from_local_datetime(&naive).earliest() {
                return Some(local.with_timezone(&Utc).to_rfc3339());
            }
        }
    }

    // A bare date means local midnight.
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        if let Some(local) = date
            .and_hms_opt(0, 0, 0)
            .and_then(|naive| Local.from_local_datetime(&naive).earliest())
        {
            return Some(local.with_timezone(&Utc).to_rfc3339());
        }
    }

    Some(input.to_string())
}

/// Show a backend timestamp in local time, `-` when absent.
pub fn format_date_time(value: Option<&str>) -> String {
    match value {
        None | Some("") => "-".to_string(),
        Some(raw) => match DateTime::parse_from_rfc3339(raw) {
            Ok(dt) => dt.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string(),
            Err(_) => raw.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_body_string_is_raw() {
        assert_eq!(format_body(&json!("Not Found")), "Not Found");
    }

    #[test]
    fn test_format_body_pretty_prints_objects() {
        let formatted = format_body(&json!({"id": "1", "tags": ["a"]}));
        assert_eq!(formatted, "{\n  \"id\": \"1\",\n  \"tags\": [\n    \"a\"\n  ]\n}");
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(parse_list(" a, b,,c ,"), vec!["a", "b", "c"]);
        assert!(parse_list("  ").is_empty());
    }

    #[test]
    fn test_numeric() {
        assert_eq!(numeric(" 3 "), json!(3));
        assert_eq!(numeric("1500.50"), json!(1500.5));
        assert_eq!(numeric("a lot"), json!("a lot"));
    }

    #[test]
    fn test_to_iso_offsets_and_empty() {
        assert_eq!(to_iso(""), None);
        assert_eq!(
            to_iso("2024-03-01T10:00:00+03:00").as_deref(),
            Some("2024-03-01T07:00:00+00:00")
        );
    }

    #[test]
    fn test_to_iso_local_input_round_trips_through_local_zone() {
        let iso = to_iso("2024-03-01 10:30").unwrap();
        let parsed = DateTime::parse_from_rfc3339(&iso).unwrap().with_timezone(&Local);
        assert_eq!(parsed.format("%Y-%m-%d %H:%M").to_string(), "2024-03-01 10:30");
    }

    #[test]
    fn test_to_iso_passes_garbage_through() {
        assert_eq!(to_iso("next tuesday").as_deref(), Some("next tuesday"));
    }

    #[test]
    fn test_format_date_time() {
        assert_eq!(format_date_time(None), "-");
        assert_eq!(format_date_time(Some("yesterday")), "yesterday");
        let shown = format_date_time(Some("2024-03-01T07:00:00Z"));
        assert_eq!(shown.len(), "2024-03-01 07:00:00".len());
    }
}
