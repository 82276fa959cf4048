//! Date reviver for incoming JSON documents
//!
//! JSON has no date type, so clients send timestamps as ISO-8601 strings.
//! Every string shaped like `YYYY-MM-DDTHH:MM:SS(.mmm)?Z`, anywhere in the
//! document, is turned into a [`Value::Date`] before it reaches the filter
//! factory. Other strings stay text.

use crate::types::Value;
use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;
use std::sync::OnceLock;

/// Exact wire shape of a date literal
const DATE_PATTERN: &str = r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(\.\d{3})?Z$";

static DATE_REGEX: OnceLock<Regex> = OnceLock::new();

fn date_regex() -> &'static Regex {
    DATE_REGEX.get_or_init(|| Regex::new(DATE_PATTERN).expect("date pattern is a valid regex"))
}

/// Parse a date literal, returning `None` when the string is not one
///
/// Strings with the right shape but an impossible calendar value
/// (e.g. month 13) are left as text.
pub fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    if !date_regex().is_match(s) {
        return None;
    }
    // %.f accepts both the bare and the millisecond form
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.fZ")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Convert a JSON document into a [`Value`] tree, reviving date strings
pub fn revive(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => n.as_f64().map(Value::Number).unwrap_or(Value::Null),
        serde_json::Value::String(s) => match parse_date(&s) {
            Some(date) => Value::Date(date),
            None => Value::Text(s),
        },
        serde_json::Value::Array(items) => Value::List(items.into_iter().map(revive).collect()),
        serde_json::Value::Object(map) => {
            Value::Map(map.into_iter().map(|(k, v)| (k, revive(v))).collect())
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};
    use serde_json::json;

    #[test]
    fn test_revives_millisecond_form() {
        let value = revive(json!("2023-01-05T00:00:00.000Z"));
        let expected = Utc.with_ymd_and_hms(2023, 1, 5, 0, 0, 0).unwrap();
        assert_eq!(value, Value::Date(expected));
    }

    #[test]
    fn test_revives_bare_seconds_form() {
        let value = revive(json!("2023-01-05T12:30:15Z"));
        match value {
            Value::Date(d) => assert_eq!(d.hour(), 12),
            other => panic!("expected date, got {:?}", other),
        }
    }

    #[test]
    fn test_keeps_milliseconds() {
        let date = parse_date("2023-01-05T00:00:00.250Z").unwrap();
        assert_eq!(date.timestamp_millis() % 1000, 250);
    }

    #[test]
    fn test_non_dates_stay_text() {
        for s in [
            "2023-01-05",
            "2023-01-05T00:00:00",
            "2023-01-05T00:00:00+01:00",
            "2023-01-05T00:00:00.1Z",
            "2023-13-05T00:00:00Z",
            "hello",
        ] {
            assert_eq!(revive(json!(s)), Value::from(s), "{} should stay text", s);
        }
    }

    #[test]
    fn test_revives_nested_documents() {
        let value = revive(json!({
            "filters": {
                "day": {"filterType": "RangedFilter", "value": ["2023-01-01T00:00:00.000Z", "2023-02-01T00:00:00.000Z"]}
            }
        }));
        let bounds = value
            .get("filters")
            .and_then(|f| f.get("day"))
            .and_then(|d| d.get("value"))
            .and_then(Value::as_list)
            .unwrap();
        assert!(bounds.iter().all(|b| matches!(b, Value::Date(_))));
    }
}
