//! Query string codec
//!
//! Values are typed on the way in. The first matching rule wins: number,
//! then date, then boolean, then plain text.

use chrono::{DateTime, Datelike, NaiveDate};
use url::form_urlencoded;

use crate::view_model::{Parameters, QueryValue};

/// Keys used for history bookkeeping, never application data
pub const RESERVED_KEYS: [&str; 2] = ["s", "_suid"];

// `%B` also accepts abbreviated month names
const DATE_FORMATS: [&str; 4] = ["%m/%d/%Y", "%Y-%m-%d", "%Y/%m/%d", "%B %d, %Y"];

/// Parse the query component of `url` into typed parameters.
///
/// Everything after the last `?` is read. Chunks without exactly one `=` are
/// ignored, as are the reserved state-sync keys.
pub fn parse_query_string(url: &str) -> Parameters {
    let mut result = Parameters::new();

    let Some(start) = url.rfind('?') else {
        return result;
    };

    for chunk in url[start + 1..].split('&') {
        if chunk.matches('=').count() != 1 {
            continue;
        }

        let Some((key, value)) = form_urlencoded::parse(chunk.as_bytes()).next() else {
            continue;
        };

        if RESERVED_KEYS.contains(&key.as_ref()) {
            continue;
        }

        result.insert(key.into_owned(), decode_value(&value));
    }

    result
}

/// Format parameters as `&key=value` pairs.
///
/// The leading `&` is always written; callers strip it when nothing precedes
/// the parameters. Values that have no query string form are skipped.
pub fn format_query_string(parameters: &Parameters) -> String {
    let mut query = String::new();

    for (key, value) in parameters {
        let encoded = match value {
            QueryValue::Date(date) => format!("{}/{}/{}", date.month(), date.day(), date.year()),
            QueryValue::Number(n) => encode(&n.to_string()),
            QueryValue::Bool(b) => b.to_string(),
            QueryValue::Text(s) => encode(s),
            QueryValue::Null | QueryValue::List(_) => continue,
        };

        query.push('&');
        query.push_str(&encode(key));
        query.push('=');
        query.push_str(&encoded);
    }

    query
}

fn encode(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

fn decode_value(raw: &str) -> QueryValue {
    if let Some(n) = parse_number(raw) {
        return QueryValue::Number(n);
    }

    if let Some(date) = parse_date(raw) {
        return QueryValue::Date(date);
    }

    if raw.eq_ignore_ascii_case("true") {
        QueryValue::Bool(true)
    } else if raw.eq_ignore_ascii_case("false") {
        QueryValue::Bool(false)
    } else {
        QueryValue::Text(raw.to_string())
    }
}

// A blank value reads as zero, the way browsers coerce it.
fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }

    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(trimmed)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_query_component() {
        assert!(parse_query_string("https://example.com/app").is_empty());
    }

    #[test]
    fn test_date_forms() {
        let expected = QueryValue::Date(NaiveDate::from_ymd_opt(2024, 3, 7).unwrap());
        let params = parse_query_string(
            "?a=3/7/2024&b=2024-03-07&c=2024/03/07&d=March+7,+2024&e=Mar+7,+2024&f=2024-03-07T10:00:00Z",
        );

        for key in ["a", "b", "c", "d", "e", "f"] {
            assert_eq!(params[key], expected, "{}", key);
        }
    }

    #[test]
    fn test_value_typing() {
        let params = parse_query_string(
            "https://example.com/?screen=OrderModel&id=42&from=3/7/2024&open=TRUE&q=hello+world",
        );

        assert_eq!(params["screen"], QueryValue::Text("OrderModel".to_string()));
        assert_eq!(params["id"], QueryValue::Number(42.0));
        assert_eq!(
            params["from"],
            QueryValue::Date(NaiveDate::from_ymd_opt(2024, 3, 7).unwrap())
        );
        assert_eq!(params["open"], QueryValue::Bool(true));
        assert_eq!(params["q"], QueryValue::Text("hello world".to_string()));
    }

    #[test]
    fn test_reserved_and_malformed_chunks_skipped() {
        let params = parse_query_string("?s=123&_suid=9&a=1=2&flag&name=x");

        assert_eq!(params.len(), 1);
        assert_eq!(params["name"], QueryValue::Text("x".to_string()));
    }

    #[test]
    fn test_last_question_mark_wins() {
        let params = parse_query_string("/app?stale=1?fresh=2");

        assert!(!params.contains_key("stale"));
        assert_eq!(params["fresh"], QueryValue::Number(2.0));
    }

    #[test]
    fn test_blank_value_is_zero() {
        let params = parse_query_string("?page=");
        assert_eq!(params["page"], QueryValue::Number(0.0));
    }

    #[test]
    fn test_format_skips_non_scalars() {
        let mut params = Parameters::new();
        params.insert("id".to_string(), QueryValue::Number(7.0));
        params.insert("none".to_string(), QueryValue::Null);
        params.insert(
            "tags".to_string(),
            QueryValue::List(vec![QueryValue::from("a")]),
        );
        params.insert(
            "since".to_string(),
            QueryValue::Date(NaiveDate::from_ymd_opt(2023, 1, 5).unwrap()),
        );
        params.insert("title".to_string(), QueryValue::from("a&b c"));

        assert_eq!(
            format_query_string(&params),
            "&id=7&since=1/5/2023&title=a%26b+c"
        );
    }

    #[test]
    fn test_round_trip_mixed_values() {
        let mut params = Parameters::new();
        params.insert("count".to_string(), QueryValue::Number(-3.5));
        params.insert("active".to_string(), QueryValue::Bool(false));
        params.insert("name".to_string(), QueryValue::from("Ada Lovelace"));
        params.insert(
            "due".to_string(),
            QueryValue::Date(NaiveDate::from_ymd_opt(2025, 12, 31).unwrap()),
        );

        let url = format!("?{}", &format_query_string(&params)[1..]);
        assert_eq!(parse_query_string(&url), params);
    }
}
