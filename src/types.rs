//! Built-in type names and their predicates

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Largest distance from the epoch, in milliseconds, that a timestamp may have
pub const DATE_LIMIT_MS: f64 = 8.64e15;

/// A built-in primitive shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TypeName {
    #[serde(rename = "array")]
    Array,
    #[serde(rename = "bigint")]
    BigInt,
    #[serde(rename = "boolean")]
    Boolean,
    #[serde(rename = "date")]
    Date,
    /// A date, a timestamp within range, or a parseable date string
    #[serde(rename = "date-like")]
    DateLike,
    #[serde(rename = "function")]
    Function,
    #[serde(rename = "null")]
    Null,
    #[serde(rename = "number")]
    Number,
    /// A bigint or a number
    #[serde(rename = "numerical")]
    Numerical,
    #[serde(rename = "object")]
    Object,
    #[serde(rename = "string")]
    String,
    #[serde(rename = "symbol")]
    Symbol,
    #[serde(rename = "undefined")]
    Undefined,
}

impl TypeName {
    /// Every registered type name
    pub const ALL: [TypeName; 13] = [
        TypeName::Array,
        TypeName::BigInt,
        TypeName::Boolean,
        TypeName::Date,
        TypeName::DateLike,
        TypeName::Function,
        TypeName::Null,
        TypeName::Number,
        TypeName::Numerical,
        TypeName::Object,
        TypeName::String,
        TypeName::Symbol,
        TypeName::Undefined,
    ];

    /// The name used in schemas
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeName::Array => "array",
            TypeName::BigInt => "bigint",
            TypeName::Boolean => "boolean",
            TypeName::Date => "date",
            TypeName::DateLike => "date-like",
            TypeName::Function => "function",
            TypeName::Null => "null",
            TypeName::Number => "number",
            TypeName::Numerical => "numerical",
            TypeName::Object => "object",
            TypeName::String => "string",
            TypeName::Symbol => "symbol",
            TypeName::Undefined => "undefined",
        }
    }

    /// Look up a registered type by its schema name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }

    /// Does the value have this shape?
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            TypeName::Array => matches!(value, Value::Array(_)),
            TypeName::BigInt => matches!(value, Value::BigInt(_)),
            TypeName::Boolean => matches!(value, Value::Bool(_)),
            TypeName::Date => matches!(value, Value::Date(_)),
            TypeName::DateLike => is_date_like(value),
            TypeName::Function => matches!(value, Value::Function(_)),
            TypeName::Null => value.is_null(),
            TypeName::Number => matches!(value, Value::Number(n) if !n.is_nan()),
            TypeName::Numerical => {
                TypeName::BigInt.matches(value) || TypeName::Number.matches(value)
            }
            TypeName::Object => value.is_object_like(),
            TypeName::String => matches!(value, Value::String(_)),
            TypeName::Symbol => matches!(value, Value::Symbol(_)),
            TypeName::Undefined => value.is_undefined(),
        }
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TypeName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| format!("unknown type '{}'", s))
    }
}

/// Dates, in-range millisecond timestamps, and strings that parse as dates
pub fn is_date_like(value: &Value) -> bool {
    match value {
        Value::Date(_) => true,
        Value::Number(n) => (-DATE_LIMIT_MS..=DATE_LIMIT_MS).contains(n),
        Value::String(s) => parses_as_date(s),
        _ => false,
    }
}

const DATE_TIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// `%z` takes offsets with or without a colon; a trailing `Z` is rewritten
/// to `+0000` before these are tried.
const OFFSET_DATE_TIME_FORMATS: [&str; 5] = [
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M%z",
    "%a %b %d %Y %H:%M:%S GMT%z",
];

const DATE_FORMATS: [&str; 8] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%b %d %Y",
    "%a %b %d %Y",
    "%d %b %Y",
];

fn parses_as_date(text: &str) -> bool {
    let text = text.trim();
    if text.is_empty() {
        return false;
    }

    if DateTime::parse_from_rfc3339(text).is_ok() || DateTime::parse_from_rfc2822(text).is_ok() {
        return true;
    }

    // Reduced ISO forms: `YYYY` and `YYYY-MM`.
    if text.len() == 4 && text.bytes().all(|b| b.is_ascii_digit()) {
        return true;
    }
    if text.len() == 7 && NaiveDate::parse_from_str(&format!("{}-01", text), "%Y-%m-%d").is_ok() {
        return true;
    }

    let zoned = match text.strip_suffix('Z') {
        Some(rest) => format!("{}+0000", rest),
        // `Date.prototype.toString` appends the zone name in parentheses.
        None => match text.find(" (") {
            Some(index) if text.ends_with(')') => text[..index].to_string(),
            _ => text.to_string(),
        },
    };

    OFFSET_DATE_TIME_FORMATS
        .iter()
        .any(|format| DateTime::parse_from_str(&zoned, format).is_ok())
        || DATE_TIME_FORMATS
            .iter()
            .any(|format| NaiveDateTime::parse_from_str(text, format).is_ok())
        || DATE_FORMATS
            .iter()
            .any(|format| NaiveDate::parse_from_str(text, format).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Class;
    use chrono::Utc;

    #[test]
    fn test_names_round_trip() {
        for name in TypeName::ALL {
            assert_eq!(TypeName::from_name(name.as_str()), Some(name));
        }
        assert_eq!(TypeName::from_name("invalid"), None);
        assert_eq!("date-like".parse::<TypeName>(), Ok(TypeName::DateLike));
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&TypeName::DateLike).unwrap();
        assert_eq!(json, "\"date-like\"");
        let parsed: TypeName = serde_json::from_str("\"bigint\"").unwrap();
        assert_eq!(parsed, TypeName::BigInt);
    }

    #[test]
    fn test_basic_predicates() {
        assert!(TypeName::Array.matches(&Value::array(vec![1])));
        assert!(TypeName::BigInt.matches(&Value::BigInt(1)));
        assert!(TypeName::Boolean.matches(&Value::Bool(false)));
        assert!(TypeName::Date.matches(&Value::Date(Utc::now())));
        assert!(TypeName::Function.matches(&Value::function(|_| true)));
        assert!(TypeName::Function.matches(&Class::new("A").constructor()));
        assert!(TypeName::Null.matches(&Value::Null));
        assert!(TypeName::String.matches(&Value::from("")));
        assert!(TypeName::Symbol.matches(&Value::symbol("s")));
        assert!(TypeName::Undefined.matches(&Value::Undefined));

        assert!(!TypeName::Null.matches(&Value::Undefined));
        assert!(!TypeName::Undefined.matches(&Value::Null));
        assert!(!TypeName::Date.matches(&Value::from(99)));
    }

    #[test]
    fn test_number_rejects_nan() {
        assert!(TypeName::Number.matches(&Value::from(1.5)));
        assert!(!TypeName::Number.matches(&Value::Number(f64::NAN)));
        assert!(!TypeName::Number.matches(&Value::BigInt(1)));
    }

    #[test]
    fn test_numerical() {
        assert!(TypeName::Numerical.matches(&Value::from(3)));
        assert!(TypeName::Numerical.matches(&Value::BigInt(-3)));
        assert!(!TypeName::Numerical.matches(&Value::Number(f64::NAN)));
        assert!(!TypeName::Numerical.matches(&Value::from("3")));
    }

    #[test]
    fn test_object_is_broad() {
        assert!(TypeName::Object.matches(&Value::object([("a", 1)])));
        assert!(TypeName::Object.matches(&Value::array(Vec::<Value>::new())));
        assert!(TypeName::Object.matches(&Value::Date(Utc::now())));
        assert!(!TypeName::Object.matches(&Value::Null));
        assert!(!TypeName::Object.matches(&Value::from("{}")));
    }

    #[test]
    fn test_date_like() {
        assert!(is_date_like(&Value::Date(Utc::now())));
        assert!(is_date_like(&Value::from(0)));
        assert!(is_date_like(&Value::Number(DATE_LIMIT_MS)));
        assert!(is_date_like(&Value::Number(-DATE_LIMIT_MS)));
        assert!(!is_date_like(&Value::Number(DATE_LIMIT_MS + 1.0)));
        assert!(!is_date_like(&Value::Number(f64::NAN)));
        assert!(!is_date_like(&Value::Number(f64::INFINITY)));

        assert!(is_date_like(&Value::from("2024-02-29")));
        assert!(is_date_like(&Value::from("2024-02-29T10:15:00Z")));
        assert!(is_date_like(&Value::from("2024-02-29T10:15:00.123")));
        assert!(is_date_like(&Value::from("Tue, 1 Jul 2003 10:52:37 +0200")));
        assert!(is_date_like(&Value::from("March 7, 2020")));

        assert!(is_date_like(&Value::from("2024")));
        assert!(is_date_like(&Value::from("2024-01")));
        assert!(is_date_like(&Value::from("2024-01-31T12:00")));
        assert!(is_date_like(&Value::from("2024-01-31T12:00Z")));
        assert!(is_date_like(&Value::from("2024-01-31T12:00+01:00")));
        assert!(is_date_like(&Value::from("2024-01-31T12:00:00.000+0100")));
        assert!(is_date_like(&Value::from("2024-01-31 12:00:00+01:00")));
        assert!(is_date_like(&Value::from("Wed Jan 31 2024 12:00:00 GMT+0000")));
        assert!(is_date_like(&Value::from(
            "Wed Jan 31 2024 12:00:00 GMT+0000 (Coordinated Universal Time)"
        )));
        assert!(is_date_like(&Value::from("Jan 31 2024")));
        assert!(is_date_like(&Value::from("Wed Jan 31 2024")));

        assert!(!is_date_like(&Value::from("2024-13")));
        assert!(!is_date_like(&Value::from("20245")));
        assert!(!is_date_like(&Value::from("2024-01-31T25:00Z")));
        assert!(!is_date_like(&Value::from("not a date")));
        assert!(!is_date_like(&Value::from("2023-02-30")));
        assert!(!is_date_like(&Value::from("")));
        assert!(!is_date_like(&Value::Bool(true)));
    }
}
