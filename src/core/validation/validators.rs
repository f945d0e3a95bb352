//! Reusable field validators
//!
//! Each validator answers whether a present JSON value satisfies one rule. A value
//! of the wrong JSON type passes: type checks happen earlier, during structural
//! decoding, and a string rule has nothing to say about a number.

use super::schema::CharClass;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

fn char_count(value: &Value) -> Option<usize> {
    value.as_str().map(|s| s.chars().count())
}

/// String has at least `min` characters
pub fn min_length(value: &Value, min: usize) -> bool {
    char_count(value).is_none_or(|len| len >= min)
}

/// String has at most `max` characters
pub fn max_length(value: &Value, max: usize) -> bool {
    char_count(value).is_none_or(|len| len <= max)
}

/// String is made of ASCII letters and digits only
pub fn alphanumeric(value: &Value) -> bool {
    value
        .as_str()
        .is_none_or(|s| s.chars().all(|c| c.is_ascii_alphanumeric()))
}

/// String looks like an email address
pub fn email(value: &Value) -> bool {
    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("email pattern is valid")
    });
    value.as_str().is_none_or(|s| regex.is_match(s))
}

/// String contains at least one character of `class`
pub fn contains_any(value: &Value, class: CharClass) -> bool {
    value
        .as_str()
        .is_none_or(|s| s.chars().any(|c| class.contains(c)))
}

/// Number is not below `min`
pub fn min_value(value: &Value, min: f64) -> bool {
    value.as_f64().is_none_or(|n| n >= min)
}

/// Number does not exceed `max`
pub fn max_value(value: &Value, max: f64) -> bool {
    value.as_f64().is_none_or(|n| n <= max)
}

/// String is one of the allowed values
pub fn in_list(value: &Value, allowed: &[String]) -> bool {
    value
        .as_str()
        .is_none_or(|s| allowed.iter().any(|a| a == s))
}

/// String parses as a date in `format`
pub fn date_format(value: &Value, format: &str) -> bool {
    value
        .as_str()
        .is_none_or(|s| chrono::NaiveDate::parse_from_str(s, format).is_ok())
}
