use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::FieldErrors;

pub const REQUIRED: &str = "This field is required.";
pub const BLANK: &str = "This field may not be blank.";
pub const INVALID_EMAIL: &str = "Enter a valid email address.";
pub const INVALID_INTEGER: &str = "A valid integer is required.";
pub const NULL: &str = "This field may not be null.";
pub const NOT_A_STRING: &str = "Not a valid string.";

/// Column width shared by every VARCHAR in the schema.
pub const MAX_TEXT_LEN: usize = 255;

pub fn max_length_message(max: usize) -> String {
    format!("Ensure this field has no more than {max} characters.")
}

pub fn min_length_message(min: usize) -> String {
    format!("Ensure this field has at least {min} characters.")
}

/// Trimmed, non-blank, bounded text. Records an error and returns `None` otherwise.
pub fn required_text(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<&str>,
    max_len: usize,
) -> Option<String> {
    let Some(raw) = value else {
        errors.add(field, REQUIRED);
        return None;
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        errors.add(field, BLANK);
        return None;
    }
    if trimmed.chars().count() > max_len {
        errors.add(field, max_length_message(max_len));
        return None;
    }
    Some(trimmed.to_string())
}

/// Like [`required_text`] but for fields that may be absent or blank.
pub fn optional_text(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<&str>,
    max_len: usize,
) -> Option<String> {
    let trimmed = value?.trim();
    if trimmed.chars().count() > max_len {
        errors.add(field, max_length_message(max_len));
        return None;
    }
    Some(trimmed.to_string())
}

/// `deserialize_with` target that keeps an explicit `null` apart from a
/// missing key (which `#[serde(default)]` turns into `None`).
pub fn present<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(d).map(Some)
}

/// Name of a JSON value's type as it appears in error messages.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "NoneType",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

/// Text from a loosely typed field. Numbers are taken in their written form.
fn text_value(errors: &mut FieldErrors, field: &str, value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Null => {
            errors.add(field, NULL);
            None
        }
        _ => {
            errors.add(field, NOT_A_STRING);
            None
        }
    }
}

/// [`required_text`] over a raw JSON value.
pub fn required_text_value(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<&Value>,
    max_len: usize,
) -> Option<String> {
    match value {
        None => required_text(errors, field, None, max_len),
        Some(v) => {
            let text = text_value(errors, field, v)?;
            required_text(errors, field, Some(&text), max_len)
        }
    }
}

/// [`optional_text`] over a raw JSON value.
pub fn optional_text_value(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<&Value>,
    max_len: usize,
) -> Option<String> {
    let text = text_value(errors, field, value?)?;
    optional_text(errors, field, Some(&text), max_len)
}

/// Accepts JSON integers, integral floats and integer strings.
pub fn parse_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => {
            let s = s.trim();
            let s = s.strip_suffix(".0").unwrap_or(s);
            s.parse::<i64>().ok()
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn required_text_reports_missing_blank_and_long() {
        let mut errors = FieldErrors::new();
        assert_eq!(required_text(&mut errors, "a", None, 5), None);
        assert_eq!(required_text(&mut errors, "b", Some("   "), 5), None);
        assert_eq!(required_text(&mut errors, "c", Some("toolong"), 5), None);
        assert_eq!(
            required_text(&mut errors, "d", Some("  ok "), 5),
            Some("ok".to_string())
        );
        assert_eq!(errors.get("a"), Some(&[REQUIRED.to_string()][..]));
        assert_eq!(errors.get("b"), Some(&[BLANK.to_string()][..]));
        assert_eq!(errors.get("c"), Some(&[max_length_message(5)][..]));
        assert_eq!(errors.get("d"), None);
    }

    #[test]
    fn optional_text_allows_blank() {
        let mut errors = FieldErrors::new();
        assert_eq!(optional_text(&mut errors, "link", None, 10), None);
        assert_eq!(
            optional_text(&mut errors, "link", Some(""), 10),
            Some(String::new())
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn text_values_report_wrong_types_per_field() {
        let mut errors = FieldErrors::new();
        assert_eq!(required_text_value(&mut errors, "title", Some(&json!(5)), 10), Some("5".into()));
        assert_eq!(required_text_value(&mut errors, "a", Some(&json!(null)), 10), None);
        assert_eq!(required_text_value(&mut errors, "b", Some(&json!(["x"])), 10), None);
        assert_eq!(optional_text_value(&mut errors, "c", Some(&json!(null)), 10), None);
        assert_eq!(optional_text_value(&mut errors, "link", None, 10), None);

        assert_eq!(errors.get("title"), None);
        assert_eq!(errors.get("a"), Some(&[NULL.to_string()][..]));
        assert_eq!(errors.get("b"), Some(&[NOT_A_STRING.to_string()][..]));
        assert_eq!(errors.get("c"), Some(&[NULL.to_string()][..]));
        assert_eq!(errors.get("link"), None);
    }

    #[test]
    fn explicit_null_is_kept_apart_from_missing() {
        #[derive(Deserialize)]
        struct Body {
            #[serde(default, deserialize_with = "present")]
            tags: Option<Value>,
        }
        let missing: Body = serde_json::from_value(json!({})).unwrap();
        let null: Body = serde_json::from_value(json!({ "tags": null })).unwrap();
        assert_eq!(missing.tags, None);
        assert_eq!(null.tags, Some(Value::Null));
    }

    #[test]
    fn parse_integer_is_lenient_about_representation() {
        assert_eq!(parse_integer(&json!(20)), Some(20));
        assert_eq!(parse_integer(&json!(20.0)), Some(20));
        assert_eq!(parse_integer(&json!("45")), Some(45));
        assert_eq!(parse_integer(&json!(20.5)), None);
        assert_eq!(parse_integer(&json!("abc")), None);
        assert_eq!(parse_integer(&json!(true)), None);
    }
}
