use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Serializer;

/// NUMERIC(5, 2): three digits before the point, two after.
pub const MAX_WHOLE_DIGITS: u32 = 3;
pub const DECIMAL_PLACES: u32 = 2;

pub const INVALID_NUMBER: &str = "A valid number is required.";

pub fn too_many_places_message() -> String {
    format!("Ensure that there are no more than {DECIMAL_PLACES} decimal places.")
}

pub fn too_many_whole_digits_message() -> String {
    format!("Ensure that there are no more than {MAX_WHOLE_DIGITS} digits before the decimal point.")
}

/// Parses a JSON number or numeric string into a price at scale 2.
pub fn parse_price(value: &serde_json::Value) -> Result<Decimal, String> {
    let text = match value {
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => s.trim().to_string(),
        _ => return Err(INVALID_NUMBER.to_string()),
    };
    let parsed = Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|_| INVALID_NUMBER.to_string())?;

    let normalized = parsed.normalize();
    if normalized.scale() > DECIMAL_PLACES {
        return Err(too_many_places_message());
    }
    if normalized.trunc().abs() >= Decimal::from(10_i64.pow(MAX_WHOLE_DIGITS)) {
        return Err(too_many_whole_digits_message());
    }

    let mut price = normalized;
    price.rescale(DECIMAL_PLACES);
    Ok(price)
}

/// Always two places: `8.5` renders as `"8.50"`.
pub fn format_price(price: &Decimal) -> String {
    let mut p = price.round_dp(DECIMAL_PLACES);
    p.rescale(DECIMAL_PLACES);
    p.to_string()
}

pub fn serialize<S: Serializer>(price: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_price(price))
}
