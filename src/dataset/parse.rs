//! Lenient value parsing for dataset configuration
//!
//! Metadata written by older tools stores booleans and integers in several
//! shapes (`"True"`, `"1.0"`, `1`). These functions normalize them.

use serde_json::Value;

use crate::error::{DcorError, Result};

fn invalid(kind: &str, value: &Value) -> DcorError {
    DcorError::Config(format!("Cannot convert {} to {}", value, kind))
}

fn parse_float(text: &str, kind: &str, value: &Value) -> Result<f64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|f| !f.is_nan())
        .ok_or_else(|| invalid(kind, value))
}

/// boolean
pub fn fbool(value: &Value) -> Result<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).ok_or_else(|| invalid("bool", value)),
        Value::String(s) => match s.to_lowercase().as_str() {
            "false" => Ok(false),
            "true" => Ok(true),
            "" => Err(DcorError::Config("Cannot convert empty string to bool".to_string())),
            text => Ok(parse_float(text, "bool", value)? != 0.0),
        },
        _ => Err(invalid("bool", value)),
    }
}

/// integer (truncating, like `int(float(x))`)
pub fn fint(value: &Value) -> Result<i64> {
    match value {
        Value::Bool(b) => Ok(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Ok(i),
            None => n
                .as_f64()
                .filter(|f| f.is_finite())
                .map(|f| f.trunc() as i64)
                .ok_or_else(|| invalid("int", value)),
        },
        Value::String(s) => match s.to_lowercase().as_str() {
            // strings might have been saved wrongly as booleans
            "false" => Ok(0),
            "true" => Ok(1),
            "" => Err(DcorError::Config("Cannot convert empty string to int".to_string())),
            text => {
                let f = parse_float(text, "int", value)?;
                if f.is_finite() {
                    Ok(f.trunc() as i64)
                } else {
                    Err(invalid("int", value))
                }
            }
        },
        _ => Err(invalid("int", value)),
    }
}

/// A list of integers, given as list or as `"[1, 2, 3]"`
pub fn fintlist(value: &Value) -> Result<Vec<i64>> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter(|item| item.as_str() != Some(""))
            .map(fint)
            .collect(),
        Value::String(s) => s
            .trim()
            .trim_matches(|c: char| c == '[' || c == ']' || c == ' ')
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(|item| fint(&Value::from(item)))
            .collect(),
        _ => Err(invalid("list of ints", value)),
    }
}

/// lower-case string
pub fn lcstr(value: &Value) -> Result<String> {
    value
        .as_str()
        .map(str::to_lowercase)
        .ok_or_else(|| invalid("string", value))
}
