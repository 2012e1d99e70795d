//! Ordered fallback resolution over loosely shaped JSON.
//!
//! Every normalized field is described by a chain of accessors; the first
//! accessor that yields a value wins. Accessors follow upstream truthiness:
//! empty strings, zero and `null` count as absent.

use regex::Regex;
use serde_json::Value;

pub type Accessor<T> = fn(&Value) -> Option<T>;

pub fn resolve<T>(raw: &Value, chain: &[Accessor<T>]) -> Option<T> {
    chain.iter().find_map(|get| get(raw))
}

pub fn resolve_or_else<T>(raw: &Value, chain: &[Accessor<T>], default: impl FnOnce() -> T) -> T {
    resolve(raw, chain).unwrap_or_else(default)
}

pub fn at<'a>(v: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(v, |cur, key| cur.get(*key))
}

/// Non-empty string at `path`; non-zero numbers are rendered as text.
pub fn text(v: &Value, path: &[&str]) -> Option<String> {
    match at(v, path)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        _ => None,
    }
}

/// Non-zero number at `path`, either native or the leading number of a string.
pub fn number(v: &Value, path: &[&str]) -> Option<f64> {
    let n = match at(v, path)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => leading_number(s),
        _ => None,
    }?;
    (n.is_finite() && n != 0.0).then_some(n)
}

/// Unsigned integer at `path`, zero included. Strings parse by leading digits.
pub fn uint(v: &Value, path: &[&str]) -> Option<u32> {
    match at(v, path)? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => leading_int(s),
        _ => None,
    }
}

pub fn array<'a>(v: &'a Value, path: &[&str]) -> Option<&'a Vec<Value>> {
    at(v, path)?.as_array()
}

pub fn truthy(v: &Value, path: &[&str]) -> bool {
    match at(v, path) {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

pub fn leading_number(s: &str) -> Option<f64> {
    let re = Regex::new(r"^\s*([+-]?(?:\d+(?:\.\d*)?|\.\d+))").ok()?;
    re.captures(s)?.get(1)?.as_str().parse::<f64>().ok()
}

pub fn leading_int(s: &str) -> Option<u32> {
    let re = Regex::new(r"^\s*\+?(\d+)").ok()?;
    re.captures(s)?.get(1)?.as_str().parse::<u32>().ok()
}
