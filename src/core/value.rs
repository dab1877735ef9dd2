//! Lenient JSON Accessors
//!
//! GSI is loosely typed: countdowns arrive as `"12.3"` or `12.3`, counters
//! as integers or floats. These helpers coerce without ever failing; a
//! missing or mistyped field reads as `None`.

use serde_json::Value;

/// Read an integer, accepting any JSON number (truncated).
pub fn as_i32(value: Option<&Value>) -> Option<i32> {
    let v = value?;
    v.as_i64()
        .map(|n| n.clamp(i32::MIN as i64, i32::MAX as i64) as i32)
        .or_else(|| v.as_f64().map(|f| f as i32))
}

/// Read a float, accepting a JSON number or a numeric string.
pub fn as_f32_lenient(value: Option<&Value>) -> Option<f32> {
    match value? {
        Value::Number(n) => n.as_f64().map(|f| f as f32),
        Value::String(s) => s.trim().parse::<f32>().ok(),
        _ => None,
    }
}

/// Read a string slice.
#[inline]
pub fn as_str(value: Option<&Value>) -> Option<&str> {
    value?.as_str()
}

/// Read a bool.
#[inline]
pub fn as_bool(value: Option<&Value>) -> Option<bool> {
    value?.as_bool()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_int_coercion() {
        let doc = json!({ "a": 3, "b": 4.9, "c": "5", "d": null });
        assert_eq!(as_i32(doc.get("a")), Some(3));
        assert_eq!(as_i32(doc.get("b")), Some(4));
        assert_eq!(as_i32(doc.get("c")), None);
        assert_eq!(as_i32(doc.get("d")), None);
        assert_eq!(as_i32(doc.get("missing")), None);
    }

    #[test]
    fn test_countdown_number_or_string() {
        let doc = json!({ "n": 12.5, "s": "7.25", "bad": "soon" });
        assert_eq!(as_f32_lenient(doc.get("n")), Some(12.5));
        assert_eq!(as_f32_lenient(doc.get("s")), Some(7.25));
        assert_eq!(as_f32_lenient(doc.get("bad")), None);
    }
}
