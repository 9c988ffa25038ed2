//! Captured body to loggable value.
//!
//! # Rules
//! ```text
//! empty buffer            → NotLogged
//! longer than limit       → Text(first `limit` bytes + TRUNCATION_MARKER), no JSON parse
//! parses as a JSON object → Structured(map)
//! anything else           → Text(lossy UTF-8)
//! ```

use serde::ser::{Serialize, Serializer};
use serde_json::{Map, Value};

/// Placeholder for bodies that are disabled, excluded or empty.
pub const NOT_LOGGED: &str = "not logged or empty";

/// Appended to the text form of a body cut at the size limit.
pub const TRUNCATION_MARKER: &str = "...[truncated]";

/// Default retention and truncation limit in bytes.
pub const DEFAULT_BODY_SIZE_LIMIT: usize = 5000;

/// A body rendered for the log entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    NotLogged,
    Structured(Map<String, Value>),
    Text(String),
}

impl Payload {
    /// JSON representation used by sinks.
    pub fn to_value(&self) -> Value {
        match self {
            Payload::NotLogged => Value::String(NOT_LOGGED.to_string()),
            Payload::Structured(map) => Value::Object(map.clone()),
            Payload::Text(text) => Value::String(text.clone()),
        }
    }

    pub fn is_logged(&self) -> bool {
        !matches!(self, Payload::NotLogged)
    }
}

impl Serialize for Payload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Payload::NotLogged => serializer.serialize_str(NOT_LOGGED),
            Payload::Structured(map) => map.serialize(serializer),
            Payload::Text(text) => serializer.serialize_str(text),
        }
    }
}

impl std::fmt::Display for Payload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Payload::NotLogged => f.write_str(NOT_LOGGED),
            Payload::Structured(map) => {
                let rendered = serde_json::to_string(map).map_err(|_| std::fmt::Error)?;
                f.write_str(&rendered)
            }
            Payload::Text(text) => f.write_str(text),
        }
    }
}

/// Result of formatting one buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Formatted {
    pub payload: Payload,
    pub truncated: bool,
}

impl Formatted {
    pub fn not_logged() -> Self {
        Self {
            payload: Payload::NotLogged,
            truncated: false,
        }
    }
}

/// Turns captured bytes into a [`Payload`], capping them at `limit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadFormatter {
    limit: usize,
}

impl PayloadFormatter {
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Format a complete buffer.
    pub fn format(&self, buffer: &[u8]) -> Formatted {
        self.format_captured(buffer, buffer.len() as u64)
    }

    /// Format a buffer that may already have been capped by a capture
    /// accumulator; `total_len` is the size of the body it was taken from.
    pub fn format_captured(&self, retained: &[u8], total_len: u64) -> Formatted {
        if retained.is_empty() {
            return Formatted::not_logged();
        }

        let truncated = total_len > self.limit as u64 || retained.len() > self.limit;
        if truncated {
            let kept = &retained[..retained.len().min(self.limit)];
            let mut text = String::from_utf8_lossy(kept).into_owned();
            text.push_str(TRUNCATION_MARKER);
            return Formatted {
                payload: Payload::Text(text),
                truncated: true,
            };
        }

        let payload = match serde_json::from_slice::<Map<String, Value>>(retained) {
            Ok(map) => Payload::Structured(map),
            Err(_) => Payload::Text(String::from_utf8_lossy(retained).into_owned()),
        };
        Formatted {
            payload,
            truncated: false,
        }
    }
}

impl Default for PayloadFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_BODY_SIZE_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_is_sentinel() {
        let out = PayloadFormatter::default().format(b"");
        assert_eq!(out.payload, Payload::NotLogged);
        assert!(!out.truncated);
        assert_eq!(out.payload.to_value(), json!(NOT_LOGGED));
    }

    #[test]
    fn test_json_object_is_structured() {
        let out = PayloadFormatter::default().format(br#"{"a":1}"#);
        match out.payload {
            Payload::Structured(map) => assert_eq!(map.get("a"), Some(&json!(1))),
            other => panic!("expected structured payload, got {:?}", other),
        }
    }

    #[test]
    fn test_non_json_falls_back_to_text() {
        let out = PayloadFormatter::default().format(b"not-json");
        assert_eq!(out.payload, Payload::Text("not-json".into()));
    }

    #[test]
    fn test_json_array_is_text() {
        let out = PayloadFormatter::default().format(b"[1,2,3]");
        assert_eq!(out.payload, Payload::Text("[1,2,3]".into()));
    }

    #[test]
    fn test_truncation_skips_json_parse() {
        let body = br#"{"key":"0123456789"}"#;
        let out = PayloadFormatter::new(8).format(body);
        assert!(out.truncated);
        assert_eq!(out.payload, Payload::Text(format!("{{\"key\":\"{}", TRUNCATION_MARKER)));
    }

    #[test]
    fn test_at_limit_is_not_truncated() {
        let out = PayloadFormatter::new(8).format(b"12345678");
        assert!(!out.truncated);
        assert_eq!(out.payload, Payload::Text("12345678".into()));
    }

    #[test]
    fn test_captured_prefix_with_larger_total() {
        let out = PayloadFormatter::new(4).format_captured(b"abcd", 10);
        assert!(out.truncated);
        assert_eq!(out.payload, Payload::Text(format!("abcd{}", TRUNCATION_MARKER)));
    }

    #[test]
    fn test_invalid_utf8_is_lossy() {
        let out = PayloadFormatter::default().format(&[0xff, 0xfe]);
        match out.payload {
            Payload::Text(text) => assert!(text.contains('\u{FFFD}')),
            other => panic!("expected text payload, got {:?}", other),
        }
    }

    #[test]
    fn test_serialize_structured_inline() {
        let out = PayloadFormatter::default().format(br#"{"a":1}"#);
        assert_eq!(serde_json::to_value(&out.payload).unwrap(), json!({"a": 1}));
    }
}
