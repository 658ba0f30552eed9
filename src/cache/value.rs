//! Cache Value Module
//!
//! The content stored under a key: either a plain string or a structured
//! value that is serialized to tagged text before it goes into a record.
//!
//! # Content encoding
//! - `N;` null
//! - `b:0;` / `b:1;` booleans
//! - `i:<n>;` integers, `d:<n>;` floats
//! - `j:<json>;` arrays and objects
//!
//! Strings are stored verbatim with no tag.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Number, Value};

use crate::error::{CacheError, Result};

/// Serialized form of boolean `false`.
pub const FALSE_CONTENT: &str = "b:0;";

// == Cache Value ==
/// Content of a cache entry.
///
/// Reading back is lenient: a stored string that happens to match the
/// tagged syntax (say `"i:42;"`) comes back as `Structured`. Any other
/// string is returned unchanged.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheValue {
    /// Stored as-is
    Text(String),
    /// Stored in tagged form
    Structured(Value),
}

impl CacheValue {
    /// Serializes any `Serialize` type into a cache value.
    pub fn structured<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        serde_json::to_value(value)
            .map(Self::from)
            .map_err(|e| CacheError::Encode(e.to_string()))
    }

    /// Converts the stored content back into a concrete type.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        let value = match self {
            CacheValue::Text(s) => Value::String(s.clone()),
            CacheValue::Structured(v) => v.clone(),
        };
        serde_json::from_value(value).map_err(|e| CacheError::TypeMismatch(e.to_string()))
    }

    /// Returns the string form written into the record's `content` field.
    pub fn to_content(&self) -> Result<String> {
        match self {
            CacheValue::Text(s) => Ok(s.clone()),
            CacheValue::Structured(v) => encode_tagged(v),
        }
    }

    // == From Content ==
    /// Rebuilds a value from a record's `content` field.
    ///
    /// A decoded `false` is indistinguishable from a failed decode, so it is
    /// only accepted when the content is exactly the canonical `false` form.
    pub fn from_content(content: String) -> Self {
        match decode_tagged(&content) {
            Some(Value::Bool(false)) | None => {
                if content == FALSE_CONTENT {
                    CacheValue::Structured(Value::Bool(false))
                } else {
                    CacheValue::Text(content)
                }
            }
            Some(value) => Self::from(value),
        }
    }

    // == Truthiness ==
    /// Loose truthiness: `false`, `null`, zero, `""`, `"0"` and empty
    /// arrays/objects are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            CacheValue::Text(s) => !(s.is_empty() || s == "0"),
            CacheValue::Structured(v) => match v {
                Value::Null => false,
                Value::Bool(b) => *b,
                Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
                Value::String(s) => !(s.is_empty() || s == "0"),
                Value::Array(a) => !a.is_empty(),
                Value::Object(o) => !o.is_empty(),
            },
        }
    }
}

fn encode_tagged(value: &Value) -> Result<String> {
    Ok(match value {
        Value::Null => "N;".to_string(),
        Value::Bool(b) => format!("b:{};", u8::from(*b)),
        Value::Number(n) if n.is_f64() => format!("d:{};", n),
        Value::Number(n) => format!("i:{};", n),
        Value::String(s) => s.clone(),
        Value::Array(_) | Value::Object(_) => {
            let json = serde_json::to_string(value).map_err(|e| CacheError::Encode(e.to_string()))?;
            format!("j:{};", json)
        }
    })
}

/// Parses tagged content. `None` means the text is not in tagged form.
fn decode_tagged(content: &str) -> Option<Value> {
    if content == "N;" {
        return Some(Value::Null);
    }
    let body = content.strip_suffix(';')?;
    let (tag, payload) = body.split_once(':')?;
    match tag {
        "b" => match payload {
            "0" => Some(Value::Bool(false)),
            "1" => Some(Value::Bool(true)),
            _ => None,
        },
        "i" => serde_json::from_str::<Number>(payload)
            .ok()
            .filter(|n| !n.is_f64())
            .map(Value::Number),
        "d" => serde_json::from_str::<Number>(payload).ok().map(Value::Number),
        "j" => serde_json::from_str::<Value>(payload)
            .ok()
            .filter(|v| v.is_array() || v.is_object()),
        _ => None,
    }
}

impl From<Value> for CacheValue {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => CacheValue::Text(s),
            other => CacheValue::Structured(other),
        }
    }
}

impl From<String> for CacheValue {
    fn from(value: String) -> Self {
        CacheValue::Text(value)
    }
}

impl From<&str> for CacheValue {
    fn from(value: &str) -> Self {
        CacheValue::Text(value.to_string())
    }
}

impl From<bool> for CacheValue {
    fn from(value: bool) -> Self {
        CacheValue::Structured(Value::Bool(value))
    }
}

impl From<i64> for CacheValue {
    fn from(value: i64) -> Self {
        CacheValue::Structured(Value::from(value))
    }
}

impl fmt::Display for CacheValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheValue::Text(s) => f.write_str(s),
            CacheValue::Structured(v) => write!(f, "{}", v),
        }
    }
}
