//! Write Options
//!
//! Options accepted by [`EntryStore::set`](crate::cache::EntryStore::set).
//! `expire` is kept as raw JSON so loosely-typed callers (HTTP bodies,
//! config maps) go through the same validation as typed ones.

use serde::Deserialize;
use serde_json::Value;

use crate::error::{CacheError, Result};

// == Set Options ==
/// Per-write options. Unknown fields are ignored when deserializing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SetOptions {
    /// Lifetime in seconds; see `ttl` for the accepted forms
    pub expire: Option<Value>,
    /// Refuse later writes and removals until expiry or clear
    #[serde(rename = "readOnly", alias = "readonly")]
    pub read_only: bool,
}

impl SetOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expires the entry `secs` seconds after the write.
    pub fn expire(mut self, secs: u64) -> Self {
        self.expire = Some(Value::from(secs));
        self
    }

    /// Sets an unvalidated expiration, checked when the write happens.
    pub fn expire_raw(mut self, raw: impl Into<Value>) -> Self {
        self.expire = Some(raw.into());
        self
    }

    /// Marks the entry read-only.
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    // == TTL ==
    /// Validates `expire`.
    ///
    /// # Returns
    /// - `Ok(None)` when no expiration was requested
    /// - `Ok(Some(secs))` for a lifetime of at least one whole second
    /// - `Err(CacheError::InvalidRequest)` for anything else
    pub fn ttl(&self) -> Result<Option<u64>> {
        match &self.expire {
            None => Ok(None),
            Some(raw) => parse_expire(raw).map(Some).ok_or_else(|| {
                CacheError::InvalidRequest(format!(
                    "expire must be a positive number of seconds, got {}",
                    raw
                ))
            }),
        }
    }
}

/// Numbers and numeric strings follow one rule: the value is read as a
/// number (strings may carry surrounding whitespace) and truncated toward
/// zero. The result has to be at least one second.
fn parse_expire(raw: &Value) -> Option<u64> {
    let secs = match raw {
        Value::Number(number) => number
            .as_u64()
            .or_else(|| whole_seconds(number.as_f64()?))?,
        Value::String(text) => {
            let text = text.trim();
            text.parse::<u64>()
                .ok()
                .or_else(|| whole_seconds(text.parse::<f64>().ok()?))?
        }
        _ => return None,
    };

    (secs > 0).then_some(secs)
}

fn whole_seconds(float: f64) -> Option<u64> {
    let float = float.trunc();
    (float >= 1.0 && float < u64::MAX as f64).then_some(float as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_has_no_ttl() {
        let options = SetOptions::new();
        assert_eq!(options.ttl().unwrap(), None);
        assert!(!options.read_only);
    }

    #[test]
    fn test_builder() {
        let options = SetOptions::new().expire(3600).read_only();
        assert_eq!(options.ttl().unwrap(), Some(3600));
        assert!(options.read_only);
    }

    #[test]
    fn test_accepted_expire_values() {
        for (raw, expected) in [
            (json!(1), 1),
            (json!(3600), 3600),
            (json!(90.9), 90),
            (json!("120"), 120),
            (json!(" 45 "), 45),
            (json!("90.5"), 90),
            (json!(" 7.9 "), 7),
        ] {
            let options = SetOptions::new().expire_raw(raw.clone());
            assert_eq!(options.ttl().unwrap(), Some(expected), "{raw}");
        }
    }

    #[test]
    fn test_numbers_and_strings_agree() {
        for (number, text) in [
            (json!(90.5), json!("90.5")),
            (json!(60), json!("60")),
            (json!(0.9), json!("0.9")),
            (json!(-2), json!("-2")),
        ] {
            let from_number = SetOptions::new().expire_raw(number).ttl().ok();
            let from_text = SetOptions::new().expire_raw(text).ttl().ok();
            assert_eq!(from_number, from_text);
        }
    }

    #[test]
    fn test_rejected_expire_values() {
        for raw in [
            json!("notAnInt"),
            json!(""),
            json!("12abc"),
            json!("0.5"),
            json!("-3"),
            json!("NaN"),
            json!("inf"),
            json!(0),
            json!(-5),
            json!(0.5),
            json!(-3.2),
            json!(true),
            json!(null),
            json!([60]),
            json!({"secs": 60}),
        ] {
            let options = SetOptions::new().expire_raw(raw.clone());
            assert!(
                matches!(options.ttl(), Err(CacheError::InvalidRequest(_))),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn test_deserialize_from_json_map() {
        let options: SetOptions =
            serde_json::from_str(r#"{"expire": 60, "readOnly": true, "color": "blue"}"#).unwrap();
        assert_eq!(options.ttl().unwrap(), Some(60));
        assert!(options.read_only);

        let lower: SetOptions = serde_json::from_str(r#"{"readonly": true}"#).unwrap();
        assert!(lower.read_only);
        assert!(lower.expire.is_none());

        let empty: SetOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, SetOptions::default());
    }
}
