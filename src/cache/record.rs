//! Record Codec
//!
//! Packs an [`Entry`] into the single string stored in the engine and reads
//! it back. The record is a JSON object with positional slot keys:
//!
//! | slot  | field        | when present            |
//! |-------|--------------|-------------------------|
//! | `"0"` | value        | always                  |
//! | `"1"` | created_at   | always for our writes   |
//! | `"2"` | expires_at   | only with a TTL         |
//! | `"3"` | read_only    | only when `true`        |
//!
//! e.g. `{"0":"world","1":1451602800,"3":true}`

use serde_json::{Map, Value};

use crate::cache::Entry;

const SLOT_VALUE: &str = "0";
const SLOT_CREATED: &str = "1";
const SLOT_EXPIRES: &str = "2";
const SLOT_READ_ONLY: &str = "3";

const SLOTS: [&str; 4] = [SLOT_VALUE, SLOT_CREATED, SLOT_EXPIRES, SLOT_READ_ONLY];

/// Serializes an entry into its stored form.
pub fn encode(entry: &Entry) -> String {
    let mut record = Map::new();
    record.insert(SLOT_VALUE.to_string(), entry.value.clone());
    if let Some(created) = entry.created_at {
        record.insert(SLOT_CREATED.to_string(), Value::from(created));
    }
    if let Some(expires) = entry.expires_at {
        record.insert(SLOT_EXPIRES.to_string(), Value::from(expires));
    }
    if entry.read_only {
        record.insert(SLOT_READ_ONLY.to_string(), Value::Bool(true));
    }

    Value::Object(record).to_string()
}

/// Parses a stored string.
///
/// Returns `None` when the string is not a record of the expected shape; the
/// caller then treats it as a foreign entry.
pub fn decode(raw: &str) -> Option<Entry> {
    let Value::Object(mut record) = serde_json::from_str::<Value>(raw).ok()? else {
        return None;
    };

    if !record.keys().all(|key| SLOTS.contains(&key.as_str())) {
        return None;
    }

    let value = record.remove(SLOT_VALUE)?;
    let created_at = timestamp_slot(record.remove(SLOT_CREATED))?;
    let expires_at = timestamp_slot(record.remove(SLOT_EXPIRES))?;
    let read_only = match record.remove(SLOT_READ_ONLY) {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => flag,
        Some(_) => return None,
    };

    Some(Entry {
        value,
        created_at,
        expires_at,
        read_only,
    })
}

/// Outer `None` = malformed slot, inner `None` = slot absent.
fn timestamp_slot(slot: Option<Value>) -> Option<Option<i64>> {
    match slot {
        None | Some(Value::Null) => Some(None),
        Some(value) => value.as_i64().map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const CREATED: i64 = 1_451_602_800;

    #[test]
    fn test_encode_plain_string() {
        let entry = Entry::new(json!("world"), CREATED, None, false);
        assert_eq!(encode(&entry), r#"{"0":"world","1":1451602800}"#);
    }

    #[test]
    fn test_encode_with_expiration() {
        let entry = Entry::new(json!("world"), CREATED, Some(3600), false);
        assert_eq!(
            encode(&entry),
            r#"{"0":"world","1":1451602800,"2":1451606400}"#
        );
    }

    #[test]
    fn test_encode_read_only_skips_expiration_slot() {
        let entry = Entry::new(json!("world"), CREATED, None, true);
        assert_eq!(encode(&entry), r#"{"0":"world","1":1451602800,"3":true}"#);
    }

    #[test]
    fn test_encode_structured_values() {
        let array = Entry::new(json!([1, 2, 3]), CREATED, None, false);
        assert_eq!(encode(&array), r#"{"0":[1,2,3],"1":1451602800}"#);

        let object = Entry::new(json!({"t1": 1, "t2": 2}), CREATED, None, false);
        assert_eq!(encode(&object), r#"{"0":{"t1":1,"t2":2},"1":1451602800}"#);
    }

    #[test]
    fn test_decode_full_record() {
        let entry = decode(r#"{"0":"world","1":1451602800,"2":1451606400,"3":true}"#).unwrap();

        assert_eq!(entry.value, json!("world"));
        assert_eq!(entry.created_at, Some(CREATED));
        assert_eq!(entry.expires_at, Some(CREATED + 3600));
        assert!(entry.read_only);
    }

    #[test]
    fn test_decode_value_only_record() {
        let entry = decode(r#"{"0":"bare"}"#).unwrap();

        assert_eq!(entry.value, json!("bare"));
        assert!(entry.created_at.is_none());
        assert!(!entry.read_only);
    }

    #[test]
    fn test_decode_rejects_non_records() {
        for raw in [
            "oh no!!!",
            "",
            "42",
            r#""a json string""#,
            "[1,2,3]",
            "null",
            r#"{"name":"someone else's object"}"#,
            r#"{"1":1451602800}"#,
            r#"{"0":"v","4":"extra slot"}"#,
            r#"{"0":"v","1":"yesterday"}"#,
            r#"{"0":"v","2":12.5}"#,
            r#"{"0":"v","3":"true"}"#,
            "{\"0\":\"unterminated\"",
        ] {
            assert!(decode(raw).is_none(), "{raw:?} should not decode");
        }
    }

    #[test]
    fn test_decode_accepts_null_optional_slots() {
        let entry = decode(r#"{"0":"v","1":10,"2":null,"3":null}"#).unwrap();
        assert!(entry.expires_at.is_none());
        assert!(!entry.read_only);
    }
}
