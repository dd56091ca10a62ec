//! Firestore JSON document encoding
//!
//! Shared by the REST backend (responses of `runQuery`) and the snapshot
//! backend (documents saved to disk in the same shape).

use crate::document::{FieldValue, RawDocument};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// A typed value, e.g. `{"stringValue": "Sul"}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Value {
    NullValue(()),
    BooleanValue(bool),
    /// Firestore sends 64-bit integers as decimal strings
    IntegerValue(String),
    DoubleValue(f64),
    TimestampValue(String),
    StringValue(String),
    BytesValue(String),
    ReferenceValue(String),
    GeoPointValue(GeoPoint),
    ArrayValue(ArrayValue),
    MapValue(MapValue),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ArrayValue {
    #[serde(default)]
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MapValue {
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
}

/// A stored document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Full resource name; the last path segment is the document id
    pub name: String,
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
}

impl Document {
    /// Document id: last segment of the resource name
    pub fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    pub fn into_raw(self) -> RawDocument {
        let id = self.id().to_string();
        let fields = self
            .fields
            .into_iter()
            .map(|(name, value)| {
                let decoded = decode_value(&id, &name, value);
                (name, decoded)
            })
            .collect();
        RawDocument { id, fields }
    }

    pub fn from_raw(doc: &RawDocument) -> Self {
        Self {
            name: doc.id.clone(),
            fields: doc
                .fields
                .iter()
                .map(|(name, value)| (name.clone(), encode_value(value)))
                .collect(),
            create_time: None,
            update_time: None,
        }
    }
}

/// Decode a wire value; unparsable integers and timestamps are kept as strings
fn decode_value(doc_id: &str, field: &str, value: Value) -> FieldValue {
    match value {
        Value::NullValue(()) => FieldValue::Null,
        Value::BooleanValue(b) => FieldValue::Boolean(b),
        Value::IntegerValue(s) => match s.parse::<i64>() {
            Ok(i) => FieldValue::Integer(i),
            Err(_) => {
                warn!(document = doc_id, field, value = %s, "integer value is not a number");
                FieldValue::String(s)
            }
        },
        Value::DoubleValue(d) => FieldValue::Double(d),
        Value::TimestampValue(s) => match DateTime::parse_from_rfc3339(&s) {
            Ok(ts) => FieldValue::Timestamp(ts.with_timezone(&Utc)),
            Err(_) => {
                warn!(document = doc_id, field, value = %s, "timestamp value is not RFC 3339");
                FieldValue::String(s)
            }
        },
        Value::StringValue(s) | Value::BytesValue(s) | Value::ReferenceValue(s) => {
            FieldValue::String(s)
        }
        Value::GeoPointValue(p) => FieldValue::Map(BTreeMap::from([
            ("latitude".to_string(), FieldValue::Double(p.latitude)),
            ("longitude".to_string(), FieldValue::Double(p.longitude)),
        ])),
        Value::ArrayValue(a) => FieldValue::Array(
            a.values
                .into_iter()
                .map(|v| decode_value(doc_id, field, v))
                .collect(),
        ),
        Value::MapValue(m) => FieldValue::Map(
            m.fields
                .into_iter()
                .map(|(k, v)| {
                    let decoded = decode_value(doc_id, field, v);
                    (k, decoded)
                })
                .collect(),
        ),
    }
}

/// Encode a field value for requests and snapshots
pub fn encode_value(value: &FieldValue) -> Value {
    match value {
        FieldValue::Null => Value::NullValue(()),
        FieldValue::Boolean(b) => Value::BooleanValue(*b),
        FieldValue::Integer(i) => Value::IntegerValue(i.to_string()),
        FieldValue::Double(d) => Value::DoubleValue(*d),
        FieldValue::Timestamp(ts) => {
            Value::TimestampValue(ts.to_rfc3339_opts(SecondsFormat::AutoSi, true))
        }
        FieldValue::String(s) => Value::StringValue(s.clone()),
        FieldValue::Array(values) => Value::ArrayValue(ArrayValue {
            values: values.iter().map(encode_value).collect(),
        }),
        FieldValue::Map(fields) => Value::MapValue(MapValue {
            fields: fields
                .iter()
                .map(|(k, v)| (k.clone(), encode_value(v)))
                .collect(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_decode_document_from_json() {
        let json = r#"{
            "name": "projects/p/databases/(default)/documents/attendance/abc123",
            "fields": {
                "fullName": {"stringValue": "Maria"},
                "age": {"integerValue": "41"},
                "timestamp": {"timestampValue": "2025-08-17T13:05:00.123456Z"},
                "absentReason": {"nullValue": null}
            },
            "createTime": "2025-08-17T13:05:00Z"
        }"#;
        let doc: Document = serde_json::from_str(json).unwrap();
        assert_eq!(doc.id(), "abc123");

        let raw = doc.into_raw();
        assert_eq!(raw.id, "abc123");
        assert_eq!(raw.get("fullName"), Some(&FieldValue::from("Maria")));
        assert_eq!(raw.get("age"), Some(&FieldValue::Integer(41)));
        assert_eq!(raw.get("absentReason"), Some(&FieldValue::Null));
        match raw.get("timestamp") {
            Some(FieldValue::Timestamp(ts)) => {
                assert_eq!(ts.timestamp(), 1755435900);
            }
            other => panic!("expected timestamp, got {:?}", other),
        }
    }

    #[test]
    fn test_bare_id_name() {
        let doc: Document = serde_json::from_str(r#"{"name": "doc-1"}"#).unwrap();
        assert_eq!(doc.id(), "doc-1");
        assert!(doc.fields.is_empty());
    }

    #[test]
    fn test_bad_timestamp_kept_as_string() {
        let json = r#"{"name": "x", "fields": {"timestamp": {"timestampValue": "garbage"}}}"#;
        let raw = serde_json::from_str::<Document>(json).unwrap().into_raw();
        assert_eq!(raw.get("timestamp"), Some(&FieldValue::from("garbage")));
    }

    #[test]
    fn test_nested_values() {
        let json = r#"{"name": "x", "fields": {
            "tags": {"arrayValue": {"values": [{"stringValue": "a"}, {"booleanValue": true}]}},
            "meta": {"mapValue": {"fields": {"score": {"doubleValue": 1.5}}}}
        }}"#;
        let raw = serde_json::from_str::<Document>(json).unwrap().into_raw();
        assert_eq!(
            raw.get("tags"),
            Some(&FieldValue::Array(vec![
                FieldValue::from("a"),
                FieldValue::Boolean(true)
            ]))
        );
        match raw.get("meta") {
            Some(FieldValue::Map(m)) => assert_eq!(m.get("score"), Some(&FieldValue::Double(1.5))),
            other => panic!("expected map, got {:?}", other),
        }
    }

    #[test]
    fn test_encode_timestamp_uses_utc_z_suffix() {
        let ts = Utc.with_ymd_and_hms(2025, 8, 17, 4, 0, 0).unwrap();
        assert_eq!(
            encode_value(&FieldValue::Timestamp(ts)),
            Value::TimestampValue("2025-08-17T04:00:00Z".to_string())
        );
    }

    #[test]
    fn test_encoded_null_serializes_as_json_null() {
        let json = serde_json::to_string(&encode_value(&FieldValue::Null)).unwrap();
        assert_eq!(json, r#"{"nullValue":null}"#);
    }
}
