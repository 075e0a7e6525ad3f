//! Codec between checklist JSON and Firestore REST documents.
//!
//! The REST API wraps every value in a type tag (`{"stringValue": "..."}`),
//! so documents are translated field by field on the way in and out.

use serde_json::{json, Map, Number, Value};

use crate::checklist::VehicleChecklist;
use crate::error::{BackendKind, Error, Result};

/// Wrap a plain JSON value in Firestore type tags.
#[must_use]
pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                json!({ "integerValue": i.to_string() })
            } else if let Some(u) = n.as_u64() {
                json!({ "integerValue": u.to_string() })
            } else {
                json!({ "doubleValue": n.as_f64() })
            }
        }
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            let values: Vec<Value> = items.iter().map(encode_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

fn encode_fields(map: &Map<String, Value>) -> Map<String, Value> {
    map.iter()
        .map(|(k, v)| (k.clone(), encode_value(v)))
        .collect()
}

/// Strip Firestore type tags from a value.
///
/// # Errors
///
/// Returns a description of the problem if the value carries an unknown or
/// malformed tag.
pub fn decode_value(value: &Value) -> std::result::Result<Value, String> {
    let Some(tagged) = value.as_object() else {
        return Err(format!("expected a typed value, found {value}"));
    };
    let Some((tag, inner)) = tagged.iter().next() else {
        return Err("empty typed value".to_string());
    };

    match tag.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" => inner
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| format!("bad booleanValue {inner}")),
        "integerValue" => {
            let parsed = match inner {
                Value::String(s) => s.parse::<i64>().ok(),
                other => other.as_i64(),
            };
            parsed
                .map(|i| Value::Number(i.into()))
                .ok_or_else(|| format!("bad integerValue {inner}"))
        }
        "doubleValue" => inner
            .as_f64()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| format!("bad doubleValue {inner}")),
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => inner
            .as_str()
            .map(|s| Value::String(s.to_string()))
            .ok_or_else(|| format!("bad {tag} {inner}")),
        "arrayValue" => {
            let values = inner.get("values").and_then(Value::as_array);
            values
                .map_or(&[][..], Vec::as_slice)
                .iter()
                .map(decode_value)
                .collect::<std::result::Result<Vec<_>, _>>()
                .map(Value::Array)
        }
        "mapValue" => decode_fields(inner.get("fields")).map(Value::Object),
        other => Err(format!("unsupported value type {other}")),
    }
}

fn decode_fields(fields: Option<&Value>) -> std::result::Result<Map<String, Value>, String> {
    let Some(fields) = fields else {
        return Ok(Map::new());
    };
    let fields = fields
        .as_object()
        .ok_or_else(|| format!("expected fields object, found {fields}"))?;

    fields
        .iter()
        .map(|(k, v)| decode_value(v).map(|v| (k.clone(), v)))
        .collect()
}

/// Build the request body for writing a checklist document.
///
/// # Errors
///
/// Returns an error if the checklist cannot be serialized.
pub fn to_document(checklist: &VehicleChecklist) -> Result<Value> {
    let plain = serde_json::to_value(checklist)?;
    let Value::Object(map) = plain else {
        return Err(Error::internal("checklist did not serialize to an object"));
    };
    Ok(json!({ "fields": encode_fields(&map) }))
}

/// Read a checklist out of a document returned by the REST API.
///
/// # Errors
///
/// Returns [`Error::BackendUnavailable`] if the document cannot be decoded.
pub fn from_document(document: &Value) -> Result<VehicleChecklist> {
    let fail = |message: String| {
        let name = document
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or("<unnamed>");
        Error::backend(
            BackendKind::Remote,
            format!("undecodable document {name}: {message}"),
        )
    };

    let fields = decode_fields(document.get("fields")).map_err(fail)?;
    serde_json::from_value(Value::Object(fields)).map_err(|e| fail(e.to_string()))
}
