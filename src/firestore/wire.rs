//! Firestore v1 REST wire types
//!
//! Converts between plain JSON records and Firestore's typed value JSON,
//! and compiles a [`QueryState`] into a `StructuredQuery` body.
//!
//! # REST Reference
//! - `https://firebase.google.com/docs/firestore/reference/rest/v1/Value`
//! - `https://firebase.google.com/docs/firestore/reference/rest/v1/StructuredQuery`

use super::field_value::Record;
use super::filter::{Filter, Operator};
use super::query::QueryState;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Typed Firestore value as it appears on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) enum WireValue {
    NullValue(()),
    BooleanValue(bool),
    IntegerValue(String), // Firestore sends integers as strings
    DoubleValue(f64),
    TimestampValue(String),
    StringValue(String),
    BytesValue(String), // base64 encoded
    ReferenceValue(String),
    GeoPointValue(LatLng),
    ArrayValue(ArrayValue),
    MapValue(MapValue),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct LatLng {
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub(crate) struct ArrayValue {
    #[serde(default)]
    pub values: Vec<WireValue>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub(crate) struct MapValue {
    #[serde(default)]
    pub fields: BTreeMap<String, WireValue>,
}

/// Document resource
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireDocument {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default)]
    pub fields: BTreeMap<String, WireValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
}

/// One element of a `runQuery` response array
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RunQueryResponse {
    #[serde(default)]
    pub document: Option<WireDocument>,
}

impl From<&Value> for WireValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => WireValue::NullValue(()),
            Value::Bool(b) => WireValue::BooleanValue(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => WireValue::IntegerValue(i.to_string()),
                None => WireValue::DoubleValue(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => WireValue::StringValue(s.clone()),
            Value::Array(items) => WireValue::ArrayValue(ArrayValue {
                values: items.iter().map(WireValue::from).collect(),
            }),
            Value::Object(map) => WireValue::MapValue(MapValue {
                fields: encode_fields(map),
            }),
        }
    }
}

impl From<WireValue> for Value {
    fn from(value: WireValue) -> Self {
        match value {
            WireValue::NullValue(()) => Value::Null,
            WireValue::BooleanValue(b) => Value::Bool(b),
            WireValue::IntegerValue(s) => match s.parse::<i64>() {
                Ok(i) => Value::from(i),
                Err(_) => Value::String(s),
            },
            // JSON has no NaN or infinities
            WireValue::DoubleValue(f) => serde_json::Number::from_f64(f).map_or(Value::Null, Value::Number),
            WireValue::TimestampValue(s)
            | WireValue::StringValue(s)
            | WireValue::BytesValue(s)
            | WireValue::ReferenceValue(s) => Value::String(s),
            WireValue::GeoPointValue(point) => json!({
                "latitude": point.latitude,
                "longitude": point.longitude,
            }),
            WireValue::ArrayValue(array) => Value::Array(array.values.into_iter().map(Value::from).collect()),
            WireValue::MapValue(map) => Value::Object(decode_fields(map.fields)),
        }
    }
}

/// Encode a record's fields
pub(crate) fn encode_fields(record: &Record) -> BTreeMap<String, WireValue> {
    record
        .iter()
        .map(|(key, value)| (key.clone(), WireValue::from(value)))
        .collect()
}

/// Decode wire fields into a record
pub(crate) fn decode_fields(fields: BTreeMap<String, WireValue>) -> Record {
    fields
        .into_iter()
        .map(|(key, value)| (key, Value::from(value)))
        .collect()
}

fn is_simple_segment(segment: &str) -> bool {
    let mut chars = segment.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_') && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Quote each segment of a dotted field path that is not a plain identifier
pub(crate) fn quote_field_path(field_path: &str) -> String {
    field_path
        .split('.')
        .map(|segment| {
            if is_simple_segment(segment) {
                segment.to_string()
            } else {
                format!("`{}`", segment.replace('\\', "\\\\").replace('`', "\\`"))
            }
        })
        .collect::<Vec<_>>()
        .join(".")
}

fn field_reference(field_path: &str) -> Value {
    json!({ "fieldPath": quote_field_path(field_path) })
}

fn compile_filter(filter: &Filter) -> Value {
    // null comparisons must be sent as unary filters
    let unary = match (filter.operator(), filter.value()) {
        (Operator::Equal, Value::Null) => Some("IS_NULL"),
        (Operator::NotEqual, Value::Null) => Some("IS_NOT_NULL"),
        _ => None,
    };
    if let Some(op) = unary {
        return json!({
            "unaryFilter": {
                "op": op,
                "field": field_reference(filter.field()),
            }
        });
    }

    json!({
        "fieldFilter": {
            "field": field_reference(filter.field()),
            "op": filter.operator().rest_name(),
            "value": WireValue::from(filter.value()),
        }
    })
}

/// Compile a query into a `runQuery` request body
pub(crate) fn structured_query(query: &QueryState) -> Value {
    let mut structured = serde_json::Map::new();
    structured.insert(
        "from".to_string(),
        json!([{
            "collectionId": query.collection_id,
            "allDescendants": query.all_descendants,
        }]),
    );

    let mut filters: Vec<Value> = query.filters.iter().map(compile_filter).collect();
    if filters.len() == 1 {
        structured.insert("where".to_string(), filters.remove(0));
    } else if filters.len() > 1 {
        structured.insert(
            "where".to_string(),
            json!({ "compositeFilter": { "op": "AND", "filters": filters } }),
        );
    }

    if !query.orders.is_empty() {
        let orders: Vec<Value> = query
            .orders
            .iter()
            .map(|order| {
                json!({
                    "field": field_reference(order.field_path()),
                    "direction": order.direction().rest_name(),
                })
            })
            .collect();
        structured.insert("orderBy".to_string(), Value::Array(orders));
    }

    if let Some(limit) = query.limit {
        structured.insert("limit".to_string(), json!(limit));
    }

    json!({ "structuredQuery": structured })
}
