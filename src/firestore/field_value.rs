//! Record and field value helpers
//!
//! Records are schemaless string-keyed maps of JSON values. The helpers here
//! implement Firestore's cross-type value ordering so that in-process
//! evaluation of filters and orderings agrees with the server.
//!
//! # REST Reference
//! - `https://firebase.google.com/docs/firestore/manage-data/data-types` (value type ordering)

use serde_json::Value;
use std::cmp::Ordering;

/// A single stored document's fields
pub type Record = serde_json::Map<String, Value>;

/// Rank of a value's type in Firestore ordering
///
/// null < boolean < number < string < array < map
fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Compare two numbers numerically, integers exactly and mixed pairs as f64
fn compare_numbers(a: &serde_json::Number, b: &serde_json::Number) -> Ordering {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return x.cmp(&y);
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return x.cmp(&y);
    }
    let x = a.as_f64().unwrap_or(f64::NAN);
    let y = b.as_f64().unwrap_or(f64::NAN);
    // NaN sorts before every other number
    match (x.is_nan(), y.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
    }
}

/// Total order over field values following Firestore's rules
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    let rank = type_rank(a).cmp(&type_rank(b));
    if rank != Ordering::Equal {
        return rank;
    }

    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => compare_numbers(x, y),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(xs), Value::Array(ys)) => {
            for (x, y) in xs.iter().zip(ys.iter()) {
                let ord = compare_values(x, y);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            xs.len().cmp(&ys.len())
        }
        (Value::Object(xs), Value::Object(ys)) => {
            // serde_json maps iterate in key order
            for ((kx, vx), (ky, vy)) in xs.iter().zip(ys.iter()) {
                let ord = kx.cmp(ky).then_with(|| compare_values(vx, vy));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            xs.len().cmp(&ys.len())
        }
        _ => Ordering::Equal,
    }
}

/// Equality under Firestore rules (`1 == 1.0`)
pub fn values_equal(a: &Value, b: &Value) -> bool {
    compare_values(a, b) == Ordering::Equal
}

/// Whether two values belong to the same ordering class
///
/// Range comparisons only match values of the filter value's type.
pub fn same_type_class(a: &Value, b: &Value) -> bool {
    type_rank(a) == type_rank(b)
}

/// Resolve a dotted field path (`"address.city"`) inside a record
pub fn lookup_field<'a>(record: &'a Record, field_path: &str) -> Option<&'a Value> {
    let mut segments = field_path.split('.');
    let first = segments.next()?;
    let mut current = record.get(first)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Write `value` at a dotted field path, creating intermediate maps
///
/// A non-map value sitting on the path is replaced by a map.
pub fn set_field(record: &mut Record, field_path: &str, value: Value) {
    let Some((head, rest)) = field_path.split_once('.') else {
        record.insert(field_path.to_string(), value);
        return;
    };
    let entry = record
        .entry(head.to_string())
        .or_insert_with(|| Value::Object(Record::new()));
    if !entry.is_object() {
        *entry = Value::Object(Record::new());
    }
    if let Value::Object(child) = entry {
        set_field(child, rest, value);
    }
}
