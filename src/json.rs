//! Conversions between the record model and [`serde_json::Value`].
//!
//! These back the `serde` implementations of [`Value`], [`Record`] and [`Clumper`]; callers
//! that already hold parsed JSON can also convert directly:
//!
//! - objects become records (key order preserved as delivered by `serde_json`)
//! - arrays become lists
//! - integral numbers become [`Value::Int64`]; anything else (including `u64` beyond `i64`)
//!   becomes [`Value::Float64`]
//!
//! Non-finite floats have no JSON representation and are written as `null`.

use crate::error::{ClumpError, ClumpResult};
use crate::types::{Clumper, Record, Value};

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int64(i),
                None => n.as_f64().map(Value::Float64).unwrap_or(Value::Null),
            },
            serde_json::Value::String(s) => Value::Utf8(s),
            serde_json::Value::Array(items) => Value::List(items.into_iter().map(Value::from).collect()),
            serde_json::Value::Object(map) => Value::Record(record_from_map(map)),
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => serde_json::Value::Null,
            Value::Int64(i) => serde_json::Value::from(i),
            Value::Float64(f) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Utf8(s) => serde_json::Value::String(s),
            Value::Record(r) => serde_json::Value::from(r),
            Value::List(items) => serde_json::Value::Array(items.into_iter().map(Into::into).collect()),
        }
    }
}

impl TryFrom<serde_json::Value> for Record {
    type Error = ClumpError;

    fn try_from(v: serde_json::Value) -> ClumpResult<Self> {
        match v {
            serde_json::Value::Object(map) => Ok(record_from_map(map)),
            other => Err(ClumpError::NotARecord {
                found: json_type_name(&other),
            }),
        }
    }
}

impl From<Record> for serde_json::Value {
    fn from(r: Record) -> Self {
        let map = r
            .into_iter()
            .map(|(k, v)| (k, serde_json::Value::from(v)))
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(map)
    }
}

/// Accepts a single object (wrapped into a one-record collection) or an array of objects.
impl TryFrom<serde_json::Value> for Clumper {
    type Error = ClumpError;

    fn try_from(v: serde_json::Value) -> ClumpResult<Self> {
        match v {
            serde_json::Value::Array(items) => items
                .into_iter()
                .map(Record::try_from)
                .collect::<ClumpResult<Clumper>>(),
            obj @ serde_json::Value::Object(_) => Record::try_from(obj).map(Clumper::from),
            other => Err(ClumpError::NotARecord {
                found: json_type_name(&other),
            }),
        }
    }
}

fn record_from_map(map: serde_json::Map<String, serde_json::Value>) -> Record {
    map.into_iter().map(|(k, v)| (k, Value::from(v))).collect()
}

fn json_type_name(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
