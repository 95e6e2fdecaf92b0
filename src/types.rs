//! Core data model: dynamically typed [`Value`]s, named-field [`Record`]s and the [`Clumper`]
//! collection that the pipeline operations in [`crate::processing`] act on.
//!
//! Records in one collection do not have to share a shape. Every transformation produces
//! freshly owned records, so holding on to an earlier [`Clumper`] is always safe.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::{ClumpError, ClumpResult};

/// A single dynamically typed value stored under a record field.
///
/// Equality is numeric across [`Value::Int64`] and [`Value::Float64`], so `1 == 1.0`; every
/// other pair of variants is equal only when both variant and payload match.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "serde_json::Value", into = "serde_json::Value")]
pub enum Value {
    /// Missing/empty value.
    Null,
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit float.
    Float64(f64),
    /// Boolean.
    Bool(bool),
    /// UTF-8 string.
    Utf8(String),
    /// Nested record.
    Record(Record),
    /// Ordered sequence of values (may be heterogeneous).
    List(Vec<Value>),
}

impl Value {
    /// Human-readable name of the variant, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Int64(_) => "integer",
            Value::Float64(_) => "float",
            Value::Bool(_) => "boolean",
            Value::Utf8(_) => "string",
            Value::Record(_) => "record",
            Value::List(_) => "list",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int64(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric view of the value; integers widen to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int64(v) => Some(*v as f64),
            Value::Float64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Utf8(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Total order between two values, if one exists.
    ///
    /// - integers and floats compare numerically with each other
    /// - strings compare with strings, booleans with booleans
    /// - lists compare element-wise, then by length
    ///
    /// Nulls, records and NaN are not orderable and yield [`ClumpError::Incomparable`].
    /// Booleans are not numbers here: `true` against `1` is [`ClumpError::Incomparable`]
    /// rather than being ordered as `1 == 1` the way Python's `bool`/`int` pair is.
    pub fn try_cmp(&self, other: &Value) -> ClumpResult<Ordering> {
        let incomparable = || ClumpError::Incomparable {
            left: self.type_name(),
            right: other.type_name(),
        };

        match (self, other) {
            (Value::Int64(a), Value::Int64(b)) => Ok(a.cmp(b)),
            (Value::Int64(a), Value::Float64(b)) => cmp_int_float(*a, *b).ok_or_else(incomparable),
            (Value::Float64(a), Value::Int64(b)) => cmp_int_float(*b, *a)
                .map(Ordering::reverse)
                .ok_or_else(incomparable),
            (Value::Float64(a), Value::Float64(b)) => a.partial_cmp(b).ok_or_else(incomparable),
            (Value::Bool(a), Value::Bool(b)) => Ok(a.cmp(b)),
            (Value::Utf8(a), Value::Utf8(b)) => Ok(a.cmp(b)),
            (Value::List(a), Value::List(b)) => {
                for (x, y) in a.iter().zip(b) {
                    match x.try_cmp(y)? {
                        Ordering::Equal => {}
                        ord => return Ok(ord),
                    }
                }
                Ok(a.len().cmp(&b.len()))
            }
            _ => Err(incomparable()),
        }
    }
}

/// Exact comparison of an integer against a float, without widening the integer to `f64`
/// (which rounds above 2^53). `None` only for NaN.
fn cmp_int_float(i: i64, f: f64) -> Option<Ordering> {
    // 2^63, the first float past i64::MAX.
    const I64_END: f64 = 9_223_372_036_854_775_808.0;

    if f.is_nan() {
        return None;
    }
    if f >= I64_END {
        return Some(Ordering::Less);
    }
    if f < -I64_END {
        return Some(Ordering::Greater);
    }
    let whole = f.trunc();
    // In range: -2^63 <= whole < 2^63, so the cast is exact.
    match i.cmp(&(whole as i64)) {
        Ordering::Equal => 0.0_f64.partial_cmp(&(f - whole)),
        ord => Some(ord),
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Int64(a), Value::Int64(b)) => a == b,
            (Value::Float64(a), Value::Float64(b)) => a == b,
            (Value::Int64(a), Value::Float64(b)) | (Value::Float64(b), Value::Int64(a)) => {
                cmp_int_float(*a, *b) == Some(Ordering::Equal)
            }
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Utf8(a), Value::Utf8(b)) => a == b,
            (Value::Record(a), Value::Record(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            _ => false,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int64(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Utf8(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Utf8(v)
    }
}

impl From<Record> for Value {
    fn from(v: Record) -> Self {
        Value::Record(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// A set of uniquely named fields.
///
/// Insertion order is kept for readability (and for serialization), but it is not part of
/// equality: two records are equal when they hold the same fields with equal values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "serde_json::Value", into = "serde_json::Value")]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the position of a field by name, if present.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|(k, _)| k == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    /// Look up a field, returning `None` when absent.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    /// Look up a field, failing with [`ClumpError::MissingField`] when absent.
    ///
    /// This is the accessor predicates and derivers should use so a missing field aborts the
    /// operation via `?`.
    pub fn field(&self, name: &str) -> ClumpResult<&Value> {
        self.get(name).ok_or_else(|| ClumpError::missing(name))
    }

    /// Integer field.
    pub fn int(&self, name: &str) -> ClumpResult<i64> {
        let v = self.field(name)?;
        v.as_i64().ok_or_else(|| mismatch(name, "integer", v))
    }

    /// Numeric field; integers widen to `f64`.
    pub fn float(&self, name: &str) -> ClumpResult<f64> {
        let v = self.field(name)?;
        v.as_f64().ok_or_else(|| mismatch(name, "number", v))
    }

    /// String field.
    pub fn text(&self, name: &str) -> ClumpResult<&str> {
        let v = self.field(name)?;
        v.as_str().ok_or_else(|| mismatch(name, "string", v))
    }

    /// Boolean field.
    pub fn flag(&self, name: &str) -> ClumpResult<bool> {
        let v = self.field(name)?;
        v.as_bool().ok_or_else(|| mismatch(name, "boolean", v))
    }

    /// Set a field. An existing field is overwritten in place and its old value returned.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let name = name.into();
        let value = value.into();
        match self.index_of(&name) {
            Some(idx) => Some(std::mem::replace(&mut self.fields[idx].1, value)),
            None => {
                self.fields.push((name, value));
                None
            }
        }
    }

    /// Remove a field, returning its value if it was present.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let idx = self.index_of(name)?;
        Some(self.fields.remove(idx).1)
    }

    /// Field names in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    /// `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

fn mismatch(field: &str, expected: &'static str, found: &Value) -> ClumpError {
    ClumpError::TypeMismatch {
        field: field.to_string(),
        expected,
        found: found.type_name(),
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl<K, V> FromIterator<(K, V)> for Record
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

/// An ordered, chainable collection of [`Record`]s.
///
/// Every transformation (see [`crate::processing`]) borrows `self` and returns a new,
/// independently owned `Clumper`; the receiver is never modified.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Clumper {
    records: Vec<Record>,
}

impl Clumper {
    /// Create a collection from records, kept in the given order. No shape validation is done.
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// Borrow the records without copying.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Materialize the collection as a plain ordered list of records.
    pub fn collect(&self) -> Vec<Record> {
        self.records.clone()
    }

    /// Consuming variant of [`Self::collect`].
    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    /// Returns `true` if the collection holds exactly `expected`, in order.
    ///
    /// Records compare field-wise regardless of field order, and numbers compare by value,
    /// so a record parsed from `{"a": 1.0}` equals one built with `("a", 1)`.
    pub fn equals(&self, expected: &[Record]) -> bool {
        self.records.as_slice() == expected
    }
}

impl From<Vec<Record>> for Clumper {
    fn from(records: Vec<Record>) -> Self {
        Self::new(records)
    }
}

/// A lone record becomes a one-element collection.
impl From<Record> for Clumper {
    fn from(record: Record) -> Self {
        Self::new(vec![record])
    }
}

impl FromIterator<Record> for Clumper {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl IntoIterator for Clumper {
    type Item = Record;
    type IntoIter = std::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a Clumper {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
