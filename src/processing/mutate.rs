//! Computed-field derivation for [`crate::types::Clumper`].

use std::fmt;

use crate::error::ClumpResult;
use crate::types::{Clumper, Record, Value};

/// A boxed function computing one field value from a record.
pub type Deriver<'a> = Box<dyn Fn(&Record) -> ClumpResult<Value> + 'a>;

/// An ordered list of `field := f(record)` assignments for [`Clumper::mutate`].
///
/// ```rust
/// use clumper::processing::Assignments;
/// use clumper::types::Value;
///
/// let assignments = Assignments::new()
///     .assign("c", |r| Ok(Value::from(r.int("a")? + r.int("b")?)))
///     .assign("s", |r| Ok(Value::from(r.int("a")? + r.int("b")? + r.int("c")?)));
/// assert_eq!(assignments.len(), 2);
/// ```
#[derive(Default)]
pub struct Assignments<'a> {
    steps: Vec<(String, Deriver<'a>)>,
}

impl<'a> Assignments<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an assignment. Later assignments see the fields set by earlier ones.
    pub fn assign<F>(mut self, field: impl Into<String>, deriver: F) -> Self
    where
        F: Fn(&Record) -> ClumpResult<Value> + 'a,
    {
        self.steps.push((field.into(), Box::new(deriver)));
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl fmt::Debug for Assignments<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Assignments")
            .field("fields", &self.steps.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>())
            .finish()
    }
}

impl Clumper {
    /// Add or overwrite fields on copies of every record.
    ///
    /// Assignments run one at a time across the whole collection, in the order they were
    /// added, so each deriver sees the record as left by the previous assignment. The
    /// receiver's records are never modified.
    pub fn mutate(&self, assignments: Assignments<'_>) -> ClumpResult<Self> {
        let mut records = self.collect();
        for (field, deriver) in &assignments.steps {
            for record in records.iter_mut() {
                let value = deriver(&*record)?;
                record.insert(field.as_str(), value);
            }
        }
        Ok(Self::new(records))
    }

    /// Shorthand for a [`Self::mutate`] call with a single assignment.
    pub fn mutate_field<'a, F>(&self, field: &str, deriver: F) -> ClumpResult<Self>
    where
        F: Fn(&Record) -> ClumpResult<Value> + 'a,
    {
        self.mutate(Assignments::new().assign(field, deriver))
    }
}
