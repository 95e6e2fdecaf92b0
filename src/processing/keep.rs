//! Record filtering for [`crate::types::Clumper`].

use crate::error::ClumpResult;
use crate::types::{Clumper, Record};

/// A boxed record predicate, used when several predicates are passed together.
pub type Predicate<'a> = Box<dyn Fn(&Record) -> ClumpResult<bool> + 'a>;

impl Clumper {
    /// Create a new collection containing only records for which `predicate` returns
    /// `Ok(true)`. Relative order is preserved.
    ///
    /// The first error returned by `predicate` aborts the whole operation.
    pub fn keep<F>(&self, mut predicate: F) -> ClumpResult<Self>
    where
        F: FnMut(&Record) -> ClumpResult<bool>,
    {
        let mut records = Vec::new();
        for record in self.iter() {
            if predicate(record)? {
                records.push(record.clone());
            }
        }
        Ok(Self::new(records))
    }

    /// Apply several predicates as successive full passes; a record survives only if every
    /// predicate accepts it. With no predicates this returns an identical copy.
    pub fn keep_all<'a, I>(&self, predicates: I) -> ClumpResult<Self>
    where
        I: IntoIterator<Item = Predicate<'a>>,
    {
        predicates
            .into_iter()
            .try_fold(self.clone(), |current, predicate| current.keep(predicate))
    }
}

/// Returns a new [`Clumper`] containing only records accepted by `predicate`.
///
/// This is a convenience wrapper around [`Clumper::keep`].
pub fn keep<F>(clumper: &Clumper, predicate: F) -> ClumpResult<Clumper>
where
    F: FnMut(&Record) -> ClumpResult<bool>,
{
    clumper.keep(predicate)
}
