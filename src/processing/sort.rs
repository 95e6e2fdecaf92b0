//! Stable sorting for [`crate::types::Clumper`].
//!
//! Sorting is a fallible merge sort over record indices: keys are compared with
//! [`Value::try_cmp`] and the first unorderable pair aborts the sort with
//! [`crate::ClumpError::Incomparable`].

use std::cmp::Ordering;

use crate::error::ClumpResult;
use crate::types::{Clumper, Record, Value};

impl Clumper {
    /// Reorder records by the value `key` computes for each, ascending (descending when
    /// `reverse` is set).
    ///
    /// The sort is stable in both directions: records with equal keys keep their original
    /// relative order. All keys are computed before any comparison, so a failing key
    /// function aborts before sorting starts.
    pub fn sort<F>(&self, key: F, reverse: bool) -> ClumpResult<Self>
    where
        F: FnMut(&Record) -> ClumpResult<Value>,
    {
        let keys = self.iter().map(key).collect::<ClumpResult<Vec<_>>>()?;
        let order = sorted_order(&keys, reverse)?;
        Ok(order.into_iter().map(|i| self.records()[i].clone()).collect())
    }

    /// Shorthand for sorting by a single field's value.
    pub fn sort_by_field(&self, field: &str, reverse: bool) -> ClumpResult<Self> {
        self.sort(|r| r.field(field).cloned(), reverse)
    }
}

/// Indices of `keys` in stable sorted order.
pub(crate) fn sorted_order(keys: &[Value], reverse: bool) -> ClumpResult<Vec<usize>> {
    merge_sort((0..keys.len()).collect(), keys, reverse)
}

pub(crate) fn merge_sort(mut order: Vec<usize>, keys: &[Value], reverse: bool) -> ClumpResult<Vec<usize>> {
    if order.len() <= 1 {
        return Ok(order);
    }
    let right = order.split_off(order.len() / 2);
    let left = merge_sort(order, keys, reverse)?;
    let right = merge_sort(right, keys, reverse)?;
    merge(&left, &right, keys, reverse)
}

/// Merge two sorted index runs. On ties the left run wins, which keeps the sort stable.
pub(crate) fn merge(left: &[usize], right: &[usize], keys: &[Value], reverse: bool) -> ClumpResult<Vec<usize>> {
    let mut out = Vec::with_capacity(left.len() + right.len());
    let (mut i, mut j) = (0, 0);
    while i < left.len() && j < right.len() {
        let ord = keys[right[j]].try_cmp(&keys[left[i]])?;
        let right_first = if reverse {
            ord == Ordering::Greater
        } else {
            ord == Ordering::Less
        };
        if right_first {
            out.push(right[j]);
            j += 1;
        } else {
            out.push(left[i]);
            i += 1;
        }
    }
    out.extend_from_slice(&left[i..]);
    out.extend_from_slice(&right[j..]);
    Ok(out)
}
