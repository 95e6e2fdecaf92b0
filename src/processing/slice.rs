//! Bounded slicing (`head`/`tail`) for [`crate::types::Clumper`].
//!
//! Neither operation clamps: asking for more records than exist is an error.

use crate::error::{ClumpError, ClumpResult};
use crate::types::Clumper;

impl Clumper {
    /// The first `n` records, in original order.
    pub fn head(&self, n: usize) -> ClumpResult<Self> {
        self.check_bound(n)?;
        Ok(Self::new(self.records()[..n].to_vec()))
    }

    /// The last `n` records, in original (ascending) order.
    pub fn tail(&self, n: usize) -> ClumpResult<Self> {
        self.check_bound(n)?;
        let start = self.len() - n;
        Ok(Self::new(self.records()[start..].to_vec()))
    }

    fn check_bound(&self, n: usize) -> ClumpResult<()> {
        if n > self.len() {
            return Err(ClumpError::OutOfRange {
                requested: n,
                available: self.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ClumpError;
    use crate::types::{Clumper, Record};

    fn numbered(n: i64) -> Clumper {
        (1..=n).map(|i| Record::from_iter([("a", i)])).collect()
    }

    fn values(c: &Clumper) -> Vec<i64> {
        c.iter().map(|r| r.int("a").unwrap()).collect()
    }

    #[test]
    fn head_takes_leading_records() {
        let c = numbered(4);
        assert_eq!(values(&c.head(2).unwrap()), vec![1, 2]);
        assert_eq!(values(&c.head(4).unwrap()), vec![1, 2, 3, 4]);
        assert!(c.head(0).unwrap().is_empty());
    }

    #[test]
    fn tail_keeps_ascending_order() {
        let c = numbered(4);
        assert_eq!(values(&c.tail(2).unwrap()), vec![3, 4]);
        assert_eq!(values(&c.tail(4).unwrap()), vec![1, 2, 3, 4]);
        assert!(c.tail(0).unwrap().is_empty());
    }

    #[test]
    fn slicing_past_the_end_is_an_error() {
        let c = numbered(3);
        let expected = ClumpError::OutOfRange {
            requested: 4,
            available: 3,
        };
        assert_eq!(c.head(4).unwrap_err(), expected);
        assert_eq!(c.tail(4).unwrap_err(), expected);
    }

    #[test]
    fn slicing_an_empty_clumper() {
        let c = Clumper::default();
        assert!(c.head(0).unwrap().is_empty());
        assert!(c.tail(1).is_err());
    }
}
