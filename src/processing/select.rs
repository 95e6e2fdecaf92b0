//! Field projection for [`crate::types::Clumper`].

use crate::error::{ClumpError, ClumpResult};
use crate::types::{Clumper, Record};

impl Clumper {
    /// Project every record onto exactly `keys`, in the order given.
    ///
    /// Fails with [`ClumpError::MissingField`] if any record lacks any of the keys; no
    /// default is substituted and no record is skipped.
    pub fn select<I, S>(&self, keys: I) -> ClumpResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keys = keys.into_iter().collect::<Vec<_>>();
        let records = self
            .iter()
            .map(|record| project(record, &keys))
            .collect::<ClumpResult<Vec<_>>>()?;
        Ok(Self::new(records))
    }
}

fn project<S: AsRef<str>>(record: &Record, keys: &[S]) -> ClumpResult<Record> {
    let mut out = Record::new();
    for key in keys {
        let key = key.as_ref();
        let value = record.get(key).ok_or_else(|| ClumpError::missing(key))?;
        out.insert(key, value.clone());
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use crate::error::ClumpError;
    use crate::types::{Clumper, Record};

    fn sample_clumper() -> Clumper {
        Clumper::new(vec![
            Record::from_iter([("a", 1), ("b", 2)]),
            Record::from_iter([("a", 2), ("b", 3), ("c", 4)]),
            Record::from_iter([("a", 1), ("b", 6)]),
        ])
    }

    #[test]
    fn select_drops_unrequested_fields() {
        let out = sample_clumper().select(["a", "b"]).unwrap();
        assert!(out.iter().all(|r| !r.contains("c")));
        assert!(out.iter().all(|r| r.len() == 2));
        assert_eq!(out.records()[1], Record::from_iter([("a", 2), ("b", 3)]));
    }

    #[test]
    fn select_orders_fields_as_requested() {
        let out = sample_clumper().select(vec!["b".to_string(), "a".to_string()]).unwrap();
        assert_eq!(out.records()[0].keys().collect::<Vec<_>>(), vec!["b", "a"]);
    }

    #[test]
    fn select_single_key() {
        let c = Clumper::new(vec![Record::from_iter([("a", 1), ("b", 2)])]);
        assert!(c.select(["a"]).unwrap().equals(&[Record::from_iter([("a", 1)])]));
    }

    #[test]
    fn select_missing_key_fails() {
        let err = sample_clumper().select(["a", "c"]).unwrap_err();
        assert_eq!(
            err,
            ClumpError::MissingField {
                field: "c".to_string()
            }
        );
    }

    #[test]
    fn select_does_not_touch_source() {
        let c = sample_clumper();
        let _ = c.select(["a"]).unwrap();
        assert_eq!(c.records()[1].len(), 3);
    }
}
