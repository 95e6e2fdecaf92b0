//! `clumper` is a small library for exploring ordered collections of heterogeneous records
//! (think: a list of JSON objects) through a chainable pipeline of transformations.
//!
//! The primary type is [`types::Clumper`]. Each operation borrows a collection and returns a
//! new, independently owned one, so earlier collections can be reused freely.
//!
//! ## Data model
//!
//! - [`types::Value`]: a dynamically typed value (integer, float, string, boolean, null,
//!   nested record, list)
//! - [`types::Record`]: a set of uniquely named fields
//! - [`types::Clumper`]: an ordered sequence of records; records need not share a shape
//!
//! ## Operations
//!
//! | Method | Effect | Fails with |
//! |---|---|---|
//! | `keep` / `keep_all` | keep records accepted by every predicate | errors raised by predicates |
//! | `head(n)` / `tail(n)` | first / last `n` records, original order | [`ClumpError::OutOfRange`] |
//! | `select(keys)` | project onto exactly `keys` | [`ClumpError::MissingField`] |
//! | `mutate(assignments)` | add/overwrite computed fields on copies | errors raised by derivers |
//! | `sort(key, reverse)` | stable sort by key | [`ClumpError::Incomparable`] |
//! | `collect()` | materialize as `Vec<Record>` | never |
//!
//! ## Example
//!
//! ```rust
//! use clumper::types::{Clumper, Record};
//!
//! let c = Clumper::new(vec![
//!     Record::from_iter([("a", 1)]),
//!     Record::from_iter([("a", 2)]),
//!     Record::from_iter([("a", 3)]),
//!     Record::from_iter([("a", 4)]),
//! ]);
//!
//! let kept = c.keep(|d| Ok(d.int("a")? >= 3))?;
//! assert!(kept.equals(&[Record::from_iter([("a", 3)]), Record::from_iter([("a", 4)])]));
//!
//! assert!(c.head(2)?.equals(&[Record::from_iter([("a", 1)]), Record::from_iter([("a", 2)])]));
//! assert!(c.tail(2)?.equals(&[Record::from_iter([("a", 3)]), Record::from_iter([("a", 4)])]));
//! assert!(c.head(5).is_err());
//! # Ok::<(), clumper::ClumpError>(())
//! ```
//!
//! ## Parallel execution
//!
//! [`execution::ExecutionEngine`] runs `keep`, `mutate` and `sort` on a rayon pool with
//! bounded in-flight chunks, metrics and an observer hook for logging. Results are identical
//! to the sequential methods.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use clumper::execution::{ExecutionEngine, ExecutionOptions, StdErrExecutionObserver};
//! use clumper::types::{Clumper, Record, Value};
//!
//! let c: Clumper = (0..100_i64).map(|i| Record::from_iter([("id", i)])).collect();
//! let engine = ExecutionEngine::new(ExecutionOptions::default())?
//!     .with_observer(Arc::new(StdErrExecutionObserver));
//!
//! let evens = engine.keep_parallel(&c, |r| Ok(r.int("id")? % 2 == 0))?;
//! let tagged = engine.mutate_parallel(&evens, "half", |r| Ok(Value::from(r.int("id")? / 2)))?;
//! assert_eq!(tagged.len(), 50);
//! # Ok::<(), clumper::ClumpError>(())
//! ```
//!
//! ## Modules
//!
//! - [`types`]: values, records and the collection container
//! - [`processing`]: the pipeline transformations
//! - [`execution`]: parallel engine, metrics and observers
//! - [`json`]: conversions to and from `serde_json::Value`
//! - [`error`]: the shared error type

pub mod error;
pub mod execution;
pub mod json;
pub mod processing;
pub mod types;

pub use error::{ClumpError, ClumpResult};
pub use types::{Clumper, Record, Value};
