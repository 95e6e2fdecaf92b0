//! In-memory collection transformations.
//!
//! Every operation borrows a [`crate::types::Clumper`] and returns a new one holding
//! freshly owned records, so operations chain without disturbing earlier collections.
//!
//! Implemented as methods on [`crate::types::Clumper`]:
//!
//! - [`Clumper::keep`] / [`Clumper::keep_all`]: filtering by predicate(s)
//! - [`Clumper::head`] / [`Clumper::tail`]: bounded slicing
//! - [`Clumper::select`]: projection onto named fields
//! - [`Clumper::mutate`]: computed-field derivation (see [`Assignments`])
//! - [`Clumper::sort`]: stable sort by a key function
//!
//! ## Example: keep → mutate → sort → head
//!
//! ```rust
//! use clumper::processing::Assignments;
//! use clumper::types::{Clumper, Record, Value};
//!
//! let c = Clumper::new(vec![
//!     Record::from_iter([("id", Value::from(1)), ("score", Value::from(10.0))]),
//!     Record::from_iter([("id", Value::from(2)), ("score", Value::from(20.0))]),
//!     Record::from_iter([("id", Value::from(3)), ("score", Value::from(15.0))]),
//! ]);
//!
//! let top = c
//!     .keep(|r| Ok(r.int("id")? > 1))?
//!     .mutate(Assignments::new().assign("double", |r| Ok(Value::from(r.float("score")? * 2.0))))?
//!     .sort(|r| r.field("score").cloned(), true)?
//!     .head(1)?
//!     .collect();
//!
//! assert_eq!(top[0].int("id")?, 2);
//! assert_eq!(top[0].float("double")?, 40.0);
//! # Ok::<(), clumper::ClumpError>(())
//! ```
//!
//! [`Clumper::keep`]: crate::types::Clumper::keep
//! [`Clumper::keep_all`]: crate::types::Clumper::keep_all
//! [`Clumper::head`]: crate::types::Clumper::head
//! [`Clumper::tail`]: crate::types::Clumper::tail
//! [`Clumper::select`]: crate::types::Clumper::select
//! [`Clumper::mutate`]: crate::types::Clumper::mutate
//! [`Clumper::sort`]: crate::types::Clumper::sort

pub mod keep;
pub mod mutate;
pub mod select;
pub mod slice;
pub mod sort;

pub use keep::{keep, Predicate};
pub use mutate::{Assignments, Deriver};
