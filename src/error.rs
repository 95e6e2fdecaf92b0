use thiserror::Error;

/// Convenience result type for pipeline operations.
pub type ClumpResult<T> = Result<T, ClumpError>;

/// Error type returned by every fallible pipeline operation.
///
/// Errors raised inside user-supplied predicates, derivers and sort keys are propagated
/// unchanged; the pipeline never catches, retries or downgrades them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClumpError {
    /// A requested or referenced field is absent on a record.
    #[error("missing field '{field}'")]
    MissingField { field: String },

    /// A bounded slice asked for more records than the collection holds.
    #[error("index out of range: requested {requested} records but only {available} available")]
    OutOfRange { requested: usize, available: usize },

    /// Two sort keys cannot be ordered relative to each other.
    #[error("type error: cannot order {left} against {right}")]
    Incomparable {
        left: &'static str,
        right: &'static str,
    },

    /// A typed accessor found a value of a different type.
    #[error("type error: field '{field}' expected {expected}, found {found}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A JSON value that is not an object was used where a record is required.
    #[error("expected a json object, found {found}")]
    NotARecord { found: &'static str },

    /// [`crate::execution::ExecutionOptions`] failed validation.
    #[error("invalid execution options: {message}")]
    InvalidOptions { message: String },

    /// The worker pool could not be created.
    #[error("failed to build thread pool: {message}")]
    ThreadPool { message: String },
}

impl ClumpError {
    pub(crate) fn missing(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }
}
