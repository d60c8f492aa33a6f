//! Errors raised while compiling fields, filters and function calls.

/// A compile-time validation failure.
///
/// None of these are transient: the same input always fails the same way.
/// The message is the precise reason; the enclosing layer owns formatting.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QueryError {
    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("{0} is not a valid function")]
    UnknownFunction(String),

    #[error("{function}: expected {expected} argument(s) but got {actual} argument(s)")]
    MissingRequiredArgument {
        function: String,
        expected: usize,
        actual: usize,
    },

    #[error("{0}")]
    InvalidFunctionArgument(String),

    #[error("{0}")]
    InvalidSearchQuery(String),
}

pub type QueryResult<T> = Result<T, QueryError>;
