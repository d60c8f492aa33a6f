//! Query IR and SQL rendering.
//!
//! The dataset compiler emits [`expr::Expr`] trees; this module renders them
//! for a target backend:
//!
//! - [`expr`] - Expression AST and builder DSL
//! - [`query`] - SELECT assembly used by the compile facade
//! - [`token`] - Token types for SQL generation
//! - [`dialect`] - SQL dialect implementations

pub mod dialect;
pub mod expr;
pub mod query;
pub mod token;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types at the sql module level
pub use dialect::{Dialect, SqlDialect};
pub use expr::{
    array, col, entity_col, func, lit_float, lit_int, lit_str, parametric,
    BinaryOperator, Expr, ExprExt, Literal,
};
pub use query::Query;
pub use token::{Token, TokenStream};
