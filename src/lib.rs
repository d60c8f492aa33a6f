//! # profql
//!
//! Compiles profile search queries into backend SQL.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                 Search tokens (search)                   │
//! │      (filters, function calls, selected fields)          │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [dataset config]
//! ┌─────────────────────────────────────────────────────────┐
//! │  Column registry · Function registry · Project aliases   │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [expression IR]
//! ┌─────────────────────────────────────────────────────────┐
//! │              Expr / Query (sql::expr, sql::query)        │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [dialect]
//! ┌─────────────────────────────────────────────────────────┐
//! │                SQL (ClickHouse, DuckDB)                  │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod compile;
pub mod config;
pub mod dataset;
pub mod search;
pub mod sql;

// Re-export SQL submodules at crate level for convenience
pub use sql::dialect;
pub use sql::expr;
pub use sql::query;
pub use sql::token;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::compile::{compile_query, CompileError, CompileOptions, CompileOutput, QueryRequest};
    pub use crate::config::Settings;
    pub use crate::dataset::{
        ColumnRegistry, ColumnType, DurationUnit, FunctionRegistry, Kind, ParamsContext,
        ProfilesDatasetConfig, Project, QueryError, QueryResult, ResolvedFunction,
    };
    pub use crate::dialect::{Dialect, SqlDialect};
    pub use crate::expr::{col, func, lit_int, lit_str, parametric, Expr, ExprExt, Literal};
    pub use crate::query::Query;
    pub use crate::search::{FunctionCall, Operator, SearchFilter, SearchValue};
}

// Also export at crate root for convenience
pub use compile::{compile_query, CompileOptions, QueryRequest};
pub use dataset::{ParamsContext, ProfilesDatasetConfig, QueryError};
pub use dialect::Dialect;
