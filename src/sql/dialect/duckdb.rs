//! DuckDB SQL dialect.
//!
//! Useful for running compiled profile queries against local exports:
//! - ANSI identifier quoting (`"`)
//! - Aggregate parameters trail the arguments: `quantile_cont(x, 0.95)`
//! - No `transform`; value mapping is rendered as `CASE`
//! - LIKE has no default escape character, so one is always spelled out

use super::helpers;
use super::SqlDialect;

/// DuckDB SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct DuckDb;

impl SqlDialect for DuckDb {
    fn name(&self) -> &'static str {
        "duckdb"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn requires_like_escape(&self) -> bool {
        true
    }

    fn remap_function(&self, name: &str) -> Option<&'static str> {
        helpers::remap_function_duckdb(name)
    }
}
