//! Shared helper functions for SQL dialect implementations.
//!
//! This module provides reusable building blocks that dialects can compose
//! to implement the `SqlDialect` trait with minimal duplication.

// =============================================================================
// Identifier Quoting
// =============================================================================

/// Quote identifier with double quotes (ANSI style).
/// Used by: DuckDB
pub fn quote_double(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quote identifier with backticks.
/// Used by: ClickHouse
pub fn quote_backtick(ident: &str) -> String {
    format!("`{}`", ident.replace('\\', "\\\\").replace('`', "\\`"))
}

// =============================================================================
// String Quoting
// =============================================================================

/// Quote string with single quotes (standard SQL).
/// Used by: DuckDB
pub fn quote_string_single(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Quote string with single quotes and backslash escapes.
/// Used by: ClickHouse
pub fn quote_string_backslash(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
}

// =============================================================================
// Function Remapping
// =============================================================================

/// Remap ClickHouse aggregate names for DuckDB.
///
/// The compiler emits ClickHouse names; DuckDB spells the same aggregates
/// differently. Matching is exact since ClickHouse names are case-sensitive.
pub fn remap_function_duckdb(name: &str) -> Option<&'static str> {
    match name {
        "uniq" => Some("approx_count_distinct"),
        "argMax" => Some("arg_max"),
        "quantile" => Some("quantile_cont"),
        _ => None,
    }
}
