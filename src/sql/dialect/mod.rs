//! SQL Dialect definitions and formatting rules.
//!
//! This module provides a trait-based abstraction for the backends compiled
//! queries are rendered for. Each dialect implements `SqlDialect`:
//!
//! - Identifier quoting: `` ` `` (ClickHouse), `"` (DuckDB)
//! - String escaping: backslash (ClickHouse) vs doubled quote (DuckDB)
//! - Parametric aggregates: `quantile(0.95)(x)` vs `quantile_cont(x, 0.95)`
//! - Function naming: `uniq` vs `approx_count_distinct`
//!
//! # Usage
//!
//! ```ignore
//! use profql::sql::dialect::{Dialect, SqlDialect};
//!
//! let dialect = Dialect::ClickHouse;
//! let quoted = dialect.quote_identifier("duration_ns");  // `duration_ns`
//! ```

mod clickhouse;
mod duckdb;
pub mod helpers;

pub use clickhouse::ClickHouse;
pub use duckdb::DuckDb;

/// SQL dialect trait - defines how query IR constructs are rendered.
///
/// The default implementations follow ANSI SQL where possible.
pub trait SqlDialect: std::fmt::Debug {
    /// Dialect name for display/logging.
    fn name(&self) -> &'static str;

    // =========================================================================
    // Identifier and Literal Quoting
    // =========================================================================

    /// Quote an identifier (entity, column, alias).
    fn quote_identifier(&self, ident: &str) -> String;

    /// Quote a string literal.
    fn quote_string(&self, s: &str) -> String {
        helpers::quote_string_single(s)
    }

    /// Whether LIKE needs an explicit `ESCAPE '\'` for backslash escapes
    /// in patterns to take effect.
    fn requires_like_escape(&self) -> bool {
        false
    }

    // =========================================================================
    // Aggregates
    // =========================================================================

    /// Whether aggregate parameters are written as a separate leading
    /// parameter list, `name(params)(args)`.
    ///
    /// Dialects without this syntax receive the parameters appended to the
    /// argument list instead.
    fn supports_parametric_aggregates(&self) -> bool {
        false
    }

    /// Whether `transform(x, [from], [to], default)` is available.
    ///
    /// Dialects without it receive an equivalent `CASE` expression.
    fn supports_transform(&self) -> bool {
        false
    }

    // =========================================================================
    // Function Remapping
    // =========================================================================

    /// Remap a function name for this dialect.
    ///
    /// Returns `Some(new_name)` if the function should be remapped, `None` to
    /// keep the original.
    fn remap_function(&self, name: &str) -> Option<&'static str> {
        let _ = name;
        None
    }
}

/// Supported SQL dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    #[default]
    ClickHouse,
    DuckDb,
}

impl Dialect {
    /// Get the dialect implementation.
    pub fn dialect(&self) -> &'static dyn SqlDialect {
        match self {
            Dialect::ClickHouse => &ClickHouse,
            Dialect::DuckDb => &DuckDb,
        }
    }
}

// Implement SqlDialect for Dialect enum by delegating to concrete types
impl SqlDialect for Dialect {
    fn name(&self) -> &'static str {
        self.dialect().name()
    }

    fn quote_identifier(&self, ident: &str) -> String {
        self.dialect().quote_identifier(ident)
    }

    fn quote_string(&self, s: &str) -> String {
        self.dialect().quote_string(s)
    }

    fn requires_like_escape(&self) -> bool {
        self.dialect().requires_like_escape()
    }

    fn supports_parametric_aggregates(&self) -> bool {
        self.dialect().supports_parametric_aggregates()
    }

    fn supports_transform(&self) -> bool {
        self.dialect().supports_transform()
    }

    fn remap_function(&self, name: &str) -> Option<&'static str> {
        self.dialect().remap_function(name)
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.dialect().name())
    }
}

impl std::str::FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "clickhouse" => Ok(Dialect::ClickHouse),
            "duckdb" => Ok(Dialect::DuckDb),
            other => Err(other.to_string()),
        }
    }
}
