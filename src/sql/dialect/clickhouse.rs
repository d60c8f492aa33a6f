//! ClickHouse SQL dialect.
//!
//! The native target of the compiler:
//! - Backtick identifier quoting
//! - Backslash escapes in string literals
//! - Parametric aggregates: `quantile(0.95)(x)`
//! - `transform(x, [from], [to], default)` for value mapping

use super::helpers;
use super::SqlDialect;

/// ClickHouse SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct ClickHouse;

impl SqlDialect for ClickHouse {
    fn name(&self) -> &'static str {
        "clickhouse"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_backtick(ident)
    }

    fn quote_string(&self, s: &str) -> String {
        helpers::quote_string_backslash(s)
    }

    fn supports_parametric_aggregates(&self) -> bool {
        true
    }

    fn supports_transform(&self) -> bool {
        true
    }
}
