//! The profiles dataset configuration.
//!
//! Ties the column registry, the function registry and the project aliases
//! together for one request. Field names are resolved in this order:
//!
//! 1. filter alias resolvers (filter position only)
//! 2. select alias resolvers (select position only)
//! 3. the column registry
//! 4. the function registry, for call-shaped tokens
//!
//! String wildcards become LIKE patterns with backslash as the escape
//! character, which is the default for both ClickHouse and DuckDB.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use super::aliases::{
    project_slug_field, project_slug_filter, FieldConverter, FilterConverter, ParamsContext,
    PROJECT_ALIAS, PROJECT_NAME_ALIAS,
};
use super::columns::{Column, ColumnRegistry};
use super::error::{QueryError, QueryResult};
use super::functions::{BuildContext, FunctionRegistry, ResolvedFunction};
use super::types::{ColumnType, DurationUnit, Kind};
use crate::search::{FunctionCall, Operator, SearchFilter, SearchValue};
use crate::sql::expr::{lit_float, lit_int, lit_str, Expr, ExprExt};

/// Resolvers keyed by field name.
pub type ConverterMap<F> = BTreeMap<&'static str, F>;

/// A resolved select-list entry.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedField {
    /// A registered column.
    Column {
        alias: String,
        expr: Expr,
        column_type: ColumnType,
    },
    /// A field produced by a select alias resolver.
    Alias { alias: String, expr: Expr },
    /// A function call.
    Function(ResolvedFunction),
}

impl ResolvedField {
    /// Output name of the field.
    pub fn alias(&self) -> &str {
        match self {
            ResolvedField::Column { alias, .. } | ResolvedField::Alias { alias, .. } => alias,
            ResolvedField::Function(f) => &f.alias,
        }
    }

    pub fn expr(&self) -> &Expr {
        match self {
            ResolvedField::Column { expr, .. } | ResolvedField::Alias { expr, .. } => expr,
            ResolvedField::Function(f) => &f.expr,
        }
    }

    pub fn into_expr(self) -> Expr {
        match self {
            ResolvedField::Column { expr, .. } | ResolvedField::Alias { expr, .. } => expr,
            ResolvedField::Function(f) => f.expr,
        }
    }

    /// Advisory result type, `None` for alias resolvers.
    pub fn column_type(&self) -> Option<ColumnType> {
        match self {
            ResolvedField::Column { column_type, .. } => Some(*column_type),
            ResolvedField::Alias { .. } => None,
            ResolvedField::Function(f) => Some(f.result_type),
        }
    }

    pub fn is_aggregate(&self) -> bool {
        matches!(self, ResolvedField::Function(_))
    }
}

/// Dataset configuration for profiles, scoped to one request.
#[derive(Debug, Clone, Copy)]
pub struct ProfilesDatasetConfig<'a> {
    params: &'a ParamsContext,
    columns: &'static ColumnRegistry,
    functions: &'static FunctionRegistry,
    entity: Option<&'a str>,
}

impl<'a> ProfilesDatasetConfig<'a> {
    pub fn new(params: &'a ParamsContext) -> Self {
        Self {
            params,
            columns: ColumnRegistry::profiles(),
            functions: FunctionRegistry::profiles(),
            entity: None,
        }
    }

    /// Qualify every column reference with `entity`.
    pub fn with_entity(mut self, entity: Option<&'a str>) -> Self {
        self.entity = entity;
        self
    }

    pub fn params(&self) -> &ParamsContext {
        self.params
    }

    pub fn columns(&self) -> &'static ColumnRegistry {
        self.columns
    }

    pub fn functions(&self) -> &'static FunctionRegistry {
        self.functions
    }

    fn build_context(&self) -> BuildContext<'a> {
        BuildContext::new(self.columns).with_entity(self.entity)
    }

    // -------------------------------------------------------------------------
    // Converter maps
    // -------------------------------------------------------------------------

    /// Field name → filter resolver.
    pub fn search_filter_converter(&self) -> ConverterMap<FilterConverter> {
        ConverterMap::from([
            (PROJECT_ALIAS, project_slug_filter as FilterConverter),
            (PROJECT_NAME_ALIAS, project_slug_filter as FilterConverter),
        ])
    }

    /// Field name → select resolver.
    pub fn field_alias_converter(&self) -> ConverterMap<FieldConverter> {
        ConverterMap::from([
            (PROJECT_ALIAS, project_slug_field as FieldConverter),
            (PROJECT_NAME_ALIAS, project_slug_field as FieldConverter),
        ])
    }

    /// Function name → function declaration.
    pub fn function_converter(&self) -> &'static FunctionRegistry {
        self.functions
    }

    /// Order-by overrides. Profiles has none.
    pub fn orderby_converter(&self) -> ConverterMap<FieldConverter> {
        ConverterMap::new()
    }

    // -------------------------------------------------------------------------
    // Resolution
    // -------------------------------------------------------------------------

    /// Physical column for an alias.
    pub fn resolve_column(&self, alias: &str) -> QueryResult<&'static str> {
        self.columns.resolve_column(alias)
    }

    /// Advisory type of a column; unknown aliases have none.
    pub fn resolve_column_type(&self, alias: &str) -> Option<ColumnType> {
        self.columns.resolve_unit_or_kind(alias)
    }

    pub fn resolve_function(&self, call: &FunctionCall) -> QueryResult<ResolvedFunction> {
        self.functions.resolve(call, &self.build_context())
    }

    /// Compile a filter token into a condition.
    pub fn resolve_filter(&self, filter: &SearchFilter) -> QueryResult<Expr> {
        if let Some(converter) = self.search_filter_converter().get(filter.key.as_str()) {
            tracing::trace!(key = %filter.key, "filter resolved by alias");
            return converter(filter, self.params, &self.build_context());
        }

        let column = self
            .columns
            .get(&filter.key)
            .ok_or_else(|| QueryError::UnknownField(filter.key.clone()))?;
        let lhs = self.build_context().column(column.alias)?;

        let condition = column_condition(column, lhs, filter)?;
        tracing::trace!(%filter, "resolved filter");
        Ok(condition)
    }

    /// Compile a select-list token.
    pub fn resolve_select(&self, field: &str) -> QueryResult<ResolvedField> {
        let field = field.trim();

        if let Some(converter) = self.field_alias_converter().get(field) {
            let expr = converter(field, self.params, &self.build_context())?;
            return Ok(ResolvedField::Alias {
                alias: field.to_string(),
                expr,
            });
        }

        let Some(column) = self.columns.get(field) else {
            return match FunctionCall::parse(field) {
                Some(call) => self.resolve_function(&call).map(ResolvedField::Function),
                None => Err(QueryError::UnknownField(field.to_string())),
            };
        };
        let expr = self.build_context().column(column.alias)?;
        let expr = if column.column == column.alias {
            expr
        } else {
            expr.alias(column.alias)
        };

        Ok(ResolvedField::Column {
            alias: column.alias.to_string(),
            expr,
            column_type: column.unit_or_kind(),
        })
    }

    /// Compile a select-list token to its expression.
    pub fn resolve_field(&self, field: &str) -> QueryResult<Expr> {
        self.resolve_select(field).map(ResolvedField::into_expr)
    }
}

// =============================================================================
// Filter value coercion
// =============================================================================

fn column_condition(column: &Column, lhs: Expr, filter: &SearchFilter) -> QueryResult<Expr> {
    let op = filter.operator;

    if op.is_list() {
        let values = filter
            .value
            .values()
            .into_iter()
            .map(|raw| {
                if column.kind == Kind::String && raw.contains('*') {
                    return Err(QueryError::InvalidSearchQuery(format!(
                        "Wildcards are not supported in a list of values on {}",
                        filter.key
                    )));
                }
                coerce_value(column, &filter.key, raw)
            })
            .collect::<QueryResult<Vec<_>>>()?;
        return Ok(if op.is_negation() {
            lhs.not_in_list(values)
        } else {
            lhs.in_list(values)
        });
    }

    let raw = match &filter.value {
        SearchValue::Single(raw) => raw.as_str(),
        SearchValue::List(_) => {
            return Err(QueryError::InvalidSearchQuery(format!(
                "Invalid operator {op} for a list of values on {}",
                filter.key
            )))
        }
    };

    if raw.is_empty() && matches!(op, Operator::Eq | Operator::Ne) {
        return Ok(if op.is_negation() {
            lhs.is_not_null()
        } else {
            lhs.is_null()
        });
    }

    if column.kind == Kind::String && raw.contains('*') {
        let pattern = lit_str(&like_pattern(raw));
        return match op {
            Operator::Eq => Ok(lhs.like(pattern)),
            Operator::Ne => Ok(lhs.not_like(pattern)),
            _ => Err(QueryError::InvalidSearchQuery(format!(
                "Wildcards are only supported with = and != on {}",
                filter.key
            ))),
        };
    }

    let value = coerce_value(column, &filter.key, raw)?;
    Ok(match op {
        Operator::Eq => lhs.eq(value),
        Operator::Ne => lhs.ne(value),
        Operator::Gt => lhs.gt(value),
        Operator::Gte => lhs.gte(value),
        Operator::Lt => lhs.lt(value),
        Operator::Lte => lhs.lte(value),
        Operator::In => lhs.in_list(vec![value]),
        Operator::NotIn => lhs.not_in_list(vec![value]),
    })
}

static DURATION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<value>-?\d+(?:\.\d+)?)(?P<unit>[a-z]+)?$").unwrap());

/// Turn one raw search value into a literal of the column's kind.
fn coerce_value(column: &Column, key: &str, raw: &str) -> QueryResult<Expr> {
    let raw = raw.trim();
    match column.kind {
        Kind::Integer => raw
            .parse::<i64>()
            .map(lit_int)
            .map_err(|_| invalid_value(key, raw, "an integer")),
        Kind::Number => match raw.parse::<f64>() {
            Ok(n) if n.is_finite() => Ok(lit_float(n)),
            _ => Err(invalid_value(key, raw, "a number")),
        },
        Kind::Duration => {
            let target = column.unit.unwrap_or(DurationUnit::Nanosecond);
            match parse_duration(raw, target) {
                Some(value) if value.is_finite() => Ok(number_literal(value)),
                _ => Err(invalid_value(key, raw, "a duration")),
            }
        }
        Kind::Date | Kind::String => Ok(lit_str(raw)),
    }
}

/// `250ms` into `target` units; a bare number is already in `target` units.
fn parse_duration(raw: &str, target: DurationUnit) -> Option<f64> {
    let captures = DURATION_PATTERN.captures(raw)?;
    let value: f64 = captures.name("value")?.as_str().parse().ok()?;
    let unit = match captures.name("unit") {
        Some(suffix) => DurationUnit::from_suffix(suffix.as_str())?,
        None => target,
    };
    Some(unit.convert(value, target))
}

/// Search glob to a LIKE pattern. `%`, `_` and the backslash escape are
/// matched literally; only `*` is a wildcard.
fn like_pattern(raw: &str) -> String {
    let mut pattern = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '\\' | '%' | '_' => {
                pattern.push('\\');
                pattern.push(c);
            }
            '*' => pattern.push('%'),
            _ => pattern.push(c),
        }
    }
    pattern
}

fn number_literal(value: f64) -> Expr {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        lit_int(value as i64)
    } else {
        lit_float(value)
    }
}

fn invalid_value(key: &str, raw: &str, expected: &str) -> QueryError {
    QueryError::InvalidSearchQuery(format!(
        "Invalid value for {key}: {raw} is not {expected}"
    ))
}
