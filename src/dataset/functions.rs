//! The profiles function registry.
//!
//! Each function declares its argument slots, a builder emitting the backend
//! aggregate, a default result type and optionally a resolver that derives
//! the result type from the validated arguments.
//!
//! ```text
//! p95(profile.duration)
//!   → bind args → validate → build      → quantile(0.95)(duration_ns) AS p95_profile_duration
//!                          → result type → nanosecond
//! ```

use std::collections::BTreeMap;
use std::sync::OnceLock;

use super::arguments::{Argument, ResolvedArgs};
use super::columns::ColumnRegistry;
use super::error::{QueryError, QueryResult};
use super::types::{ColumnType, Kind};
use crate::search::FunctionCall;
use crate::sql::expr::{func, parametric, Expr, ExprExt, Literal};

/// Column context handed to builders.
#[derive(Debug, Clone, Copy)]
pub struct BuildContext<'a> {
    pub columns: &'a ColumnRegistry,
    /// Entity used to qualify column references, if any.
    pub entity: Option<&'a str>,
}

impl<'a> BuildContext<'a> {
    pub fn new(columns: &'a ColumnRegistry) -> Self {
        Self {
            columns,
            entity: None,
        }
    }

    pub fn with_entity(mut self, entity: Option<&'a str>) -> Self {
        self.entity = entity;
        self
    }

    /// Column reference for a registered alias.
    pub fn column(&self, alias: &str) -> QueryResult<Expr> {
        self.columns.column_expr(alias, self.entity)
    }

    /// Column reference for the column argument bound to `name`.
    pub fn column_arg(&self, args: &ResolvedArgs, name: &str) -> QueryResult<Expr> {
        match args.column(name) {
            Some(alias) => self.column(alias),
            None => Err(QueryError::InvalidFunctionArgument(format!(
                "{name} argument is required"
            ))),
        }
    }
}

/// Emits the backend expression for validated arguments and an output alias.
pub type Builder = fn(&ResolvedArgs, &BuildContext<'_>, &str) -> QueryResult<Expr>;

/// Derives a result type from validated arguments.
pub type ResultTypeFn = fn(&ResolvedArgs, &ColumnRegistry) -> Option<ColumnType>;

/// Declaration of one function.
#[derive(Debug, Clone)]
pub struct FunctionSpec {
    pub name: &'static str,
    pub required_args: Vec<Argument>,
    pub optional_args: Vec<Argument>,
    pub builder: Builder,
    pub default_result_type: Kind,
    pub result_type_fn: Option<ResultTypeFn>,
    /// Raw columns used inside this function may not also be selected
    /// outside of it.
    pub forces_grouping: bool,
}

impl FunctionSpec {
    pub fn new(name: &'static str, builder: Builder, default_result_type: Kind) -> Self {
        Self {
            name,
            required_args: vec![],
            optional_args: vec![],
            builder,
            default_result_type,
            result_type_fn: None,
            forces_grouping: false,
        }
    }

    pub fn required_args(mut self, args: Vec<Argument>) -> Self {
        self.required_args = args;
        self
    }

    pub fn optional_args(mut self, args: Vec<Argument>) -> Self {
        self.optional_args = args;
        self
    }

    pub fn result_type_fn(mut self, f: ResultTypeFn) -> Self {
        self.result_type_fn = Some(f);
        self
    }

    pub fn forces_grouping(mut self) -> Self {
        self.forces_grouping = true;
        self
    }

    /// Bind positional arguments to the declared slots and validate them.
    ///
    /// Fails on the first invalid argument.
    pub fn bind(&self, args: &[String], columns: &ColumnRegistry) -> QueryResult<ResolvedArgs> {
        let required = self.required_args.len();
        let max = required + self.optional_args.len();

        if args.len() < required {
            return Err(QueryError::MissingRequiredArgument {
                function: self.name.to_string(),
                expected: required,
                actual: args.len(),
            });
        }
        if args.len() > max {
            return Err(QueryError::InvalidSearchQuery(format!(
                "{}: expected at most {} argument(s) but got {} argument(s)",
                self.name,
                max,
                args.len()
            )));
        }

        let mut resolved = ResolvedArgs::new();
        for (i, slot) in self
            .required_args
            .iter()
            .chain(self.optional_args.iter())
            .enumerate()
        {
            let raw = args.get(i).map(String::as_str);
            resolved.insert(slot.name, slot.validate(raw, columns)?);
        }
        Ok(resolved)
    }

    /// Result type for validated arguments.
    pub fn result_type(&self, args: &ResolvedArgs, columns: &ColumnRegistry) -> ColumnType {
        self.result_type_fn
            .and_then(|f| f(args, columns))
            .unwrap_or(ColumnType::Kind(self.default_result_type))
    }

    /// Validate, build and type one call.
    pub fn resolve(
        &self,
        args: &[String],
        alias: &str,
        ctx: &BuildContext<'_>,
    ) -> QueryResult<ResolvedFunction> {
        let arguments = self.bind(args, ctx.columns)?;
        let expr = (self.builder)(&arguments, ctx, alias)?;
        let result_type = self.result_type(&arguments, ctx.columns);

        tracing::debug!(
            function = self.name,
            alias,
            %result_type,
            forces_grouping = self.forces_grouping,
            "resolved function"
        );

        Ok(ResolvedFunction {
            name: self.name.to_string(),
            alias: alias.to_string(),
            expr,
            result_type,
            forces_grouping: self.forces_grouping,
            arguments,
        })
    }
}

/// A compiled function call.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFunction {
    pub name: String,
    pub alias: String,
    pub expr: Expr,
    pub result_type: ColumnType,
    pub forces_grouping: bool,
    pub arguments: ResolvedArgs,
}

/// Name → function lookup table.
#[derive(Debug)]
pub struct FunctionRegistry {
    functions: BTreeMap<&'static str, FunctionSpec>,
}

impl FunctionRegistry {
    pub fn new(functions: impl IntoIterator<Item = FunctionSpec>) -> Self {
        Self {
            functions: functions.into_iter().map(|f| (f.name, f)).collect(),
        }
    }

    /// The process-wide profiles registry.
    pub fn profiles() -> &'static FunctionRegistry {
        static REGISTRY: OnceLock<FunctionRegistry> = OnceLock::new();
        REGISTRY.get_or_init(|| FunctionRegistry::new(profile_functions()))
    }

    pub fn get(&self, name: &str) -> Option<&FunctionSpec> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Function names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.functions.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FunctionSpec> {
        self.functions.values()
    }

    /// Compile a function call.
    pub fn resolve(
        &self,
        call: &FunctionCall,
        ctx: &BuildContext<'_>,
    ) -> QueryResult<ResolvedFunction> {
        let spec = self
            .get(&call.name)
            .ok_or_else(|| QueryError::UnknownFunction(call.name.clone()))?;
        spec.resolve(&call.args, &call.alias, ctx)
    }
}

// =============================================================================
// Profiles function table
// =============================================================================

fn profile_functions() -> Vec<FunctionSpec> {
    let duration_column =
        || vec![Argument::numeric_column("column").with_default("profile.duration")];

    vec![
        FunctionSpec::new(
            "last_seen",
            |_, ctx, alias| Ok(func("max", vec![ctx.column("timestamp")?]).alias(alias)),
            Kind::Date,
        )
        .forces_grouping(),
        FunctionSpec::new(
            "latest_event",
            |_, ctx, alias| {
                Ok(func("argMax", vec![ctx.column("id")?, ctx.column("timestamp")?]).alias(alias))
            },
            Kind::String,
        ),
        FunctionSpec::new(
            "count",
            |_, _, alias| Ok(func("count", vec![]).alias(alias)),
            Kind::Integer,
        )
        .optional_args(vec![Argument::null_column("column")]),
        FunctionSpec::new(
            "count_unique",
            |args, ctx, alias| Ok(func("uniq", vec![ctx.column_arg(args, "column")?]).alias(alias)),
            Kind::Integer,
        )
        .required_args(vec![Argument::column("column")]),
        FunctionSpec::new(
            "percentile",
            |args, ctx, alias| resolve_percentile(args, ctx, alias, None),
            Kind::Duration,
        )
        .required_args(vec![
            Argument::numeric_column("column"),
            Argument::number_range("percentile", 0.0, 1.0),
        ])
        .result_type_fn(reflective_result_type)
        .forces_grouping(),
        FunctionSpec::new(
            "p50",
            |args, ctx, alias| resolve_percentile(args, ctx, alias, Some(0.5)),
            Kind::Duration,
        )
        .optional_args(duration_column())
        .result_type_fn(reflective_result_type)
        .forces_grouping(),
        FunctionSpec::new(
            "p75",
            |args, ctx, alias| resolve_percentile(args, ctx, alias, Some(0.75)),
            Kind::Duration,
        )
        .optional_args(duration_column())
        .result_type_fn(reflective_result_type)
        .forces_grouping(),
        FunctionSpec::new(
            "p95",
            |args, ctx, alias| resolve_percentile(args, ctx, alias, Some(0.95)),
            Kind::Duration,
        )
        .optional_args(duration_column())
        .result_type_fn(reflective_result_type)
        .forces_grouping(),
        // NOTE: p99 has always compiled to the 0.95 quantile. Kept as-is since
        // stored queries and dashboards depend on the current output.
        FunctionSpec::new(
            "p99",
            |args, ctx, alias| resolve_percentile(args, ctx, alias, Some(0.95)),
            Kind::Duration,
        )
        .optional_args(duration_column())
        .result_type_fn(reflective_result_type)
        .forces_grouping(),
        FunctionSpec::new(
            "p100",
            |args, ctx, alias| resolve_percentile(args, ctx, alias, Some(1.0)),
            Kind::Duration,
        )
        .optional_args(duration_column())
        .result_type_fn(reflective_result_type)
        .forces_grouping(),
        FunctionSpec::new(
            "min",
            |args, ctx, alias| simple_aggregate("min", args, ctx, alias),
            Kind::Duration,
        )
        .required_args(vec![Argument::numeric_column("column")])
        .result_type_fn(reflective_result_type)
        .forces_grouping(),
        FunctionSpec::new(
            "max",
            |args, ctx, alias| simple_aggregate("max", args, ctx, alias),
            Kind::Duration,
        )
        .required_args(vec![Argument::numeric_column("column")])
        .result_type_fn(reflective_result_type)
        .forces_grouping(),
        FunctionSpec::new(
            "avg",
            |args, ctx, alias| simple_aggregate("avg", args, ctx, alias),
            Kind::Duration,
        )
        .required_args(vec![Argument::numeric_column("column")])
        .result_type_fn(reflective_result_type)
        .forces_grouping(),
        FunctionSpec::new(
            "sum",
            |args, ctx, alias| simple_aggregate("sum", args, ctx, alias),
            Kind::Duration,
        )
        .required_args(vec![Argument::numeric_column("column")])
        .result_type_fn(reflective_result_type),
    ]
}

fn simple_aggregate(
    name: &str,
    args: &ResolvedArgs,
    ctx: &BuildContext<'_>,
    alias: &str,
) -> QueryResult<Expr> {
    Ok(func(name, vec![ctx.column_arg(args, "column")?]).alias(alias))
}

/// Shared by `percentile` and the fixed `pNN` shorthands.
///
/// A fraction of exactly 1 compiles to `max`: quantile estimators are not
/// exact at the boundary.
fn resolve_percentile(
    args: &ResolvedArgs,
    ctx: &BuildContext<'_>,
    alias: &str,
    fixed_percentile: Option<f64>,
) -> QueryResult<Expr> {
    let column = ctx.column_arg(args, "column")?;
    let fraction = match fixed_percentile.or_else(|| args.number("percentile")) {
        Some(fraction) => fraction,
        None => {
            return Err(QueryError::InvalidFunctionArgument(
                "percentile argument is required".to_string(),
            ))
        }
    };

    let expr = if fraction == 1.0 {
        func("max", vec![column])
    } else {
        parametric("quantile", vec![Literal::Float(fraction)], vec![column])
    };
    Ok(expr.alias(alias))
}

/// The result takes the type of the `column` argument, unit first.
fn reflective_result_type(args: &ResolvedArgs, columns: &ColumnRegistry) -> Option<ColumnType> {
    args.column("column")
        .and_then(|alias| columns.resolve_unit_or_kind(alias))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::types::DurationUnit;
    use crate::sql::expr::col;

    fn ctx() -> BuildContext<'static> {
        BuildContext::new(ColumnRegistry::profiles())
    }

    fn call(text: &str) -> FunctionCall {
        FunctionCall::parse(text).unwrap()
    }

    fn resolve(text: &str) -> QueryResult<ResolvedFunction> {
        FunctionRegistry::profiles().resolve(&call(text), &ctx())
    }

    #[test]
    fn test_registry_contents() {
        let names: Vec<_> = FunctionRegistry::profiles().names().collect();
        assert_eq!(
            names,
            vec![
                "avg",
                "count",
                "count_unique",
                "last_seen",
                "latest_event",
                "max",
                "min",
                "p100",
                "p50",
                "p75",
                "p95",
                "p99",
                "percentile",
                "sum",
            ]
        );
    }

    #[test]
    fn test_grouping_flags() {
        let registry = FunctionRegistry::profiles();
        for name in ["percentile", "p50", "p75", "p95", "p99", "p100", "min", "max", "avg", "last_seen"] {
            assert!(registry.get(name).unwrap().forces_grouping, "{name}");
        }
        for name in ["sum", "count", "count_unique", "latest_event"] {
            assert!(!registry.get(name).unwrap().forces_grouping, "{name}");
        }
    }

    #[test]
    fn test_count_without_column() {
        let resolved = resolve("count()").unwrap();
        assert_eq!(resolved.expr, func("count", vec![]).alias("count"));
        assert_eq!(resolved.result_type, ColumnType::Kind(Kind::Integer));
    }

    #[test]
    fn test_count_ignores_column() {
        let resolved = resolve("count(id)").unwrap();
        assert_eq!(resolved.expr, func("count", vec![]).alias("count_id"));
    }

    #[test]
    fn test_count_unique() {
        let resolved = resolve("count_unique(id)").unwrap();
        assert_eq!(
            resolved.expr,
            func("uniq", vec![col("profile_id")]).alias("count_unique_id")
        );
        assert_eq!(resolved.result_type, ColumnType::Kind(Kind::Integer));
    }

    #[test]
    fn test_percentile_fraction() {
        let resolved = resolve("percentile(profile.duration, 0.75)").unwrap();
        assert_eq!(
            resolved.expr,
            parametric("quantile", vec![Literal::Float(0.75)], vec![col("duration_ns")])
                .alias("percentile_profile_duration_0_75")
        );
    }

    #[test]
    fn test_p100_is_max() {
        let resolved = resolve("p100()").unwrap();
        assert_eq!(
            resolved.expr,
            func("max", vec![col("duration_ns")]).alias("p100")
        );
    }

    #[test]
    fn test_reflective_type_follows_argument() {
        let resolved = resolve("max(project.id)").unwrap();
        assert_eq!(resolved.result_type, ColumnType::Kind(Kind::Integer));

        let resolved = resolve("p50()").unwrap();
        assert_eq!(
            resolved.result_type,
            ColumnType::Unit(DurationUnit::Nanosecond)
        );
    }

    #[test]
    fn test_result_type_falls_back_to_default() {
        let spec = FunctionRegistry::profiles().get("sum").unwrap();
        assert_eq!(
            spec.result_type(&ResolvedArgs::new(), ColumnRegistry::profiles()),
            ColumnType::Kind(Kind::Duration)
        );
    }

    #[test]
    fn test_last_seen_and_latest_event() {
        let resolved = resolve("last_seen()").unwrap();
        assert_eq!(
            resolved.expr,
            func("max", vec![col("received")]).alias("last_seen")
        );
        assert_eq!(resolved.result_type, ColumnType::Kind(Kind::Date));

        let resolved = resolve("latest_event()").unwrap();
        assert_eq!(
            resolved.expr,
            func("argMax", vec![col("profile_id"), col("received")]).alias("latest_event")
        );
        assert_eq!(resolved.result_type, ColumnType::Kind(Kind::String));
    }

    #[test]
    fn test_too_many_arguments() {
        let err = resolve("count_unique(id, trace)").unwrap_err();
        assert_eq!(
            err,
            QueryError::InvalidSearchQuery(
                "count_unique: expected at most 1 argument(s) but got 2 argument(s)".into()
            )
        );
    }

    #[test]
    fn test_fail_fast_on_first_argument() {
        // both arguments are invalid; the column is reported
        let err = resolve("percentile(device.arch, 7)").unwrap_err();
        assert_eq!(
            err,
            QueryError::InvalidFunctionArgument("device.arch is not a numeric column".into())
        );
    }

    #[test]
    fn test_unknown_function() {
        assert_eq!(
            resolve("p42(profile.duration)").unwrap_err(),
            QueryError::UnknownFunction("p42".into())
        );
    }

    #[test]
    fn test_entity_qualified_columns() {
        let ctx = ctx().with_entity(Some("profiles"));
        let resolved = FunctionRegistry::profiles()
            .resolve(&call("avg(profile.duration)"), &ctx)
            .unwrap();
        assert_eq!(
            resolved.expr,
            func(
                "avg",
                vec![crate::sql::expr::entity_col("profiles", "duration_ns")]
            )
            .alias("avg_profile_duration")
        );
    }
}
