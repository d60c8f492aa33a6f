//! End-to-end compilation from search tokens to SQL.
//!
//! This module provides the high-level API for compiling a profiles query:
//!
//! ```text
//! fields + filters + params → ProfilesDatasetConfig → Query → SQL
//! ```
//!
//! # Example
//!
//! ```
//! use profql::compile::{compile_query, CompileOptions, QueryRequest};
//! use profql::dataset::{ParamsContext, Project};
//! use profql::search::{Operator, SearchFilter};
//! use profql::sql::Dialect;
//!
//! let request = QueryRequest::new(
//!     ["device.arch", "p95()", "count()"],
//!     ParamsContext::new(1, vec![Project::new(7, "ios")]),
//! )
//! .filter(SearchFilter::new("profile.duration", Operator::Gt, "100ms"));
//!
//! let options = CompileOptions::default().with_dialect(Dialect::DuckDb);
//! let output = compile_query(&request, &options)?;
//! assert!(output.requires_grouping);
//! println!("{}", output.sql);
//! # Ok::<(), profql::compile::CompileError>(())
//! ```

use serde::{Deserialize, Serialize};

use crate::config::{Settings, SettingsError};
use crate::dataset::{ColumnType, ParamsContext, ProfilesDatasetConfig, QueryError, ResolvedField};
use crate::search::SearchFilter;
use crate::sql::expr::{lit_int, Expr, ExprExt};
use crate::sql::query::Query;
use crate::sql::Dialect;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during compilation.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("No fields selected")]
    EmptySelect,

    #[error(
        "A single field cannot be used both inside and outside a function in the same query. \
         To use {column} you must first remove the function(s): {functions}"
    )]
    GroupingConflict { column: String, functions: String },

    #[error("Duplicate output name {alias}: {first} and {second} cannot share it")]
    DuplicateAlias {
        alias: String,
        first: String,
        second: String,
    },
}

pub type CompileResult<T> = Result<T, CompileError>;

// ============================================================================
// Options
// ============================================================================

/// Options for compilation.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileOptions {
    /// SQL dialect to generate.
    pub dialect: Dialect,

    /// Entity to read from.
    pub entity: String,

    /// Qualify column references with the entity.
    pub qualify_columns: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            dialect: Dialect::ClickHouse,
            entity: "profiles".to_string(),
            qualify_columns: false,
        }
    }
}

impl CompileOptions {
    /// Build options from loaded settings.
    pub fn from_settings(settings: &Settings) -> Result<Self, SettingsError> {
        Ok(Self {
            dialect: settings.compiler.dialect()?,
            entity: settings.compiler.resolved_entity()?,
            qualify_columns: settings.compiler.qualify_columns,
        })
    }

    /// Set the SQL dialect.
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Set the entity to read from.
    pub fn with_entity(mut self, entity: &str) -> Self {
        self.entity = entity.to_string();
        self
    }

    /// Qualify column references with the entity.
    pub fn with_qualified_columns(mut self, qualify: bool) -> Self {
        self.qualify_columns = qualify;
        self
    }
}

// ============================================================================
// Request / Result Types
// ============================================================================

/// What to compile: selected fields, filters and the request's scope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    /// Columns, aliases and function calls, e.g. `p95(profile.duration) AS slow`.
    pub selected_columns: Vec<String>,

    #[serde(default)]
    pub filters: Vec<SearchFilter>,

    #[serde(default)]
    pub params: ParamsContext,
}

impl QueryRequest {
    pub fn new<I, S>(selected_columns: I, params: ParamsContext) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            selected_columns: selected_columns.into_iter().map(Into::into).collect(),
            filters: vec![],
            params,
        }
    }

    /// Add a filter token.
    pub fn filter(mut self, filter: SearchFilter) -> Self {
        self.filters.push(filter);
        self
    }
}

/// Output name and advisory type of a selected field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMeta {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: Option<ColumnType>,
}

/// Result of compiling a query to SQL.
#[derive(Debug, Clone)]
pub struct CompileOutput {
    /// The generated SQL string.
    pub sql: String,

    /// The SQL query AST (for further manipulation if needed).
    pub query: Query,

    /// One entry per selected field, in select order.
    pub meta: Vec<FieldMeta>,

    /// Whether the select list mixes aggregates with plain fields.
    pub requires_grouping: bool,

    /// The dialect used for generation.
    pub dialect: Dialect,
}

// ============================================================================
// Compilation Functions
// ============================================================================

/// Compile a query request to SQL.
pub fn compile_query(request: &QueryRequest, options: &CompileOptions) -> CompileResult<CompileOutput> {
    if request.selected_columns.is_empty() {
        return Err(CompileError::EmptySelect);
    }

    let entity = options.qualify_columns.then_some(options.entity.as_str());
    let config = ProfilesDatasetConfig::new(&request.params).with_entity(entity);

    // Step 1: Resolve the select list
    let mut fields: Vec<ResolvedField> = Vec::with_capacity(request.selected_columns.len());
    let mut sources: Vec<&str> = Vec::with_capacity(request.selected_columns.len());
    for raw in &request.selected_columns {
        let field = config.resolve_select(raw)?;
        if let Some(i) = fields.iter().position(|f| f.alias() == field.alias()) {
            // Repeats of the same field collapse; a different field may not reuse the name
            if fields[i].expr() != field.expr() {
                return Err(CompileError::DuplicateAlias {
                    alias: field.alias().to_string(),
                    first: sources[i].trim().to_string(),
                    second: raw.trim().to_string(),
                });
            }
            tracing::trace!(field = %raw, "duplicate field skipped");
            continue;
        }
        fields.push(field);
        sources.push(raw);
    }

    check_grouping_conflicts(&fields)?;

    // Step 2: Scope conditions, then user filters
    let mut query = Query::new()
        .select(fields.iter().map(|f| f.expr().clone()).collect())
        .from(&options.entity);
    for condition in scope_conditions(&config)? {
        query = query.filter(condition);
    }
    for filter in &request.filters {
        query = query.filter(config.resolve_filter(filter)?);
    }

    // Step 3: Group plain fields when aggregating
    let requires_grouping = fields.iter().any(ResolvedField::is_aggregate)
        && fields.iter().any(|f| !f.is_aggregate());
    if requires_grouping {
        query = query.group_by(
            fields
                .iter()
                .filter(|f| !f.is_aggregate())
                .map(|f| unaliased(f.expr()).clone())
                .collect(),
        );
    }

    // Step 4: Generate SQL
    let sql = query.to_sql(options.dialect);
    let meta = fields
        .iter()
        .map(|f| FieldMeta {
            name: f.alias().to_string(),
            column_type: f.column_type(),
        })
        .collect();

    tracing::debug!(
        dialect = %options.dialect,
        fields = fields.len(),
        filters = request.filters.len(),
        requires_grouping,
        "compiled query"
    );

    Ok(CompileOutput {
        sql,
        query,
        meta,
        requires_grouping,
        dialect: options.dialect,
    })
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Organization and project restrictions implied by the request params.
fn scope_conditions(config: &ProfilesDatasetConfig<'_>) -> CompileResult<Vec<Expr>> {
    let params = config.params();
    let mut conditions = Vec::new();

    if let Some(organization_id) = params.organization_id {
        let column = config.resolve_field("organization.id")?;
        conditions.push(unaliased(&column).clone().eq(lit_int(organization_id)));
    }

    if !params.projects.is_empty() {
        let mut ids = params.project_ids();
        ids.sort_unstable();
        ids.dedup();
        let column = config.resolve_field("project.id")?;
        conditions.push(
            unaliased(&column)
                .clone()
                .in_list(ids.into_iter().map(lit_int).collect()),
        );
    }

    Ok(conditions)
}

/// Columns consumed by a grouping function may not be selected on their own.
fn check_grouping_conflicts(fields: &[ResolvedField]) -> CompileResult<()> {
    let plain: Vec<&str> = fields
        .iter()
        .filter_map(|f| match f {
            ResolvedField::Column { alias, .. } => Some(alias.as_str()),
            _ => None,
        })
        .collect();

    for column in plain {
        let functions: Vec<&str> = fields
            .iter()
            .filter_map(|f| match f {
                ResolvedField::Function(function)
                    if function.forces_grouping
                        && function.arguments.columns().any(|c| c == column) =>
                {
                    Some(function.alias.as_str())
                }
                _ => None,
            })
            .collect();

        if !functions.is_empty() {
            return Err(CompileError::GroupingConflict {
                column: column.to_string(),
                functions: functions.join(", "),
            });
        }
    }

    Ok(())
}

fn unaliased(expr: &Expr) -> &Expr {
    match expr {
        Expr::Alias { expr, .. } => expr,
        other => other,
    }
}
