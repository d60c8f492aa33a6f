//! Aliases that need the request's project scope to resolve.
//!
//! `project` and `project.name` are project slugs to query authors but the
//! entity only stores `project_id`. Filters map slugs to ids; selects map ids
//! back to slugs.

use serde::{Deserialize, Serialize};

use super::error::{QueryError, QueryResult};
use super::functions::BuildContext;
use crate::search::{Operator, SearchFilter};
use crate::sql::expr::{array, func, lit_int, lit_str, Expr, ExprExt};

pub const PROJECT_ALIAS: &str = "project";
pub const PROJECT_NAME_ALIAS: &str = "project.name";

/// A project in the active scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub slug: String,
}

impl Project {
    pub fn new(id: i64, slug: &str) -> Self {
        Self {
            id,
            slug: slug.to_string(),
        }
    }
}

/// Organization and project scope of one compilation request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamsContext {
    pub organization_id: Option<i64>,
    /// Projects actively selected by the request.
    #[serde(default)]
    pub projects: Vec<Project>,
}

impl ParamsContext {
    pub fn new(organization_id: i64, projects: Vec<Project>) -> Self {
        Self {
            organization_id: Some(organization_id),
            projects,
        }
    }

    pub fn project_by_slug(&self, slug: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.slug == slug)
    }

    pub fn project_ids(&self) -> Vec<i64> {
        self.projects.iter().map(|p| p.id).collect()
    }
}

/// Filter-position resolver signature.
pub type FilterConverter = fn(&SearchFilter, &ParamsContext, &BuildContext<'_>) -> QueryResult<Expr>;

/// Select-position resolver signature.
pub type FieldConverter = fn(&str, &ParamsContext, &BuildContext<'_>) -> QueryResult<Expr>;

/// `project:slug` → `project_id = id`, `project:[a, b]` → `project_id IN (...)`.
pub fn project_slug_filter(
    filter: &SearchFilter,
    params: &ParamsContext,
    ctx: &BuildContext<'_>,
) -> QueryResult<Expr> {
    if !matches!(
        filter.operator,
        Operator::Eq | Operator::Ne | Operator::In | Operator::NotIn
    ) {
        return Err(QueryError::InvalidSearchQuery(format!(
            "Invalid operator {} for {}",
            filter.operator, filter.key
        )));
    }

    let column = ctx.column("project.id")?;
    let negated = filter.operator.is_negation();

    let mut slugs: Vec<&str> = filter
        .value
        .values()
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect();
    slugs.sort_unstable();
    slugs.dedup();

    // `has:project` / `!has:project`
    if slugs.is_empty() {
        return Ok(if negated {
            column.is_not_null()
        } else {
            column.is_null()
        });
    }

    let missing: Vec<&str> = slugs
        .iter()
        .copied()
        .filter(|slug| params.project_by_slug(slug).is_none())
        .collect();
    if !missing.is_empty() {
        return Err(QueryError::InvalidSearchQuery(format!(
            "Invalid query. Project(s) {} do not exist or are not actively selected.",
            oxfordize_list(&missing)
        )));
    }

    let mut ids: Vec<i64> = slugs
        .iter()
        .filter_map(|slug| params.project_by_slug(slug))
        .map(|p| p.id)
        .collect();
    ids.sort_unstable();

    tracing::trace!(key = %filter.key, ?ids, negated, "resolved project slugs");

    Ok(match (ids.as_slice(), negated) {
        ([id], false) => column.eq(lit_int(*id)),
        ([id], true) => column.ne(lit_int(*id)),
        (_, false) => column.in_list(ids.into_iter().map(lit_int).collect()),
        (_, true) => column.not_in_list(ids.into_iter().map(lit_int).collect()),
    })
}

/// `project` in a select list → `transform(project_id, [ids], [slugs], '')`.
pub fn project_slug_field(
    alias: &str,
    params: &ParamsContext,
    ctx: &BuildContext<'_>,
) -> QueryResult<Expr> {
    if params.projects.is_empty() {
        return Err(QueryError::InvalidSearchQuery(format!(
            "Invalid query. {alias} requires at least one actively selected project."
        )));
    }

    let mut projects: Vec<&Project> = params.projects.iter().collect();
    projects.sort_by_key(|p| p.id);

    Ok(func(
        "transform",
        vec![
            ctx.column("project.id")?,
            array(projects.iter().map(|p| lit_int(p.id)).collect()),
            array(projects.iter().map(|p| lit_str(&p.slug)).collect()),
            lit_str(""),
        ],
    )
    .alias(alias))
}

/// `a`, `a and b`, `a, b, and c`.
fn oxfordize_list(items: &[&str]) -> String {
    match items {
        [] => String::new(),
        [only] => only.to_string(),
        [first, second] => format!("{first} and {second}"),
        [rest @ .., last] => format!("{}, and {last}", rest.join(", ")),
    }
}
