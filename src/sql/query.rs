//! SELECT query assembly.
//!
//! A deliberately small query shape: a select list over one entity, ANDed
//! conditions and a GROUP BY list. It is what the compile facade renders
//! after the dataset config has resolved every field and filter.

use super::dialect::Dialect;
use super::expr::{Expr, ExprExt};
use super::token::{Token, TokenStream};

/// A SELECT query over a single entity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub select: Vec<Expr>,
    pub from: Option<String>,
    pub where_clause: Option<Expr>,
    pub group_by: Vec<Expr>,
}

impl Query {
    /// Create a new empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the SELECT list.
    pub fn select(mut self, exprs: Vec<Expr>) -> Self {
        self.select = exprs;
        self
    }

    /// Set the entity to read from.
    pub fn from(mut self, entity: &str) -> Self {
        self.from = Some(entity.into());
        self
    }

    /// Add a WHERE condition (ANDed with existing conditions).
    pub fn filter(mut self, condition: Expr) -> Self {
        self.where_clause = Some(match self.where_clause {
            Some(existing) => existing.and(condition),
            None => condition,
        });
        self
    }

    /// Set the GROUP BY clause.
    pub fn group_by(mut self, exprs: Vec<Expr>) -> Self {
        self.group_by = exprs;
        self
    }

    /// Convert to token stream for a specific dialect.
    pub fn to_tokens_for_dialect(&self, dialect: Dialect) -> TokenStream {
        let mut ts = TokenStream::new();

        ts.push(Token::Select);
        for (i, expr) in self.select.iter().enumerate() {
            if i == 0 {
                ts.newline().indent(1);
            } else {
                ts.comma().newline().indent(1);
            }
            ts.append(&expr.to_tokens_for_dialect(dialect));
        }

        if let Some(from) = &self.from {
            ts.newline().push(Token::From).space();
            ts.push(Token::Ident(from.clone()));
        }

        if let Some(where_clause) = &self.where_clause {
            ts.newline().push(Token::Where).space();
            ts.append(&where_clause.to_tokens_for_dialect(dialect));
        }

        if !self.group_by.is_empty() {
            ts.newline().push(Token::GroupBy).space();
            for (i, expr) in self.group_by.iter().enumerate() {
                if i > 0 {
                    ts.comma().space();
                }
                ts.append(&expr.to_tokens_for_dialect(dialect));
            }
        }

        ts
    }

    /// Generate SQL string for a specific dialect.
    pub fn to_sql(&self, dialect: Dialect) -> String {
        self.to_tokens_for_dialect(dialect).serialize(dialect)
    }
}

impl std::fmt::Display for Query {
    /// Formats the query using the default dialect (ClickHouse).
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_sql(Dialect::default()))
    }
}
