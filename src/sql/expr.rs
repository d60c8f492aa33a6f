//! Expression AST - the query IR emitted by the compiler.
//!
//! This module provides a strongly-typed AST for backend expressions
//! with exhaustive pattern matching enforced by the compiler.

use super::dialect::{Dialect, SqlDialect};
use super::token::{Token, TokenStream};

// =============================================================================
// Expression AST
// =============================================================================

/// A backend query expression.
///
/// Every variant must be handled in `to_tokens_for_dialect()` - the compiler
/// enforces this.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Column reference: optional_entity.column
    Column {
        entity: Option<String>,
        name: String,
    },

    /// Literal values
    Literal(Literal),

    /// Array literal: [a, b, c]
    Array(Vec<Expr>),

    /// Function call: name(args...), or name(parameters...)(args...) for
    /// parametric aggregates such as `quantile(0.95)(x)`.
    Function {
        name: String,
        parameters: Vec<Literal>,
        args: Vec<Expr>,
    },

    /// Binary operation: left op right
    BinaryOp {
        left: Box<Expr>,
        op: BinaryOperator,
        right: Box<Expr>,
    },

    /// IN: expr IN (values...)
    In {
        expr: Box<Expr>,
        values: Vec<Expr>,
        negated: bool,
    },

    /// IS NULL / IS NOT NULL
    IsNull { expr: Box<Expr>, negated: bool },

    /// Aliased expression: expr AS alias
    Alias { expr: Box<Expr>, alias: String },
}

/// Literal values.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    String(String),
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    // Comparison
    Eq,
    Ne,
    Lt,
    Gt,
    Lte,
    Gte,
    // Logical
    And,
    Or,
    // Pattern
    Like,
    NotLike,
}

// =============================================================================
// Expression to Tokens
// =============================================================================

impl Expr {
    /// Render this expression as SQL text for a dialect.
    pub fn to_sql(&self, dialect: Dialect) -> String {
        self.to_tokens_for_dialect(dialect).serialize(dialect)
    }

    /// Convert this expression to a token stream for a specific dialect.
    ///
    /// This handles dialect-specific features like parametric aggregates.
    pub fn to_tokens_for_dialect(&self, dialect: Dialect) -> TokenStream {
        let mut ts = TokenStream::new();

        match self {
            Expr::Column { entity, name } => {
                if let Some(e) = entity {
                    ts.push(Token::Ident(e.clone()));
                    ts.push(Token::Dot);
                }
                ts.push(Token::Ident(name.clone()));
            }

            Expr::Literal(lit) => {
                ts.push(literal_to_token(lit));
            }

            Expr::Array(items) => {
                ts.push(Token::LBracket);
                emit_list(&mut ts, items, dialect);
                ts.push(Token::RBracket);
            }

            Expr::Function {
                name,
                parameters,
                args,
            } => {
                if name == "transform" && !dialect.supports_transform() {
                    if let Some(case) = transform_as_case(args) {
                        ts.append(&case.to_tokens_for_dialect(dialect));
                        return ts;
                    }
                }

                ts.push(Token::FunctionName(name.clone()));
                if parameters.is_empty() {
                    ts.lparen();
                    emit_list(&mut ts, args, dialect);
                    ts.rparen();
                } else if dialect.supports_parametric_aggregates() {
                    ts.lparen();
                    for (i, param) in parameters.iter().enumerate() {
                        if i > 0 {
                            ts.comma().space();
                        }
                        ts.push(literal_to_token(param));
                    }
                    ts.rparen().lparen();
                    emit_list(&mut ts, args, dialect);
                    ts.rparen();
                } else {
                    // Parameters trail the arguments
                    ts.lparen();
                    emit_list(&mut ts, args, dialect);
                    for param in parameters {
                        if !args.is_empty() {
                            ts.comma().space();
                        }
                        ts.push(literal_to_token(param));
                    }
                    ts.rparen();
                }
            }

            Expr::BinaryOp { left, op, right } => {
                emit_operand(&mut ts, left, *op, dialect);
                ts.space();
                match op {
                    BinaryOperator::NotLike => {
                        ts.push(Token::Not).space().push(Token::Like);
                    }
                    other => {
                        ts.push(binary_op_to_token(*other));
                    }
                }
                ts.space();
                emit_operand(&mut ts, right, *op, dialect);
                if matches!(op, BinaryOperator::Like | BinaryOperator::NotLike)
                    && dialect.requires_like_escape()
                {
                    ts.space()
                        .push(Token::Escape)
                        .space()
                        .push(Token::LitString("\\".into()));
                }
            }

            Expr::In {
                expr,
                values,
                negated,
            } => {
                // "x IN ()" is invalid; it is FALSE, and "x NOT IN ()" is TRUE
                if values.is_empty() {
                    ts.push(if *negated { Token::True } else { Token::False });
                } else {
                    ts.append(&expr.to_tokens_for_dialect(dialect));
                    if *negated {
                        ts.space().push(Token::Not);
                    }
                    ts.space().push(Token::In).space().lparen();
                    emit_list(&mut ts, values, dialect);
                    ts.rparen();
                }
            }

            Expr::IsNull { expr, negated } => {
                ts.append(&expr.to_tokens_for_dialect(dialect));
                ts.space();
                ts.push(if *negated {
                    Token::IsNotNull
                } else {
                    Token::IsNull
                });
            }

            Expr::Alias { expr, alias } => {
                ts.append(&expr.to_tokens_for_dialect(dialect));
                ts.space().push(Token::As).space();
                ts.push(Token::Ident(alias.clone()));
            }
        }

        ts
    }
}

fn emit_list(ts: &mut TokenStream, items: &[Expr], dialect: Dialect) {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            ts.comma().space();
        }
        ts.append(&item.to_tokens_for_dialect(dialect));
    }
}

/// `a OR b` under an AND keeps its grouping.
fn emit_operand(ts: &mut TokenStream, operand: &Expr, parent: BinaryOperator, dialect: Dialect) {
    let grouped = parent == BinaryOperator::And
        && matches!(
            operand,
            Expr::BinaryOp {
                op: BinaryOperator::Or,
                ..
            }
        );
    if grouped {
        ts.lparen();
    }
    ts.append(&operand.to_tokens_for_dialect(dialect));
    if grouped {
        ts.rparen();
    }
}

fn literal_to_token(lit: &Literal) -> Token {
    match lit {
        Literal::Int(n) => Token::LitInt(*n),
        Literal::Float(f) => Token::LitFloat(*f),
        Literal::String(s) => Token::LitString(s.clone()),
    }
}

fn binary_op_to_token(op: BinaryOperator) -> Token {
    match op {
        BinaryOperator::Eq => Token::Eq,
        BinaryOperator::Ne => Token::Ne,
        BinaryOperator::Lt => Token::Lt,
        BinaryOperator::Gt => Token::Gt,
        BinaryOperator::Lte => Token::Lte,
        BinaryOperator::Gte => Token::Gte,
        BinaryOperator::And => Token::And,
        BinaryOperator::Or => Token::Or,
        BinaryOperator::Like => Token::Like,
        BinaryOperator::NotLike => Token::Like,
    }
}

/// Lower `transform(x, [from...], [to...], default)` into a token-level CASE.
///
/// Returns `None` when the arguments are not in that exact shape.
fn transform_as_case(args: &[Expr]) -> Option<CaseExpr> {
    match args {
        [subject, Expr::Array(from), Expr::Array(to), default] if from.len() == to.len() => {
            Some(CaseExpr {
                subject: subject.clone(),
                branches: from.iter().cloned().zip(to.iter().cloned()).collect(),
                default: default.clone(),
            })
        }
        _ => None,
    }
}

/// `CASE subject WHEN a THEN b ... ELSE default END`, used only for
/// rendering `transform` on dialects that lack it.
struct CaseExpr {
    subject: Expr,
    branches: Vec<(Expr, Expr)>,
    default: Expr,
}

impl CaseExpr {
    fn to_tokens_for_dialect(&self, dialect: Dialect) -> TokenStream {
        let mut ts = TokenStream::new();
        if self.branches.is_empty() {
            ts.append(&self.default.to_tokens_for_dialect(dialect));
            return ts;
        }
        ts.push(Token::Case).space();
        ts.append(&self.subject.to_tokens_for_dialect(dialect));
        for (when, then) in &self.branches {
            ts.space().push(Token::When).space();
            ts.append(&when.to_tokens_for_dialect(dialect));
            ts.space().push(Token::Then).space();
            ts.append(&then.to_tokens_for_dialect(dialect));
        }
        ts.space().push(Token::Else).space();
        ts.append(&self.default.to_tokens_for_dialect(dialect));
        ts.space().push(Token::End);
        ts
    }
}

// =============================================================================
// Expression Constructors
// =============================================================================

/// Create a column reference.
pub fn col(name: &str) -> Expr {
    Expr::Column {
        entity: None,
        name: name.into(),
    }
}

/// Create a qualified column reference (entity.column).
pub fn entity_col(entity: &str, name: &str) -> Expr {
    Expr::Column {
        entity: Some(entity.into()),
        name: name.into(),
    }
}

/// Create an integer literal.
pub fn lit_int(n: i64) -> Expr {
    Expr::Literal(Literal::Int(n))
}

/// Create a float literal.
pub fn lit_float(f: f64) -> Expr {
    Expr::Literal(Literal::Float(f))
}

/// Create a string literal.
pub fn lit_str(s: &str) -> Expr {
    Expr::Literal(Literal::String(s.into()))
}

/// Create an array literal.
pub fn array(items: Vec<Expr>) -> Expr {
    Expr::Array(items)
}

/// Create a function call.
pub fn func(name: &str, args: Vec<Expr>) -> Expr {
    Expr::Function {
        name: name.into(),
        parameters: vec![],
        args,
    }
}

/// Create a parametric aggregate call: name(parameters)(args).
pub fn parametric(name: &str, parameters: Vec<Literal>, args: Vec<Expr>) -> Expr {
    Expr::Function {
        name: name.into(),
        parameters,
        args,
    }
}

// =============================================================================
// Fluent Expression Extension
// =============================================================================

/// Extension trait for fluent expression building.
pub trait ExprExt: Sized {
    fn into_expr(self) -> Expr;

    /// self = other
    fn eq(self, other: impl Into<Expr>) -> Expr {
        binary(self.into_expr(), BinaryOperator::Eq, other.into())
    }

    /// self != other
    fn ne(self, other: impl Into<Expr>) -> Expr {
        binary(self.into_expr(), BinaryOperator::Ne, other.into())
    }

    /// self > other
    fn gt(self, other: impl Into<Expr>) -> Expr {
        binary(self.into_expr(), BinaryOperator::Gt, other.into())
    }

    /// self >= other
    fn gte(self, other: impl Into<Expr>) -> Expr {
        binary(self.into_expr(), BinaryOperator::Gte, other.into())
    }

    /// self < other
    fn lt(self, other: impl Into<Expr>) -> Expr {
        binary(self.into_expr(), BinaryOperator::Lt, other.into())
    }

    /// self <= other
    fn lte(self, other: impl Into<Expr>) -> Expr {
        binary(self.into_expr(), BinaryOperator::Lte, other.into())
    }

    /// self AND other
    fn and(self, other: impl Into<Expr>) -> Expr {
        binary(self.into_expr(), BinaryOperator::And, other.into())
    }

    /// self OR other
    fn or(self, other: impl Into<Expr>) -> Expr {
        binary(self.into_expr(), BinaryOperator::Or, other.into())
    }

    /// self LIKE pattern
    fn like(self, pattern: impl Into<Expr>) -> Expr {
        binary(self.into_expr(), BinaryOperator::Like, pattern.into())
    }

    /// self NOT LIKE pattern
    fn not_like(self, pattern: impl Into<Expr>) -> Expr {
        binary(self.into_expr(), BinaryOperator::NotLike, pattern.into())
    }

    /// self IS NULL
    fn is_null(self) -> Expr {
        Expr::IsNull {
            expr: Box::new(self.into_expr()),
            negated: false,
        }
    }

    /// self IS NOT NULL
    fn is_not_null(self) -> Expr {
        Expr::IsNull {
            expr: Box::new(self.into_expr()),
            negated: true,
        }
    }

    /// self IN (values...)
    fn in_list(self, values: Vec<Expr>) -> Expr {
        Expr::In {
            expr: Box::new(self.into_expr()),
            values,
            negated: false,
        }
    }

    /// self NOT IN (values...)
    fn not_in_list(self, values: Vec<Expr>) -> Expr {
        Expr::In {
            expr: Box::new(self.into_expr()),
            values,
            negated: true,
        }
    }

    /// self AS name
    fn alias(self, name: &str) -> Expr {
        Expr::Alias {
            expr: Box::new(self.into_expr()),
            alias: name.into(),
        }
    }
}

fn binary(left: Expr, op: BinaryOperator, right: Expr) -> Expr {
    Expr::BinaryOp {
        left: Box::new(left),
        op,
        right: Box::new(right),
    }
}

impl ExprExt for Expr {
    fn into_expr(self) -> Expr {
        self
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<i64> for Expr {
    fn from(n: i64) -> Self {
        lit_int(n)
    }
}

impl From<f64> for Expr {
    fn from(f: f64) -> Self {
        lit_float(f)
    }
}

impl From<&str> for Expr {
    fn from(s: &str) -> Self {
        lit_str(s)
    }
}

impl From<String> for Expr {
    fn from(s: String) -> Self {
        Expr::Literal(Literal::String(s))
    }
}

impl From<Literal> for Expr {
    fn from(lit: Literal) -> Self {
        Expr::Literal(lit)
    }
}
