//! Parsed search tokens consumed by the dataset compiler.
//!
//! The search-language parser lives upstream; it hands over filter tokens
//! (`key`, operator, value) and function calls. Function calls can also be
//! parsed here from their select-list text, `name(arg, ...) AS alias`.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// Comparison operator of a filter token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    NotIn,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::In => "IN",
            Operator::NotIn => "NOT IN",
        }
    }

    /// `!=` and `NOT IN`.
    pub fn is_negation(&self) -> bool {
        matches!(self, Operator::Ne | Operator::NotIn)
    }

    /// `IN` and `NOT IN`.
    pub fn is_list(&self) -> bool {
        matches!(self, Operator::In | Operator::NotIn)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw value of a filter token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SearchValue {
    Single(String),
    List(Vec<String>),
}

impl SearchValue {
    /// The value(s) as a slice-like list.
    pub fn values(&self) -> Vec<&str> {
        match self {
            SearchValue::Single(value) => vec![value.as_str()],
            SearchValue::List(values) => values.iter().map(String::as_str).collect(),
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, SearchValue::List(_))
    }
}

impl fmt::Display for SearchValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchValue::Single(value) => f.write_str(value),
            SearchValue::List(values) => write!(f, "[{}]", values.join(", ")),
        }
    }
}

impl From<&str> for SearchValue {
    fn from(value: &str) -> Self {
        SearchValue::Single(value.to_string())
    }
}

impl From<String> for SearchValue {
    fn from(value: String) -> Self {
        SearchValue::Single(value)
    }
}

impl From<Vec<&str>> for SearchValue {
    fn from(values: Vec<&str>) -> Self {
        SearchValue::List(values.into_iter().map(str::to_string).collect())
    }
}

/// A filter token: `key operator value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilter {
    pub key: String,
    pub operator: Operator,
    pub value: SearchValue,
}

impl SearchFilter {
    pub fn new(key: &str, operator: Operator, value: impl Into<SearchValue>) -> Self {
        Self {
            key: key.to_string(),
            operator,
            value: value.into(),
        }
    }
}

impl fmt::Display for SearchFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.key, self.operator, self.value)
    }
}

/// A function call token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub args: Vec<String>,
    /// Output alias of the compiled expression.
    pub alias: String,
}

static FUNCTION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<function>[a-zA-Z_][a-zA-Z0-9_.]*)\((?P<columns>.*)\)(?:\s+(?:as|AS)\s+(?P<alias>\S+))?$")
        .unwrap()
});

static NON_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\W").unwrap());

impl FunctionCall {
    /// Build a call with the default alias.
    pub fn new(name: &str, args: Vec<String>) -> Self {
        let alias = default_alias(name, &args);
        Self {
            name: name.to_string(),
            args,
            alias,
        }
    }

    /// Replace the output alias.
    pub fn with_alias(mut self, alias: &str) -> Self {
        self.alias = alias.to_string();
        self
    }

    /// Parse `name(arg, ...)` or `name(arg, ...) AS alias`.
    ///
    /// Returns `None` when the text is not call-shaped, in which case it
    /// should be treated as a plain field.
    pub fn parse(text: &str) -> Option<Self> {
        let captures = FUNCTION_PATTERN.captures(text.trim())?;
        let name = captures.name("function")?.as_str();
        let args = split_arguments(captures.name("columns").map_or("", |m| m.as_str()));
        let call = FunctionCall::new(name, args);
        Some(match captures.name("alias") {
            Some(alias) => call.with_alias(alias.as_str()),
            None => call,
        })
    }

    /// Whether `text` looks like a function call.
    pub fn is_call(text: &str) -> bool {
        FUNCTION_PATTERN.is_match(text.trim())
    }
}

impl fmt::Display for FunctionCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.args.join(", "))
    }
}

/// Split an argument list on commas outside double quotes.
fn split_arguments(columns: &str) -> Vec<String> {
    if columns.trim().is_empty() {
        return vec![];
    }

    let mut args = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    for c in columns.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                current.push(c);
            }
            ',' if !quoted => {
                args.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    args.push(current.trim().to_string());
    args
}

/// Default output alias: `p95(profile.duration)` → `p95_profile_duration`.
pub fn default_alias(name: &str, args: &[String]) -> String {
    let columns = NON_WORD.replace_all(&args.join("_"), "_").into_owned();
    format!("{name}_{columns}").trim_end_matches('_').to_string()
}
