//! Grammar types of the search language, in declaration order.
//!
//! The order of [`ArgType::ORDER`] is the single source of truth for two things:
//! which type claims a token during classification (first match wins), and
//! which unfolded operator is folded first while building the hierarchy
//! (lowest index first).

use std::collections::HashMap;
use std::fmt::Display;

use once_cell::sync::Lazy;

use crate::config::SearchConfig;
use crate::row::Value;

use super::errors::{SearchError, SearchResult};
use super::lexer::{comparison_symbols, get_parenthesis_end, get_quote_end, has_top_level_whitespace};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArgType {
    Root,
    Empty,
    Not,
    Logic,
    KeyValue,
    BracesFunction,
    QuotedText,
    RawText,
}

impl ArgType {
    pub const ORDER: [ArgType; 8] = [
        ArgType::Root,
        ArgType::Empty,
        ArgType::Not,
        ArgType::Logic,
        ArgType::KeyValue,
        ArgType::BracesFunction,
        ArgType::QuotedText,
        ArgType::RawText,
    ];

    /// Position in [`ArgType::ORDER`]; lower binds first.
    pub fn priority(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            ArgType::Root => "root",
            ArgType::Empty => "empty",
            ArgType::Not => "not",
            ArgType::Logic => "logic",
            ArgType::KeyValue => "key-val",
            ArgType::BracesFunction => "braces_function",
            ArgType::QuotedText => "quoted_text",
            ArgType::RawText => "text_or_column",
        }
    }

    /// Whether this type claims `token`.
    pub fn matches(self, token: &str, config: &SearchConfig) -> bool {
        match self {
            // only ever produced by the builder
            ArgType::Root => false,
            ArgType::Empty => token.is_empty(),
            ArgType::Not => token == "NOT",
            ArgType::Logic => LogicOp::parse(token).is_some(),
            ArgType::KeyValue => split_comparison(token, config.extended_operators).is_some(),
            ArgType::BracesFunction => match_brace_function(token).is_some(),
            ArgType::QuotedText => unquote(token).is_some(),
            ArgType::RawText => !token.is_empty() && !has_top_level_whitespace(token),
        }
    }

    /// Whether folding this type consumes neighbouring siblings.
    pub fn nests(self) -> bool {
        matches!(self, ArgType::Not | ArgType::Logic)
    }

    /// The first type, in declaration order, that claims `token`.
    pub fn classify(token: &str, config: &SearchConfig) -> SearchResult<ArgType> {
        Self::ORDER
            .iter()
            .copied()
            .find(|t| t.matches(token, config))
            .ok_or_else(|| SearchError::no_type_found(token))
    }
}

impl Display for ArgType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogicOp {
    And,
    Or,
}

impl LogicOp {
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "AND" => Some(LogicOp::And),
            "OR" => Some(LogicOp::Or),
            _ => None,
        }
    }
}

impl Display for LogicOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            LogicOp::And => "AND",
            LogicOp::Or => "OR",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl CompareOp {
    pub fn parse(symbol: &str) -> Option<Self> {
        match symbol {
            "=" => Some(CompareOp::Eq),
            "!=" => Some(CompareOp::Ne),
            "<" => Some(CompareOp::Lt),
            ">" => Some(CompareOp::Gt),
            "<=" => Some(CompareOp::Le),
            ">=" => Some(CompareOp::Ge),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Gt => ">",
            CompareOp::Le => "<=",
            CompareOp::Ge => ">=",
        }
    }
}

impl Display for CompareOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Split a key-value token at its only top-level comparison symbol.
///
/// Tokens with zero or several comparison symbols are not key-value pairs.
pub fn split_comparison(token: &str, extended: bool) -> Option<(&str, CompareOp, &str)> {
    let symbols = comparison_symbols(token, extended);
    let [(offset, symbol)] = symbols.as_slice() else {
        return None;
    };
    let op = CompareOp::parse(symbol)?;
    Some((&token[..*offset], op, &token[offset + symbol.len()..]))
}

/// Text between the quotes of a token that is exactly one quoted span.
pub fn unquote(token: &str) -> Option<&str> {
    if token.len() < 2 || !token.starts_with('"') {
        return None;
    }
    match get_quote_end(token, 0) {
        Some(end) if end == token.len() - 1 => Some(&token[1..end]),
        _ => None,
    }
}

/// A function callable as `key(arg, ...)`.
pub struct BraceFunction {
    pub key: &'static str,
    /// Name used in error messages.
    pub name: &'static str,
    pub arity: usize,
    /// Arguments resolve bare column names to row values.
    pub column_args: bool,
    apply: fn(&[Value]) -> Value,
}

impl std::fmt::Debug for BraceFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BraceFunction")
            .field("key", &self.key)
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

impl PartialEq for BraceFunction {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl BraceFunction {
    pub fn check_arity(&self, count: usize) -> SearchResult<()> {
        if count == self.arity {
            Ok(())
        } else {
            Err(SearchError::invalid_arguments(self.name))
        }
    }

    pub fn apply(&self, args: &[Value]) -> Value {
        (self.apply)(args)
    }
}

static BRACE_FUNCTIONS: Lazy<HashMap<&'static str, BraceFunction>> = Lazy::new(|| {
    let functions = [
        BraceFunction {
            key: "abs",
            name: "abs",
            arity: 1,
            column_args: true,
            apply: |args| match args {
                [value] => Value::Number(value.as_number().map_or(f64::NAN, f64::abs)),
                _ => Value::Number(f64::NAN),
            },
        },
        // plain grouping parentheses
        BraceFunction {
            key: "",
            name: "group",
            arity: 1,
            column_args: false,
            apply: |args| match args {
                [value] => value.clone(),
                _ => Value::Str(String::new()),
            },
        },
    ];
    functions.into_iter().map(|f| (f.key, f)).collect()
});

pub fn brace_function(key: &str) -> Option<&'static BraceFunction> {
    BRACE_FUNCTIONS.get(key)
}

/// Resolve `key(inner)` tokens to their function and argument text.
///
/// The opening parenthesis right after the key must be the one closed by the
/// token's final character, so `(a)AND(b)` is not a call.
pub fn match_brace_function(token: &str) -> Option<(&'static BraceFunction, &str)> {
    if !token.ends_with(')') {
        return None;
    }
    let open = token.find('(')?;
    let function = brace_function(&token[..open])?;
    if get_parenthesis_end(token, open)? != token.len() - 1 {
        return None;
    }
    Some((function, &token[open + 1..token.len() - 1]))
}
