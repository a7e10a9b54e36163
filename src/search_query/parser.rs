use std::fmt::Display;

use crate::config::SearchConfig;

use super::errors::{SearchError, SearchResult};
use super::grammar::{match_brace_function, split_comparison, unquote, ArgType, BraceFunction, CompareOp, LogicOp};
use super::lexer::split_args;
use super::normalize::normalize;

/// A node of a built search tree. Children are owned exclusively.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Root(Vec<Node>),
    Empty,
    Not(Box<Node>),
    Logic {
        op: LogicOp,
        left: Box<Node>,
        right: Box<Node>,
    },
    KeyValue {
        op: CompareOp,
        key: Box<Node>,
        value: Box<Node>,
    },
    BracesFunction {
        function: &'static BraceFunction,
        args: Vec<Node>,
    },
    QuotedText(String),
    RawText(String),
}

impl Node {
    pub fn arg_type(&self) -> ArgType {
        match self {
            Node::Root(_) => ArgType::Root,
            Node::Empty => ArgType::Empty,
            Node::Not(_) => ArgType::Not,
            Node::Logic { .. } => ArgType::Logic,
            Node::KeyValue { .. } => ArgType::KeyValue,
            Node::BracesFunction { .. } => ArgType::BracesFunction,
            Node::QuotedText(_) => ArgType::QuotedText,
            Node::RawText(_) => ArgType::RawText,
        }
    }

    /// Text of a root holding a single plain token, e.g. the key of `name=x`.
    pub fn single_text(&self) -> Option<&str> {
        match self {
            Node::Root(children) => match children.as_slice() {
                [only] => only.single_text(),
                _ => None,
            },
            Node::QuotedText(text) | Node::RawText(text) => Some(text),
            _ => None,
        }
    }

    /// Canonical debug representation.
    pub fn print(&self) -> String {
        self.to_string()
    }
}

fn join(nodes: &[Node]) -> String {
    nodes
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Node::Root(children) => write!(f, "root([{}])", join(children)),
            Node::Empty => write!(f, "empty()"),
            Node::Not(inner) => write!(f, "not({inner})"),
            Node::Logic { op, left, right } => write!(f, "logic({op}, [{left}, {right}])"),
            Node::KeyValue {
                op: CompareOp::Eq,
                key,
                value,
            } => write!(f, "key-val({key}, {value})"),
            Node::KeyValue { op, key, value } => write!(f, "key-val({op}, {key}, {value})"),
            Node::BracesFunction { function, args } => {
                write!(f, "braces_function({}, [{}])", function.name, join(args))
            }
            Node::QuotedText(text) => write!(f, "quoted_text(\"{text}\")"),
            Node::RawText(text) => write!(f, "text_or_column(\"{text}\")"),
        }
    }
}

/// A built node with the height of its subtree.
#[derive(Debug)]
struct Built {
    node: Node,
    height: usize,
}

/// A classified token waiting for the fold phase.
///
/// Operators stay `Not`/`Logic` until folding claims their operands; everything
/// else is complete as soon as it is classified.
#[derive(Debug)]
enum Pending {
    Not,
    Logic(LogicOp),
    Done(Built),
}

/// Builds immutable search trees from query text.
pub struct TreeBuilder<'c> {
    config: &'c SearchConfig,
}

impl<'c> TreeBuilder<'c> {
    pub fn new(config: &'c SearchConfig) -> Self {
        Self { config }
    }

    /// Build the tree for `query`. The result is always a [`Node::Root`].
    ///
    /// Fails with [`SearchError::TooDeep`] when groups nest deeper than
    /// `max_depth` or the tree would grow taller than `max_height`.
    pub fn build(&self, query: &str) -> SearchResult<Node> {
        self.build_at(query, 0).map(|built| built.node)
    }

    fn build_at(&self, text: &str, depth: usize) -> SearchResult<Built> {
        if depth > self.config.max_depth {
            return Err(SearchError::TooDeep {
                limit: self.config.max_depth,
            });
        }

        let normalized = normalize(text)?;
        let mut tokens = split_args(&normalized, " ")?;
        if tokens.is_empty() {
            // classified as the empty type
            tokens.push(String::new());
        }

        let flat = tokens
            .iter()
            .map(|token| self.classify(token, depth))
            .collect::<SearchResult<Vec<_>>>()?;

        let (children, height) = unzip(self.fold(flat)?);
        self.built(Node::Root(children), height + 1)
    }

    fn built(&self, node: Node, height: usize) -> SearchResult<Built> {
        if height > self.config.max_height {
            return Err(SearchError::TooDeep {
                limit: self.config.max_height,
            });
        }
        Ok(Built { node, height })
    }

    /// Phase one: classify a token and build everything it contains.
    fn classify(&self, token: &str, depth: usize) -> SearchResult<Pending> {
        let arg_type = ArgType::classify(token, self.config)?;
        log::trace!("token {token:?} classified as {arg_type}");

        let built = match arg_type {
            ArgType::Not => return Ok(Pending::Not),
            ArgType::Logic => {
                let op = LogicOp::parse(token).ok_or_else(|| SearchError::no_type_found(token))?;
                return Ok(Pending::Logic(op));
            }
            ArgType::Empty => self.built(Node::Empty, 1)?,
            ArgType::KeyValue => {
                let (key, op, value) = split_comparison(token, self.config.extended_operators)
                    .ok_or_else(|| SearchError::no_type_found(token))?;
                let key = self.build_at(key, depth + 1)?;
                let value = self.build_at(value, depth + 1)?;
                let height = key.height.max(value.height) + 1;
                let node = Node::KeyValue {
                    op,
                    key: Box::new(key.node),
                    value: Box::new(value.node),
                };
                self.built(node, height)?
            }
            ArgType::BracesFunction => {
                let (function, inner) =
                    match_brace_function(token).ok_or_else(|| SearchError::no_type_found(token))?;
                let args = split_args(inner, ",")?
                    .iter()
                    .map(|arg| self.build_at(arg, depth + 1))
                    .collect::<SearchResult<Vec<_>>>()?;
                function.check_arity(args.len())?;
                let (args, height) = unzip(args);
                self.built(Node::BracesFunction { function, args }, height + 1)?
            }
            ArgType::QuotedText => {
                let text = unquote(token).ok_or_else(|| SearchError::no_type_found(token))?;
                self.built(Node::QuotedText(text.to_string()), 1)?
            }
            ArgType::RawText => self.built(Node::RawText(token.to_string()), 1)?,
            ArgType::Root => return Err(SearchError::no_type_found(token)),
        };

        Ok(Pending::Done(built))
    }

    /// Phase two: fold operators into their operands.
    ///
    /// `NOT` comes before `AND`/`OR` in [`ArgType::ORDER`], so every `NOT` folds
    /// first; `AND`/`OR` then fold leftmost first and associate to the left.
    /// Each operator folds exactly once.
    fn fold(&self, items: Vec<Pending>) -> SearchResult<Vec<Built>> {
        check_not_operands(&items)?;
        let items = self.fold_nots(items)?;
        self.fold_logic(items)
    }

    fn fold_nots(&self, items: Vec<Pending>) -> SearchResult<Vec<Pending>> {
        let mut folded = Vec::with_capacity(items.len());

        // right to left: in a run of NOTs the innermost one claims the operand first
        for item in items.into_iter().rev() {
            if !matches!(item, Pending::Not) {
                folded.push(item);
                continue;
            }
            let Some(Pending::Done(operand)) = folded.pop() else {
                return Err(SearchError::NotAtEnd);
            };
            log::trace!("folding NOT over {}", operand.node.arg_type());
            let not = Node::Not(Box::new(operand.node));
            folded.push(Pending::Done(self.built(not, operand.height + 1)?));
        }

        folded.reverse();
        Ok(folded)
    }

    fn fold_logic(&self, items: Vec<Pending>) -> SearchResult<Vec<Built>> {
        let mut folded: Vec<Built> = Vec::with_capacity(items.len());

        let mut items = items.into_iter();
        while let Some(item) = items.next() {
            let op = match item {
                Pending::Done(built) => {
                    folded.push(built);
                    continue;
                }
                Pending::Logic(op) => op,
                Pending::Not => unreachable!("NOTs are folded before AND/OR"),
            };

            let left = folded.pop();
            let right = match items.next() {
                Some(Pending::Done(right)) => Some(right),
                _ => None,
            };
            let (Some(left), Some(right)) = (left, right) else {
                return Err(SearchError::missing_operand(op.to_string()));
            };

            log::trace!("folding {op} over {} and {}", left.node.arg_type(), right.node.arg_type());
            let height = left.height.max(right.height) + 1;
            let node = Node::Logic {
                op,
                left: Box::new(left.node),
                right: Box::new(right.node),
            };
            folded.push(self.built(node, height)?);
        }

        Ok(folded)
    }
}

/// The leftmost `NOT` without an operand, if any, fails the whole fold.
fn check_not_operands(items: &[Pending]) -> SearchResult<()> {
    for (index, item) in items.iter().enumerate() {
        if !matches!(item, Pending::Not) {
            continue;
        }
        match items.get(index + 1) {
            None => return Err(SearchError::NotAtEnd),
            Some(Pending::Logic(_)) => return Err(SearchError::missing_operand("NOT")),
            Some(_) => {}
        }
    }
    Ok(())
}

/// Nodes and the height of the tallest one.
fn unzip(built: Vec<Built>) -> (Vec<Node>, usize) {
    let height = built.iter().map(|b| b.height).max().unwrap_or(0);
    (built.into_iter().map(|b| b.node).collect(), height)
}
