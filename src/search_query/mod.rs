mod errors;
mod eval;
mod grammar;
mod lexer;
mod normalize;
mod parser;
mod wildcard;

use std::sync::Arc;

use rayon::prelude::*;

use crate::config::SearchConfig;
use crate::row::{FieldDescriptor, Row};

pub use errors::{SearchError, SearchResult};
pub use eval::Evaluator;
pub use grammar::{brace_function, ArgType, BraceFunction, CompareOp, LogicOp};
pub use lexer::{get_parenthesis_end, get_quote_end, split_args};
pub use normalize::normalize;
pub use parser::{Node, TreeBuilder};
pub use wildcard::{wildcard_match_str, PatternCache};

/// A compiled search query.
///
/// Building never leaves a partial tree behind: it either yields a parser or one
/// of the [`SearchError`] build errors. The tree is immutable afterwards, so one
/// parser can test any number of rows, from any number of threads.
#[derive(Clone, Debug)]
pub struct SearchParser {
    query: String,
    fields: Vec<FieldDescriptor>,
    config: SearchConfig,
    root: Node,
    patterns: Arc<PatternCache>,
}

impl SearchParser {
    /// Compile `query` with the default [`SearchConfig`].
    ///
    /// Fails on:
    /// - unclosed quotes or unbalanced parentheses
    /// - groups nested deeper than `max_depth`, or a tree (long `AND`/`OR`/`NOT`
    ///   chains included) taller than `max_height`
    /// - a function called with the wrong number of arguments
    /// - `NOT` without an operand, `AND`/`OR` without two
    pub fn build(query: &str, fields: &[FieldDescriptor]) -> SearchResult<Self> {
        Self::build_with(query, fields, &SearchConfig::default())
    }

    pub fn build_with(
        query: &str,
        fields: &[FieldDescriptor],
        config: &SearchConfig,
    ) -> SearchResult<Self> {
        let root = TreeBuilder::new(config).build(query)?;
        log::debug!("search tree built query={query:?} tree={root}");

        Ok(Self {
            query: query.to_string(),
            fields: fields.to_vec(),
            config: config.clone(),
            root,
            patterns: Arc::new(PatternCache::new()),
        })
    }

    pub fn print(&self) -> String {
        self.root.print()
    }

    /// Whether `row` matches the query.
    ///
    /// Every declared field must be present in the row. Bare words are not
    /// checked against the declared fields; they are looked up in the row as is.
    pub fn test(&self, row: &Row) -> SearchResult<bool> {
        if let Some(missing) = self.fields.iter().find(|f| !row.contains_key(&f.name)) {
            return Err(SearchError::missing_field(&missing.name));
        }

        let matched = Evaluator::new(row, &self.config, &self.patterns).calc_to_bool(&self.root);
        log::trace!("query={:?} raw={:?} matched={matched}", self.query, row.raw());
        Ok(matched)
    }

    /// Matching rows, in input order. Rows are tested in parallel.
    pub fn filter<'a>(&self, rows: &'a [Row]) -> SearchResult<Vec<&'a Row>> {
        rows.par_iter()
            .filter_map(|row| match self.test(row) {
                Ok(true) => Some(Ok(row)),
                Ok(false) => None,
                Err(e) => Some(Err(e)),
            })
            .collect()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn root(&self) -> &Node {
        &self.root
    }
}

/// Convenience: build + test in one call.
pub fn matches(query: &str, row: &Row) -> SearchResult<bool> {
    SearchParser::build(query, &[])?.test(row)
}
