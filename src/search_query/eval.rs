use std::cmp::Ordering;

use crate::config::SearchConfig;
use crate::row::{Row, Value};

use super::grammar::{CompareOp, LogicOp};
use super::parser::Node;
use super::wildcard::PatternCache;

/// Evaluates nodes against one row.
pub struct Evaluator<'a> {
    row: &'a Row,
    config: &'a SearchConfig,
    patterns: &'a PatternCache,
}

impl<'a> Evaluator<'a> {
    pub fn new(row: &'a Row, config: &'a SearchConfig, patterns: &'a PatternCache) -> Self {
        Self {
            row,
            config,
            patterns,
        }
    }

    pub fn calc(&self, node: &Node) -> Value {
        match node {
            Node::Root(children) => match children.as_slice() {
                [only] => self.calc(only),
                _ => Value::Bool(children.iter().all(|child| self.calc_to_bool(child))),
            },
            Node::Empty => Value::Str(String::new()),
            Node::Not(inner) => Value::Bool(!self.calc_to_bool(inner)),
            Node::Logic { op, left, right } => Value::Bool(match op {
                LogicOp::And => self.calc_to_bool(left) && self.calc_to_bool(right),
                LogicOp::Or => self.calc_to_bool(left) || self.calc_to_bool(right),
            }),
            Node::KeyValue { op, key, value } => {
                let left = self.operand(key);
                let right = self.calc(value);
                Value::Bool(self.compare(*op, &left, &right))
            }
            Node::BracesFunction { function, args } => {
                let values = args
                    .iter()
                    .map(|arg| {
                        if function.column_args {
                            self.operand(arg)
                        } else {
                            self.calc(arg)
                        }
                    })
                    .collect::<Vec<_>>();
                function.apply(&values)
            }
            Node::QuotedText(text) | Node::RawText(text) => Value::Str(text.clone()),
        }
    }

    /// Value of a node used as an operand: a lone column name stands for the
    /// row's value in that column.
    pub fn operand(&self, node: &Node) -> Value {
        if let Some(value) = node.single_text().and_then(|name| self.row.get(name)) {
            return value.clone();
        }
        self.calc(node)
    }

    pub fn calc_to_bool(&self, node: &Node) -> bool {
        self.truthy(&self.calc(node))
    }

    /// Strings match as floating wildcard patterns against the row's raw text.
    pub fn truthy(&self, value: &Value) -> bool {
        match value {
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(pattern) => self.patterns.is_match(
                &self.config.fold_case(pattern),
                &self.config.fold_case(self.row.raw()),
                true,
            ),
        }
    }

    fn compare(&self, op: CompareOp, left: &Value, right: &Value) -> bool {
        match op {
            CompareOp::Eq => self.pattern_eq(left, right),
            CompareOp::Ne => !self.pattern_eq(left, right),
            CompareOp::Lt => self.order(left, right) == Some(Ordering::Less),
            CompareOp::Gt => self.order(left, right) == Some(Ordering::Greater),
            CompareOp::Le => matches!(self.order(left, right), Some(Ordering::Less | Ordering::Equal)),
            CompareOp::Ge => {
                matches!(self.order(left, right), Some(Ordering::Greater | Ordering::Equal))
            }
        }
    }

    /// The right-hand side is the pattern and must cover the whole left-hand side.
    fn pattern_eq(&self, left: &Value, right: &Value) -> bool {
        self.patterns.is_match(
            &self.config.fold_case(&right.to_string()),
            &self.config.fold_case(&left.to_string()),
            false,
        )
    }

    fn order(&self, left: &Value, right: &Value) -> Option<Ordering> {
        if left.is_number() || right.is_number() {
            if let (Some(l), Some(r)) = (left.as_number(), right.as_number()) {
                return l.partial_cmp(&r);
            }
        }
        let l = self.config.fold_case(&left.to_string());
        let r = self.config.fold_case(&right.to_string());
        Some(l.cmp(&r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search_query::parser::TreeBuilder;

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs.iter().cloned().collect()
    }

    fn calc(query: &str, row: &Row) -> Value {
        let config = SearchConfig::default();
        let tree = TreeBuilder::new(&config).build(query).unwrap();
        Evaluator::new(row, &config, &PatternCache::new()).calc(&tree)
    }

    #[test]
    fn single_child_root_keeps_raw_value() {
        let r = row(&[("a", "x".into())]);
        assert_eq!(calc("hello", &r), Value::from("hello"));
        assert_eq!(calc(r#""two words""#, &r), Value::from("two words"));
        assert_eq!(calc("abs(-4)", &r), Value::Number(4.0));
        assert_eq!(calc("", &r), Value::from(""));
    }

    #[test]
    fn multi_child_root_is_conjunction() {
        let r = row(&[("title", "Rust book".into())]);
        assert_eq!(calc("rust book", &r), Value::Bool(true));
        assert_eq!(calc("rust python", &r), Value::Bool(false));
    }

    #[test]
    fn functions_read_columns() {
        let r = row(&[("delta", Value::Number(-7.0)), ("text", "-3".into())]);
        assert_eq!(calc("abs(delta)", &r), Value::Number(7.0));
        assert_eq!(calc("abs(text)", &r), Value::Number(3.0));
        assert!(matches!(calc("abs(word)", &r), Value::Number(n) if n.is_nan()));
    }

    #[test]
    fn truthiness_of_each_kind() {
        let config = SearchConfig::default();
        let r = row(&[("name", "Hello World".into())]);
        let patterns = PatternCache::new();
        let eval = Evaluator::new(&r, &config, &patterns);
        assert!(eval.truthy(&Value::from("WORLD")));
        assert!(eval.truthy(&Value::from("h*d")));
        assert!(!eval.truthy(&Value::from("planet")));
        assert!(eval.truthy(&Value::Number(-1.0)));
        assert!(!eval.truthy(&Value::Number(0.0)));
        assert!(!eval.truthy(&Value::Number(f64::NAN)));
        assert!(!eval.truthy(&Value::Bool(false)));
    }

    #[test]
    fn case_sensitive_config() {
        let config = SearchConfig {
            case_sensitive: true,
            ..Default::default()
        };
        let r = row(&[("name", "Hello".into())]);
        let patterns = PatternCache::new();
        let eval = Evaluator::new(&r, &config, &patterns);
        assert!(eval.truthy(&Value::from("Hello")));
        assert!(!eval.truthy(&Value::from("hello")));
    }

    #[test]
    fn ordering_prefers_numbers() {
        let r = row(&[("price", Value::Number(25.0)), ("code", "25".into())]);
        assert_eq!(calc("price>10", &r), Value::Bool(true));
        assert_eq!(calc("price<=25", &r), Value::Bool(true));
        // both sides text: lexicographic
        assert_eq!(calc("code>10", &r), Value::Bool(true));
        assert_eq!(calc("code>3", &r), Value::Bool(false));
    }
}
