use std::collections::BTreeMap;
use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Row key holding the space-joined text of every other value.
pub const RAW_FIELD: &str = "_raw";

/// Result of evaluating a node, and the type of every row value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Number(f64),
    Str(String),
}

impl Value {
    /// Numeric reading of the value. Strings are parsed, booleans never are.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Str(s) => s.trim().parse::<f64>().ok(),
            Value::Bool(_) => None,
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Str(s) => f.write_str(s),
            Value::Number(n) if n.is_nan() => f.write_str("NaN"),
            Value::Number(n) if n.is_infinite() => {
                f.write_str(if *n > 0.0 { "Infinity" } else { "-Infinity" })
            }
            // whole numbers print without a trailing ".0"
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Value::Number(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// A flat record a compiled query is tested against.
///
/// Always carries [`RAW_FIELD`]; when the source data does not supply it, it is
/// derived by joining every other value with spaces, in key order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, Value>", into = "BTreeMap<String, Value>")]
pub struct Row {
    values: BTreeMap<String, Value>,
}

impl Row {
    pub fn new(mut values: BTreeMap<String, Value>) -> Self {
        let raw = match values.remove(RAW_FIELD) {
            Some(raw) => raw.to_string(),
            None => values
                .values()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(" "),
        };
        values.insert(RAW_FIELD.to_string(), Value::Str(raw));
        Self { values }
    }

    /// Build a row with explicitly supplied raw text.
    pub fn with_raw(mut values: BTreeMap<String, Value>, raw: impl Into<String>) -> Self {
        values.insert(RAW_FIELD.to_string(), Value::Str(raw.into()));
        Self { values }
    }

    /// Build a row from a flat JSON object.
    pub fn from_json(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn raw(&self) -> &str {
        match self.values.get(RAW_FIELD) {
            Some(Value::Str(raw)) => raw,
            _ => "",
        }
    }

    /// Field values, excluding the raw text.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values
            .iter()
            .filter(|(k, _)| k.as_str() != RAW_FIELD)
            .map(|(k, v)| (k.as_str(), v))
    }
}

impl From<BTreeMap<String, Value>> for Row {
    fn from(values: BTreeMap<String, Value>) -> Self {
        Row::new(values)
    }
}

impl From<Row> for BTreeMap<String, Value> {
    fn from(row: Row) -> Self {
        row.values
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Row::new(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// A column the caller expects every row to carry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn raw_text_is_derived_in_key_order() {
        let row: Row = [("title", Value::from("Rust")), ("id", Value::from(7i64))]
            .into_iter()
            .collect();
        assert_eq!(row.raw(), "7 Rust");
        assert_eq!(row.get(RAW_FIELD), Some(&Value::from("7 Rust")));
        assert_eq!(row.fields().count(), 2);
    }

    #[test]
    fn explicit_raw_text_wins() {
        let row = Row::with_raw(BTreeMap::from([("a".to_string(), Value::from("x"))]), "custom");
        assert_eq!(row.raw(), "custom");

        let row: Row = [("a", "x"), (RAW_FIELD, "given")].into_iter().collect();
        assert_eq!(row.raw(), "given");
    }

    #[test]
    fn rows_deserialize_from_flat_json() {
        let row = Row::from_json(json!({"name": "Ann", "age": 42, "active": true})).unwrap();
        assert_eq!(row.get("age"), Some(&Value::Number(42.0)));
        assert_eq!(row.get("active"), Some(&Value::Bool(true)));
        assert_eq!(row.raw(), "true 42 Ann");

        let row = Row::from_json(json!({"a": "x", "_raw": "x"})).unwrap();
        assert_eq!(row.raw(), "x");
    }

    #[test]
    fn nested_json_is_rejected() {
        assert!(Row::from_json(json!({"a": {"b": 1}})).is_err());
        assert!(Row::from_json(json!({"a": [1, 2]})).is_err());
        assert!(Row::from_json(json!({"a": null})).is_err());
    }

    #[test]
    fn numbers_display_like_integers_when_whole() {
        assert_eq!(Value::Number(5.0).to_string(), "5");
        assert_eq!(Value::Number(-0.0).to_string(), "0");
        assert_eq!(Value::Number(2.5).to_string(), "2.5");
        assert_eq!(Value::Number(f64::NAN).to_string(), "NaN");
        assert_eq!(Value::Bool(false).to_string(), "false");
    }

    #[test]
    fn numeric_reading() {
        assert_eq!(Value::from(" 12 ").as_number(), Some(12.0));
        assert_eq!(Value::from("abc").as_number(), None);
        assert_eq!(Value::Bool(true).as_number(), None);
    }

    #[test]
    fn field_descriptor_serde() {
        let field: FieldDescriptor = serde_json::from_value(json!({"name": "url"})).unwrap();
        assert_eq!(field, FieldDescriptor::new("url"));
        let json = serde_json::to_value(FieldDescriptor::new("tags").with_description("Tag list")).unwrap();
        assert_eq!(json, json!({"name": "tags", "description": "Tag list"}));
    }
}
