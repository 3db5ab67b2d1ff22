//! Filter language shared by every store implementation.
//!
//! Public query objects use the operator syntax the catalog front-end has
//! always sent (`{"full_name": {"$regex": "eros", "$options": "i"}}`), so
//! [`Filter::from_query`] accepts that shape and nothing else.

use std::cmp::Ordering;

use asterank_common::Document;
use regex::{Regex, RegexBuilder};
use serde_json::Value;

#[derive(Debug, Clone)]
pub enum Condition {
    Eq(Value),
    Ne(Value),
    Gt(Value),
    Gte(Value),
    Lt(Value),
    Lte(Value),
    Exists(bool),
    Regex(Regex),
}

impl Condition {
    fn matches(&self, value: Option<&Value>) -> bool {
        match self {
            Condition::Eq(expected) => equals(value, expected),
            Condition::Ne(expected) => !equals(value, expected),
            Condition::Gt(bound) => comparable(value, bound) == Some(Ordering::Greater),
            Condition::Gte(bound) => matches!(
                comparable(value, bound),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Condition::Lt(bound) => comparable(value, bound) == Some(Ordering::Less),
            Condition::Lte(bound) => matches!(
                comparable(value, bound),
                Some(Ordering::Less | Ordering::Equal)
            ),
            Condition::Exists(expected) => value.is_some() == *expected,
            Condition::Regex(regex) => match value {
                Some(Value::String(s)) => regex.is_match(s),
                Some(Value::Array(items)) => items
                    .iter()
                    .any(|item| item.as_str().is_some_and(|s| regex.is_match(s))),
                _ => false,
            },
        }
    }
}

/// Conjunction of per-field conditions
#[derive(Debug, Clone, Default)]
pub struct Filter {
    clauses: Vec<(String, Condition)>,
}

impl Filter {
    /// Matches every document
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: impl Into<String>, condition: Condition) -> Self {
        self.clauses.push((field.into(), condition));
        self
    }

    pub fn eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(field, Condition::Eq(value.into()))
    }

    pub fn matches(&self, document: &Document) -> bool {
        self.clauses
            .iter()
            .all(|(field, condition)| condition.matches(lookup_path(document, field)))
    }

    /// Parse a public query object.
    pub fn from_query(query: &Value) -> Result<Self, String> {
        let Value::Object(fields) = query else {
            return Err(format!("Query must be an object, got {}", query));
        };

        let mut filter = Filter::new();
        for (field, spec) in fields {
            if field.starts_with('$') {
                return Err(format!("Unsupported top-level operator: {}", field));
            }
            match spec {
                Value::Object(ops) if ops.keys().any(|k| k.starts_with('$')) => {
                    for condition in parse_operators(field, ops)? {
                        filter = filter.with(field.clone(), condition);
                    }
                }
                literal => filter = filter.eq(field.clone(), literal.clone()),
            }
        }
        Ok(filter)
    }
}

fn parse_operators(
    field: &str,
    ops: &serde_json::Map<String, Value>,
) -> Result<Vec<Condition>, String> {
    let mut conditions = Vec::new();
    let case_insensitive = match ops.get("$options") {
        None => false,
        Some(Value::String(options)) => options.contains('i'),
        Some(other) => return Err(format!("$options on {} must be a string, got {}", field, other)),
    };

    for (op, arg) in ops {
        let condition = match op.as_str() {
            "$options" => continue,
            "$regex" => {
                let pattern = arg
                    .as_str()
                    .ok_or_else(|| format!("$regex on {} must be a string", field))?;
                let regex = RegexBuilder::new(pattern)
                    .case_insensitive(case_insensitive)
                    .build()
                    .map_err(|e| format!("Invalid $regex on {}: {}", field, e))?;
                Condition::Regex(regex)
            }
            "$exists" => {
                let expected = match arg {
                    Value::Bool(b) => *b,
                    Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
                    _ => return Err(format!("$exists on {} must be a boolean", field)),
                };
                Condition::Exists(expected)
            }
            "$ne" => Condition::Ne(arg.clone()),
            "$gt" => Condition::Gt(arg.clone()),
            "$gte" => Condition::Gte(arg.clone()),
            "$lt" => Condition::Lt(arg.clone()),
            "$lte" => Condition::Lte(arg.clone()),
            other => return Err(format!("Unsupported operator {} on {}", other, field)),
        };
        conditions.push(condition);
    }

    if ops.contains_key("$options") && !ops.contains_key("$regex") {
        return Err(format!("$options on {} without $regex", field));
    }
    Ok(conditions)
}

/// Resolve a dotted path (`"Next Pass.date_iso"`) inside a document.
pub fn lookup_path<'a>(document: &'a Document, path: &str) -> Option<&'a Value> {
    if let Some(value) = document.get(path) {
        return Some(value);
    }
    let mut parts = path.split('.');
    let mut current = document.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

fn equals(value: Option<&Value>, expected: &Value) -> bool {
    match (value, expected) {
        (None, Value::Null) => true,
        (None, _) => false,
        (Some(Value::Array(items)), expected) if !expected.is_array() => {
            items.iter().any(|item| scalar_equals(item, expected))
        }
        (Some(actual), expected) => scalar_equals(actual, expected),
    }
}

fn scalar_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

/// Range comparisons only apply between values of the same kind.
fn comparable(value: Option<&Value>, bound: &Value) -> Option<Ordering> {
    let value = value?;
    if type_rank(Some(value)) != type_rank(Some(bound)) || value.is_null() {
        return None;
    }
    Some(compare_values(Some(value), Some(bound)))
}

fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Number(_)) => 1,
        Some(Value::String(_)) => 2,
        Some(Value::Object(_)) => 3,
        Some(Value::Array(_)) => 4,
        Some(Value::Bool(_)) => 5,
    }
}

/// Total order used for sorting: missing and null first, then numbers,
/// strings, objects, arrays and booleans.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let rank = type_rank(a).cmp(&type_rank(b));
    if rank != Ordering::Equal {
        return rank;
    }
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Array(x)), Some(Value::Array(y))) => x
            .iter()
            .zip(y.iter())
            .map(|(l, r)| compare_values(Some(l), Some(r)))
            .find(|o| *o != Ordering::Equal)
            .unwrap_or_else(|| x.len().cmp(&y.len())),
        _ => Ordering::Equal,
    }
}
