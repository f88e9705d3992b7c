//! Rule evaluator

use crate::error::{Result, RuleError};
use crate::rule::ast::{Condition, Literal, Node};
use ahash::AHashMap;
use serde_json::{Map, Number, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::hash::BuildHasher;

/// Structured input a rule is evaluated against
pub trait Record {
    /// Look up a top-level field
    fn field(&self, name: &str) -> Option<&Value>;
}

impl Record for Map<String, Value> {
    fn field(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }
}

impl<S: BuildHasher> Record for HashMap<String, Value, S> {
    fn field(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }
}

impl Record for AHashMap<String, Value> {
    fn field(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }
}

/// Only JSON objects have fields; any other value finds nothing
impl Record for Value {
    fn field(&self, name: &str) -> Option<&Value> {
        self.as_object().and_then(|map| map.get(name))
    }
}

impl<R: Record + ?Sized> Record for &R {
    fn field(&self, name: &str) -> Option<&Value> {
        (**self).field(name)
    }
}

/// Evaluate a tree against a record.
///
/// Both children of an operator are always evaluated, left first, and the
/// first error encountered is returned. A missing field or an incomparable
/// value is an error, never a silent `false`.
pub fn evaluate<R: Record + ?Sized>(node: &Node, record: &R) -> Result<bool> {
    match node {
        Node::Operand(cond) => {
            let value = record
                .field(&cond.field)
                .ok_or_else(|| RuleError::FieldNotFound(cond.field.clone()))?;
            cond.evaluate(value)
        }
        Node::Operator { kind, left, right } => {
            let left = evaluate(left, record)?;
            let right = evaluate(right, record)?;
            Ok(kind.apply(left, right))
        }
    }
}

impl Condition {
    /// Apply the comparator to one looked-up value and the literal
    pub fn evaluate(&self, value: &Value) -> Result<bool> {
        let ordering = self.order(value)?;
        Ok(self.comparator.holds(ordering))
    }

    /// How `value` orders against the literal
    fn order(&self, value: &Value) -> Result<Ordering> {
        let ordering = match (value, &self.literal) {
            (Value::Number(n), Literal::Integer(lit)) => Some(order_integer(n, *lit)),
            (Value::Number(n), Literal::Float(lit)) => n.as_f64().and_then(|v| v.partial_cmp(lit)),
            (Value::String(s), Literal::String(lit)) => Some(s.as_str().cmp(lit.as_str())),
            _ => None,
        };

        ordering.ok_or_else(|| RuleError::TypeMismatch {
            field: self.field.clone(),
            comparator: self.comparator,
            expected: self.literal.type_name(),
            found: value_type_name(value),
        })
    }
}

fn order_integer(n: &Number, lit: i64) -> Ordering {
    if let Some(v) = n.as_i64() {
        v.cmp(&lit)
    } else if n.is_u64() {
        // Only reachable above i64::MAX
        Ordering::Greater
    } else {
        let v = n.as_f64().unwrap_or(f64::NAN);
        v.partial_cmp(&(lit as f64)).unwrap_or(Ordering::Less)
    }
}

fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
