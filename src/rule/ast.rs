//! Abstract Syntax Tree for rule expressions

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Node of a compiled rule expression
///
/// Each node exclusively owns its children. Trees cross process and storage
/// boundaries in the `{node_type, left, right, value}` exchange format, see
/// [`crate::rule::wire`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "crate::rule::wire::WireNode", try_from = "crate::rule::wire::WireNode")]
pub enum Node {
    /// Leaf comparison like "age > 30"
    Operand(Condition),
    /// AND / OR over two subtrees
    Operator {
        kind: Combinator,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    /// Create an operand leaf
    pub fn operand(condition: Condition) -> Self {
        Node::Operand(condition)
    }

    /// Join two subtrees under a new operator node
    pub fn operator(kind: Combinator, left: Node, right: Node) -> Self {
        Node::Operator {
            kind,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Number of operand (condition) leaves
    pub fn operand_count(&self) -> usize {
        match self {
            Node::Operand(_) => 1,
            Node::Operator { left, right, .. } => left.operand_count() + right.operand_count(),
        }
    }

    /// Number of operator (AND/OR) nodes
    pub fn operator_count(&self) -> usize {
        match self {
            Node::Operand(_) => 0,
            Node::Operator { left, right, .. } => {
                1 + left.operator_count() + right.operator_count()
            }
        }
    }

    /// Height of the tree, a single leaf being 1
    pub fn depth(&self) -> usize {
        match self {
            Node::Operand(_) => 1,
            Node::Operator { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    /// Conditions in left-to-right order
    pub fn conditions(&self) -> Vec<&Condition> {
        let mut out = Vec::with_capacity(self.operand_count());
        self.collect_conditions(&mut out);
        out
    }

    fn collect_conditions<'a>(&'a self, out: &mut Vec<&'a Condition>) {
        match self {
            Node::Operand(cond) => out.push(cond),
            Node::Operator { left, right, .. } => {
                left.collect_conditions(out);
                right.collect_conditions(out);
            }
        }
    }
}

/// Renders rule text that compiles back to the same tree. Operator nodes are
/// always parenthesized.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Operand(cond) => write!(f, "{}", cond),
            Node::Operator { kind, left, right } => write!(f, "({} {} {})", left, kind, right),
        }
    }
}

/// Single comparison of a record field against a literal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub field: String,
    pub comparator: Comparator,
    pub literal: Literal,
}

impl Condition {
    pub fn new(field: impl Into<String>, comparator: Comparator, literal: Literal) -> Self {
        Self {
            field: field.into(),
            comparator,
            literal,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.field, self.comparator.symbol(), self.literal)
    }
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparator {
    /// Greater than (>)
    Gt,
    /// Less than (<)
    Lt,
    /// Equal (=)
    Eq,
    /// Less than or equal (<=)
    Lteq,
    /// Greater than or equal (>=, also written =>)
    Gteq,
    /// Not equal (!=)
    Neq,
}

impl Comparator {
    /// Map an operator symbol to its comparator
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            ">" => Some(Comparator::Gt),
            "<" => Some(Comparator::Lt),
            "=" => Some(Comparator::Eq),
            "<=" => Some(Comparator::Lteq),
            ">=" | "=>" => Some(Comparator::Gteq),
            "!=" => Some(Comparator::Neq),
            _ => None,
        }
    }

    /// Canonical symbol used when rendering rule text
    pub fn symbol(self) -> &'static str {
        match self {
            Comparator::Gt => ">",
            Comparator::Lt => "<",
            Comparator::Eq => "=",
            Comparator::Lteq => "<=",
            Comparator::Gteq => ">=",
            Comparator::Neq => "!=",
        }
    }

    /// Whether `value <op> literal` holds given how the value orders
    /// against the literal
    #[inline]
    pub fn holds(self, ordering: Ordering) -> bool {
        match self {
            Comparator::Gt => ordering == Ordering::Greater,
            Comparator::Lt => ordering == Ordering::Less,
            Comparator::Eq => ordering == Ordering::Equal,
            Comparator::Lteq => ordering != Ordering::Greater,
            Comparator::Gteq => ordering != Ordering::Less,
            Comparator::Neq => ordering != Ordering::Equal,
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Comparator::Gt => "gt",
            Comparator::Lt => "lt",
            Comparator::Eq => "eq",
            Comparator::Lteq => "lteq",
            Comparator::Gteq => "gteq",
            Comparator::Neq => "neq",
        };
        f.write_str(s)
    }
}

/// Logical combinator joining two sub-results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Combinator {
    And,
    Or,
}

impl Combinator {
    /// Combine two already evaluated sub-results
    #[inline]
    pub fn apply(self, left: bool, right: bool) -> bool {
        match self {
            Combinator::And => left && right,
            Combinator::Or => left || right,
        }
    }
}

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Combinator::And => f.write_str("AND"),
            Combinator::Or => f.write_str("OR"),
        }
    }
}

/// Literal on the right-hand side of a condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Integer(i64),
    Float(f64),
    String(String),
}

impl Literal {
    /// Infer the literal type of a literal token's text.
    ///
    /// Quoted text is always a string with its quotes stripped. Bare digits
    /// (with an optional leading `-`) are an integer, digits with exactly one
    /// decimal point a float, anything else a string.
    pub fn infer(text: &str) -> Self {
        if let Some(inner) = strip_quotes(text) {
            return Literal::String(inner.to_string());
        }

        let digits = text.strip_prefix('-').unwrap_or(text);
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            return match text.parse::<i64>() {
                Ok(i) => Literal::Integer(i),
                // Too wide for i64, keep it numeric
                Err(_) => text
                    .parse::<f64>()
                    .map(Literal::Float)
                    .unwrap_or_else(|_| Literal::String(text.to_string())),
            };
        }

        if digits.bytes().filter(|&b| b == b'.').count() == 1
            && digits.bytes().any(|b| b.is_ascii_digit())
            && digits.bytes().all(|b| b == b'.' || b.is_ascii_digit())
        {
            if let Ok(f) = text.parse::<f64>() {
                return Literal::Float(f);
            }
        }

        Literal::String(text.to_string())
    }

    /// Name of the literal's type, used in diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Literal::Integer(_) | Literal::Float(_) => "number",
            Literal::String(_) => "string",
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Integer(i) => write!(f, "{}", i),
            // Keep a decimal point so the text re-infers as a float
            Literal::Float(v) if v.fract() == 0.0 => write!(f, "{}.0", v),
            Literal::Float(v) => write!(f, "{}", v),
            Literal::String(s) if s.contains('\'') => write!(f, "\"{}\"", s),
            Literal::String(s) => write!(f, "'{}'", s),
        }
    }
}

fn strip_quotes(text: &str) -> Option<&str> {
    ['\'', '"'].into_iter().find_map(|q| {
        text.strip_prefix(q)
            .and_then(|rest| rest.strip_suffix(q))
            .filter(|_| text.len() >= 2)
    })
}
