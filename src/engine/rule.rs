//! Named compiled rule

use crate::error::{Result, RuleError};
use crate::rule::{self, wire, Node, Record};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A compiled rule tree with an optional display name.
///
/// Storage keys and lifecycle belong to the caller; this is only the value
/// that gets stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub ast: Node,
}

impl Rule {
    pub fn new(name: Option<String>, ast: Node) -> Self {
        Self { name, ast }
    }

    /// Compile rule text into a named rule
    pub fn compile(name: impl Into<String>, text: &str) -> Result<Self> {
        Ok(Self {
            name: Some(name.into()),
            ast: rule::compile(text)?,
        })
    }

    /// Combine several rule texts into one named rule
    pub fn combine<S: AsRef<str>>(name: impl Into<String>, rules: &[S]) -> Result<Self> {
        Ok(Self {
            name: Some(name.into()),
            ast: rule::combine(rules)?,
        })
    }

    pub fn evaluate<R: Record + ?Sized>(&self, record: &R) -> Result<bool> {
        rule::evaluate(&self.ast, record)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| RuleError::DeserializationError(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        wire::from_json_str(json)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}: {}", name, self.ast),
            None => write!(f, "{}", self.ast),
        }
    }
}
