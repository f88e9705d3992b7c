//! Rule AST Core - rule expression compiler and evaluator
//!
//! Compiles textual rules such as `"age > 30 AND department = 'Sales'"` into
//! binary expression trees, evaluates them against JSON-like records and
//! merges several rules into one tree.
//!
//! ```
//! use rule_ast_core::{compile, evaluate};
//! use serde_json::json;
//!
//! let rule = compile("age > 30 AND department = 'Sales'").unwrap();
//! assert!(evaluate(&rule, &json!({"age": 35, "department": "Sales"})).unwrap());
//! assert!(!evaluate(&rule, &json!({"age": 20, "department": "Sales"})).unwrap());
//! ```
//!
//! With the `python` feature the crate also builds as a Python extension
//! module exposing the same operations.

pub mod config;
pub mod engine;
pub mod error;
pub mod rule;

#[cfg(feature = "python")]
mod python;

pub use config::EngineConfig;
pub use engine::{Rule, RuleEngine};
pub use error::{Result, RuleError};
pub use rule::{
    combine, compile, dominant_combinator, evaluate, parse, tokenize, Combinator, Comparator,
    Condition, Literal, Node, Record, Token, TokenKind,
};
