//! Rule expression compiling and evaluation module
//!
//! This module turns rule strings like "age > 30 AND department = 'Sales'"
//! into expression trees and evaluates them against records.

mod ast;
pub mod cache;
pub mod combiner;
mod evaluator;
pub mod parser;
pub mod token;
pub mod wire;


pub use ast::*;
pub use cache::*;
pub use combiner::*;
pub use evaluator::*;
pub use parser::*;
pub use token::*;
