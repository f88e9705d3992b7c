//! Rule engine module

mod rule;
mod rule_engine;

pub use rule::*;
pub use rule_engine::*;
