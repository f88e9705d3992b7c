//! Configured rule engine

use crate::config::EngineConfig;
use crate::error::Result;
use crate::rule::{self, Node, Record, RuleCache};
use std::sync::Arc;
use tracing::debug;

/// Compiles, caches, combines and evaluates rules under one configuration
#[derive(Debug)]
pub struct RuleEngine {
    config: EngineConfig,
    cache: RuleCache,
}

impl RuleEngine {
    /// Create an engine, rejecting invalid configurations
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        debug!(
            max_nesting_depth = config.max_nesting_depth,
            max_rule_length = config.max_rule_length,
            cache_capacity = config.cache_capacity,
            "rule engine configured"
        );
        Ok(Self {
            cache: RuleCache::new(config.cache_capacity),
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn cache(&self) -> &RuleCache {
        &self.cache
    }

    /// Compile rule text without touching the cache
    pub fn compile(&self, text: &str) -> Result<Node> {
        rule::compile_with(text, &self.config)
    }

    /// Compile rule text through the cache
    pub fn compile_cached(&self, text: &str) -> Result<Arc<Node>> {
        self.cache.get_or_compile(text, &self.config)
    }

    /// Combine rule texts into one tree
    pub fn combine<S: AsRef<str>>(&self, rules: &[S]) -> Result<Node> {
        rule::combine_with(rules, &self.config)
    }

    /// Evaluate a compiled tree against a record
    pub fn evaluate<R: Record + ?Sized>(&self, node: &Node, record: &R) -> Result<bool> {
        rule::evaluate(node, record)
    }

    /// Compile (cached) and evaluate rule text in one step
    pub fn check<R: Record + ?Sized>(&self, text: &str, record: &R) -> Result<bool> {
        let node = self.compile_cached(text)?;
        rule::evaluate(&node, record)
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        let config = EngineConfig::default();
        Self {
            cache: RuleCache::new(config.cache_capacity),
            config,
        }
    }
}
