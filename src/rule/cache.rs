//! Compiled rule cache with fast hashing

use crate::config::EngineConfig;
use crate::error::Result;
use crate::rule::ast::Node;
use crate::rule::parser;
use ahash::AHashMap;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{trace, warn};

/// Rule text → compiled tree, shared between evaluations
///
/// Once `capacity` entries are held, further rules still compile but are
/// not admitted. A capacity of zero disables caching.
#[derive(Debug)]
pub struct RuleCache {
    capacity: usize,
    entries: RwLock<AHashMap<String, Arc<Node>>>,
}

impl RuleCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: RwLock::new(AHashMap::with_capacity(capacity.min(2048))),
        }
    }

    /// Get or compile a rule, caching the compiled tree
    #[inline]
    pub fn get_or_compile(&self, text: &str, config: &EngineConfig) -> Result<Arc<Node>> {
        // Fast path: read lock only
        {
            let entries = self.entries.read();
            if let Some(node) = entries.get(text) {
                trace!(rule = text, "rule cache hit");
                return Ok(Arc::clone(node));
            }
        }

        // Slow path: compile outside the lock, then cache
        trace!(rule = text, "rule cache miss");
        let node = Arc::new(parser::compile_with(text, config)?);

        if self.capacity > 0 {
            let mut entries = self.entries.write();
            if entries.len() < self.capacity {
                entries
                    .entry(text.to_string())
                    .or_insert_with(|| Arc::clone(&node));
            } else if !entries.contains_key(text) {
                warn!(capacity = self.capacity, "rule cache full, not caching rule");
            }
        }

        Ok(node)
    }

    /// Drop every cached rule
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Number of cached rules
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_hit() {
        let cache = RuleCache::new(16);
        let config = EngineConfig::default();

        let first = cache.get_or_compile("age > 30", &config).unwrap();
        assert_eq!(cache.len(), 1);

        let second = cache.get_or_compile("age > 30", &config).unwrap();
        assert_eq!(cache.len(), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_errors_are_not_cached() {
        let cache = RuleCache::new(16);
        let config = EngineConfig::default();

        assert!(cache.get_or_compile("age >", &config).is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_capacity_limit() {
        let cache = RuleCache::new(2);
        let config = EngineConfig::default();

        for rule in ["a > 1", "b > 1", "c > 1"] {
            assert!(cache.get_or_compile(rule, &config).is_ok());
        }
        assert_eq!(cache.len(), 2);

        // Known entries keep being served from the cache
        let a1 = cache.get_or_compile("a > 1", &config).unwrap();
        let a2 = cache.get_or_compile("a > 1", &config).unwrap();
        assert!(Arc::ptr_eq(&a1, &a2));
    }

    #[test]
    fn test_zero_capacity_disables_cache() {
        let cache = RuleCache::new(0);
        let config = EngineConfig::default();

        assert!(cache.get_or_compile("a > 1", &config).is_ok());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear() {
        let cache = RuleCache::new(4);
        let config = EngineConfig::default();

        cache.get_or_compile("a > 1", &config).unwrap();
        cache.clear();
        assert!(cache.is_empty());
    }
}
