//! Engine configuration
//!
//! Limits applied while compiling and caching rules. Loaded from JSON, or
//! from a Python dict when built with the `python` feature.

use crate::error::{Result, RuleError};
use serde::{Deserialize, Serialize};

/// Default parenthesis nesting limit
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 64;
/// Default rule text length limit in bytes
pub const DEFAULT_MAX_RULE_LENGTH: usize = 64 * 1024;
/// Default number of compiled rules kept by the cache
pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

/// Limits for compiling and caching rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub max_nesting_depth: usize,
    pub max_rule_length: usize,
    pub cache_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
            max_rule_length: DEFAULT_MAX_RULE_LENGTH,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON configuration; missing keys take defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value =
            serde_json::from_str(json).map_err(|e| RuleError::InvalidConfig(e.to_string()))?;
        if !value.is_object() {
            return Err(RuleError::InvalidConfig(
                "configuration must be a JSON object".to_string(),
            ));
        }
        let config: EngineConfig =
            serde_json::from_value(value).map_err(|e| RuleError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_nesting_depth == 0 {
            return Err(RuleError::InvalidConfig(
                "max_nesting_depth must be at least 1".to_string(),
            ));
        }
        if self.max_rule_length == 0 {
            return Err(RuleError::InvalidConfig(
                "max_rule_length must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(feature = "python")]
mod py {
    use super::EngineConfig;
    use crate::error::RuleError;
    use pyo3::types::{PyAnyMethods, PyDict, PyDictMethods};
    use pyo3::Bound;

    /// Helper to get an optional key from either a dict or an object
    fn get_attr_opt<'py>(
        obj: &Bound<'py, pyo3::PyAny>,
        name: &str,
    ) -> Option<Bound<'py, pyo3::PyAny>> {
        if let Ok(dict) = obj.downcast::<PyDict>() {
            dict.get_item(name).ok().flatten()
        } else {
            obj.getattr(name).ok()
        }
    }

    fn extract_limit(obj: &Bound<'_, pyo3::PyAny>, name: &str, default: usize) -> pyo3::PyResult<usize> {
        match get_attr_opt(obj, name) {
            Some(value) if !value.is_none() => value.extract().map_err(|_| {
                RuleError::InvalidConfig(format!("{} must be a non-negative integer", name)).into()
            }),
            _ => Ok(default),
        }
    }

    impl EngineConfig {
        /// Read a configuration from a Python dict or object; missing keys take defaults
        pub fn from_py(obj: &Bound<'_, pyo3::PyAny>) -> pyo3::PyResult<Self> {
            let defaults = EngineConfig::default();
            let config = EngineConfig {
                max_nesting_depth: extract_limit(obj, "max_nesting_depth", defaults.max_nesting_depth)?,
                max_rule_length: extract_limit(obj, "max_rule_length", defaults.max_rule_length)?,
                cache_capacity: extract_limit(obj, "cache_capacity", defaults.cache_capacity)?,
            };
            config.validate()?;
            Ok(config)
        }
    }
}
