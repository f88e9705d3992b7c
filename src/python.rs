//! Python bindings

use crate::config::EngineConfig;
use crate::engine::RuleEngine;
use crate::rule::{self, Node};
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use pyo3::exceptions::{PyRuntimeError, PyTypeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyBool, PyDict, PyList, PyTuple};
use serde_json::{Map, Number, Value};
use std::sync::Arc;

// ============================================================================
// Cached Engine
// ============================================================================

/// Global engine, replaced by `init_config`
static ENGINE: OnceCell<RwLock<Arc<RuleEngine>>> = OnceCell::new();

fn engine() -> Arc<RuleEngine> {
    ENGINE
        .get_or_init(|| RwLock::new(Arc::new(RuleEngine::default())))
        .read()
        .clone()
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Convert a Python dict into a record
fn dict_to_record(dict: &Bound<'_, PyDict>) -> PyResult<Map<String, Value>> {
    let mut record = Map::with_capacity(dict.len());
    for (key, value) in dict.iter() {
        let field: String = key
            .extract()
            .map_err(|_| PyTypeError::new_err("Record keys must be strings"))?;
        record.insert(field, py_to_json(&value)?);
    }
    Ok(record)
}

fn py_to_json(obj: &Bound<'_, PyAny>) -> PyResult<Value> {
    if obj.is_none() {
        return Ok(Value::Null);
    }
    // bool before int: Python bools are ints
    if let Ok(b) = obj.downcast::<PyBool>() {
        return Ok(Value::Bool(b.is_true()));
    }
    if let Ok(i) = obj.extract::<i64>() {
        return Ok(Value::from(i));
    }
    if let Ok(u) = obj.extract::<u64>() {
        return Ok(Value::from(u));
    }
    if let Ok(f) = obj.extract::<f64>() {
        return Number::from_f64(f)
            .map(Value::Number)
            .ok_or_else(|| PyValueError::new_err(format!("Cannot use {} in a record", f)));
    }
    if let Ok(s) = obj.extract::<String>() {
        return Ok(Value::String(s));
    }
    if let Ok(list) = obj.downcast::<PyList>() {
        return list.iter().map(|item| py_to_json(&item)).collect::<PyResult<_>>().map(Value::Array);
    }
    if let Ok(tuple) = obj.downcast::<PyTuple>() {
        return tuple.iter().map(|item| py_to_json(&item)).collect::<PyResult<_>>().map(Value::Array);
    }
    if let Ok(dict) = obj.downcast::<PyDict>() {
        return dict_to_record(dict).map(Value::Object);
    }

    Err(PyTypeError::new_err(format!(
        "Unsupported record value type: {}",
        obj.get_type().name()?
    )))
}

// ============================================================================
// Python Functions
// ============================================================================

/// Configure the shared engine (call once at startup)
///
/// # Arguments
/// * `config` - Optional dict with `max_nesting_depth`, `max_rule_length`
///   and `cache_capacity`; missing keys take defaults
#[pyfunction]
#[pyo3(signature = (config=None))]
fn init_config(config: Option<&Bound<'_, PyAny>>) -> PyResult<()> {
    let config = match config {
        Some(obj) => EngineConfig::from_py(obj)?,
        None => EngineConfig::default(),
    };
    let engine = Arc::new(RuleEngine::new(config)?);

    // If already initialized, swap the engine
    let slot = ENGINE.get_or_init(|| RwLock::new(Arc::clone(&engine)));
    *slot.write() = engine;

    Ok(())
}

/// Check if `init_config` was called
#[pyfunction]
fn is_config_initialized() -> bool {
    ENGINE.get().is_some()
}

/// Split rule text into token strings
#[pyfunction]
fn tokenize(rule: &str) -> PyResult<Vec<String>> {
    Ok(rule::tokenize(rule)?
        .into_iter()
        .map(|token| token.kind.to_string())
        .collect())
}

/// Compile rule text into a JSON expression tree
#[pyfunction]
fn create_rule(rule: &str) -> PyResult<String> {
    Ok(engine().compile(rule)?.to_json()?)
}

/// Combine rule texts into a single JSON expression tree
#[pyfunction]
fn combine_rules(rules: Vec<String>) -> PyResult<String> {
    Ok(engine().combine(&rules)?.to_json()?)
}

/// Evaluate a JSON expression tree against a record
///
/// # Raises
/// KeyError when a field is missing, TypeError on incomparable values
#[pyfunction]
fn evaluate_rule(ast: &str, data: &Bound<'_, PyDict>) -> PyResult<bool> {
    let tree = Node::from_json(ast)?;
    let record = dict_to_record(data)?;
    Ok(rule::evaluate(&tree, &record)?)
}

/// Compile rule text through the engine cache and evaluate it
#[pyfunction]
fn check_rule(rule: &str, data: &Bound<'_, PyDict>) -> PyResult<bool> {
    let record = dict_to_record(data)?;
    Ok(engine().check(rule, &record)?)
}

/// Evaluate a JSON expression tree asynchronously
///
/// The evaluation runs on Tokio's blocking pool so Python's event loop
/// stays responsive.
///
/// # Example (Python)
/// ```python
/// ok = await evaluate_async(create_rule("age > 30"), {"age": 35})
/// ```
#[pyfunction]
fn evaluate_async<'py>(
    py: Python<'py>,
    ast: &str,
    data: &Bound<'py, PyDict>,
) -> PyResult<Bound<'py, PyAny>> {
    // Convert before entering the async context
    let tree = Node::from_json(ast)?;
    let record = dict_to_record(data)?;

    pyo3_async_runtimes::tokio::future_into_py(py, async move {
        let result = tokio::task::spawn_blocking(move || rule::evaluate(&tree, &record))
            .await
            .map_err(|e| PyRuntimeError::new_err(format!("Evaluation task panicked: {}", e)))??;
        Ok(result)
    })
}

// ============================================================================
// Python Module Definition
// ============================================================================

#[pymodule]
fn rule_ast_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(init_config, m)?)?;
    m.add_function(wrap_pyfunction!(is_config_initialized, m)?)?;
    m.add_function(wrap_pyfunction!(tokenize, m)?)?;
    m.add_function(wrap_pyfunction!(create_rule, m)?)?;
    m.add_function(wrap_pyfunction!(combine_rules, m)?)?;
    m.add_function(wrap_pyfunction!(evaluate_rule, m)?)?;
    m.add_function(wrap_pyfunction!(check_rule, m)?)?;
    m.add_function(wrap_pyfunction!(evaluate_async, m)?)?;
    Ok(())
}
