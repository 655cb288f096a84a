use actisleep_types::{ActisleepError, Result};
use serde_json::Value;

/// Parameter bag exchanged with configuration collaborators.
pub type Parameters = serde_json::Map<String, Value>;

/// Common surface of every registered algorithm.
pub trait Configurable: Send + Sync {
    /// Human readable name.
    fn name(&self) -> &'static str;

    /// Registry identifier this instance corresponds to.
    fn identifier(&self) -> &'static str;

    fn get_parameters(&self) -> Parameters;

    /// Applies every entry of `params` or none of them.
    fn set_parameters(&mut self, params: &Parameters) -> Result<()>;
}

pub(crate) fn param_f64(algorithm: &str, name: &str, value: &Value) -> Result<f64> {
    value
        .as_f64()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ActisleepError::invalid_parameter(algorithm, name, "expected a finite number"))
}

pub(crate) fn param_positive_f64(algorithm: &str, name: &str, value: &Value) -> Result<f64> {
    let v = param_f64(algorithm, name, value)?;
    if v <= 0.0 {
        return Err(ActisleepError::invalid_parameter(
            algorithm,
            name,
            format!("expected a positive number, got {v}"),
        ));
    }
    Ok(v)
}

pub(crate) fn param_usize(algorithm: &str, name: &str, value: &Value) -> Result<usize> {
    value
        .as_u64()
        .and_then(|v| usize::try_from(v).ok())
        .ok_or_else(|| {
            ActisleepError::invalid_parameter(algorithm, name, "expected a non-negative integer")
        })
}

pub(crate) fn param_positive_usize(algorithm: &str, name: &str, value: &Value) -> Result<usize> {
    let v = param_usize(algorithm, name, value)?;
    if v == 0 {
        return Err(ActisleepError::invalid_parameter(
            algorithm,
            name,
            "expected a positive integer",
        ));
    }
    Ok(v)
}

pub(crate) fn param_bool(algorithm: &str, name: &str, value: &Value) -> Result<bool> {
    value
        .as_bool()
        .ok_or_else(|| ActisleepError::invalid_parameter(algorithm, name, "expected a boolean"))
}
