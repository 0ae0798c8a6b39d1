//! SUM, AVERAGE, MIN and MAX

use crate::error::{FormulaError, FormulaResult};

/// SUM function; empty input is 0
pub fn fn_sum(values: &[f64]) -> FormulaResult<f64> {
    Ok(values.iter().sum())
}

/// AVERAGE function; empty input is 0, not an error
pub fn fn_average(values: &[f64]) -> FormulaResult<f64> {
    if values.is_empty() {
        return Ok(0.0);
    }
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// MIN function; empty input is [`FormulaError::EmptyRange`]
pub fn fn_min(values: &[f64]) -> FormulaResult<f64> {
    values
        .iter()
        .copied()
        .reduce(f64::min)
        .ok_or(FormulaError::EmptyRange("MIN"))
}

/// MAX function; empty input is [`FormulaError::EmptyRange`]
pub fn fn_max(values: &[f64]) -> FormulaResult<f64> {
    values
        .iter()
        .copied()
        .reduce(f64::max)
        .ok_or(FormulaError::EmptyRange("MAX"))
}
