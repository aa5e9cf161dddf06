use crate::error::{KpiError, KpiResult};

/// Computes the arithmetic mean of `selector` over `items`.
///
/// # Errors
///
/// Returns [`KpiError::EmptyInput`] when `items` is empty.
pub fn average<T>(items: &[T], selector: impl Fn(&T) -> f64) -> KpiResult<f64> {
    if items.is_empty() {
        return Err(KpiError::EmptyInput);
    }
    Ok(items.iter().map(selector).sum::<f64>() / items.len() as f64)
}

/// Computes the population standard deviation of `selector` over `items`.
///
/// # Errors
///
/// Returns [`KpiError::EmptyInput`] when `items` is empty.
pub fn stddev<T>(items: &[T], selector: impl Fn(&T) -> f64) -> KpiResult<f64> {
    let mean = average(items, &selector)?;
    let variance = items
        .iter()
        .map(|item| (selector(item) - mean).powi(2))
        .sum::<f64>()
        / items.len() as f64;

    Ok(variance.sqrt())
}
