use crate::aggregator::select::filter;
use crate::aggregator::utility::{average, stddev};
use crate::error::KpiResult;

/// Summary of the entities that matched a predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateResult<'a, T> {
    pub subset: Vec<&'a T>,
    pub count: usize,
    pub mean: f64,
    pub stddev: f64,
}

/// Filters `items` with `predicate`, then computes count, mean and population
/// standard deviation of `selector` over the matches.
///
/// # Errors
///
/// Returns [`crate::error::KpiError::EmptyInput`] when nothing matches.
pub fn aggregate<'a, T>(
    items: &'a [T],
    selector: impl Fn(&T) -> f64,
    predicate: impl Fn(&T) -> bool,
) -> KpiResult<AggregateResult<'a, T>> {
    let subset = filter(items, predicate);
    let mean = average(&subset, |e| selector(*e))?;
    let stddev = stddev(&subset, |e| selector(*e))?;

    Ok(AggregateResult {
        count: subset.len(),
        subset,
        mean,
        stddev,
    })
}
