use crate::error::{KpiError, KpiResult};
use crate::model::{Entity, Metrics, WeightEntry, WeightTable};
use serde::Serialize;
use std::collections::HashSet;

/// Weights of a scheme must total this many percent.
pub const WEIGHT_TOTAL: f64 = 100.0;

/// Drift of the weight total from [`WEIGHT_TOTAL`] at which a scheme is rejected.
pub const WEIGHT_TOLERANCE: f64 = 0.01;

// Summing hundredths in f64 lands either side of the tolerance edge
// (49.99 + 50.0 == 99.99000000000001), so the edge itself is widened by this.
const SUM_ROUNDING: f64 = 1e-9;

/// Contribution of a single metric to a weighted score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightedImpact {
    pub metric: String,
    pub weight: f64,
    pub value: f64,
    pub impact: f64,
}

/// An entity paired with its weighted score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredEntity<'a> {
    pub entity: &'a Entity,
    pub score: f64,
}

/// Checks a weighting scheme on its own, without any metrics.
///
/// Rejects empty tables, non-finite or negative weights, metrics listed
/// twice, and totals [`WEIGHT_TOLERANCE`] or more away from 100.
pub fn validate_weights(weights: &[WeightEntry]) -> KpiResult<()> {
    if weights.is_empty() {
        return Err(KpiError::EmptyWeights);
    }

    let mut seen = HashSet::new();
    for entry in weights {
        if !entry.weight.is_finite() {
            return Err(KpiError::NonFiniteWeight(entry.metric.clone()));
        }
        if entry.weight < 0.0 {
            return Err(KpiError::NegativeWeight {
                metric: entry.metric.clone(),
                weight: entry.weight,
            });
        }
        if !seen.insert(entry.metric.as_str()) {
            return Err(KpiError::DuplicateMetric(entry.metric.clone()));
        }
    }

    let total = weight_total(weights);
    if (total - WEIGHT_TOTAL).abs() >= WEIGHT_TOLERANCE - SUM_ROUNDING {
        return Err(KpiError::WeightSum(total));
    }

    Ok(())
}

fn weight_total(weights: &[WeightEntry]) -> f64 {
    weights.iter().map(|e| e.weight).sum()
}

impl WeightTable {
    pub fn total(&self) -> f64 {
        weight_total(self.entries())
    }

    pub fn validate(&self) -> KpiResult<()> {
        validate_weights(self.entries())
    }
}

/// Per-metric weighted impact (`value * weight / 100`), in weight-table order.
pub fn weighted_breakdown(
    metrics: &Metrics,
    weights: &[WeightEntry],
) -> KpiResult<Vec<WeightedImpact>> {
    validate_weights(weights)?;

    weights
        .iter()
        .map(|entry| -> KpiResult<WeightedImpact> {
            let value = *metrics
                .get(&entry.metric)
                .ok_or_else(|| KpiError::UnknownMetric(entry.metric.clone()))?;

            Ok(WeightedImpact {
                metric: entry.metric.clone(),
                weight: entry.weight,
                value,
                impact: value * entry.weight / WEIGHT_TOTAL,
            })
        })
        .collect()
}

/// Weighted score of one set of metrics. Values are not clamped.
pub fn weighted_score(metrics: &Metrics, weights: &[WeightEntry]) -> KpiResult<f64> {
    Ok(weighted_breakdown(metrics, weights)?
        .iter()
        .map(|row| row.impact)
        .sum())
}

/// Scores every entity, stopping at the first one the weights cannot be applied to.
pub fn score_all<'a>(
    entities: &'a [Entity],
    weights: &[WeightEntry],
) -> KpiResult<Vec<ScoredEntity<'a>>> {
    entities
        .iter()
        .map(|entity| -> KpiResult<ScoredEntity<'a>> {
            Ok(ScoredEntity {
                entity,
                score: weighted_score(entity.metrics(), weights)?,
            })
        })
        .collect()
}
