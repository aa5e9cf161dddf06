//! KPI scoring and aggregation.
//!
//! Pure functions over immutable [`crate::model::Entity`] snapshots: weighted
//! scores from a weight table, means and spreads, filtering, stable ranking,
//! score bands and trend deltas. Nothing here does I/O or logs.

pub mod band;
pub mod score;
pub mod select;
pub mod summary;
pub mod trend;
pub mod utility;

pub use band::ScoreBand;
pub use score::{
    ScoredEntity, WeightedImpact, score_all, validate_weights, weighted_breakdown, weighted_score,
};
pub use select::{FilterSet, Order, Selector, Timeframe, filter, rank};
pub use summary::{AggregateResult, aggregate};
pub use trend::{TrendChange, TrendPoint, trend_change};
pub use utility::{average, stddev};
