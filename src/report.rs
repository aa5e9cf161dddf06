//! Serializable report shapes written by the CLI.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::aggregator::{
    AggregateResult, FilterSet, Order, ScoreBand, ScoredEntity, Selector, Timeframe,
    WeightedImpact,
};
use crate::model::HierarchyLevel;

/// One scored entity, appended as a CSV row by the `score` command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreRecord {
    pub timestamp: DateTime<Utc>,
    pub entity_id: String,
    pub entity_name: String,
    pub level: Option<HierarchyLevel>,
    pub region: Option<String>,
    pub beat: Option<String>,
    pub score: f64,
    pub band: ScoreBand,
}

impl ScoreRecord {
    pub fn new(scored: &ScoredEntity<'_>, timestamp: DateTime<Utc>) -> Self {
        let entity = scored.entity;
        ScoreRecord {
            timestamp,
            entity_id: entity.id().to_string(),
            entity_name: entity.name().to_string(),
            level: entity.level(),
            region: entity.region().map(str::to_string),
            beat: entity.beat().map(str::to_string),
            score: scored.score,
            band: ScoreBand::of(scored.score),
        }
    }
}

/// Filter selections echoed back in a summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AppliedFilters {
    pub region: Option<String>,
    pub beat: Option<String>,
    pub level: Option<HierarchyLevel>,
    pub band: Option<ScoreBand>,
    pub min_score: Option<f64>,
    pub timeframe: Option<Timeframe>,
    pub as_of: Option<NaiveDate>,
}

impl From<&FilterSet> for AppliedFilters {
    fn from(filters: &FilterSet) -> Self {
        AppliedFilters {
            region: filters.region.clone(),
            beat: filters.beat.clone(),
            level: filters.level,
            band: filters.band,
            min_score: filters.min_score,
            timeframe: filters.visited.map(|(t, _)| t),
            as_of: filters.visited.map(|(_, d)| d),
        }
    }
}

/// A single entity line inside a summary or ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityLine {
    pub position: usize,
    pub id: String,
    pub name: String,
    pub value: Option<f64>,
    pub score: f64,
    pub band: ScoreBand,
}

impl EntityLine {
    fn new(position: usize, scored: &ScoredEntity<'_>, selector: &Selector) -> Self {
        EntityLine {
            position,
            id: scored.entity.id().to_string(),
            name: scored.entity.name().to_string(),
            value: selector.value(scored),
            score: scored.score,
            band: ScoreBand::of(scored.score),
        }
    }
}

/// Count, mean and spread of a filtered set, as shown on the summary cards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryReport {
    pub schema_version: u8,
    pub generated_at: DateTime<Utc>,
    pub selector: String,
    pub filters: AppliedFilters,
    pub count: usize,
    pub mean: f64,
    pub stddev: f64,
    pub band: ScoreBand,
    pub entities: Vec<EntityLine>,
}

impl SummaryReport {
    pub fn new(
        selector: &Selector,
        filters: &FilterSet,
        result: &AggregateResult<'_, ScoredEntity<'_>>,
    ) -> Self {
        SummaryReport {
            schema_version: 1,
            generated_at: Utc::now(),
            selector: selector.name().to_string(),
            filters: filters.into(),
            count: result.count,
            mean: result.mean,
            stddev: result.stddev,
            band: ScoreBand::of(result.mean),
            entities: result
                .subset
                .iter()
                .enumerate()
                .map(|(i, s)| EntityLine::new(i + 1, s, selector))
                .collect(),
        }
    }
}

/// Entities ordered by a selector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankReport {
    pub generated_at: DateTime<Utc>,
    pub selector: String,
    pub descending: bool,
    pub entries: Vec<EntityLine>,
}

impl RankReport {
    pub fn new(selector: &Selector, order: Order, ranked: &[&ScoredEntity<'_>]) -> Self {
        RankReport {
            generated_at: Utc::now(),
            selector: selector.name().to_string(),
            descending: order == Order::Descending,
            entries: ranked
                .iter()
                .enumerate()
                .map(|(i, s)| EntityLine::new(i + 1, s, selector))
                .collect(),
        }
    }
}

/// Per-KPI weighted impact of one entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakdownReport {
    pub generated_at: DateTime<Utc>,
    pub entity_id: String,
    pub entity_name: String,
    pub rows: Vec<WeightedImpact>,
    pub score: f64,
    pub band: ScoreBand,
}

impl BreakdownReport {
    pub fn new(scored: &ScoredEntity<'_>, rows: Vec<WeightedImpact>) -> Self {
        BreakdownReport {
            generated_at: Utc::now(),
            entity_id: scored.entity.id().to_string(),
            entity_name: scored.entity.name().to_string(),
            rows,
            score: scored.score,
            band: ScoreBand::of(scored.score),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::{aggregate, rank};
    use crate::model::{Entity, SHARE_OF_SHELF};

    fn outlets() -> Vec<Entity> {
        vec![
            Entity::new("1", "Reliance Fresh")
                .with_region("Delhi")
                .with_metric(SHARE_OF_SHELF, 88.3),
            Entity::new("5", "Hypercity Gurgaon")
                .with_region("Gurgaon")
                .with_metric(SHARE_OF_SHELF, 76.3),
        ]
    }

    fn scored(outlets: &[Entity]) -> Vec<ScoredEntity<'_>> {
        outlets
            .iter()
            .zip([92.5, 78.9])
            .map(|(entity, score)| ScoredEntity { entity, score })
            .collect()
    }

    #[test]
    fn test_score_record_from_scored() {
        let outlets = outlets();
        let scored = scored(&outlets);
        let record = ScoreRecord::new(&scored[1], Utc::now());

        assert_eq!(record.entity_id, "5");
        assert_eq!(record.region.as_deref(), Some("Gurgaon"));
        assert_eq!(record.band, ScoreBand::Low);
    }

    #[test]
    fn test_summary_report_echoes_filters() {
        let outlets = outlets();
        let scored = scored(&outlets);
        let filters = FilterSet {
            region: Some("Delhi".into()),
            min_score: Some(90.0),
            ..Default::default()
        };
        let result = aggregate(&scored, |s| s.score, |s| filters.matches(s)).unwrap();
        let report = SummaryReport::new(&Selector::Score, &filters, &result);

        assert_eq!(report.count, 1);
        assert_eq!(report.mean, 92.5);
        assert_eq!(report.band, ScoreBand::High);
        assert_eq!(report.filters.region.as_deref(), Some("Delhi"));
        assert_eq!(report.filters.min_score, Some(90.0));
        assert_eq!(report.entities[0].id, "1");

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["selector"], "score");
        assert_eq!(json["band"], "high");
    }

    #[test]
    fn test_rank_report_positions() {
        let outlets = outlets();
        let scored = scored(&outlets);
        let selector = Selector::Metric(SHARE_OF_SHELF.into());
        let ranked = rank(&scored, |s| s.score, Order::Ascending);
        let report = RankReport::new(&selector, Order::Ascending, &ranked);

        assert!(!report.descending);
        assert_eq!(report.entries[0].position, 1);
        assert_eq!(report.entries[0].id, "5");
        assert_eq!(report.entries[0].value, Some(76.3));
    }
}
