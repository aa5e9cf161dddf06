//! Filtering and ordering of entity collections, plus the predicates behind
//! the dashboard filter panels.

use crate::aggregator::band::ScoreBand;
use crate::aggregator::score::{ScoredEntity, weighted_score};
use crate::error::KpiResult;
use crate::model::{Entity, HierarchyLevel, WeightEntry};
use anyhow::bail;
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sort direction for [`rank`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Ascending,
    Descending,
}

/// Returns the items matching `predicate`, in their original order.
pub fn filter<'a, T>(items: &'a [T], predicate: impl Fn(&T) -> bool) -> Vec<&'a T> {
    items.iter().filter(|item| predicate(*item)).collect()
}

/// Stable sort of `items` by `selector`. Equal keys keep their input order in
/// both directions.
pub fn rank<'a, T>(items: &'a [T], selector: impl Fn(&T) -> f64, order: Order) -> Vec<&'a T> {
    let mut ranked: Vec<&T> = items.iter().collect();
    ranked.sort_by(|a, b| {
        let (a, b) = (selector(*a), selector(*b));
        match order {
            Order::Ascending => a.total_cmp(&b),
            Order::Descending => b.total_cmp(&a),
        }
    });
    ranked
}

/// What a summary or ranking is computed over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// The weighted outlet score.
    Score,
    /// One raw metric by name.
    Metric(String),
}

impl Selector {
    pub fn name(&self) -> &str {
        match self {
            Selector::Score => "score",
            Selector::Metric(name) => name,
        }
    }

    /// `None` when the entity has no value for the selected metric.
    pub fn value(&self, scored: &ScoredEntity<'_>) -> Option<f64> {
        match self {
            Selector::Score => Some(scored.score),
            Selector::Metric(name) => scored.entity.metric(name),
        }
    }
}

/// Reporting window offered by the dashboards' time-period filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Timeframe {
    Last7Days,
    Last30Days,
    Last90Days,
    Last6Months,
}

impl Timeframe {
    pub fn days(&self) -> u64 {
        match self {
            Timeframe::Last7Days => 7,
            Timeframe::Last30Days => 30,
            Timeframe::Last90Days => 90,
            Timeframe::Last6Months => 180,
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Timeframe::Last7Days => "last-7-days",
            Timeframe::Last30Days => "last-30-days",
            Timeframe::Last90Days => "last-90-days",
            Timeframe::Last6Months => "last-6-months",
        };
        f.write_str(name)
    }
}

impl FromStr for Timeframe {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim() {
            "last-7-days" => Ok(Timeframe::Last7Days),
            "last-30-days" => Ok(Timeframe::Last30Days),
            "last-90-days" => Ok(Timeframe::Last90Days),
            "last-6-months" => Ok(Timeframe::Last6Months),
            other => bail!("unknown timeframe `{other}`"),
        }
    }
}

pub fn by_region(region: &str) -> impl Fn(&Entity) -> bool + '_ {
    move |e| e.region().is_some_and(|r| r.eq_ignore_ascii_case(region))
}

pub fn by_beat(beat: &str) -> impl Fn(&Entity) -> bool + '_ {
    move |e| e.beat().is_some_and(|b| b.eq_ignore_ascii_case(beat))
}

pub fn by_level(level: HierarchyLevel) -> impl Fn(&Entity) -> bool {
    move |e| e.level() == Some(level)
}

/// Keeps entities last visited within `timeframe` days up to and including `as_of`.
/// Entities without a recorded visit never match.
pub fn visited_within(timeframe: Timeframe, as_of: NaiveDate) -> impl Fn(&Entity) -> bool {
    let start = as_of
        .checked_sub_days(Days::new(timeframe.days()))
        .unwrap_or(NaiveDate::MIN);
    move |e| e.last_visit().is_some_and(|d| d >= start && d <= as_of)
}

pub fn in_band(band: ScoreBand) -> impl Fn(&ScoredEntity<'_>) -> bool {
    move |s| ScoreBand::of(s.score) == band
}

pub fn score_at_least(threshold: f64) -> impl Fn(&ScoredEntity<'_>) -> bool {
    move |s| s.score >= threshold
}

/// The combined selections of a filter panel. `None` means "all".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSet {
    pub region: Option<String>,
    pub beat: Option<String>,
    pub level: Option<HierarchyLevel>,
    pub band: Option<ScoreBand>,
    pub min_score: Option<f64>,
    pub visited: Option<(Timeframe, NaiveDate)>,
}

impl FilterSet {
    /// The selections that need no score: region, beat, level and visit window.
    pub fn matches_entity(&self, entity: &Entity) -> bool {
        if let Some(region) = &self.region {
            if !by_region(region)(entity) {
                return false;
            }
        }
        if let Some(beat) = &self.beat {
            if !by_beat(beat)(entity) {
                return false;
            }
        }
        if let Some(level) = self.level {
            if !by_level(level)(entity) {
                return false;
            }
        }
        if let Some((timeframe, as_of)) = self.visited {
            if !visited_within(timeframe, as_of)(entity) {
                return false;
            }
        }

        true
    }

    pub fn matches(&self, scored: &ScoredEntity<'_>) -> bool {
        if !self.matches_entity(scored.entity) {
            return false;
        }
        if let Some(band) = self.band {
            if !in_band(band)(scored) {
                return false;
            }
        }
        if let Some(threshold) = self.min_score {
            if !score_at_least(threshold)(scored) {
                return false;
            }
        }

        true
    }

    /// Scores only the entities the entity-level selections keep, then applies
    /// the score-level ones. Rows outside the selection are never scored, so
    /// they may lack weighted metrics.
    pub fn select_scored<'a>(
        &self,
        entities: &'a [Entity],
        weights: &[WeightEntry],
    ) -> KpiResult<Vec<ScoredEntity<'a>>> {
        let mut selected = Vec::new();
        for entity in entities.iter().filter(|e| self.matches_entity(e)) {
            let scored = ScoredEntity {
                entity,
                score: weighted_score(entity.metrics(), weights)?,
            };
            if self.matches(&scored) {
                selected.push(scored);
            }
        }
        Ok(selected)
    }
}
