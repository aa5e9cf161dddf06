//! Immutable snapshot records scored by the aggregator.

use anyhow::{Result, bail};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const SHARE_OF_SHELF: &str = "Share of Shelf";
pub const SKU_COUNT: &str = "SKU Count";
pub const PLANOGRAM_COMPLIANCE: &str = "Planogram Compliance";
pub const MUST_SELL_COMPLIANCE: &str = "Must Sell Compliance";
pub const PREMIUM_SKU_COMPLIANCE: &str = "Premium SKU Compliance";

/// Metric name → percentage value.
pub type Metrics = BTreeMap<String, f64>;

/// Rank in the sales management reporting chain, top first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HierarchyLevel {
    Nsm,
    Zsm,
    Rsm,
    Asm,
}

impl HierarchyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            HierarchyLevel::Nsm => "NSM",
            HierarchyLevel::Zsm => "ZSM",
            HierarchyLevel::Rsm => "RSM",
            HierarchyLevel::Asm => "ASM",
        }
    }
}

impl fmt::Display for HierarchyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HierarchyLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let level = match s.trim().to_ascii_uppercase().as_str() {
            "NSM" => HierarchyLevel::Nsm,
            "ZSM" => HierarchyLevel::Zsm,
            "RSM" => HierarchyLevel::Rsm,
            "ASM" => HierarchyLevel::Asm,
            other => bail!("unknown hierarchy level `{other}`"),
        };
        Ok(level)
    }
}

/// A user or outlet as exported by the field data source.
///
/// Built once through the `with_*` methods (or by the snapshot loader) and
/// only read afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    id: String,
    name: String,
    level: Option<HierarchyLevel>,
    region: Option<String>,
    beat: Option<String>,
    last_visit: Option<NaiveDate>,
    metrics: Metrics,
}

impl Entity {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Entity {
            id: id.into(),
            name: name.into(),
            level: None,
            region: None,
            beat: None,
            last_visit: None,
            metrics: Metrics::new(),
        }
    }

    pub fn with_level(mut self, level: HierarchyLevel) -> Self {
        self.level = Some(level);
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_beat(mut self, beat: impl Into<String>) -> Self {
        self.beat = Some(beat.into());
        self
    }

    pub fn with_last_visit(mut self, date: NaiveDate) -> Self {
        self.last_visit = Some(date);
        self
    }

    pub fn with_metric(mut self, name: impl Into<String>, value: f64) -> Self {
        self.metrics.insert(name.into(), value);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn level(&self) -> Option<HierarchyLevel> {
        self.level
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    pub fn beat(&self) -> Option<&str> {
        self.beat.as_deref()
    }

    pub fn last_visit(&self) -> Option<NaiveDate> {
        self.last_visit
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied()
    }

    /// Names of metrics whose value lies outside `[0, 100]`.
    pub fn out_of_range_metrics(&self) -> impl Iterator<Item = (&str, f64)> {
        self.metrics
            .iter()
            .filter(|(_, v)| !(0.0..=100.0).contains(*v))
            .map(|(k, v)| (k.as_str(), *v))
    }
}

/// One row of a weighting scheme: how many percent a metric contributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightEntry {
    pub metric: String,
    pub weight: f64,
}

impl WeightEntry {
    pub fn new(metric: impl Into<String>, weight: f64) -> Self {
        WeightEntry {
            metric: metric.into(),
            weight,
        }
    }
}

/// Ordered weighting scheme. Weights are percentages that must total 100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightTable(Vec<WeightEntry>);

impl WeightTable {
    pub fn new(entries: Vec<WeightEntry>) -> Self {
        WeightTable(entries)
    }

    pub fn entries(&self) -> &[WeightEntry] {
        &self.0
    }
}

impl Default for WeightTable {
    /// The outlet scoring scheme shipped with the dashboards.
    fn default() -> Self {
        WeightTable(vec![
            WeightEntry::new(SHARE_OF_SHELF, 25.0),
            WeightEntry::new(SKU_COUNT, 20.0),
            WeightEntry::new(PLANOGRAM_COMPLIANCE, 25.0),
            WeightEntry::new(MUST_SELL_COMPLIANCE, 15.0),
            WeightEntry::new(PREMIUM_SKU_COMPLIANCE, 15.0),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_from_str_is_case_insensitive() {
        assert_eq!("zsm".parse::<HierarchyLevel>().unwrap(), HierarchyLevel::Zsm);
        assert_eq!(" ASM ".parse::<HierarchyLevel>().unwrap(), HierarchyLevel::Asm);
        assert!("CEO".parse::<HierarchyLevel>().is_err());
    }

    #[test]
    fn test_entity_builder() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let outlet = Entity::new("1", "Reliance Fresh Connaught Place")
            .with_region("Delhi")
            .with_beat("CP-01")
            .with_last_visit(date)
            .with_metric(SHARE_OF_SHELF, 88.3);

        assert_eq!(outlet.id(), "1");
        assert_eq!(outlet.region(), Some("Delhi"));
        assert_eq!(outlet.beat(), Some("CP-01"));
        assert_eq!(outlet.level(), None);
        assert_eq!(outlet.last_visit(), Some(date));
        assert_eq!(outlet.metric(SHARE_OF_SHELF), Some(88.3));
        assert_eq!(outlet.metric(SKU_COUNT), None);
    }

    #[test]
    fn test_out_of_range_metrics() {
        let user = Entity::new("1", "John Smith")
            .with_metric(SHARE_OF_SHELF, 72.3)
            .with_metric(SKU_COUNT, 145.0)
            .with_metric(PLANOGRAM_COMPLIANCE, -1.0);

        let flagged: Vec<_> = user.out_of_range_metrics().collect();
        assert_eq!(flagged, vec![(PLANOGRAM_COMPLIANCE, -1.0), (SKU_COUNT, 145.0)]);
    }

    #[test]
    fn test_default_weights_total_100() {
        let table = WeightTable::default();
        assert_eq!(table.entries().len(), 5);
        assert_eq!(table.total(), 100.0);
    }

    #[test]
    fn test_weight_table_json_shape() {
        let json = r#"[{"metric":"Share of Shelf","weight":60},{"metric":"SKU Count","weight":40}]"#;
        let table: WeightTable = serde_json::from_str(json).unwrap();
        assert_eq!(table.entries()[1], WeightEntry::new(SKU_COUNT, 40.0));
    }
}
