//! CSV snapshot loading.
//!
//! A snapshot file has one row per user or outlet. The columns `id`, `name`,
//! `level`, `region`, `beat` and `last_visit` are reserved; every other column
//! is read as a metric. Empty cells mean "not present".

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs::File;
use std::io::Read;
use tracing::{debug, warn};

use crate::aggregator::TrendPoint;
use crate::model::Entity;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Column positions resolved from the header row.
#[derive(Debug)]
struct Columns {
    id: usize,
    name: usize,
    level: Option<usize>,
    region: Option<usize>,
    beat: Option<usize>,
    last_visit: Option<usize>,
    metrics: Vec<(usize, String)>,
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let mut id = None;
        let mut name = None;
        let mut level = None;
        let mut region = None;
        let mut beat = None;
        let mut last_visit = None;
        let mut metrics: Vec<(usize, String)> = Vec::new();

        for (idx, header) in headers.iter().enumerate() {
            let slot = match header.to_ascii_lowercase().as_str() {
                "id" => &mut id,
                "name" => &mut name,
                "level" => &mut level,
                "region" => &mut region,
                "beat" => &mut beat,
                "last_visit" => &mut last_visit,
                "" => bail!("column {} has an empty header", idx + 1),
                _ => {
                    if metrics.iter().any(|(_, m)| m == header) {
                        bail!("metric column `{header}` appears twice");
                    }
                    metrics.push((idx, header.to_string()));
                    continue;
                }
            };
            if slot.replace(idx).is_some() {
                bail!("column `{header}` appears twice");
            }
        }

        Ok(Columns {
            id: id.context("snapshot has no `id` column")?,
            name: name.context("snapshot has no `name` column")?,
            level,
            region,
            beat,
            last_visit,
            metrics,
        })
    }
}

fn cell(record: &StringRecord, idx: Option<usize>) -> Option<&str> {
    idx.and_then(|i| record.get(i)).filter(|v| !v.is_empty())
}

fn parse_row(columns: &Columns, record: &StringRecord) -> Result<Entity> {
    let id = cell(record, Some(columns.id)).context("missing id")?;
    let name = cell(record, Some(columns.name)).context("missing name")?;
    let mut entity = Entity::new(id, name);

    if let Some(level) = cell(record, columns.level) {
        entity = entity.with_level(level.parse()?);
    }
    if let Some(region) = cell(record, columns.region) {
        entity = entity.with_region(region);
    }
    if let Some(beat) = cell(record, columns.beat) {
        entity = entity.with_beat(beat);
    }
    if let Some(raw) = cell(record, columns.last_visit) {
        let date = NaiveDate::parse_from_str(raw, DATE_FORMAT)
            .with_context(|| format!("last_visit `{raw}` is not a YYYY-MM-DD date"))?;
        entity = entity.with_last_visit(date);
    }

    for (idx, metric) in &columns.metrics {
        let Some(raw) = cell(record, Some(*idx)) else {
            continue;
        };
        let value: f64 = raw
            .parse()
            .with_context(|| format!("metric `{metric}`: `{raw}` is not a number"))?;
        if !value.is_finite() {
            bail!("metric `{metric}` is not finite");
        }
        entity = entity.with_metric(metric.clone(), value);
    }

    Ok(entity)
}

/// Reads entities from any CSV source.
pub fn read_entities<R: Read>(reader: R) -> Result<Vec<Entity>> {
    let mut rdr = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let columns = Columns::from_headers(rdr.headers()?)?;
    debug!(metrics = columns.metrics.len(), "Snapshot columns resolved");

    let mut entities = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let entity = parse_row(&columns, &record).with_context(|| format!("line {line}"))?;

        for (metric, value) in entity.out_of_range_metrics() {
            warn!(
                entity_id = entity.id(),
                metric,
                value,
                line,
                "Metric outside 0-100, kept unchanged"
            );
        }
        entities.push(entity);
    }

    Ok(entities)
}

/// Loads a snapshot CSV file into entities.
pub fn load_entities(path: &str) -> Result<Vec<Entity>> {
    let file = File::open(path).with_context(|| format!("opening snapshot {path}"))?;
    let entities = read_entities(file).with_context(|| format!("reading snapshot {path}"))?;
    debug!(path, count = entities.len(), "Snapshot loaded");
    Ok(entities)
}

/// Loads a `date,value` series.
pub fn load_trend(path: &str) -> Result<Vec<TrendPoint>> {
    let file = File::open(path).with_context(|| format!("opening series {path}"))?;
    let mut rdr = ReaderBuilder::new().trim(Trim::All).from_reader(file);

    let mut points = Vec::new();
    for result in rdr.deserialize() {
        let point: TrendPoint = result.with_context(|| format!("reading series {path}"))?;
        points.push(point);
    }

    debug!(path, count = points.len(), "Series loaded");
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{HierarchyLevel, SHARE_OF_SHELF, SKU_COUNT};

    #[test]
    fn test_read_outlet_rows() {
        let data = "\
id,name,region,beat,last_visit,Share of Shelf,SKU Count
1,Reliance Fresh Connaught Place,Delhi,CP-01,2024-06-10,88.3,94.2
5,Hypercity Gurgaon,Gurgaon,,2024-06-07,76.3,
";
        let entities = read_entities(data.as_bytes()).unwrap();

        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].region(), Some("Delhi"));
        assert_eq!(entities[0].beat(), Some("CP-01"));
        assert_eq!(entities[0].metric(SKU_COUNT), Some(94.2));
        assert_eq!(
            entities[1].last_visit(),
            NaiveDate::from_ymd_opt(2024, 6, 7)
        );
        assert_eq!(entities[1].beat(), None);
        assert_eq!(entities[1].metric(SHARE_OF_SHELF), Some(76.3));
        assert_eq!(entities[1].metric(SKU_COUNT), None);
    }

    #[test]
    fn test_read_user_rows_with_levels() {
        let data = "ID, Name, Level, Share of Shelf\n1, John Smith, zsm, 72.3\n";
        let entities = read_entities(data.as_bytes()).unwrap();

        assert_eq!(entities[0].name(), "John Smith");
        assert_eq!(entities[0].level(), Some(HierarchyLevel::Zsm));
        assert_eq!(entities[0].metric(SHARE_OF_SHELF), Some(72.3));
    }

    #[test]
    fn test_out_of_range_values_are_kept() {
        let data = "id,name,SKU Count\n1,John Smith,145\n";
        let entities = read_entities(data.as_bytes()).unwrap();
        assert_eq!(entities[0].metric(SKU_COUNT), Some(145.0));
    }

    #[test]
    fn test_missing_id_column() {
        let data = "name,Share of Shelf\nJohn Smith,72.3\n";
        let err = read_entities(data.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("`id`"));
    }

    #[test]
    fn test_bad_number_names_line() {
        let data = "id,name,Share of Shelf\n1,A,72.3\n2,B,high\n";
        let err = read_entities(data.as_bytes()).unwrap_err();
        assert!(format!("{err:#}").contains("line 3"));
        assert!(format!("{err:#}").contains("`high` is not a number"));
    }

    #[test]
    fn test_non_finite_metric_rejected() {
        let data = "id,name,Share of Shelf\n1,A,NaN\n";
        assert!(read_entities(data.as_bytes()).is_err());
    }

    #[test]
    fn test_bad_level_and_date_rejected() {
        let level = "id,name,level\n1,A,CEO\n";
        assert!(read_entities(level.as_bytes()).is_err());

        let date = "id,name,last_visit\n1,A,10/06/2024\n";
        assert!(read_entities(date.as_bytes()).is_err());
    }

    #[test]
    fn test_duplicate_columns_rejected() {
        let data = "id,name,Share of Shelf,Share of Shelf\n1,A,1,2\n";
        assert!(read_entities(data.as_bytes()).is_err());

        let data = "id,ID,name\n1,2,A\n";
        assert!(read_entities(data.as_bytes()).is_err());
    }

    #[test]
    fn test_missing_snapshot_file() {
        assert!(load_entities("/nonexistent/kpi_rater/snapshot.csv").is_err());
    }
}
