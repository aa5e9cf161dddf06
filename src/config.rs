use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::model::WeightTable;

/// Environment variable naming a weight table file when no flag is given.
pub const WEIGHTS_ENV: &str = "KPI_WEIGHTS_PATH";

impl WeightTable {
    /// Loads and validates a weight table from a JSON file at `path`.
    ///
    /// The file holds an ordered array of entries:
    /// ```json
    /// [
    ///   { "metric": "Share of Shelf", "weight": 25 },
    ///   { "metric": "SKU Count", "weight": 20 }
    /// ]
    /// ```
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading weight table {path}"))?;
        let table: WeightTable = serde_json::from_str(&content)
            .with_context(|| format!("parsing weight table {path}"))?;
        table
            .validate()
            .with_context(|| format!("invalid weight table {path}"))?;
        debug!(
            path,
            entries = table.entries().len(),
            total = table.total(),
            "Weight table validated"
        );
        Ok(table)
    }
}

/// Picks the weight table: explicit path first, then [`WEIGHTS_ENV`], then
/// the built-in scheme.
pub fn resolve_weights(path: Option<&str>) -> Result<WeightTable> {
    let path = path
        .map(str::to_string)
        .or_else(|| std::env::var(WEIGHTS_ENV).ok());

    match path {
        Some(path) => {
            info!(path = %path, "Loading weight table");
            WeightTable::load(&path)
        }
        None => {
            debug!("Using built-in weight table");
            Ok(WeightTable::default())
        }
    }
}
