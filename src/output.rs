//! Output formatting and persistence for scores and reports.
//!
//! Supports pretty-printing, JSON files (optionally gzip-compressed), and CSV append.

use anyhow::{Context, Result};
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;
use std::fmt::Debug;
use tracing::{debug, info};

use crate::report::ScoreRecord;
use csv::WriterBuilder;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

/// Logs a value using Rust's debug pretty-print format.
pub fn print_pretty(value: &impl Debug) {
    debug!("{:#?}", value);
}

/// Logs a value as pretty-printed JSON.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Appends a [`ScoreRecord`] as a row to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_record(path: &str, record: &ScoreRecord) -> Result<()> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, "Appending CSV record");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // IMPORTANT when appending
        .from_writer(file);

    writer.serialize(record)?;
    writer.flush()?;

    Ok(())
}

/// Writes `value` as pretty JSON to `path`, creating parent directories.
///
/// With `gzip` the bytes are compressed and `.gz` is appended to the file
/// name. Returns the path actually written.
pub fn write_json(path: &str, value: &impl Serialize, gzip: bool) -> Result<String> {
    let body = serde_json::to_vec_pretty(value)?;

    let (body, target) = if gzip {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&body)?;
        (encoder.finish()?, format!("{path}.gz"))
    } else {
        (body, path.to_string())
    };

    if let Some(parent) = Path::new(&target).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }
    fs::write(&target, &body).with_context(|| format!("writing {target}"))?;

    info!(path = %target, bytes = body.len(), gzip, "Report written");
    Ok(target)
}
