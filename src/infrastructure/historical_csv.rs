//! CSV persistence for historical price data.
//!
//! Columns: `timestamp, hour, load, temperature, is_weekend, is_holiday, price`.
//! `timestamp` is informational only and is not used as a model input.

use crate::domain::errors::DataError;
use crate::domain::ml::feature_registry::{FEATURE_NAMES, TARGET_NAME};
use crate::domain::types::{Dataset, Sample};
use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Deserialize)]
struct HistoricalRecord {
    #[serde(default)]
    #[allow(dead_code)]
    timestamp: Option<String>,
    hour: f64,
    load: f64,
    temperature: f64,
    #[serde(deserialize_with = "deserialize_flag")]
    is_weekend: bool,
    #[serde(deserialize_with = "deserialize_flag")]
    is_holiday: bool,
    price: f64,
}

#[derive(Debug, Serialize)]
struct HistoricalRow {
    timestamp: String,
    hour: u8,
    load: f64,
    temperature: f64,
    is_weekend: u8,
    is_holiday: u8,
    price: f64,
}

/// Accepts `0/1`, `0.0/1.0` and `true/false` spellings.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_flag(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid flag value '{}'", raw)))
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "1.0" | "true" => Some(true),
        "0" | "0.0" | "false" => Some(false),
        _ => None,
    }
}

fn io_error(path: &Path, e: impl std::fmt::Display) -> DataError {
    DataError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    }
}

/// Reads a historical dataset, checking the header for every model column first.
pub fn read_dataset(path: &Path) -> Result<Dataset, DataError> {
    let file = File::open(path).map_err(|e| io_error(path, e))?;
    let mut rdr = csv::Reader::from_reader(BufReader::new(file));

    let headers = rdr.headers().map_err(|e| io_error(path, e))?.clone();
    for column in FEATURE_NAMES.iter().chain(std::iter::once(&TARGET_NAME)) {
        if !headers.iter().any(|h| h.trim() == *column) {
            return Err(DataError::MissingColumn {
                column: (*column).to_string(),
            });
        }
    }

    let mut samples = Vec::new();
    for (idx, result) in rdr.deserialize::<HistoricalRecord>().enumerate() {
        // Header is line 1
        let fallback_line = idx as u64 + 2;
        let record = result.map_err(|e| DataError::MalformedRecord {
            line: e.position().map_or(fallback_line, |p| p.line()),
            reason: e.to_string(),
        })?;
        samples.push(to_sample(record, fallback_line)?);
    }

    info!("Read {} historical records from {:?}", samples.len(), path);
    Ok(Dataset::new(samples))
}

fn to_sample(record: HistoricalRecord, line: u64) -> Result<Sample, DataError> {
    if !(0.0..=23.0).contains(&record.hour) || record.hour.fract() != 0.0 {
        return Err(DataError::MalformedRecord {
            line,
            reason: format!("hour must be an integer between 0 and 23, got {}", record.hour),
        });
    }

    Ok(Sample {
        hour: record.hour as u8,
        load: record.load,
        temperature: record.temperature,
        is_weekend: record.is_weekend,
        is_holiday: record.is_holiday,
        price: record.price,
    })
}

/// Writes a dataset in the historical schema. Sample `i` is stamped on day `i`
/// after `start` at its own hour.
pub fn write_dataset(path: &Path, dataset: &Dataset, start: NaiveDateTime) -> Result<(), DataError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
    }

    let mut wtr = csv::Writer::from_path(path).map_err(|e| io_error(path, e))?;
    for (i, s) in dataset.samples().iter().enumerate() {
        let ts = start + Duration::days(i as i64) + Duration::hours(i64::from(s.hour));
        wtr.serialize(HistoricalRow {
            timestamp: ts.format(TIMESTAMP_FORMAT).to_string(),
            hour: s.hour,
            load: s.load,
            temperature: s.temperature,
            is_weekend: u8::from(s.is_weekend),
            is_holiday: u8::from(s.is_holiday),
            price: s.price,
        })
        .map_err(|e| io_error(path, e))?;
    }
    wtr.flush().map_err(|e| io_error(path, e))?;

    info!("Wrote {} records to {:?}", dataset.len(), path);
    Ok(())
}
