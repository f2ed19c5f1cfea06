use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

use crate::error::{DashboardError, Result};
use crate::types::PredictionRecord;

pub const REQUIRED_COLUMNS: [&str; 9] = [
    "timestamp",
    "valor_real",
    "previsao",
    "previsao_com_delta",
    "direcao_real",
    "direcao_prevista",
    "par",
    "acerto_sem_delta",
    "acerto_com_delta",
];

const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"];

#[derive(Debug, Deserialize)]
struct RawRow {
    timestamp: String,
    #[serde(rename = "valor_real")]
    actual_value: String,
    #[serde(rename = "previsao")]
    predicted_value: String,
    #[serde(rename = "previsao_com_delta")]
    predicted_value_with_delta: String,
    #[serde(rename = "direcao_real")]
    actual_direction: String,
    #[serde(rename = "direcao_prevista")]
    predicted_direction: String,
    #[serde(rename = "par")]
    pair: String,
    #[serde(rename = "acerto_sem_delta")]
    hit_without_delta: String,
    #[serde(rename = "acerto_com_delta")]
    hit_with_delta: String,
}

impl RawRow {
    fn into_record(self, line: usize) -> Result<PredictionRecord> {
        let invalid = |message: String| DashboardError::InvalidRow { line, message };

        let timestamp = parse_timestamp(&self.timestamp).map_err(|e| invalid(e.to_string()))?;
        let actual_value = parse_decimal(&self.actual_value)
            .ok_or_else(|| invalid(format!("valor_real is not a number: '{}'", self.actual_value)))?;
        let predicted_value = parse_decimal(&self.predicted_value)
            .ok_or_else(|| invalid(format!("previsao is not a number: '{}'", self.predicted_value)))?;
        let predicted_value_with_delta = parse_decimal(&self.predicted_value_with_delta).ok_or_else(|| {
            invalid(format!(
                "previsao_com_delta is not a number: '{}'",
                self.predicted_value_with_delta
            ))
        })?;
        let hit_without_delta = parse_flag(&self.hit_without_delta).ok_or_else(|| {
            invalid(format!("acerto_sem_delta is not a boolean: '{}'", self.hit_without_delta))
        })?;
        let hit_with_delta = parse_flag(&self.hit_with_delta)
            .ok_or_else(|| invalid(format!("acerto_com_delta is not a boolean: '{}'", self.hit_with_delta)))?;

        Ok(PredictionRecord::new(
            timestamp,
            actual_value,
            predicted_value,
            predicted_value_with_delta,
            self.actual_direction,
            self.predicted_direction,
            self.pair,
            hit_without_delta,
            hit_with_delta,
        ))
    }
}

/// Reads every row of the prediction CSV. The first malformed row aborts the load.
pub fn read_records<R: Read>(reader: R) -> Result<Vec<PredictionRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(DashboardError::MissingColumn(column.to_string()));
        }
    }

    let mut records = Vec::new();
    for (idx, row) in reader.deserialize::<RawRow>().enumerate() {
        // header is line 1
        let line = idx + 2;
        records.push(row?.into_record(line)?);
    }

    debug!("Parsed {} prediction rows", records.len());
    Ok(records)
}

pub fn read_records_from_path(path: &Path) -> Result<Vec<PredictionRecord>> {
    info!("Loading predictions from {}", path.display());
    let file = File::open(path)?;
    read_records(file)
}

pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime> {
    let value = value.trim();

    for format in TIMESTAMP_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(ts);
        }
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.naive_utc());
    }

    for format in OFFSET_FORMATS {
        if let Ok(ts) = DateTime::parse_from_str(value, format) {
            return Ok(ts.naive_utc());
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| DashboardError::InvalidTimestamp(value.to_string()))
}

fn parse_decimal(value: &str) -> Option<Decimal> {
    Decimal::from_str(value)
        .or_else(|_| Decimal::from_scientific(value))
        .ok()
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "1.0" | "yes" => Some(true),
        "false" | "0" | "0.0" | "no" => Some(false),
        _ => None,
    }
}
