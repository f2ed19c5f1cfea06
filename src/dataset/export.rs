use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::info;

use crate::error::Result;
use crate::types::PredictionRecord;

pub const EXPORT_FILE_NAME: &str = "filtered_data.csv";

/// Base columns under their source names, followed by the derived columns.
#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    timestamp: String,
    valor_real: String,
    previsao: String,
    previsao_com_delta: String,
    direcao_real: &'a str,
    direcao_prevista: &'a str,
    par: &'a str,
    acerto_sem_delta: &'static str,
    acerto_com_delta: &'static str,
    hour: u32,
    day_of_week: &'static str,
    period_of_day: &'static str,
    diff_previsao: String,
    diff_previsao_com_delta: String,
    movement_magnitude: String,
}

impl<'a> From<&'a PredictionRecord> for ExportRow<'a> {
    fn from(r: &'a PredictionRecord) -> Self {
        Self {
            timestamp: r.timestamp.format("%Y-%m-%d %H:%M:%S%.f").to_string(),
            valor_real: r.actual_value.to_string(),
            previsao: r.predicted_value.to_string(),
            previsao_com_delta: r.predicted_value_with_delta.to_string(),
            direcao_real: &r.actual_direction,
            direcao_prevista: &r.predicted_direction,
            par: &r.pair,
            acerto_sem_delta: flag(r.hit_without_delta),
            acerto_com_delta: flag(r.hit_with_delta),
            hour: r.hour,
            day_of_week: r.day_of_week.as_str(),
            period_of_day: r.period_of_day.as_str(),
            diff_previsao: r.prediction_error.to_string(),
            diff_previsao_com_delta: r.prediction_error_with_delta.to_string(),
            movement_magnitude: r.movement_magnitude.map(|m| m.to_string()).unwrap_or_default(),
        }
    }
}

fn flag(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

/// Writes the view as CSV and returns the number of data rows written.
pub fn write_csv<W: Write>(records: &[&PredictionRecord], writer: W) -> Result<usize> {
    let mut writer = csv::Writer::from_writer(writer);
    for record in records {
        writer.serialize(ExportRow::from(*record))?;
    }
    writer.flush()?;
    Ok(records.len())
}

pub fn to_csv_bytes(records: &[&PredictionRecord]) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    write_csv(records, &mut buffer)?;
    Ok(buffer)
}

pub fn export_to_file(records: &[&PredictionRecord], path: &Path) -> Result<usize> {
    let file = File::create(path)?;
    let rows = write_csv(records, file)?;
    info!("Exported {} rows to {}", rows, path.display());
    Ok(rows)
}
