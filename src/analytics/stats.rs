use chrono::Datelike;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use std::collections::BTreeMap;

use super::metrics::Tally;
use crate::types::{DayOfWeek, HitColumn, PredictionRecord};

#[derive(Debug, Clone, Serialize)]
pub struct CorrelationMatrix {
    pub labels: Vec<String>,
    /// `None` where a column has no variance.
    pub values: Vec<Vec<Option<f64>>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VolatilityCell {
    pub hour: u32,
    pub day: DayOfWeek,
    pub volatility: f64,
    pub samples: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HourDayCount {
    pub hour: u32,
    pub day: DayOfWeek,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub label: String,
    pub count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectionKind {
    Actual,
    Predicted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectionCount {
    pub kind: DirectionKind,
    pub direction: String,
    pub count: u64,
}

/// Day x hour matrix of hit rates. Rows follow `days`, columns follow `hours`.
#[derive(Debug, Clone, Serialize)]
pub struct Heatmap {
    pub hours: Vec<u32>,
    pub days: Vec<DayOfWeek>,
    pub values: Vec<Vec<Option<f64>>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekHourCount {
    pub iso_year: i32,
    pub week: u32,
    pub hour: u32,
    pub hits: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayCount {
    pub day: DayOfWeek,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorMovementPoint {
    pub movement: f64,
    pub abs_error: f64,
    pub pair: String,
    pub hit: bool,
}

fn to_f64(value: rust_decimal::Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Sample standard deviation (n - 1). Needs at least two values.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    let mx = mean(xs)?;
    let my = mean(ys)?;

    let mut cov = 0.0;
    let mut vx = 0.0;
    let mut vy = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        cov += (x - mx) * (y - my);
        vx += (x - mx).powi(2);
        vy += (y - my).powi(2);
    }

    if vx == 0.0 || vy == 0.0 {
        return None;
    }
    Some(cov / (vx.sqrt() * vy.sqrt()))
}

/// Pearson correlation between actual, predicted and predicted-with-delta values.
pub fn correlation_matrix(records: &[&PredictionRecord]) -> CorrelationMatrix {
    let columns: [(&str, Vec<f64>); 3] = [
        ("valor_real", records.iter().map(|r| to_f64(r.actual_value)).collect()),
        ("previsao", records.iter().map(|r| to_f64(r.predicted_value)).collect()),
        (
            "previsao_com_delta",
            records.iter().map(|r| to_f64(r.predicted_value_with_delta)).collect(),
        ),
    ];

    let values: Vec<Vec<Option<f64>>> = columns
        .iter()
        .map(|(_, a)| columns.iter().map(|(_, b)| pearson(a, b)).collect())
        .collect();

    CorrelationMatrix {
        labels: columns.iter().map(|(name, _)| name.to_string()).collect(),
        values,
    }
}

/// Standard deviation of the actual value per (hour, day). Cells with a single row are omitted.
pub fn volatility_by_hour_day(records: &[&PredictionRecord]) -> Vec<VolatilityCell> {
    let mut groups: BTreeMap<(u32, DayOfWeek), Vec<f64>> = BTreeMap::new();
    for record in records {
        groups
            .entry((record.hour, record.day_of_week))
            .or_insert_with(Vec::new)
            .push(to_f64(record.actual_value));
    }

    groups
        .into_iter()
        .filter_map(|((hour, day), values)| {
            sample_std(&values).map(|volatility| VolatilityCell {
                hour,
                day,
                volatility,
                samples: values.len(),
            })
        })
        .collect()
}

pub fn misses_by_hour_day(records: &[&PredictionRecord], column: HitColumn) -> Vec<HourDayCount> {
    let mut counts: BTreeMap<(u32, DayOfWeek), u64> = BTreeMap::new();
    for record in records.iter().filter(|r| !r.is_hit(column)) {
        *counts.entry((record.hour, record.day_of_week)).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .map(|((hour, day), count)| HourDayCount { hour, day, count })
        .collect()
}

pub fn misses_by_direction(records: &[&PredictionRecord], column: HitColumn) -> Vec<CategoryCount> {
    let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
    for record in records.iter().filter(|r| !r.is_hit(column)) {
        *counts.entry(record.predicted_direction.as_str()).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .map(|(label, count)| CategoryCount {
            label: label.to_string(),
            count,
        })
        .collect()
}

pub fn direction_distribution(records: &[&PredictionRecord]) -> Vec<DirectionCount> {
    let mut counts: BTreeMap<(DirectionKind, &str), u64> = BTreeMap::new();
    for record in records {
        *counts
            .entry((DirectionKind::Actual, record.actual_direction.as_str()))
            .or_insert(0) += 1;
        *counts
            .entry((DirectionKind::Predicted, record.predicted_direction.as_str()))
            .or_insert(0) += 1;
    }

    counts
        .into_iter()
        .map(|((kind, direction), count)| DirectionCount {
            kind,
            direction: direction.to_string(),
            count,
        })
        .collect()
}

pub fn hit_rate_heatmap(records: &[&PredictionRecord], column: HitColumn) -> Heatmap {
    let mut cells: BTreeMap<(DayOfWeek, u32), Tally> = BTreeMap::new();
    for record in records {
        cells
            .entry((record.day_of_week, record.hour))
            .or_default()
            .add(record);
    }

    let mut days: Vec<DayOfWeek> = cells.keys().map(|(d, _)| *d).collect();
    days.dedup();
    let mut hours: Vec<u32> = cells.keys().map(|(_, h)| *h).collect();
    hours.sort_unstable();
    hours.dedup();

    let values: Vec<Vec<Option<f64>>> = days
        .iter()
        .map(|day| {
            hours
                .iter()
                .map(|hour| cells.get(&(*day, *hour)).map(|t| to_f64(t.rate(column))))
                .collect()
        })
        .collect();

    Heatmap { hours, days, values }
}

pub fn hits_by_week_and_hour(records: &[&PredictionRecord], column: HitColumn) -> Vec<WeekHourCount> {
    let mut counts: BTreeMap<(i32, u32, u32), u64> = BTreeMap::new();
    for record in records.iter().filter(|r| r.is_hit(column)) {
        let iso = record.timestamp.iso_week();
        *counts.entry((iso.year(), iso.week(), record.hour)).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .map(|((iso_year, week, hour), hits)| WeekHourCount {
            iso_year,
            week,
            hour,
            hits,
        })
        .collect()
}

pub fn hits_by_day(records: &[&PredictionRecord], column: HitColumn) -> Vec<DayCount> {
    let mut counts: BTreeMap<DayOfWeek, u64> = BTreeMap::new();
    for record in records.iter().filter(|r| r.is_hit(column)) {
        *counts.entry(record.day_of_week).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .map(|(day, count)| DayCount { day, count })
        .collect()
}

/// Row count per pair, most frequent first.
pub fn pair_distribution(records: &[&PredictionRecord]) -> Vec<CategoryCount> {
    let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
    for record in records {
        *counts.entry(record.pair.as_str()).or_insert(0) += 1;
    }

    let mut distribution: Vec<CategoryCount> = counts
        .into_iter()
        .map(|(label, count)| CategoryCount {
            label: label.to_string(),
            count,
        })
        .collect();
    distribution.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    distribution
}

pub fn error_vs_movement(records: &[&PredictionRecord], column: HitColumn) -> Vec<ErrorMovementPoint> {
    records
        .iter()
        .filter_map(|r| {
            r.movement_magnitude.map(|movement| ErrorMovementPoint {
                movement: to_f64(movement),
                abs_error: to_f64(r.abs_error(column)),
                pair: r.pair.clone(),
                hit: r.is_hit(column),
            })
        })
        .collect()
}
