use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{DashboardError, Result};
use crate::types::{DayOfWeek, HitColumn, PeriodOfDay, PredictionRecord};

/// A field records can be grouped on. Several of them form a composite key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupBy {
    Hour,
    DayOfWeek,
    PeriodOfDay,
    Pair,
    Date,
}

impl GroupBy {
    pub fn key(&self, record: &PredictionRecord) -> GroupValue {
        match self {
            GroupBy::Hour => GroupValue::Hour(record.hour),
            GroupBy::DayOfWeek => GroupValue::Day(record.day_of_week),
            GroupBy::PeriodOfDay => GroupValue::Period(record.period_of_day),
            GroupBy::Pair => GroupValue::Pair(record.pair.clone()),
            GroupBy::Date => GroupValue::Date(record.timestamp.date()),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GroupBy::Hour => "hour",
            GroupBy::DayOfWeek => "day_of_week",
            GroupBy::PeriodOfDay => "period_of_day",
            GroupBy::Pair => "pair",
            GroupBy::Date => "date",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "hour" => Some(GroupBy::Hour),
            "day" | "day_of_week" => Some(GroupBy::DayOfWeek),
            "period" | "period_of_day" => Some(GroupBy::PeriodOfDay),
            "pair" | "par" => Some(GroupBy::Pair),
            "date" => Some(GroupBy::Date),
            _ => None,
        }
    }

    /// Parses a comma separated key list such as `pair,period_of_day`.
    pub fn parse_list(s: &str) -> Result<Vec<GroupBy>> {
        let keys = s
            .split(',')
            .filter(|part| !part.trim().is_empty())
            .map(|part| {
                GroupBy::from_str(part)
                    .ok_or_else(|| DashboardError::InvalidParameter(format!("unknown group key '{}'", part.trim())))
            })
            .collect::<Result<Vec<_>>>()?;

        if keys.is_empty() {
            return Err(DashboardError::InvalidParameter("group_by is empty".to_string()));
        }
        Ok(keys)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum GroupValue {
    Hour(u32),
    Day(DayOfWeek),
    Period(PeriodOfDay),
    Pair(String),
    Date(NaiveDate),
}

impl fmt::Display for GroupValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupValue::Hour(h) => write!(f, "{}", h),
            GroupValue::Day(d) => write!(f, "{}", d),
            GroupValue::Period(p) => write!(f, "{}", p),
            GroupValue::Pair(p) => write!(f, "{}", p),
            GroupValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupMetrics {
    pub key: Vec<GroupValue>,
    pub label: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub hit_rate_without_delta: Decimal,
    pub total_without_delta: u64,
    #[serde(with = "rust_decimal::serde::float")]
    pub hit_rate_with_delta: Decimal,
    pub total_with_delta: u64,
}

impl GroupMetrics {
    pub fn hit_rate(&self, column: HitColumn) -> Decimal {
        match column {
            HitColumn::WithoutDelta => self.hit_rate_without_delta,
            HitColumn::WithDelta => self.hit_rate_with_delta,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OverallMetrics {
    pub total_predictions: u64,
    pub hits_without_delta: u64,
    pub hits_with_delta: u64,
    #[serde(with = "rust_decimal::serde::float")]
    pub hit_rate_without_delta: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub hit_rate_with_delta: Decimal,
}

/// Percentage of hits; zero for an empty group.
pub fn hit_rate(hits: u64, total: u64) -> Decimal {
    if total == 0 {
        Decimal::ZERO
    } else {
        Decimal::from(hits) / Decimal::from(total) * dec!(100)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Tally {
    pub total: u64,
    pub hits_without_delta: u64,
    pub hits_with_delta: u64,
}

impl Tally {
    pub fn add(&mut self, record: &PredictionRecord) {
        self.total += 1;
        if record.hit_without_delta {
            self.hits_without_delta += 1;
        }
        if record.hit_with_delta {
            self.hits_with_delta += 1;
        }
    }

    pub fn rate(&self, column: HitColumn) -> Decimal {
        match column {
            HitColumn::WithoutDelta => hit_rate(self.hits_without_delta, self.total),
            HitColumn::WithDelta => hit_rate(self.hits_with_delta, self.total),
        }
    }
}

/// Hit rate and count per distinct key, sorted by key. Every record lands in exactly one group.
pub fn calculate_metrics(records: &[&PredictionRecord], group_by: &[GroupBy]) -> Vec<GroupMetrics> {
    let mut groups: BTreeMap<Vec<GroupValue>, Tally> = BTreeMap::new();

    for record in records {
        let key: Vec<GroupValue> = group_by.iter().map(|g| g.key(record)).collect();
        groups.entry(key).or_default().add(record);
    }

    groups
        .into_iter()
        .map(|(key, tally)| {
            let label = if key.is_empty() {
                "all".to_string()
            } else {
                key.iter().map(|k| k.to_string()).collect::<Vec<_>>().join("_")
            };
            GroupMetrics {
                label,
                key,
                hit_rate_without_delta: tally.rate(HitColumn::WithoutDelta),
                total_without_delta: tally.total,
                hit_rate_with_delta: tally.rate(HitColumn::WithDelta),
                total_with_delta: tally.total,
            }
        })
        .collect()
}

pub fn overall_metrics(records: &[&PredictionRecord]) -> OverallMetrics {
    let mut tally = Tally::default();
    for record in records {
        tally.add(record);
    }

    OverallMetrics {
        total_predictions: tally.total,
        hits_without_delta: tally.hits_without_delta,
        hits_with_delta: tally.hits_with_delta,
        hit_rate_without_delta: tally.rate(HitColumn::WithoutDelta),
        hit_rate_with_delta: tally.rate(HitColumn::WithDelta),
    }
}
