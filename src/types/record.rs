use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{calendar_fields, DayOfWeek, PeriodOfDay};

/// One prediction row. Derived fields are filled once at load and never change.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionRecord {
    pub timestamp: NaiveDateTime,
    pub actual_value: Decimal,
    pub predicted_value: Decimal,
    pub predicted_value_with_delta: Decimal,
    pub actual_direction: String,
    pub predicted_direction: String,
    pub pair: String,
    pub hit_without_delta: bool,
    pub hit_with_delta: bool,

    pub hour: u32,
    pub day_of_week: DayOfWeek,
    pub period_of_day: PeriodOfDay,
    pub prediction_error: Decimal,
    pub prediction_error_with_delta: Decimal,
    pub movement_magnitude: Option<Decimal>,
}

impl PredictionRecord {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        timestamp: NaiveDateTime,
        actual_value: Decimal,
        predicted_value: Decimal,
        predicted_value_with_delta: Decimal,
        actual_direction: String,
        predicted_direction: String,
        pair: String,
        hit_without_delta: bool,
        hit_with_delta: bool,
    ) -> Self {
        let (hour, day_of_week, period_of_day) = calendar_fields(&timestamp);
        Self {
            timestamp,
            actual_value,
            predicted_value,
            predicted_value_with_delta,
            actual_direction,
            predicted_direction,
            pair,
            hit_without_delta,
            hit_with_delta,
            hour,
            day_of_week,
            period_of_day,
            prediction_error: actual_value - predicted_value,
            prediction_error_with_delta: actual_value - predicted_value_with_delta,
            movement_magnitude: None,
        }
    }

    pub fn is_hit(&self, column: HitColumn) -> bool {
        match column {
            HitColumn::WithoutDelta => self.hit_without_delta,
            HitColumn::WithDelta => self.hit_with_delta,
        }
    }

    pub fn error(&self, column: HitColumn) -> Decimal {
        match column {
            HitColumn::WithoutDelta => self.prediction_error,
            HitColumn::WithDelta => self.prediction_error_with_delta,
        }
    }

    pub fn abs_error(&self, column: HitColumn) -> Decimal {
        self.error(column).abs()
    }
}

/// Which hit flag (and matching error column) an analysis runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HitColumn {
    #[default]
    #[serde(alias = "acerto_sem_delta")]
    WithoutDelta,
    #[serde(alias = "acerto_com_delta")]
    WithDelta,
}

impl HitColumn {
    pub fn as_str(&self) -> &'static str {
        match self {
            HitColumn::WithoutDelta => "without_delta",
            HitColumn::WithDelta => "with_delta",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            HitColumn::WithoutDelta => "Without Delta",
            HitColumn::WithDelta => "With Delta",
        }
    }

    pub fn all() -> [HitColumn; 2] {
        [HitColumn::WithoutDelta, HitColumn::WithDelta]
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "without_delta" | "acerto_sem_delta" => Some(HitColumn::WithoutDelta),
            "with_delta" | "acerto_com_delta" => Some(HitColumn::WithDelta),
            _ => None,
        }
    }
}

impl fmt::Display for HitColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Hit,
    Miss,
}

impl Outcome {
    pub fn from_hit(hit: bool) -> Self {
        if hit {
            Outcome::Hit
        } else {
            Outcome::Miss
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Hit => "Hit",
            Outcome::Miss => "Miss",
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    pub fn ts(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    pub fn record(timestamp: NaiveDateTime, pair: &str, hit: bool, hit_with_delta: bool) -> PredictionRecord {
        PredictionRecord::new(
            timestamp,
            dec!(1.1000),
            dec!(1.0990),
            dec!(1.0995),
            "up".to_string(),
            "up".to_string(),
            pair.to_string(),
            hit,
            hit_with_delta,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_derived_fields() {
        let r = record(ts(1, 7, 15), "EURUSD", true, false);
        assert_eq!(r.hour, 7);
        assert_eq!(r.day_of_week, DayOfWeek::Monday);
        assert_eq!(r.period_of_day, PeriodOfDay::Morning);
        assert_eq!(r.prediction_error, dec!(0.0010));
        assert_eq!(r.prediction_error_with_delta, dec!(0.0005));
        assert!(r.movement_magnitude.is_none());
    }

    #[test]
    fn test_hit_column_selection() {
        let r = record(ts(1, 0, 0), "EURUSD", true, false);
        assert!(r.is_hit(HitColumn::WithoutDelta));
        assert!(!r.is_hit(HitColumn::WithDelta));
        assert_eq!(HitColumn::from_str("acerto_com_delta"), Some(HitColumn::WithDelta));
        assert_eq!(HitColumn::from_str("nope"), None);
    }
}
