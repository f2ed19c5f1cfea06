use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

use super::loader::parse_timestamp;
use crate::error::{DashboardError, Result};
use crate::types::{DayOfWeek, PredictionRecord};

/// Dropdown values that mean "no restriction".
const ALL_SENTINELS: [&str; 3] = ["", "todos", "all"];

fn is_all(value: &str) -> bool {
    ALL_SENTINELS.contains(&value.trim().to_lowercase().as_str())
}

/// Restricts a view by pair, inclusive timestamp range and day of week.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecordFilter {
    pub pair: Option<String>,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub day: Option<DayOfWeek>,
}

impl RecordFilter {
    /// Builds a filter from raw UI values.
    ///
    /// A date-only end bound covers the whole day: `2024-01-02` keeps rows up to
    /// 23:59:59.999999999 on that date instead of cutting off at its midnight.
    pub fn from_params(
        pair: Option<&str>,
        start: Option<&str>,
        end: Option<&str>,
        day: Option<&str>,
    ) -> Result<Self> {
        let pair = pair.filter(|p| !is_all(p)).map(|p| p.trim().to_string());

        let start_of_day = NaiveTime::from_hms_opt(0, 0, 0).unwrap_or_default();
        let start = start
            .filter(|s| !s.trim().is_empty())
            .map(|s| parse_bound(s, start_of_day))
            .transpose()?;

        let end_of_day = NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999).unwrap_or_default();
        let end = end
            .filter(|s| !s.trim().is_empty())
            .map(|s| parse_bound(s, end_of_day))
            .transpose()?;

        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Err(DashboardError::InvalidFilter(format!(
                    "start {} is after end {}",
                    s, e
                )));
            }
        }

        let day = match day.filter(|d| !is_all(d)) {
            Some(d) => Some(
                DayOfWeek::from_str(d)
                    .ok_or_else(|| DashboardError::InvalidFilter(format!("unknown day '{}'", d)))?,
            ),
            None => None,
        };

        Ok(Self { pair, start, end, day })
    }

    pub fn matches(&self, record: &PredictionRecord) -> bool {
        if let Some(pair) = &self.pair {
            if &record.pair != pair {
                return false;
            }
        }
        if let Some(start) = self.start {
            if record.timestamp < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if record.timestamp > end {
                return false;
            }
        }
        if let Some(day) = self.day {
            if record.day_of_week != day {
                return false;
            }
        }
        true
    }
}

fn parse_bound(value: &str, time_of_day: NaiveTime) -> Result<NaiveDateTime> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date.and_time(time_of_day));
    }
    parse_timestamp(value).map_err(|_| DashboardError::InvalidFilter(format!("bad date '{}'", value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::fixtures::{record, ts};

    #[test]
    fn test_all_sentinels() {
        let filter = RecordFilter::from_params(Some("Todos"), None, Some(""), Some("all")).unwrap();
        assert_eq!(filter, RecordFilter::default());
    }

    #[test]
    fn test_date_only_end_is_inclusive() {
        let filter = RecordFilter::from_params(None, Some("2024-01-02"), Some("2024-01-02"), None).unwrap();
        assert!(filter.matches(&record(ts(2, 0, 0), "EURUSD", true, true)));
        assert!(filter.matches(&record(ts(2, 23, 45), "EURUSD", true, true)));
        assert!(!filter.matches(&record(ts(1, 23, 59), "EURUSD", true, true)));
        assert!(!filter.matches(&record(ts(3, 0, 0), "EURUSD", true, true)));
    }

    #[test]
    fn test_pair_and_day() {
        let filter = RecordFilter::from_params(Some("EURUSD"), None, None, Some("Monday")).unwrap();
        // 2024-01-01 was a Monday
        assert!(filter.matches(&record(ts(1, 9, 0), "EURUSD", true, true)));
        assert!(!filter.matches(&record(ts(1, 9, 0), "GBPUSD", true, true)));
        assert!(!filter.matches(&record(ts(2, 9, 0), "EURUSD", true, true)));
    }

    #[test]
    fn test_invalid_params() {
        assert!(RecordFilter::from_params(None, None, None, Some("Funday")).is_err());
        assert!(RecordFilter::from_params(None, Some("soon"), None, None).is_err());
        assert!(RecordFilter::from_params(None, Some("2024-02-01"), Some("2024-01-01"), None).is_err());
    }
}
