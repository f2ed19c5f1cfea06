use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    pub fn as_str(&self) -> &'static str {
        match self {
            DayOfWeek::Monday => "Monday",
            DayOfWeek::Tuesday => "Tuesday",
            DayOfWeek::Wednesday => "Wednesday",
            DayOfWeek::Thursday => "Thursday",
            DayOfWeek::Friday => "Friday",
            DayOfWeek::Saturday => "Saturday",
            DayOfWeek::Sunday => "Sunday",
        }
    }

    pub fn all() -> Vec<DayOfWeek> {
        vec![
            DayOfWeek::Monday,
            DayOfWeek::Tuesday,
            DayOfWeek::Wednesday,
            DayOfWeek::Thursday,
            DayOfWeek::Friday,
            DayOfWeek::Saturday,
            DayOfWeek::Sunday,
        ]
    }

    /// Accepts full English names and three-letter abbreviations, case-insensitive.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "monday" | "mon" => Some(DayOfWeek::Monday),
            "tuesday" | "tue" => Some(DayOfWeek::Tuesday),
            "wednesday" | "wed" => Some(DayOfWeek::Wednesday),
            "thursday" | "thu" => Some(DayOfWeek::Thursday),
            "friday" | "fri" => Some(DayOfWeek::Friday),
            "saturday" | "sat" => Some(DayOfWeek::Saturday),
            "sunday" | "sun" => Some(DayOfWeek::Sunday),
            _ => None,
        }
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Mon => DayOfWeek::Monday,
            Weekday::Tue => DayOfWeek::Tuesday,
            Weekday::Wed => DayOfWeek::Wednesday,
            Weekday::Thu => DayOfWeek::Thursday,
            Weekday::Fri => DayOfWeek::Friday,
            Weekday::Sat => DayOfWeek::Saturday,
            Weekday::Sun => DayOfWeek::Sunday,
        }
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Coarse time-of-day bucket. Bins are left-closed: [0,6), [6,12), [12,18), [18,24).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PeriodOfDay {
    Night,
    Morning,
    Afternoon,
    Evening,
}

impl PeriodOfDay {
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            0..=5 => PeriodOfDay::Night,
            6..=11 => PeriodOfDay::Morning,
            12..=17 => PeriodOfDay::Afternoon,
            _ => PeriodOfDay::Evening,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodOfDay::Night => "Night",
            PeriodOfDay::Morning => "Morning",
            PeriodOfDay::Afternoon => "Afternoon",
            PeriodOfDay::Evening => "Evening",
        }
    }
}

impl fmt::Display for PeriodOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Calendar fields derived from a record timestamp.
pub fn calendar_fields(timestamp: &NaiveDateTime) -> (u32, DayOfWeek, PeriodOfDay) {
    let hour = timestamp.hour();
    (hour, timestamp.weekday().into(), PeriodOfDay::from_hour(hour))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_period_boundaries() {
        assert_eq!(PeriodOfDay::from_hour(0), PeriodOfDay::Night);
        assert_eq!(PeriodOfDay::from_hour(5), PeriodOfDay::Night);
        assert_eq!(PeriodOfDay::from_hour(6), PeriodOfDay::Morning);
        assert_eq!(PeriodOfDay::from_hour(12), PeriodOfDay::Afternoon);
        assert_eq!(PeriodOfDay::from_hour(17), PeriodOfDay::Afternoon);
        assert_eq!(PeriodOfDay::from_hour(18), PeriodOfDay::Evening);
        assert_eq!(PeriodOfDay::from_hour(23), PeriodOfDay::Evening);
    }

    #[test]
    fn test_day_parsing() {
        assert_eq!(DayOfWeek::from_str("Monday"), Some(DayOfWeek::Monday));
        assert_eq!(DayOfWeek::from_str("sun"), Some(DayOfWeek::Sunday));
        assert_eq!(DayOfWeek::from_str("Todos"), None);
    }

    #[test]
    fn test_calendar_fields() {
        // 2024-01-03 was a Wednesday
        let ts = NaiveDate::from_ymd_opt(2024, 1, 3)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap();
        let (hour, day, period) = calendar_fields(&ts);
        assert_eq!(hour, 14);
        assert_eq!(day, DayOfWeek::Wednesday);
        assert_eq!(period, PeriodOfDay::Afternoon);
    }
}
