use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::sorted_by_time;
use crate::types::{HitColumn, PredictionRecord};

/// Which intervals between hits are kept.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntervalPolicy {
    /// Drop zero and negative gaps (duplicate or out-of-order timestamps).
    pub positive_only: bool,
    /// Drop gaps above this many minutes.
    pub max_minutes: Option<f64>,
}

impl Default for IntervalPolicy {
    fn default() -> Self {
        Self {
            positive_only: true,
            max_minutes: None,
        }
    }
}

impl IntervalPolicy {
    pub fn accepts(&self, minutes: f64) -> bool {
        if self.positive_only && minutes <= 0.0 {
            return false;
        }
        match self.max_minutes {
            Some(max) => minutes <= max,
            None => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HitInterval {
    /// Timestamp of the hit that closes the interval.
    pub timestamp: NaiveDateTime,
    pub minutes: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntervalSummary {
    pub count: usize,
    pub mean_minutes: Option<f64>,
    pub median_minutes: Option<f64>,
    pub max_minutes: Option<f64>,
}

/// Minutes between consecutive hits. The first hit opens no interval.
pub fn hit_intervals(
    records: &[&PredictionRecord],
    column: HitColumn,
    policy: &IntervalPolicy,
) -> Vec<HitInterval> {
    let hits: Vec<NaiveDateTime> = sorted_by_time(records)
        .iter()
        .filter(|r| r.is_hit(column))
        .map(|r| r.timestamp)
        .collect();

    hits.windows(2)
        .map(|pair| HitInterval {
            timestamp: pair[1],
            minutes: (pair[1] - pair[0]).num_milliseconds() as f64 / 60_000.0,
        })
        .filter(|interval| policy.accepts(interval.minutes))
        .collect()
}

pub fn summarize(intervals: &[HitInterval]) -> IntervalSummary {
    if intervals.is_empty() {
        return IntervalSummary {
            count: 0,
            mean_minutes: None,
            median_minutes: None,
            max_minutes: None,
        };
    }

    let mut minutes: Vec<f64> = intervals.iter().map(|i| i.minutes).collect();
    minutes.sort_by(|a, b| a.total_cmp(b));

    let n = minutes.len();
    let median = if n % 2 == 0 {
        (minutes[n / 2 - 1] + minutes[n / 2]) / 2.0
    } else {
        minutes[n / 2]
    };

    IntervalSummary {
        count: n,
        mean_minutes: Some(minutes.iter().sum::<f64>() / n as f64),
        median_minutes: Some(median),
        max_minutes: minutes.last().copied(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::fixtures::{record, ts};

    fn sample() -> Vec<PredictionRecord> {
        vec![
            record(ts(1, 9, 0), "EURUSD", true, true),
            record(ts(1, 9, 15), "EURUSD", false, true),
            record(ts(1, 9, 45), "EURUSD", true, true),
            record(ts(1, 9, 45), "GBPUSD", true, false),
            record(ts(1, 12, 45), "EURUSD", true, false),
        ]
    }

    #[test]
    fn test_intervals_between_hits() {
        let rows = sample();
        let view: Vec<&PredictionRecord> = rows.iter().collect();

        let raw = hit_intervals(&view, HitColumn::WithoutDelta, &IntervalPolicy { positive_only: false, max_minutes: None });
        let minutes: Vec<f64> = raw.iter().map(|i| i.minutes).collect();
        assert_eq!(minutes, vec![45.0, 0.0, 180.0]);
        assert_eq!(raw[0].timestamp, ts(1, 9, 45));

        let positive = hit_intervals(&view, HitColumn::WithoutDelta, &IntervalPolicy::default());
        assert_eq!(positive.len(), 2);
        assert!(positive.iter().all(|i| i.minutes > 0.0));
    }

    #[test]
    fn test_ceiling() {
        let rows = sample();
        let view: Vec<&PredictionRecord> = rows.iter().collect();
        let policy = IntervalPolicy {
            positive_only: true,
            max_minutes: Some(60.0),
        };
        let kept = hit_intervals(&view, HitColumn::WithoutDelta, &policy);
        assert_eq!(kept.iter().map(|i| i.minutes).collect::<Vec<_>>(), vec![45.0]);
    }

    #[test]
    fn test_fewer_than_two_hits() {
        let rows = vec![record(ts(1, 9, 0), "EURUSD", true, false)];
        let view: Vec<&PredictionRecord> = rows.iter().collect();
        assert!(hit_intervals(&view, HitColumn::WithoutDelta, &IntervalPolicy::default()).is_empty());
        assert!(hit_intervals(&[], HitColumn::WithDelta, &IntervalPolicy::default()).is_empty());
    }

    #[test]
    fn test_summary() {
        let rows = sample();
        let view: Vec<&PredictionRecord> = rows.iter().collect();
        let intervals = hit_intervals(&view, HitColumn::WithDelta, &IntervalPolicy::default());
        // with-delta hits at 9:00, 9:15, 9:45
        let summary = summarize(&intervals);
        assert_eq!(summary.count, 2);
        assert_eq!(summary.mean_minutes, Some(22.5));
        assert_eq!(summary.median_minutes, Some(22.5));
        assert_eq!(summary.max_minutes, Some(30.0));
        assert_eq!(summarize(&[]).mean_minutes, None);
    }
}
