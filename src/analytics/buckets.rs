use chrono::{DateTime, Duration, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use super::metrics::Tally;
use crate::error::{DashboardError, Result};
use crate::types::{HitColumn, PredictionRecord};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WindowCount {
    pub window_start: NaiveDateTime,
    pub hits: u64,
}

/// Floors a timestamp to an epoch-aligned window boundary.
pub fn window_start(timestamp: NaiveDateTime, window_secs: i64) -> Option<NaiveDateTime> {
    if window_secs <= 0 {
        return None;
    }
    let secs = timestamp.and_utc().timestamp();
    let floored = secs - secs.rem_euclid(window_secs);
    DateTime::from_timestamp(floored, 0).map(|dt| dt.naive_utc())
}

/// Hit count per fixed window, ascending. Windows without hits are not emitted.
pub fn hits_per_window(
    records: &[&PredictionRecord],
    column: HitColumn,
    window: Duration,
) -> Result<Vec<WindowCount>> {
    let window_secs = window.num_seconds();
    if window_secs <= 0 {
        return Err(DashboardError::InvalidParameter(format!(
            "window must be positive, got {}s",
            window_secs
        )));
    }

    let mut counts: BTreeMap<NaiveDateTime, u64> = BTreeMap::new();
    for record in records.iter().filter(|r| r.is_hit(column)) {
        if let Some(start) = window_start(record.timestamp, window_secs) {
            *counts.entry(start).or_insert(0) += 1;
        }
    }

    Ok(counts
        .into_iter()
        .map(|(window_start, hits)| WindowCount { window_start, hits })
        .collect())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuantileBin {
    pub lower: f64,
    pub upper: f64,
    pub label: String,
}

/// Equal-frequency bins. The first bin is closed on both sides, the rest are `(lower, upper]`.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantileBins {
    edges: Vec<f64>,
}

impl QuantileBins {
    /// Returns `None` when the values cannot produce two distinct edges.
    pub fn compute(values: &[f64], q: usize) -> Option<Self> {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if sorted.is_empty() || q == 0 {
            return None;
        }
        sorted.sort_by(|a, b| a.total_cmp(b));

        let mut edges: Vec<f64> = (0..=q)
            .map(|i| quantile(&sorted, i as f64 / q as f64))
            .collect();
        edges.dedup();

        if edges.len() < 2 {
            return None;
        }
        Some(Self { edges })
    }

    pub fn len(&self) -> usize {
        self.edges.len() - 1
    }

    pub fn assign(&self, value: f64) -> Option<usize> {
        let first = *self.edges.first()?;
        let last = *self.edges.last()?;
        if !value.is_finite() || value < first || value > last {
            return None;
        }
        (0..self.len()).find(|&i| value <= self.edges[i + 1])
    }

    pub fn bins(&self) -> Vec<QuantileBin> {
        self.edges
            .windows(2)
            .enumerate()
            .map(|(i, w)| {
                let open = if i == 0 { '[' } else { '(' };
                QuantileBin {
                    lower: w[0],
                    upper: w[1],
                    label: format!("{}{:.4}, {:.4}]", open, w[0], w[1]),
                }
            })
            .collect()
    }
}

/// Linear interpolation between closest ranks. `sorted` must be non-empty and ascending.
fn quantile(sorted: &[f64], p: f64) -> f64 {
    let pos = p * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

#[derive(Debug, Clone, Serialize)]
pub struct BinMetrics {
    pub bin: QuantileBin,
    pub count: u64,
    #[serde(with = "rust_decimal::serde::float")]
    pub hit_rate_without_delta: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub hit_rate_with_delta: Decimal,
}

impl BinMetrics {
    pub fn hit_rate(&self, column: HitColumn) -> Decimal {
        match column {
            HitColumn::WithoutDelta => self.hit_rate_without_delta,
            HitColumn::WithDelta => self.hit_rate_with_delta,
        }
    }
}

/// Hit rates per quantile bin of `value`. Records without a value are left out.
/// Degenerate binning yields an empty result.
pub fn hit_rate_by_quantile<F>(records: &[&PredictionRecord], q: usize, value: F) -> Vec<BinMetrics>
where
    F: Fn(&PredictionRecord) -> Option<f64>,
{
    let values: Vec<(usize, f64)> = records
        .iter()
        .enumerate()
        .filter_map(|(i, r)| value(r).map(|v| (i, v)))
        .collect();

    let raw: Vec<f64> = values.iter().map(|(_, v)| *v).collect();
    let Some(bins) = QuantileBins::compute(&raw, q) else {
        return Vec::new();
    };

    let mut tallies = vec![Tally::default(); bins.len()];
    for (i, v) in &values {
        if let Some(bin) = bins.assign(*v) {
            tallies[bin].add(records[*i]);
        }
    }

    bins.bins()
        .into_iter()
        .zip(tallies)
        .filter(|(_, tally)| tally.total > 0)
        .map(|(bin, tally)| BinMetrics {
            bin,
            count: tally.total,
            hit_rate_without_delta: tally.rate(HitColumn::WithoutDelta),
            hit_rate_with_delta: tally.rate(HitColumn::WithDelta),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::fixtures::{record, ts};
    use rust_decimal_macros::dec;

    #[test]
    fn test_window_floor() {
        assert_eq!(window_start(ts(1, 9, 14), 900), Some(ts(1, 9, 0)));
        assert_eq!(window_start(ts(1, 9, 15), 900), Some(ts(1, 9, 15)));
        assert_eq!(window_start(ts(1, 9, 59), 900), Some(ts(1, 9, 45)));
        assert_eq!(window_start(ts(1, 9, 59), 0), None);
    }

    #[test]
    fn test_hits_per_window() {
        let rows = vec![
            record(ts(1, 9, 1), "EURUSD", true, false),
            record(ts(1, 9, 7), "EURUSD", true, false),
            record(ts(1, 9, 10), "EURUSD", false, false),
            record(ts(1, 9, 20), "EURUSD", true, false),
            record(ts(1, 10, 5), "EURUSD", true, false),
        ];
        let view: Vec<&PredictionRecord> = rows.iter().collect();
        let windows = hits_per_window(&view, HitColumn::WithoutDelta, Duration::minutes(15)).unwrap();

        assert_eq!(
            windows,
            vec![
                WindowCount { window_start: ts(1, 9, 0), hits: 2 },
                WindowCount { window_start: ts(1, 9, 15), hits: 1 },
                WindowCount { window_start: ts(1, 10, 0), hits: 1 },
            ]
        );
        assert!(hits_per_window(&view, HitColumn::WithDelta, Duration::minutes(15))
            .unwrap()
            .is_empty());
        assert!(hits_per_window(&view, HitColumn::WithDelta, Duration::zero()).is_err());
    }

    #[test]
    fn test_quartile_edges() {
        let bins = QuantileBins::compute(&[1.0, 2.0, 3.0, 4.0, 5.0], 4).unwrap();
        let edges: Vec<(f64, f64)> = bins.bins().iter().map(|b| (b.lower, b.upper)).collect();
        assert_eq!(edges, vec![(1.0, 2.0), (2.0, 3.0), (3.0, 4.0), (4.0, 5.0)]);

        assert_eq!(bins.assign(1.0), Some(0));
        assert_eq!(bins.assign(2.0), Some(0));
        assert_eq!(bins.assign(2.5), Some(1));
        assert_eq!(bins.assign(5.0), Some(3));
        assert_eq!(bins.assign(6.0), None);
        assert_eq!(bins.bins()[0].label, "[1.0000, 2.0000]");
        assert_eq!(bins.bins()[1].label, "(2.0000, 3.0000]");
    }

    #[test]
    fn test_duplicate_edges_dropped() {
        let bins = QuantileBins::compute(&[0.0, 0.0, 0.0, 0.0, 1.0], 4).unwrap();
        assert_eq!(bins.len(), 1);
        assert!(QuantileBins::compute(&[2.0, 2.0, 2.0], 4).is_none());
        assert!(QuantileBins::compute(&[], 4).is_none());
    }

    #[test]
    fn test_hit_rate_by_quantile() {
        let mut rows = Vec::new();
        for (i, hit) in [true, true, false, false].iter().enumerate() {
            let mut r = record(ts(1, 9, i as u32), "EURUSD", *hit, true);
            r.movement_magnitude = Some(Decimal::from(i as u32 + 1));
            rows.push(r);
        }
        let view: Vec<&PredictionRecord> = rows.iter().collect();
        let metrics = hit_rate_by_quantile(&view, 2, |r| {
            r.movement_magnitude.and_then(|m| rust_decimal::prelude::ToPrimitive::to_f64(&m))
        });

        // edges 1.0, 2.5, 4.0
        assert_eq!(metrics.len(), 2);
        assert_eq!(metrics[0].count, 2);
        assert_eq!(metrics[0].hit_rate_without_delta, dec!(100));
        assert_eq!(metrics[1].hit_rate_without_delta, Decimal::ZERO);
        assert_eq!(metrics[1].hit_rate_with_delta, dec!(100));
        assert_eq!(metrics.iter().map(|m| m.count).sum::<u64>(), 4);
    }
}
