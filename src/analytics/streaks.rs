use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use super::metrics::{GroupBy, GroupValue};
use super::sorted_by_time;
use crate::types::{HitColumn, Outcome, PredictionRecord};

/// A maximal run of equal outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Streak {
    pub outcome: Outcome,
    pub length: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreakFrequency {
    pub outcome: Outcome,
    pub length: usize,
    pub frequency: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct StreakSummary {
    pub current_streak: i64, // Positive for hits, negative for misses
    pub max_hit_streak: usize,
    pub max_miss_streak: usize,
    pub avg_hit_streak: Decimal,
    pub avg_miss_streak: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SequenceCount {
    pub key: GroupValue,
    pub sequences: usize,
}

/// Splits a boolean sequence into maximal runs. Run lengths sum to the input length.
pub fn streaks<I>(values: I) -> Vec<Streak>
where
    I: IntoIterator<Item = bool>,
{
    let mut runs: Vec<Streak> = Vec::new();

    for value in values {
        let outcome = Outcome::from_hit(value);
        match runs.last_mut() {
            Some(run) if run.outcome == outcome => run.length += 1,
            _ => runs.push(Streak { outcome, length: 1 }),
        }
    }

    runs
}

/// Runs of one hit column over the view, in timestamp order.
pub fn record_streaks(records: &[&PredictionRecord], column: HitColumn) -> Vec<Streak> {
    streaks(sorted_by_time(records).iter().map(|r| r.is_hit(column)))
}

/// How often each (outcome, length) run occurs.
pub fn streak_histogram(runs: &[Streak]) -> Vec<StreakFrequency> {
    let mut counts: BTreeMap<(Outcome, usize), usize> = BTreeMap::new();
    for run in runs {
        *counts.entry((run.outcome, run.length)).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .map(|((outcome, length), frequency)| StreakFrequency {
            outcome,
            length,
            frequency,
        })
        .collect()
}

pub fn summarize(runs: &[Streak]) -> StreakSummary {
    let lengths = |outcome: Outcome| -> Vec<usize> {
        runs.iter()
            .filter(|r| r.outcome == outcome)
            .map(|r| r.length)
            .collect()
    };
    let average = |values: &[usize]| -> Decimal {
        if values.is_empty() {
            Decimal::ZERO
        } else {
            Decimal::from(values.iter().sum::<usize>()) / Decimal::from(values.len())
        }
    };

    let hits = lengths(Outcome::Hit);
    let misses = lengths(Outcome::Miss);

    let current_streak = match runs.last() {
        Some(Streak { outcome: Outcome::Hit, length }) => *length as i64,
        Some(Streak { outcome: Outcome::Miss, length }) => -(*length as i64),
        None => 0,
    };

    StreakSummary {
        current_streak,
        max_hit_streak: hits.iter().copied().max().unwrap_or(0),
        max_miss_streak: misses.iter().copied().max().unwrap_or(0),
        avg_hit_streak: average(&hits),
        avg_miss_streak: average(&misses),
    }
}

/// Per group, the number of hit runs at least `min_length` long. Groups without any still appear.
pub fn count_hit_sequences_by(
    records: &[&PredictionRecord],
    group_by: GroupBy,
    column: HitColumn,
    min_length: usize,
) -> Vec<SequenceCount> {
    let mut groups: BTreeMap<GroupValue, Vec<bool>> = BTreeMap::new();
    for record in sorted_by_time(records) {
        groups
            .entry(group_by.key(record))
            .or_insert_with(Vec::new)
            .push(record.is_hit(column));
    }

    groups
        .into_iter()
        .map(|(key, values)| {
            let sequences = streaks(values)
                .iter()
                .filter(|run| run.outcome == Outcome::Hit && run.length >= min_length)
                .count();
            SequenceCount { key, sequences }
        })
        .collect()
}
