pub mod buckets;
pub mod intervals;
pub mod metrics;
pub mod stats;
pub mod streaks;

pub use buckets::*;
pub use intervals::{hit_intervals, IntervalPolicy};
pub use metrics::*;
pub use stats::*;
pub use streaks::{count_hit_sequences_by, record_streaks, streak_histogram};

use crate::types::PredictionRecord;

/// Stable sort of a view by timestamp. Rows sharing a timestamp keep their source order.
pub fn sorted_by_time<'a>(records: &[&'a PredictionRecord]) -> Vec<&'a PredictionRecord> {
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
    sorted
}
