pub mod export;
pub mod filter;
pub mod loader;

pub use export::*;
pub use filter::*;
pub use loader::*;

use chrono::NaiveDateTime;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::info;

use crate::error::Result;
use crate::types::{DayOfWeek, PredictionRecord};

/// The prediction table. Loaded once; every analysis works on borrowed views of it.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<PredictionRecord>,
}

impl Dataset {
    /// Takes rows in source order and fills the row-to-row derived fields.
    pub fn new(mut records: Vec<PredictionRecord>) -> Self {
        for i in 1..records.len() {
            let movement = (records[i].actual_value - records[i - 1].actual_value).abs();
            records[i].movement_magnitude = Some(movement);
        }
        if let Some(first) = records.first_mut() {
            first.movement_magnitude = None;
        }
        Self { records }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let dataset = Self::new(read_records_from_path(path.as_ref())?);
        info!(
            "Loaded {} predictions across {} pairs",
            dataset.len(),
            dataset.pairs().len()
        );
        Ok(dataset)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn filter(&self, filter: &RecordFilter) -> Vec<&PredictionRecord> {
        self.records.iter().filter(|r| filter.matches(r)).collect()
    }

    /// Distinct pairs in order of first appearance.
    pub fn pairs(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        self.records
            .iter()
            .filter(|r| seen.insert(r.pair.as_str()))
            .map(|r| r.pair.clone())
            .collect()
    }

    pub fn days(&self) -> Vec<DayOfWeek> {
        self.records
            .iter()
            .map(|r| r.day_of_week)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn time_range(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let min = self.records.iter().map(|r| r.timestamp).min()?;
        let max = self.records.iter().map(|r| r.timestamp).max()?;
        Some((min, max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::fixtures::{record, ts};
    use rust_decimal_macros::dec;

    fn sample() -> Dataset {
        let mut a = record(ts(1, 9, 0), "EURUSD", true, true);
        a.actual_value = dec!(1.1000);
        let mut b = record(ts(1, 9, 15), "GBPUSD", false, true);
        b.actual_value = dec!(1.0950);
        let mut c = record(ts(2, 14, 0), "EURUSD", true, false);
        c.actual_value = dec!(1.1010);
        let d = record(ts(5, 20, 0), "USDJPY", false, false);
        Dataset::new(vec![a, b, c, d])
    }

    #[test]
    fn test_movement_magnitude() {
        let dataset = sample();
        let records = &dataset.records;
        assert_eq!(records[0].movement_magnitude, None);
        assert_eq!(records[1].movement_magnitude, Some(dec!(0.0050)));
        assert_eq!(records[2].movement_magnitude, Some(dec!(0.0060)));
    }

    #[test]
    fn test_options() {
        let dataset = sample();
        assert_eq!(dataset.pairs(), vec!["EURUSD", "GBPUSD", "USDJPY"]);
        assert_eq!(
            dataset.days(),
            vec![DayOfWeek::Monday, DayOfWeek::Tuesday, DayOfWeek::Friday]
        );
        assert_eq!(dataset.time_range(), Some((ts(1, 9, 0), ts(5, 20, 0))));
        assert_eq!(Dataset::default().time_range(), None);
    }

    #[test]
    fn test_filter_and_export_row_count() {
        let dataset = sample();
        let filter = RecordFilter::from_params(Some("EURUSD"), Some("2024-01-01"), Some("2024-01-02"), None).unwrap();
        let view = dataset.filter(&filter);

        assert_eq!(view.len(), 2);
        assert!(view.iter().all(|r| r.pair == "EURUSD"));
        assert!(view.iter().all(|r| r.timestamp >= ts(1, 0, 0) && r.timestamp < ts(3, 0, 0)));

        let csv = String::from_utf8(to_csv_bytes(&view).unwrap()).unwrap();
        assert_eq!(csv.lines().count() - 1, view.len());
        // filtering never touches the source
        assert_eq!(dataset.len(), 4);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dados.csv");
        std::fs::write(
            &path,
            "timestamp,valor_real,previsao,previsao_com_delta,direcao_real,direcao_prevista,par,acerto_sem_delta,acerto_com_delta\n\
             2024-01-01 10:00:00,1.10,1.09,1.095,up,up,EURUSD,True,True\n\
             2024-01-01 10:15:00,1.12,1.13,1.125,up,down,EURUSD,False,True\n",
        )
        .unwrap();

        let dataset = Dataset::load(&path).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.records[1].movement_magnitude, Some(dec!(0.02)));
        assert!(Dataset::load(dir.path().join("missing.csv")).is_err());
    }
}
