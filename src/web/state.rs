use std::sync::Arc;

use crate::config::AnalysisSettings;
use crate::dataset::Dataset;

/// Shared by every handler. The dataset is never mutated after load.
#[derive(Clone)]
pub struct AppState {
    pub dataset: Arc<Dataset>,
    pub analysis: AnalysisSettings,
}

impl AppState {
    pub fn new(dataset: Dataset, analysis: AnalysisSettings) -> Self {
        Self {
            dataset: Arc::new(dataset),
            analysis,
        }
    }
}
