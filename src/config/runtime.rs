use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::analytics::IntervalPolicy;
use crate::error::{DashboardError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data: DataSettings,
    pub server: ServerSettings,
    pub analysis: AnalysisSettings,
    pub logging: LoggingSettings,
}

impl AppConfig {
    pub fn validate(&self) -> std::result::Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.data.csv_path.as_os_str().is_empty() {
            errors.push("data.csv_path must not be empty".to_string());
        }

        if self.server.port == 0 {
            errors.push("server.port must be > 0".to_string());
        }
        if self.server.host.trim().is_empty() {
            errors.push("server.host must not be empty".to_string());
        }

        if self.analysis.window_minutes <= 0 {
            errors.push("analysis.window_minutes must be > 0".to_string());
        } else if self.analysis.window().is_err() {
            errors.push("analysis.window_minutes is out of range".to_string());
        }
        if self.analysis.quantile_bins == 0 {
            errors.push("analysis.quantile_bins must be > 0".to_string());
        }
        if self.analysis.min_sequence_length == 0 {
            errors.push("analysis.min_sequence_length must be > 0".to_string());
        }
        if let Some(max) = self.analysis.max_interval_minutes {
            if !(max > 0.0) || !max.is_finite() {
                errors.push("analysis.max_interval_minutes must be a finite number > 0".to_string());
            }
        }

        if EnvFilter::try_new(&self.logging.level).is_err() {
            errors.push(format!("logging.level '{}' is not a valid filter", self.logging.level));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub csv_path: PathBuf,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            csv_path: PathBuf::from("dados.csv"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Fixed-window size for hit bucketing.
    pub window_minutes: i64,
    pub quantile_bins: usize,
    /// Shortest hit run counted as a sequence.
    pub min_sequence_length: usize,
    pub interval_positive_only: bool,
    pub max_interval_minutes: Option<f64>,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            window_minutes: 15,
            quantile_bins: 4,
            min_sequence_length: 2,
            interval_positive_only: true,
            max_interval_minutes: None,
        }
    }
}

impl AnalysisSettings {
    pub fn interval_policy(&self) -> IntervalPolicy {
        IntervalPolicy {
            positive_only: self.interval_positive_only,
            max_minutes: self.max_interval_minutes,
        }
    }

    pub fn window(&self) -> Result<Duration> {
        Duration::try_minutes(self.window_minutes).ok_or_else(|| {
            DashboardError::InvalidParameter(format!(
                "window of {} minutes is out of range",
                self.window_minutes
            ))
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.analysis.window().unwrap(), Duration::minutes(15));
        assert_eq!(config.analysis.interval_policy(), IntervalPolicy::default());
    }

    #[test]
    fn test_validation_collects_all_errors() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        config.analysis.window_minutes = 0;
        config.analysis.max_interval_minutes = Some(-5.0);

        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 3);

        let mut config = AppConfig::default();
        config.analysis.window_minutes = 1_000_000_000_000_000;
        config.analysis.max_interval_minutes = Some(f64::NAN);

        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| e.contains("out of range")));
        assert!(errors.iter().any(|e| e.contains("max_interval_minutes")));
        assert!(config.analysis.window().is_err());

        config.analysis.window_minutes = 15;
        config.analysis.max_interval_minutes = Some(f64::INFINITY);
        assert_eq!(config.validate().unwrap_err().len(), 1);
    }
}
