use std::path::Path;
use tracing::debug;

use super::runtime::AppConfig;
use crate::error::{DashboardError, Result};

/// Environment overrides look like `DASHBOARD__SERVER__PORT=8080`.
pub const ENV_PREFIX: &str = "DASHBOARD";

/// Defaults, then the optional config file, then environment variables.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let mut builder = ::config::Config::builder();

    if let Some(path) = path {
        debug!("Reading configuration from {}", path.display());
        builder = builder.add_source(::config::File::from(path).required(false));
    }

    let settings = builder
        .add_source(
            ::config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let config: AppConfig = settings.try_deserialize()?;
    config
        .validate()
        .map_err(|errors| DashboardError::InvalidConfig(errors.join(", ")))?;

    Ok(config)
}

pub fn to_toml(config: &AppConfig) -> Result<String> {
    toml::to_string_pretty(config).map_err(|e| DashboardError::InvalidConfig(e.to_string()))
}
