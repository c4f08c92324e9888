use amr_core::analysis::IndicatorThresholds;
use anyhow::Context;
use serde::Deserialize;
use std::{fs, path::Path};

use crate::sources::DEFAULT_LOCATION_COLUMN;
use crate::transform::RequiredFieldPolicy;

pub const CONFIG_ENV_VAR: &str = "AMR_ANALYSIS_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "amr-analysis.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Size of the ranked candidate view.
    pub top_n: usize,
    pub location_column: String,
    pub required_fields: RequiredFieldPolicy,
    pub thresholds: IndicatorThresholds,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            top_n: 50,
            location_column: DEFAULT_LOCATION_COLUMN.to_string(),
            required_fields: RequiredFieldPolicy::default(),
            thresholds: IndicatorThresholds::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            max_body_bytes: 32 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub analysis: AnalysisConfig,
    pub server: ServerConfig,
    pub metrics: Option<MetricsConfig>,
}

impl AppConfig {
    /// Load from `$AMR_ANALYSIS_CONFIG`, or `amr-analysis.toml` in the working
    /// directory. Without the env var a missing default file means built-in
    /// defaults.
    pub fn load() -> anyhow::Result<Self> {
        use std::env;

        match env::var(CONFIG_ENV_VAR) {
            Ok(path) => Self::from_file(Path::new(&path)),
            Err(_) if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_PATH))
            }
            Err(_) => {
                tracing::info!("no config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;
        let cfg = Self::from_toml_str(&contents)
            .with_context(|| format!("invalid config file '{}'", path.display()))?;
        tracing::info!(path = %path.display(), "config loaded");
        Ok(cfg)
    }

    pub fn from_toml_str(contents: &str) -> anyhow::Result<Self> {
        let cfg: AppConfig = toml::from_str(contents)?;
        if cfg.analysis.location_column.trim().is_empty() {
            anyhow::bail!("analysis.location_column must not be empty");
        }
        Ok(cfg)
    }
}
