//! Application Configuration
//! Dataset location and the constants that shape each chart view.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File looked up in the working directory by [`AppConfig::discover`].
pub const CONFIG_FILE: &str = "labor_charts.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid config value: {0}")]
    Invalid(&'static str),
}

/// Settings for loading and aggregating the employment datasets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding both CSV files
    pub dataset_dir: PathBuf,
    /// Job posts by province, activity and date
    pub jobs_file: String,
    /// Activity code lookup
    pub codes_file: String,
    /// Year shown in the provincial and national views
    pub breakdown_year: i32,
    /// Yearly totals only include records strictly before this date
    pub line_cutoff: NaiveDate,
    pub province_top_n: usize,
    pub national_top_n: usize,
    /// Activity labels longer than this are split onto two lines
    pub label_wrap: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            dataset_dir: PathBuf::from("datasets"),
            jobs_file: "puestos_priv.csv".to_string(),
            codes_file: "clae_agg.csv".to_string(),
            breakdown_year: 2022,
            line_cutoff: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or_default(),
            province_top_n: 10,
            national_top_n: 7,
            label_wrap: 44,
        }
    }
}

impl AppConfig {
    /// Load `labor_charts.json` from the working directory, or defaults if absent.
    pub fn discover() -> Result<Self, ConfigError> {
        let path = Path::new(CONFIG_FILE);
        if path.is_file() {
            log::info!("Reading config from {}", path.display());
            Self::load(path)
        } else {
            log::debug!("No {} found, using defaults", CONFIG_FILE);
            Ok(Self::default())
        }
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.province_top_n == 0 {
            return Err(ConfigError::Invalid("province_top_n must be at least 1"));
        }
        if self.national_top_n == 0 {
            return Err(ConfigError::Invalid("national_top_n must be at least 1"));
        }
        if self.label_wrap == 0 {
            return Err(ConfigError::Invalid("label_wrap must be at least 1"));
        }
        Ok(())
    }

    pub fn jobs_path(&self) -> PathBuf {
        self.dataset_dir.join(&self.jobs_file)
    }

    pub fn codes_path(&self) -> PathBuf {
        self.dataset_dir.join(&self.codes_file)
    }
}
