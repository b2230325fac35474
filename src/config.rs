//! Dashboard Configuration
//! Optional JSON settings file; every field falls back to a default.

use crate::charts::Palette;
use crate::data::DEFAULT_DATE_FORMATS;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

pub const DEFAULT_DATASET: &str = "assets/GlobalSuperstoreliteOriginal.csv";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Dataset used when nothing has been uploaded.
    pub default_dataset: PathBuf,
    /// chrono formats tried in order when parsing `Order Date`.
    pub date_formats: Vec<String>,
    pub palette: Palette,
    /// Size of exported PNG charts.
    pub chart_width: u32,
    pub chart_height: u32,
    pub window_title: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            default_dataset: PathBuf::from(DEFAULT_DATASET),
            date_formats: DEFAULT_DATE_FORMATS.iter().map(|s| s.to_string()).collect(),
            palette: Palette::default(),
            chart_width: 1000,
            chart_height: 600,
            window_title: "Superstore!!!".to_string(),
        }
    }
}

impl DashboardConfig {
    /// Load from `path`, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        info!(path = %path.display(), "loaded dashboard config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn no_path_gives_defaults() {
        let config = DashboardConfig::load(None).unwrap();
        assert_eq!(config, DashboardConfig::default());
        assert_eq!(config.default_dataset, PathBuf::from(DEFAULT_DATASET));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dashboard.json");
        std::fs::write(
            &path,
            r#"{ "default_dataset": "sales.csv", "date_formats": ["%d/%m/%Y"] }"#,
        )
        .unwrap();

        let config = DashboardConfig::load(Some(&path)).unwrap();
        assert_eq!(config.default_dataset, PathBuf::from("sales.csv"));
        assert_eq!(config.date_formats, vec!["%d/%m/%Y".to_string()]);
        assert_eq!(config.palette, Palette::default());
        assert_eq!(config.chart_width, 1000);
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = DashboardConfig::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: DashboardConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            DashboardConfig::load(Some(&path)),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn missing_file_is_an_error() {
        let path = Path::new("/no/such/dashboard.json");
        assert!(matches!(
            DashboardConfig::load(Some(path)),
            Err(ConfigError::Io { .. })
        ));
    }
}
