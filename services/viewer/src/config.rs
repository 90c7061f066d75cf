//! Viewer configuration loaded from YAML.
//!
//! Every section has defaults, so a missing file or an empty section is
//! valid. `CLIMATE_API_URL` overrides `api.base_url`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use climate_client::ClientConfig;
use climate_common::{catalog, Resolution, ViewState};
use map_view::MapViewConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub const API_URL_ENV: &str = "CLIMATE_API_URL";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewerConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub map: MapViewConfig,
    #[serde(default)]
    pub overlay: OverlayConfig,
    #[serde(default)]
    pub slider: SliderConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_health_timeout_ms")]
    pub health_timeout_ms: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_health_timeout_ms() -> u64 {
    3000
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            health_timeout_ms: default_health_timeout_ms(),
        }
    }
}

impl ApiConfig {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.base_url.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            health_timeout: Duration::from_millis(self.health_timeout_ms),
        }
    }
}

/// Base-map overlay sources, relative to the API base URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_coarse_borders")]
    pub coarse_borders: String,
    #[serde(default = "default_fine_borders")]
    pub fine_borders: String,
    #[serde(default = "default_labels")]
    pub labels: String,
    /// TrueType font for place labels; labels are skipped without one
    #[serde(default)]
    pub font: Option<PathBuf>,
}

fn default_enabled() -> bool {
    true
}

fn default_coarse_borders() -> String {
    climate_client::borders::COARSE_BORDERS_PATH.to_string()
}

fn default_fine_borders() -> String {
    climate_client::borders::FINE_BORDERS_PATH.to_string()
}

fn default_labels() -> String {
    climate_client::borders::LABELS_PATH.to_string()
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            coarse_borders: default_coarse_borders(),
            fine_borders: default_fine_borders(),
            labels: default_labels(),
            font: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SliderConfig {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_debounce_ms() -> u64 {
    300
}

impl Default for SliderConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl SliderConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Initial view selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default = "default_variable")]
    pub variable: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_scenario")]
    pub scenario: String,
    #[serde(default = "default_date")]
    pub date: String,
    #[serde(default)]
    pub resolution: Resolution,
    #[serde(default)]
    pub unit: Option<String>,
}

fn default_variable() -> String {
    "tas".to_string()
}

fn default_model() -> String {
    "ACCESS-CM2".to_string()
}

fn default_scenario() -> String {
    "ssp245".to_string()
}

fn default_date() -> String {
    "2050-07-01".to_string()
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            variable: default_variable(),
            model: default_model(),
            scenario: default_scenario(),
            date: default_date(),
            resolution: Resolution::default(),
            unit: None,
        }
    }
}

impl ViewerConfig {
    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config: ViewerConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.apply_env();
        config.validate()?;
        debug!(path = %path.display(), base_url = %config.api.base_url, "Loaded viewer config");
        Ok(config)
    }

    /// Load `path` if given, otherwise use defaults (plus environment overrides).
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                info!("No config file given, using defaults");
                let mut config = Self::default();
                config.apply_env();
                config.validate()?;
                Ok(config)
            }
        }
    }

    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                self.api.base_url = url.trim().to_string();
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.api.base_url.starts_with("http://") || self.api.base_url.starts_with("https://")) {
            bail!("api.base_url must be an http(s) URL, got '{}'", self.api.base_url);
        }
        if self.api.request_timeout_secs == 0 || self.api.health_timeout_ms == 0 {
            bail!("api timeouts must be non-zero");
        }
        self.map.validate().context("Invalid map section")?;
        self.initial_state().context("Invalid defaults section")?;
        Ok(())
    }

    /// View state described by the `defaults` section.
    pub fn initial_state(&self) -> Result<ViewState> {
        let d = &self.defaults;
        if !catalog::is_variable(&d.variable) {
            bail!("unknown variable '{}'", d.variable);
        }
        if !catalog::is_model(&d.model) {
            bail!("unknown model '{}'", d.model);
        }
        let date = catalog::parse_date(&d.date)?;
        let scenario = d.scenario.to_ascii_lowercase();
        catalog::validate_scenario_date(&scenario, date)?;

        let mut state = ViewState::new(&d.variable, &d.model, &scenario, date)
            .with_palette(&self.map.palette)
            .with_resolution(d.resolution);
        state.unit = d.unit.clone();
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_yaml_is_default() {
        let config: ViewerConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, ViewerConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_sections() {
        let yaml = r#"
api:
  base_url: "https://climate.example.org"
map:
  width: 800
  max_zoom: 8
slider:
  debounce_ms: 150
"#;
        let config: ViewerConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.api.base_url, "https://climate.example.org");
        assert_eq!(config.api.health_timeout_ms, 3000);
        assert_eq!(config.map.width, 800);
        assert_eq!(config.map.height, 640);
        assert_eq!(config.map.max_zoom, 8.0);
        assert_eq!(config.slider.debounce(), Duration::from_millis(150));
    }

    #[test]
    fn test_rejects_date_outside_scenario() {
        let mut config = ViewerConfig::default();
        config.defaults.scenario = "historical".to_string();
        config.defaults.date = "2050-01-01".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_non_http_url() {
        let mut config = ViewerConfig::default();
        config.api.base_url = "ftp://example.org".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_initial_state_uses_map_palette() {
        let mut config = ViewerConfig::default();
        config.map.palette = "magma".to_string();
        let state = config.initial_state().unwrap();
        assert_eq!(state.palette, "magma");
        assert_eq!(state.variable, "tas");
    }
}
