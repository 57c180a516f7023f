//! Dashboard configuration.
//!
//! Defaults are embedded at compile time from `config/default.toml`. A user
//! file may override any subset of keys; tables are merged key by key. The
//! `RESALE_MAP_API_URL` environment variable overrides `api.base_url` last.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use resale_map_property_models::{ColorMode, FlatType};
use serde::Deserialize;
use thiserror::Error;

const DEFAULT_TOML: &str = include_str!("../config/default.toml");

/// Environment variable that overrides the backend base URL.
pub const API_URL_ENV: &str = "RESALE_MAP_API_URL";

/// Errors loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("Failed to read config {}: {source}", path.display())]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The TOML was malformed or had wrongly typed values.
    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DashboardConfig {
    /// Backend access.
    pub api: ApiConfig,
    /// Initial selection.
    pub defaults: DefaultsConfig,
    /// Map viewport and layer options.
    pub map: MapConfig,
    /// Dataset windows.
    pub data: DataConfig,
    /// Trend chart options.
    pub trend: TrendConfig,
    /// Timeline chart options.
    pub timeline: TimelineConfig,
    /// Boundary decoding.
    pub geography: GeographyConfig,
}

/// `[api]`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiConfig {
    /// Backend root, without the `/api` suffix.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout_secs: u64,
}

/// `[defaults]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DefaultsConfig {
    /// Flat type selected at startup.
    pub flat_type: FlatType,
    /// Marker color mode at startup.
    pub color_mode: ColorMode,
}

/// `[map]`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MapConfig {
    /// Default center, `[longitude, latitude]`.
    pub center: [f64; 2],
    /// Default zoom.
    pub zoom: f64,
    /// Zoom used when flying to a highlighted town or street.
    pub highlight_zoom: f64,
    /// Padding in pixels when fitting town bounds.
    pub fit_padding: f64,
    /// Pitch the 3D toggle switches to.
    pub pitch_3d: f64,
    /// Whether clustering starts enabled.
    pub clustering: bool,
}

/// `[data]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DataConfig {
    /// Records must be completed after January 1 of this year.
    pub window_start_year: i32,
    /// Years of street-level history fetched on town selection.
    pub street_history_years: i32,
}

/// `[trend]`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TrendConfig {
    /// Trailing window used for the ranking mean.
    pub window_months: u32,
    /// Base point radius when grouped by town.
    pub town_radius: f64,
    /// Base point radius when grouped by street.
    pub street_radius: f64,
}

/// `[timeline]`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TimelineConfig {
    /// Plot width in pixels; brush pixel ranges are relative to it.
    pub width: f64,
}

/// `[geography]`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GeographyConfig {
    /// Feature property holding the town name.
    pub name_property: String,
}

impl DashboardConfig {
    /// The embedded defaults.
    ///
    /// # Panics
    ///
    /// Panics if the embedded TOML is malformed (a compile-time guarantee
    /// since the file ships with the crate).
    #[must_use]
    pub fn embedded() -> Self {
        toml::de::from_str(DEFAULT_TOML)
            .unwrap_or_else(|e| panic!("Failed to parse embedded default config: {e}"))
    }

    /// Embedded defaults merged with `overrides`.
    ///
    /// # Errors
    ///
    /// * If `overrides` is not valid TOML or a value has the wrong type
    pub fn from_toml_str(overrides: &str) -> Result<Self, ConfigError> {
        let mut base: toml::Table = toml::de::from_str(DEFAULT_TOML)?;
        let user: toml::Table = toml::de::from_str(overrides)?;
        merge_tables(&mut base, user);
        Ok(toml::Value::Table(base).try_into()?)
    }

    /// Loads the configuration: defaults, then `path` if given, then the
    /// environment.
    ///
    /// # Errors
    ///
    /// * If `path` cannot be read or parsed
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                log::info!("Loading config from {}", path.display());
                Self::from_toml_str(&text)?
            }
            None => Self::embedded(),
        };
        config.apply_api_url_override(std::env::var(API_URL_ENV).ok());
        Ok(config)
    }

    /// Replaces `api.base_url` when `url` is a non-empty value.
    pub fn apply_api_url_override(&mut self, url: Option<String>) {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            log::debug!("{API_URL_ENV} overrides api.base_url with {url}");
            self.api.base_url = url;
        }
    }

    /// Per-request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    /// January 1 of `data.window_start_year`.
    #[must_use]
    pub fn window_start(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.data.window_start_year, 1, 1).unwrap_or(NaiveDate::MIN)
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self::embedded()
    }
}

fn merge_tables(base: &mut toml::Table, overrides: toml::Table) {
    for (key, value) in overrides {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(nested)) => {
                merge_tables(existing, nested);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
