//! Layout settings with layered loading
//!
//! The layout engine itself takes explicit arguments; these settings are for
//! callers that want distance, origin and scale to come from configuration.
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/tidytree/tidytree.toml`
//! 3. Explicit config file passed to [`Settings::load`]
//! 4. Environment variables: `TIDYTREE_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::domain::{Tree, TreeResult};
use crate::layout::{Scale, DEFAULT_DISTANCE};

/// Errors raised while loading or validating settings.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("environment override: {0}")]
    Env(#[from] config::ConfigError),

    #[error("serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid setting: {0}")]
    Invalid(String),
}

/// Layout and position-query settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Minimum separation between adjacent nodes on a level
    pub distance: f64,
    pub origin_x: i64,
    pub origin_y: i64,
    pub scale_x: f64,
    /// Falls back to `scale_x` when unset
    pub scale_y: Option<f64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            distance: DEFAULT_DISTANCE,
            origin_x: 0,
            origin_y: 0,
            scale_x: 1.0,
            scale_y: None,
        }
    }
}

/// Raw settings for intermediate parsing (`None` means "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub distance: Option<f64>,
    pub origin_x: Option<i64>,
    pub origin_y: Option<i64>,
    pub scale_x: Option<f64>,
    pub scale_y: Option<f64>,
}

/// Get the XDG config directory for tidytree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "tidytree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("tidytree.toml"))
}

fn parse_raw(content: &str, path: &Path) -> Result<RawSettings, SettingsError> {
    toml::from_str(content).map_err(|e| SettingsError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, SettingsError> {
    let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_raw(&content, path)
}

impl Settings {
    /// Scale for position queries; a missing `scale_y` means uniform scaling.
    pub fn scale(&self) -> Scale {
        match self.scale_y {
            Some(y) => Scale::Axes { x: self.scale_x, y },
            None => Scale::Uniform(self.scale_x),
        }
    }

    pub fn origin(&self) -> (i64, i64) {
        (self.origin_x, self.origin_y)
    }

    /// Overlay specified values onto self; unspecified ones keep the base.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            distance: overlay.distance.unwrap_or(self.distance),
            origin_x: overlay.origin_x.unwrap_or(self.origin_x),
            origin_y: overlay.origin_y.unwrap_or(self.origin_y),
            scale_x: overlay.scale_x.unwrap_or(self.scale_x),
            scale_y: overlay.scale_y.or(self.scale_y),
        }
    }

    /// Check that distance is positive and scales are finite.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(self.distance > 0.0 && self.distance.is_finite()) {
            return Err(SettingsError::Invalid(format!(
                "distance must be positive and finite, got {}",
                self.distance
            )));
        }
        let scales = std::iter::once(self.scale_x).chain(self.scale_y);
        for scale in scales {
            if !scale.is_finite() {
                return Err(SettingsError::Invalid(format!(
                    "scale must be finite, got {}",
                    scale
                )));
            }
        }
        Ok(())
    }

    /// Defaults overlaid with a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
        let raw = parse_raw(content, Path::new("<inline>"))?;
        let settings = Self::default().merge_with(&raw);
        settings.validate()?;
        Ok(settings)
    }

    /// Defaults overlaid with a TOML file, without global config or environment.
    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let raw = load_raw_settings(path)?;
        let settings = Self::default().merge_with(&raw);
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_toml_string(&self) -> Result<String, SettingsError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `file` - Optional explicit config file; it must exist when given
    ///
    /// # Precedence (lowest to highest)
    /// 1. Compiled defaults
    /// 2. Global config: `$XDG_CONFIG_HOME/tidytree/tidytree.toml` (if present)
    /// 3. `file`
    /// 4. Environment variables: `TIDYTREE_DISTANCE`, `TIDYTREE_ORIGIN_X`,
    ///    `TIDYTREE_ORIGIN_Y`, `TIDYTREE_SCALE_X`, `TIDYTREE_SCALE_Y`
    pub fn load(file: Option<&Path>) -> Result<Self, SettingsError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                debug!("load: global config {}", global_path.display());
                current = current.merge_with(&load_raw_settings(&global_path)?);
            }
        }

        if let Some(path) = file {
            debug!("load: config file {}", path.display());
            current = current.merge_with(&load_raw_settings(path)?);
        }

        current = Self::apply_env_overrides(current)?;
        current.validate()?;
        Ok(current)
    }

    /// Apply TIDYTREE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, SettingsError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("TIDYTREE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        if let Ok(val) = config.get_float("distance") {
            settings.distance = val;
        }
        if let Ok(val) = config.get_int("origin_x") {
            settings.origin_x = val;
        }
        if let Ok(val) = config.get_int("origin_y") {
            settings.origin_y = val;
        }
        if let Ok(val) = config.get_float("scale_x") {
            settings.scale_x = val;
        }
        if let Ok(val) = config.get_float("scale_y") {
            settings.scale_y = Some(val);
        }
        Ok(settings)
    }
}

impl<T> Tree<T> {
    /// Layout with the configured distance.
    pub fn layout_with(&mut self, settings: &Settings) -> TreeResult<()> {
        self.layout(settings.distance)
    }
}
