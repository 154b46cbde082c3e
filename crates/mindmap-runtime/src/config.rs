#![forbid(unsafe_code)]

//! Engine configuration as data.
//!
//! Captures every tunable of the engine as a single [`EngineConfig`] that
//! can be loaded from TOML or JSON at startup. Every field has a default,
//! so a file only lists what it overrides.
//!
//! # Loading
//!
//! ```toml
//! # mindmap.toml
//! [layout]
//! font_size = 16
//! horizontal_gap = 96
//!
//! [view]
//! max_scale = 4.0
//!
//! [interaction]
//! async_layout_threshold = 800
//!
//! [interaction.hit_test]
//! tolerance_x = 160
//! ```
//!
//! ```rust,ignore
//! let config = EngineConfig::load_validated_toml_file("mindmap.toml")?;
//! let config = EngineConfig::from_json_str(json)?;
//! ```

use std::fmt;
use std::path::Path;

use mindmap_layout::config::{HitTestConfig, LayoutConfig};
use serde::{Deserialize, Serialize};

use crate::history::HistoryConfig;
use crate::transform::ViewConfig;

// ---------------------------------------------------------------------------
// Top-level EngineConfig
// ---------------------------------------------------------------------------

/// All engine tunables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub layout: LayoutConfig,
    pub view: ViewConfig,
    pub history: HistoryConfig,
    pub interaction: InteractionConfig,
}

/// Pointer interaction and scheduling thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Screen pixels a pressed node must travel before a drag starts.
    pub drag_threshold: f64,
    /// Trees with more nodes than this are laid out off-thread.
    pub async_layout_threshold: usize,
    /// Trees with more nodes than this pan through the transform side
    /// channel and commit on release.
    pub direct_pan_threshold: usize,
    pub hit_test: HitTestConfig,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            drag_threshold: 4.0,
            async_layout_threshold: 500,
            direct_pan_threshold: 2000,
            hit_test: HitTestConfig::default(),
        }
    }
}

impl InteractionConfig {
    /// Validate the config, returning a list of human-readable errors.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if !(self.drag_threshold.is_finite() && self.drag_threshold >= 0.0) {
            errors.push(format!(
                "interaction.drag_threshold must be >= 0, got {}",
                self.drag_threshold
            ));
        }
        errors.extend(self.hit_test.validate());
        errors
    }
}

impl EngineConfig {
    /// Load from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(ConfigError::Toml)
    }

    /// Load from a TOML file on disk.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(ConfigError::Json)
    }

    /// Load from a JSON file on disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&content)
    }

    /// Load from TOML and reject invalid values.
    pub fn load_validated_toml_str(s: &str) -> Result<Self, ConfigError> {
        Self::from_toml_str(s)?.validated()
    }

    pub fn load_validated_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_file(path)?.validated()
    }

    /// Load from JSON and reject invalid values.
    pub fn load_validated_json_str(s: &str) -> Result<Self, ConfigError> {
        Self::from_json_str(s)?.validated()
    }

    pub fn load_validated_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_json_file(path)?.validated()
    }

    /// Validate all parameters are within acceptable ranges.
    ///
    /// Returns a list of validation errors. An empty list means the config
    /// is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = self.layout.validate();
        errors.extend(self.view.validate());
        errors.extend(self.history.validate());
        errors.extend(self.interaction.validate());
        errors
    }

    fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Serialize as pretty TOML.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

// ---------------------------------------------------------------------------

/// Errors that can occur when loading an engine configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    Toml(toml::de::Error),
    /// JSON parse error.
    Json(serde_json::Error),
    /// Validation errors.
    Validation(Vec<String>),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Validation(errors) => write!(f, "validation errors: {}", errors.join("; ")),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Toml(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}
