//! Settings for fragment pre-rendering, loaded from JSON.
//!
//! Every field has a default, so an empty object (`{}`) is a valid
//! configuration that disables pre-rendering.

use std::{path::Path, time::Duration};

use serde::Deserialize;
use thiserror::Error;

/// Errors produced while loading [`Settings`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings from {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Where and how to reach the render server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// `host:port` of the render server.
    pub addr: String,
    /// Path prepended to the component name, e.g. `/render`.
    pub path_prefix: String,
    /// Upper bound on one whole render exchange, in milliseconds.
    pub timeout_ms: u64,
}

impl RendererConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:3000".to_owned(),
            path_prefix: String::new(),
            timeout_ms: 3000,
        }
    }
}

/// Fragment pre-rendering settings.
///
/// # Examples
///
/// ```
/// use fragcache::config::Settings;
///
/// let settings = Settings::from_json(r#"{"use_node": true, "renderer": {"addr": "node:3000"}}"#).unwrap();
/// assert!(settings.use_node);
/// assert_eq!(settings.renderer.addr, "node:3000");
/// assert_eq!(settings.renderer.timeout_ms, 3000);
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Pre-render header and footer through the render server. When off,
    /// fragment variables are always empty strings.
    pub use_node: bool,
    /// Site-wide settings blob forwarded to every render as `_siteSettings`.
    pub site_settings: serde_json::Value,
    pub renderer: RendererConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            use_node: false,
            site_settings: serde_json::Value::Object(serde_json::Map::new()),
            renderer: RendererConfig::default(),
        }
    }
}

impl Settings {
    /// Parses settings from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the document is not valid JSON or a
    /// field has the wrong type.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a JSON settings file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file cannot be read, or
    /// [`ConfigError::Parse`] if its content is invalid.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_json(&raw)
    }
}
