//! Loader configuration.
//!
//! [`LazyConfig`] is supplied once when a coordinator is built and shared by
//! every tracker it creates. It can be assembled in code or read from the
//! `[lazy]` section of an INI file:
//!
//! ```ini
//! [lazy]
//! loading = /img/spinner.gif
//! error = /img/broken.png
//! throttle_ms = 300
//! ```

use std::path::Path;
use std::time::Duration;

use ini::Ini;
use thiserror::Error;

use crate::strategy::DEFAULT_THROTTLE_WINDOW;

/// 1×1 transparent GIF, used when no placeholder or error image is set.
pub const DEFAULT_IMAGE_URL: &str =
    "data:image/gif;base64,R0lGODlhAQABAIAAAAAAAP///yH5BAEAAAAALAAAAAABAAEAAAIBRAA7";

/// INI section holding loader settings.
pub const CONFIG_SECTION: &str = "lazy";

/// Errors raised while reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },
}

/// Process-wide settings for a coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LazyConfig {
    /// Shown while an image is pending.
    pub loading_url: String,

    /// Shown after an image failed to load.
    pub error_url: String,

    /// Minimum gap between polling passes (polling strategy only).
    pub throttle: Duration,
}

impl Default for LazyConfig {
    fn default() -> Self {
        Self {
            loading_url: DEFAULT_IMAGE_URL.to_string(),
            error_url: DEFAULT_IMAGE_URL.to_string(),
            throttle: DEFAULT_THROTTLE_WINDOW,
        }
    }
}

impl LazyConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the placeholder URL. An empty string keeps the default.
    pub fn with_loading_url(mut self, url: impl Into<String>) -> Self {
        self.loading_url = or_default_image(url.into());
        self
    }

    /// Set the error URL. An empty string keeps the default.
    pub fn with_error_url(mut self, url: impl Into<String>) -> Self {
        self.error_url = or_default_image(url.into());
        self
    }

    pub fn with_throttle(mut self, throttle: Duration) -> Self {
        self.throttle = throttle;
        self
    }

    /// Parse the `[lazy]` section of INI text. Missing keys keep defaults.
    pub fn from_ini_str(content: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        let mut config = Self::default();

        let Some(section) = ini.section(Some(CONFIG_SECTION)) else {
            return Ok(config);
        };

        if let Some(url) = section.get("loading") {
            config = config.with_loading_url(url.trim());
        }
        if let Some(url) = section.get("error") {
            config = config.with_error_url(url.trim());
        }
        if let Some(value) = section.get("throttle_ms") {
            let millis: u64 = value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue {
                    key: "throttle_ms".to_string(),
                    value: value.to_string(),
                })?;
            config.throttle = Duration::from_millis(millis);
        }

        Ok(config)
    }

    /// Read and parse an INI file.
    pub fn from_ini_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_ini_str(&content)
    }
}

fn or_default_image(url: String) -> String {
    if url.is_empty() {
        DEFAULT_IMAGE_URL.to_string()
    } else {
        url
    }
}
