//! Host configuration
//!
//! Settings shared by page discovery, the map container lifecycle and the
//! CLI. Every field has a default, so a TOML file only names what it changes:
//!
//! ```toml
//! container_class = "map-box"
//! reveal_delay_ms = 500
//!
//! [viewport]
//! width = 640
//! height = 480
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::directive::{ResolveOptions, DEFAULT_SENTINEL};
use crate::sdk::Viewport;

/// Static map image endpoint
pub const DEFAULT_STATIC_URL: &str = "http://maps.google.com/maps/api/staticmap";

/// Errors that can occur when loading a host configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostConfig {
    /// Class marking a map container element
    pub container_class: String,
    /// String in a configuration replaced by the canvas element
    pub placeholder_sentinel: String,
    /// Milliseconds before the static image is hidden without `tilesloaded`
    pub reveal_delay_ms: u64,
    /// Pixel size used when fitting a map to its markers
    pub viewport: Viewport,
    /// Reject directives that set both `cls` and `val`
    pub strict_directives: bool,
    /// Base URL of static map images
    pub static_url: String,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            container_class: "gmap".to_string(),
            placeholder_sentinel: DEFAULT_SENTINEL.to_string(),
            reveal_delay_ms: 2000,
            viewport: Viewport::default(),
            strict_directives: false,
            static_url: DEFAULT_STATIC_URL.to_string(),
        }
    }
}

impl HostConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn with_container_class(mut self, class: impl Into<String>) -> Self {
        self.container_class = class.into();
        self
    }

    pub fn with_reveal_delay(mut self, delay: Duration) -> Self {
        self.reveal_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }

    pub fn with_strict_directives(mut self, strict: bool) -> Self {
        self.strict_directives = strict;
        self
    }

    pub fn reveal_delay(&self) -> Duration {
        Duration::from_millis(self.reveal_delay_ms)
    }

    /// Resolver options implied by this configuration
    pub fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions::new()
            .with_sentinel(self.placeholder_sentinel.clone())
            .with_strict(self.strict_directives)
    }
}
