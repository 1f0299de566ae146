//! Bot configuration: panels, default security policy, client tuning.
//!
//! Loaded from a TOML file. Every field has a default so a minimal config
//! only needs the panel table.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::panel::{Panel, PanelDialectKind};
use crate::policy::SecurityPolicy;

/// Errors from loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// One panel entry in the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelConfig {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub base_url: String,
    pub api_key: String,
    /// Omit to let the client probe the dialect at runtime.
    #[serde(default)]
    pub dialect: Option<PanelDialectKind>,
}

impl PanelConfig {
    pub fn into_panel(self) -> Panel {
        let mut panel = Panel::new(self.id, self.base_url, self.api_key);
        if let Some(name) = self.name {
            panel.name = name;
        }
        panel.dialect = self.dialect;
        panel
    }
}

/// Top-level bot configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Panels the bot may talk to.
    pub panels: Vec<PanelConfig>,
    /// Default security policy applied to resellers without an explicit one.
    pub security: SecurityPolicy,
    /// Per-request timeout for panel calls, seconds.
    pub request_timeout_secs: u64,
    /// Per-panel request quota per one-second window.
    pub panel_requests_per_second: u32,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            panels: Vec::new(),
            security: SecurityPolicy::default(),
            request_timeout_secs: 30,
            panel_requests_per_second: 3,
        }
    }
}

impl BotConfig {
    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config: BotConfig = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate invariants that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for panel in &self.panels {
            if panel.id.trim().is_empty() {
                return Err(ConfigError::Invalid("panel id must not be empty".into()));
            }
            if !panel.base_url.starts_with("http://") && !panel.base_url.starts_with("https://") {
                return Err(ConfigError::Invalid(format!(
                    "panel '{}' base_url must be an http(s) URL",
                    panel.id
                )));
            }
            if panel.api_key.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "panel '{}' api_key must not be empty",
                    panel.id
                )));
            }
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be positive".into(),
            ));
        }
        if self.panel_requests_per_second == 0 {
            return Err(ConfigError::Invalid(
                "panel_requests_per_second must be positive".into(),
            ));
        }
        Ok(())
    }
}
