// SPDX-License-Identifier: MIT OR Apache-2.0
//! Runtime configuration, persisted as RON

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Default `tracing` filter directive
pub const DEFAULT_LOG_FILTER: &str = "ordoplay_ui_runtime=info";

/// Errors loading or saving a [`RuntimeConfig`]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read or written
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not valid RON for this config
    #[error("failed to parse config: {0}")]
    Parse(#[from] ron::error::SpannedError),
    /// The config could not be serialized
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] ron::Error),
}

/// Settings for a [`UiFlowRuntime`](crate::UiFlowRuntime)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Declared layer names. Empty accepts any layer name.
    pub layers: Vec<String>,
    /// Input action -> layer hidden when the action is performed
    pub cancel_actions: IndexMap<String, String>,
    /// Default log filter, overridden by `RUST_LOG`
    pub log_filter: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            layers: Vec::new(),
            cancel_actions: IndexMap::new(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl RuntimeConfig {
    /// Declare a layer
    pub fn with_layer(mut self, layer: impl Into<String>) -> Self {
        self.layers.push(layer.into());
        self
    }

    /// Bind an input action to the layer it closes
    pub fn with_cancel_action(
        mut self,
        action: impl Into<String>,
        layer: impl Into<String>,
    ) -> Self {
        self.cancel_actions.insert(action.into(), layer.into());
        self
    }

    /// Parse a config from RON
    pub fn from_ron(s: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(s)?)
    }

    /// Serialize to pretty RON
    pub fn to_ron(&self) -> Result<String, ConfigError> {
        let pretty = ron::ser::PrettyConfig::default().struct_names(true);
        Ok(ron::ser::to_string_pretty(self, pretty)?)
    }

    /// Load a config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_ron(&content)?;
        tracing::debug!("Loaded runtime config from {}", path.display());
        Ok(config)
    }

    /// Save to a config file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        std::fs::write(path, self.to_ron()?)?;
        Ok(())
    }
}
