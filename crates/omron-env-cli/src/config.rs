//! Bridge configuration.
//!
//! Loaded from YAML:
//!
//! ```yaml
//! ttl_ms: 10000          # null or 0 disables staleness recovery
//! message_format: chart  # standard | chart
//! led:
//!   display_rule: "ON"
//!   color: "#0D58C1"
//! ```

use std::path::Path;

use omron_env_protocol::{ColorInput, LedSettings};
use serde::{Deserialize, Serialize};

use crate::error::BridgeResult;
use crate::routing::MessageFormat;

/// Default maximum gap between chunks of one frame.
pub const DEFAULT_TTL_MS: u64 = 10_000;

fn default_ttl_ms() -> Option<u64> {
    Some(DEFAULT_TTL_MS)
}

/// Configuration for a [`Bridge`](crate::Bridge).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Staleness timeout for partial frames, in milliseconds.
    #[serde(default = "default_ttl_ms")]
    pub ttl_ms: Option<u64>,
    /// How decoded responses are turned into output messages.
    #[serde(default)]
    pub message_format: MessageFormat,
    /// LED settings used for `setLED` when the command carries none.
    #[serde(default)]
    pub led: LedConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        BridgeConfig {
            ttl_ms: default_ttl_ms(),
            message_format: MessageFormat::default(),
            led: LedConfig::default(),
        }
    }
}

impl BridgeConfig {
    /// Load a configuration file.
    pub fn load(path: impl AsRef<Path>) -> BridgeResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    /// Parse a configuration from YAML text.
    pub fn from_yaml(text: &str) -> BridgeResult<Self> {
        Ok(serde_yaml::from_str(text)?)
    }
}

/// Default LED settings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LedConfig {
    #[serde(default)]
    pub display_rule: String,
    #[serde(default)]
    pub color: ColorInput,
}

impl From<&LedConfig> for LedSettings {
    fn from(config: &LedConfig) -> Self {
        LedSettings {
            display_rule: config.display_rule.clone(),
            color: config.color.clone(),
        }
    }
}
