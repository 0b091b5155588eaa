//! Configuration schema and loader.
//!
//! Load order: `./pagetap.yaml`, then `~/.pagetap/config.yaml`, then
//! defaults.

use pagetap_common::mask::SensitiveFieldMatcher;
use pagetap_common::protocol::{
    CONSOLE_LOG_CAPACITY, INTERACTION_LOG_CAPACITY, NETWORK_LOG_CAPACITY, SNAPSHOT_CAPACITY,
    SNAPSHOT_VALUE_CAP,
};
use pagetap_common::sanitize::SanitizeOptions;
use pagetap_core::instrument::InstrumentConfig;
use pagetap_core::recorder::{
    DEFAULT_INPUT_DEBOUNCE_MS, DEFAULT_SCROLL_THROTTLE_MS, RecorderConfig,
};
use pagetap_core::session::SessionConfig;
use pagetap_core::tap::TapConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PagetapConfig {
    pub sanitize: SanitizeSettings,
    pub buffers: BufferSettings,
    pub recorder: RecorderSettings,
    pub probe: ProbeSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SanitizeSettings {
    pub max_depth: usize,
    pub max_string_len: usize,
    pub max_array_len: usize,
    pub max_object_keys: usize,
}

impl Default for SanitizeSettings {
    fn default() -> Self {
        let defaults = SanitizeOptions::default();
        Self {
            max_depth: defaults.max_depth,
            max_string_len: defaults.max_string_len,
            max_array_len: defaults.max_array_len,
            max_object_keys: defaults.max_object_keys,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferSettings {
    pub console: usize,
    pub network: usize,
    pub interactions: usize,
    pub snapshots: usize,
    pub storage_value_cap: usize,
}

impl Default for BufferSettings {
    fn default() -> Self {
        Self {
            console: CONSOLE_LOG_CAPACITY,
            network: NETWORK_LOG_CAPACITY,
            interactions: INTERACTION_LOG_CAPACITY,
            snapshots: SNAPSHOT_CAPACITY,
            storage_value_cap: SNAPSHOT_VALUE_CAP,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderSettings {
    pub input_debounce_ms: u64,
    pub scroll_throttle_ms: u64,
    pub sensitive_fields: Vec<String>,
}

impl Default for RecorderSettings {
    fn default() -> Self {
        Self {
            input_debounce_ms: DEFAULT_INPUT_DEBOUNCE_MS,
            scroll_throttle_ms: DEFAULT_SCROLL_THROTTLE_MS,
            sensitive_fields: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeSettings {
    /// Upper bound on mirrored elements per capture.
    pub max_elements: usize,
    /// Upper bound on mirrored value-graph nodes per capture.
    pub max_value_nodes: usize,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            max_elements: 600,
            max_value_nodes: 4000,
        }
    }
}

impl PagetapConfig {
    fn sanitize_options(&self) -> SanitizeOptions {
        SanitizeOptions {
            max_depth: self.sanitize.max_depth,
            max_string_len: self.sanitize.max_string_len,
            max_array_len: self.sanitize.max_array_len,
            max_object_keys: self.sanitize.max_object_keys,
            ..SanitizeOptions::default()
        }
    }

    /// Assemble core instrumentation settings from this configuration.
    pub fn instrument_config(&self) -> InstrumentConfig {
        let always_on = TapConfig {
            console_capacity: self.buffers.console,
            network_capacity: self.buffers.network,
            sanitize: self.sanitize_options(),
            ..TapConfig::default()
        };
        let mut session_tap = TapConfig::session(self.buffers.console, self.buffers.network);
        session_tap.sanitize = SanitizeOptions {
            error_style: session_tap.sanitize.error_style,
            ..self.sanitize_options()
        };
        let recorder = RecorderConfig {
            input_debounce_ms: self.recorder.input_debounce_ms,
            scroll_throttle_ms: self.recorder.scroll_throttle_ms,
            matcher: SensitiveFieldMatcher::new(&self.recorder.sensitive_fields),
        };
        InstrumentConfig {
            always_on,
            session: SessionConfig {
                tap: session_tap,
                recorder,
                interaction_capacity: self.buffers.interactions,
                snapshot_capacity: self.buffers.snapshots,
                storage_value_cap: self.buffers.storage_value_cap,
            },
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from default locations:
    /// 1. ./pagetap.yaml
    /// 2. ~/.pagetap/config.yaml
    /// 3. Default configuration
    pub async fn load_default() -> Result<PagetapConfig, ConfigError> {
        let local_config = PathBuf::from("./pagetap.yaml");
        if local_config.exists() {
            return Self::load_from(&local_config).await;
        }

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".pagetap").join("config.yaml");
            if home_config.exists() {
                return Self::load_from(&home_config).await;
            }
        }

        Ok(PagetapConfig::default())
    }

    pub async fn load_from(path: &Path) -> Result<PagetapConfig, ConfigError> {
        let content = tokio::fs::read_to_string(path).await?;
        let config: PagetapConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }
}
