//! YAML configuration loader
//!
//! The integration is configured from a single YAML document:
//!
//! ```yaml
//! dongle:
//!   path: /dev/ttyUSB0
//! watchdog:
//!   timeout_ms: 1000
//!   interval_ms: 200
//!   max_queries: 10
//! devices:
//!   - id: "01:A2:B3:04"
//!     eep: D2-05-00
//!     name: Kitchen blind
//!     sender_id: "FF:AA:80:01"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::entry::{ConfigEntry, ConfigEntrySource, DeviceConfig, EnOceanOptions, WatchdogConfig};
use crate::error::{ConfigError, ConfigResult};

/// USB dongle settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DongleConfig {
    pub path: String,
}

/// Parsed integration configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationConfig {
    pub dongle: DongleConfig,
    #[serde(default)]
    pub watchdog: WatchdogConfig,
    #[serde(default)]
    pub devices: Vec<DeviceConfig>,
}

impl IntegrationConfig {
    /// Check values serde cannot check on its own
    pub fn validate(&self) -> ConfigResult<()> {
        if self.dongle.path.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "dongle.path".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if self.watchdog.interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "watchdog.interval_ms".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.watchdog.max_queries == 0 {
            return Err(ConfigError::InvalidValue {
                key: "watchdog.max_queries".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for device in &self.devices {
            if !seen.insert(device.id) {
                return Err(ConfigError::ValidationFailed {
                    message: format!("device {} is configured more than once", device.id),
                });
            }
        }
        Ok(())
    }

    /// Build the config entry for this configuration
    pub fn into_entry(self) -> ConfigEntry {
        ConfigEntry::new(self.dongle.path)
            .with_watchdog(self.watchdog)
            .with_options(EnOceanOptions::new(self.devices))
            .with_source(ConfigEntrySource::Import)
    }
}

/// Load the configuration from a YAML file
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<IntegrationConfig> {
    let path = path.as_ref();
    debug!("Loading EnOcean configuration: {:?}", path);

    let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_str(&content, path)
}

/// Load the configuration from a YAML string
pub fn load_config_str(content: &str, source_path: &Path) -> ConfigResult<IntegrationConfig> {
    let config: IntegrationConfig =
        serde_yaml::from_str(content).map_err(|e| ConfigError::ParseYaml {
            path: source_path.to_path_buf(),
            source: e,
        })?;

    config.validate()?;
    info!(
        dongle = %config.dongle.path,
        devices = config.devices.len(),
        "Loaded EnOcean configuration"
    );
    Ok(config)
}
