//! Config Entry types
//!
//! The EnOcean integration has a single config entry per dongle. Its `data`
//! holds the dongle path and integration tunables; its `options` hold the
//! list of configured devices, edited through the options flow.

use chrono::{DateTime, Utc};
use enocean_core::{DeviceType, EnOceanId, Eep, DOMAIN, GENERIC_MANUFACTURER};
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;

/// Source of the config entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConfigEntrySource {
    /// Configured via UI/API
    #[default]
    User,
    /// Imported from YAML config
    Import,
}

/// Tunables of the cover "movement stop" watchdog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchdogConfig {
    /// Time without position reports before a query is sent
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Wake-up period of the watchdog task
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Number of queries sent before the position is considered unknown
    #[serde(default = "default_max_queries")]
    pub max_queries: u32,
}

fn default_timeout_ms() -> u64 {
    1000
}

fn default_interval_ms() -> u64 {
    200
}

fn default_max_queries() -> u32 {
    10
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            interval_ms: default_interval_ms(),
            max_queries: default_max_queries(),
        }
    }
}

impl WatchdogConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Immutable entry data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryData {
    /// Serial path of the USB dongle
    pub device: String,
    #[serde(default)]
    pub watchdog: WatchdogConfig,
}

/// A configured EnOcean device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub id: EnOceanId,
    pub eep: Eep,
    pub name: String,
    /// Address used as sender when commanding the device
    #[serde(
        default,
        deserialize_with = "deserialize_optional_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub sender_id: Option<EnOceanId>,
    #[serde(default = "default_manufacturer")]
    pub manufacturer: String,
    #[serde(default)]
    pub model: String,
}

fn default_manufacturer() -> String {
    GENERIC_MANUFACTURER.to_string()
}

/// Accept a missing value, an empty string or an id string
fn deserialize_optional_id<'de, D>(deserializer: D) -> Result<Option<EnOceanId>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

impl DeviceConfig {
    pub fn new(id: EnOceanId, eep: Eep, name: impl Into<String>) -> Self {
        Self {
            id,
            eep,
            name: name.into(),
            sender_id: None,
            manufacturer: default_manufacturer(),
            model: String::new(),
        }
    }

    pub fn with_sender_id(mut self, sender_id: EnOceanId) -> Self {
        self.sender_id = Some(sender_id);
        self
    }

    pub fn with_model(mut self, manufacturer: impl Into<String>, model: impl Into<String>) -> Self {
        self.manufacturer = manufacturer.into();
        self.model = model.into();
        self
    }

    pub fn device_type(&self) -> DeviceType {
        DeviceType::new(self.eep, self.manufacturer.clone(), self.model.clone())
    }

    /// Sender address, falling back to 00:00:00:00
    pub fn sender_or_default(&self) -> EnOceanId {
        self.sender_id.unwrap_or_default()
    }

    /// Label used in selection lists: "name [id]"
    pub fn label(&self) -> String {
        format!("{} [{}]", self.name, self.id)
    }
}

/// User-configurable options: the configured devices
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnOceanOptions {
    #[serde(default)]
    pub devices: Vec<DeviceConfig>,
}

impl EnOceanOptions {
    pub fn new(devices: Vec<DeviceConfig>) -> Self {
        Self { devices }
    }

    pub fn device(&self, id: &EnOceanId) -> Option<&DeviceConfig> {
        self.devices.iter().find(|d| d.id == *id)
    }

    pub fn contains(&self, id: &EnOceanId) -> bool {
        self.device(id).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

/// The config entry of the EnOcean integration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigEntry {
    /// Unique identifier (ULID)
    pub entry_id: String,

    /// Integration domain, always "enocean"
    pub domain: String,

    /// Human-readable display name
    pub title: String,

    /// Immutable configuration data
    pub data: EntryData,

    /// User-configurable options
    #[serde(default)]
    pub options: EnOceanOptions,

    /// Origin type
    #[serde(default)]
    pub source: ConfigEntrySource,

    /// Creation timestamp
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    #[serde(default = "Utc::now")]
    pub modified_at: DateTime<Utc>,
}

impl ConfigEntry {
    /// Create a new config entry for a dongle
    pub fn new(device: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            entry_id: ulid::Ulid::new().to_string(),
            domain: DOMAIN.to_string(),
            title: "EnOcean".to_string(),
            data: EntryData {
                device: device.into(),
                watchdog: WatchdogConfig::default(),
            },
            options: EnOceanOptions::default(),
            source: ConfigEntrySource::User,
            created_at: now,
            modified_at: now,
        }
    }

    /// Set entry options
    pub fn with_options(mut self, options: EnOceanOptions) -> Self {
        self.options = options;
        self
    }

    /// Set watchdog tunables
    pub fn with_watchdog(mut self, watchdog: WatchdogConfig) -> Self {
        self.data.watchdog = watchdog;
        self
    }

    /// Set source
    pub fn with_source(mut self, source: ConfigEntrySource) -> Self {
        self.source = source;
        self
    }

    /// Replace the options, returning whether anything changed
    pub fn update_options(&mut self, options: EnOceanOptions) -> bool {
        if self.options == options {
            return false;
        }
        self.options = options;
        self.modified_at = Utc::now();
        true
    }
}
