//! Config flow creating the integration's config entry
//!
//! Only one entry may exist. The user step proposes detected dongles and
//! falls back to a manual path form; the import step turns a YAML
//! configuration into an entry. Dongle discovery and path checks go through
//! [`DongleDetector`] so they can be replaced.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

use crate::entry::ConfigEntry;
use crate::loader::IntegrationConfig;
use crate::options_flow::{FormField, SelectOption};

pub const STEP_USER: &str = "user";
pub const STEP_DETECT: &str = "detect";
pub const STEP_MANUAL: &str = "manual";
pub const STEP_IMPORT: &str = "import";

/// Choice in the detect form that switches to manual path entry
pub const MANUAL_PATH_VALUE: &str = "Custom path";

pub const ERROR_INVALID_DONGLE_PATH: &str = "invalid_dongle_path";
pub const ABORT_SINGLE_INSTANCE: &str = "single_instance_allowed";
pub const ABORT_INVALID_CONFIG: &str = "invalid_config";

/// Form field holding the dongle path
const FIELD_DEVICE: &str = "device";

/// Finds USB dongles and checks user supplied paths
pub trait DongleDetector: Send + Sync {
    /// Paths of dongles that look like EnOcean transceivers
    fn detect(&self) -> Vec<String>;

    /// Whether `path` can be used as the dongle
    fn validate_path(&self, path: &str) -> bool;
}

/// Looks for serial devices on the local filesystem
#[derive(Debug, Clone, Default)]
pub struct SystemDongles;

impl SystemDongles {
    fn matching(dir: &str, filter: impl Fn(&str) -> bool) -> Vec<String> {
        let Ok(entries) = fs::read_dir(dir) else {
            return Vec::new();
        };
        entries
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_str().is_some_and(&filter))
            .map(|e| e.path().to_string_lossy().into_owned())
            .collect()
    }
}

impl DongleDetector for SystemDongles {
    fn detect(&self) -> Vec<String> {
        let mut paths = Self::matching("/dev", |name| {
            name.starts_with("tty") && name.contains("FTOA2PV")
        });
        paths.extend(Self::matching("/dev/serial/by-id", |name| {
            name.contains("EnOcean")
        }));
        paths.sort();
        paths
    }

    fn validate_path(&self, path: &str) -> bool {
        let path = path.trim();
        !path.is_empty() && fs::metadata(Path::new(path)).is_ok_and(|m| !m.is_dir())
    }
}

/// Errors raised while dispatching config flow steps
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigFlowError {
    #[error("unknown step '{0}'")]
    UnknownStep(String),

    #[error("malformed user input: {0}")]
    InvalidInput(String),
}

/// Result of a config flow step
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConfigFlowResult {
    Form {
        step_id: String,
        data_schema: Vec<FormField>,
        errors: HashMap<String, String>,
    },
    Abort {
        reason: String,
    },
    CreateEntry {
        title: String,
        entry: Box<ConfigEntry>,
    },
}

impl ConfigFlowResult {
    pub fn step_id(&self) -> Option<&str> {
        match self {
            ConfigFlowResult::Form { step_id, .. } => Some(step_id),
            _ => None,
        }
    }

    /// Error reported for the dongle path field, if any
    pub fn error(&self) -> Option<&str> {
        match self {
            ConfigFlowResult::Form { errors, .. } => errors.get(FIELD_DEVICE).map(String::as_str),
            _ => None,
        }
    }

    pub fn abort_reason(&self) -> Option<&str> {
        match self {
            ConfigFlowResult::Abort { reason } => Some(reason),
            _ => None,
        }
    }

    /// The created entry, if the flow finished
    pub fn into_entry(self) -> Option<ConfigEntry> {
        match self {
            ConfigFlowResult::CreateEntry { entry, .. } => Some(*entry),
            _ => None,
        }
    }
}

/// Dongle path as submitted by the detect or manual form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DongleInput {
    pub device: String,
}

impl DongleInput {
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
        }
    }
}

/// Config flow for setting up the dongle
pub struct ConfigFlow {
    detector: Box<dyn DongleDetector>,
    has_entry: bool,
}

impl ConfigFlow {
    /// Start a flow, given the entries that already exist
    pub fn new(existing: &[ConfigEntry]) -> Self {
        Self {
            detector: Box::new(SystemDongles),
            has_entry: !existing.is_empty(),
        }
    }

    /// Replace dongle discovery and path validation
    pub fn with_detector(mut self, detector: impl DongleDetector + 'static) -> Self {
        self.detector = Box::new(detector);
        self
    }

    pub fn step_user(&self) -> ConfigFlowResult {
        if self.has_entry {
            return abort(ABORT_SINGLE_INSTANCE);
        }
        self.step_detect(None)
    }

    /// Offer detected dongles, or go straight to manual entry if none
    pub fn step_detect(&self, input: Option<DongleInput>) -> ConfigFlowResult {
        let mut errors = HashMap::new();
        if let Some(input) = &input {
            if input.device == MANUAL_PATH_VALUE {
                return self.step_manual(None);
            }
            if self.detector.validate_path(&input.device) {
                return create_entry(&input.device);
            }
            errors.insert(FIELD_DEVICE.to_string(), ERROR_INVALID_DONGLE_PATH.to_string());
        }

        let bridges = self.detector.detect();
        if bridges.is_empty() {
            return self.step_manual(input);
        }
        debug!(count = bridges.len(), "Detected EnOcean dongles");

        let mut options: Vec<SelectOption> = bridges
            .into_iter()
            .map(|path| SelectOption::new(path.clone(), path))
            .collect();
        options.push(SelectOption::new(MANUAL_PATH_VALUE, MANUAL_PATH_VALUE));
        ConfigFlowResult::Form {
            step_id: STEP_DETECT.to_string(),
            data_schema: vec![FormField::select(FIELD_DEVICE, None, options)],
            errors,
        }
    }

    pub fn step_manual(&self, input: Option<DongleInput>) -> ConfigFlowResult {
        let mut errors = HashMap::new();
        let mut default = None;
        if let Some(input) = input {
            if self.detector.validate_path(&input.device) {
                return create_entry(&input.device);
            }
            errors.insert(FIELD_DEVICE.to_string(), ERROR_INVALID_DONGLE_PATH.to_string());
            default = Some(input.device);
        }

        ConfigFlowResult::Form {
            step_id: STEP_MANUAL.to_string(),
            data_schema: vec![FormField::string(FIELD_DEVICE, true, default)],
            errors,
        }
    }

    /// Create the entry from a YAML configuration
    pub fn step_import(&self, config: IntegrationConfig) -> ConfigFlowResult {
        if self.has_entry {
            debug!("Config entry exists, skipping YAML import");
            return abort(ABORT_SINGLE_INSTANCE);
        }
        if let Err(err) = config.validate() {
            warn!(error = %err, "Cannot import YAML configuration");
            return abort(ABORT_INVALID_CONFIG);
        }
        if !self.detector.validate_path(&config.dongle.path) {
            warn!(
                path = %config.dongle.path,
                "Cannot import YAML configuration: not a valid dongle path"
            );
            return abort(ERROR_INVALID_DONGLE_PATH);
        }

        let entry = config.into_entry();
        ConfigFlowResult::CreateEntry {
            title: entry.title.clone(),
            entry: Box::new(entry),
        }
    }

    /// Run a step by id with JSON input
    pub fn handle_step(
        &self,
        step_id: &str,
        user_input: Option<serde_json::Value>,
    ) -> Result<ConfigFlowResult, ConfigFlowError> {
        match step_id {
            STEP_USER => Ok(self.step_user()),
            STEP_DETECT => Ok(self.step_detect(parse(user_input)?)),
            STEP_MANUAL => Ok(self.step_manual(parse(user_input)?)),
            STEP_IMPORT => {
                let config = parse(user_input)?.ok_or_else(|| {
                    ConfigFlowError::InvalidInput("import needs a configuration".to_string())
                })?;
                Ok(self.step_import(config))
            }
            other => Err(ConfigFlowError::UnknownStep(other.to_string())),
        }
    }
}

fn parse<T>(user_input: Option<serde_json::Value>) -> Result<Option<T>, ConfigFlowError>
where
    T: for<'de> Deserialize<'de>,
{
    user_input
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| ConfigFlowError::InvalidInput(e.to_string()))
}

fn abort(reason: &str) -> ConfigFlowResult {
    ConfigFlowResult::Abort {
        reason: reason.to_string(),
    }
}

fn create_entry(path: &str) -> ConfigFlowResult {
    let entry = ConfigEntry::new(path.trim());
    debug!(entry_id = %entry.entry_id, device = %entry.data.device, "Creating config entry");
    ConfigFlowResult::CreateEntry {
        title: entry.title.clone(),
        entry: Box::new(entry),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    struct NoDongles;

    impl DongleDetector for NoDongles {
        fn detect(&self) -> Vec<String> {
            Vec::new()
        }

        fn validate_path(&self, _path: &str) -> bool {
            false
        }
    }

    #[test]
    fn test_system_dongles_validate_path() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().to_string_lossy().into_owned();

        assert!(SystemDongles.validate_path(&path));
        assert!(!SystemDongles.validate_path(""));
        assert!(!SystemDongles.validate_path("/nonexistent/ttyUSB9"));
        assert!(!SystemDongles.validate_path(&std::env::temp_dir().to_string_lossy()));
    }

    #[test]
    fn test_no_dongles_shows_manual_form() {
        let flow = ConfigFlow::new(&[]).with_detector(NoDongles);
        let result = flow.step_user();
        assert_eq!(result.step_id(), Some(STEP_MANUAL));
        assert_eq!(result.error(), None);

        let result = flow.step_manual(Some(DongleInput::new("/dev/ttyUSB7")));
        assert_eq!(result.error(), Some(ERROR_INVALID_DONGLE_PATH));
        match result {
            ConfigFlowResult::Form { data_schema, .. } => {
                assert_eq!(data_schema[0].default.as_deref(), Some("/dev/ttyUSB7"));
            }
            other => panic!("expected form, got {:?}", other),
        }
    }

    #[test]
    fn test_single_instance() {
        let flow = ConfigFlow::new(&[ConfigEntry::new("/dev/ttyUSB0")]).with_detector(NoDongles);
        assert_eq!(flow.step_user().abort_reason(), Some(ABORT_SINGLE_INSTANCE));
    }

    #[test]
    fn test_abort_serialization() {
        let value = serde_json::to_value(abort(ABORT_SINGLE_INSTANCE)).unwrap();
        assert_eq!(value["type"], "abort");
        assert_eq!(value["reason"], "single_instance_allowed");
    }
}
