//! Config entry and configuration handling for the EnOcean integration
//!
//! - [`ConfigEntry`]: the integration's entry (dongle path, watchdog tunables,
//!   configured devices)
//! - [`ConfigFlow`]: creates the single entry from a dongle path or YAML import
//! - [`OptionsFlow`]: the wizard for adding, editing and removing devices
//! - [`orphaned_devices`]: registry cleanup after devices are removed
//! - [`load_config`]: YAML configuration loading

mod cleanup;
mod config_flow;
mod entry;
mod error;
mod loader;
mod options_flow;

pub use cleanup::{orphaned_devices, DeviceIdentifier, RegisteredDevice};
pub use config_flow::{
    ConfigFlow, ConfigFlowError, ConfigFlowResult, DongleDetector, DongleInput, SystemDongles,
    ABORT_INVALID_CONFIG, ABORT_SINGLE_INSTANCE, ERROR_INVALID_DONGLE_PATH, MANUAL_PATH_VALUE,
    STEP_DETECT, STEP_IMPORT, STEP_MANUAL, STEP_USER,
};
pub use entry::{
    ConfigEntry, ConfigEntrySource, DeviceConfig, EnOceanOptions, EntryData, WatchdogConfig,
};
pub use error::{ConfigError, ConfigResult};
pub use loader::{load_config, load_config_str, DongleConfig, IntegrationConfig};
pub use options_flow::{
    DeviceInput, FlowResult, FormField, OptionsFlow, OptionsFlowError, SelectOption,
    STEP_ADD_DEVICE, STEP_DELETE_DEVICE, STEP_EDIT_DEVICE, STEP_INIT, STEP_SELECT_DEVICE,
};
