//! Options flow for managing configured EnOcean devices
//!
//! The flow works on a copy of the entry's options. Each step either shows a
//! menu or form, or finishes with a `CreateEntry` carrying the new options.
//! Validation failures are reported as form errors under the `base` key,
//! using the error's [`OptionsFlowError::key`].
//!
//! Device forms offer the catalog of supported device types. Picking one sets
//! EEP, manufacturer and model together; a bare EEP yields a generic device.

use enocean_core::{
    find_device_type, is_supported_eep, supported_device_types, DeviceType, EnOceanId, Eep,
    GENERIC_MANUFACTURER,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

use crate::entry::{ConfigEntry, DeviceConfig, EnOceanOptions};

pub const STEP_INIT: &str = "init";
pub const STEP_ADD_DEVICE: &str = "add_device";
pub const STEP_SELECT_DEVICE: &str = "select_device";
pub const STEP_EDIT_DEVICE: &str = "edit_device";
pub const STEP_DELETE_DEVICE: &str = "delete_device";

/// Default id shown in the add form
const DEFAULT_DEVICE_ID: &str = "00:00:00:00";

/// Errors raised while validating options flow input
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OptionsFlowError {
    #[error("invalid device id '{0}'")]
    InvalidDeviceId(String),

    #[error("invalid sender id '{0}'")]
    InvalidSenderId(String),

    #[error("unsupported EEP '{0}'")]
    InvalidEep(String),

    #[error("unknown device type '{0}'")]
    InvalidDeviceType(String),

    #[error("device {0} is already configured")]
    DeviceAlreadyConfigured(EnOceanId),

    #[error("no configured device with id '{0}'")]
    UnknownDevice(String),

    #[error("unknown step '{0}'")]
    UnknownStep(String),

    #[error("malformed user input: {0}")]
    InvalidInput(String),
}

impl OptionsFlowError {
    /// Translation key reported in form errors
    pub fn key(&self) -> &'static str {
        match self {
            OptionsFlowError::InvalidDeviceId(_) => "invalid_device_id",
            OptionsFlowError::InvalidSenderId(_) => "invalid_sender_id",
            OptionsFlowError::InvalidEep(_) => "invalid_eep",
            OptionsFlowError::InvalidDeviceType(_) => "invalid_device_type",
            OptionsFlowError::DeviceAlreadyConfigured(_) => "device_already_configured",
            OptionsFlowError::UnknownDevice(_) => "unknown_device",
            OptionsFlowError::UnknownStep(_) => "unknown_step",
            OptionsFlowError::InvalidInput(_) => "invalid_input",
        }
    }
}

/// Option of a menu or select field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub(crate) fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Form field schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,
}

impl FormField {
    pub(crate) fn string(name: &str, required: bool, default: Option<String>) -> Self {
        Self {
            name: name.to_string(),
            field_type: "string".to_string(),
            required,
            default,
            options: Vec::new(),
        }
    }

    pub(crate) fn select(name: &str, default: Option<String>, options: Vec<SelectOption>) -> Self {
        Self {
            name: name.to_string(),
            field_type: "select".to_string(),
            required: true,
            default,
            options,
        }
    }
}

/// Result of an options flow step
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FlowResult {
    Menu {
        step_id: String,
        menu_options: Vec<SelectOption>,
    },
    Form {
        step_id: String,
        data_schema: Vec<FormField>,
        errors: HashMap<String, String>,
    },
    CreateEntry {
        title: String,
        options: EnOceanOptions,
    },
}

impl FlowResult {
    pub fn step_id(&self) -> Option<&str> {
        match self {
            FlowResult::Menu { step_id, .. } | FlowResult::Form { step_id, .. } => Some(step_id),
            FlowResult::CreateEntry { .. } => None,
        }
    }

    /// The `base` error of a form, if any
    pub fn error(&self) -> Option<&str> {
        match self {
            FlowResult::Form { errors, .. } => errors.get("base").map(String::as_str),
            _ => None,
        }
    }
}

/// Raw device form input, as entered by the user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInput {
    #[serde(default)]
    pub id: String,
    /// Catalog unique id (`eep;manufacturer;model`); overrides `eep`
    #[serde(default)]
    pub device_type: Option<String>,
    #[serde(default)]
    pub eep: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub sender_id: String,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

impl DeviceInput {
    pub fn new(id: impl Into<String>, eep: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            eep: eep.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_sender_id(mut self, sender_id: impl Into<String>) -> Self {
        self.sender_id = sender_id.into();
        self
    }

    /// Pick a device type from the catalog by its unique id
    pub fn with_device_type(mut self, unique_id: impl Into<String>) -> Self {
        self.device_type = Some(unique_id.into());
        self
    }

    fn from_device(device: &DeviceConfig) -> Self {
        Self {
            id: device.id.to_string(),
            device_type: None,
            eep: device.eep.to_string(),
            name: device.name.clone(),
            sender_id: device.sender_id.map(|s| s.to_string()).unwrap_or_default(),
            manufacturer: Some(device.manufacturer.clone()),
            model: Some(device.model.clone()),
        }
    }

    /// Validate and normalize the input into a device configuration
    pub fn validate(&self) -> Result<DeviceConfig, OptionsFlowError> {
        let raw_id = self.id.trim();
        let id: EnOceanId = raw_id
            .parse()
            .map_err(|_| OptionsFlowError::InvalidDeviceId(raw_id.to_string()))?;

        let raw_sender = self.sender_id.trim();
        let sender_id = if raw_sender.is_empty() {
            None
        } else {
            Some(
                raw_sender
                    .parse::<EnOceanId>()
                    .map_err(|_| OptionsFlowError::InvalidSenderId(raw_sender.to_string()))?,
            )
        };

        let device_type = self.resolve_device_type()?;

        let name = match self.name.trim() {
            "" => format!("EnOcean device {}", id),
            name => name.to_string(),
        };

        Ok(DeviceConfig {
            id,
            eep: device_type.eep,
            name,
            sender_id,
            manufacturer: device_type.manufacturer,
            model: device_type.model,
        })
    }

    /// The chosen catalog entry, or a device type built from the bare EEP
    fn resolve_device_type(&self) -> Result<DeviceType, OptionsFlowError> {
        if let Some(unique_id) = self.device_type.as_deref().map(str::trim) {
            if !unique_id.is_empty() {
                return find_device_type(unique_id)
                    .cloned()
                    .ok_or_else(|| OptionsFlowError::InvalidDeviceType(unique_id.to_string()));
            }
        }

        let raw_eep = self.eep.trim();
        let eep: Eep = raw_eep
            .parse()
            .ok()
            .filter(is_supported_eep)
            .ok_or_else(|| OptionsFlowError::InvalidEep(raw_eep.to_string()))?;
        let manufacturer = self
            .manufacturer
            .clone()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| GENERIC_MANUFACTURER.to_string());
        Ok(DeviceType::new(
            eep,
            manufacturer,
            self.model.clone().unwrap_or_default(),
        ))
    }

    /// Catalog unique id matching this input, used as the form default
    fn catalog_id(&self) -> Option<String> {
        if let Some(unique_id) = &self.device_type {
            return Some(unique_id.clone());
        }
        let eep: Eep = self.eep.trim().parse().ok()?;
        let device_type = DeviceType::new(
            eep,
            self.manufacturer
                .clone()
                .unwrap_or_else(|| GENERIC_MANUFACTURER.to_string()),
            self.model.clone().unwrap_or_default(),
        );
        let unique_id = device_type.unique_id();
        find_device_type(&unique_id).map(|_| unique_id)
    }
}

#[derive(Debug, Deserialize)]
struct DeviceSelection {
    #[serde(alias = "device")]
    id: String,
}

/// Options flow over a config entry's device list
#[derive(Debug, Clone)]
pub struct OptionsFlow {
    options: EnOceanOptions,
    selected: Option<EnOceanId>,
}

impl OptionsFlow {
    pub fn new(entry: &ConfigEntry) -> Self {
        Self {
            options: entry.options.clone(),
            selected: None,
        }
    }

    /// Current (possibly edited) options
    pub fn options(&self) -> &EnOceanOptions {
        &self.options
    }

    /// Entry point: the management menu
    pub fn step_init(&self) -> FlowResult {
        let mut menu_options = vec![SelectOption::new(STEP_ADD_DEVICE, "Add new device")];
        if !self.options.is_empty() {
            menu_options.push(SelectOption::new(
                STEP_SELECT_DEVICE,
                "Edit configured device",
            ));
            menu_options.push(SelectOption::new(
                STEP_DELETE_DEVICE,
                "Delete configured device",
            ));
        }
        FlowResult::Menu {
            step_id: STEP_INIT.to_string(),
            menu_options,
        }
    }

    pub fn step_add_device(&mut self, input: Option<DeviceInput>) -> FlowResult {
        let Some(input) = input else {
            let defaults = DeviceInput::new(DEFAULT_DEVICE_ID, "", "EnOcean device");
            return device_form(STEP_ADD_DEVICE, &defaults, HashMap::new());
        };

        let validated = input.validate().and_then(|device| {
            if self.options.contains(&device.id) {
                Err(OptionsFlowError::DeviceAlreadyConfigured(device.id))
            } else {
                Ok(device)
            }
        });

        match validated {
            Ok(device) => {
                debug!(device_id = %device.id, eep = %device.eep, "Adding device");
                self.options.devices.push(device);
                self.create_entry()
            }
            Err(err) => device_form(STEP_ADD_DEVICE, &input, base_error(&err)),
        }
    }

    pub fn step_select_device(&mut self, device_id: Option<&str>) -> FlowResult {
        let Some(device_id) = device_id else {
            return self.device_select_form(STEP_SELECT_DEVICE, HashMap::new());
        };

        match self.find(device_id) {
            Ok(device) => {
                let input = DeviceInput::from_device(device);
                self.selected = Some(device.id);
                device_form(STEP_EDIT_DEVICE, &input, HashMap::new())
            }
            Err(err) => self.device_select_form(STEP_SELECT_DEVICE, base_error(&err)),
        }
    }

    /// Edit the device chosen in `select_device`
    ///
    /// The device id itself is fixed; only name, device type and sender id
    /// change. Manufacturer and model are kept unless another catalog type is
    /// picked or the EEP changes.
    pub fn step_edit_device(&mut self, input: Option<DeviceInput>) -> FlowResult {
        let Some(selected) = self.selected else {
            return self.device_select_form(STEP_SELECT_DEVICE, HashMap::new());
        };
        let Some(index) = self.options.devices.iter().position(|d| d.id == selected) else {
            self.selected = None;
            let err = OptionsFlowError::UnknownDevice(selected.to_string());
            return self.device_select_form(STEP_SELECT_DEVICE, base_error(&err));
        };

        let Some(mut input) = input else {
            let input = DeviceInput::from_device(&self.options.devices[index]);
            return device_form(STEP_EDIT_DEVICE, &input, HashMap::new());
        };
        input.id = selected.to_string();
        let stored = &self.options.devices[index];
        if input.device_type.is_none()
            && input.manufacturer.is_none()
            && input.eep.trim().parse::<Eep>().ok() == Some(stored.eep)
        {
            input.manufacturer = Some(stored.manufacturer.clone());
            input.model = Some(stored.model.clone());
        }

        match input.validate() {
            Ok(device) => {
                debug!(device_id = %device.id, eep = %device.eep, "Updating device");
                self.options.devices[index] = device;
                self.selected = None;
                self.create_entry()
            }
            Err(err) => device_form(STEP_EDIT_DEVICE, &input, base_error(&err)),
        }
    }

    pub fn step_delete_device(&mut self, device_id: Option<&str>) -> FlowResult {
        let Some(device_id) = device_id else {
            return self.device_select_form(STEP_DELETE_DEVICE, HashMap::new());
        };

        match self.find(device_id).map(|d| d.id) {
            Ok(id) => {
                debug!(device_id = %id, "Deleting device");
                self.options.devices.retain(|d| d.id != id);
                self.create_entry()
            }
            Err(err) => self.device_select_form(STEP_DELETE_DEVICE, base_error(&err)),
        }
    }

    /// Run a step by id with JSON user input
    pub fn handle_step(
        &mut self,
        step_id: &str,
        user_input: Option<serde_json::Value>,
    ) -> Result<FlowResult, OptionsFlowError> {
        match step_id {
            STEP_INIT => Ok(self.step_init()),
            STEP_ADD_DEVICE => Ok(self.step_add_device(parse_input(user_input)?)),
            STEP_EDIT_DEVICE => Ok(self.step_edit_device(parse_input(user_input)?)),
            STEP_SELECT_DEVICE => {
                let selection: Option<DeviceSelection> = parse_input(user_input)?;
                Ok(self.step_select_device(selection.as_ref().map(|s| s.id.as_str())))
            }
            STEP_DELETE_DEVICE => {
                let selection: Option<DeviceSelection> = parse_input(user_input)?;
                Ok(self.step_delete_device(selection.as_ref().map(|s| s.id.as_str())))
            }
            other => Err(OptionsFlowError::UnknownStep(other.to_string())),
        }
    }

    /// Devices as select options, labelled "name [id]" and sorted by label
    pub fn device_list(&self) -> Vec<SelectOption> {
        let mut list: Vec<SelectOption> = self
            .options
            .devices
            .iter()
            .map(|d| SelectOption::new(d.id.to_string(), d.label()))
            .collect();
        list.sort_by_key(|o| o.label.to_lowercase());
        list
    }

    fn find(&self, device_id: &str) -> Result<&DeviceConfig, OptionsFlowError> {
        device_id
            .trim()
            .parse::<EnOceanId>()
            .ok()
            .and_then(|id| self.options.device(&id))
            .ok_or_else(|| OptionsFlowError::UnknownDevice(device_id.to_string()))
    }

    fn device_select_form(&self, step_id: &str, errors: HashMap<String, String>) -> FlowResult {
        FlowResult::Form {
            step_id: step_id.to_string(),
            data_schema: vec![FormField::select("id", None, self.device_list())],
            errors,
        }
    }

    fn create_entry(&self) -> FlowResult {
        FlowResult::CreateEntry {
            title: String::new(),
            options: self.options.clone(),
        }
    }
}

fn parse_input<T>(user_input: Option<serde_json::Value>) -> Result<Option<T>, OptionsFlowError>
where
    T: for<'de> Deserialize<'de>,
{
    user_input
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| OptionsFlowError::InvalidInput(e.to_string()))
}

fn base_error(err: &OptionsFlowError) -> HashMap<String, String> {
    debug!(error = %err, "Rejecting options flow input");
    HashMap::from([("base".to_string(), err.key().to_string())])
}

fn device_type_options() -> Vec<SelectOption> {
    supported_device_types()
        .iter()
        .map(|t| SelectOption::new(t.unique_id(), t.label()))
        .collect()
}

fn device_form(step_id: &str, input: &DeviceInput, errors: HashMap<String, String>) -> FlowResult {
    FlowResult::Form {
        step_id: step_id.to_string(),
        data_schema: vec![
            FormField::string("id", true, Some(input.id.clone())),
            FormField::select("device_type", input.catalog_id(), device_type_options()),
            FormField::string("eep", false, Some(input.eep.clone())),
            FormField::string("name", true, Some(input.name.clone())),
            FormField::string("sender_id", false, Some(input.sender_id.clone())),
        ],
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry_with(devices: Vec<DeviceConfig>) -> ConfigEntry {
        ConfigEntry::new("/dev/ttyUSB0").with_options(EnOceanOptions::new(devices))
    }

    fn device(id: [u8; 4], name: &str) -> DeviceConfig {
        DeviceConfig::new(EnOceanId::new(id), Eep::new(0xD2, 0x05, 0x00), name)
    }

    fn menu_values(result: &FlowResult) -> Vec<String> {
        match result {
            FlowResult::Menu { menu_options, .. } => {
                menu_options.iter().map(|o| o.value.clone()).collect()
            }
            other => panic!("expected menu, got {:?}", other),
        }
    }

    fn created(result: FlowResult) -> EnOceanOptions {
        match result {
            FlowResult::CreateEntry { options, .. } => options,
            other => panic!("expected create_entry, got {:?}", other),
        }
    }

    #[test]
    fn test_menu_without_devices() {
        let flow = OptionsFlow::new(&entry_with(vec![]));
        assert_eq!(menu_values(&flow.step_init()), vec!["add_device"]);
    }

    #[test]
    fn test_menu_with_devices() {
        let flow = OptionsFlow::new(&entry_with(vec![device([1, 2, 3, 4], "Blind")]));
        assert_eq!(
            menu_values(&flow.step_init()),
            vec!["add_device", "select_device", "delete_device"]
        );
    }

    #[test]
    fn test_add_device_normalizes_ids() {
        let mut flow = OptionsFlow::new(&entry_with(vec![]));
        let input = DeviceInput::new(" 1:a2:b3:4 ", "D2-05-00", "Blind").with_sender_id("ff:aa:80:1");

        let options = created(flow.step_add_device(Some(input)));
        let added = &options.devices[0];
        assert_eq!(added.id.to_string(), "01:A2:B3:04");
        assert_eq!(added.sender_id.map(|s| s.to_string()).as_deref(), Some("FF:AA:80:01"));
    }

    #[test]
    fn test_add_device_default_name() {
        let mut flow = OptionsFlow::new(&entry_with(vec![]));
        let input = DeviceInput::new("01:02:03:04", "F6-02-01", "  ");

        let options = created(flow.step_add_device(Some(input)));
        assert_eq!(options.devices[0].name, "EnOcean device 01:02:03:04");
    }

    #[test]
    fn test_add_device_errors() {
        let mut flow = OptionsFlow::new(&entry_with(vec![device([1, 2, 3, 4], "Blind")]));

        let result = flow.step_add_device(Some(DeviceInput::new("01:02", "D2-05-00", "x")));
        assert_eq!(result.error(), Some("invalid_device_id"));
        assert_eq!(result.step_id(), Some("add_device"));

        let result = flow.step_add_device(Some(DeviceInput::new("01:02:03:123", "D2-05-00", "x")));
        assert_eq!(result.error(), Some("invalid_device_id"));

        let result = flow.step_add_device(Some(
            DeviceInput::new("05:06:07:08", "D2-05-00", "x").with_sender_id("zz:00:00:00"),
        ));
        assert_eq!(result.error(), Some("invalid_sender_id"));

        let result = flow.step_add_device(Some(DeviceInput::new("05:06:07:08", "FF-01-01", "x")));
        assert_eq!(result.error(), Some("invalid_eep"));

        let result = flow.step_add_device(Some(DeviceInput::new("1:2:3:4", "D2-05-00", "x")));
        assert_eq!(result.error(), Some("device_already_configured"));

        assert_eq!(flow.options().devices.len(), 1);
    }

    #[test]
    fn test_device_list_sorted_case_insensitive() {
        let flow = OptionsFlow::new(&entry_with(vec![
            device([0, 0, 0, 3], "kitchen"),
            device([0, 0, 0, 1], "Office"),
            device([0, 0, 0, 2], "Bathroom"),
        ]));

        let labels: Vec<String> = flow.device_list().into_iter().map(|o| o.label).collect();
        assert_eq!(
            labels,
            vec![
                "Bathroom [00:00:00:02]",
                "kitchen [00:00:00:03]",
                "Office [00:00:00:01]"
            ]
        );
    }

    #[test]
    fn test_select_and_edit_device() {
        let mut flow = OptionsFlow::new(&entry_with(vec![device([1, 2, 3, 4], "Blind")]));

        let form = flow.step_select_device(Some("01:02:03:04"));
        assert_eq!(form.step_id(), Some("edit_device"));

        let input = DeviceInput::new("ignored", "D2-05-00", "Living room blind")
            .with_sender_id("FF:AA:80:01");
        let options = created(flow.step_edit_device(Some(input)));

        assert_eq!(options.devices.len(), 1);
        assert_eq!(options.devices[0].id, EnOceanId::new([1, 2, 3, 4]));
        assert_eq!(options.devices[0].name, "Living room blind");
        assert!(options.devices[0].sender_id.is_some());
    }

    #[test]
    fn test_add_device_from_catalog() {
        let mut flow = OptionsFlow::new(&entry_with(vec![]));
        let plug = enocean_core::permundo_psc234();
        let input = DeviceInput::new("01:02:03:04", "", "Plug").with_device_type(plug.unique_id());

        let options = created(flow.step_add_device(Some(input)));
        assert_eq!(options.devices[0].device_type(), plug);

        let result = flow.step_add_device(Some(
            DeviceInput::new("05:06:07:08", "", "x").with_device_type("D2-01-09;Acme;Nothing"),
        ));
        assert_eq!(result.error(), Some("invalid_device_type"));
    }

    #[test]
    fn test_edit_keeps_named_device_type() {
        let plug = enocean_core::permundo_psc234();
        let stored = DeviceConfig::new(EnOceanId::new([1, 2, 3, 4]), plug.eep, "Plug")
            .with_model(plug.manufacturer.clone(), plug.model.clone());
        let mut flow = OptionsFlow::new(&entry_with(vec![stored]));

        match flow.step_select_device(Some("01:02:03:04")) {
            FlowResult::Form { data_schema, .. } => {
                let field = data_schema.iter().find(|f| f.name == "device_type").unwrap();
                assert_eq!(field.default, Some(plug.unique_id()));
            }
            other => panic!("expected form, got {:?}", other),
        }

        let input = DeviceInput::new("", "D2-01-09", "Kitchen plug");
        let options = created(flow.step_edit_device(Some(input)));
        assert_eq!(options.devices[0].name, "Kitchen plug");
        assert_eq!(options.devices[0].device_type(), plug);
    }

    #[test]
    fn test_select_unknown_device() {
        let mut flow = OptionsFlow::new(&entry_with(vec![device([1, 2, 3, 4], "Blind")]));
        let result = flow.step_select_device(Some("09:09:09:09"));
        assert_eq!(result.error(), Some("unknown_device"));
    }

    #[test]
    fn test_delete_device() {
        let mut flow = OptionsFlow::new(&entry_with(vec![
            device([1, 2, 3, 4], "Blind"),
            device([5, 6, 7, 8], "Switch"),
        ]));

        let options = created(flow.step_delete_device(Some("01:02:03:04")));
        assert_eq!(options.devices.len(), 1);
        assert_eq!(options.devices[0].name, "Switch");

        let result = flow.step_delete_device(Some("01:02:03:04"));
        assert_eq!(result.error(), Some("unknown_device"));
    }

    #[test]
    fn test_handle_step_json() {
        let mut flow = OptionsFlow::new(&entry_with(vec![]));

        let form = flow.handle_step("add_device", None).unwrap();
        assert_eq!(form.step_id(), Some("add_device"));

        let result = flow
            .handle_step(
                "add_device",
                Some(json!({"id": "01:02:03:04", "eep": "D2-05-00", "name": "Blind"})),
            )
            .unwrap();
        assert_eq!(created(result).devices.len(), 1);

        let result = flow
            .handle_step("delete_device", Some(json!({"id": "01:02:03:04"})))
            .unwrap();
        assert!(created(result).is_empty());

        assert_eq!(
            flow.handle_step("reticulate", None).unwrap_err().key(),
            "unknown_step"
        );
        assert!(matches!(
            flow.handle_step("add_device", Some(json!(42))),
            Err(OptionsFlowError::InvalidInput(_))
        ));
    }
}
