//! Shared entity plumbing
//!
//! Every EnOcean entity carries an [`EntityInfo`] describing the device it
//! belongs to, and an [`EntityContext`] through which it transmits
//! telegrams and publishes its state.

use enocean_config_entries::{DeviceConfig, DeviceIdentifier};
use enocean_core::events::IntegrationEvent;
use enocean_core::{DeviceType, EnOceanId, Telegram, DOMAIN};
use enocean_dispatcher::TelegramSender;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::state_store::{EntityState, SharedStateStore};

/// Device registry information of an entity's device
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub identifiers: Vec<DeviceIdentifier>,
    pub name: String,
    pub manufacturer: String,
    pub model: String,
}

/// Identity of an entity and its device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityInfo {
    pub device_id: EnOceanId,
    pub device_name: String,
    pub device_type: DeviceType,
    /// Entity name within the device; `None` uses the device name
    pub name: Option<String>,
    pub unique_id: String,
}

impl EntityInfo {
    /// Entity info for a configured device, with `suffix` appended to the
    /// unique id (`"AA:BB:CC:DD-suffix"`)
    pub fn for_device(device: &DeviceConfig, name: Option<&str>, suffix: Option<&str>) -> Self {
        let unique_id = match suffix {
            Some(suffix) => format!("{}-{}", device.id, suffix),
            None => device.id.to_string(),
        };
        Self {
            device_id: device.id,
            device_name: device.name.clone(),
            device_type: device.device_type(),
            name: name.map(str::to_string),
            unique_id,
        }
    }

    /// Full display name: device name plus entity name
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => format!("{} {}", self.device_name, name),
            None => self.device_name.clone(),
        }
    }

    pub fn device_info(&self) -> DeviceInfo {
        DeviceInfo {
            identifiers: vec![DeviceIdentifier::new(DOMAIN, self.device_id.to_string())],
            name: self.device_name.clone(),
            manufacturer: self.device_type.manufacturer.clone(),
            model: self.device_type.model.clone(),
        }
    }
}

/// Outbound and publishing handles shared by all entities
#[derive(Clone)]
pub struct EntityContext {
    sender: Arc<dyn TelegramSender>,
    states: SharedStateStore,
}

impl EntityContext {
    pub fn new(sender: Arc<dyn TelegramSender>, states: SharedStateStore) -> Self {
        Self { sender, states }
    }

    /// Hand a telegram to the transport
    pub fn send(&self, telegram: Telegram) {
        self.sender.send_telegram(telegram);
    }

    pub fn publish(&self, info: &EntityInfo, state: EntityState) -> bool {
        self.states.set(&info.unique_id, state)
    }

    pub fn fire(&self, event: IntegrationEvent) {
        self.states.fire(event);
    }

    pub fn states(&self) -> &SharedStateStore {
        &self.states
    }
}

/// Lock a mutex, recovering the data if a holder panicked
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
