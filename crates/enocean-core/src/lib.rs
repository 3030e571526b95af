//! Core types for the EnOcean integration
//!
//! This crate provides the fundamental types shared by the other crates:
//! EnOceanId, Eep/Rorg, DeviceType and Telegram, plus the integration's
//! event payloads.

mod device_type;
mod enocean_id;
mod eep;
mod telegram;

pub use device_type::{
    a5_02_temperature_range, eltako_fud61, find_device_type, is_supported_eep,
    permundo_psc234, supported_device_types, DeviceType, GENERIC_MANUFACTURER,
};
pub use eep::{Eep, EepError, Rorg};
pub use enocean_id::{EnOceanId, EnOceanIdError};
pub use telegram::Telegram;

/// Integration domain
pub const DOMAIN: &str = "enocean";

/// State value used when an entity's state is not known
pub const STATE_UNKNOWN: &str = "unknown";

/// Events fired by the integration
pub mod events {
    use super::*;
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};
    use std::collections::HashMap;

    /// Event type for entity state changes
    pub const STATE_CHANGED: &str = "state_changed";

    /// Event type for rocker switch presses
    pub const BUTTON_PRESSED: &str = "button_pressed";

    /// Data for STATE_CHANGED events
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct StateChangedData {
        pub unique_id: String,
        pub old_state: Option<String>,
        pub new_state: String,
        #[serde(default)]
        pub attributes: HashMap<String, serde_json::Value>,
        pub last_changed: DateTime<Utc>,
    }

    /// Data for BUTTON_PRESSED events
    ///
    /// `which` identifies the rocker (0 = A, 1 = B, 10 = both),
    /// `onoff` the side (0 = I, 1 = O). Unknown values are `None`.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ButtonPressedData {
        pub id: EnOceanId,
        pub pushed: Option<bool>,
        pub which: Option<u8>,
        pub onoff: Option<u8>,
    }

    /// An event fired on the integration's event stream
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(tag = "event_type", content = "data", rename_all = "snake_case")]
    pub enum IntegrationEvent {
        StateChanged(StateChangedData),
        ButtonPressed(ButtonPressedData),
    }

    impl IntegrationEvent {
        pub fn event_type(&self) -> &'static str {
            match self {
                IntegrationEvent::StateChanged(_) => STATE_CHANGED,
                IntegrationEvent::ButtonPressed(_) => BUTTON_PRESSED,
            }
        }
    }
}
