//! Rocker switches (EEP F6-02-01, F6-02-02)
//!
//! Wall switches are stateless senders; every telegram fires a
//! `button_pressed` event. The entity state reflects whether a button is
//! currently held down.

use enocean_config_entries::DeviceConfig;
use enocean_core::events::{ButtonPressedData, IntegrationEvent};
use enocean_core::Telegram;
use serde_json::json;
use std::sync::Mutex;
use tracing::debug;

use crate::entity::{lock, EntityContext, EntityInfo};
use crate::state_store::EntityState;

/// Status byte of a "pressed" telegram (T21 and NU set)
const STATUS_PUSHED: u8 = 0x30;
/// Status byte of a "released" telegram
const STATUS_RELEASED: u8 = 0x20;

/// Decode pushed/released from the status byte
pub fn decode_pushed(status: u8) -> Option<bool> {
    match status {
        STATUS_PUSHED => Some(true),
        STATUS_RELEASED => Some(false),
        _ => None,
    }
}

/// Decode `(which, onoff)` from the action byte
///
/// `which` is 0 for rocker A, 1 for rocker B and 10 for both; `onoff` is 0
/// for the I side and 1 for the O side.
pub fn decode_action(action: u8) -> Option<(u8, u8)> {
    match action {
        0x70 => Some((0, 0)),
        0x50 => Some((0, 1)),
        0x30 => Some((1, 0)),
        0x10 => Some((1, 1)),
        0x37 => Some((10, 0)),
        0x15 => Some((10, 1)),
        _ => None,
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Buttons {
    which: Option<u8>,
    onoff: Option<u8>,
    pushed: Option<bool>,
}

/// A rocker switch
pub struct BinarySensor {
    info: EntityInfo,
    ctx: EntityContext,
    buttons: Mutex<Buttons>,
}

impl BinarySensor {
    pub fn new(device: &DeviceConfig, ctx: EntityContext) -> Self {
        Self {
            info: EntityInfo::for_device(device, None, Some("binary_sensor-0")),
            ctx,
            buttons: Mutex::new(Buttons::default()),
        }
    }

    pub fn info(&self) -> &EntityInfo {
        &self.info
    }

    /// Whether a button is held down, `None` if not yet known
    pub fn is_on(&self) -> Option<bool> {
        lock(&self.buttons).pushed
    }

    pub fn handle_telegram(&self, telegram: &Telegram) {
        let Some(action) = telegram.byte(0) else {
            return;
        };

        let data = {
            let mut buttons = lock(&self.buttons);
            buttons.pushed = decode_pushed(telegram.status);
            // The last rocker stays current when a release carries no action
            if let Some((which, onoff)) = decode_action(action) {
                buttons.which = Some(which);
                buttons.onoff = Some(onoff);
            }

            let state = match buttons.pushed {
                Some(true) => "on",
                Some(false) => "off",
                None => enocean_core::STATE_UNKNOWN,
            };
            self.ctx.publish(
                &self.info,
                EntityState::new(state)
                    .with_attribute("which", json!(buttons.which))
                    .with_attribute("onoff", json!(buttons.onoff)),
            );

            ButtonPressedData {
                id: self.info.device_id,
                pushed: buttons.pushed,
                which: buttons.which,
                onoff: buttons.onoff,
            }
        };

        debug!(
            device_id = %data.id,
            pushed = ?data.pushed,
            which = ?data.which,
            onoff = ?data.onoff,
            "Button event"
        );
        self.ctx.fire(IntegrationEvent::ButtonPressed(data));
    }
}
