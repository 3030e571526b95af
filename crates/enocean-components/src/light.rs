//! Dimmable lights (Eltako FUD61NPN)
//!
//! The dimmer is driven with 4BS "central command" telegrams carrying a
//! dim value in percent and reports its level in the same format.

use enocean_config_entries::DeviceConfig;
use enocean_core::{EnOceanId, Rorg, Telegram};
use serde_json::json;
use std::sync::Mutex;
use tracing::debug;

use crate::entity::{lock, EntityContext, EntityInfo};
use crate::state_store::EntityState;

/// DB3 value of a dimming command/report
const DIM_COMMAND: u8 = 0x02;
/// DB1: dimming speed
const DIM_SPEED: u8 = 0x01;
/// DB0: data telegram, switched on, absolute value
const DIM_FLAGS: u8 = 0x09;

/// Brightness (0..=255) as dim value in percent, at least 1
pub fn brightness_to_percent(brightness: u8) -> u8 {
    let percent = u32::from(brightness) * 100 / 256;
    u8::try_from(percent).unwrap_or(100).max(1)
}

/// Dim value in percent as brightness, saturating at 255
pub fn percent_to_brightness(percent: u8) -> u8 {
    u8::try_from(u32::from(percent) * 256 / 100).unwrap_or(u8::MAX)
}

/// Dimming telegram; a percent of 0 switches off
pub fn dim_telegram(percent: u8, sender: EnOceanId, destination: EnOceanId) -> Telegram {
    Telegram::new(
        Rorg::Bs4,
        vec![DIM_COMMAND, percent, DIM_SPEED, DIM_FLAGS],
        sender,
    )
    .to(destination)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LightState {
    on: bool,
    brightness: u8,
}

/// A dimmable light
pub struct Light {
    info: EntityInfo,
    sender_id: EnOceanId,
    ctx: EntityContext,
    state: Mutex<LightState>,
}

impl Light {
    pub fn new(device: &DeviceConfig, ctx: EntityContext) -> Self {
        Self {
            info: EntityInfo::for_device(device, None, Some("light")),
            sender_id: device.sender_or_default(),
            ctx,
            state: Mutex::new(LightState {
                on: false,
                brightness: 50,
            }),
        }
    }

    pub fn info(&self) -> &EntityInfo {
        &self.info
    }

    pub fn is_on(&self) -> bool {
        lock(&self.state).on
    }

    pub fn brightness(&self) -> u8 {
        lock(&self.state).brightness
    }

    /// Switch on, optionally at a new brightness
    pub fn turn_on(&self, brightness: Option<u8>) {
        let mut state = lock(&self.state);
        if let Some(brightness) = brightness {
            state.brightness = brightness;
        }
        let percent = brightness_to_percent(state.brightness);
        debug!(unique_id = %self.info.unique_id, percent, "Turning light on");

        self.ctx
            .send(dim_telegram(percent, self.sender_id, self.info.device_id));
        state.on = true;
        self.publish(&state);
    }

    pub fn turn_off(&self) {
        let mut state = lock(&self.state);
        debug!(unique_id = %self.info.unique_id, "Turning light off");

        self.ctx
            .send(dim_telegram(0, self.sender_id, self.info.device_id));
        state.on = false;
        self.publish(&state);
    }

    pub fn handle_telegram(&self, telegram: &Telegram) {
        if telegram.rorg != Rorg::Bs4 || telegram.byte(0) != Some(DIM_COMMAND) {
            return;
        }
        let Some(percent) = telegram.byte(1) else {
            return;
        };

        let mut state = lock(&self.state);
        state.brightness = percent_to_brightness(percent);
        state.on = percent != 0;
        self.publish(&state);
    }

    fn publish(&self, state: &LightState) {
        let entity_state = EntityState::new(if state.on { "on" } else { "off" })
            .with_attribute("brightness", json!(state.brightness));
        self.ctx.publish(&self.info, entity_state);
    }
}
