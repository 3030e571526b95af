//! EnOcean switches (EEP D2-01, electronic switches and dimmers)
//!
//! One entity per output channel. Commands are "actuator set output"
//! telegrams; the state follows the actuator's status replies. Devices that
//! also send A5-12-01 meter readings (Permundo PSC234) are switched on when
//! a current value above 1 W arrives.

use enocean_config_entries::DeviceConfig;
use enocean_core::{EnOceanId, Rorg, Telegram};
use std::sync::Mutex;
use tracing::{debug, trace};

use crate::entity::{lock, EntityContext, EntityInfo};
use crate::sensor::parse_meter_reading;
use crate::state_store::EntityState;

/// Actuator set output
const CMD_SET_OUTPUT: u8 = 0x01;
/// Actuator status response
const CMD_STATUS_RESPONSE: u8 = 0x04;
/// Output value for "on" (100 %)
const OUTPUT_ON: u8 = 0x64;

/// Power above which a metering switch is considered on, in W
const POWER_ON_THRESHOLD: f64 = 1.0;

/// Number of output channels of a D2-01 type
pub fn channel_count(eep_type: u8) -> u8 {
    match eep_type {
        0x00..=0x0F => 1,
        0x10..=0x12 => 2,
        0x13 => 4,
        0x14 => 8,
        _ => 0,
    }
}

/// "Actuator set output" telegram for one channel
pub fn set_output_telegram(
    channel: u8,
    on: bool,
    sender: EnOceanId,
    destination: EnOceanId,
) -> Telegram {
    let value = if on { OUTPUT_ON } else { 0x00 };
    Telegram::new(Rorg::Vld, vec![CMD_SET_OUTPUT, channel, value], sender).to(destination)
}

/// A single switch channel
pub struct Switch {
    info: EntityInfo,
    channel: u8,
    sender_id: EnOceanId,
    ctx: EntityContext,
    on: Mutex<bool>,
}

impl Switch {
    pub fn new(device: &DeviceConfig, channel: u8, name: &str, ctx: EntityContext) -> Self {
        let suffix = format!("switch-{}", channel);
        Self {
            info: EntityInfo::for_device(device, Some(name), Some(&suffix)),
            channel,
            sender_id: device.sender_or_default(),
            ctx,
            on: Mutex::new(false),
        }
    }

    pub fn info(&self) -> &EntityInfo {
        &self.info
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    pub fn is_on(&self) -> bool {
        *lock(&self.on)
    }

    pub fn turn_on(&self) {
        self.switch(true);
    }

    pub fn turn_off(&self) {
        self.switch(false);
    }

    fn switch(&self, on: bool) {
        debug!(unique_id = %self.info.unique_id, on, "Switching");
        self.ctx.send(set_output_telegram(
            self.channel,
            on,
            self.sender_id,
            self.info.device_id,
        ));
        self.set_on(on);
    }

    pub fn handle_telegram(&self, telegram: &Telegram) {
        match telegram.rorg {
            Rorg::Bs4 => {
                let Some(reading) = parse_meter_reading(telegram) else {
                    return;
                };
                if reading.is_current && reading.value > POWER_ON_THRESHOLD {
                    self.set_on(true);
                }
            }
            Rorg::Vld => {
                let (Some(cmd), Some(io), Some(ov)) =
                    (telegram.byte(0), telegram.byte(1), telegram.byte(2))
                else {
                    return;
                };
                if cmd & 0x0F != CMD_STATUS_RESPONSE {
                    return;
                }
                if io & 0x1F == self.channel {
                    self.set_on(ov & 0x7F > 0);
                }
            }
            other => trace!(rorg = ?other, "Ignoring telegram"),
        }
    }

    fn set_on(&self, on: bool) {
        let mut state = lock(&self.on);
        *state = on;
        self.ctx
            .publish(&self.info, EntityState::new(if on { "on" } else { "off" }));
    }
}
