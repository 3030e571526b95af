//! Entity platforms
//!
//! [`Platform`] is the closed set of entity kinds the integration creates.
//! [`entities_for_device`] maps a configured device onto its entities.

use enocean_config_entries::{DeviceConfig, WatchdogConfig};
use enocean_core::{a5_02_temperature_range, permundo_psc234, Telegram};
use tracing::{debug, warn};

use crate::binary_sensor::BinarySensor;
use crate::cover::Cover;
use crate::entity::{EntityContext, EntityInfo};
use crate::light::Light;
use crate::sensor::{Sensor, SensorKind, TemperatureScale};
use crate::switch::{channel_count, Switch};

/// An entity of one of the supported kinds
pub enum Platform {
    Cover(Cover),
    Switch(Switch),
    Light(Light),
    BinarySensor(BinarySensor),
    Sensor(Sensor),
}

impl Platform {
    /// Platform domain name
    pub fn domain(&self) -> &'static str {
        match self {
            Platform::Cover(_) => "cover",
            Platform::Switch(_) => "switch",
            Platform::Light(_) => "light",
            Platform::BinarySensor(_) => "binary_sensor",
            Platform::Sensor(_) => "sensor",
        }
    }

    pub fn info(&self) -> &EntityInfo {
        match self {
            Platform::Cover(e) => e.info(),
            Platform::Switch(e) => e.info(),
            Platform::Light(e) => e.info(),
            Platform::BinarySensor(e) => e.info(),
            Platform::Sensor(e) => e.info(),
        }
    }

    pub fn unique_id(&self) -> &str {
        &self.info().unique_id
    }

    /// Handle a telegram sent by the entity's device
    pub fn handle_telegram(&self, telegram: &Telegram) {
        match self {
            Platform::Cover(e) => e.handle_telegram(telegram),
            Platform::Switch(e) => e.handle_telegram(telegram),
            Platform::Light(e) => e.handle_telegram(telegram),
            Platform::BinarySensor(e) => e.handle_telegram(telegram),
            Platform::Sensor(e) => e.handle_telegram(telegram),
        }
    }

    /// Called once the entity is registered
    pub fn on_added(&self) {
        if let Platform::Cover(cover) = self {
            cover.on_added();
        }
    }

    /// Called before the entity is dropped
    pub fn on_removed(&self) {
        if let Platform::Cover(cover) = self {
            cover.on_removed();
        }
    }

    pub fn as_cover(&self) -> Option<&Cover> {
        match self {
            Platform::Cover(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_switch(&self) -> Option<&Switch> {
        match self {
            Platform::Switch(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_light(&self) -> Option<&Light> {
        match self {
            Platform::Light(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_binary_sensor(&self) -> Option<&BinarySensor> {
        match self {
            Platform::BinarySensor(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_sensor(&self) -> Option<&Sensor> {
        match self {
            Platform::Sensor(s) => Some(s),
            _ => None,
        }
    }
}

/// Temperature (and humidity) sensors of 4BS climate profiles
fn climate_sensors(device: &DeviceConfig, ctx: &EntityContext) -> Vec<Platform> {
    let eep = device.eep;
    let temperature = |scale: TemperatureScale, name: Option<&str>| {
        Platform::Sensor(Sensor::new(
            device,
            SensorKind::Temperature(scale),
            name,
            ctx.clone(),
        ))
    };
    let humidity = || {
        Platform::Sensor(Sensor::new(
            device,
            SensorKind::Humidity,
            Some("Humidity"),
            ctx.clone(),
        ))
    };

    match (eep.func(), eep.eep_type()) {
        (0x02, t) => match a5_02_temperature_range(t) {
            Some((min, max)) => vec![temperature(TemperatureScale::new(min, max, 255, 0), None)],
            None => Vec::new(),
        },
        (0x04, 0x01) => vec![
            temperature(TemperatureScale::new(0, 40, 0, 250), Some("Temperature")),
            humidity(),
        ],
        (0x04, 0x02) => vec![
            temperature(TemperatureScale::new(-20, 60, 0, 250), Some("Temperature")),
            humidity(),
        ],
        (0x10, 0x01..=0x0F) => vec![temperature(
            TemperatureScale::new(0, 40, 255, 0),
            Some("Temperature"),
        )],
        (0x10, 0x10..=0x14) => vec![
            temperature(TemperatureScale::new(0, 40, 0, 255), Some("Temperature")),
            humidity(),
        ],
        _ => Vec::new(),
    }
}

/// Create the entities of a configured device
///
/// Unsupported EEPs yield no entities.
pub fn entities_for_device(
    device: &DeviceConfig,
    ctx: &EntityContext,
    watchdog: WatchdogConfig,
) -> Vec<Platform> {
    let eep = device.eep;
    let device_type = device.device_type();

    let entities = match (eep.rorg(), eep.func(), eep.eep_type()) {
        (0xD2, 0x05, 0x00) => vec![Platform::Cover(Cover::new(device, ctx.clone(), watchdog))],
        (0xD2, 0x01, t) => {
            let channels = channel_count(t);
            let mut entities: Vec<Platform> = (0..channels)
                .map(|channel| {
                    let name = if channels == 1 {
                        "Switch".to_string()
                    } else {
                        format!("Switch {}", channel + 1)
                    };
                    Platform::Switch(Switch::new(device, channel, &name, ctx.clone()))
                })
                .collect();
            if device_type.matches(&permundo_psc234()) {
                entities.push(Platform::Sensor(Sensor::new(
                    device,
                    SensorKind::Power,
                    Some("Power usage"),
                    ctx.clone(),
                )));
            }
            entities
        }
        (0xA5, 0x38, 0x08) => vec![Platform::Light(Light::new(device, ctx.clone()))],
        (0xA5, 0x02 | 0x04 | 0x10, _) => climate_sensors(device, ctx),
        (0xA5, 0x12, 0x01) => vec![Platform::Sensor(Sensor::new(
            device,
            SensorKind::Power,
            Some("Power"),
            ctx.clone(),
        ))],
        (0xF6, 0x02, 0x01 | 0x02) => {
            vec![Platform::BinarySensor(BinarySensor::new(device, ctx.clone()))]
        }
        (0xF6, 0x10, 0x00) => vec![Platform::Sensor(Sensor::new(
            device,
            SensorKind::WindowHandle,
            Some("Window handle"),
            ctx.clone(),
        ))],
        _ => Vec::new(),
    };

    if entities.is_empty() {
        warn!(device_id = %device.id, eep = %eep, "Unsupported EEP, device skipped");
    } else {
        debug!(
            device_id = %device.id,
            eep = %eep,
            entities = entities.len(),
            "Created entities"
        );
    }
    entities
}
