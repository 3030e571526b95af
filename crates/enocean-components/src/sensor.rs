//! EnOcean sensors
//!
//! - Temperature: A5-02 (8 bit), A5-04, A5-10 room operating panels
//! - Humidity: A5-04, A5-10-10 to A5-10-14
//! - Power: A5-12-01 automated meter reading
//! - Window handle: F6-10-00

use enocean_config_entries::DeviceConfig;
use enocean_core::{Rorg, Telegram};
use serde_json::json;
use std::sync::Mutex;
use tracing::trace;

use crate::entity::{lock, EntityContext, EntityInfo};
use crate::state_store::EntityState;

/// A decoded A5-12-01 meter reading
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeterReading {
    /// Reading divided by its decimal divisor
    pub value: f64,
    /// `true` for a current value (W), `false` for a cumulative one (kWh)
    pub is_current: bool,
}

/// Decode an A5-12-01 telegram
///
/// DB3..DB1 hold the 24 bit meter reading, DB0 bit 2 the data type and
/// bits 1..0 the decimal divisor exponent.
pub fn parse_meter_reading(telegram: &Telegram) -> Option<MeterReading> {
    if telegram.rorg != Rorg::Bs4 {
        return None;
    }
    let bytes: [u8; 4] = telegram.payload.get(..4)?.try_into().ok()?;
    let [db3, db2, db1, db0] = bytes;

    let raw = u32::from(db3) << 16 | u32::from(db2) << 8 | u32::from(db1);
    let divisor = 10f64.powi(i32::from(db0 & 0x03));
    Some(MeterReading {
        value: f64::from(raw) / divisor,
        is_current: db0 & 0x04 != 0,
    })
}

fn round1(value: f64) -> f64 {
    // + 0.0 turns -0.0 into 0.0
    (value * 10.0).round() / 10.0 + 0.0
}

/// Linear mapping of a raw byte onto a temperature scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureScale {
    pub scale_min: f64,
    pub scale_max: f64,
    pub range_from: f64,
    pub range_to: f64,
}

impl TemperatureScale {
    pub fn new(scale_min: i16, scale_max: i16, range_from: u8, range_to: u8) -> Self {
        Self {
            scale_min: f64::from(scale_min),
            scale_max: f64::from(scale_max),
            range_from: f64::from(range_from),
            range_to: f64::from(range_to),
        }
    }

    /// Temperature in °C, rounded to one decimal
    pub fn convert(&self, raw: u8) -> f64 {
        let scale = self.scale_max - self.scale_min;
        let range = self.range_to - self.range_from;
        round1(scale / range * (f64::from(raw) - self.range_from) + self.scale_min)
    }
}

/// Position of a window handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlePosition {
    Closed,
    Open,
    Tilt,
}

impl HandlePosition {
    /// Decode the action nibble of an F6-10-00 telegram
    pub fn from_action(action: u8) -> Option<Self> {
        match action {
            0x07 => Some(HandlePosition::Closed),
            0x04 | 0x06 => Some(HandlePosition::Open),
            0x05 => Some(HandlePosition::Tilt),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HandlePosition::Closed => "closed",
            HandlePosition::Open => "open",
            HandlePosition::Tilt => "tilt",
        }
    }
}

/// What a sensor measures
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SensorKind {
    Temperature(TemperatureScale),
    Humidity,
    Power,
    WindowHandle,
}

impl SensorKind {
    /// Unique id suffix
    pub fn key(&self) -> &'static str {
        match self {
            SensorKind::Temperature(_) => "temperature",
            SensorKind::Humidity => "humidity",
            SensorKind::Power => "powersensor",
            SensorKind::WindowHandle => "windowhandle",
        }
    }

    pub fn unit(&self) -> Option<&'static str> {
        match self {
            SensorKind::Temperature(_) => Some("°C"),
            SensorKind::Humidity => Some("%"),
            SensorKind::Power => Some("W"),
            SensorKind::WindowHandle => None,
        }
    }

    /// Decode the value carried by a telegram, if it carries one
    pub fn decode(&self, telegram: &Telegram) -> Option<SensorValue> {
        match self {
            SensorKind::Temperature(scale) => {
                if telegram.rorg != Rorg::Bs4 {
                    return None;
                }
                telegram
                    .byte(2)
                    .map(|raw| SensorValue::Number(scale.convert(raw)))
            }
            SensorKind::Humidity => {
                if telegram.rorg != Rorg::Bs4 {
                    return None;
                }
                telegram
                    .byte(1)
                    .map(|raw| SensorValue::Number(round1(f64::from(raw) * 100.0 / 250.0)))
            }
            SensorKind::Power => parse_meter_reading(telegram)
                .filter(|r| r.is_current)
                .map(|r| SensorValue::Number(r.value)),
            SensorKind::WindowHandle => telegram
                .byte(0)
                .and_then(|b| HandlePosition::from_action((b & 0x70) >> 4))
                .map(SensorValue::Handle),
        }
    }
}

/// A sensor reading
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SensorValue {
    Number(f64),
    Handle(HandlePosition),
}

impl SensorValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            SensorValue::Number(n) => Some(*n),
            SensorValue::Handle(_) => None,
        }
    }
}

/// A sensor entity
pub struct Sensor {
    info: EntityInfo,
    kind: SensorKind,
    ctx: EntityContext,
    value: Mutex<Option<SensorValue>>,
}

impl Sensor {
    pub fn new(device: &DeviceConfig, kind: SensorKind, name: Option<&str>, ctx: EntityContext) -> Self {
        Self {
            info: EntityInfo::for_device(device, name, Some(kind.key())),
            kind,
            ctx,
            value: Mutex::new(None),
        }
    }

    pub fn info(&self) -> &EntityInfo {
        &self.info
    }

    pub fn kind(&self) -> SensorKind {
        self.kind
    }

    pub fn value(&self) -> Option<SensorValue> {
        *lock(&self.value)
    }

    pub fn handle_telegram(&self, telegram: &Telegram) {
        let Some(value) = self.kind.decode(telegram) else {
            trace!(unique_id = %self.info.unique_id, "Telegram carries no value for this sensor");
            return;
        };

        let mut current = lock(&self.value);
        *current = Some(value);
        self.ctx.publish(&self.info, self.entity_state(value));
    }

    fn entity_state(&self, value: SensorValue) -> EntityState {
        let state = match value {
            SensorValue::Number(n) => n.to_string(),
            SensorValue::Handle(h) => h.as_str().to_string(),
        };
        let mut entity_state = EntityState::new(state);
        if let Some(unit) = self.kind.unit() {
            entity_state = entity_state.with_attribute("unit_of_measurement", json!(unit));
        }
        entity_state
    }
}
