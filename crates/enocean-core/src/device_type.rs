//! Supported EnOcean device types
//!
//! A device type is an EEP plus the manufacturer and model that implement
//! it. Generic profiles use the manufacturer "Generic"; a handful of named
//! devices are listed explicitly because their behaviour deviates from (or
//! extends) the generic profile.

use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::eep::Eep;

/// Manufacturer used for generic EEP entries
pub const GENERIC_MANUFACTURER: &str = "Generic";

/// A supported device type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceType {
    pub eep: Eep,
    #[serde(default = "default_manufacturer")]
    pub manufacturer: String,
    #[serde(default)]
    pub model: String,
}

fn default_manufacturer() -> String {
    GENERIC_MANUFACTURER.to_string()
}

impl DeviceType {
    pub fn new(eep: Eep, manufacturer: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            eep,
            manufacturer: manufacturer.into(),
            model: model.into(),
        }
    }

    /// A generic device type for a bare EEP
    pub fn generic(eep: Eep, model: impl Into<String>) -> Self {
        Self::new(eep, GENERIC_MANUFACTURER, model)
    }

    /// Stable identifier: `eep;manufacturer;model` with separators stripped
    pub fn unique_id(&self) -> String {
        format!(
            "{};{};{}",
            self.eep,
            self.manufacturer.replace(';', ""),
            self.model.replace(';', "")
        )
    }

    /// Label shown in selection lists
    pub fn label(&self) -> String {
        format!("{} {}", self.manufacturer, self.model)
    }

    /// Check if this is the same device as `other` (EEP, manufacturer, model)
    pub fn matches(&self, other: &DeviceType) -> bool {
        self.eep == other.eep && self.manufacturer == other.manufacturer && self.model == other.model
    }
}

/// Temperature scale of an 8 bit A5-02 (or A5-10) sensor type, in °C
pub fn a5_02_temperature_range(eep_type: u8) -> Option<(i16, i16)> {
    match eep_type {
        0x01..=0x0B => {
            let multiplier = i16::from(eep_type - 0x01);
            Some((-40 + multiplier * 10, multiplier * 10))
        }
        0x10..=0x1B => {
            let multiplier = i16::from(eep_type - 0x10);
            Some((-60 + multiplier * 10, 20 + multiplier * 10))
        }
        _ => None,
    }
}

pub fn eltako_fud61() -> DeviceType {
    DeviceType::new(Eep::new(0xA5, 0x38, 0x08), "Eltako", "FUD61NPN")
}

pub fn permundo_psc234() -> DeviceType {
    DeviceType::new(
        Eep::new(0xD2, 0x01, 0x09),
        "Permundo",
        "PSC234 (switch and power monitor)",
    )
}

fn signed(value: i16) -> String {
    if value > 0 {
        format!("+{}", value)
    } else {
        value.to_string()
    }
}

fn build_catalog() -> Vec<DeviceType> {
    let mut types = Vec::new();

    // A5-02 temperature sensors
    for eep_type in (0x01..=0x0B).chain(0x10..=0x1B) {
        if let Some((min, max)) = a5_02_temperature_range(eep_type) {
            let eep = Eep::new(0xA5, 0x02, eep_type);
            types.push(DeviceType::generic(
                eep,
                format!(
                    "EEP {} (Temperature Sensor Range {} °C to {} °C)",
                    eep,
                    signed(min),
                    signed(max)
                ),
            ));
        }
    }

    // A5-04 temperature and humidity sensors
    types.push(DeviceType::generic(
        Eep::new(0xA5, 0x04, 0x01),
        "EEP A5-04-01 (Temp. and Humidity Sensor, Range 0°C to +40°C and 0% to 100%)",
    ));
    types.push(DeviceType::generic(
        Eep::new(0xA5, 0x04, 0x02),
        "EEP A5-04-02 (Temp. and Humidity Sensor, Range -20°C to +60°C and 0% to 100%)",
    ));

    // A5-10 room operating panels
    for eep_type in (0x01..=0x0D).chain(0x10..=0x14) {
        let eep = Eep::new(0xA5, 0x10, eep_type);
        types.push(DeviceType::generic(
            eep,
            format!("EEP {} (Room Operating Panel)", eep),
        ));
    }

    types.push(DeviceType::generic(
        Eep::new(0xA5, 0x12, 0x01),
        "EEP A5-12-01 (Automated Meter Reading, Electricity)",
    ));

    // D2-01 electronic switches (type 02 does not exist)
    for eep_type in (0x00..=0x14).filter(|t| *t != 0x02) {
        let eep = Eep::new(0xD2, 0x01, eep_type);
        types.push(DeviceType::generic(
            eep,
            format!(
                "EEP {} (Electronic Switches and Dimmers with Energy Measurement and Local Control, Type {:02X})",
                eep, eep_type
            ),
        ));
    }

    types.push(DeviceType::generic(
        Eep::new(0xD2, 0x05, 0x00),
        "EEP D2-05-00 (Blinds Control for Position and Angle)",
    ));

    types.push(DeviceType::generic(
        Eep::new(0xF6, 0x02, 0x01),
        "EEP F6-02-01 (Light and Blind Control - Application Style 2)",
    ));
    types.push(DeviceType::generic(
        Eep::new(0xF6, 0x02, 0x02),
        "EEP F6-02-02 (Light and Blind Control - Application Style 1)",
    ));
    types.push(DeviceType::generic(
        Eep::new(0xF6, 0x10, 0x00),
        "EEP F6-10-00 (Mechanical Handle - Window Handle)",
    ));

    // Named devices
    let rocker = Eep::new(0xF6, 0x02, 0x01);
    types.push(eltako_fud61());
    types.push(DeviceType::new(rocker, "Eltako", "FT55 battery-less wall switch"));
    types.push(DeviceType::new(
        Eep::new(0xF6, 0x10, 0x00),
        "Hoppe",
        "SecuSignal window handle from Somfy",
    ));
    types.push(DeviceType::new(rocker, "Jung", "ENO Series"));
    types.push(DeviceType::new(Eep::new(0xD2, 0x01, 0x0F), "NodOn", "SIN-2-1-01"));
    types.push(DeviceType::new(Eep::new(0xD2, 0x01, 0x12), "NodOn", "SIN-2-2-01"));
    types.push(DeviceType::new(rocker, "Omnio", "WS-CH-102"));
    types.push(permundo_psc234());
    types.push(DeviceType::new(rocker, "TRIO2SYS", "TRIO2SYS Wall switches"));

    types
}

/// All supported device types, generic profiles first
pub fn supported_device_types() -> &'static [DeviceType] {
    static CATALOG: OnceLock<Vec<DeviceType>> = OnceLock::new();
    CATALOG.get_or_init(build_catalog)
}

/// Look up a supported device type by its unique id
pub fn find_device_type(unique_id: &str) -> Option<&'static DeviceType> {
    supported_device_types()
        .iter()
        .find(|t| t.unique_id() == unique_id)
}

/// Check whether any supported device type uses the given EEP
pub fn is_supported_eep(eep: &Eep) -> bool {
    supported_device_types().iter().any(|t| t.eep == *eep)
}
