//! Device registry cleanup
//!
//! When a device is removed through the options flow, its registry entry
//! must be detached from the config entry. A registered device is orphaned
//! when one of its `enocean` identifiers names an id that is no longer
//! configured.

use enocean_core::DOMAIN;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::entry::EnOceanOptions;

/// A device identifier (domain, id) pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceIdentifier(pub String, pub String);

impl DeviceIdentifier {
    pub fn new(domain: impl Into<String>, id: impl Into<String>) -> Self {
        Self(domain.into(), id.into())
    }

    pub fn domain(&self) -> &str {
        &self.0
    }

    pub fn id(&self) -> &str {
        &self.1
    }

    /// The EnOcean id part of the identifier
    ///
    /// Identifiers may carry a suffix after the first `-` (e.g. a channel);
    /// only the prefix names the device.
    pub fn enocean_id(&self) -> String {
        self.1
            .split_once('-')
            .map_or(self.1.as_str(), |(prefix, _)| prefix)
            .to_uppercase()
    }
}

/// A device as known to the host's device registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredDevice {
    /// Registry id of the device
    pub id: String,
    pub identifiers: Vec<DeviceIdentifier>,
}

impl RegisteredDevice {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            identifiers: Vec::new(),
        }
    }

    pub fn with_identifier(mut self, domain: impl Into<String>, id: impl Into<String>) -> Self {
        self.identifiers.push(DeviceIdentifier::new(domain, id));
        self
    }
}

/// Registered devices that no longer correspond to a configured device
pub fn orphaned_devices<'a>(
    registered: &'a [RegisteredDevice],
    options: &EnOceanOptions,
) -> Vec<&'a RegisteredDevice> {
    let configured: Vec<String> = options
        .devices
        .iter()
        .map(|d| d.id.to_string().to_uppercase())
        .collect();

    registered
        .iter()
        .filter(|device| {
            let orphan = device.identifiers.iter().find(|ident| {
                ident.domain() == DOMAIN && !configured.contains(&ident.enocean_id())
            });
            if let Some(ident) = orphan {
                debug!(
                    registry_id = %device.id,
                    device_id = %ident.enocean_id(),
                    "Removing registry device for unconfigured EnOcean device"
                );
            }
            orphan.is_some()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::DeviceConfig;
    use enocean_core::{EnOceanId, Eep};

    #[test]
    fn test_enocean_id_prefix() {
        assert_eq!(
            DeviceIdentifier::new("enocean", "ff:aa:80:01-0").enocean_id(),
            "FF:AA:80:01"
        );
        assert_eq!(
            DeviceIdentifier::new("enocean", "01:02:03:04").enocean_id(),
            "01:02:03:04"
        );
    }

    #[test]
    fn test_orphaned_devices() {
        let options = EnOceanOptions::new(vec![DeviceConfig::new(
            EnOceanId::new([1, 2, 3, 4]),
            Eep::new(0xD2, 0x05, 0x00),
            "Blind",
        )]);

        let registered = vec![
            RegisteredDevice::new("kept").with_identifier("enocean", "01:02:03:04"),
            RegisteredDevice::new("kept-channel").with_identifier("enocean", "01:02:03:04-1"),
            RegisteredDevice::new("gone").with_identifier("enocean", "05:06:07:08"),
            RegisteredDevice::new("other-domain").with_identifier("zwave", "05:06:07:08"),
        ];

        let orphans: Vec<&str> = orphaned_devices(&registered, &options)
            .into_iter()
            .map(|d| d.id.as_str())
            .collect();
        assert_eq!(orphans, vec!["gone"]);
    }
}
