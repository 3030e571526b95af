//! Radio telegrams exchanged with EnOcean devices

use serde::{Deserialize, Serialize};

use crate::eep::Rorg;
use crate::enocean_id::EnOceanId;

/// Length of the trailer after the payload: sender id (4 bytes) and status
const TRAILER_LEN: usize = 5;

/// A single addressed radio telegram
///
/// `payload` holds the user data only; the RORG byte, sender id and status
/// byte are kept separately. [`Telegram::data`] returns the full radio data
/// block in the order it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Telegram {
    pub rorg: Rorg,
    pub payload: Vec<u8>,
    pub sender: EnOceanId,
    pub destination: EnOceanId,
    #[serde(default)]
    pub status: u8,
}

impl Telegram {
    /// Create a broadcast telegram
    pub fn new(rorg: Rorg, payload: Vec<u8>, sender: EnOceanId) -> Self {
        Self {
            rorg,
            payload,
            sender,
            destination: EnOceanId::BROADCAST,
            status: 0,
        }
    }

    /// Address the telegram to a specific device
    pub fn to(mut self, destination: EnOceanId) -> Self {
        self.destination = destination;
        self
    }

    /// Set the status byte
    pub fn with_status(mut self, status: u8) -> Self {
        self.status = status;
        self
    }

    /// Payload byte at `index`, if present
    pub fn byte(&self, index: usize) -> Option<u8> {
        self.payload.get(index).copied()
    }

    /// Radio data block: `[rorg, payload.., sender(4), status]`
    pub fn data(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(1 + self.payload.len() + TRAILER_LEN);
        data.push(self.rorg.code());
        data.extend_from_slice(&self.payload);
        data.extend_from_slice(&self.sender.bytes());
        data.push(self.status);
        data
    }

    /// Parse a radio data block received from the transport
    ///
    /// Returns `None` for unknown RORGs or blocks too short to carry a
    /// sender and status.
    pub fn from_data(data: &[u8]) -> Option<Self> {
        if data.len() < 1 + TRAILER_LEN {
            return None;
        }
        let rorg = Rorg::from_code(data[0])?;
        let payload_end = data.len() - TRAILER_LEN;
        let mut sender = [0u8; 4];
        sender.copy_from_slice(&data[payload_end..payload_end + 4]);

        Some(Self {
            rorg,
            payload: data[1..payload_end].to_vec(),
            sender: EnOceanId::new(sender),
            destination: EnOceanId::BROADCAST,
            status: data[data.len() - 1],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_layout() {
        let telegram = Telegram::new(
            Rorg::Rps,
            vec![0x10],
            EnOceanId::new([0x00, 0x2D, 0xCF, 0x45]),
        )
        .with_status(0x30);

        assert_eq!(
            telegram.data(),
            vec![0xF6, 0x10, 0x00, 0x2D, 0xCF, 0x45, 0x30]
        );
    }

    #[test]
    fn test_from_data() {
        let data = [0xA5, 0x00, 0x80, 0x64, 0x08, 0x01, 0x02, 0x03, 0x04, 0x00];
        let telegram = Telegram::from_data(&data).unwrap();

        assert_eq!(telegram.rorg, Rorg::Bs4);
        assert_eq!(telegram.payload, vec![0x00, 0x80, 0x64, 0x08]);
        assert_eq!(telegram.sender.to_string(), "01:02:03:04");
        assert_eq!(telegram.byte(2), Some(0x64));
        assert_eq!(telegram.byte(4), None);
    }

    #[test]
    fn test_from_data_rejects_garbage() {
        assert!(Telegram::from_data(&[0xF6, 0x10]).is_none());
        assert!(Telegram::from_data(&[0x55, 0x10, 0, 0, 0, 0, 0]).is_none());
    }
}
