//! EnOcean radio address (4 bytes, shown as "AA:BB:CC:DD")

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error type for invalid EnOcean id strings
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EnOceanIdError {
    #[error("EnOcean id must consist of at least three colon-separated parts")]
    TooFewParts,

    #[error("EnOcean id must not consist of more than four parts")]
    TooManyParts,

    #[error("EnOcean id part '{0}' is not a hex byte")]
    InvalidPart(String),
}

/// An EnOcean device or sender address
///
/// Addresses are four bytes wide. The textual form is colon-separated hex,
/// always rendered upper-case with two digits per byte.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct EnOceanId([u8; 4]);

impl EnOceanId {
    /// Broadcast destination
    pub const BROADCAST: EnOceanId = EnOceanId([0xFF; 4]);

    pub const fn new(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    pub fn bytes(&self) -> [u8; 4] {
        self.0
    }

    /// The id as a big-endian integer
    pub fn as_u32(&self) -> u32 {
        u32::from_be_bytes(self.0)
    }

    /// Check whether a string is an acceptable EnOcean id
    ///
    /// Accepts three or four parts, each one or two hex digits.
    pub fn is_valid(s: &str) -> bool {
        s.parse::<EnOceanId>().is_ok()
    }
}

impl From<u32> for EnOceanId {
    fn from(value: u32) -> Self {
        Self(value.to_be_bytes())
    }
}

impl FromStr for EnOceanId {
    type Err = EnOceanIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split(':').collect();
        if parts.len() < 3 {
            return Err(EnOceanIdError::TooFewParts);
        }
        if parts.len() > 4 {
            return Err(EnOceanIdError::TooManyParts);
        }

        let mut parsed = Vec::with_capacity(4);
        for part in parts {
            if part.is_empty() || part.len() > 2 {
                return Err(EnOceanIdError::InvalidPart(part.to_string()));
            }
            let byte = u8::from_str_radix(part, 16)
                .map_err(|_| EnOceanIdError::InvalidPart(part.to_string()))?;
            parsed.push(byte);
        }

        // Short ids are left-padded
        let mut bytes = [0u8; 4];
        bytes[4 - parsed.len()..].copy_from_slice(&parsed);
        Ok(Self(bytes))
    }
}

impl TryFrom<String> for EnOceanId {
    type Error = EnOceanIdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<EnOceanId> for String {
    fn from(id: EnOceanId) -> String {
        id.to_string()
    }
}

impl fmt::Display for EnOceanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.0;
        write!(f, "{:02X}:{:02X}:{:02X}:{:02X}", a, b, c, d)
    }
}
