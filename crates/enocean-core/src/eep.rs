//! EnOcean Equipment Profiles (EEP) and radio telegram types (RORG)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error type for invalid EEP strings
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EepError {
    #[error("EEP must have the form RR-FF-TT, got '{0}'")]
    InvalidFormat(String),

    #[error("EEP part '{0}' is not a hex byte")]
    InvalidPart(String),
}

/// Radio telegram type, the first byte of every radio telegram
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rorg {
    /// Repeated switch communication (rocker switches, window handles)
    Rps,
    /// 1 byte communication
    Bs1,
    /// 4 byte communication
    Bs4,
    /// Variable length data
    Vld,
}

impl Rorg {
    pub fn code(&self) -> u8 {
        match self {
            Rorg::Rps => 0xF6,
            Rorg::Bs1 => 0xD5,
            Rorg::Bs4 => 0xA5,
            Rorg::Vld => 0xD2,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0xF6 => Some(Rorg::Rps),
            0xD5 => Some(Rorg::Bs1),
            0xA5 => Some(Rorg::Bs4),
            0xD2 => Some(Rorg::Vld),
            _ => None,
        }
    }
}

/// An EnOcean Equipment Profile, e.g. `D2-05-00`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Eep {
    rorg: u8,
    func: u8,
    eep_type: u8,
}

impl Eep {
    pub const fn new(rorg: u8, func: u8, eep_type: u8) -> Self {
        Self {
            rorg,
            func,
            eep_type,
        }
    }

    pub fn rorg(&self) -> u8 {
        self.rorg
    }

    pub fn func(&self) -> u8 {
        self.func
    }

    pub fn eep_type(&self) -> u8 {
        self.eep_type
    }

    /// Check whether this profile belongs to the given RORG and FUNC
    pub fn is_family(&self, rorg: u8, func: u8) -> bool {
        self.rorg == rorg && self.func == func
    }
}

impl FromStr for Eep {
    type Err = EepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split('-').collect();
        if parts.len() != 3 {
            return Err(EepError::InvalidFormat(s.to_string()));
        }

        let mut bytes = [0u8; 3];
        for (slot, part) in bytes.iter_mut().zip(&parts) {
            if part.len() != 2 {
                return Err(EepError::InvalidPart(part.to_string()));
            }
            *slot =
                u8::from_str_radix(part, 16).map_err(|_| EepError::InvalidPart(part.to_string()))?;
        }

        Ok(Self::new(bytes[0], bytes[1], bytes[2]))
    }
}

impl TryFrom<String> for Eep {
    type Error = EepError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Eep> for String {
    fn from(eep: Eep) -> String {
        eep.to_string()
    }
}

impl fmt::Display for Eep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02X}-{:02X}-{:02X}",
            self.rorg, self.func, self.eep_type
        )
    }
}
