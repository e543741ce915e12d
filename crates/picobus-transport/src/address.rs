use std::fmt;
use std::str::FromStr;

use crate::error::{Result, TransportError};

/// Address the reference peripheral firmware listens on.
pub const DEFAULT_ADDRESS: PeripheralAddress = PeripheralAddress(0x42);

/// A 7-bit bus address identifying one peripheral.
///
/// Validated at construction, so every value in circulation fits in
/// `0x00..=0x7F`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeripheralAddress(u8);

impl PeripheralAddress {
    /// Highest valid 7-bit address.
    pub const MAX: u8 = 0x7F;

    /// Create an address, rejecting values outside the 7-bit range.
    pub fn new(raw: u8) -> Result<Self> {
        if raw > Self::MAX {
            return Err(TransportError::InvalidAddress(format!(
                "0x{raw:02X} exceeds 0x{:02X}",
                Self::MAX
            )));
        }
        Ok(Self(raw))
    }

    /// The raw 7-bit value.
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl Default for PeripheralAddress {
    fn default() -> Self {
        DEFAULT_ADDRESS
    }
}

impl TryFrom<u8> for PeripheralAddress {
    type Error = TransportError;

    fn try_from(raw: u8) -> Result<Self> {
        Self::new(raw)
    }
}

impl From<PeripheralAddress> for u8 {
    fn from(address: PeripheralAddress) -> Self {
        address.0
    }
}

impl fmt::Display for PeripheralAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02X}", self.0)
    }
}

/// Accepts `0x`-prefixed hex (`0x42`) or plain decimal (`66`).
impl FromStr for PeripheralAddress {
    type Err = TransportError;

    fn from_str(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let parsed = match trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
        {
            Some(hex) => u8::from_str_radix(hex, 16),
            None => trimmed.parse::<u8>(),
        };
        let raw = parsed.map_err(|_| TransportError::InvalidAddress(input.to_string()))?;
        Self::new(raw)
    }
}
