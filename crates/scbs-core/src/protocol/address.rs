//! Register addresses
//!
//! Address tokens are either decimal (`1000`) or `0x`-prefixed hex
//! (`0x9999`). A leading `-` is accepted by the grammar so that negative
//! input is reported as out of range rather than as garbage.

use std::fmt;
use std::str::FromStr;

use super::{ProtocolError, MAX_REG_ADDR};

/// A register address in `0..=0x9999`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RegisterAddress(u16);

impl RegisterAddress {
    /// Highest valid address
    pub const MAX: RegisterAddress = RegisterAddress(MAX_REG_ADDR as u16);

    /// Create an address, checking the upper bound
    pub fn new(value: u32) -> Option<Self> {
        (value <= MAX_REG_ADDR).then_some(Self(value as u16))
    }

    /// Numeric value of the address
    pub fn value(&self) -> u16 {
        self.0
    }
}

impl FromStr for RegisterAddress {
    type Err = ProtocolError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let (negative, unsigned) = match token.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, token),
        };
        let (radix, digits) = match unsigned
            .strip_prefix("0x")
            .or_else(|| unsigned.strip_prefix("0X"))
        {
            Some(hex) => (16, hex),
            None => (10, unsigned),
        };

        // from_str_radix tolerates a leading '+', the grammar does not
        if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
            return Err(ProtocolError::InvalidAddress(token.to_string()));
        }

        // Digits are valid at this point, so the only failure is overflow
        let magnitude = u64::from_str_radix(digits, radix)
            .map_err(|_| ProtocolError::AddressRange(token.to_string()))?;

        if negative && magnitude != 0 {
            return Err(ProtocolError::AddressRange(token.to_string()));
        }

        u32::try_from(magnitude)
            .ok()
            .and_then(RegisterAddress::new)
            .ok_or_else(|| ProtocolError::AddressRange(token.to_string()))
    }
}

impl fmt::Display for RegisterAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}
