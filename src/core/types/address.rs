//! Process-space address wrapper with hex parsing

use super::error::{MemoryError, MemoryResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An opaque address inside the target process.
///
/// Never dereferenced locally; it is only ever handed back to a
/// [`ProcessMemory`](crate::process::ProcessMemory) implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(pub usize);

impl Address {
    /// Creates a new address from a usize value
    pub const fn new(value: usize) -> Self {
        Address(value)
    }

    /// Adds a byte offset, returning `None` on overflow
    pub fn checked_add(&self, offset: usize) -> Option<Self> {
        self.0.checked_add(offset).map(Address)
    }

    /// Returns the raw usize value
    pub const fn as_usize(&self) -> usize {
        self.0
    }
}

impl FromStr for Address {
    type Err = MemoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        let value = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            usize::from_str_radix(hex, 16)
        } else if let Some(hex) = s.strip_prefix('$') {
            usize::from_str_radix(hex, 16)
        } else if s.chars().any(|c| c.is_ascii_alphabetic()) {
            usize::from_str_radix(s, 16)
        } else {
            s.parse::<usize>().or_else(|_| usize::from_str_radix(s, 16))
        };

        value
            .map(Address::new)
            .map_err(|_| MemoryError::InvalidAddress(s.to_string()))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}

/// Parses a user-supplied address, rejecting the null address
pub fn parse_address(s: &str) -> MemoryResult<Address> {
    let address = Address::from_str(s)?;
    if address.as_usize() == 0 {
        return Err(MemoryError::InvalidAddress(format!("{} - Null pointer", s.trim())));
    }
    Ok(address)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_parsing() {
        assert_eq!(Address::from_str("0x1000").unwrap(), Address::new(0x1000));
        assert_eq!(Address::from_str("0X1000").unwrap(), Address::new(0x1000));
        assert_eq!(Address::from_str("$1000").unwrap(), Address::new(0x1000));
        assert_eq!(
            Address::from_str("DEADBEEF").unwrap(),
            Address::new(0xDEADBEEF)
        );
        assert_eq!(Address::from_str("4096").unwrap(), Address::new(4096));
        assert!(Address::from_str("0xZZ").is_err());
    }

    #[test]
    fn test_parse_address_rejects_null() {
        assert!(parse_address("0x0").is_err());
        assert_eq!(parse_address(" 0x10 ").unwrap(), Address::new(0x10));
    }

    #[test]
    fn test_address_arithmetic() {
        assert_eq!(Address::new(0x1000).checked_add(0x10), Some(Address::new(0x1010)));
        assert_eq!(Address::new(usize::MAX).checked_add(1), None);
    }

    #[test]
    fn test_address_display() {
        assert_eq!(format!("{}", Address::new(0xBEEF)), "0x0000BEEF");
        assert_eq!(
            format!("{}", Address::new(0x7FF6_DEAD_BEEF)),
            "0x7FF6DEADBEEF"
        );
    }
}
