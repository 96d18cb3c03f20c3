//! Instrument symbols
//!
//! A symbol is 1 to 4 ASCII letters, case-sensitive. Stored inline so the
//! type is `Copy` and needs no allocation to hash or compare.

use crate::ValidationError;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol {
    bytes: [u8; Symbol::MAX_LEN],
    len: u8,
}

impl Symbol {
    pub const MAX_LEN: usize = 4;

    /// Parse from raw bytes, `None` unless 1-4 ASCII letters
    #[inline]
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.is_empty() || bytes.len() > Self::MAX_LEN {
            return None;
        }
        if !bytes.iter().all(u8::is_ascii_alphabetic) {
            return None;
        }

        let mut buf = [0u8; Self::MAX_LEN];
        buf[..bytes.len()].copy_from_slice(bytes);
        Some(Self {
            bytes: buf,
            len: bytes.len() as u8,
        })
    }

    /// Validating constructor
    pub fn parse(name: &str) -> Result<Self, ValidationError> {
        Self::from_bytes(name.as_bytes()).ok_or_else(|| ValidationError::Symbol(name.to_string()))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        // Only ASCII letters are ever stored
        std::str::from_utf8(&self.bytes[..self.len as usize]).unwrap_or("")
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Symbol {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
