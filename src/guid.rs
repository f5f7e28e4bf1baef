//! GUID generation, injected so callers can make names deterministic.

use std::fmt;

/// A 128-bit identifier rendered in the usual hyphenated form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Guid([u8; 16]);

impl Guid {
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Random version 4, variant 1 identifier.
    pub fn new_v4() -> Self {
        let mut bytes: [u8; 16] = rand::random();
        bytes[6] = (bytes[6] & 0x0F) | 0x40;
        bytes[8] = (bytes[8] & 0x3F) | 0x80;
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if matches!(i, 4 | 6 | 8 | 10) {
                f.write_str("-")?;
            }
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// Source of fresh identifiers for generated names.
pub trait GuidProvider: Send + Sync {
    fn new_guid(&self) -> Guid;
}

/// Default provider backed by the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomGuidProvider;

impl GuidProvider for RandomGuidProvider {
    fn new_guid(&self) -> Guid {
        Guid::new_v4()
    }
}
