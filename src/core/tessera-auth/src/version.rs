//! Negotiated protocol versions.

use std::fmt;

/// A negotiated peer protocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProtocolVersion(pub u16);

impl ProtocolVersion {
    /// Oldest version any credential envelope can be exchanged with.
    pub const MIN: Self = Self(17);

    /// First version whose envelope carries the numeric mechanism id.
    pub const MECHANISM_ID: Self = Self(19);

    /// Version spoken by this build.
    pub const CURRENT: Self = Self(20);

    /// Raw value.
    pub const fn get(self) -> u16 {
        self.0
    }
}

impl From<u16> for ProtocolVersion {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
