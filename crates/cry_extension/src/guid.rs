//! 128-bit class and interface identifiers
//!
//! A [`CryGuid`] is two 64-bit halves compared as an ordered pair. The text
//! form is the usual registry-style GUID, `{XXXXXXXX-XXXX-XXXX-XXXX-XXXXXXXXXXXX}`,
//! with the high half printed first so the value is stable across runs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::GuidParseError;

/// A 128-bit globally unique identifier
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CryGuid(Uuid);

/// Identifies one concrete class
pub type CryClassId = CryGuid;

/// Identifies one interface (capability)
pub type CryInterfaceId = CryGuid;

impl CryGuid {
    /// The all-zero id
    pub const NULL: CryGuid = CryGuid(Uuid::nil());

    /// Create an id from its high and low halves
    #[inline]
    pub const fn new(hi: u64, lo: u64) -> Self {
        Self(Uuid::from_u64_pair(hi, lo))
    }

    /// Wrap an existing UUID
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// High 64 bits
    #[inline]
    pub const fn hi(&self) -> u64 {
        (self.0.as_u128() >> 64) as u64
    }

    /// Low 64 bits
    #[inline]
    pub const fn lo(&self) -> u64 {
        self.0.as_u128() as u64
    }

    /// Check if this is the null id
    #[inline]
    pub const fn is_null(&self) -> bool {
        self.0.is_nil()
    }

    /// Both halves packed into one integer, high half first
    #[inline]
    pub const fn to_u128(&self) -> u128 {
        self.0.as_u128()
    }

    /// Inverse of [`CryGuid::to_u128`]
    #[inline]
    pub const fn from_u128(bits: u128) -> Self {
        Self(Uuid::from_u128(bits))
    }

    /// Parse the text form, with or without braces, in either case
    pub fn parse(text: &str) -> Option<Self> {
        text.parse().ok()
    }
}

impl Default for CryGuid {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Display for CryGuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:X}", self.0.braced())
    }
}

impl fmt::Debug for CryGuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CryGuid({})", self)
    }
}

impl FromStr for CryGuid {
    type Err = GuidParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|source| GuidParseError {
                text: s.to_string(),
                source,
            })
    }
}

impl From<(u64, u64)> for CryGuid {
    fn from((hi, lo): (u64, u64)) -> Self {
        Self::new(hi, lo)
    }
}

impl From<Uuid> for CryGuid {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}
