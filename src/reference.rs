//! Safe references: opaque handles that cross the IPC boundary.
//!
//! Handles are minted elsewhere. The issuing side guarantees that every live
//! handle has its least-significant bit set, so a decoder can tell a real
//! handle from an arbitrary integer without any extra channel. Null (zero) is
//! always accepted. This module only checks the tag; it never creates handles.
//!
//! On the wire a reference is always a 32-bit unsigned value, regardless of
//! the host's pointer width.

use crate::error::{Error, Result};
use crate::scalar::{Scalar, private};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use tracing::trace;

/// A handle that is known to be null or tagged with its low bit.
///
/// The only ways to obtain one are [`SafeRef::NULL`] and the checked
/// constructors, so holding a `SafeRef` means the tag has been verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct SafeRef(u32);

impl SafeRef {
    /// The null handle.
    pub const NULL: SafeRef = SafeRef(0);

    /// Validate a pointer-sized handle.
    ///
    /// Fails if `raw` does not fit in 32 bits, or is nonzero with its low bit
    /// clear.
    pub fn from_raw(raw: usize) -> Result<Self> {
        match u32::try_from(raw) {
            Ok(wire) => Self::from_wire(wire),
            Err(_) => {
                trace!(raw, "rejected reference wider than 32 bits");
                Err(Error::InvalidReference(raw))
            }
        }
    }

    /// Validate a 32-bit value read off the wire.
    pub fn from_wire(wire: u32) -> Result<Self> {
        if wire == 0 || wire & 0x01 != 0 {
            Ok(SafeRef(wire))
        } else {
            trace!(wire, "rejected untagged reference");
            Err(Error::InvalidReference(wire as usize))
        }
    }

    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// The handle as the pointer-sized integer the issuer handed out.
    pub const fn as_raw(self) -> usize {
        self.0 as usize
    }

    /// The 32-bit value written on the wire.
    pub const fn to_wire(self) -> u32 {
        self.0
    }
}

impl TryFrom<usize> for SafeRef {
    type Error = Error;

    fn try_from(raw: usize) -> Result<Self> {
        SafeRef::from_raw(raw)
    }
}

impl From<SafeRef> for usize {
    fn from(r: SafeRef) -> Self {
        r.as_raw()
    }
}

impl fmt::Display for SafeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "null")
        } else {
            write!(f, "{:#010x}", self.0)
        }
    }
}

impl private::Sealed for SafeRef {}

impl Scalar for SafeRef {
    const WIRE_SIZE: usize = 4;

    fn write_ne(self, dst: &mut [u8]) {
        self.0.write_ne(dst);
    }

    fn read_ne(src: &[u8]) -> Result<Self> {
        SafeRef::from_wire(u32::read_ne(src)?)
    }
}

// ── serde ──────────────────────────────────────────────────────────────────
//
// A reference is a newtype struct named `SAFE_REF_TOKEN`. The crate's
// serializer and deserializer recognise the name and route it through the
// reference codec; other formats just see a `u32`.

impl Serialize for SafeRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_newtype_struct(crate::SAFE_REF_TOKEN, &self.0)
    }
}

impl<'de> Deserialize<'de> for SafeRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_newtype_struct(crate::SAFE_REF_TOKEN, SafeRefVisitor)
    }
}

struct SafeRefVisitor;

impl<'de> Visitor<'de> for SafeRefVisitor {
    type Value = SafeRef;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a null or low-bit-tagged reference")
    }

    fn visit_u32<E: de::Error>(self, v: u32) -> std::result::Result<SafeRef, E> {
        SafeRef::from_wire(v).map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<SafeRef, E> {
        let raw = usize::try_from(v)
            .map_err(|_| E::invalid_value(de::Unexpected::Unsigned(v), &self))?;
        SafeRef::from_raw(raw).map_err(E::custom)
    }

    fn visit_newtype_struct<D: Deserializer<'de>>(
        self,
        deserializer: D,
    ) -> std::result::Result<SafeRef, D::Error> {
        let wire = u32::deserialize(deserializer)?;
        SafeRef::from_wire(wire).map_err(de::Error::custom)
    }
}
