//! Bounded strings and arrays for serde-driven messages.
//!
//! The wire format needs a declared maximum for every string and array, and
//! serde's data model has nowhere to put one. These wrappers carry the bound
//! in their type:
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use ipc_pack::{BoundedString, BoundedVec, SafeRef, from_buffer, to_vec};
//!
//! #[derive(Debug, PartialEq, Serialize, Deserialize)]
//! pub struct OpenRequest {
//!     pub session: SafeRef,
//!     pub path: BoundedString<32>,
//!     pub flags: BoundedVec<u16, 4>,
//! }
//!
//! let req = OpenRequest {
//!     session: SafeRef::from_raw(0x11).unwrap(),
//!     path: BoundedString::new("/dev/ttyS0").unwrap(),
//!     flags: BoundedVec::new(vec![1, 2]).unwrap(),
//! };
//!
//! // 4 (reference) + 32 + 4 (string) + 4 * 2 + 4 (array) reserved
//! let bytes = to_vec(&req, 128).unwrap();
//! assert_eq!(bytes.len(), 4 + 36 + 12);
//!
//! let decoded: OpenRequest = from_buffer(&bytes).unwrap();
//! assert_eq!(req, decoded);
//! ```
//!
//! # How the bound reaches the codec
//!
//! Both wrappers serialize as a tuple struct with a reserved name. The `len`
//! argument of `serialize_tuple_struct` / `deserialize_tuple_struct` carries
//! the string's declared maximum, or the array's body reservation
//! (`MAX * T::RESERVATION`). The crate's [`Serializer`](crate::Serializer) and
//! [`Deserializer`](crate::Deserializer) recognise the names; other serde
//! formats are not supported by these wrappers.

use crate::error::{Error, Result};
use crate::pack::string_reservation;
use crate::scalar::Scalar;
use serde::de::{self, SeqAccess, Visitor};
use serde::ser::SerializeTupleStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;

/// Worst-case capacity a value reserves on the wire.
///
/// Needed for array elements, since an array reserves
/// `max_count * element reservation` up front. Implement it for message
/// structs that appear inside a [`BoundedVec`] by summing the fields.
pub trait WireSize {
    const RESERVATION: usize;
}

impl<T: Scalar> WireSize for T {
    const RESERVATION: usize = T::WIRE_SIZE;
}

impl<T: WireSize, const N: usize> WireSize for [T; N] {
    const RESERVATION: usize = T::RESERVATION.saturating_mul(N);
}

// ── BoundedString ──────────────────────────────────────────────────────────

/// A string of at most `MAX` bytes, with no interior NUL.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct BoundedString<const MAX: usize>(String);

impl<const MAX: usize> BoundedString<MAX> {
    /// Fails if `s` is longer than `MAX` bytes or contains a NUL, which would
    /// end the string early on the wire.
    pub fn new(s: impl Into<String>) -> Result<Self> {
        let s = s.into();
        if s.len() > MAX {
            return Err(Error::LengthOverflow {
                max: MAX,
                got: s.len(),
            });
        }
        if s.as_bytes().contains(&0) {
            return Err(Error::InvalidString);
        }
        Ok(BoundedString(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl<const MAX: usize> Deref for BoundedString<MAX> {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl<const MAX: usize> TryFrom<&str> for BoundedString<MAX> {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        BoundedString::new(s)
    }
}

impl<const MAX: usize> TryFrom<String> for BoundedString<MAX> {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        BoundedString::new(s)
    }
}

impl<const MAX: usize> fmt::Display for BoundedString<MAX> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<const MAX: usize> WireSize for BoundedString<MAX> {
    const RESERVATION: usize = string_reservation(MAX);
}

impl<const MAX: usize> Serialize for BoundedString<MAX> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_tuple_struct(crate::BOUNDED_STRING_TOKEN, MAX)?;
        state.serialize_field(self.0.as_str())?;
        state.end()
    }
}

impl<'de, const MAX: usize> Deserialize<'de> for BoundedString<MAX> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_tuple_struct(
            crate::BOUNDED_STRING_TOKEN,
            MAX,
            BoundedStringVisitor::<MAX>,
        )
    }
}

struct BoundedStringVisitor<const MAX: usize>;

impl<'de, const MAX: usize> Visitor<'de> for BoundedStringVisitor<MAX> {
    type Value = BoundedString<MAX>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a string of at most {} bytes", MAX)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Self::Value, E> {
        BoundedString::new(v).map_err(E::custom)
    }

    fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<Self::Value, E> {
        BoundedString::new(v).map_err(E::custom)
    }
}

// ── BoundedVec ─────────────────────────────────────────────────────────────

/// A vector of at most `MAX` elements.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BoundedVec<T, const MAX: usize>(Vec<T>);

impl<T, const MAX: usize> BoundedVec<T, MAX> {
    /// Fails if `items` holds more than `MAX` elements.
    pub fn new(items: Vec<T>) -> Result<Self> {
        if items.len() > MAX {
            return Err(Error::CountOverflow {
                max: MAX,
                got: items.len(),
            });
        }
        Ok(BoundedVec(items))
    }

    pub fn as_slice(&self) -> &[T] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<T> {
        self.0
    }

    /// Append an element, failing once `MAX` elements are held.
    pub fn push(&mut self, item: T) -> Result<()> {
        if self.0.len() == MAX {
            return Err(Error::CountOverflow {
                max: MAX,
                got: MAX + 1,
            });
        }
        self.0.push(item);
        Ok(())
    }
}

impl<T, const MAX: usize> Default for BoundedVec<T, MAX> {
    fn default() -> Self {
        BoundedVec(Vec::new())
    }
}

impl<T, const MAX: usize> Deref for BoundedVec<T, MAX> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.0
    }
}

impl<T, const MAX: usize> TryFrom<Vec<T>> for BoundedVec<T, MAX> {
    type Error = Error;

    fn try_from(items: Vec<T>) -> Result<Self> {
        BoundedVec::new(items)
    }
}

impl<T: WireSize, const MAX: usize> BoundedVec<T, MAX> {
    /// Capacity reserved for the elements, excluding the count prefix.
    const BODY: usize = T::RESERVATION.saturating_mul(MAX);
}

impl<T: WireSize, const MAX: usize> WireSize for BoundedVec<T, MAX> {
    const RESERVATION: usize = Self::BODY.saturating_add(crate::COUNT_PREFIX_SIZE);
}

impl<T: Serialize + WireSize, const MAX: usize> Serialize for BoundedVec<T, MAX> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_tuple_struct(crate::BOUNDED_SEQ_TOKEN, Self::BODY)?;
        state.serialize_field(self.0.as_slice())?;
        state.end()
    }
}

impl<'de, T, const MAX: usize> Deserialize<'de> for BoundedVec<T, MAX>
where
    T: Deserialize<'de> + WireSize,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_tuple_struct(
            crate::BOUNDED_SEQ_TOKEN,
            Self::BODY,
            BoundedVecVisitor::<T, MAX>(PhantomData),
        )
    }
}

struct BoundedVecVisitor<T, const MAX: usize>(PhantomData<T>);

impl<'de, T: Deserialize<'de>, const MAX: usize> Visitor<'de> for BoundedVecVisitor<T, MAX> {
    type Value = BoundedVec<T, MAX>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a sequence of at most {} elements", MAX)
    }

    /// The deserializer reports the decoded count as the size hint, so an
    /// oversized array is rejected before any element is read.
    fn visit_seq<A: SeqAccess<'de>>(
        self,
        mut seq: A,
    ) -> std::result::Result<Self::Value, A::Error> {
        let count = seq.size_hint().unwrap_or(0);
        if count > MAX {
            return Err(de::Error::invalid_length(count, &self));
        }
        let mut items = Vec::with_capacity(count);
        while let Some(item) = seq.next_element()? {
            if items.len() == MAX {
                return Err(de::Error::invalid_length(MAX + 1, &self));
            }
            items.push(item);
        }
        Ok(BoundedVec(items))
    }
}
