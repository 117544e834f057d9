//! Serde serializer over a [`Packer`].
//!
//! ## Mapping summary
//! - Scalars use the matching scalar codec (native width, native byte order)
//! - `bool` is one byte, `char` a `u32`
//! - Structs/Tuples/fixed arrays: fields encoded consecutively, no prefix
//! - Newtype structs are transparent
//! - Enums: `u32` variant index + the variant's fields
//! - [`SafeRef`](crate::SafeRef): reference codec
//! - [`BoundedString`](crate::BoundedString) / [`BoundedVec`](crate::BoundedVec):
//!   string / array codec with the wrapper's declared maximum
//! - Unbounded strings, bytes, sequences, maps and `Option`: rejected

use crate::error::{Error, Result};
use crate::pack::Packer;
use serde::ser::{self, Serialize};

// ── Public entry points ────────────────────────────────────────────────────

/// Serialize `value` into `buf` and return the number of bytes written.
///
/// The capacity budget is the whole buffer.
pub fn to_buffer<T: Serialize + ?Sized>(value: &T, buf: &mut [u8]) -> Result<usize> {
    let mut ser = Serializer::new(Packer::new(buf));
    value.serialize(&mut ser)?;
    Ok(ser.packer.position())
}

/// Serialize `value` into a new vector, with `capacity` bytes of budget.
///
/// The vector is as long as the capacity the message reserved, not just the
/// bytes written, so a receiver can decode it with [`from_buffer`](crate::from_buffer)
/// as is. Bytes past the written position are zero.
pub fn to_vec<T: Serialize + ?Sized>(value: &T, capacity: usize) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; capacity];
    let mut ser = Serializer::new(Packer::new(&mut buf));
    value.serialize(&mut ser)?;
    let reserved = capacity - ser.packer.remaining();
    buf.truncate(reserved);
    Ok(buf)
}

// ── Serializer ─────────────────────────────────────────────────────────────

/// The declared bound announced by a bounded wrapper for the value it is
/// about to serialize.
#[derive(Debug, Clone, Copy)]
enum Pending {
    String { max: usize },
    Seq { reserved: usize },
}

/// The serde serializer. Wraps a [`Packer`] so serde-driven fields can be
/// mixed with hand-sequenced calls on the same cursor:
///
/// ```rust
/// use ipc_pack::{Packer, Serializer};
/// use serde::Serialize;
///
/// let mut buf = [0u8; 16];
/// let mut ser = Serializer::new(Packer::new(&mut buf));
/// 42u32.serialize(&mut ser).unwrap();
/// let mut packer = ser.into_inner();
/// packer.pack_bool(true).unwrap();
/// assert_eq!(packer.position(), 5);
/// ```
#[derive(Debug)]
pub struct Serializer<'a> {
    packer: Packer<'a>,
    pending: Option<Pending>,
}

impl<'a> Serializer<'a> {
    pub fn new(packer: Packer<'a>) -> Self {
        Serializer {
            packer,
            pending: None,
        }
    }

    /// Consume the serializer and return the cursor.
    pub fn into_inner(self) -> Packer<'a> {
        self.packer
    }

    pub fn packer(&self) -> &Packer<'a> {
        &self.packer
    }
}

// ── serde::Serializer impl ─────────────────────────────────────────────────

impl<'s, 'a> ser::Serializer for &'s mut Serializer<'a> {
    type Ok = ();
    type Error = Error;

    type SerializeSeq = Compound<'s, 'a>;
    type SerializeTuple = Self;
    type SerializeTupleStruct = Compound<'s, 'a>;
    type SerializeTupleVariant = Self;
    type SerializeMap = ser::Impossible<(), Error>;
    type SerializeStruct = Self;
    type SerializeStructVariant = Self;

    // ── Primitives ─────────────────────────────────────────────────────────

    /// Single canonical byte: 0 or 1
    fn serialize_bool(self, v: bool) -> Result<()> {
        self.packer.pack_bool(v)
    }

    fn serialize_i8(self, v: i8) -> Result<()> {
        self.packer.pack_i8(v)
    }
    fn serialize_i16(self, v: i16) -> Result<()> {
        self.packer.pack_i16(v)
    }
    fn serialize_i32(self, v: i32) -> Result<()> {
        self.packer.pack_i32(v)
    }
    fn serialize_i64(self, v: i64) -> Result<()> {
        self.packer.pack_i64(v)
    }

    fn serialize_u8(self, v: u8) -> Result<()> {
        self.packer.pack_u8(v)
    }
    fn serialize_u16(self, v: u16) -> Result<()> {
        self.packer.pack_u16(v)
    }
    fn serialize_u32(self, v: u32) -> Result<()> {
        self.packer.pack_u32(v)
    }
    fn serialize_u64(self, v: u64) -> Result<()> {
        self.packer.pack_u64(v)
    }

    fn serialize_f32(self, v: f32) -> Result<()> {
        self.packer.pack_f32(v)
    }
    fn serialize_f64(self, v: f64) -> Result<()> {
        self.packer.pack_f64(v)
    }

    fn serialize_char(self, v: char) -> Result<()> {
        self.packer.pack_char(v)
    }

    /// Only valid as the payload of a `BoundedString`
    fn serialize_str(self, v: &str) -> Result<()> {
        match self.pending.take() {
            Some(Pending::String { max }) => self.packer.pack_string(v, max),
            _ => Err(Error::Unsupported("unbounded string (use BoundedString)")),
        }
    }

    fn serialize_bytes(self, _v: &[u8]) -> Result<()> {
        Err(Error::Unsupported("byte buffer (use BoundedVec<u8, N>)"))
    }

    fn serialize_none(self) -> Result<()> {
        Err(Error::Unsupported("Option"))
    }

    fn serialize_some<T: Serialize + ?Sized>(self, _value: &T) -> Result<()> {
        Err(Error::Unsupported("Option"))
    }

    /// Zero bytes
    fn serialize_unit(self) -> Result<()> {
        Ok(())
    }
    fn serialize_unit_struct(self, _name: &'static str) -> Result<()> {
        Ok(())
    }

    /// Unit enum variant → `u32` variant index
    fn serialize_unit_variant(
        self,
        _name: &'static str,
        variant_index: u32,
        _variant: &'static str,
    ) -> Result<()> {
        self.packer.pack_u32(variant_index)
    }

    /// Transparent. A `SafeRef` arrives here as its already-validated `u32`.
    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<()> {
        value.serialize(self)
    }

    /// Enum newtype variant → `u32` index + encoded inner value
    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        variant_index: u32,
        _variant: &'static str,
        value: &T,
    ) -> Result<()> {
        self.packer.pack_u32(variant_index)?;
        value.serialize(self)
    }

    /// Only valid as the payload of a `BoundedVec`
    fn serialize_seq(self, len: Option<usize>) -> Result<Self::SerializeSeq> {
        let reserved = match self.pending.take() {
            Some(Pending::Seq { reserved }) => reserved,
            _ => return Err(Error::Unsupported("unbounded sequence (use BoundedVec)")),
        };
        let count = len.ok_or(Error::Unsupported("sequence of unknown length"))?;
        // `BoundedVec` enforces its element count, the body reservation is
        // all that reaches the serializer.
        let floor = self.packer.open_array(count, usize::MAX, reserved)?;
        Ok(Compound(State::Elements { ser: self, floor }))
    }

    /// Fixed-length array / tuple: elements without a count prefix
    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple> {
        Ok(self)
    }

    fn serialize_tuple_struct(
        self,
        name: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        let state = match name {
            crate::BOUNDED_STRING_TOKEN => State::Bounded {
                ser: self,
                pending: Pending::String { max: len },
            },
            crate::BOUNDED_SEQ_TOKEN => State::Bounded {
                ser: self,
                pending: Pending::Seq {
                    reserved: len.saturating_add(crate::COUNT_PREFIX_SIZE),
                },
            },
            _ => State::Fields(self),
        };
        Ok(Compound(state))
    }

    /// Enum tuple variant → `u32` index + fields
    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        self.packer.pack_u32(variant_index)?;
        Ok(self)
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Err(Error::Unsupported("map"))
    }

    /// Fields encoded consecutively, no count prefix
    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        Ok(self)
    }

    /// Enum struct variant → `u32` index + fields consecutively
    fn serialize_struct_variant(
        self,
        _name: &'static str,
        variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        self.packer.pack_u32(variant_index)?;
        Ok(self)
    }
}

// ── Compound serializer impls ──────────────────────────────────────────────

/// State for tuple structs and sequences, which may be plain field lists or
/// the bounded wrappers' payloads.
#[derive(Debug)]
pub struct Compound<'s, 'a>(State<'s, 'a>);

#[derive(Debug)]
enum State<'s, 'a> {
    /// An ordinary tuple struct: fields back to back.
    Fields(&'s mut Serializer<'a>),
    /// A bounded wrapper whose single field carries the payload.
    Bounded {
        ser: &'s mut Serializer<'a>,
        pending: Pending,
    },
    /// Elements of a bounded array whose header is already written.
    Elements {
        ser: &'s mut Serializer<'a>,
        floor: usize,
    },
}

impl ser::SerializeTupleStruct for Compound<'_, '_> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        match &mut self.0 {
            State::Fields(ser) => value.serialize(&mut **ser),
            State::Bounded { ser, pending } => {
                ser.pending = Some(*pending);
                let result = value.serialize(&mut **ser);
                if ser.pending.take().is_some() {
                    return Err(Error::Unsupported(
                        "bounded wrapper payload must be a string or sequence",
                    ));
                }
                result
            }
            State::Elements { .. } => Err(Error::Unsupported("field inside array body")),
        }
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl ser::SerializeSeq for Compound<'_, '_> {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        match &mut self.0 {
            State::Elements { ser, .. } => value.serialize(&mut **ser),
            _ => Err(Error::Unsupported("unbounded sequence (use BoundedVec)")),
        }
    }

    fn end(self) -> Result<()> {
        if let State::Elements { ser, floor } = self.0 {
            ser.packer.close_array(floor);
        }
        Ok(())
    }
}

macro_rules! forward_serialize_element {
    ($t:ty) => {
        impl<'s, 'a> $t for &'s mut Serializer<'a> {
            type Ok = ();
            type Error = Error;
            fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
                value.serialize(&mut **self)
            }
            fn end(self) -> Result<()> {
                Ok(())
            }
        }
    };
}

macro_rules! forward_serialize_field {
    ($t:ty) => {
        impl<'s, 'a> $t for &'s mut Serializer<'a> {
            type Ok = ();
            type Error = Error;
            fn serialize_field<T: Serialize + ?Sized>(
                &mut self,
                _key: &'static str,
                value: &T,
            ) -> Result<()> {
                value.serialize(&mut **self)
            }
            fn end(self) -> Result<()> {
                Ok(())
            }
        }
    };
}

forward_serialize_element!(ser::SerializeTuple);

impl<'s, 'a> ser::SerializeTupleVariant for &'s mut Serializer<'a> {
    type Ok = ();
    type Error = Error;
    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        value.serialize(&mut **self)
    }
    fn end(self) -> Result<()> {
        Ok(())
    }
}

forward_serialize_field!(ser::SerializeStruct);
forward_serialize_field!(ser::SerializeStructVariant);
