//! Serde deserializer over an [`Unpacker`].
//!
//! The mapping mirrors [`ser`](crate::ser). Nothing on the wire describes
//! itself, so `deserialize_any` and `deserialize_ignored_any` are rejected.

use crate::error::{Error, Result};
use crate::unpack::Unpacker;
use serde::de::{self, Deserialize, EnumAccess, SeqAccess, VariantAccess, Visitor};

/// Deserialize a value from `buf`, using the whole buffer as capacity.
pub fn from_buffer<'de, T: Deserialize<'de>>(buf: &'de [u8]) -> Result<T> {
    let mut de = Deserializer::new(Unpacker::new(buf));
    T::deserialize(&mut de)
}

/// Deserialize a value from `buf`, also returning the number of bytes the
/// value physically occupied.
pub fn from_buffer_partial<'de, T: Deserialize<'de>>(buf: &'de [u8]) -> Result<(T, usize)> {
    let mut de = Deserializer::new(Unpacker::new(buf));
    let value = T::deserialize(&mut de)?;
    Ok((value, de.unpacker.position()))
}

/// The serde deserializer. Reads through an [`Unpacker`].
#[derive(Debug, Clone)]
pub struct Deserializer<'de> {
    unpacker: Unpacker<'de>,
}

impl<'de> Deserializer<'de> {
    pub fn new(unpacker: Unpacker<'de>) -> Self {
        Deserializer { unpacker }
    }

    /// Consume the deserializer and return the cursor.
    pub fn into_inner(self) -> Unpacker<'de> {
        self.unpacker
    }

    pub fn unpacker(&self) -> &Unpacker<'de> {
        &self.unpacker
    }

    /// Decode a bounded string and hand it to the visitor. Rolled back if the
    /// visitor rejects it.
    fn bounded_string<V: Visitor<'de>>(&mut self, max: usize, visitor: V) -> Result<V::Value> {
        let checkpoint = self.unpacker.clone();
        let s = self.unpacker.unpack_str(max)?;
        visitor.visit_borrowed_str(s).inspect_err(|_| {
            self.unpacker = checkpoint;
        })
    }

    /// Decode a bounded array whose elements reserve `body` bytes in total.
    /// The visitor sees the decoded count as its size hint before any
    /// element is read.
    fn bounded_seq<V: Visitor<'de>>(&mut self, body: usize, visitor: V) -> Result<V::Value> {
        let reserved = body.saturating_add(crate::COUNT_PREFIX_SIZE);
        let header = self.unpacker.array_header(reserved, usize::MAX)?;
        let count = header.count;
        let frame = self.unpacker.open_array(&header);
        match visitor.visit_seq(SeqDeserializer::new(self, count)) {
            Ok(value) => {
                self.unpacker.close_array(frame);
                Ok(value)
            }
            Err(err) => {
                self.unpacker.abort_array(frame);
                Err(err)
            }
        }
    }
}

// ── Main Deserializer impl ─────────────────────────────────────────────────

impl<'de> de::Deserializer<'de> for &mut Deserializer<'de> {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value> {
        Err(Error::Unsupported("deserialize_any (the wire format is not self-describing)"))
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_bool(self.unpacker.unpack_bool()?)
    }

    fn deserialize_i8<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_i8(self.unpacker.unpack_i8()?)
    }

    fn deserialize_i16<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_i16(self.unpacker.unpack_i16()?)
    }

    fn deserialize_i32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_i32(self.unpacker.unpack_i32()?)
    }

    fn deserialize_i64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_i64(self.unpacker.unpack_i64()?)
    }

    fn deserialize_u8<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_u8(self.unpacker.unpack_u8()?)
    }

    fn deserialize_u16<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_u16(self.unpacker.unpack_u16()?)
    }

    fn deserialize_u32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_u32(self.unpacker.unpack_u32()?)
    }

    fn deserialize_u64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_u64(self.unpacker.unpack_u64()?)
    }

    fn deserialize_f32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_f32(self.unpacker.unpack_f32()?)
    }

    fn deserialize_f64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_f64(self.unpacker.unpack_f64()?)
    }

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_char(self.unpacker.unpack_char()?)
    }

    fn deserialize_str<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value> {
        Err(Error::Unsupported("unbounded string (use BoundedString)"))
    }

    fn deserialize_string<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value> {
        Err(Error::Unsupported("unbounded string (use BoundedString)"))
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value> {
        Err(Error::Unsupported("byte buffer (use BoundedVec<u8, N>)"))
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value> {
        Err(Error::Unsupported("byte buffer (use BoundedVec<u8, N>)"))
    }

    fn deserialize_option<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value> {
        Err(Error::Unsupported("Option"))
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_unit()
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        if name == crate::SAFE_REF_TOKEN {
            let reference = self.unpacker.unpack_reference()?;
            visitor.visit_u32(reference.to_wire())
        } else {
            visitor.visit_newtype_struct(self)
        }
    }

    fn deserialize_seq<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value> {
        Err(Error::Unsupported("unbounded sequence (use BoundedVec)"))
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, len: usize, visitor: V) -> Result<V::Value> {
        // Fixed-length: no count prefix
        visitor.visit_seq(SeqDeserializer::new(self, len))
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        len: usize,
        visitor: V,
    ) -> Result<V::Value> {
        match name {
            crate::BOUNDED_STRING_TOKEN => self.bounded_string(len, visitor),
            crate::BOUNDED_SEQ_TOKEN => self.bounded_seq(len, visitor),
            _ => visitor.visit_seq(SeqDeserializer::new(self, len)),
        }
    }

    fn deserialize_map<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value> {
        Err(Error::Unsupported("map"))
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        // Fields in declaration order, no count prefix
        visitor.visit_seq(SeqDeserializer::new(self, fields.len()))
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_enum(EnumDeserializer::new(self))
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        // Variant index
        visitor.visit_u32(self.unpacker.unpack_u32()?)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value> {
        Err(Error::Unsupported(
            "deserialize_ignored_any (the wire format is not self-describing)",
        ))
    }
}

// ── SeqDeserializer: fixed count ───────────────────────────────────────────

struct SeqDeserializer<'a, 'de: 'a> {
    de: &'a mut Deserializer<'de>,
    remaining: usize,
}

impl<'a, 'de> SeqDeserializer<'a, 'de> {
    fn new(de: &'a mut Deserializer<'de>, count: usize) -> Self {
        SeqDeserializer {
            de,
            remaining: count,
        }
    }
}

impl<'de> SeqAccess<'de> for SeqDeserializer<'_, 'de> {
    type Error = Error;

    fn next_element_seed<T: de::DeserializeSeed<'de>>(
        &mut self,
        seed: T,
    ) -> Result<Option<T::Value>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        seed.deserialize(&mut *self.de).map(Some)
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.remaining)
    }
}

// ── EnumDeserializer ───────────────────────────────────────────────────────

struct EnumDeserializer<'a, 'de: 'a> {
    de: &'a mut Deserializer<'de>,
}

impl<'a, 'de> EnumDeserializer<'a, 'de> {
    fn new(de: &'a mut Deserializer<'de>) -> Self {
        EnumDeserializer { de }
    }
}

impl<'de> EnumAccess<'de> for EnumDeserializer<'_, 'de> {
    type Error = Error;
    type Variant = Self;

    fn variant_seed<V: de::DeserializeSeed<'de>>(
        self,
        seed: V,
    ) -> Result<(V::Value, Self::Variant)> {
        let variant_index = self.de.unpacker.unpack_u32()?;
        let val = seed.deserialize(de::value::U32Deserializer::<Error>::new(variant_index))?;
        Ok((val, self))
    }
}

impl<'de> VariantAccess<'de> for EnumDeserializer<'_, 'de> {
    type Error = Error;

    /// No data follows the index
    fn unit_variant(self) -> Result<()> {
        Ok(())
    }

    fn newtype_variant_seed<T: de::DeserializeSeed<'de>>(self, seed: T) -> Result<T::Value> {
        seed.deserialize(self.de)
    }

    fn tuple_variant<V: Visitor<'de>>(self, len: usize, visitor: V) -> Result<V::Value> {
        visitor.visit_seq(SeqDeserializer::new(self.de, len))
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_seq(SeqDeserializer::new(self.de, fields.len()))
    }
}
