//! Encoding cursor.
//!
//! A [`Packer`] writes into a caller-owned buffer and keeps two counters:
//! the position (bytes physically written) and the remaining capacity. For
//! fixed-width fields both move by the same amount. For strings and arrays the
//! position moves by the bytes actually written while the capacity drops by
//! the field's declared worst case, so a message either fits its buffer for
//! every possible content or fails on the first field that could overflow.
//!
//! Because capacity never drops by less than the position advances,
//! `remaining <= buf.len() - pos` holds for the life of the cursor, and every
//! write inside a successful reservation is in bounds.

use crate::error::{Error, Result};
use crate::reference::SafeRef;
use crate::scalar::Scalar;
use crate::status::{OnOff, ResultCode};
use tracing::trace;

/// Size of the count prefix in front of every string and array.
pub const COUNT_PREFIX_SIZE: usize = 4;

/// Capacity a string field with declared maximum `max` reserves.
pub const fn string_reservation(max: usize) -> usize {
    max.saturating_add(COUNT_PREFIX_SIZE)
}

/// Capacity an array field reserves.
pub const fn array_reservation(max_count: usize, element_size: usize) -> usize {
    max_count
        .saturating_mul(element_size)
        .saturating_add(COUNT_PREFIX_SIZE)
}

/// Length of `bytes` up to (not including) the first NUL.
fn terminated_len(bytes: &[u8]) -> usize {
    bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len())
}

/// Encoding cursor over a caller-owned buffer.
///
/// ```rust
/// use ipc_pack::Packer;
///
/// let mut buf = [0u8; 64];
/// let mut packer = Packer::new(&mut buf);
/// packer.pack_u32(42).unwrap();
/// packer.pack_string("abc", 10).unwrap();
///
/// assert_eq!(packer.position(), 4 + 4 + 3);
/// assert_eq!(packer.remaining(), 64 - 4 - (10 + 4));
/// ```
#[derive(Debug)]
pub struct Packer<'a> {
    buf: &'a mut [u8],
    pos: usize,
    remaining: usize,
}

macro_rules! named_pack {
    ($($(#[$meta:meta])* $name:ident: $t:ty),* $(,)?) => {
        $(
            $(#[$meta])*
            pub fn $name(&mut self, value: $t) -> Result<()> {
                self.pack(value)
            }
        )*
    };
}

impl<'a> Packer<'a> {
    /// Create a cursor whose capacity is the whole buffer.
    pub fn new(buf: &'a mut [u8]) -> Self {
        let remaining = buf.len();
        Packer {
            buf,
            pos: 0,
            remaining,
        }
    }

    /// Create a cursor with an explicit capacity budget.
    ///
    /// Fails if `capacity` is larger than the buffer.
    pub fn with_capacity(buf: &'a mut [u8], capacity: usize) -> Result<Self> {
        if capacity > buf.len() {
            return Err(Error::CapacityExceedsBuffer {
                capacity,
                len: buf.len(),
            });
        }
        Ok(Packer {
            buf,
            pos: 0,
            remaining: capacity,
        })
    }

    /// Bytes physically written so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Capacity not yet reserved by any field.
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    /// The encoded message so far.
    pub fn written(&self) -> &[u8] {
        &self.buf[..self.pos]
    }

    /// Consume the cursor and return the encoded message.
    pub fn into_written(self) -> &'a mut [u8] {
        let Packer { buf, pos, .. } = self;
        &mut buf[..pos]
    }

    // ── Internal helpers ───────────────────────────────────────────────────

    fn reserve(&self, needed: usize) -> Result<()> {
        if self.remaining < needed {
            trace!(needed, remaining = self.remaining, "pack reservation refused");
            return Err(Error::InsufficientCapacity {
                needed,
                remaining: self.remaining,
            });
        }
        Ok(())
    }

    /// Copy `bytes` at the position. Capacity must already be reserved.
    fn put(&mut self, bytes: &[u8]) {
        let end = self.pos + bytes.len();
        self.buf[self.pos..end].copy_from_slice(bytes);
        self.pos = end;
    }

    // ── Scalars ────────────────────────────────────────────────────────────

    /// Pack any scalar at its native width.
    pub fn pack<T: Scalar>(&mut self, value: T) -> Result<()> {
        self.reserve(T::WIRE_SIZE)?;
        let end = self.pos + T::WIRE_SIZE;
        value.write_ne(&mut self.buf[self.pos..end]);
        self.pos = end;
        self.remaining -= T::WIRE_SIZE;
        Ok(())
    }

    named_pack! {
        pack_u8: u8,
        pack_u16: u16,
        pack_u32: u32,
        pack_u64: u64,
        pack_i8: i8,
        pack_i16: i16,
        pack_i32: i32,
        pack_i64: i64,
        pack_f32: f32,
        pack_f64: f64,
        /// Always one byte, 0 or 1.
        pack_bool: bool,
        pack_char: char,
        pack_result: ResultCode,
        pack_on_off: OnOff,
    }

    /// Pack a size as a 32-bit value, whatever the host's `usize` width.
    pub fn pack_size(&mut self, value: usize) -> Result<()> {
        let wire = u32::try_from(value).map_err(|_| {
            trace!(value, "size does not fit in 32 bits");
            Error::SizeOverflow(value)
        })?;
        self.pack(wire)
    }

    // ── References ─────────────────────────────────────────────────────────

    /// Pack a handle that has already been validated.
    pub fn pack_reference(&mut self, reference: SafeRef) -> Result<()> {
        self.pack(reference)
    }

    /// Validate and pack a raw pointer-sized handle.
    ///
    /// Fails without writing if the handle is wider than 32 bits or is
    /// nonzero with its low bit clear.
    pub fn pack_raw_reference(&mut self, raw: usize) -> Result<()> {
        self.pack(SafeRef::from_raw(raw)?)
    }

    // ── Strings ────────────────────────────────────────────────────────────

    /// Pack a string with declared maximum length `max`.
    ///
    /// See [`pack_string_bytes`](Self::pack_string_bytes).
    pub fn pack_string(&mut self, s: &str, max: usize) -> Result<()> {
        self.pack_string_bytes(s.as_bytes(), max)
    }

    /// Pack a byte string with declared maximum length `max`.
    ///
    /// The string ends at the first NUL or at the end of `bytes`. Requires
    /// `max + 4` bytes of capacity before anything is written, and reserves
    /// exactly that much on success even though only `len + 4` bytes are
    /// written. A string longer than `max` is rejected with no effect.
    pub fn pack_string_bytes(&mut self, bytes: &[u8], max: usize) -> Result<()> {
        let reserved = string_reservation(max);
        self.reserve(reserved)?;

        let len = terminated_len(bytes);
        if len > max {
            trace!(len, max, "string longer than declared maximum");
            return Err(Error::LengthOverflow { max, got: len });
        }
        let count = u32::try_from(len).map_err(|_| Error::SizeOverflow(len))?;

        self.put(&count.to_ne_bytes());
        self.put(&bytes[..len]);
        self.remaining -= reserved;
        Ok(())
    }

    // ── Arrays ─────────────────────────────────────────────────────────────

    /// Pack an array of at most `max_count` elements, each reserving
    /// `element_size` bytes.
    ///
    /// The header is validated before anything is written: the full
    /// `max_count * element_size + 4` reservation must fit, and
    /// `items.len() <= max_count`. Then the count is written and
    /// `pack_element` runs once per item in order. Finally the capacity is set
    /// to exactly the worst case, discarding any slack left by elements
    /// smaller than `element_size`.
    ///
    /// # Panics
    ///
    /// `pack_element` must not fail and must not reserve more than
    /// `element_size` per element once the header has been accepted. Either
    /// happening means the caller's field description is wrong, and panics.
    pub fn pack_array<T, F>(
        &mut self,
        items: &[T],
        max_count: usize,
        element_size: usize,
        mut pack_element: F,
    ) -> Result<()>
    where
        F: FnMut(&mut Self, &T) -> Result<()>,
    {
        let reserved = array_reservation(max_count, element_size);
        let floor = self.open_array(items.len(), max_count, reserved)?;

        for (index, item) in items.iter().enumerate() {
            if let Err(err) = pack_element(self, item) {
                panic!("array element {index} failed after header validation: {err}");
            }
        }
        self.close_array(floor);
        Ok(())
    }

    /// Validate an array header and write its count. Returns the capacity the
    /// cursor must be left with once every element is packed.
    pub(crate) fn open_array(
        &mut self,
        count: usize,
        max_count: usize,
        reserved: usize,
    ) -> Result<usize> {
        self.reserve(reserved)?;
        if count > max_count {
            trace!(count, max_count, "array longer than declared maximum");
            return Err(Error::CountOverflow {
                max: max_count,
                got: count,
            });
        }
        let wire = u32::try_from(count).map_err(|_| Error::SizeOverflow(count))?;

        self.put(&wire.to_ne_bytes());
        self.remaining -= COUNT_PREFIX_SIZE;
        Ok(self.remaining - (reserved - COUNT_PREFIX_SIZE))
    }

    /// Drop the capacity to the array's worst case.
    pub(crate) fn close_array(&mut self, floor: usize) {
        assert!(
            self.remaining >= floor,
            "array elements reserved more than their declared element size"
        );
        self.remaining = floor;
    }

    /// Pack an array of scalars; each element reserves `T::WIRE_SIZE`.
    pub fn pack_scalar_array<T: Scalar>(&mut self, items: &[T], max_count: usize) -> Result<()> {
        self.pack_array(items, max_count, T::WIRE_SIZE, |p, v| p.pack(*v))
    }
}
