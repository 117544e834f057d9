//! Decoding cursor.
//!
//! [`Unpacker`] mirrors [`Packer`](crate::Packer): the same reservations, the
//! same position movement. Its capacity is the size of the message buffer the
//! peer was allowed to fill, not the number of bytes it actually wrote, since
//! string and array reservations are charged at their declared maximum on both
//! sides.
//!
//! Every call validates before it commits, so a failed call leaves position
//! and capacity untouched.

use crate::error::{Error, Result};
use crate::pack::{COUNT_PREFIX_SIZE, array_reservation, string_reservation};
use crate::reference::SafeRef;
use crate::scalar::Scalar;
use crate::status::{OnOff, ResultCode};
use tracing::trace;

/// Decoding cursor over a caller-owned buffer.
#[derive(Debug, Clone)]
pub struct Unpacker<'a> {
    buf: &'a [u8],
    pos: usize,
    remaining: usize,
}

/// A validated array header, not yet committed.
pub(crate) struct ArrayHeader {
    pub(crate) count: usize,
    body: usize,
}

/// Cursor state saved when an array header is committed.
#[derive(Clone, Copy)]
pub(crate) struct ArrayFrame {
    start_pos: usize,
    start_remaining: usize,
    floor: usize,
}

macro_rules! named_unpack {
    ($($(#[$meta:meta])* $name:ident: $t:ty),* $(,)?) => {
        $(
            $(#[$meta])*
            pub fn $name(&mut self) -> Result<$t> {
                self.unpack()
            }
        )*
    };
}

impl<'a> Unpacker<'a> {
    /// Create a cursor whose capacity is the whole buffer.
    pub fn new(buf: &'a [u8]) -> Self {
        Unpacker {
            buf,
            pos: 0,
            remaining: buf.len(),
        }
    }

    /// Create a cursor with an explicit capacity budget.
    ///
    /// Fails if `capacity` is larger than the buffer.
    pub fn with_capacity(buf: &'a [u8], capacity: usize) -> Result<Self> {
        if capacity > buf.len() {
            return Err(Error::CapacityExceedsBuffer {
                capacity,
                len: buf.len(),
            });
        }
        Ok(Unpacker {
            buf,
            pos: 0,
            remaining: capacity,
        })
    }

    /// Bytes physically consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Capacity not yet reserved by any field.
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    // ── Internal helpers ───────────────────────────────────────────────────

    fn reserve(&self, needed: usize) -> Result<()> {
        if self.remaining < needed {
            trace!(needed, remaining = self.remaining, "unpack reservation refused");
            return Err(Error::InsufficientCapacity {
                needed,
                remaining: self.remaining,
            });
        }
        Ok(())
    }

    /// Read a scalar at `pos + offset` without moving the cursor. The caller
    /// must already have reserved past it.
    fn peek_at<T: Scalar>(&self, offset: usize) -> Result<T> {
        let start = self.pos + offset;
        T::read_ne(&self.buf[start..start + T::WIRE_SIZE])
    }

    fn advance(&mut self, consumed: usize, reserved: usize) {
        self.pos += consumed;
        self.remaining -= reserved;
    }

    // ── Scalars ────────────────────────────────────────────────────────────

    /// Unpack any scalar at its native width.
    pub fn unpack<T: Scalar>(&mut self) -> Result<T> {
        self.reserve(T::WIRE_SIZE)?;
        let value = self.peek_at::<T>(0)?;
        self.advance(T::WIRE_SIZE, T::WIRE_SIZE);
        Ok(value)
    }

    named_unpack! {
        unpack_u8: u8,
        unpack_u16: u16,
        unpack_u32: u32,
        unpack_u64: u64,
        unpack_i8: i8,
        unpack_i16: i16,
        unpack_i32: i32,
        unpack_i64: i64,
        unpack_f32: f32,
        unpack_f64: f64,
        /// Any nonzero byte reads as `true`.
        unpack_bool: bool,
        unpack_char: char,
        unpack_result: ResultCode,
        unpack_on_off: OnOff,
    }

    /// Unpack a 32-bit size field.
    pub fn unpack_size(&mut self) -> Result<usize> {
        let wire: u32 = self.unpack()?;
        Ok(wire as usize)
    }

    // ── References ─────────────────────────────────────────────────────────

    /// Unpack a handle, rejecting any nonzero value with its low bit clear.
    pub fn unpack_reference(&mut self) -> Result<SafeRef> {
        self.unpack()
    }

    // ── Strings ────────────────────────────────────────────────────────────

    /// Validate a string header and return `(count, reservation)`.
    fn string_header(&self, max: usize) -> Result<(usize, usize)> {
        let reserved = string_reservation(max);
        self.reserve(reserved)?;
        let count = self.peek_at::<u32>(0)? as usize;
        if count > max {
            trace!(count, max, "decoded string longer than declared maximum");
            return Err(Error::LengthOverflow { max, got: count });
        }
        Ok((count, reserved))
    }

    /// Unpack a string with declared maximum `max`, borrowing from the buffer.
    pub fn unpack_str(&mut self, max: usize) -> Result<&'a str> {
        let (count, reserved) = self.string_header(max)?;
        let start = self.pos + COUNT_PREFIX_SIZE;
        let bytes = &self.buf[start..start + count];
        let s = std::str::from_utf8(bytes).map_err(|_| Error::InvalidString)?;
        self.advance(COUNT_PREFIX_SIZE + count, reserved);
        Ok(s)
    }

    /// Unpack a string with declared maximum `max` into an owned `String`.
    pub fn unpack_string(&mut self, max: usize) -> Result<String> {
        self.unpack_str(max).map(str::to_owned)
    }

    /// Unpack a string's raw bytes into `dest` and NUL-terminate them.
    ///
    /// `dest` must hold `count + 1` bytes. With no destination, only an empty
    /// string is accepted. Returns the string length, excluding the
    /// terminator.
    pub fn unpack_string_into(&mut self, dest: Option<&mut [u8]>, max: usize) -> Result<usize> {
        let (count, reserved) = self.string_header(max)?;
        match dest {
            None if count == 0 => {}
            None => {
                trace!(count, "string decoded without destination");
                return Err(Error::MissingDestination(count));
            }
            Some(dest) => {
                if count >= dest.len() {
                    trace!(count, len = dest.len(), "string destination too small");
                    return Err(Error::DestinationTooSmall {
                        needed: count + 1,
                        len: dest.len(),
                    });
                }
                let start = self.pos + COUNT_PREFIX_SIZE;
                dest[..count].copy_from_slice(&self.buf[start..start + count]);
                dest[count] = 0;
            }
        }
        self.advance(COUNT_PREFIX_SIZE + count, reserved);
        Ok(count)
    }

    // ── Arrays ─────────────────────────────────────────────────────────────

    /// Validate an array header without committing it.
    pub(crate) fn array_header(&self, reserved: usize, max_count: usize) -> Result<ArrayHeader> {
        self.reserve(reserved)?;
        let count = self.peek_at::<u32>(0)? as usize;
        if count > max_count {
            trace!(count, max_count, "decoded array longer than declared maximum");
            return Err(Error::CountOverflow {
                max: max_count,
                got: count,
            });
        }
        Ok(ArrayHeader {
            count,
            body: reserved - COUNT_PREFIX_SIZE,
        })
    }

    /// Commit a validated header. Elements are decoded after this.
    pub(crate) fn open_array(&mut self, header: &ArrayHeader) -> ArrayFrame {
        let frame = ArrayFrame {
            start_pos: self.pos,
            start_remaining: self.remaining,
            floor: self.remaining - COUNT_PREFIX_SIZE - header.body,
        };
        self.advance(COUNT_PREFIX_SIZE, COUNT_PREFIX_SIZE);
        frame
    }

    /// Drop the capacity to the array's worst case.
    pub(crate) fn close_array(&mut self, frame: ArrayFrame) {
        assert!(
            self.remaining >= frame.floor,
            "array elements reserved more than their declared element size"
        );
        self.remaining = frame.floor;
    }

    /// Roll the cursor back to before the array header.
    pub(crate) fn abort_array(&mut self, frame: ArrayFrame) {
        self.pos = frame.start_pos;
        self.remaining = frame.start_remaining;
    }

    fn array_body<T, F, S>(
        &mut self,
        header: ArrayHeader,
        mut unpack_element: F,
        mut store: S,
    ) -> Result<()>
    where
        F: FnMut(&mut Self) -> Result<T>,
        S: FnMut(usize, T),
    {
        let frame = self.open_array(&header);
        for index in 0..header.count {
            match unpack_element(self) {
                Ok(value) => store(index, value),
                Err(err) => {
                    trace!(index, %err, "array element rejected");
                    self.abort_array(frame);
                    return Err(Error::ArrayElement {
                        index,
                        source: Box::new(err),
                    });
                }
            }
        }
        self.close_array(frame);
        Ok(())
    }

    /// Unpack an array of at most `max_count` elements into a new `Vec`.
    ///
    /// The header (reservation and count) is validated before
    /// `unpack_element` runs for the first time.
    ///
    /// Unlike [`Packer::pack_array`](crate::Packer::pack_array), a failing
    /// element does not panic. The failure is returned as
    /// [`Error::ArrayElement`] and the cursor is restored to before the
    /// header.
    pub fn unpack_array<T, F>(
        &mut self,
        max_count: usize,
        element_size: usize,
        unpack_element: F,
    ) -> Result<Vec<T>>
    where
        F: FnMut(&mut Self) -> Result<T>,
    {
        let header = self.array_header(array_reservation(max_count, element_size), max_count)?;
        let mut out = Vec::with_capacity(header.count);
        self.array_body(header, unpack_element, |_, value| out.push(value))?;
        Ok(out)
    }

    /// Unpack an array into a caller-supplied slice and return the count.
    ///
    /// A missing destination is accepted only for an empty array, and is
    /// then indistinguishable from an empty destination. Element failures are
    /// reported as in [`unpack_array`](Self::unpack_array).
    pub fn unpack_array_into<T, F>(
        &mut self,
        dest: Option<&mut [T]>,
        max_count: usize,
        element_size: usize,
        unpack_element: F,
    ) -> Result<usize>
    where
        F: FnMut(&mut Self) -> Result<T>,
    {
        let header = self.array_header(array_reservation(max_count, element_size), max_count)?;
        let count = header.count;
        match dest {
            None if count == 0 => {
                self.array_body(header, unpack_element, |_, _| {})?;
            }
            None => {
                trace!(count, "array decoded without destination");
                return Err(Error::MissingDestination(count));
            }
            Some(dest) => {
                if dest.len() < count {
                    trace!(count, len = dest.len(), "array destination too small");
                    return Err(Error::DestinationTooSmall {
                        needed: count,
                        len: dest.len(),
                    });
                }
                self.array_body(header, unpack_element, |index, value| dest[index] = value)?;
            }
        }
        Ok(count)
    }

    /// Unpack an array of scalars; each element reserves `T::WIRE_SIZE`.
    pub fn unpack_scalar_array<T: Scalar>(&mut self, max_count: usize) -> Result<Vec<T>> {
        self.unpack_array(max_count, T::WIRE_SIZE, |u| u.unpack())
    }
}
