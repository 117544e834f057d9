//! Fixed-width scalar encodings.
//!
//! Every scalar is laid out at its native width in native byte order, with no
//! padding. `bool` is the one exception to "native": it always occupies a
//! single canonical byte (0 or 1) so peers whose boolean type is wider still
//! agree on the wire.
//!
//! Rust `char` is a 4-byte Unicode scalar value, not the 1-byte C character
//! field. A peer that exchanges C `char` fields expects one byte; pack those
//! with `pack_u8` / `unpack_u8`.
//!
//! | Rust type | Wire size | Decode check |
//! |-----------|-----------|--------------|
//! | `u8` / `i8` | 1 | |
//! | `u16` / `i16` | 2 | |
//! | `u32` / `i32` | 4 | |
//! | `u64` / `i64` | 8 | |
//! | `f32` | 4 | |
//! | `f64` | 8 | |
//! | `bool` | 1 | nonzero reads as `true` |
//! | `char` | 4 | must be a Unicode scalar value |
//! | [`ResultCode`](crate::ResultCode) | 4 | known code |
//! | [`OnOff`](crate::OnOff) | 4 | 0 or 1 |
//! | [`SafeRef`](crate::SafeRef) | 4 | null or low bit set |

use crate::error::{Error, Result};

pub(crate) mod private {
    pub trait Sealed {}
}

/// A value with a fixed-width wire encoding.
///
/// This trait is sealed; the set of scalar types is part of the wire contract.
pub trait Scalar: private::Sealed + Copy + Sized {
    /// Bytes occupied on the wire, and the capacity reserved per value.
    const WIRE_SIZE: usize;

    /// Write the encoding into `dst`, which is exactly `WIRE_SIZE` bytes long.
    fn write_ne(self, dst: &mut [u8]);

    /// Read a value from `src`, which is exactly `WIRE_SIZE` bytes long.
    fn read_ne(src: &[u8]) -> Result<Self>;
}

macro_rules! impl_scalar_ne {
    ($($t:ty),* $(,)?) => {
        $(
            impl private::Sealed for $t {}

            impl Scalar for $t {
                const WIRE_SIZE: usize = std::mem::size_of::<$t>();

                fn write_ne(self, dst: &mut [u8]) {
                    dst.copy_from_slice(&self.to_ne_bytes());
                }

                fn read_ne(src: &[u8]) -> Result<Self> {
                    let mut raw = [0u8; std::mem::size_of::<$t>()];
                    raw.copy_from_slice(src);
                    Ok(<$t>::from_ne_bytes(raw))
                }
            }
        )*
    };
}

impl_scalar_ne!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64);

impl private::Sealed for bool {}

impl Scalar for bool {
    const WIRE_SIZE: usize = 1;

    fn write_ne(self, dst: &mut [u8]) {
        dst[0] = u8::from(self);
    }

    fn read_ne(src: &[u8]) -> Result<Self> {
        Ok(src[0] != 0)
    }
}

impl private::Sealed for char {}

impl Scalar for char {
    const WIRE_SIZE: usize = 4;

    fn write_ne(self, dst: &mut [u8]) {
        u32::from(self).write_ne(dst);
    }

    fn read_ne(src: &[u8]) -> Result<Self> {
        let v = u32::read_ne(src)?;
        char::from_u32(v).ok_or(Error::InvalidChar(v))
    }
}
