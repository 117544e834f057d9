//! # ipc-pack
//!
//! A cursor-based pack/unpack codec for fixed-schema IPC messages exchanged
//! between independently compiled peers.
//!
//! ## Overview
//!
//! A message is a sequence of fields whose order and types both peers agree on
//! out of band; nothing on the wire describes it. The sender drives a
//! [`Packer`] over a caller-owned buffer, the receiver drives an [`Unpacker`]
//! over the received bytes, making the same calls in the same order.
//!
//! Each cursor tracks a position and a remaining capacity. Strings and arrays
//! charge the capacity with their *declared maximum* size rather than their
//! actual size, so whether a message fits its buffer depends only on its
//! schema, never on its content.
//!
//! ## Wire format
//!
//! | Field | Encoding | Capacity reserved |
//! |-------|----------|-------------------|
//! | integer, `f32`, `f64` | native width, native byte order | `size_of` |
//! | `bool` | one byte, 0 or 1 | 1 |
//! | `char` | `u32` Unicode scalar value | 4 |
//! | [`ResultCode`], [`OnOff`] | `i32` | 4 |
//! | [`SafeRef`] | `u32`, null or low bit set | 4 |
//! | size | `u32` | 4 |
//! | string | `u32` length + bytes, no terminator | `max + 4` |
//! | array | `u32` count + elements | `max_count * element_size + 4` |
//!
//! No padding, magic number, version tag, or type tag is ever written.
//!
//! ## Example
//!
//! ```rust
//! use ipc_pack::{Packer, Unpacker};
//!
//! let mut buf = [0u8; 64];
//! let mut packer = Packer::new(&mut buf);
//! packer.pack_u32(42).unwrap();
//! packer.pack_string("abc", 10).unwrap();
//! // 4 + (10 + 4) reserved, 4 + (3 + 4) written
//! assert_eq!(packer.remaining(), 64 - 18);
//! assert_eq!(packer.position(), 11);
//!
//! let mut unpacker = Unpacker::new(&buf);
//! assert_eq!(unpacker.unpack_u32().unwrap(), 42);
//! assert_eq!(unpacker.unpack_str(10).unwrap(), "abc");
//! ```
//!
//! ## Serde
//!
//! [`to_buffer`] / [`to_vec`] and [`from_buffer`] drive the same cursors from
//! `#[derive(Serialize, Deserialize)]` message structs. Strings and arrays must
//! be wrapped in [`BoundedString`] / [`BoundedVec`] so that their declared
//! maximum is known; see the [`bounded`] module.

pub mod bounded;
pub mod de;
pub mod error;
pub mod pack;
pub mod reference;
pub mod scalar;
pub mod ser;
pub mod status;
pub mod unpack;

pub use bounded::{BoundedString, BoundedVec, WireSize};
pub use de::{Deserializer, from_buffer, from_buffer_partial};
pub use error::{Error, Result};
pub use pack::{COUNT_PREFIX_SIZE, Packer, array_reservation, string_reservation};
pub use reference::SafeRef;
pub use scalar::Scalar;
pub use ser::{Serializer, to_buffer, to_vec};
pub use status::{OnOff, ResultCode};
pub use unpack::Unpacker;

pub use serde::{Deserialize, Serialize};

/// Newtype-struct name that routes a value through the reference codec.
pub(crate) const SAFE_REF_TOKEN: &str = "$ipc_pack::SafeRef";

/// Tuple-struct name whose `len` is a string's declared maximum.
pub(crate) const BOUNDED_STRING_TOKEN: &str = "$ipc_pack::BoundedString";

/// Tuple-struct name whose `len` is an array's body reservation.
pub(crate) const BOUNDED_SEQ_TOKEN: &str = "$ipc_pack::BoundedVec";
