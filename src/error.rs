use serde::{de, ser};
use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while packing or unpacking a message.
///
/// Any error means the current message must be abandoned. The cursor that
/// reported it is left exactly as it was before the failing call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A custom error message from serde
    #[error("{0}")]
    Message(String),

    /// The field's reservation does not fit in the remaining capacity
    #[error("insufficient capacity: need {needed} bytes, {remaining} remaining")]
    InsufficientCapacity { needed: usize, remaining: usize },

    /// A cursor was given more capacity than its buffer holds
    #[error("capacity {capacity} exceeds buffer length {len}")]
    CapacityExceedsBuffer { capacity: usize, len: usize },

    /// A string was longer than its declared maximum
    #[error("length {got} exceeds maximum {max}")]
    LengthOverflow { max: usize, got: usize },

    /// An array held more elements than its declared maximum count
    #[error("count {got} exceeds maximum {max}")]
    CountOverflow { max: usize, got: usize },

    /// A size value does not fit the 32-bit size field
    #[error("size {0} does not fit in 32 bits")]
    SizeOverflow(usize),

    /// A handle is neither null nor tagged with its low bit, or is wider than 32 bits
    #[error("invalid reference {0:#x}: must be null or have its low bit set")]
    InvalidReference(usize),

    /// The decode destination cannot hold the decoded field
    #[error("destination holds {len} but {needed} are required")]
    DestinationTooSmall { needed: usize, len: usize },

    /// A non-empty field was decoded without a destination
    #[error("no destination supplied for a field of {0} elements")]
    MissingDestination(usize),

    /// String bytes were not valid UTF-8, or contained an interior NUL
    #[error("string contains invalid bytes")]
    InvalidString,

    /// A decoded char was not a Unicode scalar value
    #[error("invalid char value {0:#x}")]
    InvalidChar(u32),

    /// A decoded enumeration value has no matching variant
    #[error("invalid {kind} value {value}")]
    InvalidEnum { kind: &'static str, value: i64 },

    /// An element of an already-validated array failed to decode
    #[error("array element {index} failed to decode: {source}")]
    ArrayElement { index: usize, source: Box<Error> },

    /// The serde data model type has no mapping onto the wire format
    #[error("unsupported type: {0}")]
    Unsupported(&'static str),
}

impl ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Message(msg.to_string())
    }
}

impl de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Message(msg.to_string())
    }
}
