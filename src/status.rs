//! Small enumerations carried as 32-bit scalars: result codes and on/off flags.

use crate::error::{Error, Result};
use crate::scalar::{Scalar, private};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use tracing::trace;

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $($(#[$vmeta:meta])* $variant:ident = $value:expr),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(i32)]
        pub enum $name {
            $($(#[$vmeta])* $variant = $value),*
        }

        impl $name {
            /// The value carried on the wire.
            pub const fn code(self) -> i32 {
                self as i32
            }
        }

        impl TryFrom<i32> for $name {
            type Error = Error;

            fn try_from(value: i32) -> Result<Self> {
                match value {
                    $(v if v == $value => Ok($name::$variant),)*
                    _ => {
                        trace!(kind = $kind, value, "rejected unknown enum value");
                        Err(Error::InvalidEnum { kind: $kind, value: i64::from(value) })
                    }
                }
            }
        }

        impl private::Sealed for $name {}

        impl Scalar for $name {
            const WIRE_SIZE: usize = 4;

            fn write_ne(self, dst: &mut [u8]) {
                self.code().write_ne(dst);
            }

            fn read_ne(src: &[u8]) -> Result<Self> {
                $name::try_from(i32::read_ne(src)?)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                serializer.serialize_i32(self.code())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
                let value = i32::deserialize(deserializer)?;
                $name::try_from(value).map_err(serde::de::Error::custom)
            }
        }
    };
}

wire_enum! {
    /// Status code returned across the IPC boundary.
    ResultCode, "result code" {
        Ok = 0,
        NotFound = -1,
        OutOfRange = -2,
        NoMemory = -3,
        NotPermitted = -4,
        Fault = -5,
        CommError = -6,
        Timeout = -7,
        Overflow = -8,
        Underflow = -9,
        WouldBlock = -10,
        Deadlock = -11,
        FormatError = -12,
        Duplicate = -13,
        BadParameter = -14,
        Closed = -15,
        Busy = -16,
        Unsupported = -17,
        IoError = -18,
        NotImplemented = -19,
        Unavailable = -20,
        Terminated = -21,
        InProgress = -22,
        Suspended = -23,
    }
}

wire_enum! {
    /// Two-state switch.
    OnOff, "on/off" {
        Off = 0,
        On = 1,
    }
}

impl ResultCode {
    pub const fn is_ok(self) -> bool {
        matches!(self, ResultCode::Ok)
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ({})", self, self.code())
    }
}

impl From<bool> for OnOff {
    fn from(on: bool) -> Self {
        if on { OnOff::On } else { OnOff::Off }
    }
}

impl From<OnOff> for bool {
    fn from(v: OnOff) -> Self {
        v == OnOff::On
    }
}
