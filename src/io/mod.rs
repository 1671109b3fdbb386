//! Contains the types and vocabulary for reading and writing data in the
//! Protocol Buffers wire format.

pub mod packed;
pub mod read;
pub mod write;

pub use packed::PackedIter;
pub use read::Reader;
pub use write::{PackedField, SubWriter, Writer};

use core::convert::TryFrom;
use core::fmt::{self, Display, Formatter};
use std::error;

/// The wire type of a protobuf value.
///
/// A wire type is paired with a field number between 1 and 536,870,911
/// to create a tag, a unique identifier for a field on the wire. Only
/// the four types below appear in valid proto3 data; everything else is
/// rejected while reading.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub enum WireType {
    /// A value read as a variable length integer.
    ///
    /// See the protobuf docs for more information on this encoding:
    /// https://developers.google.com/protocol-buffers/docs/encoding#varints
    Varint = 0,
    /// A 64-bit value encoded as 8 little endian bytes.
    Fixed64 = 1,
    /// A length delimited value. The length is encoded as a varint.
    LengthDelimited = 2,
    /// A 32-bit value encoded as 4 little endian bytes.
    Fixed32 = 5,
    /// Not a real wire type; used by [`Reader`] to mark that there is no
    /// current field.
    Unknown = 99,
}

/// The error struct used when trying to convert from a byte to a wire type.
#[derive(Debug)]
pub struct InvalidWireType;

impl TryFrom<u8> for WireType {
    type Error = InvalidWireType;

    fn try_from(value: u8) -> core::result::Result<WireType, InvalidWireType> {
        match value & 0b111 {
            0 => Ok(WireType::Varint),
            1 => Ok(WireType::Fixed64),
            2 => Ok(WireType::LengthDelimited),
            5 => Ok(WireType::Fixed32),
            _ => Err(InvalidWireType),
        }
    }
}

/// The largest permitted field number, `2^29 - 1`.
pub const TAG_MAX: u32 = (1 << 29) - 1;

/// Tags 0 and 19000 through 19999 are not allowed as per
/// https://developers.google.com/protocol-buffers/docs/proto
pub(crate) const fn tag_is_valid(tag: u32) -> bool {
    (tag > 0 && tag < 19000) || (tag > 19999 && tag <= TAG_MAX)
}

/// The error type for everything that can go wrong while decoding wire
/// data: reading fields with a [`Reader`] or stepping a
/// [`PackedIter`].
///
/// Writing never fails with one of these; the writer's failure modes are
/// all programmer errors and are checked with debug assertions instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// The input ended before a complete value could be decoded.
    EndOfBuffer,
    /// The input contained a tag with a wire type other than varint,
    /// fixed64, length-delimited or fixed32.
    UnknownWireType,
    /// The input contained a varint that was not terminated within 10
    /// bytes.
    VarintTooLong,
}

impl Display for Error {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        match self {
            Error::EndOfBuffer => write!(fmt, "the input ended before a complete value could be decoded"),
            Error::UnknownWireType => write!(fmt, "the input contained a tag with an unknown wire type"),
            Error::VarintTooLong => write!(fmt, "the input contained a varint longer than 10 bytes"),
        }
    }
}

impl error::Error for Error {}

/// A result for a decode operation.
pub type Result<T> = core::result::Result<T, Error>;
