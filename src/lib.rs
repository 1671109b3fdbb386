//! A minimalistic, streaming, zero-copy codec for the Protocol Buffers
//! wire format.
//!
//! This crate does not parse `.proto` files and does not generate code.
//! It gives you two low-level building blocks instead:
//!
//! * [`Reader`] walks a borrowed byte buffer field by field without
//!   building an intermediate object graph. Length-delimited fields are
//!   returned as borrowed views into the input, and packed repeated
//!   fields come back as lazy iterators that decode on demand.
//! * [`Writer`] appends tag-prefixed records to a caller-owned growable
//!   buffer. Nested submessages share the parent's buffer; their length
//!   prefix is reserved up front and patched once the submessage is
//!   complete.
//!
//! ```
//! use pbwire::{Reader, Writer};
//!
//! let mut buffer = Vec::new();
//! let mut writer = Writer::new(&mut buffer);
//! writer.add_uint32(1, 150);
//! assert_eq!(buffer, [0x08, 0x96, 0x01]);
//!
//! let mut reader = Reader::new(&buffer);
//! assert!(reader.next()?);
//! assert_eq!(reader.tag(), 1);
//! assert_eq!(reader.get_uint32()?, 150);
//! assert!(!reader.next()?);
//! # Ok::<(), pbwire::Error>(())
//! ```
//!
//! Malformed input surfaces as a recoverable [`Error`]; misuse of the
//! API (reading a value without a current field, mismatched wire types,
//! out-of-range tags on emission) is a programmer error checked by debug
//! assertions.

#![warn(missing_docs)]

mod internal {
    pub trait Sealed {}
}

pub mod buffer;
pub mod io;
pub mod raw;

mod varint;

pub use buffer::{BufferTarget, ByteString};
pub use io::packed::PackedIter;
pub use io::read::Reader;
pub use io::write::{PackedField, SubWriter, Writer};
pub use io::{Error, Result, WireType};
