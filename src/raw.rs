//! Contains marker types for the protobuf scalar value kinds and the
//! traits that drive encoding and decoding for each of them.
//!
//! Every scalar type from the protobuf language (`int32`, `sint64`,
//! `fixed32`, `double`, ...) gets a transparent newtype here. The
//! newtype carries the wire type and the payload codec for that kind at
//! compile time, so the generic [`Reader::get`], [`Writer::add`] and
//! packed machinery can be written once and instantiated per kind.
//!
//! [`Reader::get`]: crate::Reader::get
//! [`Writer::add`]: crate::Writer::add

use crate::buffer::BufferTarget;
use crate::internal::Sealed;
use crate::io::{Error, Result, WireType};
use crate::varint;
use trapper::{newtype, Wrapper};

/// A value that knows how to move itself through the wire format: its
/// wire type, its encoded payload size, and how to encode to a buffer
/// and decode from a byte slice.
///
/// `decode` advances the slice past the consumed bytes on success and
/// leaves it untouched on failure.
pub trait Value: Wrapper + Sealed + Sized {
    /// The wire type used when a value of this kind is written as its
    /// own field.
    const WIRE_TYPE: WireType;

    /// The number of bytes the encoded payload occupies.
    fn encoded_size(&self) -> usize;

    /// Appends the encoded payload to the buffer.
    fn encode<B: BufferTarget + ?Sized>(&self, buffer: &mut B);

    /// Decodes a payload from the front of `data`.
    fn decode(data: &mut &[u8]) -> Result<Self>;
}

/// A value whose encoded payload always occupies the same number of
/// bytes. This enables exact length prefixes for packed fields and exact
/// lengths on packed iterators.
pub trait ConstSized: Value {
    /// The constant payload size in bytes.
    const SIZE: usize;
}

fn decode_fixed32(data: &mut &[u8]) -> Result<[u8; 4]> {
    let bytes = *data;
    if bytes.len() < 4 {
        return Err(Error::EndOfBuffer);
    }
    *data = &bytes[4..];
    Ok([bytes[0], bytes[1], bytes[2], bytes[3]])
}

fn decode_fixed64(data: &mut &[u8]) -> Result<[u8; 8]> {
    let bytes = *data;
    if bytes.len() < 8 {
        return Err(Error::EndOfBuffer);
    }
    *data = &bytes[8..];
    Ok([
        bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
    ])
}

newtype! {
    /// A varint encoded 32-bit signed value. Negative values are sign
    /// extended and encoded as 10-byte varints.
    pub type Int32(i32);
}

impl Sealed for Int32 {}
impl Value for Int32 {
    const WIRE_TYPE: WireType = WireType::Varint;

    fn encoded_size(&self) -> usize {
        varint::size(self.0 as i64 as u64)
    }
    fn encode<B: BufferTarget + ?Sized>(&self, buffer: &mut B) {
        varint::write(buffer, self.0 as i64 as u64);
    }
    fn decode(data: &mut &[u8]) -> Result<Self> {
        varint::decode(data).map(|v| Self(v as i32))
    }
}

newtype! {
    /// A varint encoded 32-bit unsigned value. Can be at most 5 bytes.
    pub type Uint32(u32);
}

impl Sealed for Uint32 {}
impl Value for Uint32 {
    const WIRE_TYPE: WireType = WireType::Varint;

    fn encoded_size(&self) -> usize {
        varint::size(u64::from(self.0))
    }
    fn encode<B: BufferTarget + ?Sized>(&self, buffer: &mut B) {
        varint::write(buffer, u64::from(self.0));
    }
    fn decode(data: &mut &[u8]) -> Result<Self> {
        varint::decode(data).map(|v| Self(v as u32))
    }
}

newtype! {
    /// A varint encoded 64-bit signed value. Can be at most 10 bytes.
    pub type Int64(i64);
}

impl Sealed for Int64 {}
impl Value for Int64 {
    const WIRE_TYPE: WireType = WireType::Varint;

    fn encoded_size(&self) -> usize {
        varint::size(self.0 as u64)
    }
    fn encode<B: BufferTarget + ?Sized>(&self, buffer: &mut B) {
        varint::write(buffer, self.0 as u64);
    }
    fn decode(data: &mut &[u8]) -> Result<Self> {
        varint::decode(data).map(|v| Self(v as i64))
    }
}

newtype! {
    /// A varint encoded 64-bit unsigned value. Can be at most 10 bytes.
    pub type Uint64(u64);
}

impl Sealed for Uint64 {}
impl Value for Uint64 {
    const WIRE_TYPE: WireType = WireType::Varint;

    fn encoded_size(&self) -> usize {
        varint::size(self.0)
    }
    fn encode<B: BufferTarget + ?Sized>(&self, buffer: &mut B) {
        varint::write(buffer, self.0);
    }
    fn decode(data: &mut &[u8]) -> Result<Self> {
        varint::decode(data).map(Self)
    }
}

newtype! {
    /// A varint encoded 32-bit signed value using zigzag encoding, which
    /// keeps small magnitudes short regardless of sign.
    pub type Sint32(i32);
}

impl Sealed for Sint32 {}
impl Value for Sint32 {
    const WIRE_TYPE: WireType = WireType::Varint;

    fn encoded_size(&self) -> usize {
        varint::size(u64::from(varint::encode_zigzag32(self.0)))
    }
    fn encode<B: BufferTarget + ?Sized>(&self, buffer: &mut B) {
        varint::write(buffer, u64::from(varint::encode_zigzag32(self.0)));
    }
    fn decode(data: &mut &[u8]) -> Result<Self> {
        varint::decode(data).map(|v| Self(varint::decode_zigzag32(v as u32)))
    }
}

newtype! {
    /// A varint encoded 64-bit signed value using zigzag encoding, which
    /// keeps small magnitudes short regardless of sign.
    pub type Sint64(i64);
}

impl Sealed for Sint64 {}
impl Value for Sint64 {
    const WIRE_TYPE: WireType = WireType::Varint;

    fn encoded_size(&self) -> usize {
        varint::size(varint::encode_zigzag64(self.0))
    }
    fn encode<B: BufferTarget + ?Sized>(&self, buffer: &mut B) {
        varint::write(buffer, varint::encode_zigzag64(self.0));
    }
    fn decode(data: &mut &[u8]) -> Result<Self> {
        varint::decode(data).map(|v| Self(varint::decode_zigzag64(v)))
    }
}

newtype! {
    /// A bool value. Encoded as a single raw byte; decoding consumes one
    /// byte and requires the continuation bit to be clear.
    pub type Bool(bool);
}

impl Sealed for Bool {}
impl Value for Bool {
    const WIRE_TYPE: WireType = WireType::Varint;

    fn encoded_size(&self) -> usize {
        1
    }
    fn encode<B: BufferTarget + ?Sized>(&self, buffer: &mut B) {
        buffer.append(&[self.0 as u8]);
    }
    fn decode(data: &mut &[u8]) -> Result<Self> {
        let bytes = *data;
        match bytes.split_first() {
            Some((&byte, rest)) => {
                debug_assert!(byte & 0x80 == 0, "not a one byte varint");
                *data = rest;
                Ok(Self(byte != 0))
            }
            None => Err(Error::EndOfBuffer),
        }
    }
}

newtype! {
    /// An enum value. Encoded exactly like [`Int32`].
    pub type Enum(i32);
}

impl Sealed for Enum {}
impl Value for Enum {
    const WIRE_TYPE: WireType = WireType::Varint;

    fn encoded_size(&self) -> usize {
        Int32(self.0).encoded_size()
    }
    fn encode<B: BufferTarget + ?Sized>(&self, buffer: &mut B) {
        Int32(self.0).encode(buffer);
    }
    fn decode(data: &mut &[u8]) -> Result<Self> {
        Int32::decode(data).map(|v| Self(v.0))
    }
}

newtype! {
    #[derive(Debug)]
    /// A fixed size 32-bit unsigned value. Encoded as 4 little endian bytes.
    pub type Fixed32(u32);
}

impl Sealed for Fixed32 {}
impl Value for Fixed32 {
    const WIRE_TYPE: WireType = WireType::Fixed32;

    fn encoded_size(&self) -> usize {
        Self::SIZE
    }
    fn encode<B: BufferTarget + ?Sized>(&self, buffer: &mut B) {
        buffer.append(&self.0.to_le_bytes());
    }
    fn decode(data: &mut &[u8]) -> Result<Self> {
        decode_fixed32(data).map(|b| Self(u32::from_le_bytes(b)))
    }
}
impl ConstSized for Fixed32 {
    const SIZE: usize = 4;
}

newtype! {
    /// A fixed size 32-bit signed value. Encoded as 4 little endian bytes.
    pub type Sfixed32(i32);
}

impl Sealed for Sfixed32 {}
impl Value for Sfixed32 {
    const WIRE_TYPE: WireType = WireType::Fixed32;

    fn encoded_size(&self) -> usize {
        Self::SIZE
    }
    fn encode<B: BufferTarget + ?Sized>(&self, buffer: &mut B) {
        buffer.append(&self.0.to_le_bytes());
    }
    fn decode(data: &mut &[u8]) -> Result<Self> {
        decode_fixed32(data).map(|b| Self(i32::from_le_bytes(b)))
    }
}
impl ConstSized for Sfixed32 {
    const SIZE: usize = 4;
}

newtype! {
    /// A fixed size 64-bit unsigned value. Encoded as 8 little endian bytes.
    pub type Fixed64(u64);
}

impl Sealed for Fixed64 {}
impl Value for Fixed64 {
    const WIRE_TYPE: WireType = WireType::Fixed64;

    fn encoded_size(&self) -> usize {
        Self::SIZE
    }
    fn encode<B: BufferTarget + ?Sized>(&self, buffer: &mut B) {
        buffer.append(&self.0.to_le_bytes());
    }
    fn decode(data: &mut &[u8]) -> Result<Self> {
        decode_fixed64(data).map(|b| Self(u64::from_le_bytes(b)))
    }
}
impl ConstSized for Fixed64 {
    const SIZE: usize = 8;
}

newtype! {
    /// A fixed size 64-bit signed value. Encoded as 8 little endian bytes.
    pub type Sfixed64(i64);
}

impl Sealed for Sfixed64 {}
impl Value for Sfixed64 {
    const WIRE_TYPE: WireType = WireType::Fixed64;

    fn encoded_size(&self) -> usize {
        Self::SIZE
    }
    fn encode<B: BufferTarget + ?Sized>(&self, buffer: &mut B) {
        buffer.append(&self.0.to_le_bytes());
    }
    fn decode(data: &mut &[u8]) -> Result<Self> {
        decode_fixed64(data).map(|b| Self(i64::from_le_bytes(b)))
    }
}
impl ConstSized for Sfixed64 {
    const SIZE: usize = 8;
}

newtype! {
    /// An IEEE-754 single precision value. Encoded as 4 little endian bytes.
    pub type Float(f32);
}

impl Sealed for Float {}
impl Value for Float {
    const WIRE_TYPE: WireType = WireType::Fixed32;

    fn encoded_size(&self) -> usize {
        Self::SIZE
    }
    fn encode<B: BufferTarget + ?Sized>(&self, buffer: &mut B) {
        buffer.append(&self.0.to_le_bytes());
    }
    fn decode(data: &mut &[u8]) -> Result<Self> {
        decode_fixed32(data).map(|b| Self(f32::from_le_bytes(b)))
    }
}
impl ConstSized for Float {
    const SIZE: usize = 4;
}

newtype! {
    #[derive(Debug)]
    /// An IEEE-754 double precision value. Encoded as 8 little endian bytes.
    pub type Double(f64);
}

impl Sealed for Double {}
impl Value for Double {
    const WIRE_TYPE: WireType = WireType::Fixed64;

    fn encoded_size(&self) -> usize {
        Self::SIZE
    }
    fn encode<B: BufferTarget + ?Sized>(&self, buffer: &mut B) {
        buffer.append(&self.0.to_le_bytes());
    }
    fn decode(data: &mut &[u8]) -> Result<Self> {
        decode_fixed64(data).map(|b| Self(f64::from_le_bytes(b)))
    }
}
impl ConstSized for Double {
    const SIZE: usize = 8;
}
