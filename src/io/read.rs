//! Defines the [`Reader`], a forward cursor for reading fields from a
//! protobuf encoded byte buffer without copying.

use core::convert::TryFrom;
use crate::buffer::ByteString;
use crate::io::{Error, PackedIter, Result, WireType, TAG_MAX};
use crate::raw::{self, Value};
use crate::varint;

/// A reader over a protobuf message held in a borrowed byte buffer.
/// Either a top-level message or a nested submessage.
///
/// The reader keeps a cursor into the buffer and the tag and wire type
/// of the *current* field. [`next`](Reader::next) decodes the next tag
/// and makes that field current; the `get_*` accessors and
/// [`skip`](Reader::skip) consume the current field's payload and clear
/// it again. The usual shape is a `while` loop with a `match` on the
/// tag:
///
/// ```
/// use pbwire::Reader;
///
/// let data = [0x08, 0x96, 0x01, 0x20, 0x2A];
/// let mut reader = Reader::new(&data);
/// while reader.next()? {
///     match reader.tag() {
///         1 => assert_eq!(reader.get_uint32()?, 150),
///         4 => assert_eq!(reader.get_uint32()?, 42),
///         _ => reader.skip()?,
///     }
/// }
/// # Ok::<(), pbwire::Error>(())
/// ```
///
/// All accessors that return borrowed data provide the strong guarantee:
/// on failure the reader is left exactly as it was. Only
/// [`get_bytes_owned`](Reader::get_bytes_owned), which allocates, moves
/// the cursor before its allocation can fail.
///
/// A `Reader` is a small `Copy` value; copying one is the supported way
/// to look ahead without consuming fields.
#[derive(Clone, Copy, Debug)]
pub struct Reader<'a> {
    /// The window from the cursor to the end of the message.
    data: &'a [u8],
    /// The wire type of the current field.
    wire_type: WireType,
    /// The tag of the current field, or 0 if there is none.
    tag: u32,
}

impl Default for Reader<'_> {
    /// A default reader behaves like one over an empty buffer.
    fn default() -> Self {
        Reader::new(&[])
    }
}

impl<'a> Reader<'a> {
    /// Creates a reader over the borrowed buffer. The buffer must
    /// contain a complete protobuf message. No data is copied; the
    /// buffer must outlive the reader and everything derived from it.
    ///
    /// Afterwards there is no current field.
    pub fn new(data: &'a [u8]) -> Self {
        Reader {
            data,
            wire_type: WireType::Unknown,
            tag: 0,
        }
    }

    /// The number of bytes between the cursor and the end of the
    /// message. Fields that were already read or skipped are not
    /// counted.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` once every field has been consumed.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The tag (field number) of the current field.
    ///
    /// Call [`next`](Reader::next) before calling this.
    pub fn tag(&self) -> u32 {
        debug_assert!(self.tag != 0, "call next() before accessing the current field");
        self.tag
    }

    /// The wire type of the current field.
    ///
    /// Call [`next`](Reader::next) before calling this.
    pub fn wire_type(&self) -> WireType {
        debug_assert!(self.tag != 0, "call next() before accessing the current field");
        self.wire_type
    }

    /// Checks the wire type of the current field.
    pub fn has_wire_type(&self, wire_type: WireType) -> bool {
        self.wire_type() == wire_type
    }

    fn clear_field(&mut self) {
        self.tag = 0;
        self.wire_type = WireType::Unknown;
    }

    /// Makes the next field in the message the current field.
    ///
    /// Returns `false` when the end of the buffer has been reached.
    /// Fails with [`Error::UnknownWireType`] if the decoded wire type is
    /// not one of varint, fixed64, length-delimited or fixed32, and with
    /// [`Error::EndOfBuffer`] if the tag itself is truncated. On failure
    /// the reader is unchanged.
    pub fn next(&mut self) -> Result<bool> {
        if self.data.is_empty() {
            return Ok(false);
        }

        let mut data = self.data;
        let key = varint::decode(&mut data)?;
        let tag = (key >> 3) as u32;
        debug_assert!(tag >= 1 && tag <= TAG_MAX, "tag out of range");
        let wire_type =
            WireType::try_from((key & 0x07) as u8).map_err(|_| Error::UnknownWireType)?;

        self.data = data;
        self.tag = tag;
        self.wire_type = wire_type;
        Ok(true)
    }

    /// Makes the next field with the given tag the current field,
    /// skipping over every field with a different tag. Returns `false`
    /// if no such field is left.
    ///
    /// This is usually called in a loop over a repeated field, or once
    /// to find the single field of interest:
    ///
    /// ```
    /// use pbwire::Reader;
    ///
    /// let data = [0x08, 0x01, 0x10, 0x02, 0x10, 0x03];
    /// let mut reader = Reader::new(&data);
    /// let mut values = Vec::new();
    /// while reader.next_field(2)? {
    ///     values.push(reader.get_uint32()?);
    /// }
    /// assert_eq!(values, [2, 3]);
    /// # Ok::<(), pbwire::Error>(())
    /// ```
    pub fn next_field(&mut self, tag: u32) -> Result<bool> {
        while self.next()? {
            if self.tag == tag {
                return Ok(true);
            }
            self.skip()?;
        }
        Ok(false)
    }

    /// Consumes the current field's payload according to its wire type.
    ///
    /// Afterwards there is no current field. On failure the reader is
    /// unchanged.
    pub fn skip(&mut self) -> Result<()> {
        debug_assert!(self.tag != 0, "call next() before calling skip()");
        let mut data = self.data;
        match self.wire_type {
            WireType::Varint => {
                varint::decode(&mut data)?;
            }
            WireType::Fixed64 => {
                if data.len() < 8 {
                    return Err(Error::EndOfBuffer);
                }
                data = &data[8..];
            }
            WireType::LengthDelimited => {
                let len = varint::decode(&mut data)?;
                if (data.len() as u64) < len {
                    return Err(Error::EndOfBuffer);
                }
                data = &data[len as usize..];
            }
            WireType::Fixed32 => {
                if data.len() < 4 {
                    return Err(Error::EndOfBuffer);
                }
                data = &data[4..];
            }
            WireType::Unknown => {
                debug_assert!(false, "no current field to skip");
            }
        }
        self.data = data;
        self.clear_field();
        Ok(())
    }

    /// Consumes and returns the value of the current field in the
    /// representation chosen by `V`.
    ///
    /// The current field's wire type must match `V::WIRE_TYPE`. The
    /// per-type accessors below are thin wrappers over this.
    pub fn get<V: Value>(&mut self) -> Result<V::Inner> {
        debug_assert!(self.tag != 0, "call next() before accessing the field value");
        debug_assert!(
            self.wire_type == V::WIRE_TYPE,
            "wire type does not match the requested value kind"
        );
        let mut data = self.data;
        let value = V::decode(&mut data)?;
        self.data = data;
        self.clear_field();
        Ok(V::unwrap(value))
    }

    /// Consumes and returns the value of the current `bool` field.
    pub fn get_bool(&mut self) -> Result<bool> {
        self.get::<raw::Bool>()
    }

    /// Consumes and returns the value of the current `enum` field.
    pub fn get_enum(&mut self) -> Result<i32> {
        self.get::<raw::Enum>()
    }

    /// Consumes and returns the value of the current `int32` field.
    pub fn get_int32(&mut self) -> Result<i32> {
        self.get::<raw::Int32>()
    }

    /// Consumes and returns the value of the current `sint32` field.
    pub fn get_sint32(&mut self) -> Result<i32> {
        self.get::<raw::Sint32>()
    }

    /// Consumes and returns the value of the current `uint32` field.
    pub fn get_uint32(&mut self) -> Result<u32> {
        self.get::<raw::Uint32>()
    }

    /// Consumes and returns the value of the current `int64` field.
    pub fn get_int64(&mut self) -> Result<i64> {
        self.get::<raw::Int64>()
    }

    /// Consumes and returns the value of the current `sint64` field.
    pub fn get_sint64(&mut self) -> Result<i64> {
        self.get::<raw::Sint64>()
    }

    /// Consumes and returns the value of the current `uint64` field.
    pub fn get_uint64(&mut self) -> Result<u64> {
        self.get::<raw::Uint64>()
    }

    /// Consumes and returns the value of the current `fixed32` field.
    pub fn get_fixed32(&mut self) -> Result<u32> {
        self.get::<raw::Fixed32>()
    }

    /// Consumes and returns the value of the current `sfixed32` field.
    pub fn get_sfixed32(&mut self) -> Result<i32> {
        self.get::<raw::Sfixed32>()
    }

    /// Consumes and returns the value of the current `fixed64` field.
    pub fn get_fixed64(&mut self) -> Result<u64> {
        self.get::<raw::Fixed64>()
    }

    /// Consumes and returns the value of the current `sfixed64` field.
    pub fn get_sfixed64(&mut self) -> Result<i64> {
        self.get::<raw::Sfixed64>()
    }

    /// Consumes and returns the value of the current `float` field.
    pub fn get_float(&mut self) -> Result<f32> {
        self.get::<raw::Float>()
    }

    /// Consumes and returns the value of the current `double` field.
    pub fn get_double(&mut self) -> Result<f64> {
        self.get::<raw::Double>()
    }

    /// Consumes the current `bytes`, `string` or `message` field and
    /// returns its payload as a view into the input buffer. Nothing is
    /// copied; the view stays valid for as long as the input buffer.
    pub fn get_view(&mut self) -> Result<&'a [u8]> {
        debug_assert!(self.tag != 0, "call next() before accessing the field value");
        debug_assert!(
            self.wire_type == WireType::LengthDelimited,
            "wire type does not match the requested value kind"
        );
        let mut data = self.data;
        let len = varint::decode(&mut data)?;
        if (data.len() as u64) < len {
            return Err(Error::EndOfBuffer);
        }
        let (view, rest) = data.split_at(len as usize);
        self.data = rest;
        self.clear_field();
        Ok(view)
    }

    /// Consumes the current `bytes` field, returning a borrowed view.
    pub fn get_bytes(&mut self) -> Result<&'a [u8]> {
        self.get_view()
    }

    /// Consumes the current `string` field, returning a borrowed view.
    ///
    /// The bytes are returned exactly as they appear on the wire; no
    /// UTF-8 validation is performed.
    pub fn get_string(&mut self) -> Result<&'a [u8]> {
        self.get_view()
    }

    /// Consumes the current `bytes` or `string` field and copies its
    /// payload into a new owned byte string.
    ///
    /// This is the only accessor without the strong guarantee: the
    /// cursor has already moved when the allocation happens. Use
    /// [`get_view`](Reader::get_view) if you need the guarantee.
    pub fn get_bytes_owned<B: ByteString>(&mut self) -> Result<B> {
        let view = self.get_view()?;
        let mut owned = B::new(view.len());
        owned.as_mut().copy_from_slice(view);
        Ok(owned)
    }

    /// Consumes the current `message` field and returns a reader over
    /// its payload without copying.
    pub fn get_message(&mut self) -> Result<Reader<'a>> {
        self.get_view().map(Reader::new)
    }

    /// Consumes the current packed repeated field and returns a lazy
    /// iterator over its elements decoded as `V`.
    ///
    /// The returned range holds its own view of the payload, so it stays
    /// usable however the reader moves on afterwards.
    pub fn get_packed<V: Value>(&mut self) -> Result<PackedIter<'a, V>> {
        self.get_view().map(PackedIter::new)
    }

    /// Consumes the current packed `bool` field.
    pub fn get_packed_bool(&mut self) -> Result<PackedIter<'a, raw::Bool>> {
        self.get_packed()
    }

    /// Consumes the current packed `enum` field.
    pub fn get_packed_enum(&mut self) -> Result<PackedIter<'a, raw::Enum>> {
        self.get_packed()
    }

    /// Consumes the current packed `int32` field.
    pub fn get_packed_int32(&mut self) -> Result<PackedIter<'a, raw::Int32>> {
        self.get_packed()
    }

    /// Consumes the current packed `sint32` field.
    pub fn get_packed_sint32(&mut self) -> Result<PackedIter<'a, raw::Sint32>> {
        self.get_packed()
    }

    /// Consumes the current packed `uint32` field.
    pub fn get_packed_uint32(&mut self) -> Result<PackedIter<'a, raw::Uint32>> {
        self.get_packed()
    }

    /// Consumes the current packed `int64` field.
    pub fn get_packed_int64(&mut self) -> Result<PackedIter<'a, raw::Int64>> {
        self.get_packed()
    }

    /// Consumes the current packed `sint64` field.
    pub fn get_packed_sint64(&mut self) -> Result<PackedIter<'a, raw::Sint64>> {
        self.get_packed()
    }

    /// Consumes the current packed `uint64` field.
    pub fn get_packed_uint64(&mut self) -> Result<PackedIter<'a, raw::Uint64>> {
        self.get_packed()
    }

    /// Consumes the current packed `fixed32` field.
    pub fn get_packed_fixed32(&mut self) -> Result<PackedIter<'a, raw::Fixed32>> {
        self.get_packed()
    }

    /// Consumes the current packed `sfixed32` field.
    pub fn get_packed_sfixed32(&mut self) -> Result<PackedIter<'a, raw::Sfixed32>> {
        self.get_packed()
    }

    /// Consumes the current packed `fixed64` field.
    pub fn get_packed_fixed64(&mut self) -> Result<PackedIter<'a, raw::Fixed64>> {
        self.get_packed()
    }

    /// Consumes the current packed `sfixed64` field.
    pub fn get_packed_sfixed64(&mut self) -> Result<PackedIter<'a, raw::Sfixed64>> {
        self.get_packed()
    }

    /// Consumes the current packed `float` field.
    pub fn get_packed_float(&mut self) -> Result<PackedIter<'a, raw::Float>> {
        self.get_packed()
    }

    /// Consumes the current packed `double` field.
    pub fn get_packed_double(&mut self) -> Result<PackedIter<'a, raw::Double>> {
        self.get_packed()
    }
}

#[cfg(test)]
mod test {
    use super::Reader;
    use crate::io::{Error, WireType};
    use assert_matches::assert_matches;

    #[test]
    fn empty_buffer_has_no_fields() {
        let mut reader = Reader::new(&[]);
        assert!(!reader.next().unwrap());
        assert_eq!(reader.len(), 0);
        assert!(reader.is_empty());
    }

    #[test]
    fn varint_field() {
        // uint32 tag=1 value=150
        let data = [0x08, 0x96, 0x01];
        let mut reader = Reader::new(&data);

        assert!(reader.next().unwrap());
        assert_eq!(reader.tag(), 1);
        assert_eq!(reader.wire_type(), WireType::Varint);
        assert!(reader.has_wire_type(WireType::Varint));
        assert_eq!(reader.get_uint32().unwrap(), 150);
        assert!(!reader.next().unwrap());
    }

    #[test]
    fn zigzag_field() {
        // sint32 tag=1 value=-1
        let data = [0x08, 0x01];
        let mut reader = Reader::new(&data);

        assert!(reader.next().unwrap());
        assert_eq!(reader.get_sint32().unwrap(), -1);
    }

    #[test]
    fn string_field() {
        // string tag=1 value="testing"
        let data = [0x0A, 0x07, 0x74, 0x65, 0x73, 0x74, 0x69, 0x6E, 0x67];
        let mut reader = Reader::new(&data);

        assert!(reader.next().unwrap());
        assert_eq!(reader.wire_type(), WireType::LengthDelimited);
        let view = reader.get_string().unwrap();
        assert_eq!(view, b"testing");
        assert!(!reader.next().unwrap());
    }

    #[test]
    fn owned_bytes_field() {
        let data = [0x0A, 0x03, 0x61, 0x62, 0x63];
        let mut reader = Reader::new(&data);

        assert!(reader.next().unwrap());
        let owned: Vec<u8> = reader.get_bytes_owned().unwrap();
        assert_eq!(owned, b"abc");
    }

    #[test]
    fn unknown_wire_type_rejected() {
        for wire_type in [3u8, 4, 6, 7] {
            let data = [0x08 | wire_type, 0x00];
            let mut reader = Reader::new(&data);
            assert_matches!(reader.next(), Err(Error::UnknownWireType));
            // strong guarantee: the cursor did not move
            assert_eq!(reader.len(), data.len());
        }
    }

    #[test]
    fn skip_every_wire_type() {
        let data = [
            0x08, 0x96, 0x01, // varint
            0x11, 1, 2, 3, 4, 5, 6, 7, 8, // fixed64
            0x1A, 0x02, 0xAA, 0xBB, // length-delimited
            0x25, 1, 2, 3, 4, // fixed32
        ];
        let mut reader = Reader::new(&data);
        let mut tags = Vec::new();
        while reader.next().unwrap() {
            tags.push(reader.tag());
            reader.skip().unwrap();
        }
        assert_eq!(tags, [1, 2, 3, 4]);
        assert!(reader.is_empty());
    }

    #[test]
    fn next_field_skips_other_tags() {
        let data = [0x08, 0x01, 0x10, 0x02, 0x08, 0x03];
        let mut reader = Reader::new(&data);

        assert!(reader.next_field(2).unwrap());
        assert_eq!(reader.get_uint32().unwrap(), 2);
        assert!(!reader.next_field(2).unwrap());
    }

    #[test]
    fn copies_are_independent() {
        let data = [0x08, 0x01, 0x10, 0x02];
        let mut reader = Reader::new(&data);

        let mut lookahead = reader;
        assert!(lookahead.next().unwrap());
        assert_eq!(lookahead.get_uint32().unwrap(), 1);
        assert!(lookahead.next().unwrap());
        assert_eq!(lookahead.get_uint32().unwrap(), 2);

        // the original still sits at the first field
        assert!(reader.next().unwrap());
        assert_eq!(reader.tag(), 1);
        assert_eq!(reader.get_uint32().unwrap(), 1);
    }

    #[test]
    fn submessage_view_is_independent() {
        // message tag=5 { string tag=1 "foobar" } followed by uint32 tag=4
        let data = [
            0x2A, 0x08, 0x0A, 0x06, 0x66, 0x6F, 0x6F, 0x62, 0x61, 0x72, 0x20, 0x07,
        ];
        let mut reader = Reader::new(&data);

        assert!(reader.next().unwrap());
        let mut sub = reader.get_message().unwrap();

        assert!(reader.next().unwrap());
        assert_eq!(reader.get_uint32().unwrap(), 7);

        assert!(sub.next().unwrap());
        assert_eq!(sub.get_string().unwrap(), b"foobar");
        assert!(!sub.next().unwrap());
    }

    // every proper prefix of a valid record must fail with EndOfBuffer
    // and leave the reader untouched
    fn assert_truncation_fails(data: &[u8], get: impl Fn(&mut Reader) -> Result<(), Error>) {
        for i in 1..data.len() {
            let mut reader = Reader::new(&data[..i]);
            match reader.next() {
                Ok(true) => {
                    let remaining = reader.len();
                    let tag = reader.tag();
                    let wire_type = reader.wire_type();
                    assert_matches!(get(&mut reader), Err(Error::EndOfBuffer));
                    assert_eq!(reader.len(), remaining);
                    assert_eq!(reader.tag(), tag);
                    assert_eq!(reader.wire_type(), wire_type);
                }
                Ok(false) => panic!("truncated record decoded as empty message"),
                Err(e) => assert_eq!(e, Error::EndOfBuffer),
            }
        }
    }

    #[test]
    fn truncation_varint() {
        assert_truncation_fails(&[0x08, 0x96, 0x01], |r| r.get_uint32().map(drop));
    }

    #[test]
    fn truncation_fixed() {
        assert_truncation_fails(&[0x0D, 0x4E, 0x61, 0xBC, 0x00], |r| r.get_fixed32().map(drop));
        assert_truncation_fails(
            &[0x11, 1, 2, 3, 4, 5, 6, 7, 8],
            |r| r.get_fixed64().map(drop),
        );
    }

    #[test]
    fn truncation_length_delimited() {
        assert_truncation_fails(
            &[0x0A, 0x07, 0x74, 0x65, 0x73, 0x74, 0x69, 0x6E, 0x67],
            |r| r.get_view().map(drop),
        );
    }

    #[test]
    fn truncation_skip() {
        assert_truncation_fails(&[0x0A, 0x03, 1, 2, 3], |r| r.skip());
        assert_truncation_fails(&[0x25, 1, 2, 3, 4], |r| r.skip());
    }

    // reading the same buffer shifted by one byte must produce the same
    // values; this would catch alignment assumptions in the fixed codec
    #[test]
    fn alignment_invariance() {
        let data = [
            0x0D, 0x4E, 0x61, 0xBC, 0x00, // fixed32 tag=1 value=12345678
            0x11, 0x88, 0x77, 0x66, 0x55, 0x44, 0x33, 0x22, 0x11, // fixed64 tag=2
            0x1D, 0x00, 0x00, 0xC0, 0x3F, // float tag=3 value=1.5
        ];
        let mut shifted = vec![0u8];
        shifted.extend_from_slice(&data);

        for reader in [Reader::new(&data), Reader::new(&shifted[1..])] {
            let mut reader = reader;
            assert!(reader.next().unwrap());
            assert_eq!(reader.get_fixed32().unwrap(), 12345678);
            assert!(reader.next().unwrap());
            assert_eq!(reader.get_fixed64().unwrap(), 0x1122334455667788);
            assert!(reader.next().unwrap());
            assert_eq!(reader.get_float().unwrap(), 1.5);
            assert!(!reader.next().unwrap());
        }
    }

    #[test]
    fn reserved_tags_are_readable() {
        // tag 19000 is reserved for emission but passes through on the
        // way in: (19000 << 3) | 0 == 152000 == varint C0 A3 09
        let data = [0xC0, 0xA3, 0x09, 0x2A];
        let mut reader = Reader::new(&data);
        assert!(reader.next().unwrap());
        assert_eq!(reader.tag(), 19000);
        assert_eq!(reader.get_uint32().unwrap(), 42);
    }
}
