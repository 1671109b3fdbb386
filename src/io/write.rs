//! Defines the [`Writer`], an append-only emitter of protobuf encoded
//! fields into a caller-owned byte buffer, and the packed-field
//! emitters built on top of it.

use core::marker::PhantomData;
use core::ops::{Deref, DerefMut};
use crate::buffer::BufferTarget;
use crate::io::{tag_is_valid, WireType};
use crate::raw::{self, ConstSized, Value};
use crate::varint;

/// The number of bytes reserved for the varint holding the length of a
/// length-delimited field whose size is not known up front. The length
/// fits in 32 bits, and a varint needs 8 bits for every 7 bits of
/// payload.
const RESERVE_BYTES: usize = 32 / 7 + 1;

/// A writer that appends protobuf encoded fields to a byte buffer.
///
/// The buffer is borrowed for the lifetime of the writer and does not
/// have to be empty; new fields are appended after whatever it already
/// holds. Any [`BufferTarget`] works; `Vec<u8>` is the default.
///
/// ```
/// use pbwire::Writer;
///
/// let mut buffer = Vec::new();
/// let mut writer = Writer::new(&mut buffer);
/// writer.add_string(1, "testing");
/// assert_eq!(buffer, b"\x0A\x07testing");
/// ```
///
/// # Submessages
///
/// [`submessage`](Writer::submessage) returns a [`SubWriter`] that
/// appends to the same buffer. While it is alive the parent is mutably
/// borrowed, so the compiler rejects any attempt to write through the
/// parent until the submessage is finished. When the `SubWriter` goes
/// out of scope its length prefix is patched into the bytes reserved at
/// open; one that wrote nothing removes all trace of itself.
///
/// ```
/// use pbwire::Writer;
///
/// let mut buffer = Vec::new();
/// let mut writer = Writer::new(&mut buffer);
/// writer.add_fixed32(1, 42);
/// {
///     let mut sub = writer.submessage(5);
///     sub.add_string(1, "foobar");
/// }
/// writer.add_uint32(4, 22);
/// ```
///
/// # Failure modes
///
/// Writing cannot fail with a recoverable error; every misuse (tag out
/// of range, rolling back a known-length submessage, closing a
/// known-length submessage at the wrong length) is a programmer error
/// checked with debug assertions.
pub struct Writer<'a, B: BufferTarget = Vec<u8>> {
    data: &'a mut B,
}

impl<'a, B: BufferTarget> Writer<'a, B> {
    /// Creates a writer appending to the given buffer.
    pub fn new(data: &'a mut B) -> Self {
        Writer { data }
    }

    /// Reserves space for at least `additional` more bytes in the
    /// underlying buffer, on top of whatever it already holds.
    pub fn reserve(&mut self, additional: usize) {
        self.data.reserve_additional(additional);
    }

    fn add_tag(&mut self, tag: u32, wire_type: WireType) {
        debug_assert!(tag_is_valid(tag), "tag out of range");
        varint::write(self.data, u64::from((tag << 3) | wire_type as u32));
    }

    fn add_length_prefixed(&mut self, tag: u32, payload: &[u8]) {
        self.add_tag(tag, WireType::LengthDelimited);
        varint::write(self.data, payload.len() as u64);
        self.data.append(payload);
    }

    /// Appends a payload without a tag. Used for packed elements.
    fn push_value<V: Value>(&mut self, value: V::Inner) {
        V::wrap(value).encode(self.data);
    }

    /// Appends a field holding `value` in the representation chosen by
    /// `V`. The per-type methods below are thin wrappers over this.
    pub fn add<V: Value>(&mut self, tag: u32, value: V::Inner) {
        self.add_tag(tag, V::WIRE_TYPE);
        V::wrap(value).encode(self.data);
    }

    /// Appends a `bool` field.
    pub fn add_bool(&mut self, tag: u32, value: bool) {
        self.add::<raw::Bool>(tag, value);
    }

    /// Appends an `enum` field.
    pub fn add_enum(&mut self, tag: u32, value: i32) {
        self.add::<raw::Enum>(tag, value);
    }

    /// Appends an `int32` field.
    pub fn add_int32(&mut self, tag: u32, value: i32) {
        self.add::<raw::Int32>(tag, value);
    }

    /// Appends a `sint32` field.
    pub fn add_sint32(&mut self, tag: u32, value: i32) {
        self.add::<raw::Sint32>(tag, value);
    }

    /// Appends a `uint32` field.
    pub fn add_uint32(&mut self, tag: u32, value: u32) {
        self.add::<raw::Uint32>(tag, value);
    }

    /// Appends an `int64` field.
    pub fn add_int64(&mut self, tag: u32, value: i64) {
        self.add::<raw::Int64>(tag, value);
    }

    /// Appends a `sint64` field.
    pub fn add_sint64(&mut self, tag: u32, value: i64) {
        self.add::<raw::Sint64>(tag, value);
    }

    /// Appends a `uint64` field.
    pub fn add_uint64(&mut self, tag: u32, value: u64) {
        self.add::<raw::Uint64>(tag, value);
    }

    /// Appends a `fixed32` field.
    pub fn add_fixed32(&mut self, tag: u32, value: u32) {
        self.add::<raw::Fixed32>(tag, value);
    }

    /// Appends an `sfixed32` field.
    pub fn add_sfixed32(&mut self, tag: u32, value: i32) {
        self.add::<raw::Sfixed32>(tag, value);
    }

    /// Appends a `fixed64` field.
    pub fn add_fixed64(&mut self, tag: u32, value: u64) {
        self.add::<raw::Fixed64>(tag, value);
    }

    /// Appends an `sfixed64` field.
    pub fn add_sfixed64(&mut self, tag: u32, value: i64) {
        self.add::<raw::Sfixed64>(tag, value);
    }

    /// Appends a `float` field.
    pub fn add_float(&mut self, tag: u32, value: f32) {
        self.add::<raw::Float>(tag, value);
    }

    /// Appends a `double` field.
    pub fn add_double(&mut self, tag: u32, value: f64) {
        self.add::<raw::Double>(tag, value);
    }

    /// Appends a `bytes` field.
    pub fn add_bytes(&mut self, tag: u32, value: &[u8]) {
        self.add_length_prefixed(tag, value);
    }

    /// Appends a `string` field.
    pub fn add_string(&mut self, tag: u32, value: &str) {
        self.add_length_prefixed(tag, value.as_bytes());
    }

    /// Appends a `message` field whose payload is already encoded.
    pub fn add_message(&mut self, tag: u32, value: &[u8]) {
        self.add_length_prefixed(tag, value);
    }

    /// Opens a submessage of unknown size and returns a writer for it.
    ///
    /// The returned writer appends to the same buffer; the parent is
    /// borrowed until it goes out of scope. On close the submessage
    /// length is written into the bytes reserved here and the unused
    /// part of the reservation is erased. A submessage that never
    /// received any bytes rolls back completely, leaving the buffer as
    /// it was before this call.
    pub fn submessage(&mut self, tag: u32) -> SubWriter<'_, B> {
        let rollback_pos = self.data.len();
        self.add_tag(tag, WireType::LengthDelimited);
        self.data.append_zeros(RESERVE_BYTES);
        let data_pos = self.data.len();
        SubWriter {
            inner: Writer { data: &mut *self.data },
            close: Close::Unsized {
                rollback_pos,
                data_pos,
            },
        }
    }

    /// Opens a submessage whose payload length is already known and
    /// returns a writer for it. The exact length prefix is written up
    /// front, so nothing has to be patched on close.
    ///
    /// The caller must write exactly `len` bytes through the returned
    /// writer; closing it at any other length is a programmer error.
    /// [`SubWriter::rollback`] is not available on this path.
    pub fn submessage_with_len(&mut self, tag: u32, len: usize) -> SubWriter<'_, B> {
        self.add_tag(tag, WireType::LengthDelimited);
        varint::write(self.data, len as u64);
        self.data.reserve_additional(len);
        let data_pos = self.data.len();
        SubWriter {
            inner: Writer { data: &mut *self.data },
            close: Close::Sized { data_pos, len },
        }
    }

    /// Appends a packed repeated field through a nested length prefix.
    ///
    /// This is the generic path: the payload length is discovered by
    /// writing the elements and patching the prefix afterwards, so it
    /// works for any element kind and any iterator. An empty iterator
    /// writes nothing at all.
    pub fn add_packed<V, I>(&mut self, tag: u32, values: I)
    where
        V: Value,
        I: IntoIterator<Item = V::Inner>,
    {
        let mut values = values.into_iter().peekable();
        if values.peek().is_none() {
            return;
        }
        let mut sub = self.submessage(tag);
        for value in values {
            sub.push_value::<V>(value);
        }
    }

    /// Appends a packed repeated field of fixed-width elements with the
    /// exact length prefix computed from the element count.
    ///
    /// This avoids the reservation dance of [`add_packed`] but needs an
    /// iterator whose length is known up front. An empty iterator
    /// writes nothing at all.
    ///
    /// [`add_packed`]: Writer::add_packed
    pub fn add_packed_exact<V, I>(&mut self, tag: u32, values: I)
    where
        V: ConstSized,
        I: IntoIterator<Item = V::Inner>,
        I::IntoIter: ExactSizeIterator,
    {
        let values = values.into_iter();
        let count = values.len();
        if count == 0 {
            return;
        }
        self.add_tag(tag, WireType::LengthDelimited);
        varint::write(self.data, (count * V::SIZE) as u64);
        self.data.reserve_additional(count * V::SIZE);
        for value in values {
            self.push_value::<V>(value);
        }
    }

    /// Appends a packed `bool` field.
    pub fn add_packed_bool<I: IntoIterator<Item = bool>>(&mut self, tag: u32, values: I) {
        self.add_packed::<raw::Bool, I>(tag, values);
    }

    /// Appends a packed `enum` field.
    pub fn add_packed_enum<I: IntoIterator<Item = i32>>(&mut self, tag: u32, values: I) {
        self.add_packed::<raw::Enum, I>(tag, values);
    }

    /// Appends a packed `int32` field.
    pub fn add_packed_int32<I: IntoIterator<Item = i32>>(&mut self, tag: u32, values: I) {
        self.add_packed::<raw::Int32, I>(tag, values);
    }

    /// Appends a packed `sint32` field.
    pub fn add_packed_sint32<I: IntoIterator<Item = i32>>(&mut self, tag: u32, values: I) {
        self.add_packed::<raw::Sint32, I>(tag, values);
    }

    /// Appends a packed `uint32` field.
    pub fn add_packed_uint32<I: IntoIterator<Item = u32>>(&mut self, tag: u32, values: I) {
        self.add_packed::<raw::Uint32, I>(tag, values);
    }

    /// Appends a packed `int64` field.
    pub fn add_packed_int64<I: IntoIterator<Item = i64>>(&mut self, tag: u32, values: I) {
        self.add_packed::<raw::Int64, I>(tag, values);
    }

    /// Appends a packed `sint64` field.
    pub fn add_packed_sint64<I: IntoIterator<Item = i64>>(&mut self, tag: u32, values: I) {
        self.add_packed::<raw::Sint64, I>(tag, values);
    }

    /// Appends a packed `uint64` field.
    pub fn add_packed_uint64<I: IntoIterator<Item = u64>>(&mut self, tag: u32, values: I) {
        self.add_packed::<raw::Uint64, I>(tag, values);
    }

    /// Appends a packed `fixed32` field with an exact length prefix.
    pub fn add_packed_fixed32<I>(&mut self, tag: u32, values: I)
    where
        I: IntoIterator<Item = u32>,
        I::IntoIter: ExactSizeIterator,
    {
        self.add_packed_exact::<raw::Fixed32, I>(tag, values);
    }

    /// Appends a packed `sfixed32` field with an exact length prefix.
    pub fn add_packed_sfixed32<I>(&mut self, tag: u32, values: I)
    where
        I: IntoIterator<Item = i32>,
        I::IntoIter: ExactSizeIterator,
    {
        self.add_packed_exact::<raw::Sfixed32, I>(tag, values);
    }

    /// Appends a packed `fixed64` field with an exact length prefix.
    pub fn add_packed_fixed64<I>(&mut self, tag: u32, values: I)
    where
        I: IntoIterator<Item = u64>,
        I::IntoIter: ExactSizeIterator,
    {
        self.add_packed_exact::<raw::Fixed64, I>(tag, values);
    }

    /// Appends a packed `sfixed64` field with an exact length prefix.
    pub fn add_packed_sfixed64<I>(&mut self, tag: u32, values: I)
    where
        I: IntoIterator<Item = i64>,
        I::IntoIter: ExactSizeIterator,
    {
        self.add_packed_exact::<raw::Sfixed64, I>(tag, values);
    }

    /// Appends a packed `float` field with an exact length prefix.
    pub fn add_packed_float<I>(&mut self, tag: u32, values: I)
    where
        I: IntoIterator<Item = f32>,
        I::IntoIter: ExactSizeIterator,
    {
        self.add_packed_exact::<raw::Float, I>(tag, values);
    }

    /// Appends a packed `double` field with an exact length prefix.
    pub fn add_packed_double<I>(&mut self, tag: u32, values: I)
    where
        I: IntoIterator<Item = f64>,
        I::IntoIter: ExactSizeIterator,
    {
        self.add_packed_exact::<raw::Double, I>(tag, values);
    }
}

/// How a submessage writer reconciles its length prefix on close.
enum Close {
    /// Opened without a known size: `rollback_pos` is where the tag
    /// header starts, `data_pos` is where the payload starts,
    /// `RESERVE_BYTES` past the header.
    Unsized { rollback_pos: usize, data_pos: usize },
    /// The exact length was written up front; the caller promised to
    /// emit exactly `len` bytes after `data_pos`.
    Sized { data_pos: usize, len: usize },
    /// Already rolled back; the writer is inert.
    Done,
}

/// A writer for one submessage, created with [`Writer::submessage`] or
/// [`Writer::submessage_with_len`].
///
/// It dereferences to [`Writer`], so every `add_*` method is available
/// on it, including [`submessage`](Writer::submessage) for deeper
/// nesting. Going out of scope closes the submessage: the length prefix
/// is reconciled, or the whole record is removed again if nothing was
/// written.
pub struct SubWriter<'a, B: BufferTarget = Vec<u8>> {
    inner: Writer<'a, B>,
    close: Close,
}

impl<'a, B: BufferTarget> Deref for SubWriter<'a, B> {
    type Target = Writer<'a, B>;

    fn deref(&self) -> &Writer<'a, B> {
        &self.inner
    }
}

impl<'a, B: BufferTarget> DerefMut for SubWriter<'a, B> {
    fn deref_mut(&mut self) -> &mut Writer<'a, B> {
        &mut self.inner
    }
}

impl<B: BufferTarget> SubWriter<'_, B> {
    /// Discards this submessage, restoring the buffer to the state it
    /// had before the submessage was opened, and renders the writer
    /// inert.
    ///
    /// Only submessages opened with [`Writer::submessage`] can be
    /// rolled back; calling this on the known-length path is a
    /// programmer error.
    pub fn rollback(mut self) {
        match self.close {
            Close::Unsized { rollback_pos, .. } => {
                let end = self.inner.data.len();
                self.inner.data.erase_range(rollback_pos, end);
                self.close = Close::Done;
            }
            Close::Sized { .. } => {
                debug_assert!(false, "rollback on a submessage with a known length");
            }
            Close::Done => {}
        }
    }
}

impl<B: BufferTarget> Drop for SubWriter<'_, B> {
    fn drop(&mut self) {
        match self.close {
            Close::Done => {}
            Close::Unsized {
                rollback_pos,
                data_pos,
            } => {
                if self.inner.data.len() == data_pos {
                    // nothing was written, remove the tag and reservation
                    self.inner.data.erase_range(rollback_pos, data_pos);
                } else {
                    let length = (self.inner.data.len() - data_pos) as u64;
                    debug_assert!(length <= u64::from(u32::MAX), "submessage too large");
                    let prefix =
                        &mut self.inner.data.tail_mut(data_pos - RESERVE_BYTES)[..RESERVE_BYTES];
                    let n = varint::write_to_slice(prefix, length);
                    self.inner
                        .data
                        .erase_range(data_pos - RESERVE_BYTES + n, data_pos);
                }
            }
            Close::Sized { data_pos, len } => {
                debug_assert!(
                    self.inner.data.len() - data_pos == len,
                    "submessage does not match its promised length"
                );
            }
        }
    }
}

/// An incremental emitter for one packed repeated field.
///
/// Where the `add_packed_*` writer methods take a whole iterator, a
/// `PackedField` lets elements be pushed one at a time. It opens the
/// length-delimited record on creation and patches the length when it
/// goes out of scope. Dropping an emitter that never received an
/// element leaves the buffer bit-identical to its state before the
/// emitter was created.
///
/// ```
/// use pbwire::{PackedField, Writer};
/// use pbwire::raw::Uint32;
///
/// let mut buffer = Vec::new();
/// let mut writer = Writer::new(&mut buffer);
/// {
///     let mut field = PackedField::<_, Uint32>::new(&mut writer, 4);
///     for value in [22u32, 44, 66] {
///         field.push(value);
///     }
/// }
/// assert_eq!(buffer, [0x22, 0x03, 0x16, 0x2C, 0x42]);
/// ```
pub struct PackedField<'a, B: BufferTarget, V: Value> {
    writer: SubWriter<'a, B>,
    _marker: PhantomData<V>,
}

impl<'a, B: BufferTarget, V: Value> PackedField<'a, B, V> {
    /// Opens a packed field with the given tag on the parent writer.
    /// The parent stays borrowed until the emitter goes out of scope.
    pub fn new(parent: &'a mut Writer<'_, B>, tag: u32) -> Self {
        PackedField {
            writer: parent.submessage(tag),
            _marker: PhantomData,
        }
    }

    /// Appends one element to the packed payload.
    pub fn push(&mut self, value: V::Inner) {
        self.writer.push_value::<V>(value);
    }

    /// Discards the packed field, restoring the buffer to the state it
    /// had before the emitter was created.
    pub fn rollback(self) {
        self.writer.rollback();
    }
}

impl<'a, B: BufferTarget, V: ConstSized> PackedField<'a, B, V> {
    /// Opens a packed field of fixed-width elements whose count is
    /// known up front, writing the exact length prefix immediately.
    ///
    /// Exactly `count` elements must be pushed; closing the emitter at
    /// any other count is a programmer error, and rollback is not
    /// available on this path.
    pub fn with_len(parent: &'a mut Writer<'_, B>, tag: u32, count: usize) -> Self {
        PackedField {
            writer: parent.submessage_with_len(tag, count * V::SIZE),
            _marker: PhantomData,
        }
    }
}

/// An emitter for one packed `bool` field.
pub type PackedFieldBool<'a, B> = PackedField<'a, B, raw::Bool>;
/// An emitter for one packed `enum` field.
pub type PackedFieldEnum<'a, B> = PackedField<'a, B, raw::Enum>;
/// An emitter for one packed `int32` field.
pub type PackedFieldInt32<'a, B> = PackedField<'a, B, raw::Int32>;
/// An emitter for one packed `sint32` field.
pub type PackedFieldSint32<'a, B> = PackedField<'a, B, raw::Sint32>;
/// An emitter for one packed `uint32` field.
pub type PackedFieldUint32<'a, B> = PackedField<'a, B, raw::Uint32>;
/// An emitter for one packed `int64` field.
pub type PackedFieldInt64<'a, B> = PackedField<'a, B, raw::Int64>;
/// An emitter for one packed `sint64` field.
pub type PackedFieldSint64<'a, B> = PackedField<'a, B, raw::Sint64>;
/// An emitter for one packed `uint64` field.
pub type PackedFieldUint64<'a, B> = PackedField<'a, B, raw::Uint64>;
/// An emitter for one packed `fixed32` field.
pub type PackedFieldFixed32<'a, B> = PackedField<'a, B, raw::Fixed32>;
/// An emitter for one packed `sfixed32` field.
pub type PackedFieldSfixed32<'a, B> = PackedField<'a, B, raw::Sfixed32>;
/// An emitter for one packed `fixed64` field.
pub type PackedFieldFixed64<'a, B> = PackedField<'a, B, raw::Fixed64>;
/// An emitter for one packed `sfixed64` field.
pub type PackedFieldSfixed64<'a, B> = PackedField<'a, B, raw::Sfixed64>;
/// An emitter for one packed `float` field.
pub type PackedFieldFloat<'a, B> = PackedField<'a, B, raw::Float>;
/// An emitter for one packed `double` field.
pub type PackedFieldDouble<'a, B> = PackedField<'a, B, raw::Double>;
