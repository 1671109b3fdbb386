//! Customization points for the byte buffers the codec writes into and
//! the owned byte strings it can copy data out into.

/// A resizable byte buffer a [`Writer`](crate::Writer) can append to.
///
/// The writer only needs a handful of operations over its target:
/// appending bytes, appending a run of zero bytes (the length
/// reservation for nested submessages), reserving additional capacity,
/// erasing a byte range in place, and mutable access to the bytes at a
/// given offset (for patching a reserved length prefix). Any byte-vector
/// abstraction that supplies these is a legal target; an implementation
/// for [`Vec<u8>`] is built in.
pub trait BufferTarget {
    /// The number of bytes currently in the buffer.
    fn len(&self) -> usize;

    /// Returns `true` if the buffer holds no bytes.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends the given bytes to the end of the buffer.
    fn append(&mut self, data: &[u8]);

    /// Appends `count` zero bytes to the end of the buffer.
    fn append_zeros(&mut self, count: usize);

    /// Reserves capacity for at least `additional` more bytes beyond the
    /// current length. Unlike [`Vec::reserve`] semantics this is always
    /// relative to the bytes already written.
    fn reserve_additional(&mut self, additional: usize);

    /// Removes the bytes in `from..to`, shifting everything after `to`
    /// down so the buffer stays contiguous.
    fn erase_range(&mut self, from: usize, to: usize);

    /// Mutable access to the bytes from `from` to the end of the buffer.
    fn tail_mut(&mut self, from: usize) -> &mut [u8];
}

impl BufferTarget for Vec<u8> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn append(&mut self, data: &[u8]) {
        self.extend_from_slice(data);
    }

    fn append_zeros(&mut self, count: usize) {
        self.resize(Vec::len(self) + count, 0);
    }

    fn reserve_additional(&mut self, additional: usize) {
        self.reserve(additional);
    }

    fn erase_range(&mut self, from: usize, to: usize) {
        self.drain(from..to);
    }

    fn tail_mut(&mut self, from: usize) -> &mut [u8] {
        &mut self[from..]
    }
}

/// A generic string of bytes.
///
/// This is used by [`Reader`](crate::Reader) to copy a length-delimited
/// field out of the input into an owned byte collection.
pub trait ByteString: AsRef<[u8]> + AsMut<[u8]> {
    /// Creates a new instance of the byte string holding `len` zero bytes.
    fn new(len: usize) -> Self;
}

impl ByteString for Vec<u8> {
    fn new(len: usize) -> Self {
        vec![0; len]
    }
}

impl ByteString for Box<[u8]> {
    fn new(len: usize) -> Self {
        <Vec<u8> as ByteString>::new(len).into_boxed_slice()
    }
}
