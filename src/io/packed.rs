//! Defines the [`PackedIter`], a lazy iterator over the elements of a
//! packed repeated field.

use core::fmt::{self, Debug, Formatter};
use core::iter::FusedIterator;
use core::marker::PhantomData;
use crate::io::{Result, WireType};
use crate::raw::{ConstSized, Value};
use crate::varint;

/// A lazy, restartable sequence over the payload of a packed repeated
/// field.
///
/// The payload bytes stay in the caller's buffer; each step of the
/// iterator decodes one element as `V`. Nothing is decoded up front, so
/// a malformed payload only surfaces as an [`EndOfBuffer`] item at the
/// element where it is discovered, after which the iterator is fused.
///
/// A `PackedIter` is `Copy` and iterating consumes the value, so a
/// bound range can be walked any number of times and always reproduces
/// the same sequence:
///
/// ```
/// use pbwire::{Reader, Writer};
///
/// let mut buffer = Vec::new();
/// Writer::new(&mut buffer).add_packed_sint32(7, [-17, 22]);
///
/// let mut reader = Reader::new(&buffer);
/// assert!(reader.next()?);
/// let packed = reader.get_packed_sint32()?;
///
/// let first: Vec<i32> = packed.collect::<Result<_, _>>()?;
/// let second: Vec<i32> = packed.collect::<Result<_, _>>()?;
/// assert_eq!(first, [-17, 22]);
/// assert_eq!(first, second);
/// # Ok::<(), pbwire::Error>(())
/// ```
///
/// [`EndOfBuffer`]: crate::Error::EndOfBuffer
pub struct PackedIter<'a, V: Value> {
    data: &'a [u8],
    _marker: PhantomData<V>,
}

impl<'a, V: Value> PackedIter<'a, V> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        PackedIter {
            data,
            _marker: PhantomData,
        }
    }

    /// Returns `true` if no elements are left.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl<V: Value> Clone for PackedIter<'_, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V: Value> Copy for PackedIter<'_, V> {}

impl<V: Value> Debug for PackedIter<'_, V> {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        fmt.debug_struct("PackedIter")
            .field("remaining_bytes", &self.data.len())
            .finish()
    }
}

impl<'a, V: Value> Iterator for PackedIter<'a, V> {
    type Item = Result<V::Inner>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.data.is_empty() {
            return None;
        }
        let mut data = self.data;
        match V::decode(&mut data) {
            Ok(value) => {
                self.data = data;
                Some(Ok(V::unwrap(value)))
            }
            Err(e) => {
                // fuse on malformed input
                self.data = &[];
                Some(Err(e))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.data.len();
        match V::WIRE_TYPE {
            WireType::Fixed32 => (len / 4, Some(len / 4)),
            WireType::Fixed64 => (len / 8, Some(len / 8)),
            // varint elements occupy between 1 and 10 bytes each
            _ => ((len + varint::MAX_LEN - 1) / varint::MAX_LEN, Some(len)),
        }
    }
}

impl<V: Value> FusedIterator for PackedIter<'_, V> {}

impl<V: ConstSized> ExactSizeIterator for PackedIter<'_, V> {}

#[cfg(test)]
mod test {
    use super::PackedIter;
    use crate::io::Error;
    use crate::raw::{Bool, Fixed32, Sint64, Uint32};
    use assert_matches::assert_matches;

    #[test]
    fn varint_elements() {
        // 1, 150, 3
        let data = [0x01, 0x96, 0x01, 0x03];
        let packed = PackedIter::<Uint32>::new(&data);
        let values: Vec<u32> = packed.map(Result::unwrap).collect();
        assert_eq!(values, [1, 150, 3]);
    }

    #[test]
    fn zigzag_elements() {
        // -17, 22
        let data = [0x21, 0x2C];
        let packed = PackedIter::<Sint64>::new(&data);
        let sum: i64 = packed.map(Result::unwrap).sum();
        assert_eq!(sum, 5);
    }

    #[test]
    fn fixed_elements_have_exact_len() {
        let data = [1, 0, 0, 0, 2, 0, 0, 0, 3, 0, 0, 0];
        let packed = PackedIter::<Fixed32>::new(&data);
        assert_eq!(packed.len(), 3);
        let values: Vec<u32> = packed.map(Result::unwrap).collect();
        assert_eq!(values, [1, 2, 3]);
    }

    #[test]
    fn bool_elements_read_one_byte_each() {
        let data = [0x01, 0x00, 0x01];
        let packed = PackedIter::<Bool>::new(&data);
        let values: Vec<bool> = packed.map(Result::unwrap).collect();
        assert_eq!(values, [true, false, true]);
    }

    #[test]
    fn empty_payload() {
        let mut packed = PackedIter::<Uint32>::new(&[]);
        assert!(packed.is_empty());
        assert!(packed.next().is_none());
    }

    #[test]
    fn restarts_from_the_beginning() {
        let data = [0x01, 0x02, 0x03];
        let packed = PackedIter::<Uint32>::new(&data);

        let first: Vec<u32> = packed.map(Result::unwrap).collect();
        let second: Vec<u32> = packed.map(Result::unwrap).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn truncated_varint_fails_and_fuses() {
        // one good element, then an unterminated varint
        let data = [0x05, 0x96];
        let mut packed = PackedIter::<Uint32>::new(&data);

        assert_matches!(packed.next(), Some(Ok(5)));
        assert_matches!(packed.next(), Some(Err(Error::EndOfBuffer)));
        assert!(packed.next().is_none());
    }

    #[test]
    fn truncated_fixed_fails() {
        let data = [1, 0, 0, 0, 2, 0];
        let mut packed = PackedIter::<Fixed32>::new(&data);

        assert_matches!(packed.next(), Some(Ok(1)));
        assert_matches!(packed.next(), Some(Err(Error::EndOfBuffer)));
        assert!(packed.next().is_none());
    }
}
