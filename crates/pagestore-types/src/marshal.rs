//! Fixed-size binary encoding of typed elements.

use pagestore_error::{Result, StoreError};

/// Encodes elements into records of exactly [`Marshal::element_size`] bytes.
pub trait Marshal {
    type Item;

    /// Fixed record width in bytes.
    fn element_size(&self) -> usize;

    /// Append the encoding of `item` to `out`.
    fn serialize(&self, item: &Self::Item, out: &mut Vec<u8>);

    /// Decode one record. `bytes` is exactly `element_size()` long.
    fn deserialize(&self, bytes: &[u8]) -> Result<Self::Item>;
}

/// Serialize `item` and verify the record width.
///
/// A marshaller writing any other count than `element_size()` is a fatal
/// [`StoreError::Encoding`]; `out` is truncated back to its prior length.
pub fn encode_checked<M: Marshal + ?Sized>(
    marshal: &M,
    item: &M::Item,
    out: &mut Vec<u8>,
) -> Result<()> {
    let start = out.len();
    marshal.serialize(item, out);
    let actual = out.len() - start;
    let expected = marshal.element_size();
    if actual != expected {
        out.truncate(start);
        return Err(StoreError::Encoding { expected, actual });
    }
    Ok(())
}

macro_rules! le_marshal {
    ($(#[$doc:meta])* $name:ident, $ty:ty) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        pub struct $name;

        impl Marshal for $name {
            type Item = $ty;

            #[inline]
            fn element_size(&self) -> usize {
                size_of::<$ty>()
            }

            #[inline]
            fn serialize(&self, item: &$ty, out: &mut Vec<u8>) {
                out.extend_from_slice(&item.to_le_bytes());
            }

            fn deserialize(&self, bytes: &[u8]) -> Result<$ty> {
                let raw: [u8; size_of::<$ty>()] =
                    bytes.try_into().map_err(|_| StoreError::Encoding {
                        expected: size_of::<$ty>(),
                        actual: bytes.len(),
                    })?;
                Ok(<$ty>::from_le_bytes(raw))
            }
        }
    };
}

le_marshal!(
    /// Little-endian `u16`.
    U16Marshal,
    u16
);
le_marshal!(
    /// Little-endian `u32`.
    U32Marshal,
    u32
);
le_marshal!(
    /// Little-endian `u64`.
    U64Marshal,
    u64
);
le_marshal!(I32Marshal, i32);
le_marshal!(I64Marshal, i64);
le_marshal!(F64Marshal, f64);

/// Opaque byte records of a fixed width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedBytesMarshal {
    width: usize,
}

impl FixedBytesMarshal {
    #[must_use]
    pub const fn new(width: usize) -> Self {
        Self { width }
    }
}

impl Marshal for FixedBytesMarshal {
    type Item = Vec<u8>;

    fn element_size(&self) -> usize {
        self.width
    }

    fn serialize(&self, item: &Vec<u8>, out: &mut Vec<u8>) {
        out.extend_from_slice(item);
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<Vec<u8>> {
        if bytes.len() != self.width {
            return Err(StoreError::Encoding {
                expected: self.width,
                actual: bytes.len(),
            });
        }
        Ok(bytes.to_vec())
    }
}
