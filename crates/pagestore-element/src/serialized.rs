//! Typed element store over an aligned byte store.

use pagestore_error::{Result, StoreError, check_range_order};
use pagestore_types::{
    ByteStore, ElementStore, Marshal, check_element_span, check_index, encode_checked,
};
use smallvec::{SmallVec, smallvec};
use tracing::trace;

use crate::aligned::AlignedByteStore;

/// Records at or below this width are decoded from a stack buffer.
const INLINE_RECORD: usize = 32;

/// Elements encoded with `M` into fixed-size records of a byte store.
///
/// Each batch operation encodes into one contiguous scratch buffer and issues
/// a single byte-range call on the underlying store.
#[derive(Debug)]
pub struct SerializedStore<S, M> {
    bytes: AlignedByteStore<S>,
    marshal: M,
    scratch: Vec<u8>,
}

impl<S: ByteStore, M: Marshal> SerializedStore<S, M> {
    pub fn new(store: S, marshal: M) -> Result<Self> {
        let element_size = marshal.element_size();
        Ok(Self {
            bytes: AlignedByteStore::new(store, element_size)?,
            marshal,
            scratch: Vec::new(),
        })
    }

    #[must_use]
    pub const fn marshal(&self) -> &M {
        &self.marshal
    }

    #[must_use]
    pub const fn aligned(&self) -> &AlignedByteStore<S> {
        &self.bytes
    }

    pub fn into_inner(self) -> S {
        self.bytes.into_inner()
    }

    pub fn flush(&mut self) -> Result<()> {
        self.bytes.flush()
    }

    fn encode(&mut self, items: &[M::Item]) -> Result<()> {
        self.scratch.clear();
        self.scratch
            .reserve(items.len() * self.marshal.element_size());
        for item in items {
            encode_checked(&self.marshal, item, &mut self.scratch)?;
        }
        Ok(())
    }
}

impl<S, M> ElementStore for SerializedStore<S, M>
where
    S: ByteStore,
    M: Marshal,
    M::Item: Clone,
{
    type Item = M::Item;

    fn len(&self) -> usize {
        self.bytes.len()
    }

    fn get(&mut self, index: usize) -> Result<M::Item> {
        check_index(index, self.bytes.len())?;
        let mut record: SmallVec<[u8; INLINE_RECORD]> = smallvec![0; self.marshal.element_size()];
        if self.bytes.read(index, &mut record)? != 1 {
            return Err(StoreError::internal(format_args!(
                "element {index} vanished during read"
            )));
        }
        self.marshal.deserialize(&record)
    }

    fn get_range(&mut self, from: usize, to: usize, sink: &mut Vec<M::Item>) -> Result<usize> {
        check_range_order(from, to)?;
        let len = self.bytes.len();
        if from > len {
            return Err(StoreError::out_of_range(
                "element range start",
                format_args!("{from} (len {len})"),
            ));
        }
        let to = to.min(len);
        if from >= to {
            return Ok(0);
        }
        let element_size = self.marshal.element_size();
        self.scratch.clear();
        self.scratch.resize((to - from) * element_size, 0);
        let count = self.bytes.read(from, &mut self.scratch)?;
        sink.reserve(count);
        for record in self.scratch[..count * element_size].chunks_exact(element_size) {
            sink.push(self.marshal.deserialize(record)?);
        }
        trace!(from, count, "serialized range read");
        Ok(count)
    }

    fn replace_range(&mut self, from: usize, to: usize, items: &[M::Item]) -> Result<()> {
        check_element_span(from, to, self.bytes.len())?;
        self.encode(items)?;
        let written = self.bytes.replace_range(from, to, &self.scratch)?;
        if written != items.len() {
            return Err(StoreError::internal(format_args!(
                "byte store took {written} of {} records",
                items.len()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagestore_chunk::ChunkedByteStore;
    use pagestore_types::{FixedBytesMarshal, I32Marshal, U64Marshal};
    use pagestore_vfs::MemoryByteStore;
    use proptest::collection::vec;
    use proptest::prelude::*;

    /// Declares four bytes but writes three.
    struct ShortMarshal;

    impl Marshal for ShortMarshal {
        type Item = u32;

        fn element_size(&self) -> usize {
            4
        }

        fn serialize(&self, item: &u32, out: &mut Vec<u8>) {
            out.extend_from_slice(&item.to_le_bytes()[..3]);
        }

        fn deserialize(&self, bytes: &[u8]) -> Result<u32> {
            Ok(u32::from(bytes[0]))
        }
    }

    #[test]
    fn typed_round_trip_over_memory() {
        let mut store = SerializedStore::new(MemoryByteStore::new(), I32Marshal).unwrap();
        store.push(-1).unwrap();
        store.push(7).unwrap();
        store.insert(1, 42).unwrap();
        assert_eq!(store.len(), 3);
        assert_eq!(store.get(1).unwrap(), 42);
        assert_eq!(store.aligned().store().as_slice().len(), 12, "case=fixed_width_records");

        store.set(0, 5).unwrap();
        let mut out = Vec::new();
        assert_eq!(store.get_range(0, 10, &mut out).unwrap(), 3, "case=range_clamped");
        assert_eq!(out, vec![5, 42, 7]);
    }

    #[test]
    fn get_range_bounds() {
        let mut store = SerializedStore::new(MemoryByteStore::new(), U64Marshal).unwrap();
        store.replace_range(0, 0, &[1, 2, 3]).unwrap();
        let mut out = Vec::new();
        assert_eq!(store.get_range(3, 9, &mut out).unwrap(), 0, "case=from_at_len");
        assert!(store.get_range(4, 9, &mut out).unwrap_err().is_out_of_range());
        assert!(store.get(3).unwrap_err().is_out_of_range(), "case=get_past_end");
    }

    #[test]
    fn short_serializer_is_an_encoding_error() {
        let mut store = SerializedStore::new(MemoryByteStore::new(), ShortMarshal).unwrap();
        let err = store.push(9).unwrap_err();
        assert!(
            matches!(
                err,
                StoreError::Encoding {
                    expected: 4,
                    actual: 3
                }
            ),
            "case=encoding_mismatch"
        );
        assert!(store.is_empty(), "case=nothing_written_on_encoding_error");
    }

    #[test]
    fn wide_records_spill_past_inline_buffer() {
        let marshal = FixedBytesMarshal::new(INLINE_RECORD * 2);
        let mut store = SerializedStore::new(MemoryByteStore::new(), marshal).unwrap();
        let record: Vec<u8> = (0..INLINE_RECORD as u8 * 2).collect();
        store.push(record.clone()).unwrap();
        assert_eq!(store.get(0).unwrap(), record);
    }

    proptest! {
        #[test]
        fn matches_vec_over_chunked_bytes(
            initial in vec(any::<u64>(), 0..40),
            edits in vec((any::<u8>(), 0_u8..6, vec(any::<u64>(), 0..6)), 0..20),
        ) {
            let chunked = ChunkedByteStore::with_memory_chunks(20).unwrap();
            let mut store = SerializedStore::new(chunked, U64Marshal).unwrap();
            store.replace_range(0, 0, &initial).unwrap();
            let mut model = initial;
            for (at, len, items) in edits {
                let from = usize::from(at) % (model.len() + 1);
                let to = (from + usize::from(len)).min(model.len());
                model.splice(from..to, items.iter().copied());
                store.replace_range(from, to, &items).unwrap();
            }
            let mut out = Vec::new();
            store.get_range(0, usize::MAX, &mut out).unwrap();
            prop_assert_eq!(out, model);
        }
    }
}
