//! Concrete chunking and buffering scenarios.

use pagestore::{
    BufferConfig, BufferedStore, ByteStore, ChunkConfig, ChunkManager, ChunkedByteStore,
    ElementStore, MemoryChunkFactory, Result, VecStore,
};
use proptest::prelude::*;

fn read_all(store: &mut ChunkedByteStore<MemoryChunkFactory>) -> Vec<u8> {
    let mut out = vec![0_u8; store.size() as usize];
    assert_eq!(store.read(0, &mut out).unwrap(), out.len());
    out
}

#[test]
fn split_on_insert() {
    let mut store = ChunkedByteStore::with_memory_chunks(8).unwrap();
    store.write(0, b"01234567").unwrap();
    store.insert(4, b"abcd").unwrap();

    assert_eq!(store.size(), 12);
    assert_eq!(read_all(&mut store), b"0123abcd4567", "case=interleave");
    assert_eq!(store.chunk_count(), 2, "case=two_chunks");
}

#[test]
fn shrink_removes_chunks() {
    let mut store = ChunkedByteStore::with_memory_chunks(8).unwrap();
    let original: Vec<u8> = (100..124).collect();
    store.write(0, &original).unwrap();
    assert_eq!(store.manager().chunk_sizes(), vec![8, 8, 8]);

    store.remove_range(0, 16).unwrap();
    assert_eq!(store.chunk_count(), 1);
    assert_eq!(store.size(), 8);
    assert_eq!(read_all(&mut store), &original[16..24]);
}

/// Main store recording the size of every write it receives.
#[derive(Default)]
struct RecordingStore {
    inner: VecStore<u64>,
    write_sizes: Vec<usize>,
    range_reads: usize,
}

impl ElementStore for RecordingStore {
    type Item = u64;

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn get(&mut self, index: usize) -> Result<u64> {
        self.range_reads += 1;
        self.inner.get(index)
    }

    fn get_range(&mut self, from: usize, to: usize, sink: &mut Vec<u64>) -> Result<usize> {
        self.range_reads += 1;
        self.inner.get_range(from, to, sink)
    }

    fn replace_range(&mut self, from: usize, to: usize, items: &[u64]) -> Result<()> {
        self.write_sizes.push(items.len());
        self.inner.replace_range(from, to, items)
    }
}

#[test]
fn buffered_insert_storm() {
    let mut store =
        BufferedStore::new(RecordingStore::default(), BufferConfig::new(10, 20).unwrap()).unwrap();
    for i in 0..1000_u64 {
        store.insert(i as usize, i * 7).unwrap();
    }
    assert_eq!(store.get(500).unwrap(), 3500, "case=value_at_500");
    let sizes = &store.main().write_sizes;
    assert!(
        sizes.len() < 1000 && sizes.iter().all(|&n| n >= 10),
        "case=batched_writes {sizes:?}"
    );
}

#[test]
fn window_reads_avoid_main_store() {
    let main = RecordingStore {
        inner: VecStore::from((0..200).collect::<Vec<u64>>()),
        ..RecordingStore::default()
    };
    let mut store = BufferedStore::new(main, BufferConfig::new(16, 32).unwrap()).unwrap();
    store.get(37).unwrap();
    let reads = store.main().range_reads;
    for j in 32..48 {
        assert_eq!(store.get(j).unwrap(), j as u64);
    }
    assert_eq!(store.main().range_reads, reads, "case=page_hits");
}

#[test]
fn double_flush_writes_once() {
    let mut store = BufferedStore::new(RecordingStore::default(), BufferConfig::new(4, 8).unwrap())
        .unwrap();
    store.push(1).unwrap();
    store.push(2).unwrap();
    store.flush_buffer().unwrap();
    let writes = store.main().write_sizes.len();
    store.flush_buffer().unwrap();
    assert_eq!(store.main().write_sizes.len(), writes, "case=idempotent_flush");
    assert_eq!(store.len(), 2);
}

#[test]
fn locators_fail_fast_after_structural_edits() {
    let mut manager = ChunkManager::new(MemoryChunkFactory, ChunkConfig::new(4).unwrap()).unwrap();
    let mut first = manager.get_or_create_chunk_by_position(0).unwrap();
    manager.write_chunk(&mut first, 0, b"abcd").unwrap();
    let second = manager.get_or_create_next_chunk(&first).unwrap();

    assert!(
        manager.descriptor(&first).unwrap_err().is_stale_locator(),
        "case=stale_after_create"
    );
    let fresh = manager.first_chunk().unwrap();
    assert_eq!(manager.descriptor(&fresh).unwrap().size(), 4, "case=fresh_works");

    manager.remove_chunk(&second).unwrap();
    assert!(manager.descriptor(&fresh).unwrap_err().is_stale_locator(), "case=stale_after_remove");

    let fresh = manager.first_chunk().unwrap();
    manager.clear().unwrap();
    assert!(manager.descriptor(&fresh).unwrap_err().is_stale_locator(), "case=stale_after_clear");
}

proptest! {
    #[test]
    fn inserts_read_back_across_boundaries(
        capacity in 1_u64..16,
        inserts in proptest::collection::vec((any::<u16>(), proptest::collection::vec(any::<u8>(), 1..20)), 1..30),
    ) {
        let mut store = ChunkedByteStore::with_memory_chunks(capacity).unwrap();
        let mut model: Vec<u8> = Vec::new();
        for (at, bytes) in inserts {
            let at = usize::from(at) % (model.len() + 1);
            store.insert(at as u64, &bytes).unwrap();
            model.splice(at..at, bytes.iter().copied());
            prop_assert_eq!(store.manager().chunk_sizes().iter().sum::<u64>(), model.len() as u64);
        }
        prop_assert_eq!(read_all(&mut store), model);
    }
}
