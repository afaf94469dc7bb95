//! End-to-end behaviour of the layered stack: buffered typed elements over
//! chunked bytes over memory or files.

use pagestore::{
    BufferConfig, BufferedStore, ByteStore, ChunkConfig, ChunkedByteStore, DirectoryChunkFactory,
    ElementStore, FileByteStore, MemoryChunkFactory, SerializedStore, StoreError, U32Marshal,
    U64Marshal,
};
use tempfile::tempdir;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

fn assert_capacity_invariant(store: &ChunkedByteStore<MemoryChunkFactory>) {
    let manager = store.manager();
    assert_eq!(
        manager.chunk_sizes().iter().sum::<u64>(),
        store.size(),
        "case=size_is_sum_of_chunks"
    );
    assert!(
        manager
            .descriptors()
            .iter()
            .all(|d| d.size() <= manager.chunk_max_capacity()),
        "case=chunks_within_capacity"
    );
}

#[test]
fn insert_storm_through_every_layer() {
    init_tracing();
    let bytes = ChunkedByteStore::with_memory_chunks(64).unwrap();
    let elements = SerializedStore::new(bytes, U64Marshal).unwrap();
    let mut list = BufferedStore::new(elements, BufferConfig::new(10, 20).unwrap()).unwrap();

    for i in 0..1000_u64 {
        list.push(i).unwrap();
    }
    assert_eq!(list.get(500).unwrap(), 500, "case=read_back_after_storm");
    assert!(list.stats().commits >= 50);

    // A burst of inserts in the middle, then a removal run.
    for i in 0..30_u64 {
        list.insert(250, 10_000 + i).unwrap();
    }
    list.remove_range(600, 700).unwrap();

    let mut expected: Vec<u64> = (0..1000).collect();
    for i in 0..30 {
        expected.insert(250, 10_000 + i);
    }
    expected.drain(600..700);

    let mut elements = list.into_main().unwrap();
    let mut out = Vec::new();
    elements.get_range(0, usize::MAX, &mut out).unwrap();
    assert_eq!(out, expected, "case=full_stack_matches_model");

    let bytes = elements.into_inner();
    assert_eq!(bytes.size(), expected.len() as u64 * 8);
    assert_capacity_invariant(&bytes);
}

#[test]
fn chunk_files_concatenate_to_logical_stream() {
    init_tracing();
    let dir = tempdir().unwrap();
    let factory = DirectoryChunkFactory::new(dir.path()).unwrap();
    let bytes = ChunkedByteStore::new(factory, ChunkConfig::new(40).unwrap()).unwrap();
    let elements = SerializedStore::new(bytes, U32Marshal).unwrap();
    let mut list = BufferedStore::new(elements, BufferConfig::new(4, 8).unwrap()).unwrap();

    for i in 0..100_u32 {
        list.push(i).unwrap();
    }
    list.insert(3, 0xDEAD_BEEF).unwrap();
    let mut elements = list.into_main().unwrap();
    elements.flush().unwrap();
    let mut bytes = elements.into_inner();

    let mut expected: Vec<u8> = Vec::new();
    for i in 0..100_u32 {
        if i == 3 {
            expected.extend_from_slice(&0xDEAD_BEEF_u32.to_le_bytes());
        }
        expected.extend_from_slice(&i.to_le_bytes());
    }

    let mut on_disk = Vec::new();
    for desc in bytes.manager().descriptors() {
        let path = bytes.manager().factory().chunk_path(desc.id());
        on_disk.extend(std::fs::read(path).unwrap());
    }
    assert_eq!(on_disk, expected, "case=no_framing_across_chunk_files");

    let mut read_back = vec![0_u8; expected.len()];
    assert_eq!(bytes.read(0, &mut read_back).unwrap(), expected.len());
    assert_eq!(read_back, expected, "case=reopened_after_release");
}

#[test]
fn leaf_io_errors_reach_the_caller_and_keep_the_window_dirty() {
    init_tracing();
    let dir = tempdir().unwrap();
    let chunk_dir = dir.path().join("chunks");
    let factory = DirectoryChunkFactory::new(&chunk_dir).unwrap();
    let bytes = ChunkedByteStore::new(factory, ChunkConfig::new(64).unwrap()).unwrap();
    let elements = SerializedStore::new(bytes, U32Marshal).unwrap();
    let mut list = BufferedStore::new(elements, BufferConfig::new(2, 4).unwrap()).unwrap();

    std::fs::remove_dir_all(&chunk_dir).unwrap();
    for i in 0..3_u32 {
        list.push(i).unwrap();
    }
    // The fourth push fills the window and forces the first commit.
    let err = list.push(3).unwrap_err();
    match &err {
        StoreError::Io(inner) => {
            assert_eq!(inner.kind(), std::io::ErrorKind::NotFound, "case=io_kind_unchanged");
        }
        other => panic!("case=io_passthrough expected Io, got {other:?}"),
    }
    assert!(list.buffer().is_modified(), "case=failed_commit_keeps_dirty_window");
    assert_eq!(list.len(), 4, "case=no_element_dropped");

    std::fs::create_dir_all(&chunk_dir).unwrap();
    list.flush_buffer().unwrap();
    assert!(!list.buffer().is_modified());
    let mut elements = list.into_main().unwrap();
    let mut out = Vec::new();
    elements.get_range(0, usize::MAX, &mut out).unwrap();
    assert_eq!(out, vec![0, 1, 2, 3], "case=retry_after_recovery");
}

#[test]
fn typed_list_over_single_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("list.bin");
    {
        let file = FileByteStore::open(&path).unwrap();
        let elements = SerializedStore::new(file, U64Marshal).unwrap();
        let mut list = BufferedStore::new(elements, BufferConfig::new(8, 16).unwrap()).unwrap();
        list.add_range(0, &[5, 6, 7]).unwrap();
        list.set(1, 60).unwrap();
        list.into_main().unwrap().flush().unwrap();
    }

    let raw = std::fs::read(&path).unwrap();
    assert_eq!(raw.len(), 24, "case=three_records");

    let file = FileByteStore::open(&path).unwrap();
    let mut elements = SerializedStore::new(file, U64Marshal).unwrap();
    assert_eq!(elements.get(1).unwrap(), 60, "case=reopened_file_list");
}

#[test]
fn misaligned_file_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("odd.bin");
    std::fs::write(&path, [0_u8; 13]).unwrap();
    let file = FileByteStore::open(&path).unwrap();
    let err = SerializedStore::new(file, U64Marshal).unwrap_err();
    assert!(err.is_config(), "case=size_not_multiple_of_element");
}

#[test]
fn configs_revalidate_after_deserialising() {
    let config: BufferConfig =
        serde_json::from_str(r#"{"buffer_size":16,"buffer_max_size":64}"#).unwrap();
    assert!(config.validate().is_ok());
    assert_eq!(config.page_start(40), 32);

    let bad: BufferConfig =
        serde_json::from_str(r#"{"buffer_size":16,"buffer_max_size":16}"#).unwrap();
    let main = SerializedStore::new(pagestore::MemoryByteStore::new(), U64Marshal).unwrap();
    let err = BufferedStore::new(main, bad).unwrap_err();
    assert!(matches!(err, StoreError::Config(_)), "case=max_not_above_size");

    let chunk: ChunkConfig = serde_json::from_str(r#"{"chunk_max_capacity":0}"#).unwrap();
    assert!(
        ChunkedByteStore::new(MemoryChunkFactory, chunk)
            .unwrap_err()
            .is_config(),
        "case=zero_chunk_capacity"
    );
}
