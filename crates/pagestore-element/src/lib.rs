//! Element-indexed views over byte stores.
//!
//! - [`AlignedByteStore`]: element index `i` maps to byte position
//!   `i * element_size` of any [`ByteStore`](pagestore_types::ByteStore).
//! - [`SerializedStore`]: typed [`ElementStore`](pagestore_types::ElementStore)
//!   over an aligned store, encoding through a
//!   [`Marshal`](pagestore_types::Marshal).
//! - [`VecStore`]: heap element store, the default paging buffer.

pub mod aligned;
pub mod serialized;
pub mod vec_store;

pub use aligned::AlignedByteStore;
pub use serialized::SerializedStore;
pub use vec_store::VecStore;
