//! Buffer persistence.
//!
//! # Responsibility
//! - Load the full buffer from one backing file through a [`BufferCodec`].
//! - Rewrite the full buffer on every save.
//!
//! # Invariants
//! - `BufferStore::save` is the only write path to the backing file.
//! - A failed mutation never leaves a partially applied buffer in memory.
//!
//! [`BufferCodec`]: crate::codec::BufferCodec

mod buffer_store;

pub use buffer_store::BufferStore;
