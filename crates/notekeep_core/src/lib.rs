//! Core note store for notekeep.
//! This crate owns the data file format, key/tag addressing, the at-rest
//! codec and the advisory edit locks.

pub mod codec;
pub mod config;
pub mod error;
pub mod lock;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;

pub use codec::{AesCfbCodec, BufferCodec, CodecConfig, CodecError};
pub use config::{Config, ConfigError};
pub use error::{StoreError, StoreResult, TagRejection};
pub use lock::{
    ClaimRegistry, ConflictPolicy, EditClaim, FileClaimRegistry, LockManager, MemoryClaimRegistry,
};
pub use logging::{active_log_settings, default_log_level, init_logging, LogSettings};
pub use model::buffer::{Buffer, Metadata};
pub use model::note::{KeyTag, Note, SHORT_KEY_LEN};
pub use repo::note_repo::{BufferNoteRepository, NoteModifier, NoteRepository};
pub use repo::resolver::KeyTagResolver;
pub use service::edit_service::{compose, EditOutcome, EditService, Editor, EditorFlags};
pub use store::BufferStore;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Opens the repository described by `config` with the compat codec.
pub fn open_repository(config: &Config) -> StoreResult<BufferNoteRepository<AesCfbCodec>> {
    let store = BufferStore::open(&config.data_file, AesCfbCodec::default())?;
    Ok(BufferNoteRepository::new(store))
}
