//! Repository layer over the buffer store.
//!
//! # Responsibility
//! - Resolve user identifiers to keys and enforce tag uniqueness.
//! - Provide note CRUD with access metadata tracking.
//!
//! # Invariants
//! - Every mutation is persisted through `BufferStore::transact`.
//! - Repository APIs return semantic errors (`NotFound`, `Ambiguous`,
//!   `InvalidTag`) in addition to storage errors.

pub mod keygen;
pub mod note_repo;
pub mod resolver;
