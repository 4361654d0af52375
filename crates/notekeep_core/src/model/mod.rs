//! Persisted domain model.
//!
//! # Responsibility
//! - Define the note record and the buffer aggregate written to disk.
//! - Own the JSON field naming of the data file.
//!
//! # Invariants
//! - Exactly one note per key; the map key always equals `Note::key`.
//! - At most one note per non-empty tag.

pub mod buffer;
pub mod note;
