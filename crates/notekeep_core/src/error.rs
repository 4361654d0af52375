//! Store-wide error contract.
//!
//! # Responsibility
//! - Provide one typed error for codec, buffer, resolver, repository and
//!   lock operations so callers can branch on the failure kind.
//!
//! # Invariants
//! - `NotFound` is only produced for absent keys, tags, or backing files.
//! - `Io` never wraps an absence error that callers are expected to recover
//!   from (those are mapped to `NotFound` first).

use crate::codec::CodecError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Why a tag was refused as a new tag name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagRejection {
    /// Tag is empty or whitespace only.
    Blank,
    /// Another note already carries this tag.
    TagTaken,
    /// Tag text equals an existing note key.
    CollidesWithKey,
}

impl Display for TagRejection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Blank => write!(f, "tag cannot be empty"),
            Self::TagTaken => write!(f, "tag is already in use"),
            Self::CollidesWithKey => write!(f, "tag collides with an existing key"),
        }
    }
}

/// Error kinds surfaced by every store operation.
#[derive(Debug)]
pub enum StoreError {
    /// Missing key, tag, or backing file. Carries what was looked up.
    NotFound(String),
    /// A prefix matched more than one key.
    Ambiguous {
        input: String,
        candidates: Vec<String>,
    },
    /// Key is currently claimed by another edit session.
    AlreadyInUse(String),
    /// Tag failed validation for use as a new tag.
    InvalidTag { tag: String, reason: TagRejection },
    /// Backing data could not be decoded or deserialized.
    CorruptData(String),
    /// Filesystem failure unrelated to absence.
    Io(std::io::Error),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(what) => write!(f, "not found: {what}"),
            Self::Ambiguous { input, candidates } => write!(
                f,
                "`{input}` is ambiguous, it matches {} keys: {}",
                candidates.len(),
                candidates.join(", ")
            ),
            Self::AlreadyInUse(key) => write!(f, "key `{key}` already in use"),
            Self::InvalidTag { tag, reason } => write!(f, "tag `{tag}` is not valid: {reason}"),
            Self::CorruptData(details) => write!(f, "unreadable data file: {details}"),
            Self::Io(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<CodecError> for StoreError {
    fn from(value: CodecError) -> Self {
        Self::CorruptData(value.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::CorruptData(value.to_string())
    }
}
