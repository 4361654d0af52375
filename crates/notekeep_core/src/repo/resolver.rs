//! Key/tag resolution.
//!
//! # Responsibility
//! - Map user input (tag, full key, or key prefix) to one canonical key.
//! - Decide whether a string may be used as a new tag.
//!
//! # Invariants
//! - An exact tag match always wins over a key prefix match.
//! - Tags never equal an existing tag or an existing key.

use crate::error::{StoreError, StoreResult, TagRejection};
use crate::model::buffer::Buffer;
use std::ops::Bound;

/// Read-only view used to resolve identifiers against one buffer.
#[derive(Debug, Clone, Copy)]
pub struct KeyTagResolver<'a> {
    buffer: &'a Buffer,
}

impl<'a> KeyTagResolver<'a> {
    pub fn new(buffer: &'a Buffer) -> Self {
        Self { buffer }
    }

    /// Resolves `input` to exactly one key.
    ///
    /// # Errors
    /// - `NotFound` when neither a tag nor any key prefix matches.
    /// - `Ambiguous` when the prefix matches several keys; all of them are
    ///   reported in sorted order.
    pub fn resolve(&self, input: &str) -> StoreResult<String> {
        if input.is_empty() {
            return Err(StoreError::NotFound("empty key or tag".to_string()));
        }

        if let Some(key) = self.buffer.key_for_tag(input) {
            return Ok(key.to_string());
        }

        let mut matches = self.keys_with_prefix(input);
        match matches.len() {
            0 => Err(StoreError::NotFound(format!("key or tag `{input}`"))),
            1 => Ok(matches.remove(0).to_string()),
            _ => Err(StoreError::Ambiguous {
                input: input.to_string(),
                candidates: matches.into_iter().map(str::to_string).collect(),
            }),
        }
    }

    /// Keys starting with `prefix`, in sorted order.
    pub fn keys_with_prefix(&self, prefix: &str) -> Vec<&'a str> {
        self.buffer
            .notes
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .map(|(key, _)| key.as_str())
            .take_while(|key| key.starts_with(prefix))
            .collect()
    }

    /// Keys and tags starting with `prefix`, tags first.
    pub fn suggest(&self, prefix: &str) -> Vec<String> {
        let mut tags: Vec<String> = self
            .buffer
            .tags()
            .filter(|tag| tag.starts_with(prefix))
            .map(str::to_string)
            .collect();
        tags.sort();
        tags.extend(
            self.keys_with_prefix(prefix)
                .into_iter()
                .map(str::to_string),
        );
        tags
    }

    /// Checks that `tag` can be assigned to a note.
    ///
    /// Surrounding whitespace is ignored; callers store the trimmed tag.
    /// The current tag of the note being renamed counts as taken.
    pub fn validate_new_tag(&self, tag: &str) -> StoreResult<()> {
        let tag = tag.trim();
        let reason = if tag.is_empty() {
            Some(TagRejection::Blank)
        } else if self.buffer.key_for_tag(tag).is_some() {
            Some(TagRejection::TagTaken)
        } else if self.buffer.contains_key(tag) {
            Some(TagRejection::CollidesWithKey)
        } else {
            None
        };

        match reason {
            Some(reason) => Err(StoreError::InvalidTag {
                tag: tag.to_string(),
                reason,
            }),
            None => Ok(()),
        }
    }
}
