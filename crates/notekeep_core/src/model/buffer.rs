//! Buffer aggregate: every note plus access metadata.

use super::note::{KeyTag, Note};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Complete persisted state. Rewritten in full on every save.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Buffer {
    pub notes: BTreeMap<String, Note>,
    #[serde(default)]
    pub metadata: Metadata,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    /// Most recently created note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_created: Option<KeyTag>,
    /// Most recently read or modified note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_access: Option<KeyTag>,
}

impl Metadata {
    /// Drops pointers to `key`.
    pub fn forget(&mut self, key: &str) {
        if self.last_created.as_ref().is_some_and(|kt| kt.key == key) {
            self.last_created = None;
        }
        if self.last_access.as_ref().is_some_and(|kt| kt.key == key) {
            self.last_access = None;
        }
    }

    /// Refreshes the recorded tag of pointers to `key`.
    pub fn retag(&mut self, key: &str, tag: Option<&str>) {
        for entry in [&mut self.last_created, &mut self.last_access]
            .into_iter()
            .flatten()
        {
            if entry.key == key {
                entry.tag = tag.map(str::to_string);
            }
        }
    }
}

impl Buffer {
    pub fn note(&self, key: &str) -> Option<&Note> {
        self.notes.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.notes.contains_key(key)
    }

    /// Returns the key of the note tagged exactly `tag`.
    pub fn key_for_tag(&self, tag: &str) -> Option<&str> {
        self.notes
            .values()
            .find(|note| note.tag.as_deref() == Some(tag))
            .map(|note| note.key.as_str())
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.notes.values().filter_map(|note| note.tag.as_deref())
    }
}

/// On-disk shape where `notes` may be missing (fresh or empty file).
#[derive(Debug, Default, Deserialize)]
pub(crate) struct StoredBuffer {
    #[serde(default)]
    pub notes: Option<BTreeMap<String, Note>>,
    #[serde(default)]
    pub metadata: Metadata,
}
