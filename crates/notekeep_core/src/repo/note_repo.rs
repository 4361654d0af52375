//! Note repository contract and buffer-backed implementation.
//!
//! # Responsibility
//! - Provide get/create/update/remove/tag operations over one buffer.
//! - Keep `metadata.last_created` and `metadata.last_access` current.
//!
//! # Invariants
//! - Keys are generated here and never reused.
//! - An update applies all of its modifiers or none of them.
//! - Reads that touch `last_access` are persisted like writes.

use crate::codec::BufferCodec;
use crate::error::{StoreError, StoreResult};
use crate::model::buffer::Buffer;
use crate::model::note::Note;
use crate::repo::keygen::generate_unique_key;
use crate::repo::resolver::KeyTagResolver;
use crate::store::BufferStore;
use chrono::Utc;
use log::{debug, info};
use std::time::Duration;

/// Field-level change applied by [`NoteRepository::update`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteModifier {
    /// Replaces the full content.
    Content(String),
    /// Adds time spent in an editor session.
    SpentTime(Duration),
    /// Renames the tag, validated like a new tag.
    Tag(String),
}

/// Repository interface for note operations.
pub trait NoteRepository {
    /// Resolves a tag, full key, or key prefix to one key.
    fn resolve(&self, input: &str) -> StoreResult<String>;
    /// Gets one note and records it as last accessed.
    fn get(&mut self, key: &str) -> StoreResult<Note>;
    /// Gets the most recently accessed note.
    fn last_accessed(&mut self) -> StoreResult<Note>;
    /// Creates a note and returns its generated key.
    fn create(&mut self, content: &str, tag: Option<&str>) -> StoreResult<String>;
    /// Applies field changes to one note and returns the updated record.
    fn update(&mut self, key: &str, modifiers: &[NoteModifier]) -> StoreResult<Note>;
    /// Deletes one note and returns the removed record.
    fn remove(&mut self, key: &str) -> StoreResult<Note>;
    /// Validates `new_tag` and assigns it to the note.
    fn rename_tag(&mut self, key: &str, new_tag: &str) -> StoreResult<()>;
    /// Lists all notes, most recently updated first.
    fn list(&self) -> Vec<Note>;
    /// Replaces in-memory state with what is currently persisted.
    fn reload(&mut self) -> StoreResult<()>;
}

/// Repository backed by a [`BufferStore`].
#[derive(Debug)]
pub struct BufferNoteRepository<C: BufferCodec> {
    store: BufferStore<C>,
}

impl<C: BufferCodec> BufferNoteRepository<C> {
    pub fn new(store: BufferStore<C>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &BufferStore<C> {
        &self.store
    }
}

impl<C: BufferCodec> NoteRepository for BufferNoteRepository<C> {
    fn resolve(&self, input: &str) -> StoreResult<String> {
        KeyTagResolver::new(self.store.buffer()).resolve(input)
    }

    fn get(&mut self, key: &str) -> StoreResult<Note> {
        self.store.transact(|buffer| {
            let note = find_note(buffer, key)?.clone();
            buffer.metadata.last_access = Some(note.key_tag());
            Ok(note)
        })
    }

    fn last_accessed(&mut self) -> StoreResult<Note> {
        let key = self
            .store
            .buffer()
            .metadata
            .last_access
            .as_ref()
            .map(|entry| entry.key.clone())
            .ok_or_else(|| StoreError::NotFound("no note has been accessed yet".to_string()))?;
        self.get(&key)
    }

    fn create(&mut self, content: &str, tag: Option<&str>) -> StoreResult<String> {
        let tag = tag.map(str::trim);
        let key = self.store.transact(|buffer| {
            if let Some(tag) = tag {
                KeyTagResolver::new(buffer).validate_new_tag(tag)?;
            }

            let key = generate_unique_key(buffer, &mut rand::thread_rng());
            let note = Note::new(key.clone(), content, tag.map(str::to_string));
            buffer.metadata.last_created = Some(note.key_tag());
            buffer.metadata.last_access = Some(note.key_tag());
            buffer.notes.insert(key.clone(), note);
            Ok(key)
        })?;

        info!(
            "event=note_create module=repo status=ok tagged={} content_len={}",
            tag.is_some(),
            content.len()
        );
        Ok(key)
    }

    fn update(&mut self, key: &str, modifiers: &[NoteModifier]) -> StoreResult<Note> {
        let updated = self.store.transact(|buffer| {
            let mut note = find_note(buffer, key)?.clone();
            for modifier in modifiers {
                match modifier {
                    NoteModifier::Content(content) => {
                        if note.content != *content {
                            note.content = content.clone();
                            note.version += 1;
                        }
                    }
                    NoteModifier::SpentTime(spent) => {
                        note.time_spent = note.time_spent.saturating_add(*spent);
                    }
                    NoteModifier::Tag(tag) => {
                        let tag = tag.trim();
                        KeyTagResolver::new(buffer).validate_new_tag(tag)?;
                        note.tag = Some(tag.to_string());
                    }
                }
            }

            note.last_update = Utc::now();
            buffer.metadata.retag(&note.key, note.tag.as_deref());
            buffer.metadata.last_access = Some(note.key_tag());
            buffer.notes.insert(note.key.clone(), note.clone());
            Ok(note)
        })?;

        debug!(
            "event=note_update module=repo status=ok modifiers={} version={}",
            modifiers.len(),
            updated.version
        );
        Ok(updated)
    }

    fn remove(&mut self, key: &str) -> StoreResult<Note> {
        let removed = self.store.transact(|buffer| {
            let note = buffer
                .notes
                .remove(key)
                .ok_or_else(|| not_found(key))?;
            buffer.metadata.forget(key);
            Ok(note)
        })?;

        info!("event=note_remove module=repo status=ok");
        Ok(removed)
    }

    fn rename_tag(&mut self, key: &str, new_tag: &str) -> StoreResult<()> {
        self.update(key, &[NoteModifier::Tag(new_tag.to_string())])
            .map(|_| ())
    }

    fn list(&self) -> Vec<Note> {
        let mut notes: Vec<Note> = self.store.buffer().notes.values().cloned().collect();
        notes.sort_by(|a, b| {
            b.last_update
                .cmp(&a.last_update)
                .then_with(|| a.key.cmp(&b.key))
        });
        notes
    }

    fn reload(&mut self) -> StoreResult<()> {
        self.store.reload()
    }
}

fn find_note<'b>(buffer: &'b Buffer, key: &str) -> StoreResult<&'b Note> {
    buffer.notes.get(key).ok_or_else(|| not_found(key))
}

fn not_found(key: &str) -> StoreError {
    StoreError::NotFound(format!("note `{key}`"))
}

#[cfg(test)]
mod tests {
    use super::{BufferNoteRepository, NoteModifier, NoteRepository};
    use crate::codec::AesCfbCodec;
    use crate::error::StoreError;
    use crate::store::BufferStore;
    use std::time::Duration;

    fn repo_in(dir: &tempfile::TempDir) -> BufferNoteRepository<AesCfbCodec> {
        let store = BufferStore::open(dir.path().join("data.txt"), AesCfbCodec::default())
            .expect("store should open");
        BufferNoteRepository::new(store)
    }

    #[test]
    fn failed_tag_modifier_discards_content_modifier() {
        let dir = tempfile::tempdir().unwrap();
        let mut repo = repo_in(&dir);
        repo.create("first", Some("taken")).unwrap();
        let key = repo.create("second", None).unwrap();

        let err = repo
            .update(
                &key,
                &[
                    NoteModifier::Content("changed".to_string()),
                    NoteModifier::Tag("taken".to_string()),
                ],
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidTag { .. }));

        let note = repo.get(&key).unwrap();
        assert_eq!(note.content, "second");
        assert_eq!(note.version, 1);
    }

    #[test]
    fn spent_time_accumulates_across_updates() {
        let dir = tempfile::tempdir().unwrap();
        let mut repo = repo_in(&dir);
        let key = repo.create("body", None).unwrap();

        repo.update(&key, &[NoteModifier::SpentTime(Duration::from_secs(2))])
            .unwrap();
        let note = repo
            .update(&key, &[NoteModifier::SpentTime(Duration::from_secs(3))])
            .unwrap();
        assert_eq!(note.time_spent, Duration::from_secs(5));
        assert_eq!(note.version, 1);
    }

    #[test]
    fn remove_clears_metadata_pointers() {
        let dir = tempfile::tempdir().unwrap();
        let mut repo = repo_in(&dir);
        let key = repo.create("body", None).unwrap();
        repo.remove(&key).unwrap();

        let metadata = &repo.store().buffer().metadata;
        assert!(metadata.last_created.is_none());
        assert!(metadata.last_access.is_none());
        assert!(matches!(
            repo.last_accessed().unwrap_err(),
            StoreError::NotFound(_)
        ));
    }

    #[test]
    fn list_orders_by_last_update_descending() {
        let dir = tempfile::tempdir().unwrap();
        let mut repo = repo_in(&dir);
        let older = repo.create("older", None).unwrap();
        let newer = repo.create("newer", None).unwrap();
        std::thread::sleep(Duration::from_millis(5));
        repo.update(&older, &[NoteModifier::Content("touched".to_string())])
            .unwrap();

        let keys: Vec<String> = repo.list().into_iter().map(|note| note.key).collect();
        assert_eq!(keys, vec![older, newer]);
    }
}
