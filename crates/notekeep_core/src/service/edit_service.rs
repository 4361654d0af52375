//! Edit session orchestration.
//!
//! # Responsibility
//! - Claim the note, materialize it to a temp file, hand the path to an
//!   [`Editor`], then write changed content back through the repository.
//!
//! # Invariants
//! - The claim is released on every exit path, editor failures included.
//! - Unchanged content performs no persisted update.
//! - Write-back starts from the persisted store, not the session-start snapshot.
//! - Content produced in a conflict-forced read-only session is discarded.

use crate::error::{StoreError, StoreResult};
use crate::lock::{ClaimRegistry, ConflictPolicy, LockManager};
use crate::model::note::{short_key, Note};
use crate::repo::note_repo::{NoteModifier, NoteRepository};
use log::{debug, info, warn};
use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::Instant;
use tempfile::{Builder, NamedTempFile};

/// Invocation hints passed to the editor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EditorFlags {
    pub read_only: bool,
}

/// External editor collaborator.
///
/// Receives a path, blocks until the user is done, and may mutate the file.
pub trait Editor {
    fn edit(&mut self, path: &Path, flags: EditorFlags) -> std::io::Result<()>;
}

impl<F> Editor for F
where
    F: FnMut(&Path, EditorFlags) -> std::io::Result<()>,
{
    fn edit(&mut self, path: &Path, flags: EditorFlags) -> std::io::Result<()> {
        self(path, flags)
    }
}

/// Result of one edit session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// Content changed and was persisted.
    Updated(Note),
    /// Editor exited without changing the content.
    Unchanged(Note),
    /// Session ran read-only because another session holds the note.
    Discarded(Note),
}

pub struct EditService<'a, R: NoteRepository, G: ClaimRegistry> {
    repo: &'a mut R,
    locks: &'a LockManager<G>,
    policy: ConflictPolicy,
}

impl<'a, R: NoteRepository, G: ClaimRegistry> EditService<'a, R, G> {
    pub fn new(repo: &'a mut R, locks: &'a LockManager<G>, policy: ConflictPolicy) -> Self {
        Self {
            repo,
            locks,
            policy,
        }
    }

    /// Runs one edit session on the note identified by `key`.
    ///
    /// # Errors
    /// - `AlreadyInUse` when the note is claimed and the policy refuses.
    /// - `NotFound` when `key` does not exist.
    /// - `Io` when the temp file or the editor fails.
    pub fn edit(&mut self, key: &str, editor: &mut impl Editor) -> StoreResult<EditOutcome> {
        let note = self.repo.get(key)?;

        let claim = match self.locks.acquire(&note.key) {
            Ok(claim) => Some(claim),
            Err(StoreError::AlreadyInUse(_)) if self.policy == ConflictPolicy::ReadOnly => {
                warn!("event=edit_session module=service status=read_only_fallback");
                None
            }
            Err(err) => return Err(err),
        };
        let flags = EditorFlags {
            read_only: claim.is_none(),
        };

        let scratch = materialize(&note.key, &note.content)?;
        let started_at = Instant::now();
        debug!(
            "event=edit_session module=service status=start read_only={}",
            flags.read_only
        );
        editor.edit(scratch.path(), flags)?;
        let spent = started_at.elapsed();
        let content = fs::read_to_string(scratch.path())?;

        let outcome = if flags.read_only {
            EditOutcome::Discarded(note)
        } else if content == note.content {
            EditOutcome::Unchanged(note)
        } else {
            // Other sessions may have saved while the editor was open; the
            // claim keeps this key untouched, so merge onto their state.
            self.repo.reload()?;
            let updated = self.repo.update(
                &note.key,
                &[NoteModifier::Content(content), NoteModifier::SpentTime(spent)],
            )?;
            EditOutcome::Updated(updated)
        };

        if let Some(claim) = claim {
            claim.release()?;
        }
        info!(
            "event=edit_session module=service status=ok outcome={} duration_ms={}",
            outcome_name(&outcome),
            spent.as_millis()
        );
        Ok(outcome)
    }
}

/// Lets the user write new content starting from `initial`.
///
/// Returns `None` when the editor leaves the file empty.
pub fn compose(initial: &str, editor: &mut impl Editor) -> StoreResult<Option<String>> {
    let scratch = materialize("new", initial)?;
    editor.edit(scratch.path(), EditorFlags::default())?;
    let content = fs::read_to_string(scratch.path())?;
    if content.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(content))
}

fn materialize(label: &str, content: &str) -> StoreResult<NamedTempFile> {
    let mut file = Builder::new()
        .prefix(&format!("notekeep-{}-", short_key(label)))
        .suffix(".txt")
        .tempfile()?;
    file.write_all(content.as_bytes())?;
    file.flush()?;
    Ok(file)
}

fn outcome_name(outcome: &EditOutcome) -> &'static str {
    match outcome {
        EditOutcome::Updated(_) => "updated",
        EditOutcome::Unchanged(_) => "unchanged",
        EditOutcome::Discarded(_) => "discarded",
    }
}

#[cfg(test)]
mod tests {
    use super::{compose, EditorFlags};
    use std::path::Path;

    #[test]
    fn compose_returns_written_content() {
        let mut editor = |path: &Path, flags: EditorFlags| {
            assert!(!flags.read_only);
            assert_eq!(std::fs::read_to_string(path)?, "seed");
            std::fs::write(path, "seed and more")
        };
        assert_eq!(
            compose("seed", &mut editor).unwrap().as_deref(),
            Some("seed and more")
        );
    }

    #[test]
    fn compose_treats_blank_result_as_cancelled() {
        let mut editor = |path: &Path, _: EditorFlags| std::fs::write(path, "  \n");
        assert_eq!(compose("", &mut editor).unwrap(), None);
    }
}
