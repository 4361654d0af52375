use notekeep_core::{
    AesCfbCodec, BufferNoteRepository, BufferStore, ConflictPolicy, EditOutcome, EditService,
    EditorFlags, LockManager, MemoryClaimRegistry, NoteModifier, NoteRepository, StoreError,
};
use std::io;
use std::path::Path;

fn open_repo(dir: &tempfile::TempDir) -> BufferNoteRepository<AesCfbCodec> {
    let store = BufferStore::open(dir.path().join("data.txt"), AesCfbCodec::default()).unwrap();
    BufferNoteRepository::new(store)
}

#[test]
fn changed_content_is_written_back_and_claim_released() {
    let dir = tempfile::tempdir().unwrap();
    let mut repo = open_repo(&dir);
    let key = repo.create("before", None).unwrap();
    let locks = LockManager::new(MemoryClaimRegistry::new());

    let mut editor = |path: &Path, flags: EditorFlags| {
        assert!(!flags.read_only);
        assert_eq!(std::fs::read_to_string(path)?, "before");
        std::fs::write(path, "after")
    };
    let outcome = EditService::new(&mut repo, &locks, ConflictPolicy::Refuse)
        .edit(&key, &mut editor)
        .unwrap();

    match outcome {
        EditOutcome::Updated(note) => {
            assert_eq!(note.content, "after");
            assert_eq!(note.version, 2);
        }
        other => panic!("expected update, got {other:?}"),
    }
    assert_eq!(repo.get(&key).unwrap().content, "after");
    assert!(locks.claimed().unwrap().is_empty());
}

#[test]
fn unchanged_content_does_not_touch_the_note() {
    let dir = tempfile::tempdir().unwrap();
    let mut repo = open_repo(&dir);
    let key = repo.create("stable", None).unwrap();
    let before = repo.get(&key).unwrap();
    let locks = LockManager::new(MemoryClaimRegistry::new());

    let mut editor = |_: &Path, _: EditorFlags| -> io::Result<()> { Ok(()) };
    let outcome = EditService::new(&mut repo, &locks, ConflictPolicy::Refuse)
        .edit(&key, &mut editor)
        .unwrap();

    assert!(matches!(outcome, EditOutcome::Unchanged(_)));
    let after = repo.get(&key).unwrap();
    assert_eq!(after.last_update, before.last_update);
    assert_eq!(after.time_spent, before.time_spent);
}

#[test]
fn conflict_is_refused_under_refuse_policy() {
    let dir = tempfile::tempdir().unwrap();
    let mut repo = open_repo(&dir);
    let key = repo.create("body", None).unwrap();
    let locks = LockManager::new(MemoryClaimRegistry::new());
    let _other_session = locks.acquire(&key).unwrap();

    let mut editor = |_: &Path, _: EditorFlags| -> io::Result<()> {
        panic!("editor must not run when the edit is refused")
    };
    let err = EditService::new(&mut repo, &locks, ConflictPolicy::Refuse)
        .edit(&key, &mut editor)
        .unwrap_err();
    assert!(matches!(err, StoreError::AlreadyInUse(_)));
}

#[test]
fn conflict_falls_back_to_read_only_and_discards_changes() {
    let dir = tempfile::tempdir().unwrap();
    let mut repo = open_repo(&dir);
    let key = repo.create("original", None).unwrap();
    let locks = LockManager::new(MemoryClaimRegistry::new());
    let other_session = locks.acquire(&key).unwrap();

    let mut editor = |path: &Path, flags: EditorFlags| {
        assert!(flags.read_only);
        std::fs::write(path, "sneaky change")
    };
    let outcome = EditService::new(&mut repo, &locks, ConflictPolicy::ReadOnly)
        .edit(&key, &mut editor)
        .unwrap();

    assert!(matches!(outcome, EditOutcome::Discarded(_)));
    assert_eq!(repo.get(&key).unwrap().content, "original");
    assert_eq!(locks.claimed().unwrap(), vec![key.clone()]);
    other_session.release().unwrap();
}

#[test]
fn editor_failure_still_releases_the_claim() {
    let dir = tempfile::tempdir().unwrap();
    let mut repo = open_repo(&dir);
    let key = repo.create("body", None).unwrap();
    let locks = LockManager::new(MemoryClaimRegistry::new());

    let mut editor = |_: &Path, _: EditorFlags| -> io::Result<()> {
        Err(io::Error::other("editor crashed"))
    };
    let err = EditService::new(&mut repo, &locks, ConflictPolicy::Refuse)
        .edit(&key, &mut editor)
        .unwrap_err();

    assert!(matches!(err, StoreError::Io(_)));
    assert!(locks.claimed().unwrap().is_empty());
    assert_eq!(repo.get(&key).unwrap().content, "body");
}

#[test]
fn temp_file_is_removed_after_session() {
    let dir = tempfile::tempdir().unwrap();
    let mut repo = open_repo(&dir);
    let key = repo.create("body", None).unwrap();
    let locks = LockManager::new(MemoryClaimRegistry::new());

    let mut seen = None;
    let mut editor = |path: &Path, _: EditorFlags| -> io::Result<()> {
        seen = Some(path.to_path_buf());
        Ok(())
    };
    EditService::new(&mut repo, &locks, ConflictPolicy::Refuse)
        .edit(&key, &mut editor)
        .unwrap();

    let path = seen.expect("editor should have been called");
    assert!(!path.exists());
}

#[test]
fn write_back_keeps_saves_made_by_other_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let mut repo = open_repo(&dir);
    let a = repo.create("A", None).unwrap();
    let b = repo.create("B", None).unwrap();
    let locks = LockManager::new(MemoryClaimRegistry::new());

    let mut editor = |path: &Path, _: EditorFlags| {
        let mut other = open_repo(&dir);
        other
            .update(&b, &[NoteModifier::Content("B edited elsewhere".to_string())])
            .unwrap();
        std::fs::write(path, "A edited here")
    };
    let outcome = EditService::new(&mut repo, &locks, ConflictPolicy::Refuse)
        .edit(&a, &mut editor)
        .unwrap();
    assert!(matches!(outcome, EditOutcome::Updated(_)));

    let mut reopened = open_repo(&dir);
    assert_eq!(reopened.get(&a).unwrap().content, "A edited here");
    assert_eq!(reopened.get(&b).unwrap().content, "B edited elsewhere");
}
