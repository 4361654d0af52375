use notekeep_core::{AesCfbCodec, BufferCodec, BufferStore, Note, StoreError};
use std::fs;

#[test]
fn first_open_creates_directory_and_well_formed_empty_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("store").join("data.txt");

    let store = BufferStore::open(&path, AesCfbCodec::default()).unwrap();
    assert!(store.buffer().notes.is_empty());
    assert!(path.exists());

    let plain = AesCfbCodec::default()
        .decode(&fs::read(&path).unwrap())
        .unwrap();
    let value: serde_json::Value = serde_json::from_slice(&plain).unwrap();
    assert!(value["notes"].as_object().unwrap().is_empty());
}

#[test]
fn load_reports_not_found_for_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.txt");
    let store = BufferStore::open(&path, AesCfbCodec::default()).unwrap();
    fs::remove_file(&path).unwrap();

    assert!(matches!(store.load().unwrap_err(), StoreError::NotFound(_)));
}

#[test]
fn empty_existing_file_is_initialized_and_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.txt");
    fs::write(&path, b"").unwrap();

    let store = BufferStore::open(&path, AesCfbCodec::default()).unwrap();
    assert!(store.buffer().notes.is_empty());
    assert!(!fs::read(&path).unwrap().is_empty());
}

#[test]
fn garbage_armor_is_corrupt_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.txt");
    fs::write(&path, "%%% definitely not base64 %%%").unwrap();

    let err = BufferStore::open(&path, AesCfbCodec::default()).unwrap_err();
    assert!(matches!(err, StoreError::CorruptData(_)));
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "%%% definitely not base64 %%%"
    );
}

#[test]
fn undecodable_json_is_corrupt_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.txt");
    fs::write(&path, AesCfbCodec::default().encode(b"{ not json")).unwrap();

    let err = BufferStore::open(&path, AesCfbCodec::default()).unwrap_err();
    assert!(matches!(err, StoreError::CorruptData(_)));
}

#[test]
fn saved_notes_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.txt");

    let mut store = BufferStore::open(&path, AesCfbCodec::default()).unwrap();
    store
        .transact(|buffer| {
            let note = Note::new("k1", "persisted body", Some("tagged".to_string()));
            buffer.notes.insert(note.key.clone(), note);
            Ok(())
        })
        .unwrap();

    let reopened = BufferStore::open(&path, AesCfbCodec::default()).unwrap();
    let note = reopened.buffer().note("k1").unwrap();
    assert_eq!(note.content, "persisted body");
    assert_eq!(note.tag.as_deref(), Some("tagged"));
    assert_eq!(reopened.buffer(), store.buffer());
}

#[test]
fn file_written_in_legacy_shape_is_readable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.txt");
    let legacy = r#"{
	"notes": {
		"k1": {
			"key": "k1",
			"tag": "",
			"content": "from an older release",
			"createdAt": "2023-05-01T10:00:00Z",
			"lastUpdate": "2023-05-02T10:00:00-05:00",
			"timeSpent": 2500000000,
			"version": 3
		}
	},
	"metadata": {
		"lastCreated": {"key": "k1", "tag": ""},
		"lastAccess": {"key": "k1", "tag": ""}
	}
}"#;
    fs::write(&path, AesCfbCodec::default().encode(legacy.as_bytes())).unwrap();

    let store = BufferStore::open(&path, AesCfbCodec::default()).unwrap();
    let note = store.buffer().note("k1").unwrap();
    assert_eq!(note.tag, None);
    assert_eq!(note.version, 3);
    assert_eq!(note.time_spent.as_millis(), 2500);
    assert_eq!(
        store.buffer().metadata.last_access.as_ref().unwrap().key,
        "k1"
    );
}

#[test]
fn metadata_without_notes_map_gets_notes_initialized() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.txt");
    fs::write(&path, AesCfbCodec::default().encode(br#"{"metadata":{}}"#)).unwrap();

    let store = BufferStore::open(&path, AesCfbCodec::default()).unwrap();
    assert!(store.buffer().notes.is_empty());

    let plain = AesCfbCodec::default()
        .decode(&fs::read(&path).unwrap())
        .unwrap();
    let value: serde_json::Value = serde_json::from_slice(&plain).unwrap();
    assert!(value["notes"].is_object());
}

#[test]
fn saved_file_contains_no_plaintext() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.txt");
    let mut store = BufferStore::open(&path, AesCfbCodec::default()).unwrap();
    store
        .transact(|buffer| {
            let note = Note::new("k1", "secret grocery list", None);
            buffer.notes.insert(note.key.clone(), note);
            Ok(())
        })
        .unwrap();

    let raw = fs::read_to_string(&path).unwrap();
    assert!(!raw.contains("grocery"));
    assert!(!raw.contains("notes"));
}
