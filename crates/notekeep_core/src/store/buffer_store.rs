use crate::codec::{AesCfbCodec, BufferCodec};
use crate::error::{StoreError, StoreResult};
use crate::model::buffer::{Buffer, StoredBuffer};
use log::{debug, error, info, warn};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tempfile::NamedTempFile;

/// Exclusive owner of the in-memory buffer for one process.
#[derive(Debug)]
pub struct BufferStore<C: BufferCodec = AesCfbCodec> {
    path: PathBuf,
    codec: C,
    buffer: Buffer,
}

impl<C: BufferCodec> BufferStore<C> {
    /// Opens the store at `path`, creating the file on first use.
    pub fn open(path: impl Into<PathBuf>, codec: C) -> StoreResult<Self> {
        let mut store = Self {
            path: path.into(),
            codec,
            buffer: Buffer::default(),
        };
        store.reload()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    /// Reads, decodes and deserializes the backing file.
    ///
    /// # Errors
    /// - `NotFound` when the backing file does not exist.
    /// - `CorruptData` when decoding or deserialization fails.
    pub fn load(&self) -> StoreResult<Buffer> {
        self.read_file().map(|(buffer, _)| buffer)
    }

    /// Replaces the in-memory buffer with the file content.
    ///
    /// A missing file is bootstrapped (parent directory and empty file), and
    /// a file without a `notes` map is normalized and saved immediately.
    pub fn reload(&mut self) -> StoreResult<()> {
        let (buffer, notes_missing) = match self.read_file() {
            Ok(loaded) => loaded,
            Err(StoreError::NotFound(_)) => {
                self.bootstrap()?;
                self.read_file()?
            }
            Err(err) => {
                error!(
                    "event=buffer_load module=store status=error path={} error={}",
                    self.path.display(),
                    err
                );
                return Err(err);
            }
        };

        self.buffer = buffer;
        if notes_missing {
            debug!("event=buffer_init module=store status=start");
            self.save()?;
        }
        Ok(())
    }

    /// Persists the whole buffer as a replacement of the backing file.
    ///
    /// Writes to a sibling temporary file first and renames it over the
    /// target so a crash never leaves a truncated file behind.
    pub fn save(&self) -> StoreResult<()> {
        let started_at = Instant::now();
        let plain = serialize_buffer(&self.buffer)?;
        let stored = self.codec.encode(&plain);

        let dir = parent_dir(&self.path);
        fs::create_dir_all(dir)?;
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&stored)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|err| {
            error!(
                "event=buffer_save module=store status=error path={} error={}",
                self.path.display(),
                err.error
            );
            StoreError::Io(err.error)
        })?;

        debug!(
            "event=buffer_save module=store status=ok notes={} bytes={} duration_ms={}",
            self.buffer.notes.len(),
            stored.len(),
            started_at.elapsed().as_millis()
        );
        Ok(())
    }

    /// Applies `mutate` to the buffer and saves it.
    ///
    /// When `mutate` or the save fails the buffer is restored to its prior
    /// state, so callers observe either the full change or none of it.
    pub fn transact<T>(
        &mut self,
        mutate: impl FnOnce(&mut Buffer) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let snapshot = self.buffer.clone();
        let result = mutate(&mut self.buffer).and_then(|value| {
            self.save()?;
            Ok(value)
        });
        if result.is_err() {
            self.buffer = snapshot;
        }
        result
    }

    fn read_file(&self) -> StoreResult<(Buffer, bool)> {
        let stored = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound(format!(
                    "data file `{}`",
                    self.path.display()
                )));
            }
            Err(err) => return Err(err.into()),
        };

        let plain = self.codec.decode(&stored)?;
        let raw: StoredBuffer = if plain.iter().all(u8::is_ascii_whitespace) {
            StoredBuffer::default()
        } else {
            serde_json::from_slice(&plain)?
        };

        let notes_missing = raw.notes.is_none();
        let mut buffer = Buffer {
            notes: raw.notes.unwrap_or_default(),
            metadata: raw.metadata,
        };
        repair_map_keys(&mut buffer);
        Ok((buffer, notes_missing))
    }

    fn bootstrap(&self) -> StoreResult<()> {
        let dir = parent_dir(&self.path);
        fs::create_dir_all(dir).map_err(|err| {
            error!(
                "event=buffer_bootstrap module=store status=error dir={} error={}",
                dir.display(),
                err
            );
            err
        })?;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)?;
        info!(
            "event=buffer_bootstrap module=store status=ok path={}",
            self.path.display()
        );
        Ok(())
    }
}

fn serialize_buffer(buffer: &Buffer) -> StoreResult<Vec<u8>> {
    let mut out = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"\t"));
    buffer.serialize(&mut serializer)?;
    Ok(out)
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

// The map key is authoritative; a record whose own `key` drifted is realigned.
fn repair_map_keys(buffer: &mut Buffer) {
    for (key, note) in buffer.notes.iter_mut() {
        if note.key != *key {
            warn!("event=buffer_load module=store status=repaired field=key");
            note.key = key.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{parent_dir, BufferStore};
    use crate::codec::AesCfbCodec;
    use crate::error::StoreError;
    use crate::model::note::Note;
    use std::path::Path;

    #[test]
    fn parent_dir_falls_back_to_current_dir() {
        assert_eq!(parent_dir(Path::new("data.txt")), Path::new("."));
        assert_eq!(parent_dir(Path::new("/a/b/data.txt")), Path::new("/a/b"));
    }

    #[test]
    fn failed_transaction_restores_previous_buffer() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = BufferStore::open(dir.path().join("data.txt"), AesCfbCodec::default())
            .expect("store should bootstrap");

        let result: Result<(), StoreError> = store.transact(|buffer| {
            let note = Note::new("k1", "draft", None);
            buffer.notes.insert(note.key.clone(), note);
            Err(StoreError::NotFound("forced".to_string()))
        });

        assert!(result.is_err());
        assert!(store.buffer().notes.is_empty());
        assert!(store.load().unwrap().notes.is_empty());
    }
}
