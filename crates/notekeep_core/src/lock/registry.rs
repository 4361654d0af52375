//! Claim registries: the shared list of keys under edit.

use crate::error::StoreResult;
use fs2::FileExt;
use log::error;
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Storage for claimed keys.
pub trait ClaimRegistry {
    /// Adds `key` unless present. Returns `false` when it was already claimed.
    fn try_claim(&self, key: &str) -> StoreResult<bool>;
    /// Removes `key`. Returns `false` when it was not claimed.
    fn unclaim(&self, key: &str) -> StoreResult<bool>;
    /// Currently claimed keys in registry order.
    fn claimed(&self) -> StoreResult<Vec<String>>;
}

/// Newline-separated key list in a shared file.
///
/// Every read-modify-write holds an exclusive `flock`-style lock on the file
/// so concurrent processes cannot lose each other's registry updates.
#[derive(Debug, Clone)]
pub struct FileClaimRegistry {
    path: PathBuf,
}

impl FileClaimRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn with_locked<T>(
        &self,
        apply: impl FnOnce(&mut File, Vec<String>) -> StoreResult<T>,
    ) -> StoreResult<T> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)?;
        file.lock_exclusive()?;

        let result = read_keys(&mut file).and_then(|keys| apply(&mut file, keys));

        if let Err(err) = FileExt::unlock(&file) {
            error!(
                "event=registry_unlock module=lock status=error path={} error={}",
                self.path.display(),
                err
            );
        }
        result
    }
}

impl ClaimRegistry for FileClaimRegistry {
    fn try_claim(&self, key: &str) -> StoreResult<bool> {
        self.with_locked(|file, keys| {
            if keys.iter().any(|claimed| claimed == key) {
                return Ok(false);
            }
            file.seek(SeekFrom::End(0))?;
            // Older writers did not terminate the last line.
            let needs_newline = file.stream_position()? > 0 && !ends_with_newline(file)?;
            let mut line = String::with_capacity(key.len() + 2);
            if needs_newline {
                line.push('\n');
            }
            line.push_str(key);
            line.push('\n');
            file.write_all(line.as_bytes())?;
            file.flush()?;
            Ok(true)
        })
    }

    fn unclaim(&self, key: &str) -> StoreResult<bool> {
        self.with_locked(|file, keys| {
            let before = keys.len();
            let remaining: Vec<String> = keys.into_iter().filter(|k| k != key).collect();
            if remaining.len() == before {
                return Ok(false);
            }

            let mut content = remaining.join("\n");
            if !content.is_empty() {
                content.push('\n');
            }
            file.set_len(0)?;
            file.seek(SeekFrom::Start(0))?;
            file.write_all(content.as_bytes())?;
            file.flush()?;
            Ok(true)
        })
    }

    fn claimed(&self) -> StoreResult<Vec<String>> {
        self.with_locked(|_, keys| Ok(keys))
    }
}

fn read_keys(file: &mut File) -> StoreResult<Vec<String>> {
    let mut content = String::new();
    file.seek(SeekFrom::Start(0))?;
    file.read_to_string(&mut content)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

fn ends_with_newline(file: &mut File) -> StoreResult<bool> {
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    file.seek(SeekFrom::End(0))?;
    Ok(last[0] == b'\n')
}

/// Process-local registry for tests and single-process embedding.
#[derive(Debug, Default)]
pub struct MemoryClaimRegistry {
    keys: RefCell<BTreeSet<String>>,
}

impl MemoryClaimRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClaimRegistry for MemoryClaimRegistry {
    fn try_claim(&self, key: &str) -> StoreResult<bool> {
        Ok(self.keys.borrow_mut().insert(key.to_string()))
    }

    fn unclaim(&self, key: &str) -> StoreResult<bool> {
        Ok(self.keys.borrow_mut().remove(key))
    }

    fn claimed(&self) -> StoreResult<Vec<String>> {
        Ok(self.keys.borrow().iter().cloned().collect())
    }
}
