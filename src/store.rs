use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse store file: {0}")]
    Decode(serde_json::Error),
    #[error("failed to encode value: {0}")]
    Encode(serde_json::Error),
}

/// A flat namespace of serialized values, the shape of browser local storage.
///
/// Writes overwrite the whole value under a key; there are no partial updates.
pub trait KeyedStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
    fn clear(&mut self) -> Result<(), StoreError>;
    /// Every persisted key, sorted.
    fn keys(&self) -> Vec<String>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyedStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        self.entries.clear();
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}

/// Keeps the namespace map in one JSON object file and rewrites it on every mutation.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let raw = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => String::new(),
            Err(err) => return Err(StoreError::Io(err)),
        };

        let entries = if raw.trim().is_empty() {
            BTreeMap::new()
        } else {
            serde_json::from_str(&raw).map_err(StoreError::Decode)?
        };

        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the current map to disk even when nothing changed, creating the file.
    pub fn flush(&self) -> Result<(), StoreError> {
        self.persist()
    }

    fn persist(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let body = serde_json::to_string_pretty(&self.entries).map_err(StoreError::Encode)?;
        let staging = staging_path(&self.path);
        let mut file = fs::File::create(&staging)?;
        file.write_all(body.as_bytes())?;
        file.write_all(b"\n")?;
        file.sync_all()?;
        fs::rename(&staging, &self.path)?;
        log::debug!("persisted {} keys to {}", self.entries.len(), self.path.display());
        Ok(())
    }

    fn restore(&mut self, key: &str, previous: Option<String>) {
        match previous {
            Some(value) => {
                self.entries.insert(key.to_string(), value);
            }
            None => {
                self.entries.remove(key);
            }
        }
    }
}

impl KeyedStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        let previous = self.entries.insert(key.to_string(), value);
        if let Err(err) = self.persist() {
            self.restore(key, previous);
            return Err(err);
        }
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        let Some(previous) = self.entries.remove(key) else {
            return Ok(());
        };
        if let Err(err) = self.persist() {
            self.restore(key, Some(previous));
            return Err(err);
        }
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        let previous = std::mem::take(&mut self.entries);
        if let Err(err) = self.persist() {
            self.entries = previous;
            return Err(err);
        }
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[derive(Debug, Clone)]
enum PendingWrite {
    Set(String),
    Remove,
}

/// A batch of namespace writes that either all land or are all rolled back.
///
/// Commit applies the writes in order. When one fails, the keys already written are put back
/// to the values they had before the commit started.
#[derive(Debug, Default)]
pub struct UnitOfWork {
    writes: Vec<(String, PendingWrite)>,
}

impl UnitOfWork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: &str, value: String) -> &mut Self {
        self.writes.push((key.to_string(), PendingWrite::Set(value)));
        self
    }

    pub fn remove(&mut self, key: &str) -> &mut Self {
        self.writes.push((key.to_string(), PendingWrite::Remove));
        self
    }

    pub fn commit<S: KeyedStore + ?Sized>(self, store: &mut S) -> Result<(), StoreError> {
        let mut applied: Vec<(String, Option<String>)> = Vec::with_capacity(self.writes.len());

        for (key, write) in self.writes {
            let previous = store.get(&key);
            let outcome = match write {
                PendingWrite::Set(value) => store.set(&key, value),
                PendingWrite::Remove => store.remove(&key),
            };

            if let Err(err) = outcome {
                log::error!("write to {key} failed, rolling back {} earlier writes: {err}", applied.len());
                rollback(store, applied);
                return Err(err);
            }
            applied.push((key, previous));
        }

        Ok(())
    }
}

fn rollback<S: KeyedStore + ?Sized>(store: &mut S, applied: Vec<(String, Option<String>)>) {
    for (key, previous) in applied.into_iter().rev() {
        let outcome = match previous {
            Some(value) => store.set(&key, value),
            None => store.remove(&key),
        };
        if let Err(err) = outcome {
            log::error!("rollback of {key} failed, store is inconsistent: {err}");
        }
    }
}
