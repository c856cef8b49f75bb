//! Shared test helpers.

#![cfg(test)]

use std::io;

use chrono::{DateTime, TimeZone, Utc};

use crate::store::{KeyedStore, MemoryStore, StoreError};
use crate::workspace::Workspace;

/// An in-memory store whose writes to one key always fail.
#[derive(Debug, Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    failing_key: String,
}

impl FlakyStore {
    pub fn failing_on(key: &str) -> Self {
        Self {
            inner: MemoryStore::new(),
            failing_key: key.to_string(),
        }
    }
}

impl KeyedStore for FlakyStore {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key)
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        if key == self.failing_key {
            return Err(StoreError::Io(io::Error::other(format!(
                "quota exceeded writing {key}"
            ))));
        }
        self.inner.set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.inner.remove(key)
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        self.inner.clear()
    }

    fn keys(&self) -> Vec<String> {
        self.inner.keys()
    }
}

pub fn memory_workspace() -> Workspace<MemoryStore> {
    Workspace::new(MemoryStore::new())
}

pub fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, second)
        .single()
        .expect("valid test timestamp")
}
