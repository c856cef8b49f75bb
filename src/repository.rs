use std::cell::Cell;
use std::marker::PhantomData;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::AppError;
use crate::store::{KeyedStore, StoreError};

pub type RecordId = i64;

/// Where a new record lands in its collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOrder {
    NewestFirst,
    OldestFirst,
}

/// A record kept in a list-valued namespace and identified by an integer id.
pub trait Record: Serialize + DeserializeOwned + Clone {
    const NAMESPACE: &'static str;
    /// Human name used in error messages.
    const ENTITY: &'static str;
    const ORDER: InsertOrder;

    fn id(&self) -> RecordId;
    fn assign_id(&mut self, id: RecordId);

    fn insert_into(self, records: &mut Vec<Self>) {
        match Self::ORDER {
            InsertOrder::NewestFirst => records.insert(0, self),
            InsertOrder::OldestFirst => records.push(self),
        }
    }
}

/// Issues epoch-millisecond ids that never repeat, even when the clock stalls or steps back.
#[derive(Debug, Default)]
pub struct IdClock {
    last: Cell<RecordId>,
}

impl IdClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` once an id of `i64::MAX` has been issued or observed.
    pub fn next(&self, now: DateTime<Utc>) -> Option<RecordId> {
        let id = now.timestamp_millis().max(self.last.get().checked_add(1)?);
        self.last.set(id);
        Some(id)
    }

    /// Makes sure later ids are greater than `id`.
    pub fn observe(&self, id: RecordId) {
        if id > self.last.get() {
            self.last.set(id);
        }
    }
}

/// Reads a list namespace. Absent or malformed content reads as an empty list.
pub fn load_collection<T, S>(store: &S, namespace: &str) -> Vec<T>
where
    T: DeserializeOwned,
    S: KeyedStore + ?Sized,
{
    load_value(store, namespace).unwrap_or_default()
}

/// Reads any namespace value, treating malformed content as absent.
pub fn load_value<T, S>(store: &S, namespace: &str) -> Option<T>
where
    T: DeserializeOwned,
    S: KeyedStore + ?Sized,
{
    let raw = store.get(namespace)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            log::warn!("ignoring malformed content under {namespace}: {err}");
            None
        }
    }
}

pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<String, StoreError> {
    serde_json::to_string(value).map_err(StoreError::Encode)
}

pub fn save_value<T, S>(store: &mut S, namespace: &str, value: &T) -> Result<(), StoreError>
where
    T: Serialize + ?Sized,
    S: KeyedStore + ?Sized,
{
    store.set(namespace, encode(value)?)?;
    log::debug!("wrote {namespace}");
    Ok(())
}

/// Assigns an id to `record` and inserts it into `records` without persisting anything, for
/// callers that write several namespaces as one unit of work.
pub fn stage<T: Record>(
    ids: &IdClock,
    now: DateTime<Utc>,
    mut record: T,
    records: &mut Vec<T>,
) -> Result<T, AppError> {
    for existing in records.iter() {
        ids.observe(existing.id());
    }
    let id = ids.next(now).ok_or(AppError::IdsExhausted { entity: T::ENTITY })?;
    record.assign_id(id);
    record.clone().insert_into(records);
    Ok(record)
}

/// Typed access to the records of one namespace. Every mutation rewrites the whole collection.
pub struct Repository<'a, S: KeyedStore + ?Sized, T: Record> {
    store: &'a mut S,
    ids: &'a IdClock,
    _record: PhantomData<T>,
}

impl<'a, S: KeyedStore + ?Sized, T: Record> Repository<'a, S, T> {
    pub fn new(store: &'a mut S, ids: &'a IdClock) -> Self {
        Self {
            store,
            ids,
            _record: PhantomData,
        }
    }

    pub fn list(&self) -> Vec<T> {
        load_collection(&*self.store, T::NAMESPACE)
    }

    pub fn get(&self, id: RecordId) -> Option<T> {
        self.list().into_iter().find(|record| record.id() == id)
    }

    pub fn find(&self, predicate: impl Fn(&T) -> bool) -> Vec<T> {
        self.list()
            .into_iter()
            .filter(|record| predicate(record))
            .collect()
    }

    /// Assigns a fresh id and stores the record at the end its ordering calls for.
    pub fn create(&mut self, now: DateTime<Utc>, record: T) -> Result<T, AppError> {
        let mut records = self.list();
        let record = stage(self.ids, now, record, &mut records)?;
        self.save(&records)?;
        Ok(record)
    }

    /// Applies `patch` to the record with `id`. The id itself cannot be changed.
    pub fn update(&mut self, id: RecordId, patch: impl FnOnce(&mut T)) -> Result<T, AppError> {
        let mut records = self.list();
        let record = records
            .iter_mut()
            .find(|record| record.id() == id)
            .ok_or(AppError::NotFound {
                entity: T::ENTITY,
                id,
            })?;
        patch(record);
        record.assign_id(id);
        let updated = record.clone();

        self.save(&records)?;
        Ok(updated)
    }

    /// Returns whether a record was removed.
    pub fn remove(&mut self, id: RecordId) -> Result<bool, AppError> {
        let mut records = self.list();
        let before = records.len();
        records.retain(|record| record.id() != id);
        if records.len() == before {
            return Ok(false);
        }

        self.save(&records)?;
        Ok(true)
    }

    fn save(&mut self, records: &[T]) -> Result<(), AppError> {
        save_value(&mut *self.store, T::NAMESPACE, records)?;
        Ok(())
    }
}
