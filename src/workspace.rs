use crate::repository::{IdClock, Record, Repository, load_collection};
use crate::store::KeyedStore;

/// Entry point to the data layer: one store plus the id clock shared by every collection.
///
/// Entity operations live in `tracker`, `planner`, `journal` and `review` as further
/// `impl` blocks on this type.
#[derive(Debug)]
pub struct Workspace<S: KeyedStore> {
    pub(crate) store: S,
    pub(crate) ids: IdClock,
}

impl<S: KeyedStore> Workspace<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            ids: IdClock::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn repository<T: Record>(&mut self) -> Repository<'_, S, T> {
        Repository::new(&mut self.store, &self.ids)
    }

    pub fn list<T: Record>(&self) -> Vec<T> {
        load_collection(&self.store, T::NAMESPACE)
    }
}
