use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use common::entry::Entry;
use thiserror::Error;

use crate::query::{self, CatalogQuery};
use crate::storage::{StorageBackend, StorageError};

/// Immutable view of the catalog at one point in time.
pub type Snapshot = Arc<Vec<Entry>>;

/// Errors surfaced by the catalog store.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to load catalog: {0}")]
    Load(#[source] StorageError),
    #[error("entry {0:?} not found")]
    NotFound(String),
    #[error("invalid entry: {0}")]
    Validation(String),
    #[error("lock poisoned during {0}")]
    LockPoisoned(&'static str),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Outcome of writing a mutation through to the backing store.
///
/// The in-memory change is kept either way; a failed write only means the
/// file lags behind until the next successful mutation.
#[derive(Debug)]
pub enum Durability {
    Persisted,
    MemoryOnly(StorageError),
}

impl Durability {
    pub fn is_persisted(&self) -> bool {
        matches!(self, Durability::Persisted)
    }

    pub fn error(&self) -> Option<&StorageError> {
        match self {
            Durability::Persisted => None,
            Durability::MemoryOnly(err) => Some(err),
        }
    }
}

/// Authoritative in-process copy of the catalog.
///
/// Readers clone an `Arc` under the read lock and work on it unlocked.
/// Loads and mutations hold the write lock across their file I/O, so disk
/// writes are serialized with each other and with reloads.
pub struct CatalogStore<B: StorageBackend> {
    backend: B,
    entries: RwLock<Snapshot>,
    generation: AtomicU64,
}

impl<B: StorageBackend> CatalogStore<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            entries: RwLock::new(Arc::new(Vec::new())),
            generation: AtomicU64::new(0),
        }
    }

    /// Creates a store and performs the initial load. A failed load leaves
    /// the catalog empty instead of failing construction.
    pub fn open(backend: B) -> Self {
        let store = Self::new(backend);
        match store.load() {
            Ok(count) => log::info!("catalog opened with {count} entries"),
            Err(err) => log::warn!("starting with an empty catalog: {err}"),
        }
        store
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Incremented on every successful load and every mutation.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Re-reads the backing store and replaces the whole catalog.
    ///
    /// On failure the current catalog is left as it was.
    pub fn load(&self) -> CatalogResult<usize> {
        let mut guard = self
            .entries
            .write()
            .map_err(|_| CatalogError::LockPoisoned("load"))?;
        let loaded = self.backend.load().map_err(CatalogError::Load)?;
        let count = loaded.len();
        *guard = Arc::new(loaded);
        self.bump_generation("load");
        Ok(count)
    }

    pub fn snapshot(&self) -> CatalogResult<Snapshot> {
        let guard = self
            .entries
            .read()
            .map_err(|_| CatalogError::LockPoisoned("snapshot"))?;
        Ok(Arc::clone(&guard))
    }

    pub fn len(&self) -> CatalogResult<usize> {
        Ok(self.snapshot()?.len())
    }

    pub fn is_empty(&self) -> CatalogResult<bool> {
        Ok(self.snapshot()?.is_empty())
    }

    pub fn query(&self, query: &CatalogQuery) -> CatalogResult<Vec<Entry>> {
        let snapshot = self.snapshot()?;
        Ok(query.run(&snapshot))
    }

    /// First entry whose name equals `name`.
    pub fn get(&self, name: &str) -> CatalogResult<Option<Entry>> {
        let snapshot = self.snapshot()?;
        Ok(snapshot.iter().find(|entry| entry.name == name).cloned())
    }

    pub fn unique_categories(&self) -> CatalogResult<BTreeSet<String>> {
        Ok(query::unique_categories(&self.snapshot()?))
    }

    pub fn unique_tags(&self) -> CatalogResult<BTreeSet<String>> {
        Ok(query::unique_tags(&self.snapshot()?))
    }

    /// Appends an entry. Duplicate names are accepted.
    pub fn insert(&self, entry: Entry) -> CatalogResult<Durability> {
        validate(&entry)?;
        self.mutate("insert", move |entries| {
            entries.push(entry);
            Ok(())
        })
    }

    /// Replaces the first entry named `name`. The replacement may rename it.
    pub fn update(&self, name: &str, entry: Entry) -> CatalogResult<Durability> {
        validate(&entry)?;
        self.update_with(name, move |_| entry)
    }

    /// Replaces the first entry named `name` with `build(current)`. `build`
    /// runs under the write lock, so it always sees the latest version.
    pub fn update_with<F>(&self, name: &str, build: F) -> CatalogResult<Durability>
    where
        F: FnOnce(&Entry) -> Entry,
    {
        self.mutate("update", |entries| {
            let slot = entries
                .iter_mut()
                .find(|candidate| candidate.name == name)
                .ok_or_else(|| CatalogError::NotFound(name.to_owned()))?;
            let replacement = build(slot);
            validate(&replacement)?;
            *slot = replacement;
            Ok(())
        })
    }

    /// Removes the first entry named `name`, keeping the others in order.
    pub fn delete(&self, name: &str) -> CatalogResult<Durability> {
        self.mutate("delete", |entries| {
            let index = entries
                .iter()
                .position(|candidate| candidate.name == name)
                .ok_or_else(|| CatalogError::NotFound(name.to_owned()))?;
            entries.remove(index);
            Ok(())
        })
    }

    fn mutate<F>(&self, op: &'static str, func: F) -> CatalogResult<Durability>
    where
        F: FnOnce(&mut Vec<Entry>) -> CatalogResult<()>,
    {
        let mut guard = self
            .entries
            .write()
            .map_err(|_| CatalogError::LockPoisoned(op))?;

        // Readers may still hold the published Arc; mutate a copy.
        let mut next = Vec::clone(&guard);
        func(&mut next)?;
        *guard = Arc::new(next);
        self.bump_generation(op);

        Ok(self.persist(op, &guard))
    }

    fn persist(&self, op: &'static str, entries: &[Entry]) -> Durability {
        match self.backend.store(entries) {
            Ok(()) => Durability::Persisted,
            Err(err) => {
                log::error!("{op}: keeping in-memory change, persist failed: {err}");
                Durability::MemoryOnly(err)
            }
        }
    }

    fn bump_generation(&self, op: &'static str) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        log::trace!("catalog generation bump for {op}: now {generation}");
    }
}

fn validate(entry: &Entry) -> CatalogResult<()> {
    if entry.name.trim().is_empty() {
        return Err(CatalogError::Validation("name must not be empty".into()));
    }
    Ok(())
}
