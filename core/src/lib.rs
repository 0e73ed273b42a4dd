pub mod db;
pub mod query;
pub mod storage;
pub mod watch;

pub use db::store::{CatalogError, CatalogResult, CatalogStore, Durability, Snapshot};
pub use query::{CatalogQuery, SortKey};
pub use storage::{
    FileBackend, InMemoryBackend, StorageBackend, StorageError, StorageOp, StorageResult,
};
pub use watch::{ChangeWatcher, WatchError};

pub use common::entry::Entry;
