use std::fmt;
use std::path::PathBuf;

use common::entry::Entry;
use thiserror::Error;

pub mod codec;
pub mod file;
pub mod memory;

pub use file::FileBackend;
pub use memory::InMemoryBackend;

pub type StorageResult<T> = Result<T, StorageError>;

/// Storage step that produced an error.
#[derive(Debug, Clone)]
pub enum StorageOp {
    Load(PathBuf),
    Store(PathBuf),
    CreateDir(PathBuf),
    Memory(&'static str),
}

impl fmt::Display for StorageOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageOp::Load(path) => write!(f, "load {}", path.display()),
            StorageOp::Store(path) => write!(f, "store {}", path.display()),
            StorageOp::CreateDir(path) => write!(f, "create directory {}", path.display()),
            StorageOp::Memory(step) => write!(f, "in-memory {step}"),
        }
    }
}

/// Errors produced by storage backends.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error during {op}: {source}")]
    Io {
        op: StorageOp,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode catalog during {op}: {source}")]
    Decode {
        op: StorageOp,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode catalog during {op}: {source}")]
    Encode {
        op: StorageOp,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to replace backing file during {op}: {source}")]
    Persist {
        op: StorageOp,
        #[source]
        source: tempfile::PersistError,
    },

    #[error("lock poisoned: {0}")]
    LockPoisoned(&'static str),
}

/// Durable mirror of the catalog: one whole collection per read or write.
pub trait StorageBackend: Send + Sync {
    fn load(&self) -> StorageResult<Vec<Entry>>;
    fn store(&self, entries: &[Entry]) -> StorageResult<()>;
}
