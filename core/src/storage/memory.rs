use std::sync::RwLock;

use common::entry::Entry;

use super::{codec, StorageBackend, StorageError, StorageOp, StorageResult};

/// In-memory stand-in for the backing file, useful in tests and for
/// bootstrapping. Holds the encoded document so decode failures can be
/// exercised the same way as with a real file.
#[derive(Default)]
pub struct InMemoryBackend {
    document: RwLock<Option<Vec<u8>>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: &[Entry]) -> StorageResult<Self> {
        let backend = Self::new();
        backend.store(entries)?;
        Ok(backend)
    }

    /// Replaces the stored document verbatim, as an external editor would.
    pub fn overwrite(&self, bytes: impl Into<Vec<u8>>) -> StorageResult<()> {
        let mut document = self
            .document
            .write()
            .map_err(|_| StorageError::LockPoisoned("document write"))?;
        *document = Some(bytes.into());
        Ok(())
    }
}

impl StorageBackend for InMemoryBackend {
    fn load(&self) -> StorageResult<Vec<Entry>> {
        let op = StorageOp::Memory("load");
        let document = self
            .document
            .read()
            .map_err(|_| StorageError::LockPoisoned("document read"))?;
        match document.as_deref() {
            Some(bytes) => {
                codec::decode(bytes).map_err(|source| StorageError::Decode { op, source })
            }
            None => Err(StorageError::Io {
                op,
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no document stored"),
            }),
        }
    }

    fn store(&self, entries: &[Entry]) -> StorageResult<()> {
        let op = StorageOp::Memory("store");
        let bytes =
            codec::encode(entries).map_err(|source| StorageError::Encode { op, source })?;
        self.overwrite(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_backend_round_trip() {
        let backend = InMemoryBackend::new();
        assert!(backend.load().is_err());

        let entries = vec![Entry::new("Alpha"), Entry::new("Beta")];
        backend.store(&entries).unwrap();
        assert_eq!(backend.load().unwrap(), entries);
    }

    #[test]
    fn overwrite_with_garbage_fails_to_decode() {
        let backend = InMemoryBackend::with_entries(&[Entry::new("Alpha")]).unwrap();
        backend.overwrite("not json").unwrap();

        assert!(matches!(backend.load(), Err(StorageError::Decode { .. })));
    }
}
