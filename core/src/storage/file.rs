use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use common::entry::Entry;
use tempfile::NamedTempFile;

use super::{codec, StorageBackend, StorageError, StorageOp, StorageResult};

/// Backend that mirrors the catalog into a single JSON file.
///
/// Writes go to a temporary sibling which is then renamed over the target, so
/// readers of the file only ever see a complete document.
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

impl StorageBackend for FileBackend {
    fn load(&self) -> StorageResult<Vec<Entry>> {
        let op = StorageOp::Load(self.path.clone());
        let bytes = fs::read(&self.path).map_err(|source| StorageError::Io {
            op: op.clone(),
            source,
        })?;
        codec::decode(&bytes).map_err(|source| StorageError::Decode { op, source })
    }

    fn store(&self, entries: &[Entry]) -> StorageResult<()> {
        let op = StorageOp::Store(self.path.clone());
        let data = codec::encode(entries).map_err(|source| StorageError::Encode {
            op: op.clone(),
            source,
        })?;

        let dir = self.parent_dir();
        fs::create_dir_all(dir).map_err(|source| StorageError::Io {
            op: StorageOp::CreateDir(dir.to_path_buf()),
            source,
        })?;

        let mut staged = NamedTempFile::new_in(dir).map_err(|source| StorageError::Io {
            op: op.clone(),
            source,
        })?;
        staged
            .write_all(&data)
            .and_then(|_| staged.as_file().sync_all())
            .map_err(|source| StorageError::Io {
                op: op.clone(),
                source,
            })?;
        staged
            .persist(&self.path)
            .map_err(|source| StorageError::Persist { op, source })?;
        Ok(())
    }
}
