//! Background reload of the catalog when its backing file changes.
//!
//! The watcher registers on the file's parent directory rather than the file
//! itself: editors and our own persist path replace the file by rename, which
//! would orphan a watch placed on the old inode.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use notify::event::{AccessKind, AccessMode, ModifyKind};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use thiserror::Error;

use crate::db::store::CatalogStore;
use crate::storage::StorageBackend;

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("cannot watch {path}: {source}")]
    Registration {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

enum WatchMessage {
    Event(notify::Result<Event>),
    Shutdown,
}

/// Handle to the watcher thread.
///
/// The thread runs until [`ChangeWatcher::shutdown`] is called or the handle
/// is dropped.
pub struct ChangeWatcher {
    path: PathBuf,
    control: Sender<WatchMessage>,
    handle: Option<JoinHandle<()>>,
}

impl ChangeWatcher {
    /// Starts watching `path` and reloading `store` on every write to it.
    ///
    /// Registration happens before this returns, so a path that cannot be
    /// watched is reported here and no thread is left behind.
    pub fn spawn<B, P>(store: Arc<CatalogStore<B>>, path: P) -> Result<Self, WatchError>
    where
        B: StorageBackend + 'static,
        P: AsRef<Path>,
    {
        let path = absolute(path.as_ref())?;
        let file_name = path
            .file_name()
            .map(OsString::from)
            .ok_or_else(|| WatchError::Registration {
                path: path.clone(),
                source: notify::Error::generic("backing file path has no file name"),
            })?;
        let directory = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("/"));

        let (control, messages) = mpsc::channel();
        let events = control.clone();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let _ = events.send(WatchMessage::Event(res));
        })
        .map_err(|source| WatchError::Registration {
            path: path.clone(),
            source,
        })?;
        watcher
            .watch(&directory, RecursiveMode::NonRecursive)
            .map_err(|source| WatchError::Registration {
                path: path.clone(),
                source,
            })?;

        log::info!("watching {} for external changes", path.display());

        let handle = thread::Builder::new()
            .name("catalog-watcher".into())
            .spawn(move || run(store, watcher, messages, file_name))?;

        Ok(Self {
            path,
            control,
            handle: Some(handle),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stops the watcher thread and waits for it to exit.
    pub fn shutdown(mut self) {
        let _ = self.control.send(WatchMessage::Shutdown);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("catalog watcher thread panicked");
            }
        }
    }
}

impl Drop for ChangeWatcher {
    fn drop(&mut self) {
        let _ = self.control.send(WatchMessage::Shutdown);
    }
}

fn run<B: StorageBackend>(
    store: Arc<CatalogStore<B>>,
    _watcher: RecommendedWatcher,
    messages: Receiver<WatchMessage>,
    file_name: OsString,
) {
    for message in messages {
        match message {
            WatchMessage::Shutdown => break,
            WatchMessage::Event(Ok(event)) => {
                if !is_write(&event.kind) || !touches(&event, &file_name) {
                    continue;
                }
                match store.load() {
                    Ok(count) => log::debug!("reloaded {count} entries after file change"),
                    Err(err) => log::warn!("keeping last good catalog: {err}"),
                }
            }
            WatchMessage::Event(Err(err)) => log::warn!("file watcher error: {err}"),
        }
    }
    log::debug!("catalog watcher stopped");
}

fn is_write(kind: &EventKind) -> bool {
    match kind {
        EventKind::Create(_) => true,
        EventKind::Modify(ModifyKind::Metadata(_)) => false,
        EventKind::Modify(_) => true,
        EventKind::Access(AccessKind::Close(AccessMode::Write)) => true,
        _ => false,
    }
}

fn touches(event: &Event, file_name: &OsString) -> bool {
    event
        .paths
        .iter()
        .any(|path| path.file_name() == Some(file_name.as_os_str()))
}

fn absolute(path: &Path) -> std::io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}
