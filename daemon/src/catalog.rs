use std::sync::Arc;

use catalog_core::{CatalogStore, ChangeWatcher, FileBackend};

use crate::config::DaemonConfig;

pub type CatalogHandle = Arc<CatalogStore<FileBackend>>;

/// Opens the configured backing file. A missing or unreadable file yields an
/// empty catalog rather than an error.
pub fn open_catalog(config: &DaemonConfig) -> CatalogHandle {
    let path = &config.storage().data_file;
    log::info!("opening catalog at {}", path.display());
    Arc::new(CatalogStore::open(FileBackend::new(path)))
}

/// Starts the change watcher when enabled. Registration failures are logged
/// and the daemon carries on with the data loaded at startup.
pub fn start_watcher(config: &DaemonConfig, catalog: &CatalogHandle) -> Option<ChangeWatcher> {
    if !config.storage().watch {
        log::info!("file watching disabled");
        return None;
    }

    match ChangeWatcher::spawn(Arc::clone(catalog), &config.storage().data_file) {
        Ok(watcher) => Some(watcher),
        Err(err) => {
            log::error!("catalog watcher not started: {err}");
            None
        }
    }
}

/// Explicit refresh, used by SIGHUP.
pub fn reload_catalog(catalog: &CatalogHandle) {
    match catalog.load() {
        Ok(count) => log::info!("reloaded {count} entries"),
        Err(err) => log::warn!("reload failed, keeping current catalog: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_core::{Entry, StorageBackend};
    use tempfile::TempDir;

    fn config_for(dir: &TempDir, watch: bool) -> DaemonConfig {
        let mut config = DaemonConfig::default();
        config.storage.data_file = dir.path().join("sites.json");
        config.storage.watch = watch;
        config
    }

    #[test]
    fn open_catalog_loads_existing_file() {
        let dir = TempDir::new().unwrap();
        let config = config_for(&dir, false);
        FileBackend::new(&config.storage.data_file)
            .store(&[Entry::new("Alpha")])
            .unwrap();

        let catalog = open_catalog(&config);
        assert_eq!(catalog.len().unwrap(), 1);
        assert!(start_watcher(&config, &catalog).is_none());
    }

    #[test]
    fn watcher_failure_is_not_fatal() {
        let dir = TempDir::new().unwrap();
        let mut config = config_for(&dir, true);
        config.storage.data_file = dir.path().join("missing").join("sites.json");

        let catalog = open_catalog(&config);
        assert!(catalog.is_empty().unwrap());
        assert!(start_watcher(&config, &catalog).is_none());
    }

    #[test]
    fn reload_picks_up_new_content() {
        let dir = TempDir::new().unwrap();
        let config = config_for(&dir, false);
        let catalog = open_catalog(&config);
        assert!(catalog.is_empty().unwrap());

        FileBackend::new(&config.storage.data_file)
            .store(&[Entry::new("Alpha"), Entry::new("Beta")])
            .unwrap();
        reload_catalog(&catalog);

        assert_eq!(catalog.len().unwrap(), 2);
    }
}
