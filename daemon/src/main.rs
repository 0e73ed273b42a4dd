mod catalog;
mod config;
mod display;
mod error;
mod forms;
mod logging;
mod server;
mod signals;

use std::sync::Arc;

use crate::catalog::{open_catalog, reload_catalog, start_watcher};
use crate::config::DaemonConfig;
use crate::error::Result;
use crate::logging::init_logging;
use crate::signals::SignalManager;

fn main() -> Result<()> {
    let cli_config = std::env::args().nth(1);
    let config = DaemonConfig::from_sources(cli_config.as_deref())?;

    init_logging(&config)?;

    let catalog = open_catalog(&config);
    let watcher = start_watcher(&config, &catalog);

    let reload_handle = Arc::clone(&catalog);
    let (_signal_manager, shutdown) = SignalManager::install(move || reload_catalog(&reload_handle))?;

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if let Some(threads) = config.server().worker_threads() {
        builder.worker_threads(threads);
    }
    let runtime = builder.build()?;

    log::info!("catalogd running with pid {}", std::process::id());

    let outcome = runtime.block_on(server::run(&config, catalog, shutdown));

    if let Some(watcher) = watcher {
        watcher.shutdown();
    }

    if let Err(err) = &outcome {
        crate::fatal!("catalogd terminated: {err}");
    }
    log::info!("catalogd stopped");
    outcome
}
