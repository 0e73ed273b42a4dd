use std::thread::{self, JoinHandle};

use signal_hook::consts::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::Signals;
use tokio::sync::oneshot;

use crate::error::Result;

pub struct SignalManager {
    _handle: JoinHandle<()>,
}

#[derive(Debug)]
pub struct ShutdownSignal {
    receiver: oneshot::Receiver<()>,
}

impl ShutdownSignal {
    pub async fn wait(self) {
        let _ = self.receiver.await;
    }
}

impl SignalManager {
    /// Spawns the signal thread. Termination signals resolve the returned
    /// [`ShutdownSignal`]; `SIGHUP` runs `on_reload` and keeps listening.
    pub fn install<F>(on_reload: F) -> Result<(Self, ShutdownSignal)>
    where
        F: Fn() + Send + 'static,
    {
        let signals = Signals::new([SIGTERM, SIGINT, SIGQUIT, SIGHUP])?;
        let (tx, rx) = oneshot::channel();

        let handle = thread::Builder::new()
            .name("catalogd-signals".into())
            .spawn(move || {
                let mut signals = signals;
                let mut tx = Some(tx);
                for sig in signals.forever() {
                    match sig {
                        SIGTERM | SIGINT | SIGQUIT => {
                            log::info!("received signal {sig}; initiating shutdown");
                            if let Some(sender) = tx.take() {
                                let _ = sender.send(());
                            }
                            break;
                        }
                        SIGHUP => {
                            log::info!("received SIGHUP; reloading catalog");
                            on_reload();
                        }
                        _ => {}
                    }
                }
            })?;

        Ok((Self { _handle: handle }, ShutdownSignal { receiver: rx }))
    }
}
