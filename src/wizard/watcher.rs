//! Background task feeding the "already claimed" signal into a wizard

use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::machine::ClaimWizard;
use crate::claim::ClaimProvider;

/// Handle returned by spawn_claimed_watcher for graceful shutdown
pub struct WatcherHandle {
    pub task_handle: tokio::task::JoinHandle<()>,
    pub shutdown_tx: watch::Sender<bool>,
}

impl WatcherHandle {
    /// Signal the watcher to stop
    pub fn shutdown(&self) {
        if let Err(e) = self.shutdown_tx.send(true) {
            warn!("Failed to send shutdown signal to claimed watcher: {}", e);
        }
    }
}

/// Subscribe `wizard` to its provider's "already claimed" signal.
///
/// The current value is applied before this returns. The task stops when
/// the provider drops its sender or the handle signals shutdown.
pub fn spawn_claimed_watcher<P>(wizard: ClaimWizard<P>) -> WatcherHandle
where
    P: ClaimProvider + 'static,
{
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    let mut claimed_rx = wizard.provider().subscribe_claimed();

    let initial = *claimed_rx.borrow_and_update();
    wizard.on_already_claimed(initial);

    let task_handle = tokio::spawn(async move {
        loop {
            tokio::select! {
                changed = claimed_rx.changed() => {
                    if changed.is_err() {
                        debug!("Claimed signal closed, stopping watcher");
                        break;
                    }
                    let claimed = *claimed_rx.borrow_and_update();
                    if let Some(step) = wizard.on_already_claimed(claimed) {
                        debug!("Claimed signal {} moved wizard to {:?}", claimed, step);
                    }
                }
                res = shutdown_rx.changed() => {
                    if res.is_err() || *shutdown_rx.borrow() {
                        info!("Claimed watcher received shutdown signal, stopping");
                        break;
                    }
                }
            }
        }
    });

    WatcherHandle {
        task_handle,
        shutdown_tx,
    }
}
