//! Data bridge: forwards the refresh loop's watch channels into TUI actions.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use hydro_core::{DeviceSnapshot, RefreshHealth};

use crate::action::Action;

/// Forward every published snapshot and health change until cancelled or
/// until the refresh loop goes away.
pub async fn spawn_data_bridge(
    mut snapshots: watch::Receiver<Option<Arc<DeviceSnapshot>>>,
    mut health: watch::Receiver<RefreshHealth>,
    action_tx: mpsc::UnboundedSender<Action>,
    cancel: CancellationToken,
) {
    // A snapshot may already be waiting if the first fetch beat us here.
    if let Some(snapshot) = snapshots.borrow_and_update().clone() {
        let _ = action_tx.send(Action::SnapshotReceived(snapshot));
    }
    let _ = action_tx.send(Action::HealthUpdated(health.borrow_and_update().clone()));

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => break,

            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let latest = snapshots.borrow_and_update().clone();
                if let Some(snapshot) = latest {
                    debug!(nodes = snapshot.len(), "dispatching SnapshotReceived");
                    let _ = action_tx.send(Action::SnapshotReceived(snapshot));
                }
            }
            changed = health.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = health.borrow_and_update().clone();
                let _ = action_tx.send(Action::HealthUpdated(current));
            }
        }
    }

    debug!("data bridge shut down");
}
