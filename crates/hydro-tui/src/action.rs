//! All possible UI actions. Actions are the sole mechanism for state mutation.

use std::sync::Arc;

use hydro_core::{
    AssignOutcome, AssignmentRequest, DeviceSnapshot, RefreshHealth, RenameError, RenameRequest,
};

#[derive(Debug, Clone)]
pub enum Action {
    // ── Lifecycle ──
    Quit,
    Tick,
    Render,
    ToggleHelp,

    // ── Refresh loop ──
    SnapshotReceived(Arc<DeviceSnapshot>),
    HealthUpdated(RefreshHealth),

    // ── Assignment ──
    SubmitAssignment(AssignmentRequest),
    AssignmentFinished(AssignOutcome),

    // ── Rename ──
    SubmitRename(RenameRequest),
    RenameSucceeded(RenameRequest),
    RenameFailed(RenameError),
}
