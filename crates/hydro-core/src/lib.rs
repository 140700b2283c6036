//! Dashboard logic between `hydro-api` and the terminal front-end.
//!
//! This crate owns the domain model and the synchronization loop of the
//! HydroControl GE hub dashboard:
//!
//! - **[`RefreshLoop`]**: fixed-period poller. Fetches a
//!   [`DeviceSnapshot`] immediately on start and then once per tick,
//!   publishing each successful snapshot through a `watch` channel. A slow
//!   or failed fetch never delays the next tick.
//!
//! - **[`RenderEngine`]**: single-owner view model of the node table and the
//!   reservoir / well selection lists, rebuilt wholesale from each
//!   snapshot. [`RenderEngine::patch_display_name`] is the one sanctioned
//!   edit outside a full render.
//!
//! - **[`AssignmentController`]** and **[`RenameController`]**: the two
//!   write paths. Neither forces a refresh; the next tick reconciles.
//!
//! - **[`StatusBanner`]**: auto-clearing status line for assignment replies.
//!
//! - **[`Dashboard`]**: facade wiring a [`StatusClient`] to all of the above
//!   from a [`DashboardConfig`].

pub mod assign;
pub mod backend;
pub mod banner;
pub mod config;
pub mod convert;
pub mod dashboard;
pub mod error;
pub mod model;
pub mod refresh;
pub mod render;
pub mod rename;

#[cfg(test)]
mod testing;

// ── Primary re-exports ──────────────────────────────────────────────
pub use assign::{AssignOutcome, AssignmentController, AssignmentRequest};
pub use backend::{HubBackend, StatusClient};
pub use banner::StatusBanner;
pub use config::{DashboardConfig, TlsVerification};
pub use dashboard::Dashboard;
pub use error::{AssignError, CoreError, FetchError, RenameError};
pub use model::{AssignRole, DeviceSnapshot, DeviceType, Node, NodeId, NodeStatus};
pub use refresh::{RefreshHandle, RefreshHealth, RefreshLoop};
pub use render::{NameCell, NodeRow, PLACEHOLDER_NAME, RenderEngine, SelectList, SelectOption};
pub use rename::{NamePrompt, RenameController, RenameRequest};
