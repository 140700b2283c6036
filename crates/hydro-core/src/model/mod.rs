// ── Domain model ──
//
// Canonical types the dashboard works with, independent of the wire
// format in `hydro-api`.

pub mod node;
pub mod snapshot;

pub use node::{AssignRole, DeviceType, Node, NodeId, NodeStatus};
pub use snapshot::DeviceSnapshot;
