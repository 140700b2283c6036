// ── Device snapshot ──

use chrono::{DateTime, Utc};

use super::node::Node;

/// One complete, self-consistent node list from a single status fetch.
///
/// Always a full replacement of whatever was displayed before; node order
/// is the hub's (discovery order) and is preserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSnapshot {
    pub nodes: Vec<Node>,
    pub fetched_at: DateTime<Utc>,
}

impl DeviceSnapshot {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self {
            nodes,
            fetched_at: Utc::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
