// ── Node domain types ──

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// Stable node identifier, the only reliable join key between renders.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for NodeId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

/// Device class reported by the hub.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DeviceType {
    /// Reservoir level controller.
    AquaReservPro,
    /// Well pump guard.
    WellguardPro,
    /// Anything else; keeps the hub's label (typically `"Unknown"`).
    Other(String),
}

impl DeviceType {
    pub fn from_label(label: &str) -> Self {
        match label {
            "AquaReservPro" => Self::AquaReservPro,
            "WellguardPro" => Self::WellguardPro,
            other => Self::Other(other.to_owned()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::AquaReservPro => "AquaReservPro",
            Self::WellguardPro => "WellguardPro",
            Self::Other(label) => label,
        }
    }

    /// Assignment role this device class can fill, if any.
    ///
    /// Unrecognized classes have no role and never appear in a
    /// selection list.
    pub fn role(&self) -> Option<AssignRole> {
        match self {
            Self::AquaReservPro => Some(AssignRole::Reservoir),
            Self::WellguardPro => Some(AssignRole::Well),
            Self::Other(_) => None,
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Logical role in a reservoir ← well assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum AssignRole {
    Reservoir,
    Well,
}

impl AssignRole {
    /// Form field name expected by `POST /api/assign`.
    pub fn field_name(self) -> &'static str {
        match self {
            Self::Reservoir => "reservoir",
            Self::Well => "well",
        }
    }
}

/// Coarse health class derived from the free-form status string.
/// Used for styling only; the raw status is always displayed as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum NodeStatus {
    Online,
    Pending,
    Offline,
}

impl NodeStatus {
    pub fn classify(status: &str) -> Self {
        if status.eq_ignore_ascii_case("DISCONNECTED") {
            Self::Offline
        } else if status.eq_ignore_ascii_case("Discovered") || status.is_empty() {
            Self::Pending
        } else {
            Self::Online
        }
    }
}

/// One field device as reported in a status snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: NodeId,
    /// Operator-assigned name; empty when never set.
    pub name: String,
    pub device_type: DeviceType,
    pub status: String,
    pub rssi: i32,
    pub last_seen: Option<DateTime<Utc>>,
    /// For a reservoir, the well it is assigned to.
    pub assigned_to: Option<String>,
}

impl Node {
    /// The operator-assigned name, if one is set.
    pub fn display_name(&self) -> Option<&str> {
        if self.name.is_empty() {
            None
        } else {
            Some(&self.name)
        }
    }

    /// Selection-list label: `"{name} ({id})"` when named, else the id.
    pub fn option_label(&self) -> String {
        match self.display_name() {
            Some(name) => format!("{name} ({})", self.id),
            None => self.id.to_string(),
        }
    }

    pub fn health(&self) -> NodeStatus {
        NodeStatus::classify(&self.status)
    }
}
