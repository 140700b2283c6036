// Wire models for the hub's HTTP API.
//
// These mirror the JSON exactly; `hydro-core` converts them into the
// canonical domain types.

use serde::{Deserialize, Deserializer, Serialize};

/// Body of `GET /api/status`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    /// Node count as reported by the hub. Informational; `nodes` is
    /// authoritative.
    #[serde(default)]
    pub node_count: Option<u32>,

    pub nodes: Vec<NodeRecord>,
}

/// One entry of the `nodes` array.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    pub id: String,

    /// Operator-assigned name. The hub sends `""` when unset.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,

    /// Device class label: `"AquaReservPro"`, `"WellguardPro"`, `"Unknown"`, ...
    #[serde(rename = "type", default, deserialize_with = "null_as_empty")]
    pub node_type: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub status: String,

    #[serde(default, deserialize_with = "lenient_rssi")]
    pub rssi: i32,

    #[serde(default)]
    pub last_seen: Option<RawTimestamp>,

    /// For a reservoir, the id of the well it draws from.
    #[serde(default)]
    pub assigned_to: Option<String>,
}

/// `lastSeen` as the hub may send it.
///
/// Never fails to decode: a value of an unexpected shape lands in `Other`
/// so one odd node cannot reject the whole status payload.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    /// Milliseconds since the Unix epoch.
    Millis(i64),
    /// Milliseconds since the Unix epoch, with a fractional part.
    FractionalMillis(f64),
    /// An RFC 3339 / ISO-8601 string.
    Text(String),
    /// Anything else (`true`, an object, ...).
    Other(serde_json::Value),
}

/// Treat an explicit `null` like a missing string field.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Shape the hub uses to report an internal failure from `/api/status`.
#[derive(Debug, Deserialize)]
pub(crate) struct HubErrorBody {
    pub error: String,
}

/// Body of `POST /api/set-name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SetNameRequest<'a> {
    pub id: &'a str,
    pub name: &'a str,
}

/// Reply to `POST /api/assign`: any HTTP status, plain-text body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignReply {
    pub status: u16,
    pub text: String,
}

impl AssignReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// RSSI in dBm; `null` or a non-integer reads as 0.
fn lenient_rssi<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_i64().and_then(|v| i32::try_from(v).ok()).unwrap_or_default())
}
