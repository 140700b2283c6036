// ── Wire → domain conversion ──
//
// Maps `hydro-api` wire models onto the canonical domain types. Lossy in
// one direction only: an unparsable `lastSeen` becomes `None` instead of
// failing the whole snapshot.

use chrono::{DateTime, Utc};
use hydro_api::{NodeRecord, RawTimestamp, StatusResponse};

use crate::model::{DeviceSnapshot, DeviceType, Node, NodeId};

impl From<NodeRecord> for Node {
    fn from(raw: NodeRecord) -> Self {
        let last_seen = raw.last_seen.as_ref().and_then(parse_timestamp);
        if raw.last_seen.is_some() && last_seen.is_none() {
            tracing::debug!(id = %raw.id, "unparsable lastSeen, showing as unknown");
        }

        Node {
            id: NodeId::from(raw.id),
            name: raw.name,
            device_type: DeviceType::from_label(&raw.node_type),
            status: raw.status,
            rssi: raw.rssi,
            last_seen,
            assigned_to: raw.assigned_to.filter(|a| !a.is_empty()),
        }
    }
}

impl From<StatusResponse> for DeviceSnapshot {
    fn from(status: StatusResponse) -> Self {
        if let Some(count) = status.node_count {
            if usize::try_from(count).ok() != Some(status.nodes.len()) {
                tracing::debug!(
                    reported = count,
                    listed = status.nodes.len(),
                    "hub nodeCount disagrees with node list"
                );
            }
        }
        DeviceSnapshot::new(status.nodes.into_iter().map(Node::from).collect())
    }
}

/// Interpret `lastSeen` as an absolute instant.
///
/// Numbers are epoch milliseconds; strings are RFC 3339, or a bare
/// millisecond count sent as text.
pub fn parse_timestamp(raw: &RawTimestamp) -> Option<DateTime<Utc>> {
    match raw {
        RawTimestamp::Millis(ms) => DateTime::from_timestamp_millis(*ms),
        RawTimestamp::FractionalMillis(ms) => fractional_millis(*ms),
        RawTimestamp::Text(text) => {
            let text = text.trim();
            DateTime::parse_from_rfc3339(text)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
                .or_else(|| text.parse::<i64>().ok().and_then(DateTime::from_timestamp_millis))
        }
        RawTimestamp::Other(_) => None,
    }
}

#[allow(clippy::cast_possible_truncation)]
fn fractional_millis(ms: f64) -> Option<DateTime<Utc>> {
    // `as` saturates; chrono rejects the out-of-range result.
    if !ms.is_finite() {
        return None;
    }
    DateTime::from_timestamp_micros((ms * 1000.0).round() as i64)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn record(json: &str) -> NodeRecord {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn converts_record_fields() {
        let node = Node::from(record(
            r#"{"id":"AQ-1","name":"Tank A","type":"AquaReservPro","status":"OK","rssi":-55,"lastSeen":0,"assignedTo":"WG-1"}"#,
        ));
        assert_eq!(node.id.as_str(), "AQ-1");
        assert_eq!(node.device_type, DeviceType::AquaReservPro);
        assert_eq!(node.rssi, -55);
        assert_eq!(node.last_seen, DateTime::from_timestamp(0, 0));
        assert_eq!(node.assigned_to.as_deref(), Some("WG-1"));
    }

    #[test]
    fn empty_assignment_is_none() {
        let node = Node::from(record(r#"{"id":"AQ-1","assignedTo":""}"#));
        assert!(node.assigned_to.is_none());
    }

    #[test]
    fn unknown_type_is_kept_verbatim() {
        let node = Node::from(record(r#"{"id":"X","type":"Unknown"}"#));
        assert_eq!(node.device_type, DeviceType::Other("Unknown".into()));
    }

    #[test]
    fn parses_rfc3339_and_numeric_text() {
        let iso = parse_timestamp(&RawTimestamp::Text("2026-03-01T08:30:00+01:00".into())).unwrap();
        assert_eq!(iso.to_rfc3339(), "2026-03-01T07:30:00+00:00");

        let numeric = parse_timestamp(&RawTimestamp::Text("1500".into())).unwrap();
        assert_eq!(numeric.timestamp_millis(), 1500);

        assert!(parse_timestamp(&RawTimestamp::Text("yesterday".into())).is_none());
    }

    #[test]
    fn odd_last_seen_keeps_the_rest_of_the_snapshot() {
        let status: StatusResponse = serde_json::from_str(
            r#"{"nodes":[
                {"id":"A","name":null,"type":"AquaReservPro","lastSeen":1500.4},
                {"id":"B","name":"Tank B","type":"AquaReservPro","lastSeen":false},
                {"id":"C","name":"Tank C","type":"WellguardPro","lastSeen":5}
            ]}"#,
        )
        .unwrap();
        let snapshot = DeviceSnapshot::from(status);

        assert_eq!(snapshot.nodes.len(), 3);
        assert_eq!(snapshot.nodes[0].name, "");
        assert_eq!(snapshot.nodes[0].last_seen.unwrap().timestamp_millis(), 1500);
        assert!(snapshot.nodes[1].last_seen.is_none());
        assert_eq!(snapshot.nodes[2].last_seen, DateTime::from_timestamp_millis(5));
    }

    #[test]
    fn non_finite_fractional_millis_is_unknown() {
        assert!(parse_timestamp(&RawTimestamp::FractionalMillis(f64::NAN)).is_none());
        assert!(parse_timestamp(&RawTimestamp::FractionalMillis(1e300)).is_none());
    }

    #[test]
    fn snapshot_keeps_hub_order() {
        let status: StatusResponse = serde_json::from_str(
            r#"{"nodes":[{"id":"C"},{"id":"A"},{"id":"B"}]}"#,
        )
        .unwrap();
        let snapshot = DeviceSnapshot::from(status);
        let ids: Vec<_> = snapshot.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, ["C", "A", "B"]);
    }
}
