// ── Render engine ──
//
// Single-owner view model of the dashboard: the node table plus the
// reservoir and well selection lists. Rebuilt wholesale from every
// snapshot; no diffing against the previous render.

use chrono::{DateTime, Local, TimeZone, Utc};
use tracing::trace;

use crate::model::{AssignRole, DeviceSnapshot, DeviceType, Node, NodeId, NodeStatus};

/// Text shown in the name column of a node that has no name yet.
pub const PLACEHOLDER_NAME: &str = "Undefined";

/// Text shown when a node has never reported a usable `lastSeen`.
const UNKNOWN_TIME: &str = "—";

/// Content of the display-name column.
///
/// Front-ends style the two variants differently so a placeholder can
/// never be mistaken for a real name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameCell {
    Named(String),
    Placeholder,
}

impl NameCell {
    pub fn from_name(name: &str) -> Self {
        if name.is_empty() {
            Self::Placeholder
        } else {
            Self::Named(name.to_owned())
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::Placeholder => PLACEHOLDER_NAME,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder)
    }
}

/// One rendered table row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRow {
    pub name: NameCell,
    pub id: NodeId,
    pub device_type: DeviceType,
    pub status: String,
    pub health: NodeStatus,
    pub rssi: i32,
    /// Local wall-clock time of `lastSeen`, `HH:MM:SS`.
    pub last_seen: String,
    /// Reservoir → well link, shown in the detail line.
    pub assigned_to: Option<String>,
}

impl NodeRow {
    /// Target of this row's rename action.
    pub fn rename_target(&self) -> &NodeId {
        &self.id
    }
}

/// One option of a selection list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub label: String,
    pub value: NodeId,
}

/// A role selection list (reservoirs or wells), in snapshot order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectList {
    options: Vec<SelectOption>,
}

impl SelectList {
    pub fn options(&self) -> &[SelectOption] {
        &self.options
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&SelectOption> {
        self.options.get(index)
    }

    /// Index of the option whose value is `id`.
    pub fn position(&self, id: &NodeId) -> Option<usize> {
        self.options.iter().position(|o| &o.value == id)
    }

    fn clear(&mut self) {
        self.options.clear();
    }

    fn push(&mut self, node: &Node) {
        self.options.push(SelectOption {
            label: node.option_label(),
            value: node.id.clone(),
        });
    }
}

/// Owner of everything the dashboard displays.
#[derive(Debug, Clone, Default)]
pub struct RenderEngine {
    rows: Vec<NodeRow>,
    reservoirs: SelectList,
    wells: SelectList,
}

impl RenderEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the table and both lists with the contents of `snapshot`.
    ///
    /// After this returns, rows and options reflect `snapshot` exactly,
    /// in snapshot order. Calling it twice with the same snapshot yields
    /// the same state.
    pub fn render(&mut self, snapshot: &DeviceSnapshot) {
        self.render_in(snapshot, &Local);
    }

    fn render_in<Tz: TimeZone>(&mut self, snapshot: &DeviceSnapshot, tz: &Tz)
    where
        Tz::Offset: std::fmt::Display,
    {
        self.rows.clear();
        self.reservoirs.clear();
        self.wells.clear();

        for node in &snapshot.nodes {
            self.rows.push(NodeRow {
                name: NameCell::from_name(&node.name),
                id: node.id.clone(),
                device_type: node.device_type.clone(),
                status: node.status.clone(),
                health: node.health(),
                rssi: node.rssi,
                last_seen: format_last_seen(node.last_seen, tz),
                assigned_to: node.assigned_to.clone(),
            });

            match node.device_type.role() {
                Some(AssignRole::Reservoir) => self.reservoirs.push(node),
                Some(AssignRole::Well) => self.wells.push(node),
                None => {}
            }
        }

        trace!(
            rows = self.rows.len(),
            reservoirs = self.reservoirs.len(),
            wells = self.wells.len(),
            "rendered snapshot"
        );
    }

    /// Replace the name cell of the row whose id is `id`.
    ///
    /// Returns `false` (and changes nothing) when no such row is rendered.
    /// Selection-list labels are left alone until the next render.
    pub fn patch_display_name(&mut self, id: &NodeId, name: &str) -> bool {
        match self.rows.iter_mut().find(|row| &row.id == id) {
            Some(row) => {
                row.name = NameCell::Named(name.to_owned());
                true
            }
            None => false,
        }
    }

    pub fn rows(&self) -> &[NodeRow] {
        &self.rows
    }

    pub fn row(&self, id: &NodeId) -> Option<&NodeRow> {
        self.rows.iter().find(|row| &row.id == id)
    }

    pub fn reservoir_options(&self) -> &SelectList {
        &self.reservoirs
    }

    pub fn well_options(&self) -> &SelectList {
        &self.wells
    }

    pub fn options(&self, role: AssignRole) -> &SelectList {
        match role {
            AssignRole::Reservoir => &self.reservoirs,
            AssignRole::Well => &self.wells,
        }
    }
}

fn format_last_seen<Tz: TimeZone>(last_seen: Option<DateTime<Utc>>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    last_seen.map_or_else(
        || UNKNOWN_TIME.to_owned(),
        |dt| dt.with_timezone(tz).format("%H:%M:%S").to_string(),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn node(id: &str, name: &str, device_type: DeviceType) -> Node {
        Node {
            id: NodeId::from(id),
            name: name.into(),
            device_type,
            status: "ok".into(),
            rssi: -40,
            last_seen: DateTime::from_timestamp(3_600 * 13 + 62, 0),
            assigned_to: None,
        }
    }

    fn mixed_snapshot() -> DeviceSnapshot {
        DeviceSnapshot::new(vec![
            node("W1", "North well", DeviceType::WellguardPro),
            node("R1", "", DeviceType::AquaReservPro),
            node("X1", "Gateway", DeviceType::Other("Unknown".into())),
            node("R2", "Tank B", DeviceType::AquaReservPro),
        ])
    }

    fn labels(list: &SelectList) -> Vec<&str> {
        list.options().iter().map(|o| o.label.as_str()).collect()
    }

    #[test]
    fn one_row_per_node_in_snapshot_order() {
        let mut engine = RenderEngine::new();
        engine.render(&mixed_snapshot());

        let ids: Vec<_> = engine.rows().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["W1", "R1", "X1", "R2"]);
    }

    #[test]
    fn empty_name_renders_placeholder() {
        let mut engine = RenderEngine::new();
        engine.render(&mixed_snapshot());

        let unnamed = engine.row(&NodeId::from("R1")).unwrap();
        assert!(unnamed.name.is_placeholder());
        assert_eq!(unnamed.name.text(), PLACEHOLDER_NAME);

        let named = engine.row(&NodeId::from("W1")).unwrap();
        assert_eq!(named.name, NameCell::Named("North well".into()));
    }

    #[test]
    fn lists_hold_only_their_device_class() {
        let mut engine = RenderEngine::new();
        engine.render(&mixed_snapshot());

        assert_eq!(labels(engine.reservoir_options()), ["R1", "Tank B (R2)"]);
        assert_eq!(labels(engine.well_options()), ["North well (W1)"]);
        assert!(engine.reservoir_options().position(&NodeId::from("X1")).is_none());
        assert!(engine.well_options().position(&NodeId::from("X1")).is_none());
        // Unrecognized devices still get a table row.
        assert!(engine.row(&NodeId::from("X1")).is_some());
    }

    #[test]
    fn option_values_are_ids() {
        let mut engine = RenderEngine::new();
        engine.render(&mixed_snapshot());
        let values: Vec<_> = engine
            .reservoir_options()
            .options()
            .iter()
            .map(|o| o.value.as_str())
            .collect();
        assert_eq!(values, ["R1", "R2"]);
    }

    #[test]
    fn render_is_idempotent() {
        let snapshot = mixed_snapshot();
        let mut engine = RenderEngine::new();
        let state = |engine: &RenderEngine| {
            (
                engine.rows().to_vec(),
                engine.reservoir_options().clone(),
                engine.well_options().clone(),
            )
        };

        engine.render(&snapshot);
        let first = state(&engine);
        engine.render(&snapshot);
        assert_eq!(first, state(&engine));
    }

    #[test]
    fn render_replaces_previous_contents() {
        let mut engine = RenderEngine::new();
        engine.render(&mixed_snapshot());
        engine.render(&DeviceSnapshot::new(vec![node("W9", "", DeviceType::WellguardPro)]));

        assert_eq!(engine.rows().len(), 1);
        assert!(engine.reservoir_options().is_empty());
        assert_eq!(labels(engine.well_options()), ["W9"]);
    }

    #[test]
    fn single_unnamed_reservoir() {
        let mut engine = RenderEngine::new();
        engine.render(&DeviceSnapshot::new(vec![node("N1", "", DeviceType::AquaReservPro)]));

        assert_eq!(engine.rows().len(), 1);
        assert!(engine.rows()[0].name.is_placeholder());
        assert_eq!(labels(engine.reservoir_options()), ["N1"]);
        assert!(engine.well_options().is_empty());
    }

    #[test]
    fn patch_updates_matching_row_only() {
        let mut engine = RenderEngine::new();
        engine.render(&mixed_snapshot());

        assert!(engine.patch_display_name(&NodeId::from("R1"), "Tank A"));
        assert_eq!(engine.row(&NodeId::from("R1")).unwrap().name.text(), "Tank A");
        assert_eq!(engine.row(&NodeId::from("R2")).unwrap().name.text(), "Tank B");
        // Lists wait for the next render.
        assert_eq!(labels(engine.reservoir_options())[0], "R1");
    }

    #[test]
    fn patch_unknown_row_is_a_no_op() {
        let mut engine = RenderEngine::new();
        engine.render(&mixed_snapshot());
        let before = engine.rows().to_vec();

        assert!(!engine.patch_display_name(&NodeId::from("GONE"), "Tank Z"));
        assert_eq!(engine.rows(), before.as_slice());
    }

    #[test]
    fn last_seen_formats_as_clock_time() {
        let mut engine = RenderEngine::new();
        engine.render_in(&mixed_snapshot(), &Utc);
        assert_eq!(engine.rows()[0].last_seen, "13:01:02");

        let mut missing = node("Z", "", DeviceType::WellguardPro);
        missing.last_seen = None;
        engine.render_in(&DeviceSnapshot::new(vec![missing]), &Utc);
        assert_eq!(engine.rows()[0].last_seen, UNKNOWN_TIME);
    }
}
