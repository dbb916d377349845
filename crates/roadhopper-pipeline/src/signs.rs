//! Road sign attachment.
//!
//! Signs live on graph nodes. A segment that ends at a node with a sign
//! carries that sign, located at the segment's end coordinate.

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::types::{NodeId, RoadSegment, RoadSign, RoadSignKind};

/// Source of per-node sign information.
pub trait RoadSignLookup {
    /// Whether `node` is controlled by a traffic light.
    fn has_traffic_light(&self, node: NodeId) -> bool;

    /// Whether `node` carries a stop sign.
    fn has_stop_sign(&self, node: NodeId) -> bool;

    /// Any other sign at `node`, by label.
    fn other_sign(&self, _node: NodeId) -> Option<String> {
        None
    }

    /// The single sign to report for `node`.
    ///
    /// Traffic lights win over stop signs, which win over other signs.
    fn sign_at(&self, node: NodeId) -> Option<RoadSignKind> {
        if self.has_traffic_light(node) {
            Some(RoadSignKind::TrafficLight)
        } else if self.has_stop_sign(node) {
            Some(RoadSignKind::StopSign)
        } else {
            self.other_sign(node).map(RoadSignKind::Other)
        }
    }
}

/// In-memory sign lookup, loadable from JSON.
///
/// ```json
/// { "trafficLights": [12], "stopSigns": [40], "other": { "7": "giveWay" } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SignTable {
    /// Nodes with a traffic light.
    pub traffic_lights: BTreeSet<NodeId>,
    /// Nodes with a stop sign.
    pub stop_signs: BTreeSet<NodeId>,
    /// Nodes with some other labelled sign.
    pub other: BTreeMap<NodeId, String>,
}

impl SignTable {
    /// An empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of entries across all kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.traffic_lights.len() + self.stop_signs.len() + self.other.len()
    }

    /// Whether the table has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RoadSignLookup for SignTable {
    fn has_traffic_light(&self, node: NodeId) -> bool {
        self.traffic_lights.contains(&node)
    }

    fn has_stop_sign(&self, node: NodeId) -> bool {
        self.stop_signs.contains(&node)
    }

    fn other_sign(&self, node: NodeId) -> Option<String> {
        self.other.get(&node).cloned()
    }
}

/// Attach road signs to the segments that end at signed nodes.
///
/// Every segment's sign is recomputed from its end node, so a sign that
/// the lookup no longer reports is cleared. Geometry is left untouched
/// and applying the same lookup twice gives the same result.
#[must_use]
pub fn attach_signs<L: RoadSignLookup + ?Sized>(
    segments: &[RoadSegment],
    lookup: &L,
) -> Vec<RoadSegment> {
    let attached: Vec<RoadSegment> = segments
        .iter()
        .map(|segment| {
            let sign = segment.end_node.and_then(|node| {
                lookup.sign_at(node).map(|kind| {
                    trace!("{} at node {node}", kind.info());
                    RoadSign {
                        kind,
                        id: node,
                        coordinate: segment.end,
                    }
                })
            });
            segment.clone().with_road_sign(sign)
        })
        .collect();

    debug!(
        "attached {} road signs to {} segments",
        count_signs(&attached),
        attached.len()
    );
    attached
}

/// Number of segments carrying a sign.
#[must_use]
pub fn count_signs(segments: &[RoadSegment]) -> usize {
    segments.iter().filter(|s| s.road_sign.is_some()).count()
}
