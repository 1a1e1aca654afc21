// Hub context: per-community biographies of hub nodes for the summarizer.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::types::{CommunityId, EdgeKind, HubMap, NodeId, WeightedProjection};

/// Biography used when a hub has no text.
pub const UNKNOWN_ENTITY: &str = "Unknown Entity";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationDirection {
    /// The hub is the edge source.
    Outgoing,
    /// The hub is the edge target.
    Incoming,
}

/// One projected edge touching a hub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub direction: RelationDirection,
    pub peer: NodeId,
    pub kind: EdgeKind,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubProfile {
    pub node_id: NodeId,
    pub biography: String,
    pub rank: u32,
    pub relationships: Vec<Relationship>,
}

/// Micro community → hub profiles in rank order.
pub type ContextMap = BTreeMap<CommunityId, Vec<HubProfile>>;

struct PeerLabel<'a>(&'a BTreeMap<NodeId, String>, NodeId);

impl fmt::Display for PeerLabel<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.get(&self.1) {
            Some(text) => f.write_str(text),
            None => write!(f, "Node_{}", self.1),
        }
    }
}

/// Describe every hub through its text and its incident projected edges.
pub fn build_context(
    hubs: &HubMap,
    projection: &WeightedProjection,
    attributes: &BTreeMap<NodeId, String>,
) -> ContextMap {
    let mut incident: HashMap<NodeId, Vec<usize>> = HashMap::new();
    for (idx, edge) in projection.edges().iter().enumerate() {
        incident.entry(edge.source).or_default().push(idx);
        if edge.target != edge.source {
            incident.entry(edge.target).or_default().push(idx);
        }
    }

    let context: ContextMap = hubs
        .iter()
        .map(|(&community, rankings)| {
            let profiles = rankings
                .iter()
                .map(|hub| HubProfile {
                    node_id: hub.node_id,
                    biography: attributes
                        .get(&hub.node_id)
                        .cloned()
                        .unwrap_or_else(|| UNKNOWN_ENTITY.to_string()),
                    rank: hub.rank,
                    relationships: incident
                        .get(&hub.node_id)
                        .map(|edges| {
                            edges
                                .iter()
                                .map(|&idx| describe(projection, idx, hub.node_id, attributes))
                                .collect()
                        })
                        .unwrap_or_default(),
                })
                .collect();
            (community, profiles)
        })
        .collect();

    info!(
        communities = context.len(),
        profiles = context.values().map(Vec::len).sum::<usize>(),
        "Hub context built"
    );
    context
}

fn describe(
    projection: &WeightedProjection,
    idx: usize,
    hub: NodeId,
    attributes: &BTreeMap<NodeId, String>,
) -> Relationship {
    let edge = &projection.edges()[idx];
    if edge.source == hub {
        Relationship {
            direction: RelationDirection::Outgoing,
            peer: edge.target,
            kind: edge.kind,
            description: format!(
                "Maintains a '{}' relationship with: {}",
                edge.kind,
                PeerLabel(attributes, edge.target)
            ),
        }
    } else {
        Relationship {
            direction: RelationDirection::Incoming,
            peer: edge.source,
            kind: edge.kind,
            description: format!(
                "Is influenced by: {} (Type: {})",
                PeerLabel(attributes, edge.source),
                edge.kind
            ),
        }
    }
}
