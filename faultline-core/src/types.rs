use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use petgraph::graph::{DiGraph, NodeIndex};
use serde::de::{self, Unexpected, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ── Typed ID wrappers ──────────────────────────────────────────────

/// Stable identifier of a knowledge-graph node.
///
/// Artifacts carry node ids as string-encoded integers (`"101"`); the
/// deserializer also accepts bare JSON integers and integral floats such as
/// `"101.0"` written by dataframe tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub i64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for NodeId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Raised when a node id string is neither an integer nor an integral float.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid node id: {0:?}")]
pub struct ParseNodeIdError(pub String);

impl FromStr for NodeId {
    type Err = ParseNodeIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(id) = trimmed.parse::<i64>() {
            return Ok(Self(id));
        }
        trimmed
            .parse::<f64>()
            .ok()
            .and_then(integral_f64)
            .map(Self)
            .ok_or_else(|| ParseNodeIdError(s.to_string()))
    }
}

#[allow(clippy::cast_possible_truncation)]
fn integral_f64(v: f64) -> Option<i64> {
    // 2^53: beyond this f64 no longer represents every integer.
    const MAX_EXACT: f64 = 9_007_199_254_740_992.0;
    (v.is_finite() && v.fract() == 0.0 && v.abs() <= MAX_EXACT).then_some(v as i64)
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct NodeIdVisitor;

        impl Visitor<'_> for NodeIdVisitor {
            type Value = NodeId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an integer or a string-encoded integer node id")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<NodeId, E> {
                Ok(NodeId(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<NodeId, E> {
                i64::try_from(v)
                    .map(NodeId)
                    .map_err(|_| E::invalid_value(Unexpected::Unsigned(v), &self))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<NodeId, E> {
                integral_f64(v)
                    .map(NodeId)
                    .ok_or_else(|| E::invalid_value(Unexpected::Float(v), &self))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<NodeId, E> {
                v.parse()
                    .map_err(|_| E::invalid_value(Unexpected::Str(v), &self))
            }
        }

        deserializer.deserialize_any(NodeIdVisitor)
    }
}

/// Community identifier as emitted by the community detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommunityId(pub u32);

impl fmt::Display for CommunityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for CommunityId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

// ── Projection ─────────────────────────────────────────────────────

/// Origin of a projected edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    /// Causal link from the knowledge graph.
    Structural,
    /// Embedding-similarity link between two nodes.
    Semantic,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Structural => "structural",
            Self::Semantic => "semantic",
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EdgeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "structural" => Ok(Self::Structural),
            "semantic" => Ok(Self::Semantic),
            other => Err(format!("unknown edge type: {other}")),
        }
    }
}

/// One weighted, typed edge of the fused projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedEdge {
    pub source: NodeId,
    pub target: NodeId,
    /// Always finite and non-negative.
    pub weight: f64,
    #[serde(rename = "type")]
    pub kind: EdgeKind,
}

/// Ordered edge list fusing structural and semantic signals.
///
/// A pair may appear once per [`EdgeKind`]. Immutable once built; every
/// downstream stage reads it by reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightedProjection {
    edges: Vec<ProjectedEdge>,
}

impl WeightedProjection {
    pub fn new(edges: Vec<ProjectedEdge>) -> Self {
        Self { edges }
    }

    pub fn edges(&self) -> &[ProjectedEdge] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Number of edges of the given kind.
    pub fn count_kind(&self, kind: EdgeKind) -> usize {
        self.edges.iter().filter(|e| e.kind == kind).count()
    }

    /// Copy with weights rounded to the persisted precision, so in-memory
    /// stages see exactly what a reload of the CSV artifact would.
    pub fn rounded(&self) -> Self {
        Self::new(
            self.edges
                .iter()
                .map(|e| ProjectedEdge {
                    weight: crate::contracts::round_weight(e.weight),
                    ..e.clone()
                })
                .collect(),
        )
    }

    /// Node ids in first-seen order (source before target, edge by edge).
    pub fn node_ids(&self) -> Vec<NodeId> {
        let mut seen = std::collections::HashSet::new();
        let mut ids = Vec::new();
        for edge in &self.edges {
            for id in [edge.source, edge.target] {
                if seen.insert(id) {
                    ids.push(id);
                }
            }
        }
        ids
    }
}

// ── In-memory graph ────────────────────────────────────────────────

/// A petgraph `DiGraph` built from projected edges, with `NodeId` → `NodeIndex` mapping.
///
/// Only nodes incident to at least one edge exist in the graph; node indices
/// follow first-seen order over the edge list.
#[derive(Debug, Clone, Default)]
pub struct ProjectionGraph {
    pub graph: DiGraph<NodeId, f64>,
    pub node_to_index: HashMap<NodeId, NodeIndex>,
}

impl ProjectionGraph {
    pub fn from_edges<'a>(edges: impl IntoIterator<Item = &'a ProjectedEdge>) -> Self {
        let mut graph = DiGraph::<NodeId, f64>::new();
        let mut node_to_index: HashMap<NodeId, NodeIndex> = HashMap::new();

        for edge in edges {
            let src = *node_to_index
                .entry(edge.source)
                .or_insert_with(|| graph.add_node(edge.source));
            let tgt = *node_to_index
                .entry(edge.target)
                .or_insert_with(|| graph.add_node(edge.target));
            graph.add_edge(src, tgt, edge.weight);
        }

        Self {
            graph,
            node_to_index,
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Node ids in index order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.graph.node_indices().map(|idx| self.graph[idx])
    }
}

impl From<&WeightedProjection> for ProjectionGraph {
    fn from(projection: &WeightedProjection) -> Self {
        Self::from_edges(projection.edges())
    }
}

// ── Communities ────────────────────────────────────────────────────

/// Two-level compatibility view of a node's hierarchy path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommunityAssignment {
    pub macro_community: CommunityId,
    pub micro_community: CommunityId,
}

/// Flattened node → (macro, micro) assignment consumed by every analysis.
pub type Assignment = BTreeMap<NodeId, CommunityAssignment>;

/// A node's community ids across all resolution levels, coarsest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyPath {
    pub path: Vec<CommunityId>,
}

impl HierarchyPath {
    /// Coarsest-level community.
    pub fn macro_community(&self) -> Option<CommunityId> {
        self.path.first().copied()
    }

    /// Finest-level community.
    pub fn micro_community(&self) -> Option<CommunityId> {
        self.path.last().copied()
    }

    pub fn compat(&self) -> Option<CommunityAssignment> {
        Some(CommunityAssignment {
            macro_community: self.macro_community()?,
            micro_community: self.micro_community()?,
        })
    }
}

/// One community-detection pass at a fixed resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "LevelRecord", into = "LevelRecord")]
pub struct ResolutionLevel {
    pub resolution: f64,
    pub membership: BTreeMap<NodeId, CommunityId>,
    pub communities: BTreeMap<CommunityId, Vec<NodeId>>,
}

impl ResolutionLevel {
    /// Build a level from memberships given in node order; the inverse
    /// grouping keeps that order within each community.
    pub fn from_membership(
        resolution: f64,
        ordered: impl IntoIterator<Item = (NodeId, CommunityId)>,
    ) -> Self {
        let mut membership = BTreeMap::new();
        let mut communities: BTreeMap<CommunityId, Vec<NodeId>> = BTreeMap::new();
        for (node, community) in ordered {
            membership.insert(node, community);
            communities.entry(community).or_default().push(node);
        }
        Self {
            resolution,
            membership,
            communities,
        }
    }

    pub fn community_count(&self) -> usize {
        self.communities.len()
    }
}

/// Persisted shape of a level: the membership map is derived on load.
#[derive(Serialize, Deserialize)]
struct LevelRecord {
    resolution: f64,
    communities: BTreeMap<CommunityId, Vec<NodeId>>,
}

impl From<LevelRecord> for ResolutionLevel {
    fn from(record: LevelRecord) -> Self {
        let membership = record
            .communities
            .iter()
            .flat_map(|(&c, nodes)| nodes.iter().map(move |&n| (n, c)))
            .collect();
        Self {
            resolution: record.resolution,
            membership,
            communities: record.communities,
        }
    }
}

impl From<ResolutionLevel> for LevelRecord {
    fn from(level: ResolutionLevel) -> Self {
        Self {
            resolution: level.resolution,
            communities: level.communities,
        }
    }
}

/// Resolution levels ordered by ascending resolution (coarse first).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommunityTree {
    pub levels: Vec<ResolutionLevel>,
}

impl CommunityTree {
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    pub fn resolutions(&self) -> Vec<f64> {
        self.levels.iter().map(|l| l.resolution).collect()
    }
}

/// Output of hierarchical partitioning: per-node paths plus the level tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Hierarchy {
    pub paths: BTreeMap<NodeId, HierarchyPath>,
    pub tree: CommunityTree,
}

impl Hierarchy {
    /// Flattened two-level view: `path[0]` as macro, `path[last]` as micro.
    pub fn assignment(&self) -> Assignment {
        self.paths
            .iter()
            .filter_map(|(&node, path)| path.compat().map(|c| (node, c)))
            .collect()
    }
}

// ── Derived analyses ───────────────────────────────────────────────

/// Cross-community edge counts for one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeScore {
    pub node_id: NodeId,
    pub macro_score: u32,
    pub micro_score: u32,
}

/// Which level a migrated node moved at. Macro wins when both changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DriftType {
    Macro,
    Micro,
}

/// A node whose community changed between baseline and current.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigratedNode {
    pub node_id: NodeId,
    pub from_macro: CommunityId,
    pub to_macro: CommunityId,
    pub from_micro: CommunityId,
    pub to_micro: CommunityId,
    pub drift_type: DriftType,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DriftSummary {
    pub total_nodes: usize,
    pub drift_count: usize,
    /// `1 - drift_count / total_nodes`, or `0.0` for an empty union.
    pub stability_index: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DriftReport {
    pub stable_nodes: Vec<NodeId>,
    pub migrated_nodes: Vec<MigratedNode>,
    pub new_nodes: Vec<NodeId>,
    /// Present only in the baseline. Counted in `total_nodes`, not in `drift_count`.
    #[serde(default)]
    pub removed_nodes: Vec<NodeId>,
    pub summary: DriftSummary,
}

/// Hex SHA-256 of a community's sorted member list, per level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprints {
    pub macro_communities: BTreeMap<CommunityId, String>,
    pub micro_communities: BTreeMap<CommunityId, String>,
}

/// One hub entry within a community; rank 1 is the most central.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubRanking {
    pub node_id: NodeId,
    pub score: f64,
    pub rank: u32,
}

/// Micro community → ordered hub rankings.
pub type HubMap = BTreeMap<CommunityId, Vec<HubRanking>>;

// ── Tests ──────────────────────────────────────────────────────────
