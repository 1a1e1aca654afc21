// Community detection (Louvain) with a resolution parameter.
//
// Graph algorithms intentionally cast int↔float.
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_lossless
)]

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::error::{AnalyzeError, Result};
use crate::types::{CommunityId, NodeId, ProjectionGraph};

/// Moves smaller than this are treated as ties so float noise cannot cycle.
const GAIN_EPSILON: f64 = 1e-12;

/// Partitions a projection graph at a given resolution.
///
/// The membership must cover every node of `graph`. Lower resolutions are
/// expected to yield coarser communities.
pub trait CommunityDetector: Send + Sync {
    /// Human-readable name for this detector.
    fn name(&self) -> &'static str;

    fn partition(
        &self,
        graph: &ProjectionGraph,
        resolution: f64,
    ) -> Result<BTreeMap<NodeId, CommunityId>>;
}

/// Deterministic Louvain over the undirected view of the projection,
/// optimising resolution-scaled modularity.
#[derive(Debug, Clone)]
pub struct LouvainDetector {
    /// Local-moving sweeps per aggregation pass.
    pub max_iterations: u32,
}

impl Default for LouvainDetector {
    fn default() -> Self {
        Self { max_iterations: 20 }
    }
}

impl CommunityDetector for LouvainDetector {
    fn name(&self) -> &'static str {
        "louvain"
    }

    fn partition(
        &self,
        graph: &ProjectionGraph,
        resolution: f64,
    ) -> Result<BTreeMap<NodeId, CommunityId>> {
        if !resolution.is_finite() || resolution < 0.0 {
            return Err(AnalyzeError::InvalidResolutions(format!(
                "resolution must be finite and >= 0, got {resolution}"
            ))
            .into());
        }

        let communities = louvain_communities(graph, resolution, self.max_iterations);
        Ok(graph
            .graph
            .node_indices()
            .map(|idx| (graph.graph[idx], CommunityId(communities[idx.index()])))
            .collect())
    }
}

// ── Working graph ──────────────────────────────────────────────────

/// Symmetric weighted adjacency; self-loop weight is kept apart.
struct WorkGraph {
    neighbors: Vec<BTreeMap<usize, f64>>,
    self_loops: Vec<f64>,
    degree: Vec<f64>,
}

impl WorkGraph {
    fn from_projection(graph: &ProjectionGraph) -> Self {
        let n = graph.node_count();
        let mut neighbors: Vec<BTreeMap<usize, f64>> = vec![BTreeMap::new(); n];
        let mut self_loops = vec![0.0; n];

        for edge_idx in graph.graph.edge_indices() {
            if let Some((src, tgt)) = graph.graph.edge_endpoints(edge_idx) {
                let w = graph.graph[edge_idx];
                let (s, t) = (src.index(), tgt.index());
                if s == t {
                    self_loops[s] += w;
                } else {
                    *neighbors[s].entry(t).or_default() += w;
                    *neighbors[t].entry(s).or_default() += w;
                }
            }
        }

        Self::with_degrees(neighbors, self_loops)
    }

    fn with_degrees(neighbors: Vec<BTreeMap<usize, f64>>, self_loops: Vec<f64>) -> Self {
        let degree = neighbors
            .iter()
            .zip(&self_loops)
            .map(|(adj, &loop_w)| adj.values().sum::<f64>() + 2.0 * loop_w)
            .collect();
        Self {
            neighbors,
            self_loops,
            degree,
        }
    }

    fn len(&self) -> usize {
        self.degree.len()
    }

    /// Collapse each community into one node. `community` must be contiguous.
    fn aggregate(&self, community: &[usize], count: usize) -> Self {
        let mut neighbors: Vec<BTreeMap<usize, f64>> = vec![BTreeMap::new(); count];
        let mut self_loops = vec![0.0; count];

        for node in 0..self.len() {
            let c = community[node];
            self_loops[c] += self.self_loops[node];
            for (&nbr, &w) in &self.neighbors[node] {
                let d = community[nbr];
                if c == d {
                    // Each internal edge is visited from both endpoints.
                    self_loops[c] += w / 2.0;
                } else {
                    *neighbors[c].entry(d).or_default() += w;
                }
            }
        }

        Self::with_degrees(neighbors, self_loops)
    }
}

// ── Louvain ────────────────────────────────────────────────────────

/// Louvain community detection. Returns one contiguous community id per
/// node index, numbered from 0 in node order.
pub fn louvain_communities(graph: &ProjectionGraph, resolution: f64, max_iterations: u32) -> Vec<u32> {
    let n = graph.node_count();
    if n == 0 {
        return vec![];
    }

    let mut work = WorkGraph::from_projection(graph);
    let m2: f64 = work.degree.iter().sum();
    if m2 == 0.0 {
        // No weight: each node is its own community
        return (0..n).map(|i| i as u32).collect();
    }

    // Original node → current aggregated node.
    let mut membership: Vec<usize> = (0..n).collect();
    let mut passes = 0u32;

    loop {
        let (community, moved) = local_moving(&work, resolution, m2, max_iterations);
        if !moved {
            break;
        }
        passes += 1;

        let (community, count) = renumber(&community);
        for m in &mut membership {
            *m = community[*m];
        }
        if count == work.len() {
            break;
        }
        work = work.aggregate(&community, count);
    }

    let (membership, count) = renumber(&membership);
    debug!(resolution, passes, communities = count, "Louvain converged");
    membership.into_iter().map(|c| c as u32).collect()
}

/// Phase 1: move single nodes to the neighbouring community with the best
/// gain `k_i,in(C) - γ·Σtot(C)·k_i / 2m`. Returns the assignment and whether
/// any node moved.
fn local_moving(
    work: &WorkGraph,
    resolution: f64,
    m2: f64,
    max_iterations: u32,
) -> (Vec<usize>, bool) {
    let n = work.len();
    let mut community: Vec<usize> = (0..n).collect();
    let mut totals: Vec<f64> = work.degree.clone();
    let mut moved = false;

    for _ in 0..max_iterations {
        let mut improved = false;

        for node in 0..n {
            let current = community[node];
            let ki = work.degree[node];

            let mut links: BTreeMap<usize, f64> = BTreeMap::new();
            for (&nbr, &w) in &work.neighbors[node] {
                *links.entry(community[nbr]).or_default() += w;
            }

            totals[current] -= ki;
            let gain = |c: usize, k_in: f64| k_in - resolution * totals[c] * ki / m2;

            let mut best = current;
            let mut best_gain = gain(current, links.get(&current).copied().unwrap_or(0.0));
            for (&target, &k_in) in &links {
                if target == current {
                    continue;
                }
                let g = gain(target, k_in);
                if g > best_gain + GAIN_EPSILON {
                    best = target;
                    best_gain = g;
                }
            }
            totals[best] += ki;

            if best != current {
                community[node] = best;
                improved = true;
                moved = true;
            }
        }

        if !improved {
            break;
        }
    }

    (community, moved)
}

/// Renumber to contiguous ids in first-seen order.
fn renumber(community: &[usize]) -> (Vec<usize>, usize) {
    let mut remap: HashMap<usize, usize> = HashMap::new();
    let renumbered = community
        .iter()
        .map(|c| {
            let next = remap.len();
            *remap.entry(*c).or_insert(next)
        })
        .collect();
    (renumbered, remap.len())
}
