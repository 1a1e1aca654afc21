// Hub extraction: intra-community weighted PageRank per micro community.
//
// Graph algorithms intentionally cast int↔float.
#![allow(clippy::cast_precision_loss)]

use std::collections::{BTreeMap, HashSet};
use std::time::Instant;

use petgraph::Direction;
use petgraph::visit::EdgeRef;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::HubSection;
use crate::types::{
    Assignment, CommunityId, HubMap, HubRanking, NodeId, ProjectionGraph, WeightedProjection,
};

// ── PageRank ───────────────────────────────────────────────────────

/// Weighted PageRank by power iteration, indexed by node index.
///
/// Transitions are proportional to out-edge weight; nodes without outgoing
/// weight spread their mass uniformly. Stops once the L1 change drops below
/// `config.tolerance` or after `config.max_iterations` rounds.
pub fn weighted_pagerank(graph: &ProjectionGraph, config: &HubSection) -> Vec<f64> {
    let g = &graph.graph;
    let n = g.node_count();
    if n == 0 {
        return vec![];
    }

    let damping = config.damping;
    let base = (1.0 - damping) / n as f64;
    let mut scores = vec![1.0 / n as f64; n];
    let mut next = vec![0.0; n];

    let out_strength: Vec<f64> = g
        .node_indices()
        .map(|idx| g.edges_directed(idx, Direction::Outgoing).map(|e| *e.weight()).sum())
        .collect();

    let mut iterations = 0;
    for _ in 0..config.max_iterations {
        iterations += 1;
        next.fill(base);

        let mut dangling = 0.0;
        for idx in g.node_indices() {
            let i = idx.index();
            if out_strength[i] > 0.0 {
                let share = damping * scores[i] / out_strength[i];
                for edge in g.edges_directed(idx, Direction::Outgoing) {
                    next[edge.target().index()] += share * edge.weight();
                }
            } else {
                dangling += damping * scores[i];
            }
        }
        if dangling > 0.0 {
            let spread = dangling / n as f64;
            for s in &mut next {
                *s += spread;
            }
        }

        let diff: f64 = scores.iter().zip(&next).map(|(a, b)| (a - b).abs()).sum();
        std::mem::swap(&mut scores, &mut next);
        if diff < config.tolerance {
            break;
        }
    }

    debug!(nodes = n, iterations, "PageRank converged");
    scores
}

// ── Hub extraction ─────────────────────────────────────────────────

/// Rank the most central members of every micro community.
///
/// Communities are independent and processed in parallel.
pub fn extract_hubs(
    projection: &WeightedProjection,
    assignment: &Assignment,
    config: &HubSection,
) -> HubMap {
    let start = Instant::now();

    let mut groups: BTreeMap<CommunityId, Vec<NodeId>> = BTreeMap::new();
    for (&node, entry) in assignment {
        groups.entry(entry.micro_community).or_default().push(node);
    }

    let hubs: HubMap = groups
        .par_iter()
        .map(|(&community, members)| (community, rank_community(projection, members, config)))
        .collect();

    info!(
        communities = hubs.len(),
        hubs = hubs.values().map(Vec::len).sum::<usize>(),
        top_k = config.top_k,
        duration = ?start.elapsed(),
        "Hub extraction complete"
    );
    hubs
}

fn rank_community(
    projection: &WeightedProjection,
    members: &[NodeId],
    config: &HubSection,
) -> Vec<HubRanking> {
    if members.len() < 2 {
        return members.iter().map(|&node_id| uniform(node_id)).collect();
    }

    let member_set: HashSet<NodeId> = members.iter().copied().collect();
    let graph = ProjectionGraph::from_edges(
        projection
            .edges()
            .iter()
            .filter(|e| member_set.contains(&e.source) && member_set.contains(&e.target)),
    );

    if graph.edge_count() == 0 {
        return members
            .iter()
            .take(config.top_k)
            .map(|&node_id| uniform(node_id))
            .collect();
    }

    let scores = weighted_pagerank(&graph, config);
    let mut scored: Vec<(NodeId, f64)> = graph.node_ids().zip(scores).collect();
    // Stable: ties keep first-seen order in the induced edge list.
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));

    scored
        .into_iter()
        .take(config.top_k)
        .zip(1u32..)
        .map(|((node_id, score), rank)| HubRanking {
            node_id,
            score,
            rank,
        })
        .collect()
}

fn uniform(node_id: NodeId) -> HubRanking {
    HubRanking {
        node_id,
        score: 1.0,
        rank: 1,
    }
}
