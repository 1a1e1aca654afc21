// Bridge detection: nodes whose projected edges cross community boundaries.

use std::collections::HashMap;
use std::time::Instant;

use tracing::info;

use crate::types::{Assignment, BridgeScore, NodeId, WeightedProjection};

/// Score every node by the number of cross-community edges it touches.
///
/// Both endpoints of a crossing edge are credited, separately for the macro
/// and the micro level. Edges with an unassigned endpoint are skipped. The
/// result is sorted by `(macro_score, micro_score)` descending; equal scores
/// keep the order in which nodes were first credited.
pub fn identify_bridges(projection: &WeightedProjection, assignment: &Assignment) -> Vec<BridgeScore> {
    let start = Instant::now();

    let mut bridges: Vec<BridgeScore> = Vec::new();
    let mut slot: HashMap<NodeId, usize> = HashMap::new();
    let mut skipped = 0usize;

    for edge in projection.edges() {
        let (Some(src), Some(tgt)) = (assignment.get(&edge.source), assignment.get(&edge.target))
        else {
            skipped += 1;
            continue;
        };

        let macro_cross = src.macro_community != tgt.macro_community;
        let micro_cross = src.micro_community != tgt.micro_community;
        if !(macro_cross || micro_cross) {
            continue;
        }
        for node in [edge.source, edge.target] {
            let score = score_for(&mut bridges, &mut slot, node);
            score.macro_score += u32::from(macro_cross);
            score.micro_score += u32::from(micro_cross);
        }
    }

    // Stable: ties keep first-credited order.
    bridges.sort_by(|a, b| (b.macro_score, b.micro_score).cmp(&(a.macro_score, a.micro_score)));

    info!(
        edges = projection.len(),
        bridges = bridges.len(),
        skipped,
        duration = ?start.elapsed(),
        "Bridge detection complete"
    );
    bridges
}

fn score_for<'a>(
    bridges: &'a mut Vec<BridgeScore>,
    slot: &mut HashMap<NodeId, usize>,
    node: NodeId,
) -> &'a mut BridgeScore {
    let idx = *slot.entry(node).or_insert_with(|| {
        bridges.push(BridgeScore {
            node_id: node,
            macro_score: 0,
            micro_score: 0,
        });
        bridges.len() - 1
    });
    &mut bridges[idx]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CommunityAssignment, CommunityId, EdgeKind, ProjectedEdge};

    fn edge(source: i64, target: i64) -> ProjectedEdge {
        ProjectedEdge {
            source: NodeId(source),
            target: NodeId(target),
            weight: 1.0,
            kind: EdgeKind::Structural,
        }
    }

    fn assign(entries: &[(i64, u32, u32)]) -> Assignment {
        entries
            .iter()
            .map(|&(node, macro_c, micro_c)| {
                (
                    NodeId(node),
                    CommunityAssignment {
                        macro_community: CommunityId(macro_c),
                        micro_community: CommunityId(micro_c),
                    },
                )
            })
            .collect()
    }

    #[test]
    fn crossing_edge_credits_both_endpoints() {
        let projection = WeightedProjection::new(vec![edge(1, 2), edge(2, 3)]);
        let assignment = assign(&[(1, 0, 0), (2, 0, 0), (3, 1, 1)]);

        let bridges = identify_bridges(&projection, &assignment);

        insta::assert_json_snapshot!(bridges, @r#"
        [
          {
            "node_id": "2",
            "macro_score": 1,
            "micro_score": 1
          },
          {
            "node_id": "3",
            "macro_score": 1,
            "micro_score": 1
          }
        ]
        "#);
    }

    #[test]
    fn micro_only_crossing() {
        let projection = WeightedProjection::new(vec![edge(1, 2)]);
        let assignment = assign(&[(1, 0, 0), (2, 0, 5)]);
        let bridges = identify_bridges(&projection, &assignment);
        assert_eq!(bridges.len(), 2);
        assert!(bridges.iter().all(|b| b.macro_score == 0 && b.micro_score == 1));
    }

    #[test]
    fn unassigned_endpoints_are_skipped() {
        let projection = WeightedProjection::new(vec![edge(1, 99), edge(99, 2)]);
        let assignment = assign(&[(1, 0, 0), (2, 1, 1)]);
        assert!(identify_bridges(&projection, &assignment).is_empty());
    }

    #[test]
    fn sorted_by_macro_then_micro_descending() {
        let projection = WeightedProjection::new(vec![
            edge(1, 2), // micro only
            edge(3, 4), // macro + micro
            edge(4, 5), // macro + micro
            edge(1, 6), // micro only
        ]);
        let assignment = assign(&[
            (1, 0, 0),
            (2, 0, 1),
            (3, 0, 0),
            (4, 1, 2),
            (5, 2, 3),
            (6, 0, 4),
        ]);
        let bridges = identify_bridges(&projection, &assignment);
        let order: Vec<(i64, u32, u32)> = bridges
            .iter()
            .map(|b| (b.node_id.0, b.macro_score, b.micro_score))
            .collect();
        assert_eq!(
            order,
            vec![
                (4, 2, 2),
                (3, 1, 1),
                (5, 1, 1),
                (1, 0, 2),
                (2, 0, 1),
                (6, 0, 1),
            ]
        );
    }

    #[test]
    fn intra_community_graph_has_no_bridges() {
        let projection = WeightedProjection::new(vec![edge(1, 2), edge(2, 1)]);
        let assignment = assign(&[(1, 3, 3), (2, 3, 3)]);
        assert!(identify_bridges(&projection, &assignment).is_empty());
    }
}
