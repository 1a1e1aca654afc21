// Community fingerprints: content hashes of member sets, used to skip
// re-summarising communities whose membership did not change.

use std::collections::{BTreeMap, BTreeSet};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;

use crate::types::{Assignment, CommunityId, CommunityTree, Fingerprints, NodeId};

/// Hex SHA-256 of the member ids sorted as strings and joined with `,`.
pub fn hash_members(members: &[NodeId]) -> String {
    let mut ids: Vec<String> = members.iter().map(ToString::to_string).collect();
    ids.sort_unstable();
    let digest = Sha256::digest(ids.join(",").as_bytes());
    hex::encode(digest)
}

fn hash_groups(groups: &BTreeMap<CommunityId, Vec<NodeId>>) -> BTreeMap<CommunityId, String> {
    groups
        .par_iter()
        .map(|(&community, members)| (community, hash_members(members)))
        .collect()
}

/// Fingerprint every macro and micro community of an assignment.
pub fn generate_fingerprints(assignment: &Assignment) -> Fingerprints {
    let mut macro_groups: BTreeMap<CommunityId, Vec<NodeId>> = BTreeMap::new();
    let mut micro_groups: BTreeMap<CommunityId, Vec<NodeId>> = BTreeMap::new();
    for (&node, entry) in assignment {
        macro_groups.entry(entry.macro_community).or_default().push(node);
        micro_groups.entry(entry.micro_community).or_default().push(node);
    }

    let (macro_communities, micro_communities) =
        rayon::join(|| hash_groups(&macro_groups), || hash_groups(&micro_groups));

    info!(
        macro_communities = macro_communities.len(),
        micro_communities = micro_communities.len(),
        "Fingerprints generated"
    );
    Fingerprints {
        macro_communities,
        micro_communities,
    }
}

/// Fingerprints of one resolution level of a full hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelFingerprints {
    pub resolution: f64,
    pub communities: BTreeMap<CommunityId, String>,
}

/// Fingerprint every level of the tree, coarsest first.
pub fn fingerprint_tree(tree: &CommunityTree) -> Vec<LevelFingerprints> {
    tree.levels
        .iter()
        .map(|level| LevelFingerprints {
            resolution: level.resolution,
            communities: hash_groups(&level.communities),
        })
        .collect()
}

/// Communities whose fingerprint is new or differs from `previous`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedCommunities {
    pub macro_communities: BTreeSet<CommunityId>,
    pub micro_communities: BTreeSet<CommunityId>,
}

impl ChangedCommunities {
    pub fn is_empty(&self) -> bool {
        self.macro_communities.is_empty() && self.micro_communities.is_empty()
    }
}

pub fn changed_communities(previous: &Fingerprints, current: &Fingerprints) -> ChangedCommunities {
    fn diff(
        previous: &BTreeMap<CommunityId, String>,
        current: &BTreeMap<CommunityId, String>,
    ) -> BTreeSet<CommunityId> {
        current
            .iter()
            .filter(|(id, hash)| previous.get(*id) != Some(*hash))
            .map(|(&id, _)| id)
            .collect()
    }

    ChangedCommunities {
        macro_communities: diff(&previous.macro_communities, &current.macro_communities),
        micro_communities: diff(&previous.micro_communities, &current.micro_communities),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CommunityAssignment, ResolutionLevel};

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
    fn known_digest() {
        // sha256("1,2")
        assert_eq!(
            hash_members(&[NodeId(2), NodeId(1)]),
            "17f8af97ad4a7f7639a4c9171d5185cbafb85462877a4746c21bdb0a4f940ca0"
        );
    }

    #[test]
    fn sorts_ids_as_strings() {
        // "10" < "9" lexicographically.
        assert_eq!(
            hash_members(&[NodeId(9), NodeId(10)]),
            hex::encode(Sha256::digest(b"10,9"))
        );
    }

    #[test]
    fn groups_by_macro_and_micro() {
        let fingerprints = generate_fingerprints(&assign(&[(1, 0, 0), (2, 0, 1), (3, 1, 2)]));
        assert_eq!(fingerprints.macro_communities.len(), 2);
        assert_eq!(fingerprints.micro_communities.len(), 3);
        assert_eq!(
            fingerprints.macro_communities[&CommunityId(0)],
            hash_members(&[NodeId(1), NodeId(2)])
        );
        assert_eq!(
            fingerprints.micro_communities[&CommunityId(2)],
            hash_members(&[NodeId(3)])
        );
    }

    #[test]
    fn changed_communities_flags_new_and_different() {
        let previous = generate_fingerprints(&assign(&[(1, 0, 0), (2, 0, 1)]));
        let current = generate_fingerprints(&assign(&[(1, 0, 0), (2, 0, 1), (3, 0, 2)]));
        let changed = changed_communities(&previous, &current);
        assert_eq!(changed.macro_communities, BTreeSet::from([CommunityId(0)]));
        assert_eq!(changed.micro_communities, BTreeSet::from([CommunityId(2)]));

        assert!(changed_communities(&current, &current).is_empty());
    }

    #[test]
    fn tree_levels_fingerprinted() {
        let tree = CommunityTree {
            levels: vec![
                ResolutionLevel::from_membership(
                    0.1,
                    [(NodeId(1), CommunityId(0)), (NodeId(2), CommunityId(0))],
                ),
                ResolutionLevel::from_membership(
                    1.0,
                    [(NodeId(1), CommunityId(0)), (NodeId(2), CommunityId(1))],
                ),
            ],
        };
        let levels = fingerprint_tree(&tree);
        assert_eq!(levels.len(), 2);
        assert_eq!(levels[0].communities.len(), 1);
        assert_eq!(
            levels[1].communities[&CommunityId(1)],
            hash_members(&[NodeId(2)])
        );
    }

    // ── Property-based tests ──────────────────────────────────────

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(100))]

            #[test]
            fn hash_ignores_member_order(
                members in prop::collection::vec(any::<i64>(), 0..30).prop_shuffle(),
                seed in any::<u64>(),
            ) {
                let ids: Vec<NodeId> = members.iter().copied().map(NodeId).collect();
                let mut rotated = ids.clone();
                if !rotated.is_empty() {
                    let k = usize::try_from(seed % rotated.len() as u64).unwrap();
                    rotated.rotate_left(k);
                }
                rotated.reverse();
                prop_assert_eq!(hash_members(&ids), hash_members(&rotated));
            }
        }
    }
}
