// Hierarchical partitioning: one detector pass per resolution, coarsest first.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use tracing::info;

use crate::config::PartitionSection;
use crate::error::{AnalyzeError, Result};
use crate::types::{
    CommunityTree, Hierarchy, HierarchyPath, ProjectionGraph, ResolutionLevel, WeightedProjection,
};

use super::louvain::{CommunityDetector, LouvainDetector};

/// Runs a [`CommunityDetector`] at ascending resolutions and assembles
/// per-node hierarchy paths plus the community tree.
#[derive(Clone)]
pub struct HierarchicalPartitioner {
    detector: Arc<dyn CommunityDetector>,
}

impl fmt::Debug for HierarchicalPartitioner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HierarchicalPartitioner")
            .field("detector", &self.detector.name())
            .finish()
    }
}

impl Default for HierarchicalPartitioner {
    fn default() -> Self {
        Self::new(LouvainDetector::default())
    }
}

impl HierarchicalPartitioner {
    pub fn new(detector: impl CommunityDetector + 'static) -> Self {
        Self {
            detector: Arc::new(detector),
        }
    }

    /// Louvain detector with the configured sweep limit.
    pub fn from_config(config: &PartitionSection) -> Self {
        Self::new(LouvainDetector {
            max_iterations: config.max_iterations,
        })
    }

    pub fn detector_name(&self) -> &'static str {
        self.detector.name()
    }

    /// Partition `projection` at every resolution (sorted ascending first).
    pub fn cluster(&self, projection: &WeightedProjection, resolutions: &[f64]) -> Result<Hierarchy> {
        let start = Instant::now();

        if projection.is_empty() {
            return Err(AnalyzeError::EmptyGraph("projection has no edges to partition".into()).into());
        }
        if resolutions.is_empty() {
            return Err(AnalyzeError::InvalidResolutions("at least one resolution is required".into()).into());
        }
        if let Some(bad) = resolutions.iter().find(|r| !r.is_finite()) {
            return Err(AnalyzeError::InvalidResolutions(format!("non-finite resolution {bad}")).into());
        }

        let mut resolutions = resolutions.to_vec();
        resolutions.sort_by(f64::total_cmp);

        let graph = ProjectionGraph::from(projection);
        let memberships: Vec<_> = resolutions
            .par_iter()
            .map(|&r| self.detector.partition(&graph, r))
            .collect::<Result<_>>()?;

        let mut paths: BTreeMap<_, HierarchyPath> = BTreeMap::new();
        let mut levels = Vec::with_capacity(resolutions.len());

        for (&resolution, membership) in resolutions.iter().zip(&memberships) {
            let mut ordered = Vec::with_capacity(graph.node_count());
            for node in graph.node_ids() {
                let community = membership.get(&node).copied().ok_or_else(|| {
                    AnalyzeError::Computation(format!(
                        "{} omitted node {node} at resolution {resolution}",
                        self.detector.name()
                    ))
                })?;
                paths.entry(node).or_default().path.push(community);
                ordered.push((node, community));
            }

            let level = ResolutionLevel::from_membership(resolution, ordered);
            info!(
                resolution,
                communities = level.community_count(),
                "Partitioned level"
            );
            levels.push(level);
        }

        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            levels = levels.len(),
            detector = self.detector.name(),
            duration = ?start.elapsed(),
            "Hierarchical partition complete"
        );

        Ok(Hierarchy {
            paths,
            tree: CommunityTree { levels },
        })
    }
}
