// Graph projection: fuses structural (causal) links with embedding similarity.
//
// Similarity math intentionally casts f32 embeddings to f64.
#![allow(clippy::cast_lossless)]

use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::ProjectionSection;
use crate::error::{AnalyzeError, Result};
use crate::snapshot::{Embedder, GraphSnapshot};
use crate::types::{EdgeKind, NodeId, ProjectedEdge, WeightedProjection};

/// Builds a [`WeightedProjection`] from nodes, causal links, and embeddings.
#[derive(Debug, Clone, Default)]
pub struct ProjectionBuilder {
    config: ProjectionSection,
}

impl ProjectionBuilder {
    pub fn new(config: ProjectionSection) -> Self {
        Self { config }
    }

    /// Fuse structural and semantic signals into one ordered edge list.
    ///
    /// Structural edges come first, in input order, each weighted `alpha`.
    /// Semantic edges follow in `(i, j)` order for `i < j` over `nodes`,
    /// weighted `similarity * beta` when `similarity >= threshold`.
    /// `embeddings` must be index-aligned with `nodes`. An invalid
    /// `alpha`/`beta` is rejected before any edge is emitted.
    pub fn build(
        &self,
        nodes: &[NodeId],
        structural: &[(NodeId, NodeId)],
        embeddings: &[Vec<f32>],
    ) -> Result<WeightedProjection> {
        let start = Instant::now();
        self.config.validate()?;

        if embeddings.len() != nodes.len() {
            return Err(AnalyzeError::InputShape {
                context: "embeddings vs nodes".into(),
                expected: nodes.len(),
                actual: embeddings.len(),
            }
            .into());
        }
        if let Some(first) = embeddings.first() {
            let dim = first.len();
            if let Some((idx, bad)) = embeddings.iter().enumerate().find(|(_, e)| e.len() != dim) {
                return Err(AnalyzeError::InputShape {
                    context: format!("embedding dimension of node {}", nodes[idx]),
                    expected: dim,
                    actual: bad.len(),
                }
                .into());
            }
        }

        let mut edges: Vec<ProjectedEdge> = structural
            .iter()
            .map(|&(source, target)| ProjectedEdge {
                source,
                target,
                weight: self.config.alpha,
                kind: EdgeKind::Structural,
            })
            .collect();
        debug!(structural = edges.len(), "Projected structural edges");

        let semantic = self.semantic_edges(nodes, embeddings);
        let semantic_count = semantic.len();
        edges.extend(semantic);

        info!(
            nodes = nodes.len(),
            structural = structural.len(),
            semantic = semantic_count,
            duration = ?start.elapsed(),
            "Projection complete"
        );
        Ok(WeightedProjection::new(edges))
    }

    /// Fill missing embeddings through `embedder` (if given), then build.
    pub fn build_snapshot(
        &self,
        snapshot: &mut GraphSnapshot,
        embedder: Option<&dyn Embedder>,
    ) -> Result<WeightedProjection> {
        if let Some(embedder) = embedder {
            snapshot.fill_embeddings(embedder)?;
        }
        let embeddings = snapshot.embeddings()?;
        self.build(&snapshot.node_ids(), &snapshot.structural_pairs(), &embeddings)
    }

    /// All-pairs similarity. Rows run in parallel; the indexed collect keeps
    /// the sequential `(i, j)` order.
    fn semantic_edges(&self, nodes: &[NodeId], embeddings: &[Vec<f32>]) -> Vec<ProjectedEdge> {
        let norms: Vec<f64> = embeddings.iter().map(|e| norm(e)).collect();
        let threshold = self.config.similarity_threshold;
        let beta = self.config.beta;

        let rows: Vec<Vec<ProjectedEdge>> = (0..nodes.len())
            .into_par_iter()
            .map(|i| {
                ((i + 1)..nodes.len())
                    .filter_map(|j| {
                        let sim =
                            cosine_similarity(&embeddings[i], &embeddings[j], norms[i], norms[j]);
                        if sim < threshold {
                            return None;
                        }
                        let weight = sim * beta;
                        // NaN components or a negative threshold would break the weight invariant.
                        (weight.is_finite() && weight >= 0.0).then_some(ProjectedEdge {
                            source: nodes[i],
                            target: nodes[j],
                            weight,
                            kind: EdgeKind::Semantic,
                        })
                    })
                    .collect()
            })
            .collect();

        rows.into_iter().flatten().collect()
    }
}

fn norm(v: &[f32]) -> f64 {
    v.iter().map(|&x| (x as f64) * (x as f64)).sum::<f64>().sqrt()
}

/// Cosine similarity with precomputed norms; `0.0` when either norm is zero.
pub fn cosine_similarity(a: &[f32], b: &[f32], norm_a: f64, norm_b: f64) -> f64 {
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let dot: f64 = a
        .iter()
        .zip(b)
        .map(|(&x, &y)| (x as f64) * (y as f64))
        .sum();
    dot / (norm_a * norm_b)
}
