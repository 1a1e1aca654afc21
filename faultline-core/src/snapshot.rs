//! Pipeline input: a knowledge-graph snapshot and the embedding seam.
//!
//! A [`GraphSnapshot`] lists nodes in a stable order together with their
//! optional text and embedding, plus the structural (causal) links between
//! them. Embeddings that are absent can be filled from node text through any
//! [`Embedder`] implementation.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::artifact;
use crate::error::AnalyzeError;
use crate::types::NodeId;

/// Converts text to fixed-dimension vectors.
///
/// Implementations wrap an external embedding service; calls are treated as
/// synchronous and side-effect free. Retrying transient failures is the
/// implementation's (or its caller's) concern.
pub trait Embedder: Send + Sync {
    /// Human-readable name for this embedder.
    fn name(&self) -> &'static str;

    /// Embed each text; the output must be index-aligned with `texts`.
    fn embed(&self, texts: &[String]) -> crate::error::Result<Vec<Vec<f32>>>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotNode {
    pub id: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

/// Directed causal link `source → target`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuralLink {
    pub source: NodeId,
    pub target: NodeId,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<SnapshotNode>,
    #[serde(default)]
    pub edges: Vec<StructuralLink>,
}

impl GraphSnapshot {
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        let snapshot: Self = artifact::read_json(path)?;
        info!(
            nodes = snapshot.nodes.len(),
            edges = snapshot.edges.len(),
            path = %path.display(),
            "Loaded graph snapshot"
        );
        Ok(snapshot)
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.iter().map(|n| n.id).collect()
    }

    pub fn structural_pairs(&self) -> Vec<(NodeId, NodeId)> {
        self.edges.iter().map(|e| (e.source, e.target)).collect()
    }

    /// Node text keyed by id, for context building.
    pub fn attributes(&self) -> BTreeMap<NodeId, String> {
        self.nodes
            .iter()
            .filter_map(|n| n.text.clone().map(|t| (n.id, t)))
            .collect()
    }

    /// Index-aligned embeddings, failing on the first node without one.
    pub fn embeddings(&self) -> crate::error::Result<Vec<Vec<f32>>> {
        self.nodes
            .iter()
            .map(|n| {
                n.embedding
                    .clone()
                    .ok_or_else(|| AnalyzeError::MissingEmbedding(n.id.to_string()).into())
            })
            .collect()
    }

    /// Embed the text of every node that has no embedding yet, in one batch.
    ///
    /// Returns the number of nodes that were embedded.
    pub fn fill_embeddings(&mut self, embedder: &dyn Embedder) -> crate::error::Result<usize> {
        let mut pending = Vec::new();
        let mut texts = Vec::new();
        for (idx, node) in self.nodes.iter().enumerate() {
            if node.embedding.is_some() {
                continue;
            }
            let text = node
                .text
                .clone()
                .ok_or_else(|| AnalyzeError::MissingEmbedding(node.id.to_string()))?;
            pending.push(idx);
            texts.push(text);
        }

        if pending.is_empty() {
            return Ok(0);
        }

        info!(
            embedder = embedder.name(),
            texts = texts.len(),
            "Embedding node text"
        );
        let vectors = embedder.embed(&texts)?;
        if vectors.len() != pending.len() {
            return Err(AnalyzeError::InputShape {
                context: format!("{} output vs requested texts", embedder.name()),
                expected: pending.len(),
                actual: vectors.len(),
            }
            .into());
        }

        for (idx, vector) in pending.iter().zip(vectors) {
            self.nodes[*idx].embedding = Some(vector);
        }
        Ok(pending.len())
    }
}
