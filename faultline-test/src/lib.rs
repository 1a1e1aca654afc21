// Integration test utilities and fixture management for Faultline.
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss
)]

use std::path::{Path, PathBuf};

use faultline_core::artifact::ArtifactDir;
use faultline_core::config::FaultlineConfig;
use faultline_core::pipeline::{FaultlinePipeline, PipelineOutput, PreviousRun};
use faultline_core::progress::NoopReporter;
use faultline_core::snapshot::{Embedder, GraphSnapshot, SnapshotNode, StructuralLink};
use faultline_core::types::NodeId;

/// A temporary directory holding snapshots and run directories.
#[derive(Debug)]
pub struct TestWorkspace {
    pub dir: tempfile::TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create tempdir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Artifact directory for a named run inside the workspace.
    pub fn run_dir(&self, name: &str) -> ArtifactDir {
        ArtifactDir::new(self.path().join(name))
    }

    /// Write a snapshot as JSON and return its path.
    pub fn write_snapshot(&self, name: &str, snapshot: &GraphSnapshot) -> PathBuf {
        let path = self.path().join(name);
        let json = serde_json::to_string_pretty(snapshot).expect("serialize snapshot");
        std::fs::write(&path, json).expect("write snapshot");
        path
    }
}

impl Default for TestWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

// ── Snapshots ──────────────────────────────────────────────────────

pub fn alarm(id: i64, text: &str, embedding: Vec<f32>) -> SnapshotNode {
    SnapshotNode {
        id: NodeId(id),
        text: Some(text.to_string()),
        embedding: Some(embedding),
    }
}

pub fn link(source: i64, target: i64) -> StructuralLink {
    StructuralLink {
        source: NodeId(source),
        target: NodeId(target),
    }
}

/// Two fault domains (BGP and MTU) joined by one causal link 101 → 103.
pub fn network_alarms() -> GraphSnapshot {
    GraphSnapshot {
        nodes: vec![
            alarm(101, "BGP_DOWN", vec![1.0, 0.2, 0.0]),
            alarm(102, "HOLD_TIMER_EXPIRED", vec![0.9, 0.3, 0.1]),
            alarm(104, "BGP_NOTIFICATION", vec![0.95, 0.25, 0.05]),
            alarm(103, "MTU_MISMATCH", vec![0.1, 0.8, 0.9]),
            alarm(105, "OSPF_ADJ_STUCK", vec![0.05, 0.85, 0.95]),
            alarm(106, "MTU_DROP", vec![0.15, 0.75, 0.85]),
        ],
        edges: vec![
            link(102, 101),
            link(104, 101),
            link(103, 105),
            link(106, 103),
            link(101, 103),
        ],
    }
}

/// `network_alarms` a day later: 106 cleared, a new BGP alarm 107 appeared.
pub fn network_alarms_churned() -> GraphSnapshot {
    GraphSnapshot {
        nodes: vec![
            alarm(101, "BGP_DOWN", vec![1.0, 0.2, 0.0]),
            alarm(102, "HOLD_TIMER_EXPIRED", vec![0.9, 0.3, 0.1]),
            alarm(104, "BGP_NOTIFICATION", vec![0.95, 0.25, 0.05]),
            alarm(107, "BGP_PEER_RESET", vec![0.92, 0.28, 0.02]),
            alarm(103, "MTU_MISMATCH", vec![0.1, 0.8, 0.9]),
            alarm(105, "OSPF_ADJ_STUCK", vec![0.05, 0.85, 0.95]),
        ],
        edges: vec![
            link(102, 101),
            link(104, 101),
            link(107, 104),
            link(103, 105),
            link(101, 103),
        ],
    }
}

/// `network_alarms` after 104 was re-diagnosed as an MTU symptom.
pub fn network_alarms_reclassified() -> GraphSnapshot {
    let mut snapshot = network_alarms();
    snapshot.nodes[2] = alarm(104, "MTU_FRAGMENTATION", vec![0.08, 0.82, 0.92]);
    snapshot.edges[1] = link(104, 103);
    snapshot
}

/// `node_count` alarms in `domains` fault domains: a causal chain inside
/// each domain plus one link between neighbouring domains.
pub fn synthetic_alarms(node_count: usize, domains: usize) -> GraphSnapshot {
    let dim = domains.max(1) * 4;
    let nodes = (0..node_count)
        .map(|i| {
            let domain = i % domains;
            let embedding = (0..dim)
                .map(|d| {
                    let noise = ((i * 31 + d * 17) % 50) as f32 / 1000.0;
                    if d % domains == domain { 1.0 + noise } else { noise }
                })
                .collect();
            alarm(i as i64, &format!("ALARM_{domain}_{i}"), embedding)
        })
        .collect();

    let mut edges: Vec<StructuralLink> = (domains..node_count)
        .map(|i| link(i as i64, (i - domains) as i64))
        .collect();
    edges.extend((1..domains).map(|d| link(d as i64, (d - 1) as i64)));

    GraphSnapshot { nodes, edges }
}

/// Strip embeddings so the snapshot must go through an [`Embedder`].
pub fn without_embeddings(mut snapshot: GraphSnapshot) -> GraphSnapshot {
    for node in &mut snapshot.nodes {
        node.embedding = None;
    }
    snapshot
}

// ── Embedders ──────────────────────────────────────────────────────

/// Deterministic embedder: one axis per keyword, the last axis for
/// text matching none of them.
#[derive(Debug, Clone)]
pub struct KeywordEmbedder {
    pub keywords: Vec<&'static str>,
}

impl KeywordEmbedder {
    pub fn network() -> Self {
        Self {
            keywords: vec!["BGP", "MTU", "OSPF"],
        }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; self.keywords.len() + 1];
        let mut matched = false;
        for (axis, keyword) in self.keywords.iter().enumerate() {
            if text.contains(keyword) {
                vector[axis] = 1.0;
                matched = true;
            }
        }
        if !matched {
            vector[self.keywords.len()] = 1.0;
        }
        vector
    }
}

impl Embedder for KeywordEmbedder {
    fn name(&self) -> &'static str {
        "keyword"
    }

    fn embed(&self, texts: &[String]) -> faultline_core::error::Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}

// ── Pipeline helpers ───────────────────────────────────────────────

/// Default config with a coarse and a fine level.
pub fn two_level_config() -> FaultlineConfig {
    let mut config = FaultlineConfig::default();
    config.partition.resolutions = vec![0.05, 1.0];
    config
}

/// Run the pipeline into `dir`, comparing against whatever run `dir`
/// already holds, and persist the result.
pub fn run_into(
    pipeline: &FaultlinePipeline,
    snapshot: &GraphSnapshot,
    dir: &ArtifactDir,
) -> anyhow::Result<PipelineOutput> {
    let previous = PreviousRun::load(dir)?;
    let output = pipeline.run(snapshot, previous.as_ref(), &NoopReporter)?;
    output.persist(dir)?;
    Ok(output)
}

/// Run with [`two_level_config`] and panic on failure.
pub fn run_pipeline(snapshot: &GraphSnapshot, dir: &ArtifactDir) -> PipelineOutput {
    let pipeline = FaultlinePipeline::new(two_level_config());
    run_into(&pipeline, snapshot, dir).expect("pipeline run")
}
