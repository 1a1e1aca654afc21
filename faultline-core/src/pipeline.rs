// Pipeline orchestrator: Project → Partition → (Bridges ∥ Fingerprints ∥ Hubs) → Context.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::analyze::StageStats;
use crate::analyze::bridge::identify_bridges;
use crate::analyze::context::{ContextMap, build_context};
use crate::analyze::drift::detect_drift;
use crate::analyze::fingerprint::{ChangedCommunities, changed_communities, generate_fingerprints};
use crate::analyze::hubs::extract_hubs;
use crate::analyze::louvain::CommunityDetector;
use crate::analyze::partition::HierarchicalPartitioner;
use crate::analyze::projection::ProjectionBuilder;
use crate::artifact::{self, ArtifactDir};
use crate::config::FaultlineConfig;
use crate::contracts::artifact_files;
use crate::error::{ArtifactError, Result};
use crate::progress::ProgressReporter;
use crate::snapshot::{Embedder, GraphSnapshot};
use crate::types::{
    Assignment, BridgeScore, DriftReport, DriftSummary, EdgeKind, Fingerprints, Hierarchy, HubMap,
    WeightedProjection,
};

/// Artifacts of an earlier run used for drift and change detection.
#[derive(Debug, Clone, Default)]
pub struct PreviousRun {
    pub assignment: Assignment,
    pub fingerprints: Option<Fingerprints>,
}

impl PreviousRun {
    /// Load the compat map and fingerprints of a run directory.
    ///
    /// Returns `None` when the directory holds no community map.
    pub fn load(dir: &ArtifactDir) -> Result<Option<Self>> {
        let assignment = match dir.read_assignment() {
            Ok(a) => a,
            Err(ArtifactError::Missing(path)) => {
                warn!(path = %path.display(), "No previous community map; skipping drift");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Some(Self {
            assignment,
            fingerprints: dir.read_fingerprints()?,
        }))
    }
}

/// Summary written next to the artifacts of every run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub generated_at: DateTime<Utc>,
    pub detector: String,
    pub resolutions: Vec<f64>,
    pub nodes: usize,
    pub structural_edges: usize,
    pub semantic_edges: usize,
    pub macro_communities: usize,
    pub micro_communities: usize,
    pub bridges: usize,
    pub stages: Vec<StageStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drift: Option<DriftSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changed_communities: Option<ChangedCommunities>,
}

/// Everything one pipeline run produces.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub projection: WeightedProjection,
    pub hierarchy: Hierarchy,
    pub assignment: Assignment,
    pub bridges: Vec<BridgeScore>,
    pub fingerprints: Fingerprints,
    pub hubs: HubMap,
    pub context: ContextMap,
    pub drift: Option<DriftReport>,
    pub manifest: RunManifest,
}

impl PipelineOutput {
    /// Write every artifact of this run into `dir`.
    pub fn persist(&self, dir: &ArtifactDir) -> Result<()> {
        dir.write_projection(&self.projection)?;
        dir.write_hierarchy(&self.hierarchy)?;
        dir.write_bridges(&self.bridges)?;
        dir.write_fingerprints(&self.fingerprints)?;
        dir.write_hubs(&self.hubs)?;
        dir.write_context(&self.context)?;
        match &self.drift {
            Some(drift) => dir.write_drift(drift)?,
            None => dir.remove_drift()?,
        }
        artifact::write_json(&dir.path(artifact_files::MANIFEST), &self.manifest)?;
        info!(dir = %dir.root().display(), "Artifacts persisted");
        Ok(())
    }
}

/// Runs every analysis stage over a graph snapshot.
#[derive(Clone)]
pub struct FaultlinePipeline {
    config: FaultlineConfig,
    partitioner: HierarchicalPartitioner,
    embedder: Option<Arc<dyn Embedder>>,
}

impl fmt::Debug for FaultlinePipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FaultlinePipeline")
            .field("config", &self.config)
            .field("partitioner", &self.partitioner)
            .field("embedder", &self.embedder.as_ref().map(|e| e.name()))
            .finish()
    }
}

impl FaultlinePipeline {
    pub fn new(config: FaultlineConfig) -> Self {
        let partitioner = HierarchicalPartitioner::from_config(&config.partition);
        Self {
            config,
            partitioner,
            embedder: None,
        }
    }

    /// Replace the built-in Louvain detector.
    #[must_use]
    pub fn with_detector(mut self, detector: impl CommunityDetector + 'static) -> Self {
        self.partitioner = HierarchicalPartitioner::new(detector);
        self
    }

    /// Embed node text for nodes whose snapshot entry has no vector.
    #[must_use]
    pub fn with_embedder(mut self, embedder: impl Embedder + 'static) -> Self {
        self.embedder = Some(Arc::new(embedder));
        self
    }

    pub fn config(&self) -> &FaultlineConfig {
        &self.config
    }

    pub fn run(
        &self,
        snapshot: &GraphSnapshot,
        previous: Option<&PreviousRun>,
        reporter: &dyn ProgressReporter,
    ) -> Result<PipelineOutput> {
        let start = Instant::now();
        self.config.validate()?;
        reporter.begin(if previous.is_some() { 7 } else { 6 });
        let mut stages = Vec::new();

        // ── Projection ──
        let (projection, stats) = stage(reporter, "projection", || {
            let mut snapshot = snapshot.clone();
            let projection = ProjectionBuilder::new(self.config.projection.clone())
                .build_snapshot(&mut snapshot, self.embedder.as_deref())?;
            let projection = projection.rounded();
            let items = projection.len();
            Ok((projection, items))
        })?;
        stages.push(stats);

        // ── Partition ──
        let (hierarchy, stats) = stage(reporter, "partition", || {
            let hierarchy = self
                .partitioner
                .cluster(&projection, &self.config.partition.resolutions)?;
            let items = hierarchy.tree.depth();
            Ok((hierarchy, items))
        })?;
        stages.push(stats);
        let assignment = hierarchy.assignment();

        // ── Independent analyses ──
        let (bridges, (fingerprints, hubs)) = rayon::join(
            || {
                stage(reporter, "bridges", || {
                    let bridges = identify_bridges(&projection, &assignment);
                    let items = bridges.len();
                    Ok((bridges, items))
                })
            },
            || {
                rayon::join(
                    || {
                        stage(reporter, "fingerprints", || {
                            let fp = generate_fingerprints(&assignment);
                            let items = fp.macro_communities.len() + fp.micro_communities.len();
                            Ok((fp, items))
                        })
                    },
                    || {
                        stage(reporter, "hubs", || {
                            let hubs = extract_hubs(&projection, &assignment, &self.config.hubs);
                            let items = hubs.values().map(Vec::len).sum();
                            Ok((hubs, items))
                        })
                    },
                )
            },
        );
        let (bridges, stats) = bridges?;
        stages.push(stats);
        let (fingerprints, stats) = fingerprints?;
        stages.push(stats);
        let (hubs, stats) = hubs?;
        stages.push(stats);

        // ── Context ──
        let (context, stats) = stage(reporter, "context", || {
            let context = build_context(&hubs, &projection, &snapshot.attributes());
            let items = context.values().map(Vec::len).sum();
            Ok((context, items))
        })?;
        stages.push(stats);

        // ── Drift against a previous run ──
        let mut drift = None;
        let mut changed = None;
        if let Some(previous) = previous {
            let (report, stats) = stage(reporter, "drift", || {
                let report = detect_drift(&assignment, &previous.assignment);
                let items = report.summary.drift_count;
                Ok((report, items))
            })?;
            stages.push(stats);
            changed = previous
                .fingerprints
                .as_ref()
                .map(|prev| changed_communities(prev, &fingerprints));
            drift = Some(report);
        }

        reporter.finish();

        let manifest = RunManifest {
            generated_at: Utc::now(),
            detector: self.partitioner.detector_name().to_string(),
            resolutions: hierarchy.tree.resolutions(),
            nodes: hierarchy.paths.len(),
            structural_edges: projection.count_kind(EdgeKind::Structural),
            semantic_edges: projection.count_kind(EdgeKind::Semantic),
            macro_communities: fingerprints.macro_communities.len(),
            micro_communities: fingerprints.micro_communities.len(),
            bridges: bridges.len(),
            stages,
            drift: drift.as_ref().map(|d: &DriftReport| d.summary.clone()),
            changed_communities: changed,
        };

        info!(
            nodes = manifest.nodes,
            edges = projection.len(),
            macro_communities = manifest.macro_communities,
            micro_communities = manifest.micro_communities,
            duration = ?start.elapsed(),
            "Pipeline complete"
        );

        Ok(PipelineOutput {
            projection,
            hierarchy,
            assignment,
            bridges,
            fingerprints,
            hubs,
            context,
            drift,
            manifest,
        })
    }
}

/// Run one stage, timing it and reporting start and finish.
fn stage<T>(
    reporter: &dyn ProgressReporter,
    name: &str,
    f: impl FnOnce() -> Result<(T, usize)>,
) -> Result<(T, StageStats)> {
    reporter.stage_started(name);
    let start = Instant::now();
    let (value, items) = f()?;
    let stats = StageStats::new(name, items, start.elapsed());
    reporter.stage_finished(&stats);
    Ok((value, stats))
}
