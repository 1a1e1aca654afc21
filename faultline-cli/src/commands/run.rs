use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use tracing::info;

use faultline_core::artifact::ArtifactDir;
use faultline_core::pipeline::{FaultlinePipeline, PreviousRun};
use faultline_core::progress::{IndicatifReporter, NoopReporter, ProgressReporter};
use faultline_core::snapshot::GraphSnapshot;

use super::{GlobalArgs, OutputDir};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Graph snapshot JSON
    #[arg(short, long)]
    pub snapshot: PathBuf,

    #[command(flatten)]
    pub out: OutputDir,

    /// Directory of an earlier run to compute drift against
    /// (default: the output directory itself, if it holds a run)
    #[arg(short, long)]
    pub baseline: Option<PathBuf>,

    /// Skip drift analysis even if a previous run exists
    #[arg(long)]
    pub no_drift: bool,

    /// Resolutions to partition at, comma separated
    #[arg(short, long, value_delimiter = ',')]
    pub resolutions: Vec<f64>,

    /// Hubs kept per micro community
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,
}

pub fn run(args: RunArgs, global: &GlobalArgs) -> anyhow::Result<()> {
    let mut config = super::load_config(global.config.as_deref())?;
    if !args.resolutions.is_empty() {
        config.partition.resolutions = args.resolutions;
    }
    if let Some(top_k) = args.top_k {
        config.hubs.top_k = top_k;
    }
    config.validate().context("Invalid options")?;

    let snapshot = GraphSnapshot::load(&args.snapshot)
        .with_context(|| format!("Cannot read snapshot: {}", args.snapshot.display()))?;

    let out = args.out.artifacts();
    // Read the baseline before this run overwrites it.
    let previous = if args.no_drift {
        None
    } else {
        let baseline = args
            .baseline
            .as_ref()
            .map_or_else(|| out.clone(), ArtifactDir::new);
        PreviousRun::load(&baseline).with_context(|| {
            format!("Cannot read baseline run: {}", baseline.root().display())
        })?
    };

    let reporter: Box<dyn ProgressReporter> = if global.quiet {
        Box::new(NoopReporter)
    } else {
        Box::new(IndicatifReporter::new())
    };

    let pipeline = FaultlinePipeline::new(config);
    let output = pipeline
        .run(&snapshot, previous.as_ref(), reporter.as_ref())
        .context("Pipeline failed")?;
    output.persist(&out).with_context(|| {
        format!("Cannot write artifacts to {}", out.root().display())
    })?;
    info!(dir = %out.root().display(), "Artifacts written");

    let manifest = &output.manifest;
    println!(
        "Faultline: {} nodes, {} edges ({} structural, {} semantic)",
        manifest.nodes,
        manifest.structural_edges + manifest.semantic_edges,
        manifest.structural_edges,
        manifest.semantic_edges
    );
    println!(
        "  {} macro / {} micro communities, {} bridges",
        manifest.macro_communities, manifest.micro_communities, manifest.bridges
    );
    if let Some(drift) = &manifest.drift {
        println!(
            "  stability index {:.2} ({} of {} nodes drifted)",
            drift.stability_index, drift.drift_count, drift.total_nodes
        );
    }
    if let Some(changed) = &manifest.changed_communities {
        println!(
            "  changed communities: {} macro, {} micro",
            changed.macro_communities.len(),
            changed.micro_communities.len()
        );
    }
    println!("  artifacts: {}", out.root().display());
    Ok(())
}
