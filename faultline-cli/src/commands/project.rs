use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use faultline_core::analyze::projection::ProjectionBuilder;
use faultline_core::snapshot::GraphSnapshot;
use faultline_core::types::EdgeKind;

use super::{GlobalArgs, OutputDir};

#[derive(Args, Debug)]
pub struct ProjectArgs {
    /// Graph snapshot JSON (`nodes` with embeddings, structural `edges`)
    #[arg(short, long)]
    pub snapshot: PathBuf,

    #[command(flatten)]
    pub out: OutputDir,

    /// Weight of structural links
    #[arg(long)]
    pub alpha: Option<f64>,

    /// Scale applied to semantic similarity
    #[arg(long)]
    pub beta: Option<f64>,

    /// Minimum cosine similarity for a semantic edge
    #[arg(long)]
    pub threshold: Option<f64>,
}

pub fn run(args: ProjectArgs, global: &GlobalArgs) -> anyhow::Result<()> {
    let mut config = super::load_config(global.config.as_deref())?;
    if let Some(alpha) = args.alpha {
        config.projection.alpha = alpha;
    }
    if let Some(beta) = args.beta {
        config.projection.beta = beta;
    }
    if let Some(threshold) = args.threshold {
        config.projection.similarity_threshold = threshold;
    }
    config.projection.validate().context("Invalid projection options")?;

    let mut snapshot = GraphSnapshot::load(&args.snapshot)
        .with_context(|| format!("Cannot read snapshot: {}", args.snapshot.display()))?;

    let projection = ProjectionBuilder::new(config.projection)
        .build_snapshot(&mut snapshot, None)
        .context("Projection failed")?
        .rounded();

    let path = args
        .out
        .artifacts()
        .write_projection(&projection)
        .context("Cannot write projection")?;

    println!(
        "Projected {} edges ({} structural, {} semantic) -> {}",
        projection.len(),
        projection.count_kind(EdgeKind::Structural),
        projection.count_kind(EdgeKind::Semantic),
        path.display()
    );
    Ok(())
}
