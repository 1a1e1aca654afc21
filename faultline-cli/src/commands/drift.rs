use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use faultline_core::analyze::drift::detect_drift;
use faultline_core::artifact::{read_assignment, write_json};
use faultline_core::contracts::artifact_files;

#[derive(Args, Debug)]
pub struct DriftArgs {
    /// Current community map (flat or hierarchical)
    #[arg(long)]
    pub current: PathBuf,

    /// Baseline community map to compare against
    #[arg(long)]
    pub baseline: PathBuf,

    /// Where to write the report (default: next to the current map)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn run(args: &DriftArgs) -> anyhow::Result<()> {
    let current = read_assignment(&args.current)
        .with_context(|| format!("Cannot read current map: {}", args.current.display()))?;
    let baseline = read_assignment(&args.baseline)
        .with_context(|| format!("Cannot read baseline map: {}", args.baseline.display()))?;

    let report = detect_drift(&current, &baseline);

    let output = args.output.clone().unwrap_or_else(|| {
        args.current
            .parent()
            .map_or_else(PathBuf::new, PathBuf::from)
            .join(artifact_files::DRIFT)
    });
    write_json(&output, &report)
        .with_context(|| format!("Cannot write drift report: {}", output.display()))?;

    let summary = &report.summary;
    println!(
        "Stability index {:.2}: {} of {} nodes drifted ({} new, {} removed)",
        summary.stability_index,
        summary.drift_count,
        summary.total_nodes,
        report.new_nodes.len(),
        report.removed_nodes.len()
    );
    Ok(())
}
