use anyhow::Context;
use clap::Args;

use faultline_core::analyze::partition::HierarchicalPartitioner;

use super::{GlobalArgs, OutputDir};

#[derive(Args, Debug)]
pub struct ClusterArgs {
    #[command(flatten)]
    pub out: OutputDir,

    /// Resolutions to partition at, comma separated (e.g. 0.01,0.1,1.0)
    #[arg(short, long, value_delimiter = ',')]
    pub resolutions: Vec<f64>,

    /// Local-moving sweeps per Louvain aggregation pass
    #[arg(long)]
    pub max_iterations: Option<u32>,
}

pub fn run(args: ClusterArgs, global: &GlobalArgs) -> anyhow::Result<()> {
    let mut config = super::load_config(global.config.as_deref())?;
    if !args.resolutions.is_empty() {
        config.partition.resolutions = args.resolutions;
    }
    if let Some(max_iterations) = args.max_iterations {
        config.partition.max_iterations = max_iterations;
    }
    config.partition.validate().context("Invalid partition options")?;

    let dir = args.out.artifacts();
    let projection = dir.read_projection().context("Cannot read projection")?;

    let hierarchy = HierarchicalPartitioner::from_config(&config.partition)
        .cluster(&projection, &config.partition.resolutions)
        .context("Partitioning failed")?;
    dir.write_hierarchy(&hierarchy)
        .context("Cannot write community hierarchy")?;

    println!(
        "Partitioned {} nodes into {} levels",
        hierarchy.paths.len(),
        hierarchy.tree.depth()
    );
    for level in &hierarchy.tree.levels {
        println!(
            "  resolution {:<8} {:>6} communities",
            level.resolution,
            level.community_count()
        );
    }
    Ok(())
}
