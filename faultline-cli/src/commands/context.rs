use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use faultline_core::analyze::context::build_context;
use faultline_core::snapshot::GraphSnapshot;

use super::OutputDir;

#[derive(Args, Debug)]
pub struct ContextArgs {
    /// Graph snapshot supplying node text
    #[arg(short, long)]
    pub snapshot: PathBuf,

    #[command(flatten)]
    pub out: OutputDir,
}

pub fn run(args: &ContextArgs) -> anyhow::Result<()> {
    let snapshot = GraphSnapshot::load(&args.snapshot)
        .with_context(|| format!("Cannot read snapshot: {}", args.snapshot.display()))?;
    let dir = args.out.artifacts();
    let hubs = dir.read_hubs().context("Cannot read hubs")?;
    let projection = dir.read_projection().context("Cannot read projection")?;

    let context = build_context(&hubs, &projection, &snapshot.attributes());
    dir.write_context(&context).context("Cannot write hub context")?;

    println!(
        "Described {} hubs across {} communities",
        context.values().map(Vec::len).sum::<usize>(),
        context.len()
    );
    Ok(())
}
