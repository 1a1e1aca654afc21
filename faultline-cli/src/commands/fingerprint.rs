use anyhow::Context;
use clap::Args;

use faultline_core::analyze::fingerprint::{
    changed_communities, fingerprint_tree, generate_fingerprints,
};

use super::OutputDir;

#[derive(Args, Debug)]
pub struct FingerprintArgs {
    #[command(flatten)]
    pub out: OutputDir,

    /// Also print fingerprints of every hierarchy level as JSON
    #[arg(long)]
    pub levels: bool,
}

pub fn run(args: &FingerprintArgs) -> anyhow::Result<()> {
    let dir = args.out.artifacts();
    let assignment = dir.read_assignment().context("Cannot read community map")?;
    let previous = dir
        .read_fingerprints()
        .context("Cannot read existing fingerprints")?;

    let fingerprints = generate_fingerprints(&assignment);
    dir.write_fingerprints(&fingerprints)
        .context("Cannot write fingerprints")?;

    println!(
        "Fingerprinted {} macro and {} micro communities",
        fingerprints.macro_communities.len(),
        fingerprints.micro_communities.len()
    );
    if let Some(previous) = previous {
        let changed = changed_communities(&previous, &fingerprints);
        println!(
            "  changed since last run: {} macro, {} micro",
            changed.macro_communities.len(),
            changed.micro_communities.len()
        );
    }

    if args.levels {
        let hierarchy = dir.read_hierarchy().context("Cannot read community tree")?;
        let levels = fingerprint_tree(&hierarchy.tree);
        println!("{}", serde_json::to_string_pretty(&levels)?);
    }
    Ok(())
}
