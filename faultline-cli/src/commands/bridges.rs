use anyhow::Context;
use clap::Args;

use faultline_core::analyze::bridge::identify_bridges;

use super::OutputDir;

#[derive(Args, Debug)]
pub struct BridgesArgs {
    #[command(flatten)]
    pub out: OutputDir,

    /// Number of top bridges to print
    #[arg(long, default_value = "10")]
    pub top: usize,
}

pub fn run(args: &BridgesArgs) -> anyhow::Result<()> {
    let dir = args.out.artifacts();
    let projection = dir.read_projection().context("Cannot read projection")?;
    let assignment = dir.read_assignment().context("Cannot read community map")?;

    let bridges = identify_bridges(&projection, &assignment);
    dir.write_bridges(&bridges).context("Cannot write bridges")?;

    println!("Found {} bridge nodes", bridges.len());
    for bridge in bridges.iter().take(args.top) {
        println!(
            "  {:>12}  macro {:>4}  micro {:>4}",
            bridge.node_id, bridge.macro_score, bridge.micro_score
        );
    }
    Ok(())
}
