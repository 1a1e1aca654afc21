use anyhow::Context;
use clap::Args;

use faultline_core::analyze::hubs::extract_hubs;

use super::{GlobalArgs, OutputDir};

#[derive(Args, Debug)]
pub struct HubsArgs {
    #[command(flatten)]
    pub out: OutputDir,

    /// Hubs kept per micro community
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,
}

pub fn run(args: HubsArgs, global: &GlobalArgs) -> anyhow::Result<()> {
    let mut config = super::load_config(global.config.as_deref())?;
    if let Some(top_k) = args.top_k {
        config.hubs.top_k = top_k;
    }
    config.hubs.validate().context("Invalid hub options")?;

    let dir = args.out.artifacts();
    let projection = dir.read_projection().context("Cannot read projection")?;
    let assignment = dir.read_assignment().context("Cannot read community map")?;

    let hubs = extract_hubs(&projection, &assignment, &config.hubs);
    dir.write_hubs(&hubs).context("Cannot write hubs")?;

    println!("Ranked hubs in {} micro communities", hubs.len());
    Ok(())
}
