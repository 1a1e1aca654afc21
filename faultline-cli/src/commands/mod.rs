pub mod bridges;
pub mod cluster;
pub mod context;
pub mod drift;
pub mod fingerprint;
pub mod hubs;
pub mod project;
pub mod run;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Subcommand};

use faultline_core::artifact::ArtifactDir;
use faultline_core::config::FaultlineConfig;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Project a graph snapshot into a weighted structural + semantic edge list
    Project(project::ProjectArgs),
    /// Partition the projection into a multi-resolution community hierarchy
    Cluster(cluster::ClusterArgs),
    /// Score nodes whose edges cross community boundaries
    Bridges(bridges::BridgesArgs),
    /// Compare two community assignments and report migrations
    Drift(drift::DriftArgs),
    /// Hash community memberships into stable fingerprints
    Fingerprint(fingerprint::FingerprintArgs),
    /// Rank the most central nodes inside each micro community
    Hubs(hubs::HubsArgs),
    /// Describe hub nodes through their text and relationships
    Context(context::ContextArgs),
    /// Run every stage end to end and write all artifacts
    Run(run::RunArgs),
}

/// Options shared by every subcommand.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub config: Option<PathBuf>,
    pub quiet: bool,
}

/// Directory holding one run's artifacts.
#[derive(Args, Debug, Clone)]
pub struct OutputDir {
    /// Artifact directory (created if missing)
    #[arg(short = 'd', long = "dir", default_value = "faultline-out")]
    pub dir: PathBuf,
}

impl OutputDir {
    pub fn artifacts(&self) -> ArtifactDir {
        ArtifactDir::new(&self.dir)
    }
}

pub fn run(cmd: Command, global: &GlobalArgs) -> anyhow::Result<()> {
    match cmd {
        Command::Project(args) => project::run(args, global),
        Command::Cluster(args) => cluster::run(args, global),
        Command::Bridges(args) => bridges::run(&args),
        Command::Drift(args) => drift::run(&args),
        Command::Fingerprint(args) => fingerprint::run(&args),
        Command::Hubs(args) => hubs::run(args, global),
        Command::Context(args) => context::run(&args),
        Command::Run(args) => run::run(args, global),
    }
}

/// Load the config file if one was given, otherwise the defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<FaultlineConfig> {
    match path {
        Some(path) => FaultlineConfig::load(path)
            .with_context(|| format!("Cannot load config: {}", path.display())),
        None => Ok(FaultlineConfig::default()),
    }
}
