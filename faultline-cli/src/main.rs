use std::path::PathBuf;

use clap::Parser;

use faultline_core::error::{AnalyzeError, ArtifactError, ConfigError, FaultlineError};

mod commands;

#[derive(Parser, Debug)]
#[command(
    name = "faultline",
    version,
    about = "Partition fault graphs into hierarchical fault domains for root-cause analysis"
)]
struct Cli {
    #[command(subcommand)]
    command: commands::Command,

    /// Path to a faultline.toml configuration file
    #[arg(short, long, global = true, env = "FAULTLINE_CONFIG")]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,
}

/// Classify an error into an exit code.
///
///   0: success
///   1: general/unknown error
///   2: configuration error
///   3: missing artifact or input file
///   4: malformed artifact, input shape mismatch
///   5: empty graph
fn classify_exit_code(err: &anyhow::Error) -> i32 {
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<FaultlineError>() {
            return match e {
                FaultlineError::Config(_) => 2,
                FaultlineError::Artifact(a) => artifact_exit_code(a),
                FaultlineError::Analyze(a) => analyze_exit_code(a),
            };
        }
        if cause.downcast_ref::<ConfigError>().is_some() {
            return 2;
        }
        if let Some(a) = cause.downcast_ref::<ArtifactError>() {
            return artifact_exit_code(a);
        }
    }
    1
}

fn artifact_exit_code(err: &ArtifactError) -> i32 {
    match err {
        ArtifactError::Missing(_) => 3,
        ArtifactError::MalformedAssignment { .. }
        | ArtifactError::Malformed { .. }
        | ArtifactError::Json(_) => 4,
        ArtifactError::Io(_) => 1,
    }
}

fn analyze_exit_code(err: &AnalyzeError) -> i32 {
    match err {
        AnalyzeError::InputShape { .. } | AnalyzeError::MissingEmbedding(_) => 4,
        AnalyzeError::EmptyGraph(_) => 5,
        AnalyzeError::InvalidResolutions(_) => 2,
        AnalyzeError::Computation(_) => 1,
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    let filter = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (_, 0) => "warn",
        (_, 1) => "info",
        (_, 2) => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();

    let global = commands::GlobalArgs {
        config: cli.config,
        quiet: cli.quiet,
    };

    match commands::run(cli.command, &global) {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(classify_exit_code(&e));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use anyhow::Context;

    use super::*;

    fn wrapped(err: impl Into<FaultlineError>) -> anyhow::Error {
        Err::<(), FaultlineError>(err.into()).context("Stage failed").unwrap_err()
    }

    #[test]
    fn exit_code_config() {
        assert_eq!(classify_exit_code(&wrapped(ConfigError::Invalid("x".into()))), 2);
        let bare = anyhow::Error::new(ConfigError::NotFound("faultline.toml".into()));
        assert_eq!(classify_exit_code(&bare), 2);
    }

    #[test]
    fn exit_code_missing_artifact() {
        let err = wrapped(ArtifactError::Missing(PathBuf::from("community_map.json")));
        assert_eq!(classify_exit_code(&err), 3);
    }

    #[test]
    fn exit_code_malformed_assignment() {
        let err = wrapped(ArtifactError::MalformedAssignment {
            artifact: PathBuf::from("community_map.json"),
            node_id: "7".into(),
            field: "micro_community".into(),
        });
        assert_eq!(classify_exit_code(&err), 4);
    }

    #[test]
    fn exit_code_input_shape() {
        let err = wrapped(AnalyzeError::InputShape {
            context: "embeddings vs nodes".into(),
            expected: 3,
            actual: 2,
        });
        assert_eq!(classify_exit_code(&err), 4);
    }

    #[test]
    fn exit_code_empty_graph() {
        assert_eq!(classify_exit_code(&wrapped(AnalyzeError::EmptyGraph("none".into()))), 5);
    }

    #[test]
    fn exit_code_bare_artifact_error() {
        let err = anyhow::Error::new(ArtifactError::Missing(PathBuf::from("x.csv")))
            .context("Cannot read projection");
        assert_eq!(classify_exit_code(&err), 3);
    }

    #[test]
    fn exit_code_general() {
        let err = anyhow::anyhow!("Something unexpected happened");
        assert_eq!(classify_exit_code(&err), 1);
    }
}
