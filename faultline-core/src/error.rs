use std::path::PathBuf;

/// Top-level Faultline error type.
///
/// All fallible operations in `faultline-core` return [`Result<T, FaultlineError>`](Result).
/// Each variant wraps a domain-specific error enum, allowing callers to
/// match on the error source without losing type information.
#[derive(thiserror::Error, Debug)]
pub enum FaultlineError {
    /// Error during analysis (projection, partitioning, hubs, etc.).
    #[error("Analysis error: {0}")]
    Analyze(#[from] AnalyzeError),

    /// Error reading or writing a persisted artifact.
    #[error("Artifact error: {0}")]
    Artifact(#[from] ArtifactError),

    /// Error in configuration parsing or validation.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors raised by the analytic stages.
///
/// All of these are local validation failures detected before expensive
/// computation; none are retried.
#[derive(thiserror::Error, Debug)]
pub enum AnalyzeError {
    /// Index-aligned inputs disagree in length or dimension.
    #[error("Input shape mismatch in {context}: expected {expected}, got {actual}")]
    InputShape {
        /// Which input pair was being aligned.
        context: String,
        /// Expected length or dimension.
        expected: usize,
        /// Observed length or dimension.
        actual: usize,
    },

    /// A node has no embedding and no text the embedder could use.
    #[error("Node {0} has neither an embedding nor text to embed")]
    MissingEmbedding(String),

    /// Partitioning was attempted on a graph without edges.
    #[error("Empty graph: {0}")]
    EmptyGraph(String),

    /// The resolution list cannot produce a hierarchy.
    #[error("Invalid resolutions: {0}")]
    InvalidResolutions(String),

    /// Algorithmic or numerical error during computation.
    #[error("Computation error: {0}")]
    Computation(String),
}

/// Errors from the artifact adapters (projection CSV, JSON maps).
#[derive(thiserror::Error, Debug)]
pub enum ArtifactError {
    /// A referenced artifact does not exist.
    #[error("Artifact not found: {}", .0.display())]
    Missing(PathBuf),

    /// An assignment entry lacks a required field or has the wrong type.
    #[error("Malformed assignment in {}: node {node_id} has no valid `{field}`", artifact.display())]
    MalformedAssignment {
        /// Artifact the entry was read from.
        artifact: PathBuf,
        /// Raw key of the offending entry.
        node_id: String,
        /// Field that was missing or invalid.
        field: String,
    },

    /// Artifact content could not be interpreted.
    #[error("Malformed artifact {}: {message}", artifact.display())]
    Malformed {
        /// Path of the artifact.
        artifact: PathBuf,
        /// Description of the problem.
        message: String,
    },

    /// Filesystem I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors in Faultline configuration parsing and validation.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The configuration file does not exist at the expected path.
    #[error("Config file not found: {0}")]
    NotFound(String),

    /// Configuration values are present but semantically invalid.
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// Configuration file syntax could not be parsed (TOML error).
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Convenience alias for `Result<T, FaultlineError>`.
pub type Result<T> = std::result::Result<T, FaultlineError>;
