//! Canonical cross-component contracts for artifact names and formats.
//!
//! This module centralizes file names and format constants shared between
//! the artifact adapters, the pipeline, the CLI, and the test fixtures.

/// File names inside a pipeline output directory.
pub mod artifact_files {
    pub const PROJECTION: &str = "weighted_projection.csv";
    pub const COMMUNITY_MAP: &str = "community_map.json";
    pub const HIERARCHICAL_MAP: &str = "hierarchical_community_map.json";
    pub const COMMUNITY_TREE: &str = "community_tree.json";
    pub const BRIDGES: &str = "bridge_nodes.json";
    pub const DRIFT: &str = "drift_analysis.json";
    pub const FINGERPRINTS: &str = "community_fingerprints.json";
    pub const HUBS: &str = "community_hubs.json";
    pub const CONTEXT: &str = "community_context.json";
    pub const MANIFEST: &str = "run_manifest.json";
}

/// Projection CSV layout.
pub mod projection_csv {
    pub const HEADER: &str = "source,target,weight,type";
    pub const COLUMNS: usize = 4;
    /// Fixed decimal digits for persisted weights.
    pub const WEIGHT_DECIMALS: usize = 4;
}

/// Assignment entry field names.
pub mod assignment_keys {
    pub const MACRO: &str = "macro_community";
    pub const MICRO: &str = "micro_community";
    pub const PATH: &str = "path";
}

/// Round a weight to the persisted precision.
pub fn round_weight(weight: f64) -> f64 {
    (weight * 10_000.0).round() / 10_000.0
}
