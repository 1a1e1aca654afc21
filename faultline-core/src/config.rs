use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level Faultline configuration, matching `faultline.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FaultlineConfig {
    #[serde(default)]
    pub projection: ProjectionSection,
    #[serde(default)]
    pub partition: PartitionSection,
    #[serde(default)]
    pub hubs: HubSection,
}

impl FaultlineConfig {
    /// Load and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Parse(format!("{}: {e}", path.display())))?;
        let config = Self::from_toml(&text)?;
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.projection.validate()?;
        self.partition.validate()?;
        self.hubs.validate()
    }
}

/// Weighting of structural vs semantic signals in the projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionSection {
    /// Weight of every structural (causal) edge.
    pub alpha: f64,
    /// Multiplier applied to cosine similarity for semantic edges.
    pub beta: f64,
    /// Minimum cosine similarity for a semantic edge.
    pub similarity_threshold: f64,
}

impl Default for ProjectionSection {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            beta: 0.5,
            similarity_threshold: 0.85,
        }
    }
}

impl ProjectionSection {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [("alpha", self.alpha), ("beta", self.beta)] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "projection.{name} must be finite and >= 0, got {value}"
                )));
            }
        }
        if !self.similarity_threshold.is_finite() {
            return Err(ConfigError::Invalid(
                "projection.similarity_threshold must be finite".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartitionSection {
    /// Resolution per hierarchy level; sorted ascending before use.
    pub resolutions: Vec<f64>,
    /// Local-moving sweeps for the built-in detector.
    pub max_iterations: u32,
}

impl Default for PartitionSection {
    fn default() -> Self {
        Self {
            resolutions: vec![0.01, 0.1, 1.0],
            max_iterations: 20,
        }
    }
}

impl PartitionSection {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.resolutions.is_empty() {
            return Err(ConfigError::Invalid(
                "partition.resolutions must name at least one level".into(),
            ));
        }
        if let Some(bad) = self.resolutions.iter().find(|r| !r.is_finite() || **r < 0.0) {
            return Err(ConfigError::Invalid(format!(
                "partition.resolutions must be finite and >= 0, got {bad}"
            )));
        }
        if self.max_iterations == 0 {
            return Err(ConfigError::Invalid(
                "partition.max_iterations must be > 0".into(),
            ));
        }
        Ok(())
    }
}

/// Intra-community `PageRank` settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubSection {
    pub top_k: usize,
    /// `PageRank` damping factor.
    pub damping: f64,
    pub max_iterations: u32,
    /// L1 change between iterations below which `PageRank` stops.
    pub tolerance: f64,
}

impl Default for HubSection {
    fn default() -> Self {
        Self {
            top_k: 10,
            damping: 0.85,
            max_iterations: 100,
            tolerance: 1e-6,
        }
    }
}

impl HubSection {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.damping) {
            return Err(ConfigError::Invalid(format!(
                "hubs.damping must be within [0, 1], got {}",
                self.damping
            )));
        }
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(ConfigError::Invalid(
                "hubs.tolerance must be finite and > 0".into(),
            ));
        }
        if self.max_iterations == 0 {
            return Err(ConfigError::Invalid("hubs.max_iterations must be > 0".into()));
        }
        Ok(())
    }
}
