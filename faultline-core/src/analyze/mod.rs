pub mod bridge;
pub mod context;
pub mod drift;
pub mod fingerprint;
pub mod hubs;
pub mod louvain;
pub mod partition;
pub mod projection;

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Statistics recorded for one pipeline stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageStats {
    pub stage: String,
    /// Records the stage produced (edges, nodes, communities, ...).
    pub items: u64,
    #[serde(with = "duration_millis")]
    pub duration: Duration,
}

impl StageStats {
    pub fn new(stage: &str, items: usize, duration: Duration) -> Self {
        Self {
            stage: stage.to_string(),
            items: items as u64,
            duration,
        }
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::cast_possible_truncation)]
    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
