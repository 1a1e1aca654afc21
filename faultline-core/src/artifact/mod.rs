//! Serialization adapters between pipeline stages and persisted artifacts.
//!
//! Stages exchange typed structs in memory; this module is the boundary that
//! reads and writes the on-disk interchange formats (projection CSV and JSON
//! maps). Missing files surface as [`ArtifactError::Missing`], assignment
//! entries without the required fields as
//! [`ArtifactError::MalformedAssignment`].

pub mod projection_csv;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::analyze::context::ContextMap;
use crate::contracts::{artifact_files, assignment_keys};
use crate::error::ArtifactError;
use crate::types::{
    Assignment, BridgeScore, CommunityAssignment, CommunityId, CommunityTree, DriftReport,
    Fingerprints, Hierarchy, HierarchyPath, HubMap, NodeId, WeightedProjection,
};

pub use projection_csv::{read_projection, write_projection};

pub(crate) fn ensure_parent(path: &Path) -> Result<(), ArtifactError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Read and deserialize a JSON artifact.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    if !path.exists() {
        return Err(ArtifactError::Missing(path.to_path_buf()));
    }
    let text = std::fs::read_to_string(path)?;
    serde_json::from_str(&text).map_err(|e| ArtifactError::Malformed {
        artifact: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Serialize a value as pretty JSON, creating parent directories.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), ArtifactError> {
    ensure_parent(path)?;
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json)?;
    Ok(())
}

// ── Assignments ────────────────────────────────────────────────────

/// Read a community map in either the compat shape
/// (`{macro_community, micro_community}`) or the hierarchical shape
/// (`{path: [..]}`); the first and last path entries become macro and micro.
pub fn read_assignment(path: &Path) -> Result<Assignment, ArtifactError> {
    let raw: BTreeMap<String, Value> = read_json(path)?;
    parse_assignment(&raw, path)
}

pub fn parse_assignment(
    raw: &BTreeMap<String, Value>,
    artifact: &Path,
) -> Result<Assignment, ArtifactError> {
    let malformed = |key: &str, field: &str| ArtifactError::MalformedAssignment {
        artifact: artifact.to_path_buf(),
        node_id: key.to_string(),
        field: field.to_string(),
    };

    let mut assignment = Assignment::new();
    for (key, entry) in raw {
        let key = key.as_str();
        let node: NodeId = key.parse().map_err(|_| malformed(key, "node_id"))?;

        let compat = if let Some(path) = entry.get(assignment_keys::PATH) {
            let ids = path
                .as_array()
                .filter(|a| !a.is_empty())
                .ok_or_else(|| malformed(key, assignment_keys::PATH))?;
            let first = community_id(&ids[0]).ok_or_else(|| malformed(key, assignment_keys::PATH))?;
            let last = community_id(&ids[ids.len() - 1])
                .ok_or_else(|| malformed(key, assignment_keys::PATH))?;
            CommunityAssignment {
                macro_community: first,
                micro_community: last,
            }
        } else {
            CommunityAssignment {
                macro_community: entry
                    .get(assignment_keys::MACRO)
                    .and_then(community_id)
                    .ok_or_else(|| malformed(key, assignment_keys::MACRO))?,
                micro_community: entry
                    .get(assignment_keys::MICRO)
                    .and_then(community_id)
                    .ok_or_else(|| malformed(key, assignment_keys::MICRO))?,
            }
        };
        assignment.insert(node, compat);
    }
    Ok(assignment)
}

fn community_id(value: &Value) -> Option<CommunityId> {
    value
        .as_u64()
        .and_then(|v| u32::try_from(v).ok())
        .map(CommunityId)
}

/// Read a hierarchical map (`{node_id: {path: [..]}}`).
pub fn read_hierarchy_paths(path: &Path) -> Result<BTreeMap<NodeId, HierarchyPath>, ArtifactError> {
    read_json(path)
}

// ── Output directory ───────────────────────────────────────────────

/// A directory holding one pipeline run's artifacts under canonical names.
#[derive(Debug, Clone)]
pub struct ArtifactDir {
    root: PathBuf,
}

impl ArtifactDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, file: &str) -> PathBuf {
        self.root.join(file)
    }

    pub fn write_projection(&self, projection: &WeightedProjection) -> Result<PathBuf, ArtifactError> {
        let path = self.path(artifact_files::PROJECTION);
        write_projection(&path, projection)?;
        Ok(path)
    }

    pub fn read_projection(&self) -> Result<WeightedProjection, ArtifactError> {
        read_projection(&self.path(artifact_files::PROJECTION))
    }

    /// Persist the hierarchical map, the tree, and the compat map.
    pub fn write_hierarchy(&self, hierarchy: &Hierarchy) -> Result<(), ArtifactError> {
        write_json(&self.path(artifact_files::HIERARCHICAL_MAP), &hierarchy.paths)?;
        write_json(&self.path(artifact_files::COMMUNITY_TREE), &hierarchy.tree)?;
        write_json(&self.path(artifact_files::COMMUNITY_MAP), &hierarchy.assignment())
    }

    /// Rebuild a hierarchy from its persisted map and tree.
    pub fn read_hierarchy(&self) -> Result<Hierarchy, ArtifactError> {
        let paths = read_hierarchy_paths(&self.path(artifact_files::HIERARCHICAL_MAP))?;
        let tree: CommunityTree = read_json(&self.path(artifact_files::COMMUNITY_TREE))?;
        Ok(Hierarchy { paths, tree })
    }

    pub fn read_assignment(&self) -> Result<Assignment, ArtifactError> {
        read_assignment(&self.path(artifact_files::COMMUNITY_MAP))
    }

    pub fn write_bridges(&self, bridges: &[BridgeScore]) -> Result<(), ArtifactError> {
        write_json(&self.path(artifact_files::BRIDGES), bridges)
    }

    pub fn write_drift(&self, report: &DriftReport) -> Result<(), ArtifactError> {
        write_json(&self.path(artifact_files::DRIFT), report)
    }

    /// Delete a drift report left by an earlier run, if any.
    pub fn remove_drift(&self) -> Result<(), ArtifactError> {
        match std::fs::remove_file(self.path(artifact_files::DRIFT)) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }

    pub fn write_fingerprints(&self, fingerprints: &Fingerprints) -> Result<(), ArtifactError> {
        write_json(&self.path(artifact_files::FINGERPRINTS), fingerprints)
    }

    /// Fingerprints of a previous run, if that run persisted any.
    pub fn read_fingerprints(&self) -> Result<Option<Fingerprints>, ArtifactError> {
        match read_json(&self.path(artifact_files::FINGERPRINTS)) {
            Ok(fp) => Ok(Some(fp)),
            Err(ArtifactError::Missing(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn write_hubs(&self, hubs: &HubMap) -> Result<(), ArtifactError> {
        write_json(&self.path(artifact_files::HUBS), hubs)
    }

    pub fn read_hubs(&self) -> Result<HubMap, ArtifactError> {
        read_json(&self.path(artifact_files::HUBS))
    }

    pub fn write_context(&self, context: &ContextMap) -> Result<(), ArtifactError> {
        write_json(&self.path(artifact_files::CONTEXT), context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ResolutionLevel;

    fn raw(json: &str) -> BTreeMap<String, Value> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn parses_compat_assignment() {
        let map = raw(r#"{"1": {"macro_community": 0, "micro_community": 2}}"#);
        let assignment = parse_assignment(&map, Path::new("community_map.json")).unwrap();
        assert_eq!(assignment[&NodeId(1)].micro_community, CommunityId(2));
    }

    #[test]
    fn parses_path_assignment() {
        let map = raw(r#"{"7": {"path": [1, 4, 6]}}"#);
        let assignment = parse_assignment(&map, Path::new("h.json")).unwrap();
        assert_eq!(assignment[&NodeId(7)].macro_community, CommunityId(1));
        assert_eq!(assignment[&NodeId(7)].micro_community, CommunityId(6));
    }

    #[test]
    fn missing_micro_is_malformed() {
        let map = raw(r#"{"3": {"macro_community": 0}}"#);
        let err = parse_assignment(&map, Path::new("community_map.json")).unwrap_err();
        match err {
            ArtifactError::MalformedAssignment { node_id, field, .. } => {
                assert_eq!(node_id, "3");
                assert_eq!(field, "micro_community");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_path_is_malformed() {
        let map = raw(r#"{"3": {"path": []}}"#);
        assert!(matches!(
            parse_assignment(&map, Path::new("h.json")),
            Err(ArtifactError::MalformedAssignment { .. })
        ));
    }

    #[test]
    fn non_numeric_key_is_malformed() {
        let map = raw(r#"{"bgp": {"macro_community": 0, "micro_community": 0}}"#);
        assert!(matches!(
            parse_assignment(&map, Path::new("m.json")),
            Err(ArtifactError::MalformedAssignment { field, .. }) if field == "node_id"
        ));
    }

    #[test]
    fn missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = ArtifactDir::new(dir.path());
        assert!(matches!(
            artifacts.read_assignment(),
            Err(ArtifactError::Missing(_))
        ));
        assert!(artifacts.read_fingerprints().unwrap().is_none());
    }

    #[test]
    fn hierarchy_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = ArtifactDir::new(dir.path().join("run"));

        let mut paths = BTreeMap::new();
        paths.insert(
            NodeId(1),
            HierarchyPath {
                path: vec![CommunityId(0), CommunityId(0)],
            },
        );
        paths.insert(
            NodeId(2),
            HierarchyPath {
                path: vec![CommunityId(0), CommunityId(1)],
            },
        );
        let tree = CommunityTree {
            levels: vec![
                ResolutionLevel::from_membership(
                    0.1,
                    [(NodeId(1), CommunityId(0)), (NodeId(2), CommunityId(0))],
                ),
                ResolutionLevel::from_membership(
                    1.0,
                    [(NodeId(1), CommunityId(0)), (NodeId(2), CommunityId(1))],
                ),
            ],
        };
        let hierarchy = Hierarchy { paths, tree };
        artifacts.write_hierarchy(&hierarchy).unwrap();

        assert_eq!(artifacts.read_hierarchy().unwrap(), hierarchy);
        assert_eq!(artifacts.read_assignment().unwrap(), hierarchy.assignment());

        let compat: Value = read_json(&artifacts.path(artifact_files::COMMUNITY_MAP)).unwrap();
        assert_eq!(compat["2"]["micro_community"], 1);
    }
}
