use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{Value, json};

// ── Fixtures ──

fn write_snapshot(dir: &Path) -> std::path::PathBuf {
    let snapshot = json!({
        "nodes": [
            {"id": 101, "text": "BGP_DOWN", "embedding": [1.0, 0.2, 0.0]},
            {"id": 102, "text": "HOLD_TIMER_EXPIRED", "embedding": [0.9, 0.3, 0.1]},
            {"id": 104, "text": "BGP_NOTIFICATION", "embedding": [0.95, 0.25, 0.05]},
            {"id": 103, "text": "MTU_MISMATCH", "embedding": [0.1, 0.8, 0.9]},
            {"id": 105, "text": "OSPF_ADJ_STUCK", "embedding": [0.05, 0.85, 0.95]},
            {"id": 106, "text": "MTU_DROP", "embedding": [0.15, 0.75, 0.85]}
        ],
        "edges": [
            {"source": 102, "target": 101},
            {"source": 104, "target": 101},
            {"source": 103, "target": 105},
            {"source": 106, "target": 103},
            {"source": 101, "target": 103}
        ]
    });
    let path = dir.join("snapshot.json");
    std::fs::write(&path, snapshot.to_string()).unwrap();
    path
}

fn faultline() -> Command {
    let mut cmd = Command::cargo_bin("faultline").unwrap();
    cmd.env_remove("FAULTLINE_CONFIG").env_remove("RUST_LOG");
    cmd
}

fn read(path: &Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

// ── End-to-end run ──

#[test]
fn run_writes_all_artifacts() {
    let tmp = tempfile::tempdir().unwrap();
    let snapshot = write_snapshot(tmp.path());
    let out = tmp.path().join("out");

    faultline()
        .args(["-q", "run", "--resolutions", "0.05,1.0", "--snapshot"])
        .arg(&snapshot)
        .arg("--dir")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("6 nodes"))
        .stdout(predicate::str::contains("2 micro communities"));

    for file in [
        "weighted_projection.csv",
        "community_map.json",
        "hierarchical_community_map.json",
        "community_tree.json",
        "bridge_nodes.json",
        "community_fingerprints.json",
        "community_hubs.json",
        "community_context.json",
        "run_manifest.json",
    ] {
        assert!(out.join(file).exists(), "missing {file}");
    }
    assert!(!out.join("drift_analysis.json").exists());

    let manifest = read(&out.join("run_manifest.json"));
    assert_eq!(manifest["nodes"], 6);
    assert_eq!(manifest["structural_edges"], 5);
}

#[test]
fn rerun_reports_full_stability() {
    let tmp = tempfile::tempdir().unwrap();
    let snapshot = write_snapshot(tmp.path());
    let out = tmp.path().join("out");

    for _ in 0..2 {
        faultline()
            .args(["-q", "run", "-r", "0.05,1.0", "-s"])
            .arg(&snapshot)
            .arg("-d")
            .arg(&out)
            .assert()
            .success();
    }

    let drift = read(&out.join("drift_analysis.json"));
    assert_eq!(drift["summary"]["drift_count"], 0);
    assert_eq!(drift["summary"]["stability_index"], 1.0);
    let manifest = read(&out.join("run_manifest.json"));
    assert_eq!(manifest["changed_communities"]["micro_communities"], json!([]));
}

#[test]
fn no_drift_run_removes_earlier_report() {
    let tmp = tempfile::tempdir().unwrap();
    let snapshot = write_snapshot(tmp.path());
    let out = tmp.path().join("out");

    for extra in [None, None, Some("--no-drift")] {
        faultline()
            .args(["-q", "run", "-r", "0.05,1.0", "-s"])
            .arg(&snapshot)
            .arg("-d")
            .arg(&out)
            .args(extra)
            .assert()
            .success();
    }

    assert!(!out.join("drift_analysis.json").exists());
    let manifest = read(&out.join("run_manifest.json"));
    assert!(manifest.get("drift").is_none());
}

// ── Stage by stage ──

#[test]
fn stages_chain_through_artifacts() {
    let tmp = tempfile::tempdir().unwrap();
    let snapshot = write_snapshot(tmp.path());
    let out = tmp.path().join("staged");

    faultline()
        .args(["project", "-s"])
        .arg(&snapshot)
        .arg("-d")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("5 structural"));

    faultline()
        .args(["cluster", "-r", "1.0,0.05", "-d"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("into 2 levels"));

    faultline().args(["bridges", "-d"]).arg(&out).assert().success();
    faultline()
        .args(["fingerprint", "--levels", "-d"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"resolution\": 0.05"));
    faultline()
        .args(["hubs", "-k", "2", "-d"])
        .arg(&out)
        .assert()
        .success();
    faultline()
        .args(["context", "-s"])
        .arg(&snapshot)
        .arg("-d")
        .arg(&out)
        .assert()
        .success();

    let bridges = read(&out.join("bridge_nodes.json"));
    assert!(
        bridges
            .as_array()
            .unwrap()
            .iter()
            .any(|b| b["node_id"] == "101")
    );

    let hubs = read(&out.join("community_hubs.json"));
    for rankings in hubs.as_object().unwrap().values() {
        assert!(rankings.as_array().unwrap().len() <= 2);
    }

    let context = read(&out.join("community_context.json"));
    let biographies: Vec<&str> = context
        .as_object()
        .unwrap()
        .values()
        .flat_map(|profiles| profiles.as_array().unwrap())
        .map(|p| p["biography"].as_str().unwrap())
        .collect();
    assert!(!biographies.is_empty());
    assert!(!biographies.contains(&"Unknown Entity"));
}

#[test]
fn drift_between_maps() {
    let tmp = tempfile::tempdir().unwrap();
    let baseline = tmp.path().join("baseline.json");
    let current = tmp.path().join("current.json");
    std::fs::write(
        &baseline,
        json!({
            "1": {"macro_community": 0, "micro_community": 0},
            "2": {"macro_community": 0, "micro_community": 1}
        })
        .to_string(),
    )
    .unwrap();
    std::fs::write(
        &current,
        json!({
            "1": {"path": [0, 0]},
            "2": {"path": [0, 2]},
            "3": {"path": [1, 3]}
        })
        .to_string(),
    )
    .unwrap();

    faultline()
        .arg("drift")
        .arg("--current")
        .arg(&current)
        .arg("--baseline")
        .arg(&baseline)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 of 3 nodes drifted"));

    let report = read(&tmp.path().join("drift_analysis.json"));
    assert_eq!(report["new_nodes"], json!(["3"]));
    assert_eq!(report["migrated_nodes"][0]["drift_type"], "MICRO");
}

// ── Exit codes ──

#[test]
fn missing_projection_exits_3() {
    let tmp = tempfile::tempdir().unwrap();
    faultline()
        .args(["cluster", "-d"])
        .arg(tmp.path())
        .assert()
        .code(3)
        .stderr(predicate::str::contains("weighted_projection.csv"));
}

#[test]
fn invalid_config_exits_2() {
    let tmp = tempfile::tempdir().unwrap();
    let snapshot = write_snapshot(tmp.path());
    let config = tmp.path().join("faultline.toml");
    std::fs::write(&config, "[projection]\nalpha = -1.0\n").unwrap();

    faultline()
        .arg("--config")
        .arg(&config)
        .args(["project", "-s"])
        .arg(&snapshot)
        .arg("-d")
        .arg(tmp.path())
        .assert()
        .code(2);
}

#[test]
fn missing_embedding_exits_4() {
    let tmp = tempfile::tempdir().unwrap();
    let snapshot = tmp.path().join("snapshot.json");
    std::fs::write(
        &snapshot,
        json!({"nodes": [{"id": 1, "text": "LINK_DOWN"}], "edges": []}).to_string(),
    )
    .unwrap();

    faultline()
        .args(["project", "-s"])
        .arg(&snapshot)
        .arg("-d")
        .arg(tmp.path())
        .assert()
        .code(4);
}

#[test]
fn edgeless_graph_exits_5() {
    let tmp = tempfile::tempdir().unwrap();
    let snapshot = tmp.path().join("snapshot.json");
    std::fs::write(
        &snapshot,
        json!({
            "nodes": [
                {"id": 1, "embedding": [1.0, 0.0]},
                {"id": 2, "embedding": [0.0, 1.0]}
            ],
            "edges": []
        })
        .to_string(),
    )
    .unwrap();

    faultline()
        .args(["-q", "run", "-s"])
        .arg(&snapshot)
        .arg("-d")
        .arg(tmp.path().join("out"))
        .assert()
        .code(5);
}
