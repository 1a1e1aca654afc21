use std::time::{Duration, Instant};

use faultline_core::config::FaultlineConfig;
use faultline_core::pipeline::FaultlinePipeline;
use faultline_core::progress::NoopReporter;
use faultline_core::snapshot::{GraphSnapshot, SnapshotNode, StructuralLink};
use faultline_core::types::NodeId;

fn threshold_ms(var: &str, default_ms: u64) -> Duration {
    let ms = std::env::var(var)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default_ms);
    Duration::from_millis(ms)
}

/// `node_count` alarms in `domains` fault domains: a causal chain inside each
/// domain plus one link between neighbouring domains.
fn synthetic_snapshot(node_count: usize, domains: usize) -> GraphSnapshot {
    let nodes = (0..node_count)
        .map(|i| {
            let domain = i % domains;
            let embedding = (0..32)
                .map(|d| {
                    let noise = ((i * 31 + d * 17) % 50) as f32 / 1000.0;
                    if d % domains == domain { 1.0 + noise } else { noise }
                })
                .collect();
            SnapshotNode {
                id: NodeId(i as i64),
                text: Some(format!("ALARM_{domain}_{i}")),
                embedding: Some(embedding),
            }
        })
        .collect();

    let mut edges: Vec<StructuralLink> = (domains..node_count)
        .map(|i| StructuralLink {
            source: NodeId(i as i64),
            target: NodeId((i - domains) as i64),
        })
        .collect();
    edges.extend((1..domains).map(|d| StructuralLink {
        source: NodeId(d as i64),
        target: NodeId((d - 1) as i64),
    }));

    GraphSnapshot { nodes, edges }
}

#[test]
#[ignore = "performance gate; run explicitly in CI/dev workflows"]
fn perf_full_pipeline_under_threshold() {
    let snapshot = synthetic_snapshot(600, 6);
    let pipeline = FaultlinePipeline::new(FaultlineConfig::default());

    let t0 = Instant::now();
    let output = pipeline.run(&snapshot, None, &NoopReporter).unwrap();
    let elapsed = t0.elapsed();

    assert_eq!(output.assignment.len(), 600);
    assert!(
        elapsed <= threshold_ms("FAULTLINE_PERF_PIPELINE_MS", 10000),
        "full pipeline exceeded threshold: {elapsed:?}"
    );
}

#[test]
#[ignore = "performance gate; run explicitly in CI/dev workflows"]
fn perf_rerun_with_baseline_under_threshold() {
    let snapshot = synthetic_snapshot(600, 6);
    let pipeline = FaultlinePipeline::new(FaultlineConfig::default());
    let first = pipeline.run(&snapshot, None, &NoopReporter).unwrap();
    let previous = faultline_core::pipeline::PreviousRun {
        assignment: first.assignment,
        fingerprints: Some(first.fingerprints),
    };

    let t0 = Instant::now();
    let second = pipeline.run(&snapshot, Some(&previous), &NoopReporter).unwrap();
    let elapsed = t0.elapsed();

    assert_eq!(
        second.drift.map(|d| d.summary.drift_count),
        Some(0),
        "identical snapshot should not drift"
    );
    assert!(
        elapsed <= threshold_ms("FAULTLINE_PERF_RERUN_MS", 10000),
        "pipeline rerun exceeded threshold: {elapsed:?}"
    );
}
