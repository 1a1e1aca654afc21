// Temporal drift: community migration between a baseline and a current run.
//
// Stability ratio intentionally casts counts to f64.
#![allow(clippy::cast_precision_loss)]

use std::collections::BTreeSet;

use tracing::info;

use crate::types::{Assignment, DriftReport, DriftSummary, DriftType, MigratedNode};

/// Compare two assignments node by node.
///
/// Nodes only in `current` are new, nodes only in `baseline` are removed;
/// both count toward `total_nodes` but neither is drift.
pub fn detect_drift(current: &Assignment, baseline: &Assignment) -> DriftReport {
    let mut report = DriftReport::default();

    for (&node, curr) in current {
        let Some(prev) = baseline.get(&node) else {
            report.new_nodes.push(node);
            continue;
        };

        let macro_drift = curr.macro_community != prev.macro_community;
        let micro_drift = curr.micro_community != prev.micro_community;
        if macro_drift || micro_drift {
            report.migrated_nodes.push(MigratedNode {
                node_id: node,
                from_macro: prev.macro_community,
                to_macro: curr.macro_community,
                from_micro: prev.micro_community,
                to_micro: curr.micro_community,
                drift_type: if macro_drift {
                    DriftType::Macro
                } else {
                    DriftType::Micro
                },
            });
        } else {
            report.stable_nodes.push(node);
        }
    }

    report.removed_nodes = baseline
        .keys()
        .filter(|node| !current.contains_key(node))
        .copied()
        .collect();

    let total_nodes = current.keys().chain(baseline.keys()).collect::<BTreeSet<_>>().len();
    let drift_count = report.migrated_nodes.len();
    let stability_index = if total_nodes == 0 {
        0.0
    } else {
        1.0 - drift_count as f64 / total_nodes as f64
    };
    report.summary = DriftSummary {
        total_nodes,
        drift_count,
        stability_index,
    };

    info!(
        total = total_nodes,
        drift = drift_count,
        new = report.new_nodes.len(),
        removed = report.removed_nodes.len(),
        stability = stability_index,
        "Drift analysis complete"
    );
    report
}
