// botflow-core/src/application/classifier.rs
//
// Monotonic worklist fixed-point over the CFG. Pseudo-nodes and containers
// are transparent (OUT = IN); leaves apply the manifest's propagation mode.

use crate::domain::cfg::{Cfg, NodeRef};
use crate::domain::classification::{Classification, NodeClassification};
use crate::domain::control::{ControlType, PropagationMode};
use crate::domain::manifest::{resolve_manifest, ManifestRegistry};
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::instrument;

pub type InjectedControls = HashMap<String, HashSet<ControlType>>;

#[instrument(skip_all, fields(node_count = cfg.node_ids.len()))]
pub fn propagate_classification(
    cfg: &Cfg,
    manifests: &ManifestRegistry,
    injected: &InjectedControls,
) -> HashMap<NodeRef, NodeClassification> {
    let mut in_map: HashMap<NodeRef, Classification> = HashMap::new();
    let mut out_map: HashMap<NodeRef, Classification> = HashMap::new();
    for node in &cfg.node_ids {
        in_map.insert(node.clone(), Classification::Unclassified);
        out_map.insert(node.clone(), Classification::Unclassified);
    }

    let mut queue: VecDeque<NodeRef> = cfg.node_ids.iter().cloned().collect();
    let mut queued: HashSet<NodeRef> = cfg.node_ids.iter().cloned().collect();
    let cap = cfg.node_ids.len().saturating_mul(30).max(1);
    let mut iterations = 0usize;

    while let Some(node) = queue.pop_front() {
        queued.remove(&node);
        iterations += 1;
        if iterations > cap {
            tracing::warn!(cap, "classification worklist exceeded iteration cap, terminating early");
            break;
        }

        let new_in = Classification::join_all(cfg.pred(&node).iter().map(|p| out_map[p]));
        let new_out = transfer(&node, new_in, cfg, manifests, injected);

        let in_changed = in_map.get(&node) != Some(&new_in);
        let out_changed = out_map.get(&node) != Some(&new_out);
        in_map.insert(node.clone(), new_in);
        out_map.insert(node.clone(), new_out);

        if in_changed || out_changed {
            for (_, succ) in cfg.succ(&node) {
                if queued.insert(succ.clone()) {
                    queue.push_back(succ.clone());
                }
            }
        }
    }

    cfg.node_ids
        .iter()
        .filter(|n| !n.is_pseudo())
        .map(|n| {
            (
                n.clone(),
                NodeClassification {
                    in_: in_map[n],
                    out: out_map[n],
                },
            )
        })
        .collect()
}

fn transfer(
    node: &NodeRef,
    in_classification: Classification,
    cfg: &Cfg,
    manifests: &ManifestRegistry,
    injected: &InjectedControls,
) -> Classification {
    let Some(id) = node.real_id() else {
        // pseudo-node: transparent
        return in_classification;
    };
    let Some(info) = cfg.nodes_by_id.get(id) else {
        return in_classification;
    };
    if info.is_container {
        return in_classification;
    }

    let manifest = resolve_manifest(manifests, &info.node_type);
    let produces_max = Classification::join_all(
        manifest
            .data
            .produces
            .iter()
            .copied()
            .chain(std::iter::once(Classification::Unclassified)),
    );

    match manifest.data.propagation {
        PropagationMode::None | PropagationMode::Derive => produces_max,
        PropagationMode::PassThrough => in_classification.join(produces_max),
        PropagationMode::Transform => {
            let base = in_classification.join(produces_max);
            let controls = injected.get(id);
            let lowers = controls
                .map(|c| c.contains(&ControlType::Redact) || c.contains(&ControlType::Tokenize))
                .unwrap_or(false);
            if lowers && matches!(base, Classification::Phi | Classification::Pii) {
                Classification::Unclassified
            } else {
                base
            }
        }
    }
}
