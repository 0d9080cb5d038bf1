// botflow-core/src/application/plan_compiler.rs
//
// Assigns step ids to real leaves in DSL discovery order, resolves every
// CFG jump through its chain of pseudo-nodes down to a concrete step id or
// the literal `END`, and produces the final `ExecutionPlan` plus its stable
// hash. This is the only phase that ever produces a `Step`.

use crate::domain::cfg::{Cfg, NodeRef, ROOT_SCOPE};
use crate::domain::classification::NodeClassification;
use crate::domain::control::ControlSet;
use crate::domain::dsl::{BotDsl, DslNode};
use crate::domain::manifest::{resolve_manifest, ManifestRegistry};
use crate::domain::plan::{
    ExecutionPlan, Jump, PolicyFinding, PolicyOutcome, RunMeta, Step, StepRuntime, END_STEP,
    PLAN_VERSION,
};
use crate::error::CompileError;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::instrument;

/// Everything the plan compiler needs that a single `compile()` call already
/// has lying around from earlier phases — bundled so the function signature
/// doesn't grow a parameter every time a phase adds a new fact about a node.
pub struct PlanInputs<'a> {
    pub cfg: &'a Cfg,
    pub dsl: &'a BotDsl,
    pub manifests: &'a ManifestRegistry,
    pub classifications: &'a HashMap<NodeRef, NodeClassification>,
    pub requires_controls: &'a HashMap<String, ControlSet>,
    pub blocks: Vec<PolicyFinding>,
    pub warnings: Vec<PolicyFinding>,
    pub run: RunMeta,
}

#[instrument(skip_all, fields(node_count = inputs.dsl.nodes.len()))]
pub fn compile_execution_plan(inputs: PlanInputs<'_>) -> Result<ExecutionPlan, CompileError> {
    let PlanInputs {
        cfg,
        dsl,
        manifests,
        classifications,
        requires_controls,
        blocks,
        warnings,
        run,
    } = inputs;

    let mut discovery = Vec::new();
    collect_discovery_order(&dsl.nodes, &mut discovery);
    let leaf_ids = cfg.real_leaf_ids_in_order(&discovery);

    let mut step_id_of: HashMap<String, String> = HashMap::new();
    for (i, id) in leaf_ids.iter().enumerate() {
        step_id_of.insert(id.clone(), format!("step_{i}"));
    }

    let mut steps = Vec::with_capacity(leaf_ids.len());
    for id in &leaf_ids {
        let info = cfg
            .nodes_by_id
            .get(id)
            .ok_or_else(|| CompileError::Internal(format!("leaf '{id}' missing from CFG index")))?;
        let manifest = resolve_manifest(manifests, &info.node_type);
        let classification = classifications
            .get(&NodeRef::Real(id.clone()))
            .copied()
            .unwrap_or_default();
        let controls: Vec<_> = requires_controls
            .get(id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();

        let mut jumps = resolve_jumps(cfg, id, &step_id_of);
        ensure_default_jump(&mut jumps, "success");
        ensure_default_jump(&mut jumps, "error");
        jumps.sort();

        steps.push(Step {
            step_id: step_id_of[id].clone(),
            node_id: id.clone(),
            type_: info.node_type.clone(),
            resolved_config: info.config.clone().into_iter().collect::<BTreeMap<_, _>>(),
            controls,
            classification,
            runtime: StepRuntime {
                idempotent: manifest.runtime.idempotent,
                retry: manifest.runtime.default_retry,
                timeout_ms: manifest.runtime.timeout_ms,
            },
            jumps,
        });
    }

    let mut entry_step_id = resolve_jump_target(
        cfg,
        &NodeRef::Entry(ROOT_SCOPE.to_string()),
        &step_id_of,
        &mut HashSet::new(),
    );
    if entry_step_id == END_STEP {
        entry_step_id = steps
            .first()
            .map(|s| s.step_id.clone())
            .unwrap_or_else(|| END_STEP.to_string());
    }

    Ok(ExecutionPlan {
        plan_version: PLAN_VERSION.to_string(),
        run,
        entry_step_id,
        steps,
        policy: PolicyOutcome { blocks, warnings },
    })
}

/// Pre-order node ids exactly as they appear in the DSL (root array, then
/// each container's own `children` array) — the "DSL discovery order" every
/// ordering guarantee in this module is defined against.
fn collect_discovery_order(nodes: &[DslNode], out: &mut Vec<String>) {
    for node in nodes {
        out.push(node.id.clone());
        if node.is_container() {
            collect_discovery_order(&node.children, out);
        }
    }
}

/// One jump per distinct outgoing port from `node_id`, first occurrence
/// wins, each target resolved down through its chain of pseudo-nodes.
fn resolve_jumps(cfg: &Cfg, node_id: &str, step_id_of: &HashMap<String, String>) -> Vec<Jump> {
    let mut seen_ports = HashSet::new();
    let mut jumps = Vec::new();
    for (port, target) in cfg.succ(&NodeRef::Real(node_id.to_string())) {
        if !seen_ports.insert(port.clone()) {
            continue;
        }
        let to_step_id = resolve_jump_target(cfg, target, step_id_of, &mut HashSet::new());
        jumps.push(Jump {
            on: port.clone(),
            to_step_id,
        });
    }
    jumps
}

fn ensure_default_jump(jumps: &mut Vec<Jump>, port: &str) {
    if !jumps.iter().any(|j| j.on == port) {
        jumps.push(Jump {
            on: port.to_string(),
            to_step_id: END_STEP.to_string(),
        });
    }
}

/// Follows a chain of pseudo-nodes (`ENTRY`/`END`/`DONE`/`NEXT_ITER`) or a
/// container's first port entry down to the first node that either has an
/// assigned step id or has no further successor, in which case the jump
/// resolves to `END`. A container's own `success`/`error`/`done` output
/// edges are emitted before its port-entry edges (`build_cfg` runs
/// `emit_region_edges` before `build_container`), so a container target
/// must skip those and follow its first structural port (`then`/`try`/
/// `body`/`default`/`case_*`/`branch_*`) instead of blindly taking
/// `cfg.succ(target).first()`. A `visited` set guards against the
/// loop-back cycle `NEXT_ITER -> body.entryId -> ... -> NEXT_ITER`.
fn resolve_jump_target(
    cfg: &Cfg,
    target: &NodeRef,
    step_id_of: &HashMap<String, String>,
    visited: &mut HashSet<NodeRef>,
) -> String {
    if !visited.insert(target.clone()) {
        return END_STEP.to_string();
    }
    if let NodeRef::Real(id) = target {
        if let Some(step_id) = step_id_of.get(id) {
            return step_id.clone();
        }
        if cfg.nodes_by_id.get(id).is_some_and(|info| info.is_container) {
            let port_entry = cfg
                .succ(target)
                .iter()
                .find(|(port, _)| !matches!(port.as_str(), "success" | "error" | "done"));
            return match port_entry {
                Some((_, next)) => resolve_jump_target(cfg, next, step_id_of, visited),
                None => END_STEP.to_string(),
            };
        }
    }
    match cfg.succ(target).first() {
        Some((_, next)) => resolve_jump_target(cfg, next, step_id_of, visited),
        None => END_STEP.to_string(),
    }
}

/// Fails if any jump targets a step id that doesn't exist, or if the plan
/// has steps but its entry point is unreachable (`entryStepId == END`).
pub fn validate_execution_plan(plan: &ExecutionPlan) -> Result<(), CompileError> {
    let step_ids: HashSet<&str> = plan.steps.iter().map(|s| s.step_id.as_str()).collect();
    for step in &plan.steps {
        for jump in &step.jumps {
            if jump.to_step_id != END_STEP && !step_ids.contains(jump.to_step_id.as_str()) {
                return Err(CompileError::DanglingJump {
                    step_id: step.step_id.clone(),
                    target: jump.to_step_id.clone(),
                });
            }
        }
    }
    if !plan.steps.is_empty() && plan.entry_step_id == END_STEP {
        return Err(CompileError::UnreachableEntry {
            step_count: plan.steps.len(),
        });
    }
    Ok(())
}

#[derive(Serialize)]
struct HashStep<'a> {
    node_id: &'a str,
    #[serde(rename = "type")]
    type_: &'a str,
    resolved_config: &'a BTreeMap<String, serde_json::Value>,
    controls: &'a [crate::domain::control::ControlType],
    jumps: Vec<&'a Jump>,
}

#[derive(Serialize)]
struct HashProjection<'a> {
    entry_step_id: &'a str,
    steps: Vec<HashStep<'a>>,
}

/// A deterministic SHA-256 hex digest over `{entryStepId, steps}`, stripped
/// of `run` metadata and per-step classification/runtime — content that
/// varies across identical-semantics runs (timestamps, run ids) or is
/// derived rather than part of the plan's identity must never affect the
/// hash.
pub fn hash_execution_plan(plan: &ExecutionPlan) -> String {
    let steps = plan
        .steps
        .iter()
        .map(|s| {
            let mut jumps: Vec<&Jump> = s.jumps.iter().collect();
            jumps.sort();
            HashStep {
                node_id: &s.node_id,
                type_: &s.type_,
                resolved_config: &s.resolved_config,
                controls: &s.controls,
                jumps,
            }
        })
        .collect();
    let projection = HashProjection {
        entry_step_id: &plan.entry_step_id,
        steps,
    };
    // BTreeMap fields and struct-declared field order make this serialization
    // canonical regardless of how manifests/maps were iterated upstream.
    let bytes = serde_json::to_vec(&projection)
        .unwrap_or_else(|e| unreachable!("hash projection is infallible to serialize: {e}"));
    let digest = Sha256::digest(&bytes);
    hex_encode(&digest)
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}

pub fn serialize_execution_plan(plan: &ExecutionPlan) -> Result<String, CompileError> {
    serde_json::to_string(plan).map_err(CompileError::Serde)
}

pub fn deserialize_execution_plan(json: &str) -> Result<ExecutionPlan, CompileError> {
    serde_json::from_str(json).map_err(CompileError::Serde)
}
