// botflow-core/src/application/compile.rs
//
// Top-level orchestrator. Sequences AI-config validation, CFG build,
// classification, policy evaluation, re-classification, and plan
// compilation, aggregating diagnostics at every step. This is the only
// function external callers are expected to use directly; everything else
// in `application` is exposed for testing, per the public API surface.

use crate::application::ai_config::validate_ai_config;
use crate::application::cfg_builder::build_cfg;
use crate::application::classifier::{propagate_classification, InjectedControls};
use crate::application::plan_compiler::{
    compile_execution_plan, hash_execution_plan, validate_execution_plan, PlanInputs,
};
use crate::application::policy_evaluator::evaluate_policies;
use crate::domain::classification::Classification;
use crate::domain::manifest::{resolve_manifest, ManifestRegistry};
use crate::domain::plan::{CompileResult, PolicyFinding, RunMeta};
use crate::domain::policy::PolicyPack;
use crate::domain::policy_packs;
use crate::domain::{BotDsl, Cfg, NodeRef};
use crate::error::CompileError;
use std::collections::HashMap;
use tracing::instrument;

/// Everything about a compile run that isn't part of the DSL/manifests
/// themselves: run identity, the tenant's policy pack, and whether warnings
/// should be treated as fatal.
pub struct CompileOptions {
    pub run_id: String,
    pub tenant_id: String,
    pub bot_id: String,
    pub bot_version: String,
    /// Falls back to the built-in HIPAA pack when not supplied, matching
    /// the public API's documented default.
    pub policy_pack: Option<PolicyPack>,
    pub fail_on_warnings: bool,
    /// Injected for reproducible tests; real callers rely on the default
    /// `now()`-style wall-clock timestamp the binary layer provides.
    pub started_at: Option<String>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            run_id: String::new(),
            tenant_id: String::new(),
            bot_id: String::new(),
            bot_version: String::new(),
            policy_pack: None,
            fail_on_warnings: false,
            started_at: None,
        }
    }
}

/// The single entry point: DSL + manifests + options -> a typed compile
/// result. Never returns a Rust `Err` — every failure mode, including an
/// unexpected internal error, is folded into `CompileResult::Failure`'s
/// diagnostics, per the "no thrown condition escapes `compile`" contract.
#[instrument(skip_all, fields(bot_id = %options.bot_id, tenant_id = %options.tenant_id, node_count = dsl.nodes.len()))]
pub fn compile(
    dsl: &BotDsl,
    manifests: &ManifestRegistry,
    options: CompileOptions,
) -> CompileResult {
    let ai_report = match validate_ai_config(dsl) {
        Ok(report) => report,
        Err(e) => {
            return CompileResult::Failure {
                errors: vec![e.to_string()],
                warnings: vec![],
            }
        }
    };

    let pack = options
        .policy_pack
        .clone()
        .unwrap_or_else(policy_packs::default_pack);

    match run_pipeline(dsl, manifests, &pack, &options) {
        Ok(Outcome::Success {
            plan,
            plan_hash,
            warnings,
        }) => {
            let mut all_warnings = ai_report.warnings;
            all_warnings.extend(warnings);
            CompileResult::Success {
                plan,
                plan_hash,
                errors: vec![],
                warnings: all_warnings,
            }
        }
        Ok(Outcome::Blocked { errors, warnings }) => {
            let mut all_warnings = ai_report.warnings;
            all_warnings.extend(warnings);
            CompileResult::Failure {
                errors,
                warnings: all_warnings,
            }
        }
        Err(e) => CompileResult::Failure {
            errors: vec![format!("Compilation failed: {e}")],
            warnings: ai_report.warnings,
        },
    }
}

enum Outcome {
    Success {
        plan: crate::domain::plan::ExecutionPlan,
        plan_hash: String,
        warnings: Vec<String>,
    },
    Blocked {
        errors: Vec<String>,
        warnings: Vec<String>,
    },
}

/// The part of `compile` that can fail with a `CompileError` — separated so
/// the top-level function has exactly one place that wraps an internal
/// error into the synthetic `Compilation failed: ...` diagnostic.
fn run_pipeline(
    dsl: &BotDsl,
    manifests: &ManifestRegistry,
    pack: &PolicyPack,
    options: &CompileOptions,
) -> Result<Outcome, CompileError> {
    let cfg = build_cfg(dsl)?;

    let classifications = propagate_classification(&cfg, manifests, &InjectedControls::new());
    let report = evaluate_policies(&cfg, manifests, &classifications, pack)?;

    let consumes_warnings = consumes_diagnostics(&cfg, manifests, &classifications);

    if report.should_block() || (options.fail_on_warnings && !report.warnings.is_empty()) {
        let mut errors: Vec<String> = report
            .blocks
            .iter()
            .map(format_block)
            .collect();
        let mut warnings: Vec<String> = report.warnings.iter().map(format_warning).collect();
        warnings.extend(report.advisories.clone());
        warnings.extend(consumes_warnings);
        // A fail-on-warnings compile with zero blocks still needs at least
        // one entry in `errors` for callers that branch on `errors.is_empty()`
        // rather than on `success` alone.
        if errors.is_empty() && options.fail_on_warnings {
            errors.push(format!(
                "Compilation failed: {} warning(s) present and failOnWarnings is set",
                report.warnings.len()
            ));
        }
        return Ok(Outcome::Blocked { errors, warnings });
    }

    let injected: InjectedControls = report
        .requires_controls
        .iter()
        .map(|(id, set)| (id.clone(), set.iter().copied().collect()))
        .collect();
    let reclassified = propagate_classification(&cfg, manifests, &injected);

    let run = RunMeta {
        run_id: options.run_id.clone(),
        tenant_id: options.tenant_id.clone(),
        bot_id: options.bot_id.clone(),
        bot_version: options.bot_version.clone(),
        started_at: options
            .started_at
            .clone()
            .unwrap_or_else(|| chrono::Utc::now().to_rfc3339()),
    };

    let plan = compile_execution_plan(PlanInputs {
        cfg: &cfg,
        dsl,
        manifests,
        classifications: &reclassified,
        requires_controls: &report.requires_controls,
        blocks: report.blocks.clone(),
        warnings: report.warnings.clone(),
        run,
    })?;
    validate_execution_plan(&plan)?;
    let plan_hash = hash_execution_plan(&plan);

    let mut warnings: Vec<String> = report.warnings.iter().map(format_warning).collect();
    warnings.extend(report.advisories);
    warnings.extend(consumes_warnings);

    Ok(Outcome::Success {
        plan,
        plan_hash,
        warnings,
    })
}

fn format_block(finding: &PolicyFinding) -> String {
    format!("[BLOCKED] {} (node: {})", finding.message, finding.node_id)
}

fn format_warning(finding: &PolicyFinding) -> String {
    format!(
        "[{}] {} (node: {})",
        finding.severity, finding.message, finding.node_id
    )
}

/// Non-blocking "consumes" diagnostic: a leaf whose incoming classification
/// exceeds what its manifest declares it can consume is reported, but never
/// fails compilation on its own.
fn consumes_diagnostics(
    cfg: &Cfg,
    manifests: &ManifestRegistry,
    classifications: &HashMap<NodeRef, crate::domain::classification::NodeClassification>,
) -> Vec<String> {
    let mut out = Vec::new();
    for node_ref in &cfg.node_ids {
        let Some(id) = node_ref.real_id() else {
            continue;
        };
        let Some(info) = cfg.nodes_by_id.get(id) else {
            continue;
        };
        if info.is_container {
            continue;
        }
        let manifest = resolve_manifest(manifests, &info.node_type);
        let max_consumes = Classification::join_all(manifest.data.consumes.iter().copied());
        let Some(classification) = classifications.get(node_ref) else {
            continue;
        };
        if classification.in_ > max_consumes {
            out.push(format!(
                "[MEDIUM] Node '{}' receives classification {} exceeding its declared consumes bound {} (node: {})",
                id, classification.in_, max_consumes, id
            ));
        }
    }
    out
}
