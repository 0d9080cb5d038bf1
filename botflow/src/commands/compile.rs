// botflow/src/commands/compile.rs

use anyhow::{Context, Result};
use botflow_core::application::{compile, CompileOptions};
use botflow_core::domain::manifest::ManifestRegistry;
use botflow_core::domain::policy::PolicyPack;
use botflow_core::domain::policy_packs;
use botflow_core::domain::BotDsl;
use botflow_core::CompileResult;
use std::path::{Path, PathBuf};
use tracing::info;

#[allow(clippy::too_many_arguments)]
pub fn run(
    dsl_path: &Path,
    manifests_path: &Path,
    policy_pack: Option<String>,
    run_id: String,
    tenant_id: String,
    bot_id: String,
    bot_version: String,
    fail_on_warnings: bool,
    out: Option<PathBuf>,
) -> Result<bool> {
    let dsl_source = std::fs::read_to_string(dsl_path)
        .with_context(|| format!("reading DSL file {}", dsl_path.display()))?;
    let dsl: BotDsl = serde_json::from_str(&dsl_source)
        .with_context(|| format!("parsing DSL JSON {}", dsl_path.display()))?;

    let manifests_source = std::fs::read_to_string(manifests_path)
        .with_context(|| format!("reading manifests file {}", manifests_path.display()))?;
    let manifests: ManifestRegistry = serde_json::from_str(&manifests_source)
        .with_context(|| format!("parsing manifests JSON {}", manifests_path.display()))?;

    let pack = resolve_policy_pack(policy_pack)?;

    info!(node_count = dsl.nodes.len(), "compiling bot DSL");

    let result = compile(
        &dsl,
        &manifests,
        CompileOptions {
            run_id,
            tenant_id,
            bot_id,
            bot_version,
            policy_pack: Some(pack),
            fail_on_warnings,
            started_at: Some(chrono::Utc::now().to_rfc3339()),
        },
    );

    for warning in result.warnings() {
        eprintln!("warning: {warning}");
    }

    match result {
        CompileResult::Success { plan, plan_hash, .. } => {
            let json = serde_json::to_string_pretty(&plan)?;
            match out {
                Some(path) => std::fs::write(&path, json)
                    .with_context(|| format!("writing plan to {}", path.display()))?,
                None => println!("{json}"),
            }
            eprintln!("planHash: {plan_hash}");
            Ok(true)
        }
        CompileResult::Failure { errors, .. } => {
            for error in &errors {
                eprintln!("error: {error}");
            }
            Ok(false)
        }
    }
}

/// Resolves `--policy-pack`: an existing file path is loaded as YAML; any
/// other value is looked up as a built-in pack key; omitted entirely falls
/// back to the built-in HIPAA pack, matching the library's own default.
fn resolve_policy_pack(value: Option<String>) -> Result<PolicyPack> {
    let Some(value) = value else {
        return Ok(policy_packs::default_pack());
    };
    let path = Path::new(&value);
    if path.is_file() {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("reading policy pack file {}", path.display()))?;
        let pack: PolicyPack = serde_yaml::from_str(&source)
            .with_context(|| format!("parsing policy pack YAML {}", path.display()))?;
        return Ok(pack);
    }
    policy_packs::lookup(&value).map_err(|e| anyhow::anyhow!(e))
}
