// botflow/src/commands/cfg.rs
//
// Dumps the built CFG (pseudo-nodes included) as diagnostic JSON — useful
// for inspecting how a nested DSL expands before classification/policy ever
// run. Never touches a manifest or policy pack.

use anyhow::{Context, Result};
use botflow_core::application::build_cfg;
use botflow_core::domain::BotDsl;
use std::path::Path;

pub fn run(dsl_path: &Path) -> Result<()> {
    let dsl_source = std::fs::read_to_string(dsl_path)
        .with_context(|| format!("reading DSL file {}", dsl_path.display()))?;
    let dsl: BotDsl = serde_json::from_str(&dsl_source)
        .with_context(|| format!("parsing DSL JSON {}", dsl_path.display()))?;

    let cfg = build_cfg(&dsl).context("building CFG")?;
    let dump = cfg.dump();
    println!("{}", serde_json::to_string_pretty(&dump)?);
    Ok(())
}
