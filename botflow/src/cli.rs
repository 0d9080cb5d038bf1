// botflow/src/cli.rs

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "botflow")]
#[command(version)]
#[command(about = "Compiles bot DSLs into deterministic execution plans", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compile a DSL + manifest registry (+ optional policy pack) into an ExecutionPlan
    Compile {
        /// Path to the bot DSL JSON file
        #[arg(long)]
        dsl: PathBuf,

        /// Path to a JSON file mapping node type -> NodeManifest
        #[arg(long)]
        manifests: PathBuf,

        /// Built-in policy pack key (hipaa, soc2, pci-dss, gdpr, finance, insurance)
        /// or a path to a tenant policy pack YAML file. Defaults to the built-in HIPAA pack.
        #[arg(long)]
        policy_pack: Option<String>,

        #[arg(long, default_value = "local-run")]
        run_id: String,

        #[arg(long, default_value = "local-tenant")]
        tenant_id: String,

        #[arg(long, default_value = "local-bot")]
        bot_id: String,

        #[arg(long, default_value = "0.0.0")]
        bot_version: String,

        /// Treat any policy warning as a compilation failure
        #[arg(long, default_value = "false")]
        fail_on_warnings: bool,

        /// Write the ExecutionPlan JSON here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Build and dump the CFG (including pseudo-nodes) for a DSL, as diagnostic JSON
    Cfg {
        #[arg(long)]
        dsl: PathBuf,
    },

    /// List the built-in policy pack keys
    PolicyPacks,
}
