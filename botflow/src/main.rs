// botflow/src/main.rs

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    // RUST_LOG=debug botflow compile ... to see phase-by-phase spans.
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Compile {
            dsl,
            manifests,
            policy_pack,
            run_id,
            tenant_id,
            bot_id,
            bot_version,
            fail_on_warnings,
            out,
        } => {
            let succeeded = commands::compile::run(
                &dsl,
                &manifests,
                policy_pack,
                run_id,
                tenant_id,
                bot_id,
                bot_version,
                fail_on_warnings,
                out,
            )?;
            if !succeeded {
                std::process::exit(1);
            }
        }
        Commands::Cfg { dsl } => {
            commands::cfg::run(&dsl)?;
        }
        Commands::PolicyPacks => {
            commands::policy_packs::run()?;
        }
    }

    Ok(())
}
