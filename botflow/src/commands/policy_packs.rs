// botflow/src/commands/policy_packs.rs

use anyhow::Result;
use botflow_core::domain::policy_packs;
use comfy_table::{presets::UTF8_FULL, Table};

pub fn run() -> Result<()> {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["key", "industry", "rules"]);
    for key in policy_packs::available_keys() {
        let pack = policy_packs::lookup(key)?;
        table.add_row(vec![
            key.to_string(),
            pack.industry.unwrap_or_else(|| "-".to_string()),
            pack.rules.len().to_string(),
        ]);
    }
    println!("{table}");
    Ok(())
}
