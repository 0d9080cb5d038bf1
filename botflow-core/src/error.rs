// botflow-core/src/error.rs

use miette::Diagnostic;
use thiserror::Error;

/// Internal error type threaded between compiler phases.
///
/// `compile()` never lets this escape as a Rust `Result` — every variant is
/// caught at the top level and folded into a single synthetic diagnostic
/// string (`Compilation failed: <msg>`), per the compiler's error model.
#[derive(Error, Debug, Diagnostic)]
pub enum CompileError {
    #[error("AI Agent '{label}' has no AI Model connected")]
    #[diagnostic(code(botflow::ai_config::missing_model))]
    MissingAiModel { label: String },

    #[error("Node '{node_id}' references unknown output target '{target}'")]
    #[diagnostic(code(botflow::cfg::dangling_output))]
    DanglingOutput { node_id: String, target: String },

    #[error("Node '{node_id}' declares scope port '{port}' with no entryId")]
    #[diagnostic(code(botflow::cfg::empty_port))]
    EmptyScopePort { node_id: String, port: String },

    #[error("Plan jump from '{step_id}' targets non-existent step '{target}'")]
    #[diagnostic(code(botflow::plan::dangling_jump))]
    DanglingJump { step_id: String, target: String },

    #[error("Plan has {step_count} step(s) but entryStepId is END")]
    #[diagnostic(code(botflow::plan::unreachable_entry))]
    UnreachableEntry { step_count: usize },

    #[error("Policy pack '{0}' is not a recognized built-in pack")]
    #[diagnostic(code(botflow::policy::unknown_pack))]
    UnknownPolicyPack(String),

    #[error("Invalid regular expression in rule '{rule_id}': {source}")]
    #[diagnostic(code(botflow::policy::bad_regex))]
    BadRuleRegex {
        rule_id: String,
        #[source]
        source: regex::Error,
    },

    #[error("Serialization error: {0}")]
    #[diagnostic(code(botflow::io::serde))]
    Serde(#[from] serde_json::Error),

    #[error("{0}")]
    #[diagnostic(code(botflow::internal))]
    Internal(String),
}
