// botflow-core/src/application/mod.rs
//
// Use cases: AI-config validation, CFG building, classification propagation,
// policy evaluation, and plan compilation, orchestrated by `compile`.
// Depends on `domain` only.

pub mod ai_config;
pub mod cfg_builder;
pub mod classifier;
pub mod compile;
pub mod plan_compiler;
pub mod policy_evaluator;

// --- RE-EXPORTS (FACADE) ---
// Lets callers (and the CLI) write `botflow_core::application::{compile, build_cfg, ...}`
// without knowing which file a use case lives in.

pub use ai_config::validate_ai_config;
pub use cfg_builder::build_cfg;
pub use classifier::propagate_classification;
pub use compile::{compile, CompileOptions};
pub use plan_compiler::{compile_execution_plan, validate_execution_plan};
pub use policy_evaluator::evaluate_policies;
