// botflow-core/src/domain/plan.rs

use crate::domain::classification::NodeClassification;
use crate::domain::control::ControlType;
use crate::domain::manifest::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const PLAN_VERSION: &str = "1.0";
pub const END_STEP: &str = "END";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionPlan {
    pub plan_version: String,
    pub run: RunMeta,
    pub entry_step_id: String,
    pub steps: Vec<Step>,
    pub policy: PolicyOutcome,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunMeta {
    pub run_id: String,
    pub tenant_id: String,
    pub bot_id: String,
    pub bot_version: String,
    pub started_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub step_id: String,
    pub node_id: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub resolved_config: BTreeMap<String, serde_json::Value>,
    pub controls: Vec<ControlType>,
    pub classification: NodeClassification,
    pub runtime: StepRuntime,
    pub jumps: Vec<Jump>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StepRuntime {
    pub idempotent: bool,
    pub retry: RetryPolicy,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub struct Jump {
    pub on: String,
    pub to_step_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PolicyOutcome {
    pub blocks: Vec<PolicyFinding>,
    pub warnings: Vec<PolicyFinding>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PolicyFinding {
    pub node_id: String,
    pub rule_id: String,
    pub message: String,
    pub severity: crate::domain::policy::Severity,
}

/// The sum type returned by `compile`: either a plan with its stable hash,
/// or a failure — both branches always carry the accumulated diagnostics.
///
/// Serializes to the flat `{success, plan?, planHash?, errors, warnings}`
/// shape from the public API rather than an internally tagged enum, since
/// `success` is a plain JSON boolean, not a string discriminator.
#[derive(Debug, Clone)]
pub enum CompileResult {
    Success {
        plan: ExecutionPlan,
        plan_hash: String,
        errors: Vec<String>,
        warnings: Vec<String>,
    },
    Failure {
        errors: Vec<String>,
        warnings: Vec<String>,
    },
}

impl CompileResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn errors(&self) -> &[String] {
        match self {
            Self::Success { errors, .. } => errors,
            Self::Failure { errors, .. } => errors,
        }
    }

    pub fn warnings(&self) -> &[String] {
        match self {
            Self::Success { warnings, .. } => warnings,
            Self::Failure { warnings, .. } => warnings,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompileResultWire {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    plan: Option<ExecutionPlan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    plan_hash: Option<String>,
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl Serialize for CompileResult {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let wire = match self {
            Self::Success {
                plan,
                plan_hash,
                errors,
                warnings,
            } => CompileResultWire {
                success: true,
                plan: Some(plan.clone()),
                plan_hash: Some(plan_hash.clone()),
                errors: errors.clone(),
                warnings: warnings.clone(),
            },
            Self::Failure { errors, warnings } => CompileResultWire {
                success: false,
                plan: None,
                plan_hash: None,
                errors: errors.clone(),
                warnings: warnings.clone(),
            },
        };
        wire.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CompileResult {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let wire = CompileResultWire::deserialize(deserializer)?;
        if wire.success {
            let plan = wire
                .plan
                .ok_or_else(|| serde::de::Error::missing_field("plan"))?;
            let plan_hash = wire
                .plan_hash
                .ok_or_else(|| serde::de::Error::missing_field("planHash"))?;
            Ok(Self::Success {
                plan,
                plan_hash,
                errors: wire.errors,
                warnings: wire.warnings,
            })
        } else {
            Ok(Self::Failure {
                errors: wire.errors,
                warnings: wire.warnings,
            })
        }
    }
}
