// botflow-core/src/domain/policy.rs

use crate::domain::classification::Classification;
use crate::domain::control::ControlType;
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PolicyAction {
    Block,
    Warn,
    RequireControls,
}

/// A tenant/industry policy pack: rule set plus default mitigations applied
/// uniformly (logging redaction, artifact encryption).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PolicyPack {
    #[validate(length(min = 1, message = "tenantId cannot be empty"))]
    pub tenant_id: String,
    pub version: String,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub defaults: PolicyDefaults,
    #[validate(nested)]
    #[serde(default)]
    pub rules: Vec<Rule>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PolicyDefaults {
    #[serde(default)]
    pub logging: LoggingDefaults,
    #[serde(default)]
    pub artifacts: ArtifactDefaults,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LoggingDefaults {
    #[serde(default)]
    pub redact: bool,
    #[serde(default)]
    pub store_days: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactDefaults {
    #[serde(default)]
    pub encrypt_at_rest: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Rule {
    #[validate(length(min = 1, message = "rule id cannot be empty"))]
    pub id: String,
    #[serde(default)]
    pub description: Option<String>,
    pub when: Condition,
    pub then: Action,
}

/// Conjunction of optional predicates; a predicate left unset is not
/// evaluated (it neither passes nor fails the conjunction).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(default)]
    pub data_contains: Option<Vec<Classification>>,
    #[serde(default)]
    pub node_type: Option<String>,
    #[serde(default)]
    pub node_category: Option<String>,
    #[serde(default)]
    pub capability: Option<CapabilityKind>,
    #[serde(default)]
    pub egress: Option<bool>,
    #[serde(default)]
    pub writes: Option<bool>,
    #[serde(default)]
    pub deletes: Option<bool>,
    #[serde(default)]
    pub privileged_access: Option<bool>,
    #[serde(default)]
    pub network_domain_matches: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CapabilityKind {
    Egress,
    Writes,
    Deletes,
    PrivilegedAccess,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    pub action: PolicyAction,
    #[serde(default)]
    pub controls: Vec<ControlType>,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_empty_rule_id() {
        let rule = Rule {
            id: String::new(),
            description: None,
            when: Condition::default(),
            then: Action {
                action: PolicyAction::Warn,
                controls: vec![],
                severity: Severity::Low,
                message: None,
            },
        };
        assert!(rule.validate().is_err());
    }

    #[test]
    fn validate_accepts_well_formed_pack() {
        let pack = PolicyPack {
            tenant_id: "acme".into(),
            version: "1".into(),
            industry: None,
            defaults: PolicyDefaults::default(),
            rules: vec![],
        };
        assert!(pack.validate().is_ok());
    }

    #[test]
    fn severity_ordering_is_monotone() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert!(Severity::High < Severity::Critical);
    }
}
