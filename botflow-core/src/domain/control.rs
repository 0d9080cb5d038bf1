// botflow-core/src/domain/control.rs

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// The fixed set of mitigation controls a node can require or support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlType {
    AuditLog,
    ArtifactEncryption,
    LogRedaction,
    DlpScan,
    HitlApproval,
    Mask,
    Redact,
    Pseudonymize,
    Hash,
    Generalize,
    Encrypt,
    Tokenize,
    VaultStore,
    PromptGuard,
    RateLimit,
    TimeoutGuard,
}

impl ControlType {
    /// Controls a rule may request regardless of manifest support — see
    /// the "generic-control clause" testable property.
    pub fn is_generic(self) -> bool {
        matches!(
            self,
            Self::AuditLog
                | Self::DlpScan
                | Self::HitlApproval
                | Self::LogRedaction
                | Self::ArtifactEncryption
        )
    }
}

impl fmt::Display for ControlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::AuditLog => "AUDIT_LOG",
            Self::ArtifactEncryption => "ARTIFACT_ENCRYPTION",
            Self::LogRedaction => "LOG_REDACTION",
            Self::DlpScan => "DLP_SCAN",
            Self::HitlApproval => "HITL_APPROVAL",
            Self::Mask => "MASK",
            Self::Redact => "REDACT",
            Self::Pseudonymize => "PSEUDONYMIZE",
            Self::Hash => "HASH",
            Self::Generalize => "GENERALIZE",
            Self::Encrypt => "ENCRYPT",
            Self::Tokenize => "TOKENIZE",
            Self::VaultStore => "VAULT_STORE",
            Self::PromptGuard => "PROMPT_GUARD",
            Self::RateLimit => "RATE_LIMIT",
            Self::TimeoutGuard => "TIMEOUT_GUARD",
        };
        write!(f, "{}", s)
    }
}

/// A deterministically ordered set of controls, used wherever the spec
/// requires `controls: sorted(...)` in output.
pub type ControlSet = BTreeSet<ControlType>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PropagationMode {
    None,
    #[default]
    PassThrough,
    Derive,
    Transform,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataMode {
    #[default]
    None,
    Internal,
    External,
}
