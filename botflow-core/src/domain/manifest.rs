// botflow-core/src/domain/manifest.rs

use crate::domain::classification::Classification;
use crate::domain::control::{ControlType, DataMode, PropagationMode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Static, per-node-type contract: data effect, capabilities, required
/// controls, and runtime hints. One manifest per `DslNode.type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeManifest {
    pub data: DataEffect,
    #[serde(default)]
    pub capabilities: Capabilities,
    #[serde(default)]
    pub controls: ControlRequirements,
    #[serde(default)]
    pub runtime: RuntimeHints,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DataEffect {
    #[serde(default)]
    pub consumes: Vec<Classification>,
    #[serde(default)]
    pub produces: Vec<Classification>,
    #[serde(default)]
    pub propagation: PropagationMode,
    #[serde(default)]
    pub output_classification_override: Option<Classification>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    #[serde(default)]
    pub egress: DataMode,
    #[serde(default)]
    pub writes: DataMode,
    #[serde(default)]
    pub deletes: bool,
    #[serde(default)]
    pub privileged_access: bool,
    #[serde(default)]
    pub network: Option<NetworkCapabilities>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct NetworkCapabilities {
    #[serde(default)]
    pub allow_domains: Vec<String>,
    #[serde(default)]
    pub deny_domains: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ControlRequirements {
    #[serde(default)]
    pub requires: Vec<ControlType>,
    #[serde(default)]
    pub supports: Vec<ControlType>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeHints {
    #[serde(default)]
    pub idempotent: bool,
    #[serde(default)]
    pub retryable: bool,
    #[serde(default)]
    pub default_retry: RetryPolicy,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for RuntimeHints {
    fn default() -> Self {
        Self {
            idempotent: false,
            retryable: false,
            default_retry: RetryPolicy::default(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

fn default_timeout_ms() -> u64 {
    30_000
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RetryPolicy {
    #[serde(default)]
    pub max: u32,
    #[serde(default)]
    pub backoff_ms: u64,
}

/// Registry of manifests keyed by `DslNode.type`, as handed in by the
/// caller's `ManifestsService`-equivalent. The compiler never mutates this.
pub type ManifestRegistry = HashMap<String, NodeManifest>;

/// The manifest substituted for any node type without a registered
/// manifest: maximally conservative, so an unknown node never silently
/// escapes policy scrutiny.
pub fn conservative_default() -> NodeManifest {
    NodeManifest {
        data: DataEffect {
            consumes: vec![
                Classification::Unclassified,
                Classification::Pii,
                Classification::Phi,
                Classification::Pci,
                Classification::Credentials,
            ],
            produces: vec![Classification::Phi],
            propagation: PropagationMode::PassThrough,
            output_classification_override: None,
        },
        capabilities: Capabilities {
            egress: DataMode::External,
            writes: DataMode::External,
            deletes: true,
            privileged_access: true,
            network: None,
        },
        controls: ControlRequirements {
            requires: vec![ControlType::AuditLog],
            supports: vec![],
        },
        runtime: RuntimeHints::default(),
    }
}

/// Looks up the manifest for `node_type`, falling back to the conservative
/// default when the type is unregistered. Never panics on unknown types.
pub fn resolve_manifest<'a>(
    registry: &'a ManifestRegistry,
    node_type: &str,
) -> std::borrow::Cow<'a, NodeManifest> {
    match registry.get(node_type) {
        Some(manifest) => std::borrow::Cow::Borrowed(manifest),
        None => std::borrow::Cow::Owned(conservative_default()),
    }
}
