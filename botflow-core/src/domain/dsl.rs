// botflow-core/src/domain/dsl.rs

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Sentinel used in `Outputs` fields to mean "leave this scope".
pub const END_SENTINEL: &str = "END";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotDsl {
    pub version: String,
    pub bot: BotMeta,
    pub nodes: Vec<DslNode>,
    #[serde(default)]
    pub variables: HashMap<String, Value>,
    /// Explicit trigger node ids; overrides inference from `trigger.*` types.
    #[serde(default)]
    pub triggers: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotMeta {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DslNode {
    pub id: String,
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(default)]
    pub config: HashMap<String, Value>,
    #[serde(default)]
    pub outputs: Outputs,
    #[serde(default)]
    pub children: Vec<DslNode>,
    #[serde(default)]
    pub scope: Option<Scope>,
}

impl DslNode {
    pub fn is_container(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn is_ai_typed(&self) -> bool {
        self.type_.starts_with("ai.")
    }

    pub fn is_trigger(&self) -> bool {
        self.type_.starts_with("trigger.")
    }
}

/// A node's outgoing edges by named port. `success`/`error` are present on
/// every real DSL node; `done` is used by containers to signal scope exit.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Outputs {
    #[serde(default)]
    pub success: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub done: Option<String>,
}

/// Nested-region metadata for container node types.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Scope {
    /// Port name (e.g. `then`, `else`, `body`, `case_foo`) → region.
    #[serde(default)]
    pub ports: HashMap<String, ScopePort>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopePort {
    pub node_ids: Vec<String>,
    pub entry_id: Option<String>,
}

/// The exhaustive container types with well-known port names. Any other
/// `control.*` type with children is treated as a single `body` region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    If,
    TryCatch,
    Loop,
    Switch,
    Parallel,
    GenericBody,
}

impl ContainerKind {
    pub fn classify(node_type: &str) -> Self {
        match node_type {
            "control.if" => Self::If,
            "control.try_catch" => Self::TryCatch,
            "control.loop" | "control.while" => Self::Loop,
            "control.switch" => Self::Switch,
            "control.parallel" => Self::Parallel,
            _ => Self::GenericBody,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_recognizes_the_fixed_container_types() {
        assert_eq!(ContainerKind::classify("control.if"), ContainerKind::If);
        assert_eq!(
            ContainerKind::classify("control.try_catch"),
            ContainerKind::TryCatch
        );
        assert_eq!(ContainerKind::classify("control.loop"), ContainerKind::Loop);
        assert_eq!(ContainerKind::classify("control.while"), ContainerKind::Loop);
        assert_eq!(
            ContainerKind::classify("control.switch"),
            ContainerKind::Switch
        );
        assert_eq!(
            ContainerKind::classify("control.parallel"),
            ContainerKind::Parallel
        );
        assert_eq!(
            ContainerKind::classify("control.retry_group"),
            ContainerKind::GenericBody
        );
    }

    #[test]
    fn is_container_reflects_children() {
        let leaf = DslNode {
            id: "a".into(),
            type_: "noop".into(),
            config: HashMap::new(),
            outputs: Outputs::default(),
            children: vec![],
            scope: None,
        };
        assert!(!leaf.is_container());
    }

    #[test]
    fn is_ai_typed_matches_prefix() {
        let node = DslNode {
            id: "a".into(),
            type_: "ai.agent".into(),
            config: HashMap::new(),
            outputs: Outputs::default(),
            children: vec![],
            scope: None,
        };
        assert!(node.is_ai_typed());
    }
}
