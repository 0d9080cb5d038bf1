// botflow-core/src/application/ai_config.rs
//
// Pre-pass over AI-typed DSL nodes. Errors here block compilation before the
// CFG is even built; warnings are carried through to the final result.

use crate::domain::dsl::{BotDsl, DslNode};
use crate::error::CompileError;
use serde_json::Value;
use tracing::instrument;

const OPENAI_LIKE_PROVIDERS: &[&str] = &["openai", "anthropic", "groq", "mistral", "cohere"];

#[derive(Debug, Default)]
pub struct AiConfigReport {
    pub warnings: Vec<String>,
}

#[instrument(skip_all, fields(node_count = dsl.nodes.len()))]
pub fn validate_ai_config(dsl: &BotDsl) -> Result<AiConfigReport, CompileError> {
    let mut report = AiConfigReport::default();
    for node in &dsl.nodes {
        walk(node, &mut report)?;
    }
    Ok(report)
}

fn walk(node: &DslNode, report: &mut AiConfigReport) -> Result<(), CompileError> {
    if node.is_ai_typed() {
        check_node(node, report)?;
    }
    for child in &node.children {
        walk(child, report)?;
    }
    Ok(())
}

fn check_node(node: &DslNode, report: &mut AiConfigReport) -> Result<(), CompileError> {
    match node.type_.as_str() {
        "ai.agent" => check_agent(node, report)?,
        "ai.model" => check_model(node, report),
        "ai.embeddings" => check_embeddings(node, report),
        _ => {}
    }
    Ok(())
}

fn check_agent(node: &DslNode, report: &mut AiConfigReport) -> Result<(), CompileError> {
    let model = node.config.get("model");
    let Some(model) = model.and_then(Value::as_object) else {
        return Err(CompileError::MissingAiModel {
            label: node_label(node).to_string(),
        });
    };

    let provider = model.get("provider").and_then(Value::as_str).unwrap_or("");
    if OPENAI_LIKE_PROVIDERS.contains(&provider) && model.get("api_key").and_then(Value::as_str).map(str::is_empty).unwrap_or(true) {
        report.warnings.push(format!(
            "AI Agent '{}': provider '{}' is missing api_key",
            node_label(node),
            provider
        ));
    }
    if provider == "azure" {
        if field_missing(model, "base_url") {
            report.warnings.push(format!(
                "AI Agent '{}': azure provider is missing base_url",
                node_label(node)
            ));
        }
        if field_missing(model, "api_version") {
            report.warnings.push(format!(
                "AI Agent '{}': azure provider is missing api_version",
                node_label(node)
            ));
        }
    }
    if provider == "aws" && field_missing(model, "region") {
        report.warnings.push(format!(
            "AI Agent '{}': aws provider is missing region",
            node_label(node)
        ));
    }

    if let Some(memory) = node.config.get("memory").and_then(Value::as_object) {
        let memory_type = memory.get("memory_type").and_then(Value::as_str).unwrap_or("");
        if matches!(memory_type, "retrieve" | "both") && field_missing(memory, "embeddings") {
            report.warnings.push(format!(
                "AI Agent '{}': memory_type '{}' requires embeddings",
                node_label(node),
                memory_type
            ));
        }
    }
    Ok(())
}

fn check_model(node: &DslNode, report: &mut AiConfigReport) {
    if field_missing(&node.config, "model") {
        report.warnings.push(format!(
            "AI Model '{}' is missing a model identifier",
            node_label(node)
        ));
    }
    let provider = node.config.get("provider").and_then(Value::as_str).unwrap_or("");
    if provider == "ollama" && field_missing(&node.config, "base_url") {
        report.warnings.push(format!(
            "AI Model '{}': ollama provider is missing base_url",
            node_label(node)
        ));
    }
}

fn check_embeddings(node: &DslNode, report: &mut AiConfigReport) {
    let provider = node.config.get("provider").and_then(Value::as_str).unwrap_or("");
    if provider == "ollama" && field_missing(&node.config, "base_url") {
        report.warnings.push(format!(
            "AI Embeddings '{}': ollama provider is missing base_url",
            node_label(node)
        ));
    }
}

fn field_missing(map: &serde_json::Map<String, Value>, key: &str) -> bool {
    match map.get(key) {
        None => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Null) => true,
        _ => false,
    }
}

fn node_label(node: &DslNode) -> &str {
    node.config
        .get("label")
        .and_then(Value::as_str)
        .unwrap_or(node.id.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dsl::{BotMeta, Outputs};
    use std::collections::HashMap;

    fn leaf(id: &str, type_: &str, config: HashMap<String, Value>) -> DslNode {
        DslNode {
            id: id.into(),
            type_: type_.into(),
            config,
            outputs: Outputs::default(),
            children: vec![],
            scope: None,
        }
    }

    fn dsl_with(node: DslNode) -> BotDsl {
        BotDsl {
            version: "1".into(),
            bot: BotMeta {
                id: "b".into(),
                name: "b".into(),
                description: None,
            },
            nodes: vec![node],
            variables: HashMap::new(),
            triggers: None,
        }
    }

    #[test]
    fn agent_without_model_is_an_error() {
        let dsl = dsl_with(leaf("agent1", "ai.agent", HashMap::new()));
        let err = validate_ai_config(&dsl).unwrap_err();
        assert!(matches!(err, CompileError::MissingAiModel { label } if label == "agent1"));
    }

    #[test]
    fn azure_missing_fields_warns() {
        let mut config = HashMap::new();
        let model = serde_json::json!({"provider": "azure"});
        config.insert("model".to_string(), model);
        let dsl = dsl_with(leaf("agent1", "ai.agent", config));
        let report = validate_ai_config(&dsl).unwrap();
        assert!(report.warnings.iter().any(|w| w.contains("base_url")));
        assert!(report.warnings.iter().any(|w| w.contains("api_version")));
    }

    #[test]
    fn well_formed_openai_agent_has_no_warnings() {
        let mut config = HashMap::new();
        let model = serde_json::json!({"provider": "openai", "api_key": "sk-x"});
        config.insert("model".to_string(), model);
        let dsl = dsl_with(leaf("agent1", "ai.agent", config));
        let report = validate_ai_config(&dsl).unwrap();
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn non_ai_nodes_are_ignored() {
        let dsl = dsl_with(leaf("n1", "noop", HashMap::new()));
        let report = validate_ai_config(&dsl).unwrap();
        assert!(report.warnings.is_empty());
    }
}
