// botflow-core/src/application/policy_evaluator.rs
//
// Matches policy rules against each real leaf's (classification, manifest)
// pair, emits blocks/warnings, and derives the final required-control set
// per node — both from explicit rule actions and classification-derived
// auto-injection.

use crate::domain::cfg::{Cfg, NodeRef};
use crate::domain::classification::{Classification, NodeClassification};
use crate::domain::control::{ControlSet, ControlType, DataMode};
use crate::domain::manifest::{resolve_manifest, ManifestRegistry, NodeManifest};
use crate::domain::plan::PolicyFinding;
use crate::domain::policy::{CapabilityKind, Condition, PolicyAction, PolicyPack, Rule};
use crate::error::CompileError;
use regex::Regex;
use std::collections::HashMap;
use tracing::instrument;

pub struct PolicyReport {
    pub blocks: Vec<PolicyFinding>,
    pub warnings: Vec<PolicyFinding>,
    pub advisories: Vec<String>,
    pub requires_controls: HashMap<String, ControlSet>,
}

impl PolicyReport {
    pub fn should_block(&self) -> bool {
        !self.blocks.is_empty()
    }
}

#[instrument(skip_all, fields(rule_count = pack.rules.len()))]
pub fn evaluate_policies(
    cfg: &Cfg,
    manifests: &ManifestRegistry,
    classifications: &HashMap<NodeRef, NodeClassification>,
    pack: &PolicyPack,
) -> Result<PolicyReport, CompileError> {
    let mut blocks = Vec::new();
    let mut warnings = Vec::new();
    let mut advisories = Vec::new();
    let mut requires_controls: HashMap<String, ControlSet> = HashMap::new();

    for node_ref in &cfg.node_ids {
        let Some(node_id) = node_ref.real_id() else {
            continue;
        };
        let Some(info) = cfg.nodes_by_id.get(node_id) else {
            continue;
        };
        if info.is_container {
            continue;
        }
        let classification = classifications
            .get(node_ref)
            .copied()
            .unwrap_or(NodeClassification {
                in_: Classification::Unclassified,
                out: Classification::Unclassified,
            });
        let manifest = resolve_manifest(manifests, &info.node_type);
        let mut controls: ControlSet = manifest.controls.requires.iter().copied().collect();

        for rule in &pack.rules {
            if matches_condition(&rule.id, &rule.when, &manifest, &classification, &info.node_type)?
            {
                apply_action(
                    rule,
                    node_id,
                    &info.node_type,
                    &manifest,
                    &mut controls,
                    &mut blocks,
                    &mut warnings,
                    &mut advisories,
                )?;
            }
        }

        auto_inject(&classification, &manifest, pack, &mut controls);
        requires_controls.insert(node_id.to_string(), controls);
    }

    Ok(PolicyReport {
        blocks,
        warnings,
        advisories,
        requires_controls,
    })
}

fn matches_condition(
    rule_id: &str,
    condition: &Condition,
    manifest: &NodeManifest,
    classification: &NodeClassification,
    node_type: &str,
) -> Result<bool, CompileError> {
    if let Some(classes) = &condition.data_contains {
        let max_rank = classification.max();
        if !classes.iter().any(|c| *c <= max_rank) {
            return Ok(false);
        }
    }
    if let Some(expected) = &condition.node_type {
        if expected != node_type {
            return Ok(false);
        }
    }
    if let Some(category) = &condition.node_category {
        let actual_category = node_type.split('.').next().unwrap_or(node_type);
        if category != actual_category {
            return Ok(false);
        }
    }
    if let Some(capability) = &condition.capability {
        if !capability_truthy(*capability, manifest) {
            return Ok(false);
        }
    }
    if let Some(expected) = condition.egress {
        if (manifest.capabilities.egress != DataMode::None) != expected {
            return Ok(false);
        }
    }
    if let Some(expected) = condition.writes {
        if (manifest.capabilities.writes != DataMode::None) != expected {
            return Ok(false);
        }
    }
    if let Some(expected) = condition.deletes {
        if manifest.capabilities.deletes != expected {
            return Ok(false);
        }
    }
    if let Some(expected) = condition.privileged_access {
        if manifest.capabilities.privileged_access != expected {
            return Ok(false);
        }
    }
    if let Some(pattern) = &condition.network_domain_matches {
        let re = Regex::new(pattern).map_err(|e| CompileError::BadRuleRegex {
            rule_id: rule_id.to_string(),
            source: e,
        })?;
        let allow_domains = manifest
            .capabilities
            .network
            .as_ref()
            .map(|n| n.allow_domains.as_slice())
            .unwrap_or(&[]);
        if !allow_domains.iter().any(|d| re.is_match(d)) {
            return Ok(false);
        }
    }
    Ok(true)
}

fn capability_truthy(capability: CapabilityKind, manifest: &NodeManifest) -> bool {
    match capability {
        CapabilityKind::Egress => manifest.capabilities.egress != DataMode::None,
        CapabilityKind::Writes => manifest.capabilities.writes != DataMode::None,
        CapabilityKind::Deletes => manifest.capabilities.deletes,
        CapabilityKind::PrivilegedAccess => manifest.capabilities.privileged_access,
    }
}

/// A rule's `controls` are required whenever it matches, independent of
/// whether its action also blocks or warns — see S2 in the end-to-end
/// scenarios, where a BLOCK rule's controls still land in
/// `requiresControls` alongside the blocking finding.
fn apply_action(
    rule: &Rule,
    node_id: &str,
    node_type: &str,
    manifest: &NodeManifest,
    controls: &mut ControlSet,
    blocks: &mut Vec<PolicyFinding>,
    warnings: &mut Vec<PolicyFinding>,
    advisories: &mut Vec<String>,
) -> Result<(), CompileError> {
    let message = rule
        .then
        .message
        .clone()
        .unwrap_or_else(|| format!("rule '{}' matched", rule.id));
    let severity = rule.then.severity;

    match rule.then.action {
        PolicyAction::Block => blocks.push(PolicyFinding {
            node_id: node_id.to_string(),
            rule_id: rule.id.clone(),
            message,
            severity,
        }),
        PolicyAction::Warn => warnings.push(PolicyFinding {
            node_id: node_id.to_string(),
            rule_id: rule.id.clone(),
            message,
            severity,
        }),
        PolicyAction::RequireControls => {}
    }

    for control in &rule.then.controls {
        let supported = manifest.controls.requires.contains(control)
            || manifest.controls.supports.contains(control)
            || control.is_generic();
        if supported {
            controls.insert(*control);
        } else {
            advisories.push(format!(
                "[HIGH] Node {node_type} does not support required control: {control} (node: {node_id})"
            ));
        }
    }
    Ok(())
}

fn auto_inject(
    classification: &NodeClassification,
    manifest: &NodeManifest,
    pack: &PolicyPack,
    controls: &mut ControlSet,
) {
    let max_rank = classification.max();
    if max_rank >= Classification::Pii {
        controls.insert(ControlType::AuditLog);
    }
    if max_rank >= Classification::Phi && pack.defaults.logging.redact {
        controls.insert(ControlType::LogRedaction);
    }
    if max_rank >= Classification::Pii
        && manifest.capabilities.writes != DataMode::None
        && pack.defaults.artifacts.encrypt_at_rest
    {
        controls.insert(ControlType::ArtifactEncryption);
    }
    if max_rank == Classification::Credentials {
        controls.insert(ControlType::VaultStore);
    }
    if max_rank >= Classification::Pii && manifest.capabilities.egress == DataMode::External {
        controls.insert(ControlType::DlpScan);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cfg::CfgNodeInfo;
    use crate::domain::manifest::{Capabilities, ControlRequirements, DataEffect, NetworkCapabilities, RuntimeHints};
    use crate::domain::policy::{Action, PolicyDefaults, Severity};

    fn phi_producing_egress_manifest() -> NodeManifest {
        NodeManifest {
            data: DataEffect {
                consumes: vec![],
                produces: vec![Classification::Phi],
                propagation: crate::domain::control::PropagationMode::PassThrough,
                output_classification_override: None,
            },
            capabilities: Capabilities {
                egress: DataMode::External,
                writes: DataMode::None,
                deletes: false,
                privileged_access: false,
                network: Some(NetworkCapabilities {
                    allow_domains: vec!["api.example.com".into()],
                    deny_domains: vec![],
                }),
            },
            controls: ControlRequirements {
                requires: vec![],
                supports: vec![ControlType::DlpScan, ControlType::HitlApproval],
            },
            runtime: RuntimeHints::default(),
        }
    }

    fn cfg_single_leaf(node_type: &str) -> Cfg {
        let mut cfg = Cfg::new();
        let n = NodeRef::Real("e1".into());
        cfg.node_ids.insert(n);
        cfg.nodes_by_id.insert(
            "e1".into(),
            CfgNodeInfo {
                node_type: node_type.into(),
                config: Default::default(),
                is_container: false,
            },
        );
        cfg
    }

    #[test]
    fn block_rule_fails_compilation_and_requires_controls_are_still_populated() {
        let cfg = cfg_single_leaf("http.post");
        let mut manifests = ManifestRegistry::new();
        manifests.insert("http.post".into(), phi_producing_egress_manifest());
        let mut classifications = HashMap::new();
        classifications.insert(
            NodeRef::Real("e1".into()),
            NodeClassification {
                in_: Classification::Unclassified,
                out: Classification::Phi,
            },
        );
        let pack = PolicyPack {
            tenant_id: "t".into(),
            version: "1".into(),
            industry: None,
            defaults: PolicyDefaults {
                logging: crate::domain::policy::LoggingDefaults {
                    redact: true,
                    store_days: 1,
                },
                artifacts: crate::domain::policy::ArtifactDefaults {
                    encrypt_at_rest: true,
                },
            },
            rules: vec![Rule {
                id: "HIPAA_NO_PHI_EXTERNAL".into(),
                description: None,
                when: Condition {
                    data_contains: Some(vec![Classification::Phi]),
                    egress: Some(true),
                    ..Default::default()
                },
                then: Action {
                    action: PolicyAction::Block,
                    controls: vec![ControlType::DlpScan, ControlType::HitlApproval],
                    severity: Severity::Critical,
                    message: None,
                },
            }],
        };
        let report = evaluate_policies(&cfg, &manifests, &classifications, &pack).unwrap();
        assert!(report.should_block());
        let controls = &report.requires_controls["e1"];
        assert!(controls.contains(&ControlType::DlpScan));
        assert!(controls.contains(&ControlType::LogRedaction));
        assert!(controls.contains(&ControlType::AuditLog));
    }
}
