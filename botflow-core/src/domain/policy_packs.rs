// botflow-core/src/domain/policy_packs.rs
//
// Built-in, embedded policy packs. Callers normally supply their own tenant
// pack, but `CompileOptions` falls back to the built-in HIPAA pack when none
// is given (see the application layer), and the CLI exposes lookup by key.

use crate::domain::policy::PolicyPack;
use crate::error::CompileError;
use std::collections::HashMap;
use std::sync::OnceLock;

const HIPAA: &str = include_str!("../../policy_packs/hipaa.yaml");
const SOC2: &str = include_str!("../../policy_packs/soc2.yaml");
const PCI_DSS: &str = include_str!("../../policy_packs/pci-dss.yaml");
const GDPR: &str = include_str!("../../policy_packs/gdpr.yaml");
const FINANCE: &str = include_str!("../../policy_packs/finance.yaml");
const INSURANCE: &str = include_str!("../../policy_packs/insurance.yaml");

/// Canonical lookup key → embedded YAML source. Aliases (`pci_dss`,
/// `banking`, `healthcare`) are resolved in `lookup` rather than duplicated
/// here, so there is exactly one YAML body per distinct pack.
fn registry() -> &'static HashMap<&'static str, &'static str> {
    static REGISTRY: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut m = HashMap::new();
        m.insert("hipaa", HIPAA);
        m.insert("soc2", SOC2);
        m.insert("pci-dss", PCI_DSS);
        m.insert("gdpr", GDPR);
        m.insert("finance", FINANCE);
        m.insert("insurance", INSURANCE);
        m
    })
}

/// Resolves an alias to its canonical registry key, case-insensitively.
fn canonical_key(key: &str) -> Option<&'static str> {
    match key.to_ascii_lowercase().as_str() {
        "hipaa" | "healthcare" => Some("hipaa"),
        "soc2" => Some("soc2"),
        "pci-dss" | "pci_dss" => Some("pci-dss"),
        "gdpr" => Some("gdpr"),
        "finance" | "banking" => Some("finance"),
        "insurance" => Some("insurance"),
        _ => None,
    }
}

/// All canonical keys plus their aliases, in the order listed by the
/// governing lookup table — used by the CLI's `policy-packs` subcommand.
pub fn available_keys() -> Vec<&'static str> {
    vec![
        "hipaa",
        "healthcare",
        "soc2",
        "pci-dss",
        "pci_dss",
        "gdpr",
        "finance",
        "banking",
        "insurance",
    ]
}

/// Loads a built-in pack by key (case-insensitive, alias-aware).
pub fn lookup(key: &str) -> Result<PolicyPack, CompileError> {
    let canonical = canonical_key(key).ok_or_else(|| CompileError::UnknownPolicyPack(key.to_string()))?;
    let source = registry()
        .get(canonical)
        .expect("canonical_key only returns keys present in registry()");
    serde_yaml::from_str(source).map_err(|e| CompileError::Internal(format!("built-in pack {canonical} failed to parse: {e}")))
}

/// The pack substituted when a caller does not supply one.
pub fn default_pack() -> PolicyPack {
    lookup("hipaa").expect("built-in hipaa pack is always well-formed")
}

/// Merges several packs' defaults and rules into one, most-restrictive-wins:
/// logging is redacted and artifacts encrypted if any input pack requires
/// it, `storeDays` takes the maximum, and rule ids are de-duplicated with
/// first-seen precedence.
pub fn combine_policy_packs(packs: &[PolicyPack]) -> PolicyPack {
    let mut redact = false;
    let mut store_days = 0u32;
    let mut encrypt_at_rest = false;
    let mut seen_ids = std::collections::HashSet::new();
    let mut rules = Vec::new();
    let mut tenant_id = String::new();
    let mut version = String::new();
    let mut industry = None;

    for (i, pack) in packs.iter().enumerate() {
        if i == 0 {
            tenant_id = pack.tenant_id.clone();
            version = pack.version.clone();
            industry = pack.industry.clone();
        }
        redact = redact || pack.defaults.logging.redact;
        store_days = store_days.max(pack.defaults.logging.store_days);
        encrypt_at_rest = encrypt_at_rest || pack.defaults.artifacts.encrypt_at_rest;
        for rule in &pack.rules {
            if seen_ids.insert(rule.id.clone()) {
                rules.push(rule.clone());
            }
        }
    }

    PolicyPack {
        tenant_id,
        version,
        industry,
        defaults: crate::domain::policy::PolicyDefaults {
            logging: crate::domain::policy::LoggingDefaults {
                redact,
                store_days,
            },
            artifacts: crate::domain::policy::ArtifactDefaults { encrypt_at_rest },
        },
        rules,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_advertised_key_resolves() {
        for key in available_keys() {
            lookup(key).unwrap_or_else(|e| panic!("key {key} failed to load: {e}"));
        }
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(lookup("HIPAA").unwrap().industry, lookup("hipaa").unwrap().industry);
    }

    #[test]
    fn healthcare_is_an_alias_of_hipaa() {
        let hipaa = lookup("hipaa").unwrap();
        let healthcare = lookup("healthcare").unwrap();
        assert_eq!(hipaa.rules.len(), healthcare.rules.len());
    }

    #[test]
    fn unknown_key_is_an_error() {
        assert!(lookup("not-a-pack").is_err());
    }

    #[test]
    fn combine_takes_most_restrictive_defaults_and_dedupes_rules() {
        let hipaa = lookup("hipaa").unwrap();
        let soc2 = lookup("soc2").unwrap();
        let combined = combine_policy_packs(&[soc2, hipaa]);
        assert!(combined.defaults.logging.redact);
        assert!(combined.defaults.artifacts.encrypt_at_rest);
        let ids: std::collections::HashSet<_> = combined.rules.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids.len(), combined.rules.len());
    }
}
