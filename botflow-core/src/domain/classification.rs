// botflow-core/src/domain/classification.rs

use serde::{Deserialize, Serialize};
use std::fmt;

/// Totally ordered data-sensitivity lattice. `Ord` gives us `max` for join
/// and `>=`/`<` for the threshold checks the policy evaluator needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Classification {
    #[default]
    Unclassified, // 0
    Pii,    // 1
    Phi,    // 2
    Pci,    // 3
    Credentials, // 4
}

impl Classification {
    /// Join over the lattice: the least upper bound is just the max rank.
    pub fn join(self, other: Self) -> Self {
        self.max(other)
    }

    /// Join over an iterator, defaulting to `Unclassified` for an empty set.
    pub fn join_all(values: impl IntoIterator<Item = Self>) -> Self {
        values.into_iter().fold(Self::Unclassified, Self::join)
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unclassified => "UNCLASSIFIED",
            Self::Pii => "PII",
            Self::Phi => "PHI",
            Self::Pci => "PCI",
            Self::Credentials => "CREDENTIALS",
        };
        write!(f, "{}", s)
    }
}

/// The `{in, out}` classification recorded for every real (non-pseudo) node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct NodeClassification {
    #[serde(rename = "in")]
    pub in_: Classification,
    pub out: Classification,
}

impl NodeClassification {
    pub fn max(&self) -> Classification {
        self.in_.join(self.out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_matches_the_lattice() {
        assert!(Classification::Unclassified < Classification::Pii);
        assert!(Classification::Pii < Classification::Phi);
        assert!(Classification::Phi < Classification::Pci);
        assert!(Classification::Pci < Classification::Credentials);
    }

    #[test]
    fn join_is_max() {
        assert_eq!(
            Classification::Pii.join(Classification::Phi),
            Classification::Phi
        );
        assert_eq!(
            Classification::Credentials.join(Classification::Unclassified),
            Classification::Credentials
        );
    }

    #[test]
    fn join_all_of_empty_is_unclassified() {
        assert_eq!(Classification::join_all(vec![]), Classification::Unclassified);
    }

    #[test]
    fn display_matches_wire_format() {
        assert_eq!(Classification::Phi.to_string(), "PHI");
    }
}
