// botflow-core/src/domain/cfg.rs

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

pub const ROOT_SCOPE: &str = "ROOT";

/// A node in the CFG: either a real DSL node (leaf or container) or one of
/// the four pseudo-node kinds materializing a scope boundary.
///
/// This is the tagged variant the design notes call for — string literals
/// with prefix sentinels are only a serialization detail at the CFG-dump
/// boundary (see `Display`/`FromStr` below), never the in-memory identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeRef {
    Real(String),
    Entry(String),
    End(String),
    Done(String),
    NextIter(String),
}

impl NodeRef {
    pub fn is_pseudo(&self) -> bool {
        !matches!(self, Self::Real(_))
    }

    pub fn real_id(&self) -> Option<&str> {
        match self {
            Self::Real(id) => Some(id),
            _ => None,
        }
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Real(id) => write!(f, "{}", id),
            Self::Entry(scope) => write!(f, "__ENTRY__:{}", scope),
            Self::End(scope) => write!(f, "__END__:{}", scope),
            Self::Done(scope) => write!(f, "__DONE__:{}", scope),
            Self::NextIter(scope) => write!(f, "__NEXT_ITER__:{}", scope),
        }
    }
}

impl FromStr for NodeRef {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(scope) = s.strip_prefix("__ENTRY__:") {
            Ok(Self::Entry(scope.to_string()))
        } else if let Some(scope) = s.strip_prefix("__END__:") {
            Ok(Self::End(scope.to_string()))
        } else if let Some(scope) = s.strip_prefix("__DONE__:") {
            Ok(Self::Done(scope.to_string()))
        } else if let Some(scope) = s.strip_prefix("__NEXT_ITER__:") {
            Ok(Self::NextIter(scope.to_string()))
        } else {
            Ok(Self::Real(s.to_string()))
        }
    }
}

impl Serialize for NodeRef {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for NodeRef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        // infallible: FromStr never rejects, unknown prefixes fall to Real
        Ok(s.parse().unwrap_or(NodeRef::Real(s)))
    }
}

/// Lightweight per-node facts the CFG keeps around for downstream phases,
/// independent of the original `DslNode` tree shape.
#[derive(Debug, Clone)]
pub struct CfgNodeInfo {
    pub node_type: String,
    pub config: HashMap<String, serde_json::Value>,
    pub is_container: bool,
}

#[derive(Debug, Clone)]
pub struct Edge {
    pub from: NodeRef,
    pub from_port: String,
    pub to: NodeRef,
}

/// The flat control-flow graph produced by the CFG builder: every DSL
/// container becomes a scope (not a step); pseudo-nodes materialize scope
/// boundaries; edges connect ports to targets.
#[derive(Debug, Clone, Default)]
pub struct Cfg {
    pub node_ids: BTreeSet<NodeRef>,
    pub edges: Vec<Edge>,
    pub nodes_by_id: HashMap<String, CfgNodeInfo>,
    pub scope_of: HashMap<NodeRef, String>,
    succ: HashMap<NodeRef, Vec<(String, NodeRef)>>,
    pred: HashMap<NodeRef, Vec<NodeRef>>,
}

impl Cfg {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_edge(&mut self, from: NodeRef, from_port: impl Into<String>, to: NodeRef) {
        self.edges.push(Edge {
            from,
            from_port: from_port.into(),
            to,
        });
    }

    /// Computes `succ`/`pred` adjacency from the final edge list. Must be
    /// called once after all edges (including container rewrites) are
    /// emitted; cheap to call repeatedly since it's O(|edges|).
    pub fn finalize_adjacency(&mut self) {
        self.succ.clear();
        self.pred.clear();
        for edge in &self.edges {
            self.succ
                .entry(edge.from.clone())
                .or_default()
                .push((edge.from_port.clone(), edge.to.clone()));
            self.pred.entry(edge.to.clone()).or_default().push(edge.from.clone());
        }
    }

    pub fn succ(&self, node: &NodeRef) -> &[(String, NodeRef)] {
        self.succ.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn pred(&self, node: &NodeRef) -> &[NodeRef] {
        self.pred.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every real leaf (non-container, non-pseudo) node, in the order they
    /// were registered — DSL discovery order, per the determinism contract.
    pub fn real_leaf_ids_in_order(&self, discovery_order: &[String]) -> Vec<String> {
        discovery_order
            .iter()
            .filter(|id| {
                self.nodes_by_id
                    .get(id.as_str())
                    .map(|info| !info.is_container)
                    .unwrap_or(false)
            })
            .cloned()
            .collect()
    }

    /// A diagnostic, symmetrically-serializable dump of the CFG: pseudo-node
    /// ids rendered as their string literals, edges grouped by source.
    pub fn dump(&self) -> CfgDump {
        let mut edges_by_from: BTreeMap<String, Vec<CfgDumpEdge>> = BTreeMap::new();
        for edge in &self.edges {
            edges_by_from
                .entry(edge.from.to_string())
                .or_default()
                .push(CfgDumpEdge {
                    port: edge.from_port.clone(),
                    to: edge.to.to_string(),
                });
        }
        for edges in edges_by_from.values_mut() {
            edges.sort_by(|a, b| a.port.cmp(&b.port).then(a.to.cmp(&b.to)));
        }
        CfgDump {
            node_ids: self.node_ids.iter().map(|n| n.to_string()).collect(),
            edges_by_from,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CfgDump {
    pub node_ids: Vec<String>,
    pub edges_by_from: BTreeMap<String, Vec<CfgDumpEdge>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CfgDumpEdge {
    pub port: String,
    pub to: String,
}
