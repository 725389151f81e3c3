//! `FlowDefinition`/`FlowNode` and their invariants (spec.md §3).

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::model::ParamMap;

pub type NodeId = u64;

/// An Entry node's match rule. Every constrained dimension must pass for
/// the Entry — and thus its flow — to match a request; an absent list
/// means "match anything" for that dimension (spec.md §4.3).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchRule {
    pub methods: Option<Vec<String>>,
    pub host_globs: Option<Vec<String>>,
    pub path_globs: Option<Vec<String>>,
}

/// Terminal behavior of a Terminator node (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminatorMode {
    PassThrough,
    EndWithResponse,
}

/// A flow graph node (spec.md §3 `FlowNode variants`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FlowNode {
    Entry { id: NodeId, match_rule: MatchRule },
    Component { id: NodeId, component_id: String, params: ParamMap },
    Condition { id: NodeId, expression: String },
    Terminator { id: NodeId, mode: TerminatorMode },
}

impl FlowNode {
    #[must_use]
    pub fn id(&self) -> NodeId {
        match self {
            Self::Entry { id, .. }
            | Self::Component { id, .. }
            | Self::Condition { id, .. }
            | Self::Terminator { id, .. } => *id,
        }
    }
}

/// A directed edge between two nodes. `label` distinguishes a
/// Condition's branches (conventionally `"true"`/`"false"`); it is
/// `None` for Entry/Component successor edges, which are unambiguous.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FlowEdge {
    pub from: NodeId,
    pub to: NodeId,
    pub label: Option<String>,
}

/// A user-defined rewriting pipeline (spec.md §3).
///
/// Invariants, checked by [`FlowDefinition::validate`]:
/// - Exactly one Entry node.
/// - Every non-Entry node is reachable from the Entry.
/// - Terminator nodes have no outgoing edges.
/// - A Component node has at most one incoming and one outgoing edge.
/// - A Condition node has at most one incoming edge and outgoing edges
///   labeled with distinct branch names.
/// - The Entry node has exactly one outgoing edge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowDefinition {
    pub id: u64,
    pub name: String,
    pub enabled: bool,
    pub nodes: Vec<FlowNode>,
    pub edges: Vec<FlowEdge>,
    pub created_at_ms: u128,
    pub updated_at_ms: u128,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowValidationError {
    NoEntry,
    MultipleEntries(usize),
    EntryOutgoingEdgeCount(usize),
    Unreachable(NodeId),
    TerminatorHasOutgoingEdge(NodeId),
    ComponentTooManyIncoming(NodeId),
    ComponentTooManyOutgoing(NodeId),
    ConditionTooManyIncoming(NodeId),
    ConditionDuplicateBranch(NodeId, String),
    DanglingEdge { from: NodeId, to: NodeId },
}

impl std::fmt::Display for FlowValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoEntry => write!(f, "flow has no Entry node"),
            Self::MultipleEntries(n) => write!(f, "flow has {n} Entry nodes, expected exactly one"),
            Self::EntryOutgoingEdgeCount(n) => write!(f, "Entry node has {n} outgoing edges, expected exactly one"),
            Self::Unreachable(id) => write!(f, "node {id} is not reachable from the Entry"),
            Self::TerminatorHasOutgoingEdge(id) => write!(f, "Terminator node {id} has an outgoing edge"),
            Self::ComponentTooManyIncoming(id) => write!(f, "Component node {id} has more than one incoming edge"),
            Self::ComponentTooManyOutgoing(id) => write!(f, "Component node {id} has more than one outgoing edge"),
            Self::ConditionTooManyIncoming(id) => write!(f, "Condition node {id} has more than one incoming edge"),
            Self::ConditionDuplicateBranch(id, label) => {
                write!(f, "Condition node {id} has more than one outgoing edge labeled '{label}'")
            }
            Self::DanglingEdge { from, to } => write!(f, "edge {from} -> {to} references a node that does not exist"),
        }
    }
}

impl std::error::Error for FlowValidationError {}

impl FlowDefinition {
    #[must_use]
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        let now = now_millis();
        Self {
            id,
            name: name.into(),
            enabled: true,
            nodes: Vec::new(),
            edges: Vec::new(),
            created_at_ms: now,
            updated_at_ms: now,
        }
    }

    #[must_use]
    pub fn entry(&self) -> Option<&FlowNode> {
        self.nodes.iter().find(|n| matches!(n, FlowNode::Entry { .. }))
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&FlowNode> {
        self.nodes.iter().find(|n| n.id() == id)
    }

    #[must_use]
    pub fn outgoing(&self, id: NodeId) -> Vec<&FlowEdge> {
        self.edges.iter().filter(|e| e.from == id).collect()
    }

    pub fn validate(&self) -> Result<(), FlowValidationError> {
        let node_ids: HashSet<NodeId> = self.nodes.iter().map(FlowNode::id).collect();
        for edge in &self.edges {
            if !node_ids.contains(&edge.from) || !node_ids.contains(&edge.to) {
                return Err(FlowValidationError::DanglingEdge { from: edge.from, to: edge.to });
            }
        }

        let entries: Vec<&FlowNode> = self.nodes.iter().filter(|n| matches!(n, FlowNode::Entry { .. })).collect();
        match entries.len() {
            0 => return Err(FlowValidationError::NoEntry),
            1 => {}
            n => return Err(FlowValidationError::MultipleEntries(n)),
        }
        let entry = entries[0];
        let entry_out = self.outgoing(entry.id());
        if entry_out.len() != 1 {
            return Err(FlowValidationError::EntryOutgoingEdgeCount(entry_out.len()));
        }

        let mut incoming: HashMap<NodeId, usize> = HashMap::new();
        let mut outgoing: HashMap<NodeId, usize> = HashMap::new();
        for edge in &self.edges {
            *outgoing.entry(edge.from).or_default() += 1;
            *incoming.entry(edge.to).or_default() += 1;
        }

        for node in &self.nodes {
            match node {
                FlowNode::Terminator { id, .. } => {
                    if outgoing.get(id).copied().unwrap_or(0) > 0 {
                        return Err(FlowValidationError::TerminatorHasOutgoingEdge(*id));
                    }
                }
                FlowNode::Component { id, .. } => {
                    if incoming.get(id).copied().unwrap_or(0) > 1 {
                        return Err(FlowValidationError::ComponentTooManyIncoming(*id));
                    }
                    if outgoing.get(id).copied().unwrap_or(0) > 1 {
                        return Err(FlowValidationError::ComponentTooManyOutgoing(*id));
                    }
                }
                FlowNode::Condition { id, .. } => {
                    if incoming.get(id).copied().unwrap_or(0) > 1 {
                        return Err(FlowValidationError::ConditionTooManyIncoming(*id));
                    }
                    let mut seen_labels = HashSet::new();
                    for edge in self.outgoing(*id) {
                        let label = edge.label.clone().unwrap_or_default();
                        if !seen_labels.insert(label.clone()) {
                            return Err(FlowValidationError::ConditionDuplicateBranch(*id, label));
                        }
                    }
                }
                FlowNode::Entry { .. } => {}
            }
        }

        let mut reachable = HashSet::new();
        let mut stack = vec![entry.id()];
        while let Some(id) = stack.pop() {
            if reachable.insert(id) {
                for edge in self.outgoing(id) {
                    stack.push(edge.to);
                }
            }
        }
        for node in &self.nodes {
            if node.id() != entry.id() && !reachable.contains(&node.id()) {
                return Err(FlowValidationError::Unreachable(node.id()));
            }
        }

        Ok(())
    }
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}
