//! Flow storage: the catalog of user-authored [`FlowDefinition`]s.
//!
//! Matching spec.md §5's "single lock or equivalent serialization"
//! directive and the [`crate::component::ComponentRegistry`]'s own
//! shape, one `parking_lot::RwLock` guards an ordered map so that
//! concurrent request handling only ever takes read locks and authoring
//! (save/delete/toggle) serializes behind a write lock.

use std::collections::BTreeMap;

use parking_lot::RwLock;

use super::model::{FlowDefinition, FlowValidationError};

/// Failure modes for flow authoring operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowStoreError {
    Invalid(FlowValidationError),
    NotFound(u64),
}

impl std::fmt::Display for FlowStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invalid(err) => write!(f, "flow definition is invalid: {err}"),
            Self::NotFound(id) => write!(f, "no flow with id {id}"),
        }
    }
}

impl std::error::Error for FlowStoreError {}

impl From<FlowValidationError> for FlowStoreError {
    fn from(err: FlowValidationError) -> Self {
        Self::Invalid(err)
    }
}

/// In-memory catalog of flows, keyed by ascending id.
///
/// Iteration order over a `BTreeMap<u64, _>` is ascending-key, which is
/// exactly the "first match wins, in ascending id order" matching rule
/// spec.md §4.3 calls for when more than one enabled flow's Entry
/// matches the same request (see DESIGN.md's Open Question decision 4).
#[derive(Debug, Default)]
pub struct FlowStore {
    flows: RwLock<BTreeMap<u64, FlowDefinition>>,
}

impl FlowStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, id: u64) -> Option<FlowDefinition> {
        self.flows.read().get(&id).cloned()
    }

    /// All flows, ascending by id — the order flow matching is evaluated in.
    #[must_use]
    pub fn list_all(&self) -> Vec<FlowDefinition> {
        self.flows.read().values().cloned().collect()
    }

    /// Enabled flows only, ascending by id.
    #[must_use]
    pub fn list_enabled(&self) -> Vec<FlowDefinition> {
        self.flows.read().values().filter(|f| f.enabled).cloned().collect()
    }

    /// Validate and upsert a flow definition.
    pub fn save(&self, flow: FlowDefinition) -> Result<(), FlowStoreError> {
        flow.validate()?;
        self.flows.write().insert(flow.id, flow);
        Ok(())
    }

    pub fn delete(&self, id: u64) -> Result<(), FlowStoreError> {
        if self.flows.write().remove(&id).is_none() {
            return Err(FlowStoreError::NotFound(id));
        }
        Ok(())
    }

    /// Flip a flow's `enabled` bit without otherwise touching it.
    pub fn set_enabled(&self, id: u64, enabled: bool) -> Result<(), FlowStoreError> {
        let mut guard = self.flows.write();
        let flow = guard.get_mut(&id).ok_or(FlowStoreError::NotFound(id))?;
        flow.enabled = enabled;
        Ok(())
    }
}
