//! Component Registry: the catalog of built-in handlers and user scripts
//! (spec.md §3 `ComponentDefinition`, §4.4).

mod builtins;
mod context;
mod jsonpath;

pub use builtins::{Component, BUILTIN_NAMES};
pub use context::{ComponentContext, ComponentResult};

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::FlowExecutionError;
use crate::model::{ParamMap, ParamValue};

/// The declared type of one parameter in a [`ComponentDefinition`]'s schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Number,
    Boolean,
    Json,
}

/// One entry in a component's ordered parameter schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamSchemaEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: ParamType,
    pub default: Option<ParamValue>,
    pub required: bool,
    pub description: String,
}

/// Whether a [`ComponentDefinition`] dispatches to a compiled handler or a
/// user script evaluated by the [`crate::sandbox::ScriptSandbox`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ComponentKind {
    /// `name` is the stable internal name keyed to a handler in
    /// [`builtins::handler_for_name`] (e.g. `"header-rewrite"`).
    Builtin { name: String },
    /// `source` is the rhai script text evaluated per spec.md §4.5.
    Script { source: String },
}

/// A catalog entry: either a builtin handler or a user script, with its
/// declared parameter schema (spec.md §3).
///
/// Invariant: a builtin definition can never be overwritten or deleted —
/// [`ComponentRegistry::save`] and [`ComponentRegistry::delete`] both
/// refuse to touch an id present in the immutable builtin set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentDefinition {
    pub id: String,
    pub display_name: String,
    pub kind: ComponentKind,
    pub parameters: Vec<ParamSchemaEntry>,
    pub created_at_ms: u128,
    pub updated_at_ms: u128,
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

impl ComponentDefinition {
    fn builtin(name: &str) -> Self {
        let now = now_millis();
        Self {
            id: name.to_owned(),
            display_name: name.to_owned(),
            kind: ComponentKind::Builtin { name: name.to_owned() },
            parameters: Vec::new(),
            created_at_ms: now,
            updated_at_ms: now,
        }
    }
}

/// Refusal reason when mutating the registry is disallowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    BuiltinIsImmutable(String),
    UnknownComponent(String),
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BuiltinIsImmutable(id) => write!(f, "component '{id}' is a builtin and cannot be modified or deleted"),
            Self::UnknownComponent(id) => write!(f, "no component registered with id '{id}'"),
        }
    }
}

impl std::error::Error for RegistryError {}

/// Catalog of [`ComponentDefinition`]s, pre-seeded with the 18 immutable
/// builtins (spec.md §4.4's table) and otherwise mutable by user scripts.
///
/// One [`parking_lot::RwLock`] guards the map, matching the read-mostly /
/// serialized-writer shape spec.md §5 describes for Flow and Component
/// stores: the flow engine's per-request reads never block each other;
/// writes from script authoring serialize behind the single lock.
#[derive(Debug)]
pub struct ComponentRegistry {
    definitions: RwLock<HashMap<String, ComponentDefinition>>,
    handlers: HashMap<String, Arc<dyn Component>>,
}

impl ComponentRegistry {
    /// Build a registry pre-populated with every builtin.
    #[must_use]
    pub fn new() -> Self {
        let mut definitions = HashMap::new();
        let mut handlers = HashMap::new();
        for &name in BUILTIN_NAMES {
            definitions.insert(name.to_owned(), ComponentDefinition::builtin(name));
            if let Some(handler) = builtins::handler_for_name(name) {
                handlers.insert(name.to_owned(), Arc::<dyn Component>::from(handler));
            }
        }
        Self {
            definitions: RwLock::new(definitions),
            handlers,
        }
    }

    #[must_use]
    pub fn is_builtin(&self, id: &str) -> bool {
        self.handlers.contains_key(id)
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<ComponentDefinition> {
        self.definitions.read().get(id).cloned()
    }

    #[must_use]
    pub fn list_all(&self) -> Vec<ComponentDefinition> {
        let mut all: Vec<_> = self.definitions.read().values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    /// Upsert a script component. Builtin ids are rejected outright.
    pub fn save(&self, mut definition: ComponentDefinition) -> Result<(), RegistryError> {
        if self.is_builtin(&definition.id) {
            return Err(RegistryError::BuiltinIsImmutable(definition.id));
        }
        let mut guard = self.definitions.write();
        let now = now_millis();
        definition.updated_at_ms = now;
        if !guard.contains_key(&definition.id) {
            definition.created_at_ms = now;
        }
        guard.insert(definition.id.clone(), definition);
        Ok(())
    }

    pub fn delete(&self, id: &str) -> Result<(), RegistryError> {
        if self.is_builtin(id) {
            return Err(RegistryError::BuiltinIsImmutable(id.to_owned()));
        }
        let mut guard = self.definitions.write();
        if guard.remove(id).is_none() {
            return Err(RegistryError::UnknownComponent(id.to_owned()));
        }
        Ok(())
    }

    /// Dispatch to the builtin handler registered for `id`.
    ///
    /// Returns `None` when `id` does not name a builtin — the caller
    /// (the Flow Engine) is responsible for routing script-kind
    /// definitions to the [`crate::sandbox::ScriptSandbox`] instead.
    pub async fn invoke_builtin(
        &self,
        id: &str,
        ctx: &mut ComponentContext,
        params: &ParamMap,
    ) -> Option<Result<ComponentResult, FlowExecutionError>> {
        let handler = self.handlers.get(id)?.clone();
        Some(handler.invoke(ctx, params).await)
    }
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::HttpRequest;

    #[test]
    fn seeds_every_builtin() {
        let registry = ComponentRegistry::new();
        for &name in BUILTIN_NAMES {
            assert!(registry.is_builtin(name));
            assert!(registry.get(name).is_some());
        }
    }

    #[test]
    fn builtins_cannot_be_overwritten_or_deleted() {
        let registry = ComponentRegistry::new();
        let overwrite = ComponentDefinition::builtin("log-message");
        assert_eq!(registry.save(overwrite), Err(RegistryError::BuiltinIsImmutable("log-message".to_owned())));
        assert_eq!(registry.delete("log-message"), Err(RegistryError::BuiltinIsImmutable("log-message".to_owned())));
    }

    #[test]
    fn script_components_can_be_saved_and_deleted() {
        let registry = ComponentRegistry::new();
        let def = ComponentDefinition {
            id: "my-script".to_owned(),
            display_name: "My Script".to_owned(),
            kind: ComponentKind::Script { source: "fn run(config, ctx) { ctx }".to_owned() },
            parameters: Vec::new(),
            created_at_ms: 0,
            updated_at_ms: 0,
        };
        registry.save(def).unwrap();
        assert!(registry.get("my-script").is_some());
        registry.delete("my-script").unwrap();
        assert!(registry.get("my-script").is_none());
    }

    #[tokio::test]
    async fn invoke_builtin_dispatches_by_id() {
        let registry = ComponentRegistry::new();
        let mut ctx = ComponentContext::new(HttpRequest::new("GET", "http://example.com/"));
        let mut params = ParamMap::new();
        params.insert("message".to_owned(), ParamValue::String("hi".to_owned()));
        let result = registry.invoke_builtin("log-message", &mut ctx, &params).await.unwrap().unwrap();
        ctx.apply(result);
        assert_eq!(ctx.log, vec!["hi".to_owned()]);
    }

    #[tokio::test]
    async fn invoke_builtin_returns_none_for_unknown_id() {
        let registry = ComponentRegistry::new();
        let mut ctx = ComponentContext::new(HttpRequest::new("GET", "http://example.com/"));
        let params = ParamMap::new();
        assert!(registry.invoke_builtin("not-a-thing", &mut ctx, &params).await.is_none());
    }
}
