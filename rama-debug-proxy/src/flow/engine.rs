//! Flow Engine: the request-time graph walk (spec.md §4.3).

use std::sync::Arc;

use crate::component::{ComponentContext, ComponentKind, ComponentRegistry};
use crate::error::FlowExecutionError;
use crate::model::HttpRequest;
use crate::sandbox::ScriptSandbox;

use super::glob::matches_any;
use super::model::{FlowDefinition, FlowNode, MatchRule, TerminatorMode};
use super::store::FlowStore;

/// Outcome of walking a request through a matched flow (or falling
/// through with no flow matching at all).
#[derive(Debug)]
pub struct FlowOutcome {
    pub matched_flow_id: Option<u64>,
    pub context: ComponentContext,
    /// `true` when a Terminator in `end_with_response` mode fired with a
    /// response present — the engine should answer the client directly
    /// instead of forwarding upstream.
    pub short_circuited: bool,
}

/// Ties together the flow catalog, the component registry, and the
/// script sandbox to execute the matched flow for an incoming request.
pub struct FlowEngine {
    store: Arc<FlowStore>,
    registry: Arc<ComponentRegistry>,
    sandbox: Arc<ScriptSandbox>,
}

impl FlowEngine {
    #[must_use]
    pub fn new(store: Arc<FlowStore>, registry: Arc<ComponentRegistry>, sandbox: Arc<ScriptSandbox>) -> Self {
        Self { store, registry, sandbox }
    }

    /// Find the first enabled flow (ascending id) whose Entry node
    /// matches `request`.
    #[must_use]
    pub fn match_flow(&self, request: &HttpRequest) -> Option<FlowDefinition> {
        self.store
            .list_enabled()
            .into_iter()
            .find(|flow| flow.entry().is_some_and(|entry| entry_matches(entry, request)))
    }

    /// Run `request` through the first matching flow, or return it
    /// untouched (no flow matched) for the caller to forward as-is.
    pub async fn execute(&self, request: HttpRequest) -> FlowOutcome {
        let Some(flow) = self.match_flow(&request) else {
            return FlowOutcome {
                matched_flow_id: None,
                context: ComponentContext::new(request),
                short_circuited: false,
            };
        };
        self.run_flow(&flow, request).await
    }

    /// Run a specific flow by id regardless of whether its Entry would
    /// match, for the debug/dry-run API (spec.md §4.3 "preview a flow
    /// against an arbitrary sample request").
    pub async fn debug_execute(&self, flow_id: u64, request: HttpRequest) -> Option<FlowOutcome> {
        let flow = self.store.get(flow_id)?;
        Some(self.run_flow(&flow, request).await)
    }

    async fn run_flow(&self, flow: &FlowDefinition, request: HttpRequest) -> FlowOutcome {
        let mut ctx = ComponentContext::new(request);
        let Some(entry) = flow.entry() else {
            return FlowOutcome { matched_flow_id: Some(flow.id), context: ctx, short_circuited: false };
        };

        let mut current = match flow.outgoing(entry.id()).first() {
            Some(edge) => edge.to,
            None => return FlowOutcome { matched_flow_id: Some(flow.id), context: ctx, short_circuited: false },
        };

        loop {
            let Some(node) = flow.node(current) else {
                break;
            };
            match node {
                FlowNode::Entry { .. } => break,
                FlowNode::Component { component_id, params, .. } => {
                    let terminate = self.invoke_component(component_id, params, &mut ctx).await;
                    if terminate {
                        break;
                    }
                    match flow.outgoing(current).first() {
                        Some(edge) => current = edge.to,
                        None => break,
                    }
                }
                FlowNode::Condition { id, expression } => {
                    let verdict = self.sandbox.eval_condition(expression, &ctx);
                    let label = if verdict { "true" } else { "false" };
                    let next = flow
                        .outgoing(*id)
                        .into_iter()
                        .find(|edge| edge.label.as_deref() == Some(label));
                    match next {
                        Some(edge) => current = edge.to,
                        None => break,
                    }
                }
                FlowNode::Terminator { mode, .. } => {
                    let short_circuited = matches!(mode, TerminatorMode::EndWithResponse) && ctx.response.is_some();
                    return FlowOutcome { matched_flow_id: Some(flow.id), context: ctx, short_circuited };
                }
            }
        }

        FlowOutcome { matched_flow_id: Some(flow.id), context: ctx, short_circuited: false }
    }

    /// Invoke one Component node's handler — builtin or script — merge
    /// its result into `ctx`, and report whether execution should stop.
    async fn invoke_component(
        &self,
        component_id: &str,
        params: &crate::model::ParamMap,
        ctx: &mut ComponentContext,
    ) -> bool {
        if let Some(result) = self.registry.invoke_builtin(component_id, ctx, params).await {
            return self.apply_or_log(ctx, result, component_id);
        }

        let Some(definition) = self.registry.get(component_id) else {
            ctx.log(format!("component '{component_id}' is not registered; skipped"));
            return false;
        };
        let ComponentKind::Script { source } = definition.kind else {
            ctx.log(format!("component '{component_id}' has no handler; skipped"));
            return false;
        };
        let result = self.sandbox.run(component_id, &source, params, ctx);
        self.apply_or_log(ctx, result, component_id)
    }

    fn apply_or_log(
        &self,
        ctx: &mut ComponentContext,
        result: Result<crate::component::ComponentResult, FlowExecutionError>,
        component_id: &str,
    ) -> bool {
        match result {
            Ok(result) => ctx.apply(result),
            Err(err) => {
                ctx.log(format!("component '{component_id}' failed: {err}; default edge taken"));
                false
            }
        }
    }
}

/// Does `request` satisfy `entry`'s [`MatchRule`]? Every constrained
/// dimension (method / host / path) must pass; an absent list passes
/// trivially (spec.md §4.3).
fn entry_matches(entry: &FlowNode, request: &HttpRequest) -> bool {
    let FlowNode::Entry { match_rule, .. } = entry else {
        return false;
    };
    method_matches(match_rule, &request.method)
        && matches_any(match_rule.host_globs.as_deref(), request.host().unwrap_or_default().as_str())
        && matches_any(match_rule.path_globs.as_deref(), &request.path())
}

fn method_matches(rule: &MatchRule, method: &str) -> bool {
    match &rule.methods {
        None => true,
        Some(methods) if methods.is_empty() => true,
        Some(methods) => methods.iter().any(|m| m.eq_ignore_ascii_case(method)),
    }
}
