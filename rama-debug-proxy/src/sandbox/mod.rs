//! Script Sandbox (spec.md §4.5): runs user-supplied `rhai` source against
//! a restricted, per-invocation context with exactly three bound names —
//! `config`, `ctx`, and a `console` whose `log`/`error` route to the
//! execution's log sink.
//!
//! Grounded on `other_examples/manifests/EtaCassiopeia-rift` for the
//! choice of `rhai` as the embedded scripting language (see DESIGN.md's
//! Open Question decision 5); the engine hardening below (no module
//! resolver, no filesystem/network/timer functions ever registered) is
//! this crate's own reading of spec.md §4.5's "Rationale for isolation".

mod console;

use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use parking_lot::Mutex;
use rhai::{Dynamic, Engine, Scope, AST};
use serde::{Deserialize, Serialize};

use crate::component::{ComponentContext, ComponentResult};
use crate::error::FlowExecutionError;
use crate::model::{HttpRequest, HttpResponse, ParamMap};

use console::Console;

/// The serializable view of a [`ComponentContext`] handed to scripts,
/// round-tripped through `rhai::serde`. Distinct from `ComponentContext`
/// only in carrying an explicit `terminate` flag, since scripts signal
/// termination by setting a field rather than returning a special value
/// (except in the `run(config, ctx)` convention, which returns a
/// [`ComponentResult`] directly).
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ScriptContext {
    request: HttpRequest,
    response: Option<HttpResponse>,
    vars: ParamMap,
    terminate: bool,
}

impl From<&ComponentContext> for ScriptContext {
    fn from(ctx: &ComponentContext) -> Self {
        Self {
            request: ctx.request.clone(),
            response: ctx.response.clone(),
            vars: ctx.vars.clone(),
            terminate: false,
        }
    }
}

impl ScriptContext {
    fn into_result(self, extra_log: Vec<String>) -> ComponentResult {
        ComponentResult {
            request: Some(self.request),
            response: self.response,
            vars: self.vars,
            terminate: self.terminate,
            log: extra_log,
        }
    }
}

fn source_fingerprint(source: &str) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    source.hash(&mut hasher);
    hasher.finish()
}

/// Compiled-script cache entry, keyed by component id plus a hash of the
/// source text so a re-saved script invalidates its own cache entry.
struct CacheEntry {
    fingerprint: u64,
    ast: Arc<AST>,
}

/// Executes user scripts in an isolated environment.
///
/// One `rhai::Engine` is shared across every invocation (it holds no
/// per-script state); compiled ASTs are cached per component id.
pub struct ScriptSandbox {
    engine: Engine,
    cache: Mutex<HashMap<String, CacheEntry>>,
}

impl std::fmt::Debug for ScriptSandbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptSandbox").finish()
    }
}

impl ScriptSandbox {
    #[must_use]
    pub fn new() -> Self {
        let mut engine = Engine::new();
        // No filesystem, network, or timer functions are ever registered;
        // no module resolver means `import` always fails to resolve.
        engine.set_module_resolver(rhai::module_resolvers::DummyModuleResolver::new());
        engine.set_max_expr_depths(64, 64);
        engine.register_type_with_name::<Console>("Console");
        engine.register_fn("log", Console::log);
        engine.register_fn("error", Console::error);
        Self {
            engine,
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn compile(&self, component_id: &str, source: &str) -> Result<Arc<AST>, FlowExecutionError> {
        let fingerprint = source_fingerprint(source);
        {
            let cache = self.cache.lock();
            if let Some(entry) = cache.get(component_id)
                && entry.fingerprint == fingerprint
            {
                return Ok(entry.ast.clone());
            }
        }
        let ast = self
            .engine
            .compile(source)
            .map_err(|err| FlowExecutionError(format!("script '{component_id}' failed to compile: {err}")))?;
        let ast = Arc::new(ast);
        self.cache.lock().insert(
            component_id.to_owned(),
            CacheEntry { fingerprint, ast: ast.clone() },
        );
        Ok(ast)
    }

    /// Run `source` (cached under `component_id`) against `ctx` with
    /// `config` bound as the parameter map, per spec.md §4.5's
    /// `run(config, ctx)` convention (or whole-script evaluation when no
    /// `run` function is defined).
    pub fn run(
        &self,
        component_id: &str,
        source: &str,
        config: &ParamMap,
        ctx: &mut ComponentContext,
    ) -> Result<ComponentResult, FlowExecutionError> {
        let ast = self.compile(component_id, source)?;
        let log = Arc::new(Mutex::new(Vec::new()));
        let console = Console::new(log.clone());

        let config_dynamic = rhai::serde::to_dynamic(config)
            .map_err(|err| FlowExecutionError(format!("script '{component_id}': config conversion failed: {err}")))?;
        let script_ctx = ScriptContext::from(&*ctx);
        let ctx_dynamic = rhai::serde::to_dynamic(&script_ctx)
            .map_err(|err| FlowExecutionError(format!("script '{component_id}': ctx conversion failed: {err}")))?;

        if ast.iter_functions().any(|f| f.name == "run") {
            let result: Result<Dynamic, _> = self.engine.call_fn(
                &mut Scope::new(),
                &ast,
                "run",
                (config_dynamic, ctx_dynamic),
            );
            let value = result.map_err(|err| {
                FlowExecutionError(format!("script '{component_id}' raised an error: {err}"))
            })?;
            let mut component_result: ComponentResult = rhai::serde::from_dynamic(&value).map_err(|err| {
                FlowExecutionError(format!("script '{component_id}' returned an unexpected value: {err}"))
            })?;
            component_result.log.splice(0..0, log.lock().drain(..));
            return Ok(component_result);
        }

        let mut scope = Scope::new();
        scope.push("config", config_dynamic);
        scope.push("ctx", ctx_dynamic);
        scope.push("console", console);

        self.engine
            .eval_ast_with_scope::<Dynamic>(&mut scope, &ast)
            .map_err(|err| FlowExecutionError(format!("script '{component_id}' raised an error: {err}")))?;

        let final_ctx: Dynamic = scope
            .get_value("ctx")
            .ok_or_else(|| FlowExecutionError(format!("script '{component_id}' removed `ctx` from scope")))?;
        let script_ctx: ScriptContext = rhai::serde::from_dynamic(&final_ctx)
            .map_err(|err| FlowExecutionError(format!("script '{component_id}': ctx projection failed: {err}")))?;

        let captured_log = log.lock().drain(..).collect();
        Ok(script_ctx.into_result(captured_log))
    }

    /// Evaluate `expression` as a boolean predicate over `ctx`, per
    /// spec.md §4.3. Evaluation failure (parse error, type mismatch,
    /// thrown exception) is treated as `false`.
    #[must_use]
    pub fn eval_condition(&self, expression: &str, ctx: &ComponentContext) -> bool {
        let script_ctx = ScriptContext::from(ctx);
        let Ok(ctx_dynamic) = rhai::serde::to_dynamic(&script_ctx) else {
            return false;
        };
        let mut scope = Scope::new();
        scope.push("ctx", ctx_dynamic);
        self.engine
            .eval_with_scope::<bool>(&mut scope, expression)
            .unwrap_or(false)
    }
}

impl Default for ScriptSandbox {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::HttpRequest;

    fn ctx() -> ComponentContext {
        ComponentContext::new(HttpRequest::new("GET", "http://example.com/a?x=1"))
    }

    #[test]
    fn run_function_convention_returns_component_result() {
        let sandbox = ScriptSandbox::new();
        let mut c = ctx();
        let params = ParamMap::new();
        let source = r#"
            fn run(config, ctx) {
                ctx.vars.touched = true;
                ctx
            }
        "#;
        let result = sandbox.run("t1", source, &params, &mut c).unwrap();
        assert!(result.vars.contains_key("touched"));
    }

    #[test]
    fn whole_script_projection_without_run_function() {
        let sandbox = ScriptSandbox::new();
        let mut c = ctx();
        let params = ParamMap::new();
        let source = r#"
            ctx.terminate = true;
        "#;
        let result = sandbox.run("t2", source, &params, &mut c).unwrap();
        assert!(result.terminate);
    }

    #[test]
    fn console_log_is_captured_into_result_log() {
        let sandbox = ScriptSandbox::new();
        let mut c = ctx();
        let params = ParamMap::new();
        let source = r#"
            console.log("hello from script");
        "#;
        let result = sandbox.run("t3", source, &params, &mut c).unwrap();
        assert_eq!(result.log, vec!["hello from script".to_owned()]);
    }

    #[test]
    fn thrown_error_is_surfaced_as_flow_execution_error() {
        let sandbox = ScriptSandbox::new();
        let mut c = ctx();
        let params = ParamMap::new();
        let source = r#"throw "boom";"#;
        let err = sandbox.run("t4", source, &params, &mut c).unwrap_err();
        assert!(err.0.contains("boom"));
    }

    #[test]
    fn import_statements_cannot_resolve_modules() {
        let sandbox = ScriptSandbox::new();
        let mut c = ctx();
        let params = ParamMap::new();
        let source = r#"import "anything" as m;"#;
        assert!(sandbox.run("t5", source, &params, &mut c).is_err());
    }

    #[test]
    fn eval_condition_treats_failure_as_false() {
        let sandbox = ScriptSandbox::new();
        let c = ctx();
        assert!(!sandbox.eval_condition("this is not valid rhai (((", &c));
    }

    #[test]
    fn eval_condition_reads_request_fields() {
        let sandbox = ScriptSandbox::new();
        let c = ctx();
        assert!(sandbox.eval_condition(r#"ctx.request.method == "GET""#, &c));
        assert!(!sandbox.eval_condition(r#"ctx.request.method == "POST""#, &c));
    }

    #[test]
    fn compile_cache_recompiles_on_source_change() {
        let sandbox = ScriptSandbox::new();
        let mut c = ctx();
        let params = ParamMap::new();
        let first = sandbox.run("cache-test", "ctx.terminate = false;", &params, &mut c).unwrap();
        assert!(!first.terminate);
        let second = sandbox.run("cache-test", "ctx.terminate = true;", &params, &mut c).unwrap();
        assert!(second.terminate);
    }
}
