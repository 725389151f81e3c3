//! `ComponentContext`/`ComponentResult` (spec.md §3).

use serde::{Deserialize, Serialize};

use crate::model::{HttpRequest, HttpResponse, ParamMap, ParamValue};

/// The live, mutable state one flow execution threads through every node
/// it visits: the request (possibly already rewritten), an optional
/// response once something has synthesized or fetched one, a free-form
/// variable bag scoped to this execution, and an append-only log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentContext {
    pub request: HttpRequest,
    pub response: Option<HttpResponse>,
    pub vars: ParamMap,
    pub log: Vec<String>,
}

impl ComponentContext {
    #[must_use]
    pub fn new(request: HttpRequest) -> Self {
        Self {
            request,
            response: None,
            vars: ParamMap::new(),
            log: Vec::new(),
        }
    }

    /// Append a line to the execution log. Builtins and the script
    /// sandbox's `ctx.log`/`console.log`/`console.error` all funnel here.
    pub fn log(&mut self, message: impl Into<String>) {
        self.log.push(message.into());
    }

    /// Fold a [`ComponentResult`] into this context, per spec.md §4.3:
    /// a new request replaces the live one, a new response installs on
    /// the context, variable updates merge over existing vars, and
    /// `terminate` is reported back to the caller to stop the walk.
    pub fn apply(&mut self, result: ComponentResult) -> bool {
        if let Some(request) = result.request {
            self.request = request;
        }
        if let Some(response) = result.response {
            self.response = Some(response);
        }
        for (key, value) in result.vars {
            self.vars.insert(key, value);
        }
        for line in result.log {
            self.log.push(line);
        }
        result.terminate
    }
}

/// Any subset of {replacement request, synthesized response, variable
/// updates, terminate flag} a component or script hands back (spec.md §3).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComponentResult {
    pub request: Option<HttpRequest>,
    pub response: Option<HttpResponse>,
    pub vars: ParamMap,
    pub terminate: bool,
    pub log: Vec<String>,
}

impl ComponentResult {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_response(response: HttpResponse) -> Self {
        Self {
            response: Some(response),
            terminate: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_request(request: HttpRequest) -> Self {
        Self {
            request: Some(request),
            ..Self::default()
        }
    }

    pub fn set_var(&mut self, key: impl Into<String>, value: ParamValue) {
        self.vars.insert(key.into(), value);
    }
}
