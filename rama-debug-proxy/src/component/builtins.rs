//! The 17 built-in handlers enumerated in spec.md §4.4.
//!
//! Each builtin reads its parameters out of the [`ParamMap`] attached to
//! its [`crate::flow::FlowNode::Component`] node, mutates the
//! [`ComponentContext`] in place via the returned [`ComponentResult`], and
//! never returns an `Err` for a missing/malformed parameter — builtins
//! are forgiving by convention (a missing parameter is a no-op for that
//! parameter) so a misconfigured flow degrades rather than crashes the
//! connection, matching spec.md §7's "recovered at the offending node".

use std::future::Future;
use std::pin::Pin;

use rand::Rng as _;

use crate::error::FlowExecutionError;
use crate::model::{HttpResponse, ParamMap, ParamValue};

use super::context::{ComponentContext, ComponentResult};
use super::jsonpath;

/// Dynamic-dispatch seam for builtin handlers, mirroring the boxed-future
/// idiom `rama-core/src/service/svc.rs` uses for its own `BoxService` /
/// `DynService` split — simplified to a single trait here because
/// components are looked up and invoked individually by id, never
/// composed into a generic middleware stack the way `Service` is.
pub trait Component: Send + Sync + std::fmt::Debug {
    fn invoke<'a>(
        &'a self,
        ctx: &'a mut ComponentContext,
        params: &'a ParamMap,
    ) -> Pin<Box<dyn Future<Output = Result<ComponentResult, FlowExecutionError>> + Send + 'a>>;
}

fn str_param<'a>(params: &'a ParamMap, name: &str) -> Option<&'a str> {
    params.get(name).and_then(ParamValue::as_str)
}

fn f64_param(params: &ParamMap, name: &str) -> Option<f64> {
    params.get(name).and_then(ParamValue::as_f64)
}

fn bool_param(params: &ParamMap, name: &str) -> Option<bool> {
    params.get(name).and_then(ParamValue::as_bool)
}

fn csv_param<'a>(params: &'a ParamMap, name: &str) -> Vec<&'a str> {
    str_param(params, name)
        .map(|s| s.split(',').map(str::trim).filter(|s| !s.is_empty()).collect())
        .unwrap_or_default()
}

fn json_param(params: &ParamMap, name: &str) -> Option<serde_json::Value> {
    let raw = str_param(params, name)?;
    serde_json::from_str(raw).ok()
}

fn split_host_port(target: &str) -> (String, Option<u16>) {
    match target.rsplit_once(':').and_then(|(host, port)| port.parse::<u16>().ok().map(|p| (host, p))) {
        Some((host, port)) => (host.to_owned(), Some(port)),
        None => (target.to_owned(), None),
    }
}

/// Rebuild an absolute URL with a new scheme/host/port, keeping the
/// existing path and query untouched.
fn rewrite_authority(url: &str, scheme: Option<&str>, host: &str, port: Option<u16>) -> String {
    let uri: rama_http_types::Uri = match url.parse() {
        Ok(uri) => uri,
        Err(_) => return url.to_owned(),
    };
    let scheme = scheme
        .map(str::to_owned)
        .or_else(|| uri.scheme_str().map(str::to_owned))
        .unwrap_or_else(|| "http".to_owned());
    let path_and_query = uri.path_and_query().map(|p| p.as_str()).unwrap_or("/");
    match port {
        Some(port) => format!("{scheme}://{host}:{port}{path_and_query}"),
        None => format!("{scheme}://{host}{path_and_query}"),
    }
}

fn mock_response_from_params(params: &ParamMap, default_status: u16) -> HttpResponse {
    let status = f64_param(params, "statusCode").map(|n| n as u16).unwrap_or(default_status);
    let mut response = HttpResponse::new(status);
    if let Some(message) = str_param(params, "statusMessage") {
        response.reason = message.to_owned();
    }
    let content_type = str_param(params, "contentType").unwrap_or("text/plain");
    let body = str_param(params, "body").unwrap_or_default();
    response = response.with_body(content_type, body.to_owned());
    if let Some(serde_json::Value::Object(extra)) = json_param(params, "headersJson") {
        for (key, value) in extra {
            if let Some(value) = value.as_str() {
                response.set_header(&key, value.to_owned());
            }
        }
    }
    response
}

macro_rules! boxed_invoke {
    ($ctx:ident, $params:ident, $body:block) => {
        fn invoke<'a>(
            &'a self,
            $ctx: &'a mut ComponentContext,
            $params: &'a ParamMap,
        ) -> Pin<Box<dyn Future<Output = Result<ComponentResult, FlowExecutionError>> + Send + 'a>>
        {
            Box::pin(async move { Ok($body) })
        }
    };
}

#[derive(Debug, Default)]
pub struct HeaderRewrite;

impl Component for HeaderRewrite {
    boxed_invoke!(ctx, params, {
        if let (Some(name), Some(value)) = (str_param(params, "addHeaderName"), str_param(params, "addHeaderValue")) {
            ctx.request.set_header(name, value.to_owned());
        }
        for name in csv_param(params, "removeHeaderNames") {
            ctx.request.remove_header(name);
        }
        ComponentResult::empty()
    });
}

#[derive(Debug, Default)]
pub struct MockResponse;

impl Component for MockResponse {
    boxed_invoke!(ctx, params, {
        let _ = ctx;
        ComponentResult::with_response(mock_response_from_params(params, 200))
    });
}

#[derive(Debug, Default)]
pub struct Delay;

impl Component for Delay {
    fn invoke<'a>(
        &'a self,
        ctx: &'a mut ComponentContext,
        params: &'a ParamMap,
    ) -> Pin<Box<dyn Future<Output = Result<ComponentResult, FlowExecutionError>> + Send + 'a>> {
        let _ = ctx;
        let ms = f64_param(params, "ms").unwrap_or(0.0).max(0.0) as u64;
        Box::pin(async move {
            tokio::time::sleep(std::time::Duration::from_millis(ms)).await;
            Ok(ComponentResult::empty())
        })
    }
}

#[derive(Debug, Default)]
pub struct UrlHostRewrite;

impl Component for UrlHostRewrite {
    boxed_invoke!(ctx, params, {
        if let Some(target) = str_param(params, "targetHost") {
            let (host, port) = split_host_port(target);
            let scheme = str_param(params, "targetScheme");
            ctx.request.url = rewrite_authority(&ctx.request.url, scheme, &host, port);
            if !bool_param(params, "preserveHostHeader").unwrap_or(false) {
                let host_header = match port {
                    Some(port) => format!("{host}:{port}"),
                    None => host,
                };
                ctx.request.set_header("Host", host_header);
            }
        }
        ComponentResult::empty()
    });
}

#[derive(Debug, Default)]
pub struct UrlQueryParams;

impl Component for UrlQueryParams {
    fn invoke<'a>(
        &'a self,
        ctx: &'a mut ComponentContext,
        params: &'a ParamMap,
    ) -> Pin<Box<dyn Future<Output = Result<ComponentResult, FlowExecutionError>> + Send + 'a>> {
        Box::pin(async move {
            let Ok(uri) = ctx.request.url.parse::<rama_http_types::Uri>() else {
                return Ok(ComponentResult::empty());
            };
            let base = format!(
                "{}://{}{}",
                uri.scheme_str().unwrap_or("http"),
                uri.authority().map(|a| a.as_str()).unwrap_or_default(),
                uri.path()
            );
            let mut pairs: Vec<(String, String)> = uri
                .query()
                .unwrap_or_default()
                .split('&')
                .filter(|s| !s.is_empty())
                .filter_map(|pair| {
                    let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
                    Some((k.to_owned(), v.to_owned()))
                })
                .collect();

            for name in csv_param(params, "removeParamNames") {
                pairs.retain(|(k, _)| k != name);
            }
            if let Some(serde_json::Value::Object(add)) = json_param(params, "addParamsJson") {
                for (key, value) in add {
                    let value = value.as_str().map(str::to_owned).unwrap_or_else(|| value.to_string());
                    pairs.retain(|(k, _)| k != &key);
                    pairs.push((key, value));
                }
            }

            ctx.request.url = if pairs.is_empty() {
                base
            } else {
                let query = pairs.iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join("&");
                format!("{base}?{query}")
            };
            Ok(ComponentResult::empty())
        })
    }
}

#[derive(Debug, Default)]
pub struct UpstreamHost;

impl Component for UpstreamHost {
    boxed_invoke!(ctx, params, {
        if let Some(target) = str_param(params, "targetHost") {
            let (host, port) = split_host_port(target);
            let scheme = Some(str_param(params, "targetScheme").unwrap_or("http"));
            ctx.request.url = rewrite_authority(&ctx.request.url, scheme, &host, port);
            let host_header = match port {
                Some(port) => format!("{host}:{port}"),
                None => host,
            };
            ctx.request.set_header("Host", host_header);
        }
        ComponentResult::empty()
    });
}

#[derive(Debug, Default)]
pub struct JsonBodyModify;

impl Component for JsonBodyModify {
    fn invoke<'a>(
        &'a self,
        ctx: &'a mut ComponentContext,
        params: &'a ParamMap,
    ) -> Pin<Box<dyn Future<Output = Result<ComponentResult, FlowExecutionError>> + Send + 'a>> {
        Box::pin(async move {
            let is_json = ctx
                .request
                .header("Content-Type")
                .map(|ct| ct.to_ascii_lowercase().contains("application/json"))
                .unwrap_or(false);
            if !is_json {
                return Ok(ComponentResult::empty());
            }
            let Some(body) = ctx.request.body.clone() else {
                return Ok(ComponentResult::empty());
            };
            let Ok(mut value) = serde_json::from_str::<serde_json::Value>(&body) else {
                ctx.log("json-body-modify: request body is not valid JSON");
                return Ok(ComponentResult::empty());
            };
            let Some(path) = str_param(params, "jsonPath") else {
                return Ok(ComponentResult::empty());
            };
            let operation = str_param(params, "operation").unwrap_or("set");
            let new_value = json_param(params, "valueJson").unwrap_or(serde_json::Value::Null);

            let outcome = match operation {
                "remove" => jsonpath::remove(&mut value, path),
                "append" => jsonpath::append(&mut value, path, new_value),
                _ => jsonpath::set(&mut value, path, new_value),
            };
            if let Err(err) = outcome {
                ctx.log(format!("json-body-modify: {err}"));
                return Ok(ComponentResult::empty());
            }

            let serialized = value.to_string();
            ctx.request.set_header("Content-Length", serialized.len().to_string());
            ctx.request.body = Some(serialized);
            Ok(ComponentResult::empty())
        })
    }
}

#[derive(Debug, Default)]
pub struct ResponseOverride;

impl Component for ResponseOverride {
    boxed_invoke!(ctx, params, {
        let _ = ctx;
        ComponentResult::with_response(mock_response_from_params(params, 200))
    });
}

#[derive(Debug, Default)]
pub struct HeaderCopy;

impl Component for HeaderCopy {
    boxed_invoke!(ctx, params, {
        if let (Some(source), Some(target)) = (str_param(params, "sourceHeader"), str_param(params, "targetHeader"))
            && let Some(value) = ctx.request.header(source).map(str::to_owned)
        {
            ctx.request.set_header(target, value);
        }
        ComponentResult::empty()
    });
}

#[derive(Debug, Default)]
pub struct CookieInject;

impl Component for CookieInject {
    boxed_invoke!(ctx, params, {
        if let (Some(name), Some(value)) = (str_param(params, "cookieName"), str_param(params, "cookieValue")) {
            let mut jar: Vec<(String, String)> = ctx
                .request
                .header("Cookie")
                .unwrap_or_default()
                .split(';')
                .filter_map(|pair| {
                    let pair = pair.trim();
                    if pair.is_empty() {
                        return None;
                    }
                    let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
                    Some((k.trim().to_owned(), v.trim().to_owned()))
                })
                .collect();
            jar.retain(|(k, _)| k != name);
            jar.push((name.to_owned(), value.to_owned()));
            let cookie_header = jar.iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join("; ");
            ctx.request.set_header("Cookie", cookie_header);
        }
        ComponentResult::empty()
    });
}

#[derive(Debug, Default)]
pub struct AuthInject;

impl Component for AuthInject {
    boxed_invoke!(ctx, params, {
        let override_existing = bool_param(params, "overrideExisting").unwrap_or(true);
        if (override_existing || ctx.request.header("Authorization").is_none())
            && let (Some(scheme), Some(token)) = (str_param(params, "scheme"), str_param(params, "token"))
        {
            ctx.request.set_header("Authorization", format!("{scheme} {token}"));
        }
        ComponentResult::empty()
    });
}

#[derive(Debug, Default)]
pub struct BandwidthThrottle;

impl Component for BandwidthThrottle {
    fn invoke<'a>(
        &'a self,
        ctx: &'a mut ComponentContext,
        params: &'a ParamMap,
    ) -> Pin<Box<dyn Future<Output = Result<ComponentResult, FlowExecutionError>> + Send + 'a>> {
        let _ = ctx;
        let ms = f64_param(params, "delayMs").unwrap_or(0.0).max(0.0) as u64;
        Box::pin(async move {
            tokio::time::sleep(std::time::Duration::from_millis(ms)).await;
            Ok(ComponentResult::empty())
        })
    }
}

#[derive(Debug, Default)]
pub struct RandomFailure;

impl Component for RandomFailure {
    boxed_invoke!(ctx, params, {
        let _ = ctx;
        let rate = f64_param(params, "errorRate").unwrap_or(0.0).clamp(0.0, 1.0);
        let roll: f64 = rand::rng().random_range(0.0..1.0);
        if roll < rate {
            let status = f64_param(params, "statusCode").map(|n| n as u16).unwrap_or(500);
            let body = str_param(params, "body").unwrap_or("injected failure").to_owned();
            ComponentResult::with_response(HttpResponse::new(status).with_body("text/plain", body))
        } else {
            ComponentResult::empty()
        }
    });
}

#[derive(Debug, Default)]
pub struct RetryHint;

impl Component for RetryHint {
    boxed_invoke!(ctx, params, {
        let _ = ctx;
        let mut retry = std::collections::BTreeMap::new();
        if let Some(max) = f64_param(params, "maxRetries") {
            retry.insert("maxRetries".to_owned(), ParamValue::Number(max));
        }
        if let Some(delay) = f64_param(params, "retryDelayMs") {
            retry.insert("retryDelayMs".to_owned(), ParamValue::Number(delay));
        }
        let codes = csv_param(params, "retryOnStatusCodes");
        if !codes.is_empty() {
            retry.insert(
                "retryOnStatusCodes".to_owned(),
                ParamValue::List(codes.into_iter().map(|c| ParamValue::String(c.to_owned())).collect()),
            );
        }
        let mut result = ComponentResult::empty();
        result.set_var("retry", ParamValue::Map(retry));
        result
    });
}

#[derive(Debug, Default)]
pub struct CorsAllowAll;

impl Component for CorsAllowAll {
    boxed_invoke!(ctx, params, {
        if ctx.request.method.eq_ignore_ascii_case("OPTIONS") {
            let mut response = HttpResponse::new(204);
            response.set_header("Access-Control-Allow-Origin", str_param(params, "allowOrigins").unwrap_or("*").to_owned());
            response.set_header("Access-Control-Allow-Methods", str_param(params, "allowMethods").unwrap_or("*").to_owned());
            response.set_header("Access-Control-Allow-Headers", str_param(params, "allowHeaders").unwrap_or("*").to_owned());
            ComponentResult::with_response(response)
        } else {
            ComponentResult::empty()
        }
    });
}

#[derive(Debug, Default)]
pub struct StaticLocalFile;

impl Component for StaticLocalFile {
    fn invoke<'a>(
        &'a self,
        ctx: &'a mut ComponentContext,
        params: &'a ParamMap,
    ) -> Pin<Box<dyn Future<Output = Result<ComponentResult, FlowExecutionError>> + Send + 'a>> {
        let _ = ctx;
        let path = str_param(params, "filePath").map(str::to_owned);
        let content_type = str_param(params, "contentType").unwrap_or("text/plain").to_owned();
        Box::pin(async move {
            let Some(path) = path else {
                return Ok(ComponentResult::empty());
            };
            match tokio::fs::read_to_string(&path).await {
                Ok(contents) => Ok(ComponentResult::with_response(HttpResponse::new(200).with_body(&content_type, contents))),
                Err(err) => Ok(ComponentResult::with_response(
                    HttpResponse::new(500).with_body("text/plain", format!("static-local-file: {err}")),
                )),
            }
        })
    }
}

#[derive(Debug, Default)]
pub struct LogMessage;

impl Component for LogMessage {
    boxed_invoke!(ctx, params, {
        if let Some(message) = str_param(params, "message") {
            ctx.log(message.to_owned());
        }
        ComponentResult::empty()
    });
}

#[derive(Debug, Default)]
pub struct TagRequest;

impl Component for TagRequest {
    boxed_invoke!(ctx, params, {
        let _ = ctx;
        let mut result = ComponentResult::empty();
        if let (Some(key), Some(value)) = (str_param(params, "tagKey"), str_param(params, "tagValue")) {
            let mut tags = std::collections::BTreeMap::new();
            tags.insert(key.to_owned(), ParamValue::String(value.to_owned()));
            result.set_var("tags", ParamValue::Map(tags));
        }
        result
    });
}

/// Stable internal names, keyed to their handler, matching spec.md §4.4's
/// canonical table verbatim.
pub const BUILTIN_NAMES: &[&str] = &[
    "header-rewrite",
    "mock-response",
    "delay",
    "url-host-rewrite",
    "url-query-params",
    "upstream-host",
    "json-body-modify",
    "response-override",
    "header-copy",
    "cookie-inject",
    "auth-inject",
    "bandwidth-throttle",
    "random-failure",
    "retry-hint",
    "cors-allow-all",
    "static-local-file",
    "log-message",
    "tag-request",
];

pub fn handler_for_name(name: &str) -> Option<Box<dyn Component>> {
    let handler: Box<dyn Component> = match name {
        "header-rewrite" => Box::new(HeaderRewrite),
        "mock-response" => Box::new(MockResponse),
        "delay" => Box::new(Delay),
        "url-host-rewrite" => Box::new(UrlHostRewrite),
        "url-query-params" => Box::new(UrlQueryParams),
        "upstream-host" => Box::new(UpstreamHost),
        "json-body-modify" => Box::new(JsonBodyModify),
        "response-override" => Box::new(ResponseOverride),
        "header-copy" => Box::new(HeaderCopy),
        "cookie-inject" => Box::new(CookieInject),
        "auth-inject" => Box::new(AuthInject),
        "bandwidth-throttle" => Box::new(BandwidthThrottle),
        "random-failure" => Box::new(RandomFailure),
        "retry-hint" => Box::new(RetryHint),
        "cors-allow-all" => Box::new(CorsAllowAll),
        "static-local-file" => Box::new(StaticLocalFile),
        "log-message" => Box::new(LogMessage),
        "tag-request" => Box::new(TagRequest),
        _ => return None,
    };
    Some(handler)
}
