//! Client-facing accept loop: plain HTTP forwarding and the CONNECT
//! tunnel/MITM split (spec.md §4.2).
//!
//! Grounded on `examples/plabayo-rama/examples/http_connect_proxy.rs` and
//! `https_connect_proxy.rs` for the CONNECT accept/`200 Connection
//! Established` shape, and `http_mitm_proxy_rustls.rs` for wrapping the
//! post-CONNECT stream in a TLS acceptor before re-entering the HTTP
//! path. Unlike the teacher, connections here are driven by a hand-rolled
//! `tokio::net::TcpListener` loop (see DESIGN.md Open Question decision
//! 2) rather than `rama_http_core`'s service machinery, so both the
//! plain and the decrypted-MITM request loops share the wire framing in
//! [`super::wire`] directly.

use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

use rama_core::bytes::{Bytes, BytesMut};
use rama_core::graceful::ShutdownGuard;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt as _};
use tokio::net::TcpListener;
use tokio::net::TcpStream;

use crate::model::{HttpRequest, HttpResponse, RequestRecord};

use super::convert;
use super::mitm;
use super::upstream;
use super::wire;
use super::SharedState;

/// Accept connections until `guard` is cancelled, spawning each onto its
/// own task so one slow or stuck client never blocks another.
pub(crate) async fn accept_loop(listener: TcpListener, state: Arc<SharedState>, guard: ShutdownGuard) {
    loop {
        tokio::select! {
            _ = guard.cancelled() => {
                tracing::debug!("proxy listener shutting down, no longer accepting connections");
                break;
            }
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, peer_addr)) => {
                        let state = state.clone();
                        guard.spawn_task_fn(move |guard| async move {
                            run_plain(stream, peer_addr, state, guard).await;
                        });
                    }
                    Err(err) => tracing::warn!(%err, "failed to accept connection"),
                }
            }
        }
    }
}

/// Drive one freshly accepted client connection: classify each message
/// as CONNECT or a plain request, looping for keep-alive.
async fn run_plain(mut stream: TcpStream, peer_addr: SocketAddr, state: Arc<SharedState>, guard: ShutdownGuard) {
    let client_addr = Some(peer_addr.to_string());
    loop {
        let mut carry = BytesMut::with_capacity(8 * 1024);
        let head_end = tokio::select! {
            _ = guard.cancelled() => break,
            result = wire::read_head(&mut stream, &mut carry) => match result {
                Ok(Some(pos)) => pos,
                Ok(None) => break,
                Err(err) => {
                    tracing::debug!(%err, "client head read failed");
                    break;
                }
            },
        };
        let head = carry.split_to(head_end + 4);
        let (start_line, headers) = wire::parse_head(&head);
        let Some((method, target, version)) = parse_start_line(&start_line) else {
            let _ = stream.write_all(&convert::plain_text_error(400, "Bad Request", "malformed request line")).await;
            break;
        };

        if method.eq_ignore_ascii_case("CONNECT") {
            handle_connect(stream, &target, carry.freeze(), &state, &guard).await;
            return;
        }

        let Some(keep_alive) = serve_one_plain_request(
            &mut stream,
            &method,
            &target,
            &version,
            headers,
            carry,
            client_addr.clone(),
            &state,
        )
        .await
        else {
            break;
        };
        if !keep_alive {
            break;
        }
    }
}

/// Read the body, run the flow engine, forward (or short-circuit), and
/// write the response for one plain-HTTP message. Returns `None` on an
/// unrecoverable wire error (connection is already unusable).
async fn serve_one_plain_request<S: AsyncRead + AsyncWrite + Unpin>(
    stream: &mut S,
    method: &str,
    target: &str,
    version: &str,
    headers: Vec<(String, String)>,
    carry: BytesMut,
    client_addr: Option<String>,
    state: &Arc<SharedState>,
) -> Option<bool> {
    let url = resolve_url("http", target, &headers);
    let body_bytes = match wire::read_body(stream, &headers, carry, false).await {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::debug!(%err, "client body read failed");
            return None;
        }
    };

    let request = build_request(method, url, headers, &body_bytes, client_addr);
    let (response, response_body) = execute_request(request, body_bytes, state, true).await;

    let keep_alive = wire::keep_alive(version, &response.headers);
    let encoded = convert::encode_response(&response, &response_body);
    if let Err(err) = stream.write_all(&encoded).await {
        tracing::debug!(%err, "failed to write response to client");
        return None;
    }
    if let Err(err) = stream.flush().await {
        tracing::debug!(%err, "failed to flush response to client");
        return None;
    }
    Some(keep_alive)
}

/// Run `request` through the Flow Engine, then either answer with its
/// short-circuit response or forward it upstream, recording the result
/// when `record` is set (tunnel-mode traffic is never recorded, spec.md
/// §4.2).
async fn execute_request(
    request: HttpRequest,
    raw_body: Bytes,
    state: &Arc<SharedState>,
    record: bool,
) -> (HttpResponse, Bytes) {
    let started_at = Instant::now();
    let mut pending_record = RequestRecord::new(request.clone());

    let outcome = state.flow_engine.execute(request).await;
    let matched_flow_id = outcome.matched_flow_id;
    let mut ctx = outcome.context;

    let (response, response_body) = if outcome.short_circuited {
        let response = ctx.response.take().unwrap_or_else(|| HttpResponse::new(204));
        let body = convert::effective_body(response.body.as_deref(), &Bytes::new());
        (response, body)
    } else {
        let outgoing_body = convert::effective_body(ctx.request.body.as_deref(), &raw_body);
        match upstream::forward(&ctx.request, &outgoing_body).await {
            Ok((response, response_raw)) => {
                let body = convert::effective_body(response.body.as_deref(), &response_raw);
                (response, body)
            }
            Err(err) => {
                tracing::warn!(error = %err, url = %ctx.request.url, "upstream forwarding failed");
                let mut response = HttpResponse::new(502);
                response.set_header("Content-Type", "text/plain; charset=utf-8");
                let message = format!("upstream forwarding failed: {err}");
                let body = Bytes::copy_from_slice(message.as_bytes());
                response.body = Some(message);
                (response, body)
            }
        }
    };

    if record {
        pending_record.request = ctx.request;
        pending_record.response = Some(response.clone());
        pending_record.duration_ms = Some(started_at.elapsed().as_millis() as u64);
        pending_record.matched_flow_id = matched_flow_id;
        state.recorder.insert_or_update(pending_record);
    }

    (response, response_body)
}

fn build_request(
    method: &str,
    url: String,
    headers: Vec<(String, String)>,
    raw_body: &Bytes,
    client_addr: Option<String>,
) -> HttpRequest {
    let mut request = HttpRequest::new(method, url);
    request.client_addr = client_addr;
    request.headers = headers;
    let content_type = request.header("content-type").map(str::to_owned);
    let content_encoding = request.header("content-encoding").map(str::to_owned);
    if convert::is_textual(content_type.as_deref(), content_encoding.as_deref())
        && let Ok(text) = std::str::from_utf8(raw_body)
    {
        request.body = Some(text.to_owned());
    }
    request
}

/// Resolve the absolute URL for an incoming request-target: absolute-form
/// targets (`GET http://host/path HTTP/1.1`, the classic proxy form) are
/// used verbatim; origin-form targets (`GET /path HTTP/1.1`, seen once a
/// CONNECT tunnel has been MITM-terminated) are completed from the `Host`
/// header under `scheme`.
fn resolve_url(scheme: &str, target: &str, headers: &[(String, String)]) -> String {
    if target.starts_with("http://") || target.starts_with("https://") {
        return target.to_owned();
    }
    let authority = wire::header(headers, "host").unwrap_or("");
    format!("{scheme}://{authority}{target}")
}

fn parse_start_line(start_line: &str) -> Option<(String, String, String)> {
    let mut parts = start_line.split_whitespace();
    let method = parts.next()?.to_owned();
    let target = parts.next()?.to_owned();
    let version = parts.next().unwrap_or("HTTP/1.1").to_owned();
    Some((method, target, version))
}

fn split_host_port(authority: &str, default_port: u16) -> (String, u16) {
    match authority.rsplit_once(':').and_then(|(host, port)| port.parse().ok().map(|port| (host, port))) {
        Some((host, port)) => (host.to_owned(), port),
        None => (authority.to_owned(), default_port),
    }
}

/// Handle a CONNECT tunnel: respond `200 Connection Established`, then
/// either MITM-terminate TLS and re-enter the HTTP path, or splice the
/// raw bytes straight through to the origin (spec.md §4.2's tunnel mode).
///
/// `preface` is whatever the client sent immediately after the CONNECT
/// request, already pulled off the wire while reading its head — it must
/// be replayed to whichever side continues the connection, not dropped.
async fn handle_connect(
    mut stream: TcpStream,
    authority: &str,
    preface: Bytes,
    state: &Arc<SharedState>,
    guard: &ShutdownGuard,
) {
    let (host, port) = split_host_port(authority, 443);

    if let Err(err) = stream.write_all(b"HTTP/1.1 200 Connection Established\r\n\r\n").await {
        tracing::debug!(%err, host, "failed to write CONNECT response");
        return;
    }
    if let Err(err) = stream.flush().await {
        tracing::debug!(%err, host, "failed to flush CONNECT response");
        return;
    }

    if state.mitm_enabled.load(Ordering::Relaxed) {
        let config = mitm::server_config(state.ca.clone(), &host);
        let acceptor = tokio_rustls::TlsAcceptor::from(config);
        let prefixed = wire::PrefixedStream::new(preface, stream);
        match acceptor.accept(prefixed).await {
            Ok(tls_stream) => {
                run_decrypted(tls_stream, host, port, state.clone(), guard.clone()).await;
            }
            Err(err) => tracing::warn!(%err, host, "mitm tls handshake failed"),
        }
    } else {
        match TcpStream::connect((host.as_str(), port)).await {
            Ok(mut upstream_stream) => {
                if !preface.is_empty() && let Err(err) = upstream_stream.write_all(&preface).await {
                    tracing::debug!(%err, host, port, "failed to replay CONNECT preface bytes upstream");
                    return;
                }
                if let Err(err) = tokio::io::copy_bidirectional(&mut stream, &mut upstream_stream).await {
                    tracing::debug!(%err, host, port, "tunnel closed");
                }
            }
            Err(err) => tracing::debug!(%err, host, port, "failed to connect upstream for tunnel"),
        }
    }
}

/// Request loop over an already-decrypted MITM tunnel: every message is
/// built, recorded, and forwarded exactly like a plain-HTTP request, only
/// the scheme and authority are fixed to this tunnel's target instead of
/// read from an absolute-form request line.
async fn run_decrypted<S: AsyncRead + AsyncWrite + Unpin>(
    mut stream: S,
    host: String,
    port: u16,
    state: Arc<SharedState>,
    guard: ShutdownGuard,
) {
    let authority = if port == 443 { host.clone() } else { format!("{host}:{port}") };
    loop {
        let mut carry = BytesMut::with_capacity(8 * 1024);
        let head_end = tokio::select! {
            _ = guard.cancelled() => break,
            result = wire::read_head(&mut stream, &mut carry) => match result {
                Ok(Some(pos)) => pos,
                Ok(None) => break,
                Err(err) => {
                    tracing::debug!(%err, host, "mitm head read failed");
                    break;
                }
            },
        };
        let head = carry.split_to(head_end + 4);
        let (start_line, mut headers) = wire::parse_head(&head);
        let Some((method, target, version)) = parse_start_line(&start_line) else { break };

        if wire::header(&headers, "host").is_none() {
            headers.push(("Host".to_owned(), authority.clone()));
        }
        let url = resolve_url("https", &target, &headers);
        let body_bytes = match wire::read_body(&mut stream, &headers, carry, false).await {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::debug!(%err, host, "mitm body read failed");
                break;
            }
        };

        let request = build_request(&method, url, headers, &body_bytes, None);
        let (response, response_body) = execute_request(request, body_bytes, &state, true).await;

        let keep_alive = wire::keep_alive(&version, &response.headers);
        let encoded = convert::encode_response(&response, &response_body);
        if let Err(err) = stream.write_all(&encoded).await {
            tracing::debug!(%err, host, "failed to write mitm response");
            break;
        }
        if let Err(err) = stream.flush().await {
            tracing::debug!(%err, host, "failed to flush mitm response");
            break;
        }
        if !keep_alive {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_start_line_splits_method_target_version() {
        let (method, target, version) = parse_start_line("GET /a?x=1 HTTP/1.1").unwrap();
        assert_eq!(method, "GET");
        assert_eq!(target, "/a?x=1");
        assert_eq!(version, "HTTP/1.1");
    }

    #[test]
    fn parse_start_line_rejects_too_short_lines() {
        assert!(parse_start_line("GET").is_none());
    }

    #[test]
    fn resolve_url_keeps_absolute_form_untouched() {
        let headers = vec![("Host".to_owned(), "ignored.example".to_owned())];
        let url = resolve_url("http", "http://example.com/a", &headers);
        assert_eq!(url, "http://example.com/a");
    }

    #[test]
    fn resolve_url_completes_origin_form_from_host_header() {
        let headers = vec![("Host".to_owned(), "example.com".to_owned())];
        let url = resolve_url("https", "/a?x=1", &headers);
        assert_eq!(url, "https://example.com/a?x=1");
    }

    #[test]
    fn split_host_port_defaults_when_no_colon() {
        assert_eq!(split_host_port("example.com", 443), ("example.com".to_owned(), 443));
        assert_eq!(split_host_port("example.com:8443", 443), ("example.com".to_owned(), 8443));
    }
}
