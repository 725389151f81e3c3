//! Hand-rolled HTTP/1.1 client framing for the plain forwarding path.
//!
//! `rama-http-core`'s own client connection builder
//! (`client::conn::http1`) is declared but not present in this
//! workspace checkout, so upstream requests are written and parsed by
//! hand here — grounded on the raw-socket proxying shape in
//! `examples/other_examples/390bc92a_fergdev-roxy__proxy-src-proxy.rs.rs`
//! and spec.md §4.2 ("write the request ... read the response ... using
//! the *original byte buffer* of the response body"). Header/body
//! framing (chunked decoding, `Content-Length`) is shared with the
//! client-facing listener via [`super::wire`].

use std::time::Duration;

use rama_core::bytes::{Bytes, BytesMut};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::model::{HttpRequest, HttpResponse};

use super::convert::is_textual;
use super::wire::{self, WireError};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Headers that must never be forwarded verbatim to the next hop
/// (spec.md §4.2: "stripping hop-by-hop headers `Proxy-Connection` and
/// `Connection`").
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "proxy-connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

#[derive(Debug)]
pub struct UpstreamError(pub String);

impl std::fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for UpstreamError {}

impl From<WireError> for UpstreamError {
    fn from(err: WireError) -> Self {
        Self(err.0)
    }
}

/// Forward `request` (with its resolved outgoing body) to its origin
/// host/port and return the parsed [`HttpResponse`] alongside its raw
/// body bytes — the caller falls back to the raw bytes for non-textual
/// responses (binary passthrough, spec.md §4.2), exactly as the client
/// side already does for request bodies.
pub async fn forward(request: &HttpRequest, body: &Bytes) -> Result<(HttpResponse, Bytes), UpstreamError> {
    let uri: rama_http_types::Uri = request
        .url
        .parse()
        .map_err(|_| UpstreamError(format!("invalid request url '{}'", request.url)))?;
    let host = uri
        .host()
        .ok_or_else(|| UpstreamError("request url has no host".to_owned()))?;
    let port = uri.port_u16().unwrap_or_else(|| default_port(&uri));
    let path_and_query = uri.path_and_query().map(|p| p.as_str().to_owned()).unwrap_or_else(|| "/".to_owned());

    let mut stream = timeout(CONNECT_TIMEOUT, TcpStream::connect((host, port)))
        .await
        .map_err(|_| UpstreamError(format!("connect to {host}:{port} timed out")))?
        .map_err(|err| UpstreamError(format!("connect to {host}:{port} failed: {err}")))?;

    let request_bytes = encode_request(request, &path_and_query, body);
    stream
        .write_all(&request_bytes)
        .await
        .map_err(|err| UpstreamError(format!("write to {host}:{port} failed: {err}")))?;
    stream
        .flush()
        .await
        .map_err(|err| UpstreamError(format!("flush to {host}:{port} failed: {err}")))?;

    timeout(READ_TIMEOUT, read_response(&mut stream))
        .await
        .map_err(|_| UpstreamError(format!("read from {host}:{port} timed out")))?
}

fn default_port(uri: &rama_http_types::Uri) -> u16 {
    match uri.scheme_str() {
        Some("https") => 443,
        _ => 80,
    }
}

fn encode_request(request: &HttpRequest, path_and_query: &str, body: &Bytes) -> Vec<u8> {
    let mut out = Vec::with_capacity(body.len() + 256);
    out.extend_from_slice(format!("{} {} HTTP/1.1\r\n", request.method, path_and_query).as_bytes());

    let mut wrote_host = false;
    for (name, value) in &request.headers {
        if HOP_BY_HOP.contains(&name.to_ascii_lowercase().as_str()) {
            continue;
        }
        if name.eq_ignore_ascii_case("host") {
            wrote_host = true;
        }
        out.extend_from_slice(format!("{name}: {value}\r\n").as_bytes());
    }
    if !wrote_host && let Some(host) = request.host() {
        out.extend_from_slice(format!("Host: {host}\r\n").as_bytes());
    }
    let mut len_buf = itoa::Buffer::new();
    out.extend_from_slice(b"Content-Length: ");
    out.extend_from_slice(len_buf.format(body.len()).as_bytes());
    out.extend_from_slice(b"\r\n");
    out.extend_from_slice(b"Connection: close\r\n");
    out.extend_from_slice(b"\r\n");
    out.extend_from_slice(body);
    out
}

async fn read_response<S: tokio::io::AsyncRead + Unpin>(
    stream: &mut S,
) -> Result<(HttpResponse, Bytes), UpstreamError> {
    let mut buf = BytesMut::with_capacity(8 * 1024);
    let Some(head_end) = wire::read_head(stream, &mut buf).await? else {
        return Err(UpstreamError("connection closed before any response bytes".to_owned()));
    };
    let head = buf.split_to(head_end + 4);
    let (status_line, headers) = wire::parse_head(&head);
    let status = parse_status(&status_line)?;

    let body_bytes = wire::read_body(stream, &headers, buf, true).await?;

    let content_type = wire::header(&headers, "content-type");
    let content_encoding = wire::header(&headers, "content-encoding");

    let mut response = HttpResponse::new(status);
    response.headers = headers;
    if is_textual(content_type, content_encoding)
        && let Ok(text) = std::str::from_utf8(&body_bytes)
    {
        response.body = Some(text.to_owned());
    }
    Ok((response, body_bytes))
}

fn parse_status(status_line: &str) -> Result<u16, UpstreamError> {
    status_line
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| UpstreamError(format!("malformed status line '{status_line}'")))
}
