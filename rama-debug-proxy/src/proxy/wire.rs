//! Generic HTTP/1.1 message framing shared by both ends of the proxy:
//! the client-facing listener ([`super::listener`]) and the
//! upstream-facing forwarder ([`super::upstream`]).
//!
//! Both directions read a head (request-line-or-status-line plus
//! headers) followed by a body governed by `Content-Length` /
//! `Transfer-Encoding: chunked` / connection-close, so the buffering and
//! chunked-decoding logic lives here once instead of twice.

use std::pin::Pin;
use std::task::{Context, Poll};

use rama_core::bytes::{Bytes, BytesMut};
use tokio::io::{self, AsyncRead, AsyncReadExt, AsyncWrite, ReadBuf};

#[derive(Debug)]
pub struct WireError(pub String);

impl std::fmt::Display for WireError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for WireError {}

/// Read bytes from `stream` into `carry` until the header terminator
/// `\r\n\r\n` appears, returning the byte offset of that terminator.
/// Returns `Ok(None)` when the stream closes before any byte is read at
/// all (a clean "no more requests on this connection" signal); any
/// partial head followed by close is an error.
pub async fn read_head<S: AsyncRead + Unpin>(
    stream: &mut S,
    carry: &mut BytesMut,
) -> Result<Option<usize>, WireError> {
    loop {
        if let Some(pos) = find_header_terminator(carry) {
            return Ok(Some(pos));
        }
        let mut chunk = [0u8; 8 * 1024];
        let n = stream
            .read(&mut chunk)
            .await
            .map_err(|err| WireError(format!("reading head failed: {err}")))?;
        if n == 0 {
            if carry.is_empty() {
                return Ok(None);
            }
            return Err(WireError("connection closed before headers completed".to_owned()));
        }
        carry.extend_from_slice(&chunk[..n]);
    }
}

pub fn find_header_terminator(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}

/// Split `head` (the bytes before `\r\n\r\n`, exclusive) into its
/// start line and a `(name, value)` header list.
pub fn parse_head(head: &[u8]) -> (String, Vec<(String, String)>) {
    let text = String::from_utf8_lossy(head);
    let mut lines = text.split("\r\n");
    let start_line = lines.next().unwrap_or_default().to_owned();
    let mut headers = Vec::new();
    for line in lines {
        if line.is_empty() {
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_owned(), value.trim().to_owned()));
        }
    }
    (start_line, headers)
}

#[must_use]
pub fn header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers.iter().find(|(n, _)| n.eq_ignore_ascii_case(name)).map(|(_, v)| v.as_str())
}

/// Read a message body given its framing headers, having already
/// consumed `carry` bytes from just past the head terminator.
pub async fn read_body<S: AsyncRead + Unpin>(
    stream: &mut S,
    headers: &[(String, String)],
    carry: BytesMut,
    allow_eof_framing: bool,
) -> Result<Bytes, WireError> {
    let chunked = header(headers, "transfer-encoding").is_some_and(|v| v.eq_ignore_ascii_case("chunked"));
    let content_length = header(headers, "content-length").and_then(|v| v.parse::<usize>().ok());

    if chunked {
        read_chunked_body(stream, carry).await
    } else if let Some(len) = content_length {
        read_fixed_body(stream, carry, len).await
    } else if allow_eof_framing {
        read_to_eof(stream, carry).await
    } else {
        Ok(carry.freeze())
    }
}

async fn read_fixed_body<S: AsyncRead + Unpin>(
    stream: &mut S,
    mut carry: BytesMut,
    len: usize,
) -> Result<Bytes, WireError> {
    while carry.len() < len {
        let mut chunk = [0u8; 8 * 1024];
        let n = stream.read(&mut chunk).await.map_err(|err| WireError(format!("reading body failed: {err}")))?;
        if n == 0 {
            break;
        }
        carry.extend_from_slice(&chunk[..n]);
    }
    carry.truncate(len.min(carry.len()));
    Ok(carry.freeze())
}

async fn read_to_eof<S: AsyncRead + Unpin>(stream: &mut S, mut carry: BytesMut) -> Result<Bytes, WireError> {
    let mut chunk = [0u8; 8 * 1024];
    loop {
        let n = stream.read(&mut chunk).await.map_err(|err| WireError(format!("reading body failed: {err}")))?;
        if n == 0 {
            break;
        }
        carry.extend_from_slice(&chunk[..n]);
    }
    Ok(carry.freeze())
}

async fn read_chunked_body<S: AsyncRead + Unpin>(stream: &mut S, mut carry: BytesMut) -> Result<Bytes, WireError> {
    let mut out = BytesMut::new();
    loop {
        let size_line_end = loop {
            if let Some(pos) = find_crlf(&carry) {
                break pos;
            }
            if !fill(stream, &mut carry).await? {
                return Err(WireError("connection closed mid chunk-size".to_owned()));
            }
        };
        let size_line = carry.split_to(size_line_end + 2);
        let size_text = String::from_utf8_lossy(&size_line[..size_line.len() - 2]);
        let size_text = size_text.split(';').next().unwrap_or("").trim();
        let size = usize::from_str_radix(size_text, 16)
            .map_err(|_| WireError(format!("malformed chunk size '{size_text}'")))?;

        if size == 0 {
            while !carry.starts_with(b"\r\n") {
                if !fill(stream, &mut carry).await? {
                    break;
                }
            }
            break;
        }

        while carry.len() < size + 2 {
            if !fill(stream, &mut carry).await? {
                return Err(WireError("connection closed mid chunk body".to_owned()));
            }
        }
        out.extend_from_slice(&carry[..size]);
        let _ = carry.split_to(size + 2);
    }
    Ok(out.freeze())
}

async fn fill<S: AsyncRead + Unpin>(stream: &mut S, buf: &mut BytesMut) -> Result<bool, WireError> {
    let mut chunk = [0u8; 4 * 1024];
    let n = stream.read(&mut chunk).await.map_err(|err| WireError(format!("reading chunked body failed: {err}")))?;
    if n == 0 {
        return Ok(false);
    }
    buf.extend_from_slice(&chunk[..n]);
    Ok(true)
}

/// `true` unless the message is explicitly framed as connection-closing
/// (`Connection: close`, or HTTP/1.0 without an explicit keep-alive).
#[must_use]
pub fn keep_alive(version: &str, headers: &[(String, String)]) -> bool {
    match header(headers, "connection") {
        Some(v) if v.eq_ignore_ascii_case("close") => false,
        Some(v) if v.eq_ignore_ascii_case("keep-alive") => true,
        _ => version.contains("1.1"),
    }
}

/// Serves already-buffered `prefix` bytes before any further read touches
/// `inner` — used to feed a CONNECT tunnel's preface bytes (read ahead of
/// the `200 Connection Established` response) into whatever comes next
/// instead of dropping them (spec.md §4.2).
pub struct PrefixedStream<S> {
    prefix: Bytes,
    inner: S,
}

impl<S> PrefixedStream<S> {
    pub fn new(prefix: Bytes, inner: S) -> Self {
        Self { prefix, inner }
    }
}

impl<S: AsyncRead + Unpin> AsyncRead for PrefixedStream<S> {
    fn poll_read(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if !this.prefix.is_empty() {
            let n = this.prefix.len().min(buf.remaining());
            let chunk = this.prefix.split_to(n);
            buf.put_slice(&chunk);
            return Poll::Ready(Ok(()));
        }
        Pin::new(&mut this.inner).poll_read(cx, buf)
    }
}

impl<S: AsyncWrite + Unpin> AsyncWrite for PrefixedStream<S> {
    fn poll_write(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.get_mut().inner).poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }
}
