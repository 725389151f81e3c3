//! Wire-level helpers shared by the listener: the binary-safety rule
//! from spec.md §4.2, and encoding an [`HttpResponse`] (or a
//! synthesized error) back onto the client socket as raw bytes.

use rama_core::bytes::Bytes;

use crate::model::HttpResponse;

/// A response is textual (per spec.md §4.2) only when `Content-Encoding`
/// is absent and `Content-Type` matches one of a small family of
/// human-readable MIME types. Everything else — images, archives,
/// compressed bodies — is forwarded byte-for-byte and never decoded into
/// a `String`.
#[must_use]
pub fn is_textual(content_type: Option<&str>, content_encoding: Option<&str>) -> bool {
    if content_encoding.is_some() {
        return false;
    }
    let Some(content_type) = content_type else {
        return false;
    };
    let ct = content_type.to_ascii_lowercase();
    ct.starts_with("text/")
        || ct.contains("json")
        || ct.contains("javascript")
        || ct.contains("xml")
        || ct.contains("x-www-form-urlencoded")
}

/// Resolve the effective outgoing body for a (possibly flow-rewritten)
/// request or response: a textual body is re-encoded from the mutated
/// string, while an absent body falls back to the original raw bytes
/// (binary passthrough, spec.md §4.2).
#[must_use]
pub fn effective_body(text: Option<&str>, original_raw: &Bytes) -> Bytes {
    match text {
        Some(text) => Bytes::copy_from_slice(text.as_bytes()),
        None => original_raw.clone(),
    }
}

/// Serialize an [`HttpResponse`] plus its resolved raw body onto the
/// wire, status line first. This is the inverse of
/// [`super::wire::parse_head`] plus a body write.
#[must_use]
pub fn encode_response(response: &HttpResponse, body: &Bytes) -> Vec<u8> {
    let mut out = Vec::with_capacity(body.len() + 256);
    out.extend_from_slice(format!("HTTP/1.1 {} {}\r\n", response.status, response.reason).as_bytes());
    let mut wrote_content_length = false;
    for (name, value) in &response.headers {
        if name.eq_ignore_ascii_case("content-length") {
            wrote_content_length = true;
        }
        if name.eq_ignore_ascii_case("connection") || name.eq_ignore_ascii_case("transfer-encoding") {
            continue;
        }
        out.extend_from_slice(format!("{name}: {value}\r\n").as_bytes());
    }
    if !wrote_content_length {
        let mut len_buf = itoa::Buffer::new();
        out.extend_from_slice(b"Content-Length: ");
        out.extend_from_slice(len_buf.format(body.len()).as_bytes());
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(b"\r\n");
    out.extend_from_slice(body);
    out
}

/// A plain-text error response, used for the engine's own 500/502s
/// (spec.md §6 "Error responses produced by the engine on-wire").
#[must_use]
pub fn plain_text_error(status: u16, reason: &str, message: &str) -> Vec<u8> {
    let mut response = HttpResponse::new(status);
    response.reason = reason.to_owned();
    response.set_header("Content-Type", "text/plain; charset=utf-8");
    response.set_header("Connection", "close");
    let body = Bytes::copy_from_slice(message.as_bytes());
    encode_response(&response, &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn textual_content_types_are_recognized() {
        assert!(is_textual(Some("text/plain"), None));
        assert!(is_textual(Some("application/json; charset=utf-8"), None));
        assert!(is_textual(Some("application/xml"), None));
        assert!(is_textual(Some("application/x-www-form-urlencoded"), None));
        assert!(!is_textual(Some("image/png"), None));
        assert!(!is_textual(Some("text/plain"), Some("gzip")));
        assert!(!is_textual(None, None));
    }

    #[test]
    fn encode_response_writes_status_line_and_content_length() {
        let mut response = HttpResponse::new(201);
        response.reason = "Created".to_owned();
        response.set_header("Content-Type", "application/json");
        let body = Bytes::from_static(b"{\"ok\":true}");
        let encoded = encode_response(&response, &body);
        let text = String::from_utf8_lossy(&encoded);
        assert!(text.starts_with("HTTP/1.1 201 Created\r\n"));
        assert!(text.contains("Content-Length: 11\r\n"));
        assert!(text.ends_with("{\"ok\":true}"));
    }

    #[test]
    fn plain_text_error_is_connection_close() {
        let encoded = plain_text_error(502, "Bad Gateway", "upstream unreachable");
        let text = String::from_utf8_lossy(&encoded);
        assert!(text.starts_with("HTTP/1.1 502 Bad Gateway\r\n"));
        assert!(text.to_ascii_lowercase().contains("connection: close"));
        assert!(text.ends_with("upstream unreachable"));
    }
}
