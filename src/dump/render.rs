//! Wire-style rendering of requests and responses for the log.

use axum::http::{header, HeaderMap, Method, StatusCode, Uri, Version};
use flate2::read::MultiGzDecoder;
use std::borrow::Cow;
use std::fmt::Write as _;
use std::io::Read;

use crate::routing::X_PROXY_AUTH;

const REDACTED: &str = "[redacted]";

/// Render a request line, headers and optional body.
pub fn render_request(
    method: &Method,
    uri: &Uri,
    version: Version,
    headers: &HeaderMap,
    body: Option<&[u8]>,
) -> String {
    let target = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    let mut out = format!("{} {} {:?}\r\n", method, target, version);
    write_headers(&mut out, headers);
    out.push_str("\r\n");
    if let Some(body) = body {
        out.push_str(&String::from_utf8_lossy(body));
    }
    out
}

/// Render a status line, headers and optional, already decoded, body.
pub fn render_response(
    status: StatusCode,
    version: Version,
    headers: &HeaderMap,
    body: Option<&[u8]>,
) -> String {
    let mut out = format!(
        "{:?} {} {}\r\n",
        version,
        status.as_u16(),
        status.canonical_reason().unwrap_or("")
    );
    write_headers(&mut out, headers);
    out.push_str("\r\n");
    if let Some(body) = body {
        out.push_str(&String::from_utf8_lossy(body));
    }
    out
}

fn write_headers(out: &mut String, headers: &HeaderMap) {
    for (name, value) in headers {
        let value = if name.as_str() == X_PROXY_AUTH {
            Cow::Borrowed(REDACTED)
        } else {
            String::from_utf8_lossy(value.as_bytes())
        };
        let _ = write!(out, "{}: {}\r\n", name, value);
    }
}

pub fn is_gzip(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("gzip"))
}

/// Decompress a gzip body for the log copy.
pub fn gunzip(body: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut decoded = Vec::new();
    MultiGzDecoder::new(body).read_to_end(&mut decoded)?;
    Ok(decoded)
}
