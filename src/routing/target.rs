//! Destination resolution.
//!
//! # Responsibilities
//! - Parse the `X-Proxy-Target` value into an absolute URL
//! - Reject empty, unparseable or host-less targets
//!
//! # Design Decisions
//! - No normalization beyond what URL parsing performs
//! - Only scheme and authority are used; target path, userinfo and fragment
//!   are ignored by the dispatcher
//! - Failures are fatal for the request, never retried

use url::{Position, Url};

#[derive(Debug, thiserror::Error)]
pub enum TargetError {
    #[error("target is empty")]
    Empty,

    #[error("target is not valid UTF-8")]
    Encoding,

    #[error("invalid target url: {0}")]
    Parse(#[from] url::ParseError),

    #[error("target must be an absolute http(s) url with a host: {0}")]
    NotAbsolute(String),
}

/// Turn a raw header value into the destination URL.
pub fn resolve(raw: Option<&str>) -> Result<Url, TargetError> {
    let raw = match raw {
        Some(raw) if !raw.is_empty() => raw,
        _ => return Err(TargetError::Empty),
    };

    let url = Url::parse(raw)?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(TargetError::NotAbsolute(raw.to_string()));
    }
    Ok(url)
}

/// `host[:port]` exactly as parsed, without userinfo.
pub fn authority(url: &Url) -> &str {
    &url[Position::BeforeHost..Position::AfterPort]
}
