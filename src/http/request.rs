//! Request handling and transformation.
//!
//! # Responsibilities
//! - Buffer the inbound body when it has to be dumped
//! - Rewrite the request for the destination (URL, Host, headers)
//! - Build the outbound reqwest request
//!
//! # Design Decisions
//! - Path and query are forwarded unchanged; only scheme and authority change
//! - Routing and hop-by-hop headers never leave the gateway
//! - Bodies stream through untouched unless dumping needs them buffered

use std::net::{IpAddr, SocketAddr};

use axum::body::{Body, HttpBody};
use axum::extract::ConnectInfo;
use axum::http::request::Parts;
use axum::http::{header, HeaderMap, HeaderValue, Uri};
use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use url::Url;

use crate::error::GatewayError;
use crate::routing::{authority, RoutingDirective, TargetError};
use crate::security::headers::{append_forwarded_for, strip_hop_by_hop};

/// Body of the request sent to the destination.
#[derive(Debug)]
pub enum OutboundBody {
    Empty,
    Buffered(Bytes),
    Streaming(Body),
}

impl OutboundBody {
    /// The bytes, when the body was buffered for a dump.
    pub fn buffered(&self) -> Option<&[u8]> {
        match self {
            OutboundBody::Buffered(bytes) => Some(bytes),
            _ => None,
        }
    }

    fn into_reqwest(self) -> Option<reqwest::Body> {
        match self {
            OutboundBody::Empty => None,
            OutboundBody::Buffered(bytes) => Some(reqwest::Body::from(bytes)),
            OutboundBody::Streaming(body) => Some(reqwest::Body::wrap_stream(body.into_data_stream())),
        }
    }
}

/// Decide how the inbound body travels to the destination.
///
/// Emptiness comes from the body itself, not from framing headers: an h2
/// stream carries neither Content-Length nor Transfer-Encoding. `buffer_limit`
/// is set when the body has to be buffered for a dump.
pub async fn outbound_body(
    body: Body,
    buffer_limit: Option<usize>,
) -> Result<OutboundBody, GatewayError> {
    if body.is_end_stream() {
        return Ok(OutboundBody::Empty);
    }
    match buffer_limit {
        Some(limit) => Ok(OutboundBody::Buffered(read_body(body, limit).await?)),
        None => Ok(OutboundBody::Streaming(body)),
    }
}

/// Read the whole body, failing once it grows past `limit` bytes.
pub async fn read_body(body: Body, limit: usize) -> Result<Bytes, GatewayError> {
    let mut stream = body.into_data_stream();
    let mut buf = BytesMut::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| GatewayError::Body(e.to_string()))?;
        if buf.len() + chunk.len() > limit {
            return Err(GatewayError::BodyTooLarge { limit });
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf.freeze())
}

/// `target.scheme://target.authority` followed by the inbound path and query.
pub fn destination_url(target: &Url, uri: &Uri) -> Result<Url, TargetError> {
    let path_and_query = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .filter(|pq| pq.starts_with('/'))
        .unwrap_or("/");
    let url = Url::parse(&format!(
        "{}://{}{}",
        target.scheme(),
        authority(target),
        path_and_query
    ))?;
    Ok(url)
}

/// Prepare inbound headers for the destination.
pub fn rewrite_headers(
    headers: &mut HeaderMap,
    target: &Url,
    client: Option<IpAddr>,
) -> Result<(), TargetError> {
    RoutingDirective::strip(headers);
    strip_hop_by_hop(headers);

    let host = HeaderValue::from_str(authority(target))
        .map_err(|_| TargetError::NotAbsolute(target.to_string()))?;
    headers.insert(header::HOST, host);

    if let Some(ip) = client {
        append_forwarded_for(headers, ip);
    }
    Ok(())
}

/// Build the request the destination will see.
pub fn build_outbound(
    client: &reqwest::Client,
    parts: Parts,
    body: OutboundBody,
    target: &Url,
) -> Result<reqwest::Request, GatewayError> {
    let url = destination_url(target, &parts.uri)?;
    let peer = parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    let mut headers = parts.headers;
    rewrite_headers(&mut headers, target, peer)?;

    let mut builder = client.request(parts.method, url).headers(headers);
    if let Some(body) = body.into_reqwest() {
        builder = builder.body(body);
    }
    Ok(builder.build()?)
}
