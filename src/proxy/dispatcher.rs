//! Forwarding of one authenticated exchange to its destination.
//!
//! # Data Flow
//! ```text
//! Dispatcher::open
//!     → egress client (direct / upstream proxy)
//!     → outbound request (URL, Host, headers rewritten)
//!     → head store + capture buffer + close signal
//!     → deferred watcher spawned
//!
//! ForwardingSession::relay
//!     → execute → relay head stored → immediate dump (ordinary only)
//!     → CaptureStream → client
//! ```

use std::time::Duration;

use axum::http::request::Parts;
use axum::response::Response;
use futures_util::{future, stream, StreamExt};
use url::Url;

use crate::capture::{closed_signal, CaptureBuffer, CaptureStream, ClosedGuard, ContentClass, HeadStore};
use crate::dump::Dumper;
use crate::error::GatewayError;
use crate::http::request::{build_outbound, OutboundBody};
use crate::http::response::{client_response, relay_head, RelayStream};
use crate::proxy::egress::Egress;

pub struct Dispatcher {
    egress: Egress,
    dumper: Dumper,
    header_timeout: Option<Duration>,
}

impl Dispatcher {
    /// `header_timeout` bounds the wait for the destination's response head.
    pub fn new(egress: Egress, dumper: Dumper, header_timeout: Option<Duration>) -> Self {
        Self {
            egress,
            dumper,
            header_timeout,
        }
    }

    /// Prepare the outbound request and the per-exchange capture state.
    pub fn open(
        &self,
        parts: Parts,
        body: OutboundBody,
        target: &Url,
    ) -> Result<ForwardingSession, GatewayError> {
        let client = self.egress.client()?.clone();
        let request = build_outbound(&client, parts, body, target)?;

        let head = HeadStore::default();
        let buffer = CaptureBuffer::new();
        let (closed, watch) = closed_signal();
        self.dumper.spawn_deferred(watch, head.clone(), buffer.clone());

        Ok(ForwardingSession {
            client,
            request,
            head,
            buffer,
            closed,
            dumper: self.dumper.clone(),
            header_timeout: self.header_timeout,
        })
    }
}

/// One in-flight exchange. Dropping it without relaying fires the close signal.
pub struct ForwardingSession {
    client: reqwest::Client,
    request: reqwest::Request,
    head: HeadStore,
    buffer: CaptureBuffer,
    closed: ClosedGuard,
    dumper: Dumper,
    header_timeout: Option<Duration>,
}

impl ForwardingSession {
    /// The request as the destination will receive it.
    pub fn request(&self) -> &reqwest::Request {
        &self.request
    }

    pub async fn relay(self) -> Result<Response, GatewayError> {
        let pending = self.client.execute(self.request);
        let response = match self.header_timeout {
            Some(limit) => tokio::time::timeout(limit, pending)
                .await
                .map_err(|_| GatewayError::DestinationTimeout(limit))??,
            None => pending.await?,
        };

        let head = relay_head(&response);
        let stored = self.head.set(head.clone());
        debug_assert!(stored, "response head stored twice");

        let body: RelayStream = if head.class == ContentClass::Ordinary && self.dumper.includes_body() {
            let bytes = response.bytes().await?;
            self.dumper.response(&head, Some(&bytes));
            stream::once(future::ready(Ok(bytes))).boxed()
        } else {
            self.dumper.response(&head, None);
            response.bytes_stream().boxed()
        };

        let body = CaptureStream::new(body, self.buffer, self.closed);
        Ok(client_response(&head, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DumpConfig, UpstreamConfig};
    use crate::dump::{DumpKind, MemorySink};
    use crate::routing::{X_PROXY_AUTH, X_PROXY_TARGET};
    use axum::body::Body;
    use axum::http::{header, Request};
    use std::sync::Arc;

    fn dispatcher(sink: Arc<MemorySink>) -> Dispatcher {
        let egress = Egress::from_config(&UpstreamConfig::default()).unwrap();
        Dispatcher::new(egress, Dumper::new(&DumpConfig::default(), sink), None)
    }

    #[tokio::test]
    async fn test_open_strips_routing_headers() {
        let sink = Arc::new(MemorySink::new());
        let dispatcher = dispatcher(sink);

        let (parts, _) = Request::builder()
            .uri("/v1/models")
            .header(header::HOST, "127.0.0.1:8080")
            .header(X_PROXY_TARGET, "http://127.0.0.1:9")
            .header(X_PROXY_AUTH, "test")
            .body(Body::empty())
            .unwrap()
            .into_parts();
        let target = Url::parse("http://127.0.0.1:9").unwrap();

        let session = dispatcher.open(parts, OutboundBody::Empty, &target).unwrap();
        let request = session.request();
        assert_eq!(request.url().as_str(), "http://127.0.0.1:9/v1/models");
        assert!(request.headers().get(X_PROXY_TARGET).is_none());
        assert!(request.headers().get(X_PROXY_AUTH).is_none());
        assert_eq!(request.headers()[header::HOST], "127.0.0.1:9");
    }

    #[tokio::test]
    async fn test_dropped_session_emits_nothing() {
        let sink = Arc::new(MemorySink::new());
        let dispatcher = dispatcher(sink.clone());

        let (parts, _) = Request::builder().uri("/").body(Body::empty()).unwrap().into_parts();
        let target = Url::parse("http://127.0.0.1:9").unwrap();
        drop(dispatcher.open(parts, OutboundBody::Empty, &target).unwrap());

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(sink.of_kind(DumpKind::StreamResponse).is_empty());
    }
}
