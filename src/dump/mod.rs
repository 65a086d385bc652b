//! Request/response dumping.
//!
//! # Data Flow
//! ```text
//! inbound request ─────────────────────────▶ Dumper::request
//! destination headers (ordinary) ──────────▶ Dumper::response       (immediate)
//! ClosedWatch fired (streaming) ───────────▶ deferred watcher task  (once)
//!                                                  │
//!                                                  ▼
//!                                     render.rs → DumpSink (tracing / memory)
//! ```
//!
//! # Design Decisions
//! - Event streams never take the immediate path; buffering a live stream
//!   before relaying it would defeat streaming
//! - The deferred watcher blocks on the close signal, never polls
//! - gzip bodies are decompressed for the log copy only
//! - Dump failures are warnings; relaying is never affected

pub mod render;
pub mod sink;

use std::borrow::Cow;
use std::sync::Arc;

use axum::http::request::Parts;
use tokio::task::JoinHandle;

use crate::capture::{CaptureBuffer, ClosedWatch, ContentClass, HeadStore, ResponseHead};
use crate::config::DumpConfig;
use crate::observability::metrics;

pub use render::{gunzip, is_gzip, render_request, render_response};
pub use sink::{DumpEntry, DumpKind, DumpSink, MemorySink, TracingSink};

/// Renders requests and responses to a [`DumpSink`].
#[derive(Clone)]
pub struct Dumper {
    sink: Arc<dyn DumpSink>,
    enabled: bool,
    body: bool,
}

impl Dumper {
    pub fn new(config: &DumpConfig, sink: Arc<dyn DumpSink>) -> Self {
        Self {
            sink,
            enabled: config.enabled,
            body: config.body,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether bodies end up in dumps, which means they have to be buffered.
    pub fn includes_body(&self) -> bool {
        self.enabled && self.body
    }

    pub fn request(&self, parts: &Parts, body: Option<&[u8]>) {
        if !self.enabled {
            return;
        }
        let body = body.filter(|_| self.body);
        let text = render_request(&parts.method, &parts.uri, parts.version, &parts.headers, body);
        self.sink.emit(DumpEntry {
            kind: DumpKind::Request,
            text,
        });
    }

    /// Immediate path. Returns whether a dump was emitted; event streams are
    /// left to the deferred watcher.
    pub fn response(&self, head: &ResponseHead, body: Option<&[u8]>) -> bool {
        if !self.enabled || head.class == ContentClass::Streaming {
            return false;
        }
        self.emit_response(DumpKind::Response, head, body);
        true
    }

    /// Start the deferred watcher for one exchange.
    ///
    /// The task waits for `closed`, then dumps the stored head and the whole
    /// capture buffer if the response was an event stream.
    pub fn spawn_deferred(
        &self,
        closed: ClosedWatch,
        head: HeadStore,
        buffer: CaptureBuffer,
    ) -> Option<JoinHandle<()>> {
        if !self.enabled {
            return None;
        }
        let dumper = self.clone();
        Some(tokio::spawn(async move {
            closed.closed().await;
            dumper.deferred(&head, &buffer);
        }))
    }

    fn deferred(&self, head: &HeadStore, buffer: &CaptureBuffer) -> bool {
        let Some(head) = head.get() else {
            return false;
        };
        if head.class != ContentClass::Streaming {
            return false;
        }

        let body = buffer.snapshot();
        self.emit_response(DumpKind::StreamResponse, head, Some(&body));
        metrics::record_stream_dump();
        true
    }

    fn emit_response(&self, kind: DumpKind, head: &ResponseHead, body: Option<&[u8]>) {
        let body: Option<Cow<'_, [u8]>> = match body {
            Some(raw) if self.body => Some(decode_for_log(head, raw)),
            _ => None,
        };
        let text = render_response(head.status, head.version, &head.headers, body.as_deref());
        self.sink.emit(DumpEntry { kind, text });
    }
}

fn decode_for_log<'a>(head: &ResponseHead, raw: &'a [u8]) -> Cow<'a, [u8]> {
    if !is_gzip(&head.headers) {
        return Cow::Borrowed(raw);
    }
    match gunzip(raw) {
        Ok(decoded) => Cow::Owned(decoded),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to decode gzip body for dump; dumping raw bytes");
            Cow::Borrowed(raw)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::closed_signal;
    use axum::http::{header, HeaderMap, HeaderValue, StatusCode, Version};
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use std::time::Duration;

    fn dumper(body: bool) -> (Dumper, MemorySink) {
        let sink = MemorySink::new();
        let config = DumpConfig {
            enabled: true,
            body,
            ..Default::default()
        };
        (Dumper::new(&config, Arc::new(sink.clone())), sink)
    }

    fn head(content_type: &'static str) -> ResponseHead {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        ResponseHead::new(StatusCode::OK, Version::HTTP_11, headers)
    }

    #[test]
    fn test_immediate_dump_for_ordinary() {
        let (dumper, sink) = dumper(true);
        assert!(dumper.response(&head("application/json"), Some(br#"{"a":1}"#)));

        let entries = sink.of_kind(DumpKind::Response);
        assert_eq!(entries.len(), 1);
        assert!(entries[0].text.contains("content-type: application/json"));
        assert!(entries[0].text.ends_with(r#"{"a":1}"#));
    }

    #[test]
    fn test_immediate_dump_skips_event_stream() {
        let (dumper, sink) = dumper(true);
        assert!(!dumper.response(&head("text/event-stream; charset=utf-8"), None));
        assert!(sink.entries().is_empty());
    }

    #[test]
    fn test_body_omitted_unless_enabled() {
        let (dumper, sink) = dumper(false);
        assert!(!dumper.includes_body());
        dumper.response(&head("text/plain"), Some(b"hidden"));
        assert!(!sink.entries()[0].text.contains("hidden"));
    }

    #[test]
    fn test_gzip_body_decoded_for_log() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"readable text").unwrap();
        let compressed = encoder.finish().unwrap();

        let (dumper, sink) = dumper(true);
        let mut head = head("text/plain");
        head.headers
            .insert(header::CONTENT_ENCODING, HeaderValue::from_static("gzip"));
        dumper.response(&head, Some(&compressed));

        assert!(sink.entries()[0].text.ends_with("readable text"));
    }

    #[test]
    fn test_disabled_dumper_is_silent() {
        let sink = MemorySink::new();
        let config = DumpConfig {
            enabled: false,
            body: true,
            ..Default::default()
        };
        let dumper = Dumper::new(&config, Arc::new(sink.clone()));

        assert!(!dumper.response(&head("application/json"), Some(b"{}")));
        let (_guard, watch) = closed_signal();
        assert!(dumper
            .spawn_deferred(watch, HeadStore::default(), CaptureBuffer::new())
            .is_none());
        assert!(sink.entries().is_empty());
    }

    #[tokio::test]
    async fn test_deferred_dump_waits_for_close() {
        let (dumper, sink) = dumper(true);
        let store = HeadStore::default();
        let buffer = CaptureBuffer::new();
        let (guard, watch) = closed_signal();

        let task = dumper
            .spawn_deferred(watch, store.clone(), buffer.clone())
            .unwrap();

        store.set(head("text/event-stream"));
        buffer.append(b"a\n");
        buffer.append(b"b\n");
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(sink.entries().is_empty());

        buffer.append(b"c\n");
        drop(guard);
        task.await.unwrap();

        let entries = sink.of_kind(DumpKind::StreamResponse);
        assert_eq!(entries.len(), 1);
        assert!(entries[0].text.ends_with("\r\n\r\na\nb\nc\n"));
    }

    #[tokio::test]
    async fn test_deferred_dump_ignores_ordinary_and_aborted() {
        let (dumper, sink) = dumper(true);

        let store = HeadStore::default();
        store.set(head("application/json"));
        let (guard, watch) = closed_signal();
        let task = dumper
            .spawn_deferred(watch, store, CaptureBuffer::new())
            .unwrap();
        drop(guard);
        task.await.unwrap();

        let (guard, watch) = closed_signal();
        let task = dumper
            .spawn_deferred(watch, HeadStore::default(), CaptureBuffer::new())
            .unwrap();
        drop(guard);
        task.await.unwrap();

        assert!(sink.entries().is_empty());
    }
}
