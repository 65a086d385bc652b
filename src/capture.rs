//! Response capture.
//!
//! # Responsibilities
//! - Mirror every relayed body chunk into a per-request buffer
//! - Hand each chunk to the client connection as soon as it is produced
//! - Keep the relayed response head in one shared, write-once cell
//! - Signal connection close once the relay has stopped writing
//!
//! # Data Flow
//! ```text
//! destination chunks ──▶ CaptureStream ──▶ hyper ──▶ client
//!                             │
//!                             └──▶ CaptureBuffer (append-only)
//!
//! CaptureStream dropped (end of stream / client gone)
//!     → ClosedGuard dropped
//!     → ClosedWatch resolves
//!     → deferred dump reads CaptureBuffer
//! ```
//!
//! # Design Decisions
//! - Append-only and forward-only: no rewind, no holding bytes back
//! - The close signal is fired from Drop, so it strictly follows the last append

use axum::http::{header, HeaderMap, StatusCode, Version};
use bytes::{Bytes, BytesMut};
use futures_util::Stream;
use std::pin::Pin;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::task::{Context, Poll};
use tokio::sync::oneshot;

const EVENT_STREAM: &str = "text/event-stream";

/// How a response is relayed and dumped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentClass {
    /// Open-ended event stream, dumped after the connection closes.
    Streaming,
    /// Everything else, dumped as soon as the headers are known.
    Ordinary,
}

impl ContentClass {
    /// Substring match, so `text/event-stream; charset=utf-8` is streaming too.
    pub fn classify(headers: &HeaderMap) -> Self {
        let streaming = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.to_ascii_lowercase().contains(EVENT_STREAM));

        if streaming {
            ContentClass::Streaming
        } else {
            ContentClass::Ordinary
        }
    }
}

/// Status line and headers as relayed to the client.
#[derive(Debug, Clone)]
pub struct ResponseHead {
    pub status: StatusCode,
    pub version: Version,
    pub headers: HeaderMap,
    pub class: ContentClass,
}

impl ResponseHead {
    pub fn new(status: StatusCode, version: Version, headers: HeaderMap) -> Self {
        let class = ContentClass::classify(&headers);
        Self {
            status,
            version,
            headers,
            class,
        }
    }
}

/// Write-once store for the response head, shared with the deferred dump.
#[derive(Debug, Clone, Default)]
pub struct HeadStore(Arc<OnceLock<ResponseHead>>);

impl HeadStore {
    /// Store the head. Returns false if one was already stored.
    pub fn set(&self, head: ResponseHead) -> bool {
        self.0.set(head).is_ok()
    }

    pub fn get(&self) -> Option<&ResponseHead> {
        self.0.get()
    }
}

/// Append-only accumulator for the relayed body bytes.
#[derive(Debug, Clone, Default)]
pub struct CaptureBuffer(Arc<Mutex<BytesMut>>);

impl CaptureBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, chunk: &[u8]) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(chunk);
    }

    /// Copy of everything captured so far.
    pub fn snapshot(&self) -> Bytes {
        let buf = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        Bytes::copy_from_slice(&buf)
    }
}

/// Create a connection-closed signal pair.
pub fn closed_signal() -> (ClosedGuard, ClosedWatch) {
    let (tx, rx) = oneshot::channel();
    (ClosedGuard { _tx: tx }, ClosedWatch { rx })
}

/// Held by whatever writes to the client; dropping it fires the signal.
#[derive(Debug)]
pub struct ClosedGuard {
    _tx: oneshot::Sender<()>,
}

/// Resolves once the matching [`ClosedGuard`] is gone.
#[derive(Debug)]
pub struct ClosedWatch {
    rx: oneshot::Receiver<()>,
}

impl ClosedWatch {
    pub async fn closed(self) {
        // The sender is never used to send; only its drop matters.
        let _ = self.rx.await;
    }
}

/// Body stream decorator that tees every chunk into a [`CaptureBuffer`].
pub struct CaptureStream<S> {
    inner: S,
    buffer: CaptureBuffer,
    _closed: ClosedGuard,
}

impl<S> CaptureStream<S> {
    pub fn new(inner: S, buffer: CaptureBuffer, closed: ClosedGuard) -> Self {
        Self {
            inner,
            buffer,
            _closed: closed,
        }
    }
}

impl<S, E> Stream for CaptureStream<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
{
    type Item = Result<Bytes, E>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        match Pin::new(&mut this.inner).poll_next(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                this.buffer.append(&chunk);
                Poll::Ready(Some(Ok(chunk)))
            }
            other => other,
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}
