//! Destinations for dump entries.

use std::sync::{Arc, Mutex, PoisonError};

/// What a dump entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpKind {
    /// Inbound request, before authentication.
    Request,
    /// Ordinary response, dumped as soon as its headers were known.
    Response,
    /// Streaming response, dumped after the client connection closed.
    StreamResponse,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpEntry {
    pub kind: DumpKind,
    pub text: String,
}

/// Receives rendered dumps. Implementations must not block the data path.
pub trait DumpSink: Send + Sync + 'static {
    fn emit(&self, entry: DumpEntry);
}

/// Writes dumps as `tracing` events, so they land wherever logging goes.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DumpSink for TracingSink {
    fn emit(&self, entry: DumpEntry) {
        let label = match entry.kind {
            DumpKind::Request => "Request",
            DumpKind::Response | DumpKind::StreamResponse => "Response",
        };
        tracing::info!(target: "forward_gateway::dump", kind = ?entry.kind, "{}: \n{}", label, entry.text);
    }
}

/// Keeps dumps in memory. Handy for tests and debugging endpoints.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    entries: Arc<Mutex<Vec<DumpEntry>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<DumpEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn of_kind(&self, kind: DumpKind) -> Vec<DumpEntry> {
        self.entries()
            .into_iter()
            .filter(|e| e.kind == kind)
            .collect()
    }
}

impl DumpSink for MemorySink {
    fn emit(&self, entry: DumpEntry) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }
}
