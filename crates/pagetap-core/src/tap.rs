//! Runtime tap: bounded console and network logs fed by raw page events.
//!
//! Instrumentation is observational only — the page's own console/network
//! behavior is never altered, entries are appended after the fact. Ring
//! eviction means data loss under load; bounded memory wins that trade.

use pagetap_common::protocol::{
    CONSOLE_LOG_CAPACITY, LogEntry, LogLevel, MAX_NETWORK_BODY_LEN, MAX_NETWORK_URL_LEN,
    NETWORK_LOG_CAPACITY, NetworkEntry,
};
use pagetap_common::ring::RingBuffer;
use pagetap_common::sanitize::{SanitizeOptions, sanitize, truncate_chars};
use pagetap_common::value::{RawValue, ValueGraph, ValueId};
use std::collections::HashMap;

/// Which console methods this tap mirrors. The always-on tap keeps only
/// errors and warnings; a session tap captures all five.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsoleCapture {
    #[default]
    ErrorsOnly,
    All,
}

#[derive(Debug, Clone)]
pub struct TapConfig {
    pub console_capacity: usize,
    pub network_capacity: usize,
    pub capture: ConsoleCapture,
    pub sanitize: SanitizeOptions,
}

impl Default for TapConfig {
    fn default() -> Self {
        Self {
            console_capacity: CONSOLE_LOG_CAPACITY,
            network_capacity: NETWORK_LOG_CAPACITY,
            capture: ConsoleCapture::ErrorsOnly,
            sanitize: SanitizeOptions::default(),
        }
    }
}

impl TapConfig {
    /// Session-variant configuration: all console levels, structured errors.
    pub fn session(console_capacity: usize, network_capacity: usize) -> Self {
        Self {
            console_capacity,
            network_capacity,
            capture: ConsoleCapture::All,
            sanitize: SanitizeOptions::structured_errors(),
        }
    }
}

#[derive(Debug, Clone)]
struct PendingRequest {
    method: String,
    url: String,
    request_body: Option<String>,
    started_ms: u64,
}

#[derive(Debug)]
pub struct RuntimeTap {
    config: TapConfig,
    console: RingBuffer<LogEntry>,
    network: RingBuffer<NetworkEntry>,
    pending: HashMap<String, PendingRequest>,
    finished: HashMap<String, u64>,
    next_seq: u64,
}

impl RuntimeTap {
    pub fn new(config: TapConfig) -> Self {
        let console = RingBuffer::new(config.console_capacity);
        let network = RingBuffer::new(config.network_capacity);
        Self {
            config,
            console,
            network,
            pending: HashMap::new(),
            finished: HashMap::new(),
            next_seq: 1,
        }
    }

    pub fn console(&self) -> &RingBuffer<LogEntry> {
        &self.console
    }

    pub fn network(&self) -> &RingBuffer<NetworkEntry> {
        &self.network
    }

    /// Append a console entry. Arguments are sanitized and joined into one
    /// message; a stack is pulled from the first Error argument if present.
    pub fn console_event(
        &mut self,
        graph: &ValueGraph,
        level: LogLevel,
        args: &[ValueId],
        timestamp_ms: u64,
    ) {
        if self.config.capture == ConsoleCapture::ErrorsOnly
            && !matches!(level, LogLevel::Error | LogLevel::Warn)
        {
            return;
        }

        let message = args
            .iter()
            .map(|arg| sanitize(graph, *arg, &self.config.sanitize).render_compact())
            .collect::<Vec<_>>()
            .join(" ");
        let stack = args.iter().find_map(|arg| match graph.get(*arg) {
            Some(RawValue::Error { stack, .. }) => stack.as_deref(),
            _ => None,
        });

        self.console
            .push(LogEntry::new(level, message, stack, timestamp_ms));
    }

    /// Synthetic entry for an uncaught `window.error`.
    pub fn page_error(&mut self, message: &str, stack: Option<&str>, timestamp_ms: u64) {
        self.console
            .push(LogEntry::new(LogLevel::Error, message, stack, timestamp_ms));
    }

    /// Synthetic entry for an unhandled promise rejection.
    pub fn unhandled_rejection(
        &mut self,
        graph: &ValueGraph,
        reason: Option<ValueId>,
        timestamp_ms: u64,
    ) {
        let (rendered, stack) = match reason {
            Some(id) => {
                let stack = match graph.get(id) {
                    Some(RawValue::Error { stack, .. }) => stack.clone(),
                    _ => None,
                };
                (
                    sanitize(graph, id, &self.config.sanitize).render_compact(),
                    stack,
                )
            }
            None => ("unknown reason".to_string(), None),
        };
        self.console.push(LogEntry::new(
            LogLevel::Error,
            format!("Unhandled rejection: {}", rendered),
            stack.as_deref(),
            timestamp_ms,
        ));
    }

    pub fn request_started(
        &mut self,
        id: &str,
        method: &str,
        url: &str,
        request_body: Option<&str>,
        timestamp_ms: u64,
    ) {
        self.pending.insert(
            id.to_string(),
            PendingRequest {
                method: method.to_string(),
                url: url.to_string(),
                request_body: request_body.map(|b| truncate_chars(b, MAX_NETWORK_BODY_LEN)),
                started_ms: timestamp_ms,
            },
        );
    }

    /// Append the network entry for a settled request. The response body is
    /// usually not known yet; it arrives later via [`Self::response_body`].
    pub fn request_finished(
        &mut self,
        id: &str,
        status: u16,
        transport_error: bool,
        timestamp_ms: u64,
    ) {
        let Some(pending) = self.pending.remove(id) else {
            tracing::debug!("finish for unknown request {}", id);
            return;
        };
        let seq = self.next_seq;
        self.next_seq += 1;

        self.network.push(NetworkEntry {
            seq,
            url: truncate_chars(&pending.url, MAX_NETWORK_URL_LEN),
            method: pending.method,
            status,
            request_body: pending.request_body,
            response_body: None,
            duration_ms: timestamp_ms.saturating_sub(pending.started_ms),
            timestamp_ms,
            failed: NetworkEntry::is_failure(status, transport_error),
        });

        // Forget correlations for entries the ring has already evicted.
        let oldest = self.network.get(0).map(|e| e.seq).unwrap_or(seq);
        self.finished.retain(|_, s| *s >= oldest);
        self.finished.insert(id.to_string(), seq);
    }

    /// Complete an entry in place once its body read settles. A consumer
    /// reading the buffer between append and completion sees the entry
    /// without a body; that lag is accepted. Evicted entries are a no-op.
    pub fn response_body(&mut self, id: &str, body: &str) {
        let Some(seq) = self.finished.remove(id) else {
            return;
        };
        if let Some(entry) = self.network.find_mut(|e| e.seq == seq) {
            entry.response_body = Some(truncate_chars(body, MAX_NETWORK_BODY_LEN));
        }
    }

    pub fn clear(&mut self) {
        self.console.clear();
        self.network.clear();
        self.pending.clear();
        self.finished.clear();
    }

    /// Move both logs out, leaving the tap empty but installed.
    pub fn take_logs(&mut self) -> (Vec<LogEntry>, Vec<NetworkEntry>) {
        self.pending.clear();
        self.finished.clear();
        (self.console.take(), self.network.take())
    }
}
