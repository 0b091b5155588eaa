//! Session controller: the idle/recording/stopped state machine that owns
//! one generation of tap and recorder buffers.

use crate::events::{DomEvent, PageEvent};
use crate::page::Page;
use crate::recorder::{InteractionRecorder, RecorderConfig};
use crate::tap::{RuntimeTap, TapConfig};
use pagetap_common::protocol::{
    INTERACTION_LOG_CAPACITY, InteractionEntry, SNAPSHOT_CAPACITY, SNAPSHOT_VALUE_CAP, Session,
    SessionStatus, Snapshot,
};
use pagetap_common::ring::RingBuffer;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Recording,
    Stopped,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub tap: TapConfig,
    pub recorder: RecorderConfig,
    pub interaction_capacity: usize,
    pub snapshot_capacity: usize,
    pub storage_value_cap: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tap: TapConfig::session(
                pagetap_common::protocol::CONSOLE_LOG_CAPACITY,
                pagetap_common::protocol::NETWORK_LOG_CAPACITY,
            ),
            recorder: RecorderConfig::default(),
            interaction_capacity: INTERACTION_LOG_CAPACITY,
            snapshot_capacity: SNAPSHOT_CAPACITY,
            storage_value_cap: SNAPSHOT_VALUE_CAP,
        }
    }
}

pub struct SessionController {
    config: SessionConfig,
    state: SessionState,
    session_id: String,
    start_ms: u64,
    end_ms: Option<u64>,
    url: String,
    title: String,
    tap: RuntimeTap,
    recorder: InteractionRecorder,
    interactions: RingBuffer<InteractionEntry>,
    snapshots: Vec<Snapshot>,
    generation: u32,
}

impl SessionController {
    pub fn new(config: SessionConfig) -> Self {
        let tap = RuntimeTap::new(config.tap.clone());
        let recorder = InteractionRecorder::new(config.recorder.clone());
        let interactions = RingBuffer::new(config.interaction_capacity);
        Self {
            config,
            state: SessionState::Idle,
            session_id: String::new(),
            start_ms: 0,
            end_ms: None,
            url: String::new(),
            title: String::new(),
            tap,
            recorder,
            interactions,
            snapshots: Vec::new(),
            generation: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == SessionState::Recording
    }

    /// Begin a recording generation, resetting every buffer. Starting while
    /// already recording discards the in-flight buffers; that is flagged
    /// loudly rather than silently.
    pub fn start(&mut self, page: &Page, session_id: Option<&str>, now_ms: u64) -> &str {
        if self.state == SessionState::Recording {
            tracing::warn!(
                session_id = %self.session_id,
                "start() while recording: discarding in-flight session buffers"
            );
        }
        self.generation += 1;
        self.tap.clear();
        self.recorder.reset();
        self.interactions.clear();
        self.snapshots.clear();

        self.session_id = match session_id {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => format!("session-{}-{}", now_ms, self.generation),
        };
        self.start_ms = now_ms;
        self.end_ms = None;
        self.url = page.url.clone();
        self.title = page.title.clone();
        self.state = SessionState::Recording;
        &self.session_id
    }

    /// Capture page storage. Entries above the value cap are skipped whole:
    /// a misleadingly truncated storage dump is worse than an absent key.
    /// No-op unless recording.
    pub fn snapshot(&mut self, page: &Page, label: Option<&str>, now_ms: u64) -> bool {
        if self.state != SessionState::Recording {
            return false;
        }
        if self.snapshots.len() >= self.config.snapshot_capacity {
            tracing::warn!("snapshot limit reached, ignoring");
            return false;
        }

        let label = match label {
            Some(l) if !l.is_empty() => l.to_string(),
            _ => format!("snapshot-{}", self.snapshots.len() + 1),
        };
        self.snapshots.push(Snapshot {
            label,
            timestamp_ms: now_ms,
            url: page.url.clone(),
            local_storage: capped_storage(&page.local_storage, self.config.storage_value_cap),
            session_storage: capped_storage(&page.session_storage, self.config.storage_value_cap),
        });
        true
    }

    /// Freeze the session. Buffers are moved, not defensively copied; the
    /// returned object must be treated as immutable.
    pub fn stop(&mut self, now_ms: u64) -> Option<Session> {
        if self.state != SessionState::Recording {
            return None;
        }
        // Any still-debounced input belongs to this generation.
        let trailing = self.recorder.flush_all();
        for entry in trailing {
            self.interactions.push(entry);
        }

        self.state = SessionState::Stopped;
        self.end_ms = Some(now_ms);

        let (console_log, network_log) = self.tap.take_logs();
        Some(Session {
            session_id: self.session_id.clone(),
            start_time_ms: self.start_ms,
            end_time_ms: self.end_ms,
            duration_ms: now_ms.saturating_sub(self.start_ms),
            url: self.url.clone(),
            title: self.title.clone(),
            console_log,
            network_log,
            interactions: self.interactions.take(),
            snapshots: std::mem::take(&mut self.snapshots),
            is_recording: false,
        })
    }

    /// Live counts, safe in any state; zeroed when no session has run.
    pub fn status(&self, now_ms: u64) -> SessionStatus {
        let elapsed_ms = match self.state {
            SessionState::Recording => now_ms.saturating_sub(self.start_ms),
            SessionState::Stopped => self
                .end_ms
                .unwrap_or(self.start_ms)
                .saturating_sub(self.start_ms),
            SessionState::Idle => 0,
        };
        SessionStatus {
            is_recording: self.state == SessionState::Recording,
            console_entries: self.tap.console().len(),
            network_entries: self.tap.network().len(),
            interactions: self.interactions.len(),
            snapshots: self.snapshots.len(),
            elapsed_ms,
        }
    }

    /// Route one raw page event into this generation's buffers. The
    /// recording check gates the append, not the instrumentation itself, so
    /// events arriving outside a recording window are simply dropped here.
    pub fn handle_event(&mut self, page: &Page, event: &PageEvent) {
        if self.state != SessionState::Recording {
            return;
        }
        match event {
            PageEvent::Console {
                level,
                args,
                timestamp_ms,
            } => self
                .tap
                .console_event(&page.values, *level, args, *timestamp_ms),
            PageEvent::PageError {
                message,
                stack,
                timestamp_ms,
            } => self.tap.page_error(message, stack.as_deref(), *timestamp_ms),
            PageEvent::UnhandledRejection {
                reason,
                timestamp_ms,
            } => self
                .tap
                .unhandled_rejection(&page.values, *reason, *timestamp_ms),
            PageEvent::RequestStarted {
                id,
                method,
                url,
                request_body,
                timestamp_ms,
            } => self.tap.request_started(
                id,
                method,
                url,
                request_body.as_deref(),
                *timestamp_ms,
            ),
            PageEvent::RequestFinished {
                id,
                status,
                transport_error,
                timestamp_ms,
            } => self
                .tap
                .request_finished(id, *status, *transport_error, *timestamp_ms),
            PageEvent::ResponseBody { id, body } => self.tap.response_body(id, body),
            PageEvent::Dom(dom_event) => self.handle_dom_event(page, dom_event),
        }
    }

    fn handle_dom_event(&mut self, page: &Page, event: &DomEvent) {
        for entry in self.recorder.observe(page, event) {
            self.interactions.push(entry);
        }
    }
}

fn capped_storage(source: &BTreeMap<String, String>, cap: usize) -> BTreeMap<String, String> {
    source
        .iter()
        .filter(|(_, value)| value.chars().count() <= cap)
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}
