//! Wire/data model shared by every crate: log, network and interaction
//! entries, snapshots, sessions, and the element report.

use crate::sanitize::{SanitizedObject, truncate_chars};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const MAX_LOG_MESSAGE_LEN: usize = 2000;
pub const MAX_LOG_STACK_LEN: usize = 3000;
pub const MAX_NETWORK_URL_LEN: usize = 500;
pub const MAX_NETWORK_BODY_LEN: usize = 5000;

pub const CONSOLE_LOG_CAPACITY: usize = 200;
pub const NETWORK_LOG_CAPACITY: usize = 100;
pub const INTERACTION_LOG_CAPACITY: usize = 500;
pub const SNAPSHOT_CAPACITY: usize = 50;
pub const SNAPSHOT_VALUE_CAP: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Log,
    Warn,
    Error,
    Info,
    Debug,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Log => "log",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    pub timestamp_ms: u64,
}

impl LogEntry {
    /// Construct with the message/stack caps applied.
    pub fn new(
        level: LogLevel,
        message: impl AsRef<str>,
        stack: Option<&str>,
        timestamp_ms: u64,
    ) -> Self {
        Self {
            level,
            message: truncate_chars(message.as_ref(), MAX_LOG_MESSAGE_LEN),
            stack: stack.map(|s| truncate_chars(s, MAX_LOG_STACK_LEN)),
            timestamp_ms,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkEntry {
    /// Monotonic per-tap sequence, used to complete the entry in place once
    /// the response body settles.
    pub seq: u64,
    pub url: String,
    pub method: String,
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_body: Option<String>,
    pub duration_ms: u64,
    pub timestamp_ms: u64,
    pub failed: bool,
}

impl NetworkEntry {
    /// Transport failures, status 0 and HTTP errors all count as failed.
    pub fn is_failure(status: u16, transport_error: bool) -> bool {
        transport_error || status == 0 || status >= 400
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationMethod {
    PushState,
    ReplaceState,
    PopState,
}

impl fmt::Display for NavigationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NavigationMethod::PushState => "push_state",
            NavigationMethod::ReplaceState => "replace_state",
            NavigationMethod::PopState => "pop_state",
        };
        f.write_str(s)
    }
}

/// One normalized user interaction. `target` is the derived stable selector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionEntry {
    pub target: String,
    pub timestamp_ms: u64,
    #[serde(flatten)]
    pub detail: InteractionDetail,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InteractionDetail {
    Click {
        x: f32,
        y: f32,
    },
    #[serde(rename = "dblclick")]
    DblClick {
        x: f32,
        y: f32,
    },
    Input {
        value: String,
    },
    Change {
        value: String,
    },
    Submit {
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        form_data: BTreeMap<String, String>,
    },
    Focus,
    Blur,
    Scroll {
        x: f32,
        y: f32,
        percent: u8,
    },
    Navigation {
        to: String,
        method: NavigationMethod,
    },
    Keydown {
        key: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        modifiers: Vec<String>,
    },
    Copy,
    Paste,
    #[serde(rename = "dragstart")]
    DragStart,
    Drop,
    #[serde(rename = "contextmenu")]
    ContextMenu {
        x: f32,
        y: f32,
    },
}

impl InteractionDetail {
    pub fn kind(&self) -> &'static str {
        match self {
            InteractionDetail::Click { .. } => "click",
            InteractionDetail::DblClick { .. } => "dblclick",
            InteractionDetail::Input { .. } => "input",
            InteractionDetail::Change { .. } => "change",
            InteractionDetail::Submit { .. } => "submit",
            InteractionDetail::Focus => "focus",
            InteractionDetail::Blur => "blur",
            InteractionDetail::Scroll { .. } => "scroll",
            InteractionDetail::Navigation { .. } => "navigation",
            InteractionDetail::Keydown { .. } => "keydown",
            InteractionDetail::Copy => "copy",
            InteractionDetail::Paste => "paste",
            InteractionDetail::DragStart => "dragstart",
            InteractionDetail::Drop => "drop",
            InteractionDetail::ContextMenu { .. } => "contextmenu",
        }
    }
}

/// Point-in-time copy of page storage, taken manually during a session.
/// Entries above the value cap are skipped outright rather than truncated; a
/// cut-off storage value is worse than an absent one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub label: String,
    pub timestamp_ms: u64,
    pub url: String,
    #[serde(default)]
    pub local_storage: BTreeMap<String, String>,
    #[serde(default)]
    pub session_storage: BTreeMap<String, String>,
}

/// One bounded recording generation, start to stop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub start_time_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time_ms: Option<u64>,
    pub duration_ms: u64,
    pub url: String,
    pub title: String,
    pub console_log: Vec<LogEntry>,
    pub network_log: Vec<NetworkEntry>,
    pub interactions: Vec<InteractionEntry>,
    pub snapshots: Vec<Snapshot>,
    pub is_recording: bool,
}

/// Live buffer counts, safe to request in any state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionStatus {
    pub is_recording: bool,
    pub console_entries: usize,
    pub network_entries: usize,
    pub interactions: usize,
    pub snapshots: usize,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameworkName {
    React,
    Vue,
    Angular,
    Svelte,
}

impl fmt::Display for FrameworkName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FrameworkName::React => "react",
            FrameworkName::Vue => "vue",
            FrameworkName::Angular => "angular",
            FrameworkName::Svelte => "svelte",
        };
        f.write_str(s)
    }
}

/// Best-effort, order-sensitive detection result. A page that genuinely
/// mixes frameworks reports only the first match.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrameworkIdentity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<FrameworkName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComponentInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub props: Option<SanitizedObject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<SanitizedObject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl ComponentInfo {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.props.is_none() && self.state.is_none() && self.file.is_none()
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Derived identifiers for one element, computed fresh on every inspection
/// because the underlying element may have mutated since the last one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementIdentity {
    pub selector: String,
    pub xpath: String,
    pub short_id: String,
    #[serde(default)]
    pub computed_styles: BTreeMap<String, String>,
    #[serde(default)]
    pub text_content: String,
    #[serde(default)]
    pub rect: Rect,
}

/// The element-capture payload. Immutable once saved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    #[serde(flatten)]
    pub element: ElementIdentity,
    pub url: String,
    pub page_title: String,
    #[serde(default)]
    pub framework: FrameworkIdentity,
    #[serde(default)]
    pub component: ComponentInfo,
    #[serde(default)]
    pub data_attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub event_listeners: Vec<String>,
    #[serde(default)]
    pub console_errors: Vec<LogEntry>,
    #[serde(default)]
    pub network_requests: Vec<NetworkEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub developer_context: Option<serde_json::Value>,
    #[serde(default)]
    pub comment: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_entry_caps_message_and_stack() {
        let long = "x".repeat(MAX_LOG_MESSAGE_LEN + 100);
        let stack = "y".repeat(MAX_LOG_STACK_LEN + 100);
        let entry = LogEntry::new(LogLevel::Error, &long, Some(&stack), 0);
        assert_eq!(entry.message.chars().count(), MAX_LOG_MESSAGE_LEN);
        assert!(entry.message.ends_with("..."));
        assert_eq!(entry.stack.as_ref().unwrap().chars().count(), MAX_LOG_STACK_LEN);
    }

    #[test]
    fn network_failure_classification() {
        assert!(NetworkEntry::is_failure(0, false));
        assert!(NetworkEntry::is_failure(404, false));
        assert!(NetworkEntry::is_failure(500, false));
        assert!(NetworkEntry::is_failure(200, true));
        assert!(!NetworkEntry::is_failure(200, false));
        assert!(!NetworkEntry::is_failure(302, false));
    }

    #[test]
    fn interaction_detail_uses_spec_type_tags() {
        let entry = InteractionEntry {
            target: "#submit".into(),
            timestamp_ms: 1,
            detail: InteractionDetail::DblClick { x: 1.0, y: 2.0 },
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["type"], "dblclick");
        assert_eq!(json["target"], "#submit");

        let nav = InteractionEntry {
            target: "window".into(),
            timestamp_ms: 2,
            detail: InteractionDetail::Navigation {
                to: "/next".into(),
                method: NavigationMethod::PushState,
            },
        };
        let json = serde_json::to_value(&nav).unwrap();
        assert_eq!(json["type"], "navigation");
        assert_eq!(json["method"], "push_state");
    }
}
