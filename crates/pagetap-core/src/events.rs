//! Raw page activity as delivered by a host. The probe mirrors signals
//! without interpreting them; normalization (bounding, masking, selector
//! derivation) happens in the taps and the recorder.

use crate::dom::NodeId;
use pagetap_common::protocol::{LogLevel, NavigationMethod};
use pagetap_common::value::ValueId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PageEvent {
    Console {
        level: LogLevel,
        #[serde(default)]
        args: Vec<ValueId>,
        timestamp_ms: u64,
    },
    PageError {
        message: String,
        #[serde(default)]
        stack: Option<String>,
        timestamp_ms: u64,
    },
    UnhandledRejection {
        #[serde(default)]
        reason: Option<ValueId>,
        timestamp_ms: u64,
    },
    RequestStarted {
        id: String,
        method: String,
        url: String,
        #[serde(default)]
        request_body: Option<String>,
        timestamp_ms: u64,
    },
    RequestFinished {
        id: String,
        #[serde(default)]
        status: u16,
        #[serde(default)]
        transport_error: bool,
        timestamp_ms: u64,
    },
    /// Response bodies settle after the entry was appended; this completes
    /// the existing entry in place.
    ResponseBody {
        id: String,
        body: String,
    },
    Dom(DomEvent),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomEvent {
    /// Element the event targeted; `None` for window-level events
    /// (scroll on the document, navigation).
    #[serde(default)]
    pub node: Option<NodeId>,
    pub timestamp_ms: u64,
    #[serde(flatten)]
    pub kind: DomEventKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DomEventKind {
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
    Submit,
    Focus,
    Blur,
    Scroll {
        x: f32,
        y: f32,
    },
    Keydown {
        key: String,
        #[serde(default)]
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
    Navigation {
        to: String,
        method: NavigationMethod,
    },
}
