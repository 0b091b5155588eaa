//! Interaction recorder: normalizes raw DOM events into compact interaction
//! records with a derived stable selector, applying the privacy policy,
//! per-selector input debouncing and scroll throttling.

use crate::dom::{Dom, NodeId};
use crate::events::{DomEvent, DomEventKind};
use crate::page::Page;
use crate::selector::SimpleSelector;
use pagetap_common::mask::{MASKED_VALUE, SensitiveFieldMatcher};
use pagetap_common::protocol::{InteractionDetail, InteractionEntry};
use std::collections::BTreeMap;
use std::collections::HashMap;

/// Class prefixes that identify utility/atomic styling rather than
/// component identity; useless in a selector meant to stay stable.
const UTILITY_CLASS_PREFIXES: &[&str] = &[
    "p-", "px-", "py-", "pt-", "pb-", "pl-", "pr-", "m-", "mx-", "my-", "mt-", "mb-", "ml-",
    "mr-", "w-", "h-", "text-", "bg-", "border", "rounded", "shadow", "flex", "grid", "items-",
    "justify-", "gap-", "space-", "hover:", "focus:", "active:", "disabled:", "sm:", "md:",
    "lg:", "xl:", "2xl:", "hidden", "block", "inline", "relative", "absolute", "fixed",
    "sticky", "transition", "duration-", "opacity-", "z-",
];

const TEST_ID_ATTRIBUTES: &[&str] = &["data-testid", "data-test-id", "data-cy", "data-test"];

const MAX_MEANINGFUL_CLASSES: usize = 2;

pub const DEFAULT_INPUT_DEBOUNCE_MS: u64 = 500;
pub const DEFAULT_SCROLL_THROTTLE_MS: u64 = 1000;

#[derive(Debug, Clone)]
pub struct RecorderConfig {
    pub input_debounce_ms: u64,
    pub scroll_throttle_ms: u64,
    pub matcher: SensitiveFieldMatcher,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            input_debounce_ms: DEFAULT_INPUT_DEBOUNCE_MS,
            scroll_throttle_ms: DEFAULT_SCROLL_THROTTLE_MS,
            matcher: SensitiveFieldMatcher::default(),
        }
    }
}

#[derive(Debug, Clone)]
struct PendingInput {
    value: String,
    last_ms: u64,
}

#[derive(Debug)]
pub struct InteractionRecorder {
    config: RecorderConfig,
    pending_inputs: HashMap<String, PendingInput>,
    last_scroll_ms: Option<u64>,
}

impl InteractionRecorder {
    pub fn new(config: RecorderConfig) -> Self {
        Self {
            config,
            pending_inputs: HashMap::new(),
            last_scroll_ms: None,
        }
    }

    pub fn reset(&mut self) {
        self.pending_inputs.clear();
        self.last_scroll_ms = None;
    }

    /// Normalize one raw event. Debounced input entries whose quiet period
    /// elapsed are flushed first, so output stays append-ordered.
    pub fn observe(&mut self, page: &Page, event: &DomEvent) -> Vec<InteractionEntry> {
        let mut out = self.flush_due(event.timestamp_ms);
        let ts = event.timestamp_ms;
        let dom = &page.dom;

        match &event.kind {
            DomEventKind::Input { value } => {
                let Some(node) = event.node else {
                    return out;
                };
                // Password inputs are never captured, not even masked.
                if input_type(dom, node) == Some("password") {
                    return out;
                }
                let selector = interaction_selector(dom, node);
                let value = self.masked_field_value(dom, node, value).to_string();
                self.pending_inputs
                    .insert(selector, PendingInput { value, last_ms: ts });
            }
            DomEventKind::Change { value } => {
                let Some(node) = event.node else {
                    return out;
                };
                if input_type(dom, node) == Some("password") {
                    return out;
                }
                let selector = interaction_selector(dom, node);
                // The change supersedes any pending input on this field.
                self.pending_inputs.remove(&selector);
                let value = self.masked_field_value(dom, node, value).to_string();
                out.push(entry(selector, ts, InteractionDetail::Change { value }));
            }
            DomEventKind::Click { x, y } => {
                out.extend(self.simple(dom, event, InteractionDetail::Click { x: *x, y: *y }));
            }
            DomEventKind::DblClick { x, y } => {
                out.extend(self.simple(dom, event, InteractionDetail::DblClick { x: *x, y: *y }));
            }
            DomEventKind::Submit => {
                let Some(node) = event.node else {
                    return out;
                };
                let form_data = self.collect_form_data(dom, node);
                out.push(entry(
                    interaction_selector(dom, node),
                    ts,
                    InteractionDetail::Submit { form_data },
                ));
            }
            DomEventKind::Focus => {
                out.extend(self.simple(dom, event, InteractionDetail::Focus));
            }
            DomEventKind::Blur => {
                out.extend(self.simple(dom, event, InteractionDetail::Blur));
            }
            DomEventKind::Scroll { x, y } => {
                let due = self
                    .last_scroll_ms
                    .map(|last| ts.saturating_sub(last) >= self.config.scroll_throttle_ms)
                    .unwrap_or(true);
                if due {
                    self.last_scroll_ms = Some(ts);
                    let max = page.scroll.max_y;
                    let percent = if max > 0.0 {
                        ((y / max) * 100.0).clamp(0.0, 100.0) as u8
                    } else {
                        0
                    };
                    let target = event
                        .node
                        .map(|n| interaction_selector(dom, n))
                        .unwrap_or_else(|| "window".to_string());
                    out.push(entry(
                        target,
                        ts,
                        InteractionDetail::Scroll {
                            x: *x,
                            y: *y,
                            percent,
                        },
                    ));
                }
            }
            DomEventKind::Keydown { key, modifiers } => {
                // Plain typing is covered by input events; only shortcut
                // chords and a few control keys are worth a record.
                let is_shortcut = !modifiers.is_empty()
                    || matches!(key.as_str(), "Escape" | "Enter" | "Tab");
                if is_shortcut {
                    let target = event
                        .node
                        .map(|n| interaction_selector(dom, n))
                        .unwrap_or_else(|| "window".to_string());
                    out.push(entry(
                        target,
                        ts,
                        InteractionDetail::Keydown {
                            key: key.clone(),
                            modifiers: modifiers.clone(),
                        },
                    ));
                }
            }
            DomEventKind::Copy => {
                out.extend(self.simple(dom, event, InteractionDetail::Copy));
            }
            DomEventKind::Paste => {
                out.extend(self.simple(dom, event, InteractionDetail::Paste));
            }
            DomEventKind::DragStart => {
                out.extend(self.simple(dom, event, InteractionDetail::DragStart));
            }
            DomEventKind::Drop => {
                out.extend(self.simple(dom, event, InteractionDetail::Drop));
            }
            DomEventKind::ContextMenu { x, y } => {
                out.extend(self.simple(
                    dom,
                    event,
                    InteractionDetail::ContextMenu { x: *x, y: *y },
                ));
            }
            DomEventKind::Navigation { to, method } => {
                out.push(entry(
                    "window".to_string(),
                    ts,
                    InteractionDetail::Navigation {
                        to: to.clone(),
                        method: *method,
                    },
                ));
            }
        }

        out
    }

    /// Pending inputs whose quiet period has elapsed at `now`.
    pub fn flush_due(&mut self, now: u64) -> Vec<InteractionEntry> {
        let debounce = self.config.input_debounce_ms;
        let due: Vec<String> = self
            .pending_inputs
            .iter()
            .filter(|(_, p)| now.saturating_sub(p.last_ms) >= debounce)
            .map(|(selector, _)| selector.clone())
            .collect();
        self.drain(due)
    }

    /// Flush everything still pending (session stop).
    pub fn flush_all(&mut self) -> Vec<InteractionEntry> {
        let all: Vec<String> = self.pending_inputs.keys().cloned().collect();
        self.drain(all)
    }

    fn drain(&mut self, selectors: Vec<String>) -> Vec<InteractionEntry> {
        let mut out: Vec<InteractionEntry> = selectors
            .into_iter()
            .filter_map(|selector| {
                self.pending_inputs.remove(&selector).map(|pending| {
                    entry(
                        selector,
                        pending.last_ms,
                        InteractionDetail::Input {
                            value: pending.value,
                        },
                    )
                })
            })
            .collect();
        out.sort_by(|a, b| a.timestamp_ms.cmp(&b.timestamp_ms));
        out
    }

    fn simple(
        &self,
        dom: &Dom,
        event: &DomEvent,
        detail: InteractionDetail,
    ) -> Option<InteractionEntry> {
        let node = event.node?;
        Some(entry(
            interaction_selector(dom, node),
            event.timestamp_ms,
            detail,
        ))
    }

    fn masked_field_value<'a>(&self, dom: &Dom, node: NodeId, value: &'a str) -> &'a str {
        let name = field_name(dom, node);
        if self.config.matcher.is_sensitive(&name) {
            MASKED_VALUE
        } else {
            value
        }
    }

    /// Named fields of a form subtree, masked per policy. Password inputs
    /// are omitted entirely.
    fn collect_form_data(&self, dom: &Dom, form: NodeId) -> BTreeMap<String, String> {
        let mut data = BTreeMap::new();
        for id in dom.descendants(form) {
            let Some(node) = dom.get(id) else { continue };
            if !matches!(node.tag.as_str(), "input" | "textarea" | "select") {
                continue;
            }
            if node.attr("type") == Some("password") {
                continue;
            }
            let Some(name) = node.attr("name") else { continue };
            let value = node.attr("value").unwrap_or_default();
            let value = if self.config.matcher.is_sensitive(name) {
                MASKED_VALUE
            } else {
                value
            };
            data.insert(name.to_string(), value.to_string());
        }
        data
    }
}

fn entry(target: String, timestamp_ms: u64, detail: InteractionDetail) -> InteractionEntry {
    InteractionEntry {
        target,
        timestamp_ms,
        detail,
    }
}

fn input_type(dom: &Dom, node: NodeId) -> Option<&str> {
    dom.get(node)?.attr("type")
}

fn field_name(dom: &Dom, node: NodeId) -> String {
    let Some(element) = dom.get(node) else {
        return String::new();
    };
    element
        .attr("name")
        .or(element.id.as_deref())
        .unwrap_or_default()
        .to_string()
}

/// Derive the stable selector recorded as an interaction target.
///
/// Preference order: `#id`, a test-id attribute, then a compound of tag,
/// up to two meaningful classes and identifying attributes — verified for
/// uniqueness and disambiguated with `:nth-of-type(k)` when needed.
pub fn interaction_selector(dom: &Dom, node: NodeId) -> String {
    let Some(element) = dom.get(node) else {
        return String::new();
    };

    if let Some(id) = &element.id
        && !id.is_empty()
    {
        return format!("#{}", id);
    }

    for attr in TEST_ID_ATTRIBUTES {
        if let Some(value) = element.attr(attr) {
            return format!("[{}=\"{}\"]", attr, value);
        }
    }

    let mut selector = SimpleSelector {
        tag: Some(element.tag.clone()),
        ..SimpleSelector::default()
    };
    selector.classes = element
        .classes
        .iter()
        .filter(|class| is_meaningful_class(class))
        .take(MAX_MEANINGFUL_CLASSES)
        .cloned()
        .collect();
    for attr in ["type", "name", "role"] {
        if let Some(value) = element.attr(attr) {
            selector.attributes.push((attr.to_string(), value.to_string()));
        }
    }

    if selector.query_all(dom).len() > 1 {
        selector.nth_of_type = Some(dom.nth_of_type(node));
    }
    selector.render()
}

fn is_meaningful_class(class: &str) -> bool {
    !UTILITY_CLASS_PREFIXES
        .iter()
        .any(|prefix| class.starts_with(prefix))
}
