//! Element report assembly. Every sub-capture is independent and degrades
//! to a null/partial value; one failed probe never loses the whole report.

use crate::dom::NodeId;
use crate::framework;
use crate::instrument::Instrumentation;
use crate::locator;
use crate::page::Page;
use pagetap_common::protocol::{ElementIdentity, LogLevel, Report};
use pagetap_common::sanitize::SanitizedValue;
use pagetap_common::value::RawValue;
use std::collections::BTreeMap;

/// Recent-activity windows attached to a report.
const REPORT_CONSOLE_ERRORS: usize = 10;
const REPORT_NETWORK_REQUESTS: usize = 20;

pub fn build_report(
    page: &Page,
    node: NodeId,
    instrumentation: &Instrumentation,
    comment: &str,
) -> Report {
    let element = locator::locate(&page.dom, node).unwrap_or_else(|| ElementIdentity {
        selector: String::new(),
        xpath: String::new(),
        short_id: String::new(),
        computed_styles: BTreeMap::new(),
        text_content: String::new(),
        rect: Default::default(),
    });

    let framework_identity = framework::detect(page);
    let component = framework::introspect_component(page, node, &framework_identity);
    let developer_context = framework::developer_context(page, node);

    let (console_errors, network_requests) = match instrumentation.always_on() {
        Some(tap) => (
            tap.console()
                .tail(REPORT_CONSOLE_ERRORS)
                .filter(|entry| matches!(entry.level, LogLevel::Error | LogLevel::Warn))
                .cloned()
                .collect(),
            tap.network()
                .tail(REPORT_NETWORK_REQUESTS)
                .cloned()
                .collect(),
        ),
        None => (Vec::new(), Vec::new()),
    };

    Report {
        element,
        url: page.url.clone(),
        page_title: page.title.clone(),
        framework: framework_identity,
        data_attributes: page.dom.data_attributes(node),
        event_listeners: event_listener_names(page, node, &component),
        component,
        console_errors,
        network_requests,
        developer_context,
        comment: comment.to_string(),
    }
}

/// Listener names visible on the element: inline `on*` attributes, `on*`
/// expando handlers, and handler-typed component props.
fn event_listener_names(
    page: &Page,
    node: NodeId,
    component: &pagetap_common::protocol::ComponentInfo,
) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    if let Some(element) = page.dom.get(node) {
        for (attr, _) in &element.attributes {
            if let Some(event) = attr.strip_prefix("on") {
                names.push(event.to_string());
            }
        }
        for (key, value) in &element.expando {
            if let Some(event) = key.strip_prefix("on")
                && matches!(page.values.get(*value), Some(RawValue::Function { .. }))
            {
                names.push(event.to_string());
            }
        }
    }
    if let Some(props) = &component.props {
        for (key, value) in props.iter() {
            if key.starts_with("on")
                && key.len() > 2
                && matches!(value, SanitizedValue::Str(s) if s.starts_with("[Function"))
            {
                // onClick -> click
                names.push(key[2..].to_lowercase());
            }
        }
    }
    names.sort();
    names.dedup();
    names
}
