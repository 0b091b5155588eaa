use pagetap_common::formatter::render_report;
use pagetap_common::protocol::{FrameworkName, LogLevel};
use pagetap_common::sanitize::SanitizedValue;
use pagetap_core::dom::{ElementNode, NodeId};
use pagetap_core::events::PageEvent;
use pagetap_core::instrument::{InstrumentConfig, Instrumentation};
use pagetap_core::page::Page;
use pagetap_core::report::build_report;

/// `<button id="submit" class="btn btn-primary">Save</button>` inside a
/// React tree with props `{onClick: fn, disabled: false}`.
fn react_page() -> (Page, NodeId) {
    let mut page = Page::new("https://shop.example.com/checkout", "Checkout");
    let html = page.dom.add(None, ElementNode::new("html"));
    let body = page.dom.add(Some(html), ElementNode::new("body"));

    let component_type = page.values.function(Some("SubmitButton"));
    let on_click = page.values.function(None);
    let disabled = page.values.boolean(false);
    let props = page
        .values
        .object(vec![("onClick", on_click), ("disabled", disabled)]);
    let component_fiber = page
        .values
        .object(vec![("type", component_type), ("memoizedProps", props)]);
    let host_type = page.values.string("button");
    let host_fiber = page.values.object(vec![("type", host_type)]);
    page.values.set_entry(host_fiber, "return", component_fiber);

    let button = page.dom.add(
        Some(body),
        ElementNode::new("button")
            .with_id("submit")
            .with_classes(&["btn", "btn-primary"])
            .with_text("Save")
            .with_expando("__reactFiber$e2e", host_fiber),
    );
    (page, button)
}

#[test]
fn end_to_end_react_button_report() {
    let (mut page, button) = react_page();

    let mut instrumentation = Instrumentation::new(InstrumentConfig::default());
    instrumentation.install_always_on();

    // Recent page activity visible to the always-on tap.
    let msg = page.values.string("cart total mismatch");
    instrumentation.handle_event(
        &page,
        &PageEvent::Console {
            level: LogLevel::Error,
            args: vec![msg],
            timestamp_ms: 100,
        },
    );
    instrumentation.handle_event(
        &page,
        &PageEvent::RequestStarted {
            id: "r1".into(),
            method: "POST".into(),
            url: "https://shop.example.com/api/cart".into(),
            request_body: Some("{\"item\":9}".into()),
            timestamp_ms: 200,
        },
    );
    instrumentation.handle_event(
        &page,
        &PageEvent::RequestFinished {
            id: "r1".into(),
            status: 500,
            transport_error: false,
            timestamp_ms: 260,
        },
    );

    let report = build_report(&page, button, &instrumentation, "button does nothing");

    assert_eq!(report.element.selector, "#submit");
    assert_eq!(report.element.short_id, "button#submit");
    assert_eq!(report.element.text_content, "Save");
    assert_eq!(report.framework.name, Some(FrameworkName::React));
    assert_eq!(report.component.name.as_deref(), Some("SubmitButton"));

    let props = report.component.props.as_ref().unwrap();
    assert_eq!(props.get("disabled").unwrap(), &SanitizedValue::Bool(false));
    assert_eq!(
        props.get("onClick").unwrap(),
        &SanitizedValue::Str("[Function: anonymous]".into())
    );

    // The handler-typed prop surfaces as a listener name.
    assert!(report.event_listeners.contains(&"click".to_string()));

    assert_eq!(report.console_errors.len(), 1);
    assert_eq!(report.console_errors[0].message, "cart total mismatch");
    assert_eq!(report.network_requests.len(), 1);
    assert!(report.network_requests[0].failed);
    assert_eq!(report.comment, "button does nothing");

    let markdown = render_report(&report);
    assert!(markdown.contains("# Element Report: button#submit"));
    assert!(markdown.contains("`#submit`"));
    assert!(markdown.contains("button does nothing"));
}

#[test]
fn report_last_windows_are_bounded() {
    let (mut page, button) = react_page();
    let mut instrumentation = Instrumentation::new(InstrumentConfig::default());
    instrumentation.install_always_on();

    for i in 0..30 {
        let msg = page.values.string(format!("error {}", i));
        instrumentation.handle_event(
            &page,
            &PageEvent::Console {
                level: LogLevel::Error,
                args: vec![msg],
                timestamp_ms: i,
            },
        );
    }
    for i in 0..40 {
        let id = format!("r{}", i);
        instrumentation.handle_event(
            &page,
            &PageEvent::RequestStarted {
                id: id.clone(),
                method: "GET".into(),
                url: "https://shop.example.com/api/ping".into(),
                request_body: None,
                timestamp_ms: i,
            },
        );
        instrumentation.handle_event(
            &page,
            &PageEvent::RequestFinished {
                id,
                status: 200,
                transport_error: false,
                timestamp_ms: i + 1,
            },
        );
    }

    let report = build_report(&page, button, &instrumentation, "");
    assert_eq!(report.console_errors.len(), 10);
    assert_eq!(report.console_errors[0].message, "error 20");
    assert_eq!(report.network_requests.len(), 20);
}

#[test]
fn report_without_instrumentation_still_assembles() {
    let (page, button) = react_page();
    let instrumentation = Instrumentation::new(InstrumentConfig::default());

    let report = build_report(&page, button, &instrumentation, "");
    assert_eq!(report.element.selector, "#submit");
    assert!(report.console_errors.is_empty());
    assert!(report.network_requests.is_empty());
}

#[test]
fn data_attributes_are_collected() {
    let (mut page, _button) = react_page();
    let body = page
        .dom
        .ids()
        .find(|id| page.dom.get(*id).map(|n| n.tag == "body").unwrap_or(false))
        .unwrap();
    let card = page.dom.add(
        Some(body),
        ElementNode::new("div")
            .with_attr("data-role", "pricing")
            .with_attr("data-plan", "pro")
            .with_attr("aria-label", "pricing card"),
    );

    let instrumentation = Instrumentation::new(InstrumentConfig::default());
    let report = build_report(&page, card, &instrumentation, "");
    assert_eq!(report.data_attributes.get("data-role").unwrap(), "pricing");
    assert_eq!(report.data_attributes.get("data-plan").unwrap(), "pro");
    assert!(!report.data_attributes.contains_key("aria-label"));
}
