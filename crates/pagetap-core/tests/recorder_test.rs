use pagetap_common::protocol::{InteractionDetail, NavigationMethod};
use pagetap_core::dom::{ElementNode, NodeId};
use pagetap_core::events::{DomEvent, DomEventKind};
use pagetap_core::page::Page;
use pagetap_core::recorder::{InteractionRecorder, RecorderConfig, interaction_selector};

fn page_with_body() -> (Page, NodeId) {
    let mut page = Page::new("https://app.example.com", "App");
    let html = page.dom.add(None, ElementNode::new("html"));
    let body = page.dom.add(Some(html), ElementNode::new("body"));
    (page, body)
}

fn recorder() -> InteractionRecorder {
    InteractionRecorder::new(RecorderConfig::default())
}

fn click(node: NodeId, ts: u64) -> DomEvent {
    DomEvent {
        node: Some(node),
        timestamp_ms: ts,
        kind: DomEventKind::Click { x: 1.0, y: 2.0 },
    }
}

fn input(node: NodeId, value: &str, ts: u64) -> DomEvent {
    DomEvent {
        node: Some(node),
        timestamp_ms: ts,
        kind: DomEventKind::Input {
            value: value.to_string(),
        },
    }
}

#[test]
fn selector_prefers_id() {
    let (mut page, body) = page_with_body();
    let el = page.dom.add(
        Some(body),
        ElementNode::new("button")
            .with_id("save")
            .with_attr("data-testid", "save-button"),
    );
    assert_eq!(interaction_selector(&page.dom, el), "#save");
}

#[test]
fn selector_falls_back_to_test_id_attributes() {
    let (mut page, body) = page_with_body();
    let el = page.dom.add(
        Some(body),
        ElementNode::new("button").with_attr("data-testid", "save-button"),
    );
    assert_eq!(
        interaction_selector(&page.dom, el),
        "[data-testid=\"save-button\"]"
    );

    let cy = page.dom.add(
        Some(body),
        ElementNode::new("input").with_attr("data-cy", "email-field"),
    );
    assert_eq!(interaction_selector(&page.dom, cy), "[data-cy=\"email-field\"]");
}

#[test]
fn selector_uses_meaningful_classes_and_identifying_attributes() {
    let (mut page, body) = page_with_body();
    let el = page.dom.add(
        Some(body),
        ElementNode::new("input")
            .with_classes(&["mt-4", "px-2", "search-box", "wide-input", "extra"])
            .with_attr("type", "text")
            .with_attr("name", "q"),
    );
    assert_eq!(
        interaction_selector(&page.dom, el),
        "input.search-box.wide-input[type=\"text\"][name=\"q\"]"
    );
}

#[test]
fn ambiguous_selector_gets_nth_of_type() {
    let (mut page, body) = page_with_body();
    let _first = page
        .dom
        .add(Some(body), ElementNode::new("button").with_classes(&["cta"]));
    let second = page
        .dom
        .add(Some(body), ElementNode::new("button").with_classes(&["cta"]));

    assert_eq!(
        interaction_selector(&page.dom, second),
        "button.cta:nth-of-type(2)"
    );
}

#[test]
fn password_inputs_are_never_captured() {
    let (mut page, body) = page_with_body();
    let pw = page.dom.add(
        Some(body),
        ElementNode::new("input")
            .with_id("pw")
            .with_attr("type", "password"),
    );
    let mut recorder = recorder();

    let entries = recorder.observe(&page, &input(pw, "hunter2", 10));
    assert!(entries.is_empty());
    // Nothing pending either: the value was dropped, not deferred.
    assert!(recorder.flush_all().is_empty());
}

#[test]
fn sensitive_field_values_are_masked_but_presence_recorded() {
    let (mut page, body) = page_with_body();
    let email = page.dom.add(
        Some(body),
        ElementNode::new("input")
            .with_id("email")
            .with_attr("type", "text")
            .with_attr("name", "email"),
    );
    let mut recorder = recorder();

    recorder.observe(&page, &input(email, "a@b.com", 10));
    let entries = recorder.flush_all();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].target, "#email");
    assert_eq!(
        entries[0].detail,
        InteractionDetail::Input {
            value: "[masked]".to_string()
        }
    );
}

#[test]
fn input_events_debounce_per_selector() {
    let (mut page, body) = page_with_body();
    let field = page.dom.add(
        Some(body),
        ElementNode::new("input").with_id("q").with_attr("type", "text"),
    );
    let mut recorder = recorder();

    // Three keystrokes inside the quiet window collapse into one record.
    assert!(recorder.observe(&page, &input(field, "r", 0)).is_empty());
    assert!(recorder.observe(&page, &input(field, "ru", 100)).is_empty());
    assert!(recorder.observe(&page, &input(field, "rust", 200)).is_empty());

    // A later event past the quiet period flushes the final value first.
    let entries = recorder.observe(&page, &click(field, 900));
    assert_eq!(entries.len(), 2);
    assert_eq!(
        entries[0].detail,
        InteractionDetail::Input {
            value: "rust".to_string()
        }
    );
    assert_eq!(entries[0].timestamp_ms, 200);
    assert!(matches!(entries[1].detail, InteractionDetail::Click { .. }));
}

#[test]
fn change_supersedes_pending_input() {
    let (mut page, body) = page_with_body();
    let field = page.dom.add(
        Some(body),
        ElementNode::new("select").with_id("country"),
    );
    let mut recorder = recorder();

    recorder.observe(&page, &input(field, "Fin", 0));
    let entries = recorder.observe(
        &page,
        &DomEvent {
            node: Some(field),
            timestamp_ms: 50,
            kind: DomEventKind::Change {
                value: "Finland".to_string(),
            },
        },
    );
    assert_eq!(entries.len(), 1);
    assert_eq!(
        entries[0].detail,
        InteractionDetail::Change {
            value: "Finland".to_string()
        }
    );
    assert!(recorder.flush_all().is_empty());
}

#[test]
fn scroll_is_throttled_to_one_per_second() {
    let (mut page, _body) = page_with_body();
    page.scroll.max_y = 2000.0;
    let mut recorder = recorder();

    let scroll = |y: f32, ts: u64| DomEvent {
        node: None,
        timestamp_ms: ts,
        kind: DomEventKind::Scroll { x: 0.0, y },
    };

    let first = recorder.observe(&page, &scroll(500.0, 0));
    assert_eq!(first.len(), 1);
    assert_eq!(
        first[0].detail,
        InteractionDetail::Scroll {
            x: 0.0,
            y: 500.0,
            percent: 25
        }
    );
    assert_eq!(first[0].target, "window");

    // 400ms later: suppressed.
    assert!(recorder.observe(&page, &scroll(800.0, 400)).is_empty());
    // Past the window: recorded.
    let third = recorder.observe(&page, &scroll(2000.0, 1200));
    assert_eq!(third.len(), 1);
    assert_eq!(
        third[0].detail,
        InteractionDetail::Scroll {
            x: 0.0,
            y: 2000.0,
            percent: 100
        }
    );
}

#[test]
fn submit_collects_masked_form_data() {
    let (mut page, body) = page_with_body();
    let form = page.dom.add(Some(body), ElementNode::new("form").with_id("signup"));
    page.dom.add(
        Some(form),
        ElementNode::new("input")
            .with_attr("type", "text")
            .with_attr("name", "username")
            .with_attr("value", "ada"),
    );
    page.dom.add(
        Some(form),
        ElementNode::new("input")
            .with_attr("type", "text")
            .with_attr("name", "email")
            .with_attr("value", "ada@example.com"),
    );
    page.dom.add(
        Some(form),
        ElementNode::new("input")
            .with_attr("type", "password")
            .with_attr("name", "password")
            .with_attr("value", "hunter2"),
    );

    let mut recorder = recorder();
    let entries = recorder.observe(
        &page,
        &DomEvent {
            node: Some(form),
            timestamp_ms: 5,
            kind: DomEventKind::Submit,
        },
    );
    assert_eq!(entries.len(), 1);
    match &entries[0].detail {
        InteractionDetail::Submit { form_data } => {
            assert_eq!(form_data.get("username").unwrap(), "ada");
            assert_eq!(form_data.get("email").unwrap(), "[masked]");
            assert!(!form_data.contains_key("password"));
        }
        other => panic!("expected submit, got {:?}", other),
    }
}

#[test]
fn only_shortcut_keydowns_are_recorded() {
    let (mut page, body) = page_with_body();
    let field = page.dom.add(Some(body), ElementNode::new("input").with_id("q"));
    let mut recorder = recorder();

    let keydown = |key: &str, modifiers: &[&str], ts: u64| DomEvent {
        node: Some(field),
        timestamp_ms: ts,
        kind: DomEventKind::Keydown {
            key: key.to_string(),
            modifiers: modifiers.iter().map(|m| m.to_string()).collect(),
        },
    };

    assert!(recorder.observe(&page, &keydown("a", &[], 0)).is_empty());
    assert_eq!(recorder.observe(&page, &keydown("Escape", &[], 1)).len(), 1);
    let combo = recorder.observe(&page, &keydown("s", &["Control"], 2));
    assert_eq!(combo.len(), 1);
    assert_eq!(
        combo[0].detail,
        InteractionDetail::Keydown {
            key: "s".to_string(),
            modifiers: vec!["Control".to_string()]
        }
    );
}

#[test]
fn navigation_is_recorded_without_a_node() {
    let (page, _body) = page_with_body();
    let mut recorder = recorder();
    let entries = recorder.observe(
        &page,
        &DomEvent {
            node: None,
            timestamp_ms: 7,
            kind: DomEventKind::Navigation {
                to: "/checkout".to_string(),
                method: NavigationMethod::PushState,
            },
        },
    );
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].target, "window");
    assert_eq!(
        entries[0].detail,
        InteractionDetail::Navigation {
            to: "/checkout".to_string(),
            method: NavigationMethod::PushState
        }
    );
}
