use pagetap_core::dom::{Dom, ElementNode, NodeId};
use pagetap_core::locator::{css_selector, locate, short_identifier, xpath};
use pagetap_core::selector::SimpleSelector;
use pagetap_common::protocol::Rect;

fn page_skeleton() -> (Dom, NodeId) {
    let mut dom = Dom::new();
    let html = dom.add(None, ElementNode::new("html"));
    let body = dom.add(Some(html), ElementNode::new("body"));
    (dom, body)
}

#[test]
fn unique_id_short_circuits_the_selector() {
    let (mut dom, body) = page_skeleton();
    let wrapper = dom.add(Some(body), ElementNode::new("div").with_classes(&["page"]));
    let button = dom.add(
        Some(wrapper),
        ElementNode::new("button").with_id("submit").with_classes(&["btn"]),
    );

    let selector = css_selector(&dom, button);
    assert_eq!(selector, "#submit");

    // querySelector round-trip against the mirrored DOM.
    let parsed = SimpleSelector::parse(&selector).unwrap();
    assert_eq!(parsed.query_first(&dom), Some(button));
}

#[test]
fn ancestor_id_anchors_the_chain() {
    let (mut dom, body) = page_skeleton();
    let main = dom.add(Some(body), ElementNode::new("main").with_id("content"));
    let item = dom.add(Some(main), ElementNode::new("span"));

    assert_eq!(css_selector(&dom, item), "#content > span");
}

#[test]
fn nth_of_type_appears_only_with_same_tag_siblings() {
    let (mut dom, body) = page_skeleton();
    let list = dom.add(Some(body), ElementNode::new("ul"));
    let _first = dom.add(Some(list), ElementNode::new("li"));
    let second = dom.add(Some(list), ElementNode::new("li").with_classes(&["active"]));
    let only_child = dom.add(Some(second), ElementNode::new("a"));

    let selector = css_selector(&dom, second);
    assert!(selector.ends_with("li.active:nth-of-type(2)"), "{selector}");

    let anchor = css_selector(&dom, only_child);
    assert!(anchor.ends_with("> a"), "{anchor}");
    assert!(!anchor.contains("a:nth-of-type"), "{anchor}");
}

#[test]
fn xpath_uses_id_predicates_and_positional_indexes() {
    let (mut dom, body) = page_skeleton();
    let form = dom.add(Some(body), ElementNode::new("form").with_id("login"));
    let _first = dom.add(Some(form), ElementNode::new("input"));
    let second = dom.add(
        Some(form),
        ElementNode::new("input").with_classes(&["field", "wide"]),
    );

    let path = xpath(&dom, second);
    assert_eq!(
        path,
        "/html/body/form[@id=\"login\"]/input[@class=\"field wide\"][2]"
    );
}

#[test]
fn styles_are_filtered_to_the_allowlist() {
    let (mut dom, body) = page_skeleton();
    let div = dom.add(
        Some(body),
        ElementNode::new("div")
            .with_style("display", "grid")
            .with_style("color", "rgb(0, 0, 0)")
            .with_style("-webkit-line-clamp", "3")
            .with_style("animation-delay", "1s"),
    );

    let identity = locate(&dom, div).unwrap();
    assert_eq!(identity.computed_styles.get("display").unwrap(), "grid");
    assert!(identity.computed_styles.contains_key("color"));
    assert!(!identity.computed_styles.contains_key("-webkit-line-clamp"));
    assert!(!identity.computed_styles.contains_key("animation-delay"));
}

#[test]
fn text_label_is_direct_text_only_collapsed_and_capped() {
    let (mut dom, body) = page_skeleton();
    let button = dom.add(
        Some(body),
        ElementNode::new("button")
            .with_text("  Save \n  ")
            .with_text("changes"),
    );
    let child = dom.add(Some(button), ElementNode::new("span").with_text("nested text"));

    let identity = locate(&dom, button).unwrap();
    assert_eq!(identity.text_content, "Save changes");

    // The nested span's text belongs to the span, not the button.
    let child_identity = locate(&dom, child).unwrap();
    assert_eq!(child_identity.text_content, "nested text");

    let long = dom.add(
        Some(body),
        ElementNode::new("p").with_text("a very long paragraph of text that keeps going on"),
    );
    let identity = locate(&dom, long).unwrap();
    assert_eq!(identity.text_content.chars().count(), 30);
    assert!(identity.text_content.ends_with("..."));
}

#[test]
fn short_identifier_prefers_id_then_first_class() {
    let (mut dom, body) = page_skeleton();
    let with_id = dom.add(
        Some(body),
        ElementNode::new("nav").with_id("menu").with_classes(&["top"]),
    );
    let with_class = dom.add(
        Some(body),
        ElementNode::new("div").with_classes(&["card", "raised"]),
    );
    let bare = dom.add(Some(body), ElementNode::new("footer"));

    assert_eq!(short_identifier(&dom, with_id), "nav#menu");
    assert_eq!(short_identifier(&dom, with_class), "div.card");
    assert_eq!(short_identifier(&dom, bare), "footer");
}

#[test]
fn identity_carries_the_bounding_rect() {
    let (mut dom, body) = page_skeleton();
    let div = dom.add(
        Some(body),
        ElementNode::new("div").with_rect(Rect {
            x: 4.0,
            y: 8.0,
            width: 15.0,
            height: 16.0,
        }),
    );
    let identity = locate(&dom, div).unwrap();
    assert_eq!(identity.rect.width, 15.0);
    assert_eq!(identity.rect.y, 8.0);
}
