//! Element identity derivation: CSS selector, XPath, short id, filtered
//! computed styles and a short text label. Derived fresh on every request —
//! never cached, because the underlying element may have mutated.

use crate::dom::{Dom, NodeId};
use pagetap_common::protocol::ElementIdentity;
use pagetap_common::sanitize::truncate_chars;
use std::collections::BTreeMap;

const MAX_TEXT_LABEL_LEN: usize = 30;

/// The computed-style keys worth reporting. Everything else is noise at
/// report scale and would leak unrelated page styling into the payload.
const STYLE_ALLOWLIST: &[&str] = &[
    "display",
    "position",
    "top",
    "right",
    "bottom",
    "left",
    "z-index",
    "width",
    "height",
    "margin",
    "padding",
    "border",
    "border-radius",
    "box-sizing",
    "box-shadow",
    "background-color",
    "color",
    "opacity",
    "visibility",
    "overflow",
    "font-family",
    "font-size",
    "font-weight",
    "line-height",
    "text-align",
    "flex-direction",
    "justify-content",
    "align-items",
    "gap",
    "cursor",
    "transform",
];

pub fn locate(dom: &Dom, node: NodeId) -> Option<ElementIdentity> {
    let element = dom.get(node)?;
    Some(ElementIdentity {
        selector: css_selector(dom, node),
        xpath: xpath(dom, node),
        short_id: short_identifier(dom, node),
        computed_styles: filtered_styles(dom, node),
        text_content: direct_text(dom, node),
        rect: element.rect,
    })
}

/// Walk the parent chain emitting `tag.class` segments, `:nth-of-type(k)`
/// only where same-tag siblings make it necessary. An id short-circuits the
/// walk — ids are assumed page-unique and are not verified.
pub fn css_selector(dom: &Dom, node: NodeId) -> String {
    let mut segments: Vec<String> = Vec::new();
    let mut current = Some(node);

    while let Some(id) = current {
        let Some(element) = dom.get(id) else { break };

        if let Some(el_id) = &element.id
            && !el_id.is_empty()
        {
            segments.push(format!("#{}", el_id));
            break;
        }

        let mut segment = element.tag.clone();
        for class in &element.classes {
            segment.push('.');
            segment.push_str(class);
        }
        if dom.same_tag_siblings(id).len() > 1 {
            segment.push_str(&format!(":nth-of-type({})", dom.nth_of_type(id)));
        }
        segments.push(segment);
        current = element.parent;
    }

    segments.reverse();
    segments.join(" > ")
}

/// Root-to-leaf XPath with id/class predicates and a 1-based same-tag index
/// where no id disambiguates.
pub fn xpath(dom: &Dom, node: NodeId) -> String {
    let mut steps: Vec<String> = Vec::new();
    let mut current = Some(node);

    while let Some(id) = current {
        let Some(element) = dom.get(id) else { break };

        let mut step = element.tag.clone();
        if let Some(el_id) = &element.id
            && !el_id.is_empty()
        {
            step.push_str(&format!("[@id=\"{}\"]", el_id));
        } else {
            if !element.classes.is_empty() {
                step.push_str(&format!("[@class=\"{}\"]", element.classes.join(" ")));
            }
            if dom.same_tag_siblings(id).len() > 1 {
                step.push_str(&format!("[{}]", dom.nth_of_type(id)));
            }
        }
        steps.push(step);
        current = element.parent;
    }

    steps.reverse();
    format!("/{}", steps.join("/"))
}

/// `tag#id`, `tag.firstClass`, or bare tag — a label, not a selector.
pub fn short_identifier(dom: &Dom, node: NodeId) -> String {
    let Some(element) = dom.get(node) else {
        return String::new();
    };
    if let Some(id) = &element.id
        && !id.is_empty()
    {
        return format!("{}#{}", element.tag, id);
    }
    if let Some(class) = element.classes.first() {
        return format!("{}.{}", element.tag, class);
    }
    element.tag.clone()
}

fn filtered_styles(dom: &Dom, node: NodeId) -> BTreeMap<String, String> {
    let Some(element) = dom.get(node) else {
        return BTreeMap::new();
    };
    STYLE_ALLOWLIST
        .iter()
        .filter_map(|key| {
            element
                .computed_style
                .get(*key)
                .filter(|v| !v.is_empty())
                .map(|v| (key.to_string(), v.clone()))
        })
        .collect()
}

/// Direct child text nodes only, whitespace-collapsed and capped — this is a
/// label, not a content dump.
fn direct_text(dom: &Dom, node: NodeId) -> String {
    let Some(element) = dom.get(node) else {
        return String::new();
    };
    let joined = element.text_chunks.join(" ");
    let collapsed = joined.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate_chars(&collapsed, MAX_TEXT_LABEL_LEN)
}
