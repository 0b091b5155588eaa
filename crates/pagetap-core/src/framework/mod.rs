//! Framework detection and component introspection.
//!
//! Framework internals are an externally-owned, versioned, unstable shape:
//! every traversal here is read-only and every field access is guarded.
//! Detection is best-effort and order-sensitive; a page that genuinely mixes
//! frameworks reports only the first match.

mod angular;
mod react;
mod vue;

pub use angular::AngularIntrospector;
pub use react::ReactIntrospector;
pub use vue::VueIntrospector;

use crate::dom::NodeId;
use crate::page::Page;
use pagetap_common::protocol::{ComponentInfo, FrameworkIdentity, FrameworkName};

/// Elements examined when falling back to a marker scan of the body.
const MARKER_SCAN_LIMIT: usize = 20;

pub const REACT_FIBER_PREFIXES: &[&str] = &[
    "__reactFiber$",
    "__reactInternalInstance$",
    "__reactContainer$",
];

/// One introspector per framework, all producing the same shape.
pub trait ComponentIntrospector {
    fn introspect(&self, page: &Page, node: NodeId) -> ComponentInfo;
}

/// Detect the page's dominant framework. Checks run in a fixed priority
/// order; first match wins.
pub fn detect(page: &Page) -> FrameworkIdentity {
    if let Some(identity) = detect_react(page) {
        return identity;
    }
    if let Some(identity) = detect_vue(page) {
        return identity;
    }
    if let Some(identity) = detect_angular(page) {
        return identity;
    }
    if let Some(identity) = detect_svelte(page) {
        return identity;
    }
    FrameworkIdentity::default()
}

fn detect_react(page: &Page) -> Option<FrameworkIdentity> {
    let version = page
        .global("React")
        .and_then(|react| page.values.entry(react, "version"))
        .and_then(|v| page.values.string_value(v))
        .map(str::to_string);

    if page.global("__REACT_DEVTOOLS_GLOBAL_HOOK__").is_some() || page.global("React").is_some() {
        return Some(react_identity(version));
    }

    if let Some(root) = page.likely_root()
        && has_fiber_key(page, root)
    {
        return Some(react_identity(version));
    }

    let dom_marker = page.dom.ids().any(|id| {
        page.dom
            .get(id)
            .map(|node| node.attr("data-reactroot").is_some() || node.attr("data-reactid").is_some())
            .unwrap_or(false)
    });
    if dom_marker {
        return Some(react_identity(version));
    }

    // Last resort: a bounded scan of body descendants for fiber-shaped keys.
    if page
        .body_elements()
        .into_iter()
        .take(MARKER_SCAN_LIMIT)
        .any(|id| has_fiber_key(page, id))
    {
        return Some(react_identity(version));
    }

    None
}

fn react_identity(version: Option<String>) -> FrameworkIdentity {
    FrameworkIdentity {
        name: Some(FrameworkName::React),
        version,
    }
}

fn has_fiber_key(page: &Page, id: NodeId) -> bool {
    page.dom
        .get(id)
        .map(|node| {
            REACT_FIBER_PREFIXES
                .iter()
                .any(|prefix| node.expando_with_prefix(prefix).is_some())
        })
        .unwrap_or(false)
}

fn detect_vue(page: &Page) -> Option<FrameworkIdentity> {
    let version = page
        .global("Vue")
        .and_then(|vue| page.values.entry(vue, "version"))
        .and_then(|v| page.values.string_value(v))
        .map(str::to_string);

    if page.global("Vue").is_some() {
        return Some(FrameworkIdentity {
            name: Some(FrameworkName::Vue),
            version,
        });
    }

    let instance_marker = page.body_elements().into_iter().take(MARKER_SCAN_LIMIT).any(|id| {
        page.dom
            .get(id)
            .map(|node| {
                node.expando_value("__vue_app__").is_some()
                    || node.expando_value("__vueParentComponent").is_some()
                    || node.expando_value("__vue__").is_some()
            })
            .unwrap_or(false)
    });
    let scoped_style_marker = page.dom.ids().any(|id| {
        page.dom
            .get(id)
            .map(|node| node.attributes.iter().any(|(name, _)| name.starts_with("data-v-")))
            .unwrap_or(false)
    });

    if instance_marker || scoped_style_marker {
        return Some(FrameworkIdentity {
            name: Some(FrameworkName::Vue),
            version,
        });
    }
    None
}

fn detect_angular(page: &Page) -> Option<FrameworkIdentity> {
    let version = page.dom.ids().find_map(|id| {
        page.dom
            .get(id)
            .and_then(|node| node.attr("ng-version"))
            .map(str::to_string)
    });

    if page.global("ng").is_some()
        || page.global("getAllAngularRootElements").is_some()
        || version.is_some()
    {
        return Some(FrameworkIdentity {
            name: Some(FrameworkName::Angular),
            version,
        });
    }

    let content_marker = page.dom.ids().any(|id| {
        page.dom
            .get(id)
            .map(|node| {
                node.attributes
                    .iter()
                    .any(|(name, _)| name.starts_with("_ngcontent-") || name.starts_with("_nghost-"))
            })
            .unwrap_or(false)
    });
    if content_marker {
        return Some(FrameworkIdentity {
            name: Some(FrameworkName::Angular),
            version: None,
        });
    }
    None
}

fn detect_svelte(page: &Page) -> Option<FrameworkIdentity> {
    let marker = page.dom.ids().any(|id| {
        page.dom
            .get(id)
            .map(|node| node.classes.iter().any(|c| c.starts_with("svelte-")))
            .unwrap_or(false)
    });
    marker.then(|| FrameworkIdentity {
        name: Some(FrameworkName::Svelte),
        version: None,
    })
}

/// Extract the owning component for `node`. Structural introspection first;
/// a `data-ai-context` annotation fills only the gaps it left.
pub fn introspect_component(
    page: &Page,
    node: NodeId,
    framework: &FrameworkIdentity,
) -> ComponentInfo {
    let mut info = match framework.name {
        Some(FrameworkName::React) => ReactIntrospector.introspect(page, node),
        Some(FrameworkName::Vue) => VueIntrospector.introspect(page, node),
        Some(FrameworkName::Angular) => AngularIntrospector.introspect(page, node),
        // Svelte strips its component structure at build time; only the
        // declared annotation can name it.
        Some(FrameworkName::Svelte) | None => ComponentInfo::default(),
    };

    if let Some(context) = developer_context(page, node) {
        if info.name.is_none() {
            info.name = context
                .get("component")
                .and_then(|v| v.as_str())
                .map(str::to_string);
        }
        if info.file.is_none() {
            info.file = context
                .get("file")
                .and_then(|v| v.as_str())
                .map(str::to_string);
        }
    }

    info
}

/// Parse the element's `data-ai-context` attribute, walking up the ancestor
/// chain to the nearest carrier. Malformed JSON is swallowed: a broken
/// developer annotation must never fail a capture.
pub fn developer_context(page: &Page, node: NodeId) -> Option<serde_json::Value> {
    let mut current = Some(node);
    while let Some(id) = current {
        let element = page.dom.get(id)?;
        if let Some(raw) = element.attr("data-ai-context") {
            return match serde_json::from_str::<serde_json::Value>(raw) {
                Ok(value) if value.is_object() => Some(value),
                Ok(_) => None,
                Err(err) => {
                    tracing::debug!("ignoring malformed data-ai-context: {}", err);
                    None
                }
            };
        }
        current = element.parent;
    }
    None
}
