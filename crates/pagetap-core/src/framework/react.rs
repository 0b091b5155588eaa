//! React fiber traversal. A fiber is React's internal instance node; the
//! element carries a reference under a hashed key, and `return` pointers
//! link each fiber to its parent. Shapes vary across React majors, so every
//! access is guarded and the walk is hop-bounded.

use super::ComponentIntrospector;
use crate::dom::NodeId;
use crate::page::Page;
use pagetap_common::protocol::ComponentInfo;
use pagetap_common::sanitize::{SanitizeOptions, SanitizedValue, sanitize};
use pagetap_common::value::{RawValue, ValueGraph, ValueId};

/// Upper bound on `return`-pointer hops. Production trees are far shallower;
/// the bound also stops corrupted (cyclic) chains.
const MAX_FIBER_HOPS: usize = 50;

/// Fiber tag value for class components, the only case where
/// `memoizedState` holds component state rather than hook bookkeeping.
const CLASS_COMPONENT_TAG: f64 = 1.0;

const FIBER_KEY_PREFIXES: &[&str] = &["__reactFiber$", "__reactInternalInstance$"];

pub struct ReactIntrospector;

impl ComponentIntrospector for ReactIntrospector {
    fn introspect(&self, page: &Page, node: NodeId) -> ComponentInfo {
        let Some(element) = page.dom.get(node) else {
            return ComponentInfo::default();
        };
        let Some(fiber) = FIBER_KEY_PREFIXES
            .iter()
            .find_map(|prefix| element.expando_with_prefix(prefix))
            .map(|(_, value)| value)
        else {
            return ComponentInfo::default();
        };

        let graph = &page.values;
        let opts = SanitizeOptions::default();
        let mut current = Some(fiber);
        let mut hops = 0;

        // Walk up until a fiber whose type is a component (function or
        // class), skipping DOM-host fibers whose type is a tag string.
        while let Some(fiber) = current {
            if hops >= MAX_FIBER_HOPS {
                break;
            }
            hops += 1;

            if let Some(ty) = graph.entry(fiber, "type")
                && is_component_type(graph, ty)
            {
                return extract(graph, fiber, ty, &opts);
            }
            current = graph.entry(fiber, "return");
        }

        ComponentInfo::default()
    }
}

fn is_component_type(graph: &ValueGraph, ty: ValueId) -> bool {
    match graph.get(ty) {
        Some(RawValue::Function { .. }) => true,
        // forwardRef/memo wrappers are plain objects carrying render/type.
        Some(RawValue::Object { .. }) => {
            graph.entry(ty, "render").is_some() || graph.entry(ty, "displayName").is_some()
        }
        _ => false,
    }
}

fn extract(
    graph: &ValueGraph,
    fiber: ValueId,
    ty: ValueId,
    opts: &SanitizeOptions,
) -> ComponentInfo {
    let name = graph
        .entry(ty, "displayName")
        .and_then(|v| graph.string_value(v))
        .map(str::to_string)
        .or_else(|| match graph.get(ty) {
            Some(RawValue::Function { name }) => {
                name.clone().filter(|n| !n.is_empty())
            }
            _ => None,
        })
        .or_else(|| {
            graph
                .entry(ty, "name")
                .and_then(|v| graph.string_value(v))
                .map(str::to_string)
        });

    let props = graph
        .entry(fiber, "memoizedProps")
        .map(|p| sanitize(graph, p, opts))
        .and_then(|v| match v {
            SanitizedValue::Object(obj) => Some(obj),
            _ => None,
        });

    // Hook state on function components is a linked list of internals, not
    // component state; only class fibers expose something worth reporting.
    let is_class = graph
        .entry(fiber, "tag")
        .and_then(|t| graph.number_value(t))
        .map(|t| t == CLASS_COMPONENT_TAG)
        .unwrap_or(false);
    let state = if is_class {
        graph
            .entry(fiber, "memoizedState")
            .map(|s| sanitize(graph, s, opts))
            .and_then(|v| match v {
                SanitizedValue::Object(obj) => Some(obj),
                _ => None,
            })
    } else {
        None
    };

    // Stripped from production builds; best-effort only.
    let file = graph
        .entry(fiber, "_debugSource")
        .and_then(|src| graph.entry(src, "fileName"))
        .and_then(|f| graph.string_value(f))
        .map(str::to_string);

    ComponentInfo {
        name,
        props,
        state,
        file,
    }
}
