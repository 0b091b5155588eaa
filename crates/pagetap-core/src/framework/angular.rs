//! Angular component introspection. The host shell resolves the component
//! instance through Angular's public debug API and mirrors it onto the
//! element under a reserved expando key; this side only filters and bounds
//! it. Angular draws no props/state distinction, so everything readable
//! lands in props.

use super::ComponentIntrospector;
use crate::dom::NodeId;
use crate::page::Page;
use pagetap_common::protocol::ComponentInfo;
use pagetap_common::sanitize::{SanitizeOptions, SanitizedObject, SanitizedValue, sanitize};
use pagetap_common::value::{PropertySlot, RawValue};

/// Expando under which the host mirrors `ng.getComponent(el)`.
pub const NG_COMPONENT_KEY: &str = "__ngComponent";

pub struct AngularIntrospector;

impl ComponentIntrospector for AngularIntrospector {
    fn introspect(&self, page: &Page, node: NodeId) -> ComponentInfo {
        let Some(element) = page.dom.get(node) else {
            return ComponentInfo::default();
        };
        let Some(instance) = element.expando_value(NG_COMPONENT_KEY) else {
            return ComponentInfo::default();
        };
        let graph = &page.values;
        let opts = SanitizeOptions::default();

        let name = graph
            .entry(instance, "constructor")
            .and_then(|c| match graph.get(c) {
                Some(RawValue::Function { name }) => name.clone().filter(|n| !n.is_empty()),
                _ => None,
            });

        // Own, non-underscore, non-function properties only, under the same
        // key cap the sanitizer applies.
        let mut props = SanitizedObject::new();
        let mut omitted = 0usize;
        if let Some(RawValue::Object { entries }) = graph.get(instance) {
            for entry in entries {
                if entry.key.starts_with('_') || entry.key == "constructor" {
                    continue;
                }
                if props.len() >= opts.max_object_keys {
                    omitted += 1;
                    continue;
                }
                match entry.slot {
                    PropertySlot::Ok { value } => {
                        if graph.is_function(value) {
                            continue;
                        }
                        props.insert(&entry.key, sanitize(graph, value, &opts));
                    }
                    PropertySlot::Throws => {
                        props.insert(
                            &entry.key,
                            SanitizedValue::Str("[Error reading property]".into()),
                        );
                    }
                }
            }
        }
        if omitted > 0 {
            props.insert("...", SanitizedValue::Number(omitted as f64));
        }

        ComponentInfo {
            name,
            props: (!props.is_empty()).then_some(props),
            state: None,
            file: None,
        }
    }
}
