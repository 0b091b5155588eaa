//! Vue component introspection, covering both the Vue 3 internal component
//! instance (`__vueParentComponent`) and the Vue 2 view model (`__vue__`).

use super::ComponentIntrospector;
use crate::dom::NodeId;
use crate::page::Page;
use pagetap_common::protocol::ComponentInfo;
use pagetap_common::sanitize::{SanitizeOptions, SanitizedValue, sanitize};
use pagetap_common::value::{ValueGraph, ValueId};

pub struct VueIntrospector;

impl ComponentIntrospector for VueIntrospector {
    fn introspect(&self, page: &Page, node: NodeId) -> ComponentInfo {
        let Some(element) = page.dom.get(node) else {
            return ComponentInfo::default();
        };

        if let Some(instance) = element.expando_value("__vueParentComponent") {
            return vue3(&page.values, instance);
        }
        if let Some(vm) = element.expando_value("__vue__") {
            return vue2(&page.values, vm);
        }
        ComponentInfo::default()
    }
}

fn vue3(graph: &ValueGraph, instance: ValueId) -> ComponentInfo {
    let opts = SanitizeOptions::default();
    let ty = graph.entry(instance, "type");

    let name = ty.and_then(|ty| {
        string_entry(graph, ty, "name").or_else(|| string_entry(graph, ty, "__name"))
    });
    let file = ty.and_then(|ty| string_entry(graph, ty, "__file"));

    let props = sanitized_object(graph, graph.entry(instance, "props"), &opts);
    let state = sanitized_object(graph, graph.entry(instance, "setupState"), &opts);

    ComponentInfo {
        name,
        props,
        state,
        file,
    }
}

fn vue2(graph: &ValueGraph, vm: ValueId) -> ComponentInfo {
    let opts = SanitizeOptions::default();
    let options = graph.entry(vm, "$options");

    let name = options.and_then(|o| string_entry(graph, o, "name"));
    let file = options.and_then(|o| string_entry(graph, o, "__file"));

    let props = sanitized_object(
        graph,
        graph.entry(vm, "$props").or_else(|| graph.entry(vm, "_props")),
        &opts,
    );
    let state = sanitized_object(graph, graph.entry(vm, "$data"), &opts);

    ComponentInfo {
        name,
        props,
        state,
        file,
    }
}

fn string_entry(graph: &ValueGraph, object: ValueId, key: &str) -> Option<String> {
    graph
        .entry(object, key)
        .and_then(|v| graph.string_value(v))
        .map(str::to_string)
}

fn sanitized_object(
    graph: &ValueGraph,
    id: Option<ValueId>,
    opts: &SanitizeOptions,
) -> Option<pagetap_common::sanitize::SanitizedObject> {
    match sanitize(graph, id?, opts) {
        SanitizedValue::Object(obj) if !obj.is_empty() => Some(obj),
        _ => None,
    }
}
