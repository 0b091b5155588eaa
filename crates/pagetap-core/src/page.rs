//! The captured page model: DOM arena, runtime value graph, global markers
//! and storage. This is the explicit context object that replaces the
//! original's ambient page globals.

use crate::dom::{Dom, ElementNode, NodeId};
use pagetap_common::value::{RawValue, ValueGraph, ValueId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportInfo {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollInfo {
    pub x: f32,
    pub y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

/// A global binding mirrored off the page (`window.React`, devtools hooks,
/// `ng`, ...), used by framework detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalBinding {
    pub name: String,
    pub value: ValueId,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub viewport: ViewportInfo,
    #[serde(default)]
    pub scroll: ScrollInfo,
    #[serde(default)]
    pub dom: Dom,
    #[serde(default)]
    pub values: ValueGraph,
    #[serde(default)]
    pub globals: Vec<GlobalBinding>,
    #[serde(default)]
    pub local_storage: BTreeMap<String, String>,
    #[serde(default)]
    pub session_storage: BTreeMap<String, String>,
}

impl Page {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn global(&self, name: &str) -> Option<ValueId> {
        self.globals
            .iter()
            .find(|g| g.name == name)
            .map(|g| g.value)
    }

    pub fn set_global(&mut self, name: impl Into<String>, value: ValueId) {
        self.globals.push(GlobalBinding {
            name: name.into(),
            value,
        });
    }

    /// Merge element and value nodes the probe mirrored after the initial
    /// capture (elements created while a session runs).
    pub fn extend_mirrored(&mut self, elements: Vec<ElementNode>, values: Vec<RawValue>) {
        self.values.extend_mirrored(values);
        for element in elements {
            self.dom.append_mirrored(element);
        }
    }

    /// Heuristic application root: a `#root`/`#app`-style mount point if one
    /// exists, else the first element under body, else the document root.
    pub fn likely_root(&self) -> Option<NodeId> {
        const MOUNT_IDS: &[&str] = &["root", "app", "__next", "main"];
        for id in self.dom.ids() {
            if let Some(node) = self.dom.get(id)
                && let Some(el_id) = &node.id
                && MOUNT_IDS.contains(&el_id.as_str())
            {
                return Some(id);
            }
        }
        let body = self
            .dom
            .ids()
            .find(|id| self.dom.get(*id).map(|n| n.tag == "body").unwrap_or(false));
        if let Some(body) = body {
            if let Some(first_child) = self.dom.get(body).and_then(|n| n.children.first()) {
                return Some(*first_child);
            }
            return Some(body);
        }
        self.dom.root()
    }

    /// Elements under `body`, in document order, for bounded marker scans.
    pub fn body_elements(&self) -> Vec<NodeId> {
        let body = self
            .dom
            .ids()
            .find(|id| self.dom.get(*id).map(|n| n.tag == "body").unwrap_or(false));
        match body {
            Some(body) => self
                .dom
                .descendants(body)
                .into_iter()
                .filter(|id| *id != body)
                .collect(),
            None => self.dom.ids().collect(),
        }
    }
}
