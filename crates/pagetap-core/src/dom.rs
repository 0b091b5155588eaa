//! Mirrored DOM. An arena of element nodes captured out of the page; all
//! selector and identity derivation walks this structure instead of a live
//! tree.

use pagetap_common::protocol::Rect;
use pagetap_common::value::ValueId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Index of an element in a [`Dom`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ElementNode {
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub classes: Vec<String>,
    /// Attributes other than id/class, in document order.
    #[serde(default)]
    pub attributes: Vec<(String, String)>,
    #[serde(default)]
    pub parent: Option<NodeId>,
    #[serde(default)]
    pub children: Vec<NodeId>,
    /// Direct child text nodes only, not the full subtree.
    #[serde(default)]
    pub text_chunks: Vec<String>,
    #[serde(default)]
    pub computed_style: BTreeMap<String, String>,
    #[serde(default)]
    pub rect: Rect,
    /// Own JS properties mirrored off the element (framework instance
    /// markers, inline handlers), pointing into the page's value graph.
    #[serde(default)]
    pub expando: Vec<(String, ValueId)>,
}

impl ElementNode {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_lowercase(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_classes(mut self, classes: &[&str]) -> Self {
        self.classes = classes.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text_chunks.push(text.into());
        self
    }

    pub fn with_style(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.computed_style.insert(property.into(), value.into());
        self
    }

    pub fn with_rect(mut self, rect: Rect) -> Self {
        self.rect = rect;
        self
    }

    pub fn with_expando(mut self, key: impl Into<String>, value: ValueId) -> Self {
        self.expando.push((key.into(), value));
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        if name == "id" {
            return self.id.as_deref();
        }
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn expando_value(&self, key: &str) -> Option<ValueId> {
        self.expando.iter().find(|(k, _)| k == key).map(|(_, v)| *v)
    }

    /// First expando key matching the prefix, with its value.
    pub fn expando_with_prefix(&self, prefix: &str) -> Option<(&str, ValueId)> {
        self.expando
            .iter()
            .find(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.as_str(), *v))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dom {
    nodes: Vec<ElementNode>,
}

impl Dom {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&ElementNode> {
        self.nodes.get(id.0 as usize)
    }

    pub fn root(&self) -> Option<NodeId> {
        if self.nodes.is_empty() {
            None
        } else {
            Some(NodeId(0))
        }
    }

    /// Add an element under `parent` (or as a root when `None`), wiring both
    /// directions of the link.
    pub fn add(&mut self, parent: Option<NodeId>, mut node: ElementNode) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        node.parent = parent;
        self.nodes.push(node);
        if let Some(parent) = parent
            && let Some(parent_node) = self.nodes.get_mut(parent.0 as usize)
        {
            parent_node.children.push(id);
        }
        id
    }

    /// Append an element the probe mirrored after the initial capture. The
    /// probe assigns ids in lockstep with this arena; only the parent's
    /// child list needs fixing up.
    pub fn append_mirrored(&mut self, node: ElementNode) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        let parent = node.parent;
        self.nodes.push(node);
        if let Some(parent) = parent
            && let Some(parent_node) = self.nodes.get_mut(parent.0 as usize)
            && !parent_node.children.contains(&id)
        {
            parent_node.children.push(id);
        }
        id
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.parent
    }

    /// All node ids in document (arena) order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(|i| NodeId(i as u32))
    }

    /// Same-tag siblings under the element's parent, in order. Roots have no
    /// siblings.
    pub fn same_tag_siblings(&self, id: NodeId) -> Vec<NodeId> {
        let Some(node) = self.get(id) else {
            return Vec::new();
        };
        let Some(parent) = node.parent.and_then(|p| self.get(p)) else {
            return vec![id];
        };
        parent
            .children
            .iter()
            .copied()
            .filter(|child| {
                self.get(*child)
                    .map(|c| c.tag == node.tag)
                    .unwrap_or(false)
            })
            .collect()
    }

    /// 1-based position among same-tag siblings.
    pub fn nth_of_type(&self, id: NodeId) -> usize {
        self.same_tag_siblings(id)
            .iter()
            .position(|sibling| *sibling == id)
            .map(|i| i + 1)
            .unwrap_or(1)
    }

    /// Depth-first subtree walk, including the start node.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if self.get(current).is_none() {
                continue;
            }
            out.push(current);
            if let Some(node) = self.get(current) {
                for child in node.children.iter().rev() {
                    stack.push(*child);
                }
            }
        }
        out
    }

    /// `data-*` attributes of an element.
    pub fn data_attributes(&self, id: NodeId) -> BTreeMap<String, String> {
        let Some(node) = self.get(id) else {
            return BTreeMap::new();
        };
        node.attributes
            .iter()
            .filter(|(name, _)| name.starts_with("data-"))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_wires_parent_and_children() {
        let mut dom = Dom::new();
        let root = dom.add(None, ElementNode::new("html"));
        let body = dom.add(Some(root), ElementNode::new("body"));
        let div = dom.add(Some(body), ElementNode::new("div"));

        assert_eq!(dom.parent(div), Some(body));
        assert_eq!(dom.get(root).unwrap().children, vec![body]);
        assert_eq!(dom.root(), Some(root));
    }

    #[test]
    fn nth_of_type_counts_same_tag_only() {
        let mut dom = Dom::new();
        let root = dom.add(None, ElementNode::new("ul"));
        let _a = dom.add(Some(root), ElementNode::new("li"));
        let span = dom.add(Some(root), ElementNode::new("span"));
        let b = dom.add(Some(root), ElementNode::new("li"));

        assert_eq!(dom.nth_of_type(b), 2);
        assert_eq!(dom.nth_of_type(span), 1);
        assert_eq!(dom.same_tag_siblings(b).len(), 2);
    }

    #[test]
    fn tag_is_normalized_to_lowercase() {
        let node = ElementNode::new("BUTTON");
        assert_eq!(node.tag, "button");
    }
}
