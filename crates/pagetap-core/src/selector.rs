//! A single-compound selector the recorder can both generate and evaluate.
//!
//! This deliberately covers only the grammar the system itself emits:
//! `tag#id.class[attr="value"]:nth-of-type(k)`. Uniqueness verification and
//! offline element selection run against the mirrored DOM with this matcher.

use crate::dom::{Dom, NodeId};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimpleSelector {
    pub tag: Option<String>,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attributes: Vec<(String, String)>,
    pub nth_of_type: Option<usize>,
}

impl SimpleSelector {
    pub fn for_id(id: &str) -> Self {
        Self {
            id: Some(id.to_string()),
            ..Self::default()
        }
    }

    /// Parse one compound selector. Descendant combinators and grammar this
    /// system never generates return `None`.
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if input.is_empty() || input.contains(' ') || input.contains('>') {
            return None;
        }

        let mut selector = SimpleSelector::default();
        let mut chars = input.chars().peekable();
        let mut tag = String::new();
        while let Some(&c) = chars.peek() {
            if c.is_ascii_alphanumeric() || c == '-' {
                tag.push(c);
                chars.next();
            } else {
                break;
            }
        }
        if !tag.is_empty() {
            selector.tag = Some(tag.to_lowercase());
        }

        while let Some(c) = chars.next() {
            match c {
                '#' => {
                    selector.id = Some(take_name(&mut chars));
                }
                '.' => {
                    let class = take_name(&mut chars);
                    if class.is_empty() {
                        return None;
                    }
                    selector.classes.push(class);
                }
                '[' => {
                    let mut body = String::new();
                    for c in chars.by_ref() {
                        if c == ']' {
                            break;
                        }
                        body.push(c);
                    }
                    let (name, value) = body.split_once('=')?;
                    let value = value.trim_matches('"').trim_matches('\'');
                    selector
                        .attributes
                        .push((name.to_string(), value.to_string()));
                }
                ':' => {
                    let rest: String = chars.by_ref().collect();
                    let inner = rest
                        .strip_prefix("nth-of-type(")
                        .and_then(|r| r.strip_suffix(')'))?;
                    selector.nth_of_type = inner.parse().ok();
                    break;
                }
                _ => return None,
            }
        }

        Some(selector)
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        if let Some(tag) = &self.tag {
            out.push_str(tag);
        }
        if let Some(id) = &self.id {
            out.push('#');
            out.push_str(id);
        }
        for class in &self.classes {
            out.push('.');
            out.push_str(class);
        }
        for (name, value) in &self.attributes {
            out.push_str(&format!("[{}=\"{}\"]", name, value));
        }
        if let Some(n) = self.nth_of_type {
            out.push_str(&format!(":nth-of-type({})", n));
        }
        out
    }

    pub fn matches(&self, dom: &Dom, id: NodeId) -> bool {
        let Some(node) = dom.get(id) else {
            return false;
        };
        if let Some(tag) = &self.tag
            && node.tag != *tag
        {
            return false;
        }
        if let Some(want) = &self.id
            && node.id.as_deref() != Some(want.as_str())
        {
            return false;
        }
        for class in &self.classes {
            if !node.classes.iter().any(|c| c == class) {
                return false;
            }
        }
        for (name, value) in &self.attributes {
            if node.attr(name) != Some(value.as_str()) {
                return false;
            }
        }
        if let Some(n) = self.nth_of_type
            && dom.nth_of_type(id) != n
        {
            return false;
        }
        true
    }

    pub fn query_all(&self, dom: &Dom) -> Vec<NodeId> {
        dom.ids().filter(|id| self.matches(dom, *id)).collect()
    }

    pub fn query_first(&self, dom: &Dom) -> Option<NodeId> {
        dom.ids().find(|id| self.matches(dom, *id))
    }
}

fn take_name(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut name = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
            name.push(c);
            chars.next();
        } else {
            break;
        }
    }
    name
}
