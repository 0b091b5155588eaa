//! Bounded conversion of mirrored runtime values into JSON-safe data.
//!
//! Every capture path in the system funnels through [`sanitize`]: component
//! props and state, console arguments, rejection reasons. The guarantees are
//! termination on arbitrary (including cyclic) graphs, a hard nesting bound,
//! and a bounded serialized size.

use crate::value::{PropertySlot, RawValue, ValueGraph, ValueId};
use serde::de::{MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

pub const MAX_DEPTH: usize = 3;
pub const MAX_STRING_LEN: usize = 200;
pub const MAX_ARRAY_LEN: usize = 10;
pub const MAX_OBJECT_KEYS: usize = 20;

/// Stack traces inside structured errors get a larger cap than ordinary
/// strings; a stack cut at 200 chars rarely reaches the interesting frame.
const MAX_ERROR_STACK_LEN: usize = 3000;

const DEPTH_PLACEHOLDER: &str = "[max depth]";
const READ_ERROR_PLACEHOLDER: &str = "[Error reading property]";

/// How Error values are rendered. The quick element-inspection path uses the
/// compact tag; session capture keeps name/message/stack. Both are faithful
/// variants of the same capability, selected per call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorStyle {
    #[default]
    Tagged,
    Structured,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SanitizeOptions {
    pub max_depth: usize,
    pub max_string_len: usize,
    pub max_array_len: usize,
    pub max_object_keys: usize,
    pub error_style: ErrorStyle,
}

impl Default for SanitizeOptions {
    fn default() -> Self {
        Self {
            max_depth: MAX_DEPTH,
            max_string_len: MAX_STRING_LEN,
            max_array_len: MAX_ARRAY_LEN,
            max_object_keys: MAX_OBJECT_KEYS,
            error_style: ErrorStyle::Tagged,
        }
    }
}

impl SanitizeOptions {
    pub fn structured_errors() -> Self {
        Self {
            error_style: ErrorStyle::Structured,
            ..Self::default()
        }
    }
}

/// JSON-safe result of sanitization. Object entry order is preserved, which
/// keeps every downstream rendering deterministic.
#[derive(Debug, Clone, PartialEq)]
pub enum SanitizedValue {
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    Array(Vec<SanitizedValue>),
    Object(SanitizedObject),
}

impl SanitizedValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SanitizedValue::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&SanitizedObject> {
        match self {
            SanitizedValue::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Compact single-line rendering used for console messages and report
    /// values. Bare strings stay unquoted; everything else is JSON.
    pub fn render_compact(&self) -> String {
        match self {
            SanitizedValue::Str(s) => s.clone(),
            other => serde_json::to_string(other).unwrap_or_else(|_| "null".to_string()),
        }
    }
}

/// Insertion-ordered string map.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SanitizedObject {
    entries: Vec<(String, SanitizedValue)>,
}

impl SanitizedObject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: SanitizedValue) {
        self.entries.push((key.into(), value));
    }

    pub fn get(&self, key: &str) -> Option<&SanitizedValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SanitizedValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

impl Serialize for SanitizedObject {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl Serialize for SanitizedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SanitizedValue::Null => serializer.serialize_unit(),
            SanitizedValue::Bool(b) => serializer.serialize_bool(*b),
            SanitizedValue::Number(n) => serializer.serialize_f64(*n),
            SanitizedValue::Str(s) => serializer.serialize_str(s),
            SanitizedValue::Array(items) => items.serialize(serializer),
            SanitizedValue::Object(obj) => obj.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for SanitizedValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ValueVisitor;

        impl<'de> Visitor<'de> for ValueVisitor {
            type Value = SanitizedValue;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON value")
            }

            fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
                Ok(SanitizedValue::Null)
            }

            fn visit_none<E: serde::de::Error>(self) -> Result<Self::Value, E> {
                Ok(SanitizedValue::Null)
            }

            fn visit_bool<E: serde::de::Error>(self, v: bool) -> Result<Self::Value, E> {
                Ok(SanitizedValue::Bool(v))
            }

            fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(SanitizedValue::Number(v as f64))
            }

            fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(SanitizedValue::Number(v as f64))
            }

            fn visit_f64<E: serde::de::Error>(self, v: f64) -> Result<Self::Value, E> {
                Ok(SanitizedValue::Number(v))
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(SanitizedValue::Str(v.to_string()))
            }

            fn visit_string<E: serde::de::Error>(self, v: String) -> Result<Self::Value, E> {
                Ok(SanitizedValue::Str(v))
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut items = Vec::new();
                while let Some(item) = seq.next_element()? {
                    items.push(item);
                }
                Ok(SanitizedValue::Array(items))
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut object = SanitizedObject::new();
                while let Some((key, value)) = map.next_entry::<String, SanitizedValue>()? {
                    object.insert(key, value);
                }
                Ok(SanitizedValue::Object(object))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}

impl<'de> Deserialize<'de> for SanitizedObject {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match SanitizedValue::deserialize(deserializer)? {
            SanitizedValue::Object(obj) => Ok(obj),
            _ => Err(serde::de::Error::custom("expected an object")),
        }
    }
}

/// Cap a string at `max` characters *including* the ellipsis, so re-running
/// the cap on its own output is a no-op.
pub fn truncate_chars(input: &str, max: usize) -> String {
    if input.chars().count() <= max {
        return input.to_string();
    }
    let keep = max.saturating_sub(3);
    let mut out: String = input.chars().take(keep).collect();
    out.push_str("...");
    out
}

/// Sanitize the value at `id`. Never fails; anything unrepresentable becomes
/// a tagged placeholder string.
pub fn sanitize(graph: &ValueGraph, id: ValueId, opts: &SanitizeOptions) -> SanitizedValue {
    sanitize_at(graph, id, opts.max_depth, opts)
}

fn sanitize_at(
    graph: &ValueGraph,
    id: ValueId,
    depth: usize,
    opts: &SanitizeOptions,
) -> SanitizedValue {
    // The depth check is the cycle-breaker. There is no visited-set: the
    // recursion is bounded by depth alone, plus the per-level key and array
    // caps, which together bound total fan-out.
    if depth == 0 {
        return SanitizedValue::Str(DEPTH_PLACEHOLDER.to_string());
    }

    let Some(node) = graph.get(id) else {
        return SanitizedValue::Null;
    };

    match node {
        RawValue::Null | RawValue::Undefined => SanitizedValue::Null,
        RawValue::Bool { value } => SanitizedValue::Bool(*value),
        RawValue::Number { value } => SanitizedValue::Number(*value),
        RawValue::Str { value } => {
            SanitizedValue::Str(truncate_chars(value, opts.max_string_len))
        }
        RawValue::Function { name } => SanitizedValue::Str(format!(
            "[Function: {}]",
            name.as_deref().filter(|n| !n.is_empty()).unwrap_or("anonymous")
        )),
        RawValue::Date { iso } => SanitizedValue::Str(iso.clone()),
        RawValue::Regexp { source } => SanitizedValue::Str(source.clone()),
        RawValue::Error {
            name,
            message,
            stack,
        } => match opts.error_style {
            ErrorStyle::Tagged => SanitizedValue::Str(format!(
                "[Error: {}]",
                truncate_chars(message, opts.max_string_len)
            )),
            ErrorStyle::Structured => {
                let mut obj = SanitizedObject::new();
                obj.insert("name", SanitizedValue::Str(name.clone()));
                obj.insert(
                    "message",
                    SanitizedValue::Str(truncate_chars(message, opts.max_string_len)),
                );
                obj.insert(
                    "stack",
                    match stack {
                        Some(s) => {
                            SanitizedValue::Str(truncate_chars(s, MAX_ERROR_STACK_LEN))
                        }
                        None => SanitizedValue::Null,
                    },
                );
                SanitizedValue::Object(obj)
            }
        },
        RawValue::Element { tag } => {
            SanitizedValue::Str(format!("[Element: {}]", tag.to_lowercase()))
        }
        RawValue::Array { items } => {
            if items.len() > opts.max_array_len {
                SanitizedValue::Str(format!("[Array({})]", items.len()))
            } else {
                SanitizedValue::Array(
                    items
                        .iter()
                        .map(|item| sanitize_at(graph, *item, depth - 1, opts))
                        .collect(),
                )
            }
        }
        RawValue::Object { entries } => {
            let mut out = SanitizedObject::new();
            let mut omitted = 0usize;
            for entry in entries {
                // Double-underscore and double-dollar keys mark
                // framework/engine internals, the primary cycle source.
                if entry.key.starts_with("__") || entry.key.starts_with("$$") {
                    continue;
                }
                if out.len() >= opts.max_object_keys {
                    omitted += 1;
                    continue;
                }
                match entry.slot {
                    PropertySlot::Ok { value } => {
                        out.insert(&entry.key, sanitize_at(graph, value, depth - 1, opts));
                    }
                    PropertySlot::Throws => {
                        out.insert(&entry.key, SanitizedValue::Str(READ_ERROR_PLACEHOLDER.into()));
                    }
                }
            }
            if omitted > 0 {
                out.insert("...", SanitizedValue::Number(omitted as f64));
            }
            SanitizedValue::Object(out)
        }
    }
}
