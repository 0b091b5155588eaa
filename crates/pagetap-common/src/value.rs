use serde::{Deserialize, Serialize};

/// Index of a node in a [`ValueGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValueId(pub u32);

/// One mirrored runtime value. Containers reference other nodes by id, so the
/// graph can represent the cycles that framework internals are full of.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RawValue {
    Null,
    Undefined,
    Bool {
        value: bool,
    },
    Number {
        value: f64,
    },
    Str {
        value: String,
    },
    Function {
        #[serde(default)]
        name: Option<String>,
    },
    Date {
        iso: String,
    },
    Regexp {
        source: String,
    },
    Error {
        name: String,
        message: String,
        #[serde(default)]
        stack: Option<String>,
    },
    Element {
        tag: String,
    },
    Array {
        items: Vec<ValueId>,
    },
    Object {
        entries: Vec<ObjectEntry>,
    },
}

/// A key/slot pair. Entry order is the source enumeration order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectEntry {
    pub key: String,
    #[serde(flatten)]
    pub slot: PropertySlot,
}

/// Reading a property either yields a value or throws (stale framework
/// getters). The mirror records which, so sanitization can substitute a
/// placeholder instead of aborting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "access", rename_all = "snake_case")]
pub enum PropertySlot {
    Ok { value: ValueId },
    Throws,
}

/// Arena of mirrored runtime values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValueGraph {
    nodes: Vec<RawValue>,
}

impl ValueGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: ValueId) -> Option<&RawValue> {
        self.nodes.get(id.0 as usize)
    }

    pub fn push(&mut self, value: RawValue) -> ValueId {
        let id = ValueId(self.nodes.len() as u32);
        self.nodes.push(value);
        id
    }

    /// Append nodes mirrored after the initial capture. Ids assigned by the
    /// probe keep working because the probe and this graph grow in lockstep.
    pub fn extend_mirrored(&mut self, nodes: Vec<RawValue>) {
        self.nodes.extend(nodes);
    }

    pub fn null(&mut self) -> ValueId {
        self.push(RawValue::Null)
    }

    pub fn undefined(&mut self) -> ValueId {
        self.push(RawValue::Undefined)
    }

    pub fn boolean(&mut self, value: bool) -> ValueId {
        self.push(RawValue::Bool { value })
    }

    pub fn number(&mut self, value: f64) -> ValueId {
        self.push(RawValue::Number { value })
    }

    pub fn string(&mut self, value: impl Into<String>) -> ValueId {
        self.push(RawValue::Str {
            value: value.into(),
        })
    }

    pub fn function(&mut self, name: Option<&str>) -> ValueId {
        self.push(RawValue::Function {
            name: name.map(str::to_string),
        })
    }

    pub fn error(&mut self, name: &str, message: &str, stack: Option<&str>) -> ValueId {
        self.push(RawValue::Error {
            name: name.to_string(),
            message: message.to_string(),
            stack: stack.map(str::to_string),
        })
    }

    pub fn array(&mut self, items: Vec<ValueId>) -> ValueId {
        self.push(RawValue::Array { items })
    }

    pub fn object(&mut self, entries: Vec<(&str, ValueId)>) -> ValueId {
        let entries = entries
            .into_iter()
            .map(|(key, value)| ObjectEntry {
                key: key.to_string(),
                slot: PropertySlot::Ok { value },
            })
            .collect();
        self.push(RawValue::Object { entries })
    }

    pub fn empty_object(&mut self) -> ValueId {
        self.push(RawValue::Object {
            entries: Vec::new(),
        })
    }

    /// Set (append or replace) an object entry. Setting an entry to an
    /// earlier id is how tests build cyclic graphs.
    pub fn set_entry(&mut self, object: ValueId, key: &str, value: ValueId) {
        self.set_slot(object, key, PropertySlot::Ok { value });
    }

    /// Mark a property as throwing on read.
    pub fn set_throwing_entry(&mut self, object: ValueId, key: &str) {
        self.set_slot(object, key, PropertySlot::Throws);
    }

    fn set_slot(&mut self, object: ValueId, key: &str, slot: PropertySlot) {
        if let Some(RawValue::Object { entries }) = self.nodes.get_mut(object.0 as usize) {
            if let Some(entry) = entries.iter_mut().find(|e| e.key == key) {
                entry.slot = slot;
            } else {
                entries.push(ObjectEntry {
                    key: key.to_string(),
                    slot,
                });
            }
        }
    }

    /// Look up a readable object entry by key.
    pub fn entry(&self, object: ValueId, key: &str) -> Option<ValueId> {
        match self.get(object)? {
            RawValue::Object { entries } => entries.iter().find(|e| e.key == key).and_then(|e| {
                match e.slot {
                    PropertySlot::Ok { value } => Some(value),
                    PropertySlot::Throws => None,
                }
            }),
            _ => None,
        }
    }

    /// Entry keys of an object node, in enumeration order.
    pub fn entry_keys(&self, object: ValueId) -> Vec<&str> {
        match self.get(object) {
            Some(RawValue::Object { entries }) => entries.iter().map(|e| e.key.as_str()).collect(),
            _ => Vec::new(),
        }
    }

    pub fn string_value(&self, id: ValueId) -> Option<&str> {
        match self.get(id)? {
            RawValue::Str { value } => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn number_value(&self, id: ValueId) -> Option<f64> {
        match self.get(id)? {
            RawValue::Number { value } => Some(*value),
            _ => None,
        }
    }

    pub fn is_function(&self, id: ValueId) -> bool {
        matches!(self.get(id), Some(RawValue::Function { .. }))
    }

    pub fn is_object(&self, id: ValueId) -> bool {
        matches!(self.get(id), Some(RawValue::Object { .. }))
    }
}
