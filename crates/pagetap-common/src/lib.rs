pub mod formatter;
pub mod mask;
pub mod protocol;
pub mod ring;
pub mod sanitize;
pub mod value;

pub use mask::{MASKED_VALUE, SensitiveFieldMatcher};
pub use ring::RingBuffer;
pub use sanitize::{ErrorStyle, SanitizeOptions, SanitizedObject, SanitizedValue, sanitize};
pub use value::{ObjectEntry, PropertySlot, RawValue, ValueGraph, ValueId};
