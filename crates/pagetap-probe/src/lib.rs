/// The page-side mirroring script, injected into browser contexts by hosts.
///
/// The probe only mirrors raw structure (DOM nodes, value-graph nodes, raw
/// events) in the wire shapes `pagetap-core` deserializes; all derivation —
/// selectors, sanitization, framework walking, masking — happens in Rust.
pub const PROBE_JS: &str = include_str!("probe.js");

/// Global the probe installs itself under; also the idempotence sentinel.
pub const PROBE_GLOBAL: &str = "__pagetap";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[allow(clippy::const_is_empty)]
    fn probe_is_embedded() {
        assert!(!PROBE_JS.is_empty());
        assert!(PROBE_JS.contains(PROBE_GLOBAL));
        assert!(PROBE_JS.contains("capture"));
        assert!(PROBE_JS.contains("drain"));
    }
}
