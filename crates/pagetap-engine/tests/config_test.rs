use pagetap_engine::config::{ConfigLoader, PagetapConfig};
use std::io::Write;

#[test]
fn defaults_match_the_documented_caps() {
    let config = PagetapConfig::default();
    assert_eq!(config.sanitize.max_depth, 3);
    assert_eq!(config.sanitize.max_string_len, 200);
    assert_eq!(config.sanitize.max_object_keys, 20);
    assert_eq!(config.buffers.console, 200);
    assert_eq!(config.buffers.network, 100);
    assert_eq!(config.buffers.interactions, 500);
    assert_eq!(config.buffers.snapshots, 50);
    assert_eq!(config.buffers.storage_value_cap, 1000);
    assert_eq!(config.recorder.input_debounce_ms, 500);
    assert_eq!(config.recorder.scroll_throttle_ms, 1000);
}

#[tokio::test]
async fn partial_yaml_overrides_only_named_fields() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "sanitize:\n  max_depth: 5\nrecorder:\n  sensitive_fields: [\"iban\"]\n"
    )
    .unwrap();

    let config = ConfigLoader::load_from(file.path()).await.unwrap();
    assert_eq!(config.sanitize.max_depth, 5);
    assert_eq!(config.sanitize.max_string_len, 200);
    assert_eq!(config.recorder.sensitive_fields, vec!["iban".to_string()]);
    assert_eq!(config.buffers.console, 200);
}

#[tokio::test]
async fn malformed_yaml_is_a_parse_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "buffers: [not, a, map]").unwrap();
    assert!(ConfigLoader::load_from(file.path()).await.is_err());
}

#[test]
fn instrument_config_carries_the_overrides() {
    let mut config = PagetapConfig::default();
    config.buffers.interactions = 25;
    config.recorder.input_debounce_ms = 120;

    let instrument = config.instrument_config();
    assert_eq!(instrument.session.interaction_capacity, 25);
    assert_eq!(instrument.session.recorder.input_debounce_ms, 120);
    // The session tap keeps structured errors regardless of overrides.
    assert_eq!(
        instrument.session.tap.sanitize.error_style,
        pagetap_common::sanitize::ErrorStyle::Structured
    );
}
