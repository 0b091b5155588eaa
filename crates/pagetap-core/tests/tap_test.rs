use pagetap_common::protocol::LogLevel;
use pagetap_common::value::ValueGraph;
use pagetap_core::tap::{ConsoleCapture, RuntimeTap, TapConfig};

fn session_tap() -> RuntimeTap {
    RuntimeTap::new(TapConfig::session(200, 100))
}

#[test]
fn errors_only_capture_skips_informational_levels() {
    let mut tap = RuntimeTap::new(TapConfig::default());
    let mut graph = ValueGraph::new();
    let msg = graph.string("hello");

    tap.console_event(&graph, LogLevel::Log, &[msg], 1);
    tap.console_event(&graph, LogLevel::Info, &[msg], 2);
    tap.console_event(&graph, LogLevel::Warn, &[msg], 3);
    tap.console_event(&graph, LogLevel::Error, &[msg], 4);

    let levels: Vec<LogLevel> = tap.console().iter().map(|e| e.level).collect();
    assert_eq!(levels, vec![LogLevel::Warn, LogLevel::Error]);
}

#[test]
fn session_capture_keeps_all_levels() {
    let mut tap = session_tap();
    let mut graph = ValueGraph::new();
    let msg = graph.string("x");
    for level in [
        LogLevel::Log,
        LogLevel::Warn,
        LogLevel::Error,
        LogLevel::Info,
        LogLevel::Debug,
    ] {
        tap.console_event(&graph, level, &[msg], 0);
    }
    assert_eq!(tap.console().len(), 5);
}

#[test]
fn console_arguments_are_sanitized_and_joined() {
    let mut tap = session_tap();
    let mut graph = ValueGraph::new();
    let text = graph.string("failed for");
    let count = graph.number(3.0);
    let user = graph.string("ada");
    let detail = graph.object(vec![("user", user)]);

    tap.console_event(&graph, LogLevel::Error, &[text, count, detail], 10);

    let entry = tap.console().get(0).unwrap();
    assert_eq!(entry.message, r#"failed for 3.0 {"user":"ada"}"#);
    assert_eq!(entry.timestamp_ms, 10);
}

#[test]
fn error_argument_contributes_its_stack() {
    let mut tap = session_tap();
    let mut graph = ValueGraph::new();
    let err = graph.error("TypeError", "boom", Some("at main.js:1"));

    tap.console_event(&graph, LogLevel::Error, &[err], 5);
    let entry = tap.console().get(0).unwrap();
    assert_eq!(entry.stack.as_deref(), Some("at main.js:1"));
    // Session path renders the structured form.
    assert!(entry.message.contains("\"message\":\"boom\""));
}

#[test]
fn rejection_without_reason_still_records() {
    let mut tap = session_tap();
    let graph = ValueGraph::new();
    tap.unhandled_rejection(&graph, None, 9);
    let entry = tap.console().get(0).unwrap();
    assert_eq!(entry.level, LogLevel::Error);
    assert!(entry.message.starts_with("Unhandled rejection:"));
}

#[test]
fn console_ring_evicts_fifo_at_capacity() {
    let mut tap = RuntimeTap::new(TapConfig {
        console_capacity: 5,
        capture: ConsoleCapture::All,
        ..TapConfig::default()
    });
    let mut graph = ValueGraph::new();
    for i in 0..8 {
        let msg = graph.string(format!("m{}", i));
        tap.console_event(&graph, LogLevel::Log, &[msg], i);
    }
    assert_eq!(tap.console().len(), 5);
    assert_eq!(tap.console().get(0).unwrap().message, "m3");
}

#[test]
fn request_lifecycle_builds_one_entry() {
    let mut tap = session_tap();
    tap.request_started("r1", "POST", "https://api.example.com/cart", Some("{}"), 100);
    tap.request_finished("r1", 201, false, 145);

    let entry = tap.network().get(0).unwrap();
    assert_eq!(entry.method, "POST");
    assert_eq!(entry.status, 201);
    assert_eq!(entry.duration_ms, 45);
    assert!(!entry.failed);
    assert_eq!(entry.response_body, None);
}

#[test]
fn failure_classification_covers_transport_and_http() {
    let mut tap = session_tap();
    tap.request_started("a", "GET", "https://x.test/1", None, 0);
    tap.request_finished("a", 500, false, 1);
    tap.request_started("b", "GET", "https://x.test/2", None, 0);
    tap.request_finished("b", 0, true, 1);
    tap.request_started("c", "GET", "https://x.test/3", None, 0);
    tap.request_finished("c", 200, false, 1);

    let failed: Vec<bool> = tap.network().iter().map(|e| e.failed).collect();
    assert_eq!(failed, vec![true, true, false]);
}

#[test]
fn response_body_completes_the_entry_in_place() {
    let mut tap = session_tap();
    tap.request_started("r1", "GET", "https://x.test/data", None, 0);
    tap.request_finished("r1", 200, false, 10);
    assert_eq!(tap.network().get(0).unwrap().response_body, None);

    tap.response_body("r1", "{\"ok\":true}");
    assert_eq!(
        tap.network().get(0).unwrap().response_body.as_deref(),
        Some("{\"ok\":true}")
    );
}

#[test]
fn response_body_after_eviction_is_a_noop() {
    let mut tap = RuntimeTap::new(TapConfig {
        network_capacity: 2,
        ..TapConfig::default()
    });
    for i in 0..3 {
        let id = format!("r{}", i);
        tap.request_started(&id, "GET", &format!("https://x.test/{}", i), None, 0);
        tap.request_finished(&id, 200, false, 1);
    }
    // r0 was evicted by r2.
    tap.response_body("r0", "late");
    assert_eq!(tap.network().len(), 2);
    assert!(tap.network().iter().all(|e| e.response_body.is_none()));
}

#[test]
fn network_ring_is_bounded() {
    let mut tap = RuntimeTap::new(TapConfig {
        network_capacity: 3,
        ..TapConfig::default()
    });
    for i in 0..10 {
        let id = format!("r{}", i);
        tap.request_started(&id, "GET", "https://x.test/", None, 0);
        tap.request_finished(&id, 200, false, 1);
    }
    assert_eq!(tap.network().len(), 3);
    // Oldest surviving entry is the 8th started request.
    assert_eq!(tap.network().get(0).unwrap().seq, 8);
}

#[test]
fn oversized_bodies_and_urls_are_capped() {
    let mut tap = session_tap();
    let long_url = format!("https://x.test/{}", "a".repeat(600));
    let big_body = "b".repeat(6000);
    tap.request_started("r1", "POST", &long_url, Some(&big_body), 0);
    tap.request_finished("r1", 200, false, 1);
    tap.response_body("r1", &big_body);

    let entry = tap.network().get(0).unwrap();
    assert_eq!(entry.url.chars().count(), 500);
    assert_eq!(entry.request_body.as_ref().unwrap().chars().count(), 5000);
    assert_eq!(entry.response_body.as_ref().unwrap().chars().count(), 5000);
}

#[test]
fn take_logs_leaves_the_tap_installed_and_empty() {
    let mut tap = session_tap();
    let mut graph = ValueGraph::new();
    let msg = graph.string("x");
    tap.console_event(&graph, LogLevel::Error, &[msg], 0);
    tap.request_started("r", "GET", "https://x.test", None, 0);
    tap.request_finished("r", 200, false, 1);

    let (console, network) = tap.take_logs();
    assert_eq!(console.len(), 1);
    assert_eq!(network.len(), 1);
    assert_eq!(tap.console().len(), 0);
    assert_eq!(tap.network().len(), 0);

    // Still usable for the next generation.
    tap.console_event(&graph, LogLevel::Error, &[msg], 2);
    assert_eq!(tap.console().len(), 1);
}
