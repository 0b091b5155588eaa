//! Markdown rendering of reports and sessions.
//!
//! Rendering is deterministic for a given input object: section order and
//! table column order are fixed so exported files can be compared across
//! runs and reimplementations.

use crate::protocol::{
    InteractionDetail, LogEntry, LogLevel, NetworkEntry, Report, Session, Snapshot,
};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use url::Url;

const MAX_FILENAME_COMPONENT_LEN: usize = 40;

/// Render an element report. Section order: header, framework/component,
/// comment, element/selector info, text, styles, props, state,
/// data-attributes, event-listeners, console errors, network table,
/// developer-context.
pub fn render_report(report: &Report) -> String {
    let mut out = String::new();

    out.push_str(&format!("# Element Report: {}\n\n", report.element.short_id));
    out.push_str(&format!("- **URL**: {}\n", report.url));
    out.push_str(&format!("- **Page title**: {}\n", report.page_title));

    out.push_str("\n## Framework\n\n");
    match report.framework.name {
        Some(name) => {
            out.push_str(&format!("- **Framework**: {}", name));
            if let Some(version) = &report.framework.version {
                out.push_str(&format!(" (version {})", version));
            }
            out.push('\n');
        }
        None => out.push_str("- **Framework**: none detected\n"),
    }
    if let Some(name) = &report.component.name {
        out.push_str(&format!("- **Component**: {}\n", name));
    }
    if let Some(file) = &report.component.file {
        out.push_str(&format!("- **Source file**: `{}`\n", file));
    }

    if !report.comment.is_empty() {
        out.push_str("\n## Comment\n\n");
        out.push_str(&report.comment);
        out.push('\n');
    }

    out.push_str("\n## Element\n\n");
    out.push_str(&format!("- **Selector**: `{}`\n", report.element.selector));
    out.push_str(&format!("- **XPath**: `{}`\n", report.element.xpath));
    out.push_str(&format!(
        "- **Position**: ({:.0}, {:.0}) {:.0}x{:.0}\n",
        report.element.rect.x,
        report.element.rect.y,
        report.element.rect.width,
        report.element.rect.height
    ));

    if !report.element.text_content.is_empty() {
        out.push_str("\n## Text\n\n");
        out.push_str(&format!("> {}\n", report.element.text_content));
    }

    if !report.element.computed_styles.is_empty() {
        out.push_str("\n## Computed styles\n\n");
        out.push_str("| Property | Value |\n|---|---|\n");
        for (property, value) in &report.element.computed_styles {
            out.push_str(&format!("| {} | {} |\n", property, value));
        }
    }

    if let Some(props) = &report.component.props {
        out.push_str("\n## Props\n\n```json\n");
        out.push_str(&pretty_json(props));
        out.push_str("\n```\n");
    }

    if let Some(state) = &report.component.state {
        out.push_str("\n## State\n\n```json\n");
        out.push_str(&pretty_json(state));
        out.push_str("\n```\n");
    }

    if !report.data_attributes.is_empty() {
        out.push_str("\n## Data attributes\n\n");
        out.push_str("| Attribute | Value |\n|---|---|\n");
        for (name, value) in &report.data_attributes {
            out.push_str(&format!("| {} | {} |\n", name, value));
        }
    }

    if !report.event_listeners.is_empty() {
        out.push_str("\n## Event listeners\n\n");
        for listener in &report.event_listeners {
            out.push_str(&format!("- {}\n", listener));
        }
    }

    out.push_str("\n## Console errors\n\n");
    render_console_table(&mut out, &report.console_errors, 0);

    out.push_str("\n## Network requests\n\n");
    render_network_table(&mut out, &report.network_requests, 0);

    if let Some(context) = &report.developer_context {
        out.push_str("\n## Developer context\n\n```json\n");
        out.push_str(
            &serde_json::to_string_pretty(context).unwrap_or_else(|_| "null".to_string()),
        );
        out.push_str("\n```\n");
    }

    out
}

/// Render a recorded session. Section order: header, comment, chronological
/// timeline, interactions table, console errors, network table plus failed
/// request detail, snapshots.
pub fn render_session(session: &Session, comment: &str) -> String {
    let start = session.start_time_ms;
    let mut out = String::new();

    out.push_str(&format!("# Session Report: {}\n\n", session.session_id));
    out.push_str(&format!("- **URL**: {}\n", session.url));
    out.push_str(&format!("- **Title**: {}\n", session.title));
    out.push_str(&format!("- **Duration**: {} ms\n", session.duration_ms));
    out.push_str(&format!(
        "- **Captured**: {} console, {} network, {} interactions, {} snapshots\n",
        session.console_log.len(),
        session.network_log.len(),
        session.interactions.len(),
        session.snapshots.len()
    ));

    if !comment.is_empty() {
        out.push_str("\n## Comment\n\n");
        out.push_str(comment);
        out.push('\n');
    }

    out.push_str("\n## Timeline\n\n");
    let timeline = build_timeline(session);
    if timeline.is_empty() {
        out.push_str("_no activity_\n");
    }
    for line in &timeline {
        out.push_str(line);
        out.push('\n');
    }

    out.push_str("\n## Interactions\n\n");
    if session.interactions.is_empty() {
        out.push_str("_none_\n");
    } else {
        out.push_str("| Time | Type | Target | Detail |\n|---|---|---|---|\n");
        for entry in &session.interactions {
            out.push_str(&format!(
                "| +{}ms | {} | `{}` | {} |\n",
                entry.timestamp_ms.saturating_sub(start),
                entry.detail.kind(),
                entry.target,
                interaction_detail_text(&entry.detail)
            ));
        }
    }

    out.push_str("\n## Console errors\n\n");
    let errors: Vec<LogEntry> = session
        .console_log
        .iter()
        .filter(|e| e.level == LogLevel::Error)
        .cloned()
        .collect();
    render_console_table(&mut out, &errors, start);

    out.push_str("\n## Network requests\n\n");
    render_network_table(&mut out, &session.network_log, start);

    let failed: Vec<&NetworkEntry> = session.network_log.iter().filter(|e| e.failed).collect();
    if !failed.is_empty() {
        out.push_str("\n### Failed requests\n\n");
        for entry in failed {
            out.push_str(&format!(
                "- `{} {}` → status {}\n",
                entry.method, entry.url, entry.status
            ));
            if let Some(body) = &entry.request_body {
                out.push_str(&format!("  - request body: `{}`\n", body));
            }
            if let Some(body) = &entry.response_body {
                out.push_str(&format!("  - response body: `{}`\n", body));
            }
        }
    }

    if !session.snapshots.is_empty() {
        out.push_str("\n## Snapshots\n");
        for snapshot in &session.snapshots {
            render_snapshot(&mut out, snapshot, start);
        }
    }

    out
}

/// `YYYY-MM-DD-HHMMSS-<sanitized-host>-<tag><-id>.md`
pub fn export_filename(timestamp_ms: u64, url: &str, tag: &str, id: Option<&str>) -> String {
    let stamp = DateTime::<Utc>::from_timestamp_millis(timestamp_ms as i64)
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
        .format("%Y-%m-%d-%H%M%S");

    let host = Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| "page".to_string());

    let mut name = format!(
        "{}-{}-{}",
        stamp,
        sanitize_component(&host),
        sanitize_component(tag)
    );
    if let Some(id) = id.filter(|id| !id.is_empty()) {
        name.push('-');
        name.push_str(&sanitize_component(id));
    }
    name.push_str(".md");
    name
}

/// Lowercase, non-alphanumeric to `-`, collapse repeats, trim, cap length.
fn sanitize_component(input: &str) -> String {
    let mut out = String::new();
    let mut last_dash = true;
    for c in input.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
            last_dash = false;
        } else if !last_dash {
            out.push('-');
            last_dash = true;
        }
        if out.len() >= MAX_FILENAME_COMPONENT_LEN {
            break;
        }
    }
    out.trim_matches('-').to_string()
}

fn pretty_json(value: &impl serde::Serialize) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string())
}

fn render_console_table(out: &mut String, entries: &[LogEntry], start: u64) {
    if entries.is_empty() {
        out.push_str("_none_\n");
        return;
    }
    out.push_str("| Time | Level | Message |\n|---|---|---|\n");
    for entry in entries {
        out.push_str(&format!(
            "| +{}ms | {} | {} |\n",
            entry.timestamp_ms.saturating_sub(start),
            entry.level,
            table_cell(&entry.message)
        ));
    }
}

fn render_network_table(out: &mut String, entries: &[NetworkEntry], start: u64) {
    if entries.is_empty() {
        out.push_str("_none_\n");
        return;
    }
    out.push_str("| Time | Method | URL | Status | Duration | Failed |\n|---|---|---|---|---|---|\n");
    for entry in entries {
        out.push_str(&format!(
            "| +{}ms | {} | {} | {} | {}ms | {} |\n",
            entry.timestamp_ms.saturating_sub(start),
            entry.method,
            table_cell(&entry.url),
            entry.status,
            entry.duration_ms,
            if entry.failed { "yes" } else { "no" }
        ));
    }
}

fn render_snapshot(out: &mut String, snapshot: &Snapshot, start: u64) {
    out.push_str(&format!(
        "\n### {} (+{}ms)\n\n",
        snapshot.label,
        snapshot.timestamp_ms.saturating_sub(start)
    ));
    out.push_str(&format!("- **URL**: {}\n", snapshot.url));
    render_storage_table(out, "localStorage", &snapshot.local_storage);
    render_storage_table(out, "sessionStorage", &snapshot.session_storage);
}

fn render_storage_table(out: &mut String, title: &str, entries: &BTreeMap<String, String>) {
    out.push_str(&format!("\n**{}**\n\n", title));
    if entries.is_empty() {
        out.push_str("_empty_\n");
        return;
    }
    out.push_str("| Key | Value |\n|---|---|\n");
    for (key, value) in entries {
        out.push_str(&format!("| {} | {} |\n", key, table_cell(value)));
    }
}

/// Merge console, network and interaction activity into one chronological
/// list. Ties are broken by category (console, network, interaction) so the
/// output is stable for identical timestamps.
fn build_timeline(session: &Session) -> Vec<String> {
    let start = session.start_time_ms;
    let mut events: Vec<(u64, u8, String)> = Vec::new();

    for entry in &session.console_log {
        events.push((
            entry.timestamp_ms,
            0,
            format!(
                "- +{}ms console/{} — {}",
                entry.timestamp_ms.saturating_sub(start),
                entry.level,
                table_cell(&entry.message)
            ),
        ));
    }
    for entry in &session.network_log {
        events.push((
            entry.timestamp_ms,
            1,
            format!(
                "- +{}ms network {} {} → {}{}",
                entry.timestamp_ms.saturating_sub(start),
                entry.method,
                table_cell(&entry.url),
                entry.status,
                if entry.failed { " (failed)" } else { "" }
            ),
        ));
    }
    for entry in &session.interactions {
        events.push((
            entry.timestamp_ms,
            2,
            format!(
                "- +{}ms interaction {} `{}`",
                entry.timestamp_ms.saturating_sub(start),
                entry.detail.kind(),
                entry.target
            ),
        ));
    }

    events.sort_by_key(|(ts, category, _)| (*ts, *category));
    events.into_iter().map(|(_, _, line)| line).collect()
}

fn interaction_detail_text(detail: &InteractionDetail) -> String {
    match detail {
        InteractionDetail::Click { x, y } | InteractionDetail::DblClick { x, y } => {
            format!("at ({:.0}, {:.0})", x, y)
        }
        InteractionDetail::Input { value } | InteractionDetail::Change { value } => {
            format!("value `{}`", value)
        }
        InteractionDetail::Submit { form_data } => {
            if form_data.is_empty() {
                String::new()
            } else {
                let fields: Vec<String> = form_data
                    .iter()
                    .map(|(k, v)| format!("{}={}", k, v))
                    .collect();
                fields.join(", ")
            }
        }
        InteractionDetail::Scroll { x, y, percent } => {
            format!("to ({:.0}, {:.0}), {}%", x, y, percent)
        }
        InteractionDetail::Navigation { to, method } => format!("{} → {}", method, to),
        InteractionDetail::Keydown { key, modifiers } => {
            if modifiers.is_empty() {
                key.clone()
            } else {
                format!("{}+{}", modifiers.join("+"), key)
            }
        }
        InteractionDetail::ContextMenu { x, y } => format!("at ({:.0}, {:.0})", x, y),
        _ => String::new(),
    }
}

/// Keep multi-line values from breaking the table layout.
fn table_cell(value: &str) -> String {
    value.replace(['\n', '|'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_convention() {
        // 2026-02-03 04:05:06 UTC
        let ts = 1_770_091_506_000u64;
        let name = export_filename(ts, "https://App.Example.com/checkout", "button", Some("submit"));
        assert_eq!(name, "2026-02-03-040506-app-example-com-button-submit.md");
    }

    #[test]
    fn filename_collapses_repeated_separators() {
        assert_eq!(sanitize_component("btn--primary!!x"), "btn-primary-x");
        assert_eq!(sanitize_component("UPPER case"), "upper-case");
    }

    #[test]
    fn filename_without_id_or_host() {
        let name = export_filename(0, "not a url", "div", None);
        assert!(name.starts_with("1970-01-01-000000-page-div"));
        assert!(name.ends_with(".md"));
    }
}
