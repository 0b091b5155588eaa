//! Shared capture pipelines over any [`Host`]: one-shot element inspection
//! and session recording.

use crate::host::{Host, HostError};
use pagetap_common::protocol::{Report, Session, SessionStatus};
use pagetap_core::instrument::Instrumentation;
use pagetap_core::page::Page;
use pagetap_core::report::build_report;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("Host error: {0}")]
    Host(#[from] HostError),

    #[error("No element matches selector: {0}")]
    ElementNotFound(String),

    #[error("No session tap installed")]
    NoSessionTap,
}

/// Wall-clock milliseconds. Hosts stamp session boundaries with this; the
/// core itself never reads a clock.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Drain pending host events into the instrumentation. Returns the number
/// of events routed.
pub async fn pump<H: Host + ?Sized>(
    host: &mut H,
    instrumentation: &mut Instrumentation,
    page: &mut Page,
) -> Result<usize, HostError> {
    let events = host.drain_events(page).await?;
    let count = events.len();
    for event in &events {
        instrumentation.handle_event(page, event);
    }
    Ok(count)
}

/// One-shot element inspection: capture, select, assemble the report.
pub async fn inspect<H: Host + ?Sized>(
    host: &mut H,
    instrumentation: &mut Instrumentation,
    selector: &str,
    comment: &str,
) -> Result<Report, RunnerError> {
    let mut page = host.capture_page().await?;
    // Fold in whatever console/network activity the host saw so far.
    pump(host, instrumentation, &mut page).await?;

    let node = host
        .select(selector)
        .await?
        .ok_or_else(|| RunnerError::ElementNotFound(selector.to_string()))?;
    // Selection may have mirrored an element beyond the initial capture
    // bound; a second drain appends it to the page model.
    pump(host, instrumentation, &mut page).await?;

    Ok(build_report(&page, node, instrumentation, comment))
}

/// Start a recording generation on the session controller.
pub fn start_session(
    instrumentation: &mut Instrumentation,
    page: &Page,
    session_id: Option<&str>,
    now: u64,
) -> Result<String, RunnerError> {
    let controller = instrumentation.session().ok_or(RunnerError::NoSessionTap)?;
    Ok(controller.start(page, session_id, now).to_string())
}

pub fn session_status(instrumentation: &Instrumentation, now: u64) -> SessionStatus {
    instrumentation
        .session_ref()
        .map(|controller| controller.status(now))
        .unwrap_or_default()
}

pub fn take_snapshot(
    instrumentation: &mut Instrumentation,
    page: &Page,
    label: Option<&str>,
    now: u64,
) -> bool {
    instrumentation
        .session()
        .map(|controller| controller.snapshot(page, label, now))
        .unwrap_or(false)
}

/// Stop the active recording and freeze the session.
pub fn stop_session(instrumentation: &mut Instrumentation, now: u64) -> Option<Session> {
    instrumentation
        .session()
        .and_then(|controller| controller.stop(now))
}
