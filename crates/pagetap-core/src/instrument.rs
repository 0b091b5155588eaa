//! Page-context instrumentation: one always-on tap plus at most one session
//! controller per generation, with explicit install-once semantics.
//!
//! The original relied on ambient page globals and sentinel flags; here the
//! same idempotence is carried by an explicit context object owned by the
//! caller.

use crate::events::PageEvent;
use crate::page::Page;
use crate::session::{SessionConfig, SessionController};
use crate::tap::{RuntimeTap, TapConfig};

#[derive(Debug, Clone, Default)]
pub struct InstrumentConfig {
    pub always_on: TapConfig,
    pub session: SessionConfig,
}

pub struct Instrumentation {
    config: InstrumentConfig,
    always_on: Option<RuntimeTap>,
    session: Option<SessionController>,
    missing_session_warned: bool,
}

impl Instrumentation {
    pub fn new(config: InstrumentConfig) -> Self {
        Self {
            config,
            always_on: None,
            session: None,
            missing_session_warned: false,
        }
    }

    /// Install the unconditional errors/warnings + network tap. Idempotent:
    /// a second install keeps the existing buffers.
    pub fn install_always_on(&mut self) {
        if self.always_on.is_some() {
            tracing::debug!("always-on tap already installed");
            return;
        }
        self.always_on = Some(RuntimeTap::new(self.config.always_on.clone()));
    }

    /// Install the session tap (controller). Idempotent like the always-on
    /// variant.
    pub fn install_session_tap(&mut self) {
        if self.session.is_some() {
            tracing::debug!("session tap already installed");
            return;
        }
        self.session = Some(SessionController::new(self.config.session.clone()));
    }

    pub fn always_on(&self) -> Option<&RuntimeTap> {
        self.always_on.as_ref()
    }

    pub fn session(&mut self) -> Option<&mut SessionController> {
        self.session.as_mut()
    }

    pub fn session_ref(&self) -> Option<&SessionController> {
        self.session.as_ref()
    }

    /// Route one raw event to every installed tap. The always-on tap sees
    /// console/network activity regardless of session state; the session
    /// controller applies its own recording gate. Interactions without a
    /// session tap are a warn-once no-op.
    pub fn handle_event(&mut self, page: &Page, event: &PageEvent) {
        if let Some(tap) = self.always_on.as_mut() {
            match event {
                PageEvent::Console {
                    level,
                    args,
                    timestamp_ms,
                } => tap.console_event(&page.values, *level, args, *timestamp_ms),
                PageEvent::PageError {
                    message,
                    stack,
                    timestamp_ms,
                } => tap.page_error(message, stack.as_deref(), *timestamp_ms),
                PageEvent::UnhandledRejection {
                    reason,
                    timestamp_ms,
                } => tap.unhandled_rejection(&page.values, *reason, *timestamp_ms),
                PageEvent::RequestStarted {
                    id,
                    method,
                    url,
                    request_body,
                    timestamp_ms,
                } => tap.request_started(id, method, url, request_body.as_deref(), *timestamp_ms),
                PageEvent::RequestFinished {
                    id,
                    status,
                    transport_error,
                    timestamp_ms,
                } => tap.request_finished(id, *status, *transport_error, *timestamp_ms),
                PageEvent::ResponseBody { id, body } => tap.response_body(id, body),
                PageEvent::Dom(_) => {}
            }
        }

        match self.session.as_mut() {
            Some(session) => session.handle_event(page, event),
            None => {
                if matches!(event, PageEvent::Dom(_)) && !self.missing_session_warned {
                    tracing::warn!(
                        "interaction event received but no session tap installed; ignoring"
                    );
                    self.missing_session_warned = true;
                }
            }
        }
    }
}
