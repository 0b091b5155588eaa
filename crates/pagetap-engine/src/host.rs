//! The Host trait is the unified interface every capture backend
//! implements: a live CDP browser, or an offline capture file.

use async_trait::async_trait;
use pagetap_core::dom::NodeId;
use pagetap_core::events::PageEvent;
use pagetap_core::page::Page;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("Host not ready")]
    NotReady,

    #[error("Launch error: {0}")]
    Launch(String),

    #[error("Navigation error: {0}")]
    Navigation(String),

    #[error("Capture error: {0}")]
    Capture(String),

    #[error("Script error: {0}")]
    Script(String),

    #[error("Not supported: {0}")]
    NotSupported(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Clone)]
pub struct NavigationResult {
    pub url: String,
    pub title: String,
}

#[async_trait]
pub trait Host: Send + Sync {
    /// Launch the host (start browser, open capture file, ...).
    async fn launch(&mut self) -> Result<(), HostError>;

    /// Close the host and clean up resources.
    async fn close(&mut self) -> Result<(), HostError>;

    /// Check if the host is ready to accept commands.
    async fn is_ready(&self) -> bool;

    async fn navigate(&mut self, url: &str) -> Result<NavigationResult, HostError> {
        let _ = url;
        Err(HostError::NotSupported("navigate".into()))
    }

    /// Mirror the page into a fresh [`Page`] model.
    async fn capture_page(&mut self) -> Result<Page, HostError>;

    /// Resolve a selector in the page, returning an id valid for the most
    /// recent capture.
    async fn select(&mut self, selector: &str) -> Result<Option<NodeId>, HostError>;

    /// Drain raw events collected since the previous call. Elements and
    /// values mirrored after the initial capture are appended to `page`.
    async fn drain_events(&mut self, page: &mut Page) -> Result<Vec<PageEvent>, HostError>;
}
