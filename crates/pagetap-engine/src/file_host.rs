//! Offline host: a page capture (JSON) plus an optional event stream
//! (JSONL). Makes every capture pipeline drivable without a browser — in
//! tests, in CI, or against captures exported from another machine.

use crate::host::{Host, HostError, NavigationResult};
use async_trait::async_trait;
use pagetap_core::dom::NodeId;
use pagetap_core::events::PageEvent;
use pagetap_core::page::Page;
use pagetap_core::selector::SimpleSelector;
use std::collections::VecDeque;
use std::path::PathBuf;

pub struct FileHost {
    capture_path: PathBuf,
    events_path: Option<PathBuf>,
    page: Option<Page>,
    events: VecDeque<PageEvent>,
}

impl FileHost {
    pub fn new(capture_path: impl Into<PathBuf>, events_path: Option<PathBuf>) -> Self {
        Self {
            capture_path: capture_path.into(),
            events_path,
            page: None,
            events: VecDeque::new(),
        }
    }
}

#[async_trait]
impl Host for FileHost {
    async fn launch(&mut self) -> Result<(), HostError> {
        let raw = tokio::fs::read_to_string(&self.capture_path).await?;
        let page: Page = serde_json::from_str(&raw)?;
        tracing::info!(
            elements = page.dom.len(),
            values = page.values.len(),
            "loaded page capture from {}",
            self.capture_path.display()
        );
        self.page = Some(page);

        if let Some(events_path) = &self.events_path {
            let raw = tokio::fs::read_to_string(events_path).await?;
            for (line_no, line) in raw.lines().enumerate() {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match serde_json::from_str::<PageEvent>(line) {
                    Ok(event) => self.events.push_back(event),
                    Err(err) => {
                        tracing::warn!("skipping malformed event on line {}: {}", line_no + 1, err)
                    }
                }
            }
            tracing::info!(count = self.events.len(), "loaded event stream");
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<(), HostError> {
        self.page = None;
        self.events.clear();
        Ok(())
    }

    async fn is_ready(&self) -> bool {
        self.page.is_some()
    }

    async fn navigate(&mut self, _url: &str) -> Result<NavigationResult, HostError> {
        let page = self.page.as_ref().ok_or(HostError::NotReady)?;
        Ok(NavigationResult {
            url: page.url.clone(),
            title: page.title.clone(),
        })
    }

    async fn capture_page(&mut self) -> Result<Page, HostError> {
        self.page.clone().ok_or(HostError::NotReady)
    }

    async fn select(&mut self, selector: &str) -> Result<Option<NodeId>, HostError> {
        let page = self.page.as_ref().ok_or(HostError::NotReady)?;
        let parsed = SimpleSelector::parse(selector)
            .ok_or_else(|| HostError::Capture(format!("unsupported selector: {}", selector)))?;
        Ok(parsed.query_first(&page.dom))
    }

    async fn drain_events(&mut self, _page: &mut Page) -> Result<Vec<PageEvent>, HostError> {
        if self.page.is_none() {
            return Err(HostError::NotReady);
        }
        Ok(std::mem::take(&mut self.events).into_iter().collect())
    }
}
