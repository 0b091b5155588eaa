//! The headless CDP host: probe injection plus evaluation-based capture,
//! selection and event draining.

use crate::cdp::CdpClient;
use async_trait::async_trait;
use pagetap_core::dom::{ElementNode, NodeId};
use pagetap_core::events::PageEvent;
use pagetap_core::page::Page;
use pagetap_common::value::RawValue;
use pagetap_engine::host::{Host, HostError, NavigationResult};
use serde::Deserialize;
use tracing::info;

/// Incremental payload returned by `__pagetap.drain()`.
#[derive(Debug, Deserialize)]
struct DrainPayload {
    #[serde(default)]
    events: Vec<PageEvent>,
    #[serde(default)]
    elements: Vec<ElementNode>,
    #[serde(default)]
    values: Vec<RawValue>,
}

pub struct CdpHost {
    client: Option<CdpClient>,
    visible: bool,
    probe_settings: pagetap_engine::config::ProbeSettings,
}

impl CdpHost {
    pub fn new() -> Self {
        Self::new_with_visibility(false)
    }

    pub fn new_with_visibility(visible: bool) -> Self {
        Self {
            client: None,
            visible,
            probe_settings: pagetap_engine::config::ProbeSettings::default(),
        }
    }

    pub fn with_probe_settings(
        mut self,
        settings: pagetap_engine::config::ProbeSettings,
    ) -> Self {
        self.probe_settings = settings;
        self
    }

    fn client(&self) -> Result<&CdpClient, HostError> {
        self.client.as_ref().ok_or(HostError::NotReady)
    }

    /// Inject the probe unless its sentinel global is already present.
    async fn ensure_probe(&self) -> Result<(), HostError> {
        let client = self.client()?;
        let is_loaded: bool = client
            .page
            .evaluate(format!(
                "typeof window.{} !== 'undefined'",
                pagetap_probe::PROBE_GLOBAL
            ))
            .await
            .map_err(|e| HostError::Script(format!("Failed to check probe status: {}", e)))?
            .into_value()
            .map_err(|e| HostError::Script(format!("Failed to read probe status: {}", e)))?;

        if !is_loaded {
            client
                .page
                .evaluate(pagetap_probe::PROBE_JS)
                .await
                .map_err(|e| HostError::Script(format!("Failed to inject probe: {}", e)))?;

            let configure = format!(
                "window.{}.configure({{max_elements:{},max_value_nodes:{}}})",
                pagetap_probe::PROBE_GLOBAL,
                self.probe_settings.max_elements,
                self.probe_settings.max_value_nodes
            );
            client
                .page
                .evaluate(configure)
                .await
                .map_err(|e| HostError::Script(format!("Failed to configure probe: {}", e)))?;
        }
        Ok(())
    }

    async fn evaluate_json(&self, expression: &str) -> Result<serde_json::Value, HostError> {
        let client = self.client()?;
        client
            .page
            .evaluate(expression.to_string())
            .await
            .map_err(|e| HostError::Script(format!("Evaluation failed: {}", e)))?
            .into_value::<serde_json::Value>()
            .map_err(|e| HostError::Script(format!("Failed to read result: {}", e)))
    }
}

impl Default for CdpHost {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Host for CdpHost {
    async fn launch(&mut self) -> Result<(), HostError> {
        info!("Launching headless host (Chromium)...");
        let client = CdpClient::launch(self.visible)
            .await
            .map_err(|e| HostError::Launch(e.to_string()))?;
        self.client = Some(client);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), HostError> {
        if let Some(client) = self.client.take() {
            client
                .close()
                .await
                .map_err(|e| HostError::Other(e.to_string()))?;
        }
        Ok(())
    }

    async fn is_ready(&self) -> bool {
        self.client.is_some()
    }

    async fn navigate(&mut self, url: &str) -> Result<NavigationResult, HostError> {
        let client = self.client()?;
        info!("Navigating to: {}", url);
        client
            .page
            .goto(url)
            .await
            .map_err(|e| HostError::Navigation(e.to_string()))?;

        let title = client
            .page
            .get_title()
            .await
            .unwrap_or_default()
            .unwrap_or_default();
        let url = client
            .page
            .url()
            .await
            .map_err(|e| HostError::Navigation(e.to_string()))?
            .unwrap_or_default();
        Ok(NavigationResult { url, title })
    }

    async fn capture_page(&mut self) -> Result<Page, HostError> {
        self.ensure_probe().await?;
        let value = self
            .evaluate_json(&format!("window.{}.capture()", pagetap_probe::PROBE_GLOBAL))
            .await?;
        let page: Page = serde_json::from_value(value)?;
        info!(
            elements = page.dom.len(),
            values = page.values.len(),
            "captured page model"
        );
        Ok(page)
    }

    async fn select(&mut self, selector: &str) -> Result<Option<NodeId>, HostError> {
        self.ensure_probe().await?;
        let expression = format!(
            "window.{}.select({})",
            pagetap_probe::PROBE_GLOBAL,
            serde_json::to_string(selector)?
        );
        let value = self.evaluate_json(&expression).await?;
        Ok(value.as_u64().map(|id| NodeId(id as u32)))
    }

    async fn drain_events(&mut self, page: &mut Page) -> Result<Vec<PageEvent>, HostError> {
        self.ensure_probe().await?;
        let value = self
            .evaluate_json(&format!("window.{}.drain()", pagetap_probe::PROBE_GLOBAL))
            .await?;
        let payload: DrainPayload = serde_json::from_value(value)?;
        page.extend_mirrored(payload.elements, payload.values);
        Ok(payload.events)
    }
}
