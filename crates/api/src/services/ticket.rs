//! Ticket rendering service.
//!
//! The ticket payload itself is produced and persisted by the registration
//! workflow; rendering it into an image is delegated. Providers:
//! - `inline`: no rendering happens server-side; clients render the payload
//!   (default).
//! - `http`: POSTs the payload to an external renderer and returns the URL
//!   of the hosted image.

use domain::models::TicketPayload;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::TicketConfig;

/// Errors that can occur while rendering a ticket.
#[derive(Debug, Error)]
pub enum TicketError {
    #[error("Failed to encode ticket payload: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Renderer request failed: {0}")]
    Render(String),

    #[error("Unknown ticket provider: {0}")]
    UnknownProvider(String),
}

/// Response body expected from the external renderer.
#[derive(Debug, Deserialize)]
struct RenderedTicket {
    url: String,
}

/// Service that renders ticket payloads.
#[derive(Clone)]
pub struct TicketService {
    config: Arc<TicketConfig>,
    client: reqwest::Client,
}

impl TicketService {
    /// Creates a new TicketService with the given configuration.
    pub fn new(config: TicketConfig) -> Self {
        Self {
            config: Arc::new(config),
            client: reqwest::Client::new(),
        }
    }

    /// Renders a ticket payload.
    ///
    /// Returns the hosted image URL for the `http` provider and `None` for
    /// `inline`. The registration row is already durable when this runs;
    /// failures surface to the caller but never undo the registration.
    pub async fn render(&self, payload: &TicketPayload) -> Result<Option<String>, TicketError> {
        match self.config.provider.as_str() {
            "inline" => {
                debug!(
                    registration_id = %payload.registration_id,
                    "Ticket issued for client-side rendering"
                );
                Ok(None)
            }
            "http" => self.render_http(payload).await.map(Some),
            provider => Err(TicketError::UnknownProvider(provider.to_string())),
        }
    }

    /// POSTs the payload to the configured renderer and returns the URL it
    /// reports.
    async fn render_http(&self, payload: &TicketPayload) -> Result<String, TicketError> {
        let body = payload.encode()?;

        let response = self
            .client
            .post(&self.config.renderer_url)
            .header("Content-Type", "application/json")
            .timeout(Duration::from_millis(self.config.timeout_ms))
            .body(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TicketError::Render(format!(
                        "renderer timed out after {}ms",
                        self.config.timeout_ms
                    ))
                } else {
                    TicketError::Render(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(TicketError::Render(format!(
                "renderer returned {}: {}",
                status, error_body
            )));
        }

        let rendered: RenderedTicket = response
            .json()
            .await
            .map_err(|e| TicketError::Render(format!("invalid renderer response: {}", e)))?;

        info!(
            registration_id = %payload.registration_id,
            url = %rendered.url,
            "Ticket rendered"
        );

        Ok(rendered.url)
    }
}
