//! Email service for sending registration confirmations.
//!
//! Supports multiple email providers:
//! - `console`: Logs emails to console (development)
//! - `sendgrid`: Uses SendGrid API
//!
//! Sends are fire-and-forget from the registration workflow: a failure here
//! is logged and counted but never fails the registration itself.

use crate::config::EmailConfig;
use metrics::counter;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

/// Errors that can occur during email operations.
#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Email service not configured")]
    NotConfigured,

    #[error("Failed to send email: {0}")]
    SendFailed(String),

    #[error("Provider error: {0}")]
    ProviderError(String),
}

/// Email message to be sent.
#[derive(Debug, Clone)]
pub struct EmailMessage {
    /// Recipient email address
    pub to: String,
    /// Recipient name (optional)
    pub to_name: Option<String>,
    /// Email subject
    pub subject: String,
    /// Plain text body
    pub body_text: String,
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    config: Arc<EmailConfig>,
}

impl EmailService {
    /// Creates a new EmailService with the given configuration.
    pub fn new(config: EmailConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Check if email service is enabled.
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Send an email message.
    pub async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        if !self.config.enabled {
            debug!(
                to = %message.to,
                subject = %message.subject,
                "Email service disabled, skipping send"
            );
            return Ok(());
        }

        let result = match self.config.provider.as_str() {
            "console" => self.send_console(&message).await,
            "sendgrid" => self.send_sendgrid(&message).await,
            provider => {
                error!(provider = %provider, "Unknown email provider");
                Err(EmailError::NotConfigured)
            }
        };

        match &result {
            Ok(()) => {
                counter!("emails_sent_total", "provider" => self.config.provider.clone())
                    .increment(1);
            }
            Err(e) => {
                error!(to = %message.to, error = %e, "Failed to send email");
                counter!("emails_failed_total", "provider" => self.config.provider.clone())
                    .increment(1);
            }
        }

        result
    }

    /// Send a registration confirmation email.
    ///
    /// The body carries everything a participant needs at the door: their
    /// participant ID and the QR payload (plus a hosted ticket link when a
    /// renderer produced one).
    pub async fn send_confirmation(
        &self,
        to_email: &str,
        to_name: &str,
        participant_id: &str,
        event_name: &str,
        qr_payload: &str,
        ticket_url: Option<&str>,
    ) -> Result<(), EmailError> {
        let subject = format!("You're registered - {}", event_name);

        let ticket_line = ticket_url
            .map(|url| format!("\n\nYour ticket: {}", url))
            .unwrap_or_default();

        let body_text = format!(
            r#"Hi {name},

Your registration for {event} is confirmed!

Participant ID: {participant_id}

Show this code at check-in:

{qr_payload}{ticket_line}

See you there,
The {event} Team"#,
            name = to_name,
            event = event_name,
            participant_id = participant_id,
            qr_payload = qr_payload,
            ticket_line = ticket_line,
        );

        let message = EmailMessage {
            to: to_email.to_string(),
            to_name: Some(to_name.to_string()),
            subject,
            body_text,
        };

        self.send(message).await
    }

    /// Console provider - logs email to console (for development).
    async fn send_console(&self, message: &EmailMessage) -> Result<(), EmailError> {
        info!(
            to = %message.to,
            to_name = ?message.to_name,
            subject = %message.subject,
            from = %self.config.sender_email,
            from_name = %self.config.sender_name,
            "📧 Email (console provider)"
        );

        info!(
            body_text = %message.body_text,
            "📧 Email body (plain text)"
        );

        Ok(())
    }

    /// SendGrid provider - sends via SendGrid API.
    async fn send_sendgrid(&self, message: &EmailMessage) -> Result<(), EmailError> {
        if self.config.sendgrid_api_key.is_empty() {
            return Err(EmailError::NotConfigured);
        }

        let client = reqwest::Client::new();

        let mut personalizations = serde_json::json!({
            "to": [{
                "email": message.to
            }]
        });

        if let Some(name) = &message.to_name {
            personalizations["to"][0]["name"] = serde_json::json!(name);
        }

        let body = serde_json::json!({
            "personalizations": [personalizations],
            "from": {
                "email": self.config.sender_email,
                "name": self.config.sender_name
            },
            "subject": message.subject,
            "content": [{
                "type": "text/plain",
                "value": message.body_text
            }]
        });

        let response = client
            .post("https://api.sendgrid.com/v3/mail/send")
            .header(
                "Authorization",
                format!("Bearer {}", self.config.sendgrid_api_key),
            )
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| EmailError::SendFailed(format!("SendGrid request failed: {}", e)))?;

        if response.status().is_success() {
            info!(
                to = %message.to,
                subject = %message.subject,
                "📧 Email sent via SendGrid"
            );
            Ok(())
        } else {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            error!(
                status = %status,
                error = %error_body,
                "SendGrid API error"
            );
            Err(EmailError::ProviderError(format!(
                "SendGrid returned {}: {}",
                status, error_body
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> EmailConfig {
        EmailConfig {
            enabled: true,
            provider: "console".to_string(),
            sendgrid_api_key: String::new(),
            sender_email: "tickets@eventgate.app".to_string(),
            sender_name: "EventGate".to_string(),
        }
    }

    #[test]
    fn test_email_service_creation() {
        let service = EmailService::new(test_config());
        assert!(service.is_enabled());
    }

    #[test]
    fn test_email_service_disabled() {
        let mut config = test_config();
        config.enabled = false;
        let service = EmailService::new(config);
        assert!(!service.is_enabled());
    }

    #[tokio::test]
    async fn test_send_console_email() {
        let service = EmailService::new(test_config());

        let message = EmailMessage {
            to: "user@example.com".to_string(),
            to_name: Some("Test User".to_string()),
            subject: "Test Subject".to_string(),
            body_text: "Test body".to_string(),
        };

        let result = service.send(message).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_send_disabled_silently_succeeds() {
        let mut config = test_config();
        config.enabled = false;
        // Provider would be rejected if the send actually went out
        config.provider = "bogus".to_string();
        let service = EmailService::new(config);

        let message = EmailMessage {
            to: "user@example.com".to_string(),
            to_name: None,
            subject: "Test".to_string(),
            body_text: "Test".to_string(),
        };

        let result = service.send(message).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_unknown_provider_fails() {
        let mut config = test_config();
        config.provider = "ses".to_string();
        let service = EmailService::new(config);

        let message = EmailMessage {
            to: "user@example.com".to_string(),
            to_name: None,
            subject: "Test".to_string(),
            body_text: "Test".to_string(),
        };

        let result = service.send(message).await;
        assert!(matches!(result, Err(EmailError::NotConfigured)));
    }

    #[tokio::test]
    async fn test_sendgrid_without_api_key_fails() {
        let mut config = test_config();
        config.provider = "sendgrid".to_string();
        let service = EmailService::new(config);

        let message = EmailMessage {
            to: "user@example.com".to_string(),
            to_name: None,
            subject: "Test".to_string(),
            body_text: "Test".to_string(),
        };

        let result = service.send(message).await;
        assert!(matches!(result, Err(EmailError::NotConfigured)));
    }

    #[tokio::test]
    async fn test_send_confirmation_includes_participant_details() {
        let service = EmailService::new(test_config());

        let result = service
            .send_confirmation(
                "user@example.com",
                "Test User",
                "TS42",
                "Tech Summit",
                "EG1:abc123",
                Some("https://tickets.example.com/abc.png"),
            )
            .await;

        assert!(result.is_ok());
    }
}
