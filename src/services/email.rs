use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;

use crate::config::EmailSettings;

/// Errors that can occur when talking to the email provider
#[derive(Debug, Error)]
pub enum EmailError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {status} {body}")]
    ApiError { status: u16, body: String },

    #[error("Unauthorized: invalid API key")]
    Unauthorized,
}

/// Email capabilities the engine relies on; every method is declared here
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Tell a proposer their proposal was accepted
    async fn send_proposal_accepted(
        &self,
        to: &str,
        proposer_name: &str,
        recipient_name: &str,
    ) -> Result<(), EmailError>;
}

#[derive(Debug, Serialize)]
struct OutgoingEmail<'a> {
    from: &'a str,
    to: &'a str,
    subject: String,
    text: String,
}

/// Transactional email client for a JSON HTTP API
///
/// Posts `{from, to, subject, text}` to `{base_url}/emails` with a bearer key.
pub struct HttpEmailClient {
    base_url: String,
    api_key: String,
    from_address: String,
    client: Client,
}

impl HttpEmailClient {
    pub fn new(
        base_url: String,
        api_key: String,
        from_address: String,
        timeout_secs: u64,
    ) -> Result<Self, EmailError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            base_url,
            api_key,
            from_address,
            client,
        })
    }

    pub fn from_settings(settings: &EmailSettings) -> Result<Self, EmailError> {
        Self::new(
            settings.api_url.clone(),
            settings.api_key.clone(),
            settings.from_address.clone(),
            settings.timeout_secs,
        )
    }

    async fn send(&self, email: &OutgoingEmail<'_>) -> Result<(), EmailError> {
        let url = format!("{}/emails", self.base_url.trim_end_matches('/'));

        tracing::debug!("Sending email to {} via {}", email.to, url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(email)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(EmailError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmailError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}

#[async_trait]
impl EmailSender for HttpEmailClient {
    async fn send_proposal_accepted(
        &self,
        to: &str,
        proposer_name: &str,
        recipient_name: &str,
    ) -> Result<(), EmailError> {
        let email = OutgoingEmail {
            from: &self.from_address,
            to,
            subject: format!("{} accepted your proposal", recipient_name),
            text: format!(
                "Dear {},\n\nGreat news! {} has said yes to your proposal. \
                 Log in to take the next step together.",
                proposer_name, recipient_name
            ),
        };
        self.send(&email).await
    }
}
