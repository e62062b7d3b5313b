use serde::Deserialize;
use std::time::Duration;
use tokio_retry::{strategy::ExponentialBackoff, RetryIf};

use super::message::Invitation;
use super::notifier::{Delivery, NotifyError, Notifier};

/// Environment variable holding the relay's bearer token, if it wants one
pub const MAIL_TOKEN_ENV: &str = "COUPLEFIN_MAIL_TOKEN";

/// Body returned by the relay: `{success, messageId}` or `{success, error}`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RelayResponse {
    success: bool,
    #[serde(default)]
    message_id: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Sends invitations by POSTing them as JSON to an HTTP mail relay.
#[derive(Debug, Clone)]
pub struct RelayNotifier {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
}

impl RelayNotifier {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            token: None,
        }
    }

    /// Pick up the bearer token from the environment
    pub fn from_env(url: impl Into<String>) -> Self {
        let token = std::env::var(MAIL_TOKEN_ENV).ok().filter(|t| !t.is_empty());
        Self {
            token,
            ..Self::new(url)
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn post_once(&self, invitation: &Invitation) -> Result<Delivery, NotifyError> {
        let mut request = self
            .client
            .post(&self.url)
            .header("User-Agent", "couplefin")
            .json(invitation);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        let status = response.status();
        let body: Option<RelayResponse> = response.json().await.ok();

        if status.is_server_error() {
            let detail = body
                .and_then(|b| b.error)
                .unwrap_or_else(|| status.to_string());
            return Err(NotifyError::Transport(detail));
        }
        if !status.is_success() {
            let detail = body
                .and_then(|b| b.error)
                .unwrap_or_else(|| status.to_string());
            return Err(NotifyError::Rejected(detail));
        }

        match body {
            Some(RelayResponse {
                success: true,
                message_id,
                ..
            }) => Ok(Delivery { message_id }),
            Some(RelayResponse { error, .. }) => Err(NotifyError::Rejected(
                error.unwrap_or_else(|| "relay reported failure".to_string()),
            )),
            None => Err(NotifyError::Rejected(
                "relay returned an unreadable response".to_string(),
            )),
        }
    }
}

impl Notifier for RelayNotifier {
    async fn send(&self, invitation: &Invitation) -> Result<Delivery, NotifyError> {
        // Retry strategy: exponential backoff with 3 attempts, transport failures only
        let retry_strategy = ExponentialBackoff::from_millis(100)
            .max_delay(Duration::from_secs(5))
            .take(3);

        let delivery = RetryIf::spawn(
            retry_strategy,
            || self.post_once(invitation),
            |e: &NotifyError| {
                if e.is_transient() {
                    tracing::warn!(error = %e, "mail relay failed, retrying");
                }
                e.is_transient()
            },
        )
        .await?;

        tracing::info!(to = %invitation.to, message_id = ?delivery.message_id, "message relayed");
        Ok(delivery)
    }
}
