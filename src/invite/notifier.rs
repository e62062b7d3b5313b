use std::future::Future;
use thiserror::Error;

use super::message::Invitation;

/// Receipt for a delivered message
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Delivery {
    pub message_id: Option<String>,
}

#[derive(Debug, Error)]
pub enum NotifyError {
    /// The relay answered and refused the message
    #[error("Mail relay rejected the message: {0}")]
    Rejected(String),

    /// The relay could not be reached or failed on its side
    #[error("Mail relay unavailable: {0}")]
    Transport(String),

    #[error("Failed to write outbox message: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
}

impl NotifyError {
    /// Whether trying again might succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, NotifyError::Transport(_))
    }
}

/// Outbound delivery of invitations.
pub trait Notifier {
    fn send(
        &self,
        invitation: &Invitation,
    ) -> impl Future<Output = Result<Delivery, NotifyError>> + Send;
}
