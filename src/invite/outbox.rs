use chrono::Utc;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use super::message::Invitation;
use super::notifier::{Delivery, NotifyError, Notifier};

/// Writes each message as a JSON file into a directory instead of sending it.
/// Used when no relay is configured.
#[derive(Debug, Clone)]
pub struct OutboxNotifier {
    dir: PathBuf,
}

impl OutboxNotifier {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Notifier for OutboxNotifier {
    async fn send(&self, invitation: &Invitation) -> Result<Delivery, NotifyError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let message_id = format!("{}-{}", Utc::now().format("%Y%m%dT%H%M%S"), Uuid::new_v4());
        let path = self.dir.join(format!("{}.json", message_id));
        let json = serde_json::to_vec_pretty(invitation)?;
        tokio::fs::write(&path, json).await?;

        tracing::info!(to = %invitation.to, path = %path.display(), "message written to outbox");
        Ok(Delivery {
            message_id: Some(message_id),
        })
    }
}
