pub mod message;
pub mod notifier;
pub mod outbox;
pub mod relay;

pub use message::{
    compose_invitation, compose_test_message, invite_link, whatsapp_share_url, whatsapp_text,
    Invitation,
};
pub use notifier::{Delivery, NotifyError, Notifier};
pub use outbox::OutboxNotifier;
pub use relay::{RelayNotifier, MAIL_TOKEN_ENV};

use std::path::Path;

use crate::config::MailConfig;

/// The notifier selected by configuration
#[derive(Debug, Clone)]
pub enum MailTransport {
    Relay(RelayNotifier),
    Outbox(OutboxNotifier),
}

impl MailTransport {
    /// A relay URL wins; otherwise messages land in the configured outbox,
    /// or `outbox/` under the data directory.
    pub fn from_config(mail: Option<&MailConfig>, data_dir: &Path) -> Self {
        match mail {
            Some(MailConfig {
                relay_url: Some(url),
                ..
            }) => MailTransport::Relay(RelayNotifier::from_env(url.clone())),
            Some(MailConfig {
                outbox: Some(dir), ..
            }) => MailTransport::Outbox(OutboxNotifier::new(dir.clone())),
            _ => MailTransport::Outbox(OutboxNotifier::new(data_dir.join("outbox"))),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            MailTransport::Relay(relay) => format!("relay {}", relay.url()),
            MailTransport::Outbox(outbox) => format!("outbox {}", outbox.dir().display()),
        }
    }
}

impl Notifier for MailTransport {
    async fn send(&self, invitation: &Invitation) -> Result<Delivery, NotifyError> {
        match self {
            MailTransport::Relay(relay) => relay.send(invitation).await,
            MailTransport::Outbox(outbox) => outbox.send(invitation).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_transport_prefers_relay() {
        let mail = MailConfig {
            relay_url: Some("https://mail.example.com/send".to_string()),
            from: None,
            outbox: Some(PathBuf::from("/tmp/outbox")),
        };
        let transport = MailTransport::from_config(Some(&mail), Path::new("/data"));
        assert!(matches!(transport, MailTransport::Relay(_)));
    }

    #[test]
    fn test_transport_defaults_to_data_dir_outbox() {
        let transport = MailTransport::from_config(None, Path::new("/data"));
        match transport {
            MailTransport::Outbox(outbox) => assert_eq!(outbox.dir(), Path::new("/data/outbox")),
            other => panic!("expected outbox, got {:?}", other),
        }
    }
}
