use anyhow::{anyhow, Result};
use reqwest::Url;
use serde::Serialize;

use crate::store::SessionId;

pub const INVITE_SUBJECT: &str = "CoupleFin - Compatibility Quiz Invitation";
pub const TEST_SUBJECT: &str = "Test Email - CoupleFin";
const WHATSAPP_BASE: &str = "https://wa.me/";

/// A message ready to hand to a notifier. Serializes to the relay's
/// `{to, subject, text}` body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Invitation {
    pub to: String,
    pub subject: String,
    pub text: String,
}

/// Link the partner follows to join a session:
/// `{base_url}/test/partner?sessionId={id}`
pub fn invite_link(base_url: &str, session_id: SessionId) -> Result<Url> {
    let mut url = Url::parse(base_url)?;
    url.path_segments_mut()
        .map_err(|_| anyhow!("Base URL cannot carry a path: {}", base_url))?
        .pop_if_empty()
        .extend(["test", "partner"]);
    url.query_pairs_mut()
        .clear()
        .append_pair("sessionId", &session_id.to_string());
    url.set_fragment(None);
    Ok(url)
}

pub fn compose_invitation(sender: &str, recipient: &str, link: &Url) -> Invitation {
    Invitation {
        to: recipient.to_string(),
        subject: INVITE_SUBJECT.to_string(),
        text: format!(
            "Hello,\n\n{} is inviting you to take the financial compatibility quiz. \
             Follow the link below to join:\n\n{}\n\nBest,\nThe CoupleFin Team",
            sender, link
        ),
    }
}

/// Message sent to the configured sender address to check delivery works
pub fn compose_test_message(to: &str) -> Invitation {
    Invitation {
        to: to.to_string(),
        subject: TEST_SUBJECT.to_string(),
        text: "This is a test email. If you are reading it, sending email works.".to_string(),
    }
}

pub fn whatsapp_text(link: &Url) -> String {
    format!(
        "Hi! I'd like to test our financial compatibility together. \
         Follow this link to join the quiz: {}",
        link
    )
}

/// wa.me share URL with the text percent-encoded
pub fn whatsapp_share_url(text: &str) -> Result<Url> {
    Ok(Url::parse_with_params(WHATSAPP_BASE, &[("text", text)])?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn sample_id() -> SessionId {
        Uuid::parse_str("6f1c2b1e-8d4a-4c3b-9a7e-2f0d1c3b4a5e").unwrap()
    }

    #[test]
    fn test_invite_link_from_origin() {
        let link = invite_link("https://couplefin.app", sample_id()).unwrap();
        assert_eq!(
            link.as_str(),
            "https://couplefin.app/test/partner?sessionId=6f1c2b1e-8d4a-4c3b-9a7e-2f0d1c3b4a5e"
        );
    }

    #[test]
    fn test_invite_link_keeps_base_path() {
        let link = invite_link("https://example.com/quiz/", sample_id()).unwrap();
        assert_eq!(link.path(), "/quiz/test/partner");
    }

    #[test]
    fn test_invite_link_rejects_garbage() {
        assert!(invite_link("not a url", sample_id()).is_err());
        assert!(invite_link("mailto:someone@example.com", sample_id()).is_err());
    }

    #[test]
    fn test_compose_invitation_mentions_sender_and_link() {
        let link = invite_link("https://couplefin.app", sample_id()).unwrap();
        let invitation = compose_invitation("ada@example.com", "bob@example.com", &link);
        assert_eq!(invitation.to, "bob@example.com");
        assert_eq!(invitation.subject, INVITE_SUBJECT);
        assert!(invitation.text.contains("ada@example.com"));
        assert!(invitation.text.contains(link.as_str()));
    }

    #[test]
    fn test_invitation_wire_shape() {
        let invitation = compose_test_message("ada@example.com");
        let json = serde_json::to_value(&invitation).unwrap();
        assert_eq!(json["to"], "ada@example.com");
        assert_eq!(json["subject"], TEST_SUBJECT);
        assert!(json["text"].is_string());
    }

    #[test]
    fn test_whatsapp_url_encodes_text() {
        let url = whatsapp_share_url("hi there & welcome").unwrap();
        assert!(url.as_str().starts_with("https://wa.me/?text="));
        let (key, value) = url.query_pairs().next().unwrap();
        assert_eq!(key, "text");
        assert_eq!(value, "hi there & welcome");
        assert!(!url.as_str().contains(' '));
    }
}
