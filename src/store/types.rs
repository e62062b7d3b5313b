use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::quiz::{AnswerSet, Role};

pub type SessionId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub email: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_premium: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Pending,
    Completed,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Pending => f.write_str("pending"),
            SessionStatus::Completed => f.write_str("completed"),
        }
    }
}

/// One quiz run shared by the owner and (eventually) a partner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestSession {
    pub id: SessionId,
    pub owner: String,
    pub partner: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub status: SessionStatus,
    #[serde(default)]
    pub answers: AnswerSet,
    #[serde(default)]
    pub partner_answers: AnswerSet,
    pub owner_submitted_at: Option<DateTime<Utc>>,
    pub partner_submitted_at: Option<DateTime<Utc>>,
}

impl TestSession {
    pub fn new(owner: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner,
            partner: None,
            created_at: now,
            updated_at: now,
            status: SessionStatus::Pending,
            answers: AnswerSet::new(),
            partner_answers: AnswerSet::new(),
            owner_submitted_at: None,
            partner_submitted_at: None,
        }
    }

    /// Which side of the session a user answers for, if any
    pub fn role_of(&self, email: &str) -> Option<Role> {
        if self.owner == email {
            Some(Role::Owner)
        } else if self.partner.as_deref() == Some(email) {
            Some(Role::Partner)
        } else {
            None
        }
    }

    pub fn answers_for(&self, role: Role) -> &AnswerSet {
        match role {
            Role::Owner => &self.answers,
            Role::Partner => &self.partner_answers,
        }
    }

    pub(crate) fn answers_for_mut(&mut self, role: Role) -> &mut AnswerSet {
        match role {
            Role::Owner => &mut self.answers,
            Role::Partner => &mut self.partner_answers,
        }
    }

    pub fn submitted_at(&self, role: Role) -> Option<DateTime<Utc>> {
        match role {
            Role::Owner => self.owner_submitted_at,
            Role::Partner => self.partner_submitted_at,
        }
    }

    pub fn is_submitted(&self, role: Role) -> bool {
        self.submitted_at(role).is_some()
    }

    /// First role still owing a submission, owner first
    pub fn waiting_on(&self) -> Option<Role> {
        if !self.is_submitted(Role::Owner) {
            Some(Role::Owner)
        } else if self.partner.is_none() || !self.is_submitted(Role::Partner) {
            Some(Role::Partner)
        } else {
            None
        }
    }
}

/// Both answer sets of a completed session, ready for scoring.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub session_id: SessionId,
    pub self_answers: AnswerSet,
    pub partner_answers: AnswerSet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InviteStatus {
    Pending,
    Sent,
    Failed,
}

impl fmt::Display for InviteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InviteStatus::Pending => f.write_str("pending"),
            InviteStatus::Sent => f.write_str("sent"),
            InviteStatus::Failed => f.write_str("failed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailInvite {
    pub id: Uuid,
    pub session_id: SessionId,
    pub sender_email: String,
    pub recipient_email: String,
    pub status: InviteStatus,
    pub created_at: DateTime<Utc>,
}

impl EmailInvite {
    pub fn new(session_id: SessionId, sender_email: String, recipient_email: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_id,
            sender_email,
            recipient_email,
            status: InviteStatus::Pending,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Pdf,
    Ai,
    Template,
    Ebook,
}

impl ContentKind {
    pub fn label(&self) -> &'static str {
        match self {
            ContentKind::Pdf => "PDF",
            ContentKind::Ai => "AI",
            ContentKind::Template => "Template",
            ContentKind::Ebook => "E-book",
        }
    }
}

impl FromStr for ContentKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(ContentKind::Pdf),
            "ai" => Ok(ContentKind::Ai),
            "template" => Ok(ContentKind::Template),
            "ebook" => Ok(ContentKind::Ebook),
            other => anyhow::bail!("Unknown content type: {} (expected pdf, ai, template, ebook)", other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PremiumContent {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub kind: ContentKind,
    pub url: String,
    pub created_at: DateTime<Utc>,
}
