use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::error::{StoreError, StoreResult};
use super::types::{
    Comparison, EmailInvite, InviteStatus, PremiumContent, SessionId, SessionStatus,
    TestSession, UserProfile,
};
use super::{normalize_email, SessionStore};
use crate::quiz::Role;

pub const STORE_VERSION: u32 = 1;

/// In-memory store contents. Persisted as a single JSON document by
/// [`super::storage`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreState {
    pub version: u32,
    #[serde(default)]
    pub users: BTreeMap<String, UserProfile>,
    #[serde(default)]
    pub sessions: BTreeMap<SessionId, TestSession>,
    #[serde(default)]
    pub invites: Vec<EmailInvite>,
    #[serde(default)]
    pub premium_content: Vec<PremiumContent>,
}

impl Default for StoreState {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreState {
    pub fn new() -> Self {
        Self {
            version: STORE_VERSION,
            users: BTreeMap::new(),
            sessions: BTreeMap::new(),
            invites: Vec::new(),
            premium_content: Vec::new(),
        }
    }

    fn registered(&self, email: &str) -> StoreResult<String> {
        let email = normalize_email(email)?;
        if self.users.contains_key(&email) {
            Ok(email)
        } else {
            Err(StoreError::UserNotFound(email))
        }
    }

    fn session_mut(&mut self, id: SessionId) -> StoreResult<&mut TestSession> {
        self.sessions
            .get_mut(&id)
            .ok_or(StoreError::SessionNotFound(id))
    }
}

impl SessionStore for StoreState {
    fn register_user(&mut self, email: &str) -> StoreResult<UserProfile> {
        let email = normalize_email(email)?;
        if self.users.contains_key(&email) {
            return Err(StoreError::AlreadyRegistered(email));
        }
        let profile = UserProfile {
            email: email.clone(),
            created_at: Utc::now(),
            is_premium: false,
        };
        self.users.insert(email, profile.clone());
        Ok(profile)
    }

    fn user(&self, email: &str) -> StoreResult<UserProfile> {
        let email = self.registered(email)?;
        Ok(self.users[&email].clone())
    }

    fn set_premium(&mut self, email: &str, premium: bool) -> StoreResult<UserProfile> {
        let email = self.registered(email)?;
        let profile = self
            .users
            .get_mut(&email)
            .ok_or_else(|| StoreError::UserNotFound(email.clone()))?;
        profile.is_premium = premium;
        Ok(profile.clone())
    }

    fn create_session(&mut self, owner: &str) -> StoreResult<TestSession> {
        let owner = self.registered(owner)?;
        let session = TestSession::new(owner);
        self.sessions.insert(session.id, session.clone());
        Ok(session)
    }

    fn session(&self, id: SessionId) -> StoreResult<TestSession> {
        self.sessions
            .get(&id)
            .cloned()
            .ok_or(StoreError::SessionNotFound(id))
    }

    fn sessions_for(&self, email: &str, limit: usize) -> Vec<TestSession> {
        let Ok(email) = normalize_email(email) else {
            return Vec::new();
        };
        let mut sessions: Vec<TestSession> = self
            .sessions
            .values()
            .filter(|s| s.role_of(&email).is_some())
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        sessions.truncate(limit);
        sessions
    }

    fn join_session(&mut self, id: SessionId, partner: &str) -> StoreResult<TestSession> {
        let partner = self.registered(partner)?;
        let session = self.session_mut(id)?;

        match session.partner.as_deref() {
            Some(existing) if existing == partner => return Ok(session.clone()),
            Some(_) => return Err(StoreError::PartnerTaken(id)),
            None => {}
        }
        if session.owner == partner {
            return Err(StoreError::Unauthorized {
                email: partner,
                session: id,
            });
        }

        session.partner = Some(partner);
        session.updated_at = Utc::now();
        Ok(session.clone())
    }

    fn record_answer(
        &mut self,
        id: SessionId,
        role: Role,
        question_id: &str,
        value: i32,
    ) -> StoreResult<()> {
        let session = self.session_mut(id)?;
        if session.is_submitted(role) {
            return Err(StoreError::AlreadySubmitted { role });
        }
        session.answers_for_mut(role).insert(question_id, value);
        session.updated_at = Utc::now();
        Ok(())
    }

    fn submit(&mut self, id: SessionId, role: Role) -> StoreResult<SessionStatus> {
        let session = self.session_mut(id)?;
        if session.is_submitted(role) {
            return Err(StoreError::AlreadySubmitted { role });
        }

        let now = Utc::now();
        match role {
            Role::Owner => session.owner_submitted_at = Some(now),
            Role::Partner => session.partner_submitted_at = Some(now),
        }
        session.updated_at = now;
        if session.waiting_on().is_none() {
            session.status = SessionStatus::Completed;
        }
        Ok(session.status)
    }

    fn comparison(&self, id: SessionId) -> StoreResult<Comparison> {
        let session = self
            .sessions
            .get(&id)
            .ok_or(StoreError::SessionNotFound(id))?;

        if let Some(waiting_on) = session.waiting_on() {
            return Err(StoreError::Incomplete {
                session: id,
                waiting_on,
            });
        }

        Ok(Comparison {
            session_id: id,
            self_answers: session.answers.clone(),
            partner_answers: session.partner_answers.clone(),
        })
    }

    fn record_invite(&mut self, invite: EmailInvite) -> StoreResult<()> {
        if !self.sessions.contains_key(&invite.session_id) {
            return Err(StoreError::SessionNotFound(invite.session_id));
        }
        self.invites.push(invite);
        Ok(())
    }

    fn update_invite_status(&mut self, invite_id: Uuid, status: InviteStatus) -> StoreResult<()> {
        let invite = self
            .invites
            .iter_mut()
            .find(|i| i.id == invite_id)
            .ok_or(StoreError::InviteNotFound(invite_id))?;
        invite.status = status;
        Ok(())
    }

    fn invites_for(&self, id: SessionId) -> Vec<EmailInvite> {
        self.invites
            .iter()
            .filter(|i| i.session_id == id)
            .cloned()
            .collect()
    }

    fn add_premium_content(&mut self, content: PremiumContent) -> StoreResult<()> {
        self.premium_content.push(content);
        Ok(())
    }

    fn premium_content(&self) -> Vec<PremiumContent> {
        let mut content = self.premium_content.clone();
        content.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        content
    }
}
