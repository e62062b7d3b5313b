pub mod error;
pub mod state;
pub mod storage;
pub mod types;

pub use error::{StoreError, StoreResult};
pub use state::StoreState;
pub use storage::{get_store_path, load_store, save_store};
pub use types::{
    Comparison, ContentKind, EmailInvite, InviteStatus, PremiumContent, SessionId,
    SessionStatus, TestSession, UserProfile,
};

use crate::quiz::Role;
use uuid::Uuid;

/// Storage collaborator for users, sessions, answers, invites and premium
/// content. Every call returns a tagged result so callers can tell
/// "not found" and "incomplete" apart from real failures.
pub trait SessionStore {
    fn register_user(&mut self, email: &str) -> StoreResult<UserProfile>;

    fn user(&self, email: &str) -> StoreResult<UserProfile>;

    fn set_premium(&mut self, email: &str, premium: bool) -> StoreResult<UserProfile>;

    /// Start a pending session owned by a registered user
    fn create_session(&mut self, owner: &str) -> StoreResult<TestSession>;

    fn session(&self, id: SessionId) -> StoreResult<TestSession>;

    /// Sessions the user owns or joined, newest first
    fn sessions_for(&self, email: &str, limit: usize) -> Vec<TestSession>;

    /// Attach a registered user as the partner. Joining twice is a no-op.
    fn join_session(&mut self, id: SessionId, partner: &str) -> StoreResult<TestSession>;

    /// Record one answer, replacing an earlier value for the same question
    fn record_answer(
        &mut self,
        id: SessionId,
        role: Role,
        question_id: &str,
        value: i32,
    ) -> StoreResult<()>;

    /// Mark a role's answers as final; completes the session once both are in
    fn submit(&mut self, id: SessionId, role: Role) -> StoreResult<SessionStatus>;

    /// Both answer sets of a completed session.
    /// `Incomplete` until both sides have submitted.
    fn comparison(&self, id: SessionId) -> StoreResult<Comparison>;

    fn record_invite(&mut self, invite: EmailInvite) -> StoreResult<()>;

    fn update_invite_status(&mut self, invite_id: Uuid, status: InviteStatus) -> StoreResult<()>;

    fn invites_for(&self, id: SessionId) -> Vec<EmailInvite>;

    fn add_premium_content(&mut self, content: PremiumContent) -> StoreResult<()>;

    /// Premium content, oldest first
    fn premium_content(&self) -> Vec<PremiumContent>;
}

/// Lowercase and trim an email address, rejecting obviously malformed input
pub fn normalize_email(email: &str) -> StoreResult<String> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') && !domain.starts_with('.') => {
            Ok(email)
        }
        _ => Err(StoreError::InvalidEmail(email)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Ada@Example.COM ").unwrap(), "ada@example.com");
        assert!(normalize_email("not-an-email").is_err());
        assert!(normalize_email("@example.com").is_err());
        assert!(normalize_email("a@localhost").is_err());
    }
}
