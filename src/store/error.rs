use thiserror::Error;

use super::types::SessionId;
use crate::quiz::Role;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),

    #[error("Session {session} is incomplete: waiting on {waiting_on}")]
    Incomplete {
        session: SessionId,
        waiting_on: Role,
    },

    #[error("User already registered: {0}")]
    AlreadyRegistered(String),

    #[error("Session {0} already has a partner")]
    PartnerTaken(SessionId),

    #[error("Answers for {role} were already submitted")]
    AlreadySubmitted { role: Role },

    #[error("{email} is not part of session {session}")]
    Unauthorized { email: String, session: SessionId },

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("Invite not found: {0}")]
    InviteNotFound(uuid::Uuid),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unsupported store version: {0}")]
    UnsupportedVersion(u32),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
