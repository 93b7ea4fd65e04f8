use chrono::{DateTime, Utc};

use crate::auth::token::SessionToken;
use crate::models::user::UserId;

pub type SessionId = sqlx::types::Uuid;

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct ResolveSessionResponse {
    pub user_id: UserId,
    pub token_hash: Vec<u8>,
    pub expires_at: DateTime<Utc>,
}

/// Freshly issued session, the raw token only ever lives in the cookie.
#[derive(Clone, Debug)]
pub struct NewSession {
    pub session_id: SessionId,
    pub token: SessionToken,
    pub expires_at: DateTime<Utc>,
}
