use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::{async_trait, RequestPartsExt};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::prelude::BASE64_STANDARD as BASE64;
use base64::Engine;
use serde::Serialize;
use time::OffsetDateTime;
use tracing::debug;

use crate::auth::utils::{pack_session_id_and_token, unpack_session_id_and_token};
use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::models::session::{NewSession, SessionId};
use crate::models::user::UserId;
use crate::server::state::AppState;

pub type SessionToken = Vec<u8>;

#[derive(Debug, Serialize)]
pub struct Claims {
    pub user_id: UserId,
}

/// Splits a session cookie value back into session id and raw token.
pub fn decode_session_cookie(value: &str) -> Result<(SessionId, Vec<u8>), SessionError> {
    let packed = BASE64.decode(value).map_err(|_| {
        debug!("malformed session cookie: not base64");
        SessionError::BadToken
    })?;
    let (sid, token) = unpack_session_id_and_token(&packed).ok_or_else(|| {
        debug!("malformed session cookie: unable to unpack");
        SessionError::BadToken
    })?;
    Ok((sid, token.to_vec()))
}

pub fn encode_session_cookie(session: &NewSession) -> String {
    BASE64.encode(pack_session_id_and_token(
        &session.session_id,
        &session.token,
    ))
}

pub fn session_cookie(config: &SessionConfig, session: &NewSession) -> Cookie<'static> {
    Cookie::build((config.cookie_name.clone(), encode_session_cookie(session)))
        .path("/")
        .http_only(true)
        .secure(config.secure)
        .same_site(SameSite::Lax)
        .expires(OffsetDateTime::from_unix_timestamp(session.expires_at.timestamp()).ok())
        .build()
}

pub fn removal_cookie(config: &SessionConfig) -> Cookie<'static> {
    Cookie::build((config.cookie_name.clone(), ""))
        .path("/")
        .build()
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for Claims {
    type Rejection = SessionError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let jar = parts
            .extract::<CookieJar>()
            .await
            .map_err(|_| SessionError::BadToken)?;
        let cookie = jar
            .get(&state.config.session.cookie_name)
            .ok_or(SessionError::BadToken)?;
        let (sid, token) = decode_session_cookie(cookie.value())?;
        let user_id = state.db_connection.resolve_session(&sid, &token).await?;
        Ok(Claims { user_id })
    }
}
