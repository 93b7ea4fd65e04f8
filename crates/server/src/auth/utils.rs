use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use once_cell::sync::Lazy;
use rand::RngCore;
use regex::Regex;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::auth::token::SessionToken;
use crate::error::RequestError;
use crate::models::session::SessionId;

pub const SESSION_TOKEN_LENGTH: usize = 32;
const SESSION_ID_LENGTH: usize = 16;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^(([^<>()\[\]\\.,;:\s@"]+(\.[^<>()\[\]\\.,;:\s@"]+)*)|(".+"))@((\[[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\])|(([a-zA-Z\-0-9]+\.)+[a-zA-Z]{2,}))$"#,
    )
    .expect("email regex is valid")
});

/// Accepts addresses shaped like `example@example.com`.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Produces an argon2 PHC string (salt included).
pub fn hash_password(password: &str) -> Result<String, RequestError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| RequestError::Internal(format!("password hashing failed: {e}")))
}

pub fn verify_password(password: &str, phc: &str) -> Result<bool, RequestError> {
    let hash = PasswordHash::new(phc)
        .map_err(|e| RequestError::Internal(format!("stored password hash is malformed: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &hash)
        .is_ok())
}

/// Runs `hash_password` on the blocking pool, argon2 is deliberately slow.
pub async fn spawn_hash_password(password: String) -> Result<String, RequestError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| RequestError::Internal(format!("password hashing task failed: {e}")))?
}

/// Runs `verify_password` on the blocking pool.
pub async fn spawn_verify_password(password: String, phc: String) -> Result<bool, RequestError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &phc))
        .await
        .map_err(|e| RequestError::Internal(format!("password check task failed: {e}")))?
}

pub fn generate_session_token() -> SessionToken {
    let mut token = vec![0u8; SESSION_TOKEN_LENGTH];
    rand::thread_rng().fill_bytes(&mut token);
    token
}

pub fn hash_session_token(token: &[u8]) -> [u8; 32] {
    let mut hash = Sha256::new();
    hash.update(token);
    hash.finalize().into()
}

pub fn session_token_matches(token: &[u8], stored_hash: &[u8]) -> bool {
    hash_session_token(token)
        .as_slice()
        .ct_eq(stored_hash)
        .into()
}

pub fn pack_session_id_and_token(session_id: &SessionId, token: &[u8]) -> Vec<u8> {
    let mut packed = Vec::with_capacity(SESSION_ID_LENGTH + token.len());
    packed.extend_from_slice(session_id.as_bytes());
    packed.extend_from_slice(token);
    packed
}

pub fn unpack_session_id_and_token(packed: &[u8]) -> Option<(SessionId, &[u8])> {
    if packed.len() != SESSION_ID_LENGTH + SESSION_TOKEN_LENGTH {
        return None;
    }
    let (sid, token) = packed.split_at(SESSION_ID_LENGTH);
    let sid = SessionId::from_slice(sid).ok()?;
    Some((sid, token))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_format() {
        assert!(is_valid_email("example@example.com"));
        assert!(is_valid_email("first.last@sub.domain.io"));
        assert!(!is_valid_email("example.com"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@example.com"));
    }

    #[test]
    fn password_hash_verifies() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse", &hash).unwrap());
        assert!(!verify_password("battery staple", &hash).unwrap());
    }

    #[tokio::test]
    async fn password_hashing_runs_off_the_runtime() {
        let hash = spawn_hash_password("correct horse".to_string()).await.unwrap();
        assert!(spawn_verify_password("correct horse".to_string(), hash.clone())
            .await
            .unwrap());
        assert!(!spawn_verify_password("battery staple".to_string(), hash)
            .await
            .unwrap());
        assert!(spawn_verify_password("whatever".to_string(), "plaintext".to_string())
            .await
            .is_err());
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(verify_password("whatever", "plaintext").is_err());
    }

    #[test]
    fn session_token_pack_unpack() {
        let sid = SessionId::new_v4();
        let token = generate_session_token();
        let packed = pack_session_id_and_token(&sid, &token);
        let (unpacked_sid, unpacked_token) = unpack_session_id_and_token(&packed).unwrap();
        assert_eq!(unpacked_sid, sid);
        assert_eq!(unpacked_token, token.as_slice());
        assert!(unpack_session_id_and_token(&packed[1..]).is_none());
    }

    #[test]
    fn token_hash_comparison() {
        let token = generate_session_token();
        let stored = hash_session_token(&token);
        assert!(session_token_matches(&token, &stored));
        assert!(!session_token_matches(&generate_session_token(), &stored));
        assert!(!session_token_matches(&token, &stored[..16]));
    }
}
