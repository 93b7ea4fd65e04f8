use chrono::{Duration, Utc};
use tracing::{debug, info, instrument};

use crate::auth::utils::{
    generate_session_token, hash_session_token, session_token_matches, spawn_hash_password,
    spawn_verify_password,
};
use crate::database::commands::{
    create_session, create_user, delete_expired_sessions, delete_session, delete_user,
    delete_user_sessions, update_user, update_user_with_creds,
};
use crate::database::connection::DbConnection;
use crate::database::queries::{get_session, get_user_password, get_user_with_email};
use crate::database::utils::{is_unique_violation, map_not_found_as_none};
use crate::error::{RequestError, SessionError, ValidationError};
use crate::models::session::{NewSession, SessionId};
use crate::models::user::{
    validate_user_avatar, validate_user_email, validate_user_name, validate_user_password,
    CreateUser, SignupPayload, UpdateCredentialsPayload, UpdateProfilePayload, UpdateUser,
    UpdateUserWithCreds, User, UserId,
};

impl DbConnection {
    /// Registers a new account; the email must be well formed and unused.
    #[instrument(skip_all)]
    pub async fn signup(&self, payload: &SignupPayload) -> Result<User, RequestError> {
        let email = payload.email.trim();
        validate_user_email(email)?;
        validate_user_name(&payload.name)?;
        validate_user_password(&payload.password)?;
        if map_not_found_as_none(get_user_with_email(self.pool(), email).await)?.is_some() {
            return Err(ValidationError::EmailTaken.into());
        }
        let user = CreateUser {
            name: payload.name.clone(),
            email: email.to_string(),
            password_hash: spawn_hash_password(payload.password.clone()).await?,
        };
        create_user(self.pool(), &user).await.map_err(|e| {
            // lost a race against a concurrent signup
            if is_unique_violation(&e) {
                ValidationError::EmailTaken.into()
            } else {
                RequestError::from(e)
            }
        })
    }

    /// Checks credentials; unknown email and wrong password look the same.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<User, RequestError> {
        let user = map_not_found_as_none(get_user_with_email(self.pool(), email.trim()).await)?
            .ok_or(RequestError::BadCredentials)?;
        if !spawn_verify_password(password.to_string(), user.password.clone()).await? {
            debug!("password mismatch for user {}", user.id);
            return Err(RequestError::BadCredentials);
        }
        Ok(user)
    }

    pub async fn validate_password(
        &self,
        user_id: UserId,
        password: &str,
    ) -> Result<(), RequestError> {
        let hash = map_not_found_as_none(get_user_password(self.pool(), user_id).await)?
            .ok_or(ValidationError::NotFound)?;
        if spawn_verify_password(password.to_string(), hash).await? {
            Ok(())
        } else {
            Err(RequestError::PasswordMismatch)
        }
    }

    #[instrument(skip(self))]
    pub async fn start_session(
        &self,
        user_id: UserId,
        ttl: Duration,
    ) -> Result<NewSession, RequestError> {
        let session = NewSession {
            session_id: SessionId::new_v4(),
            token: generate_session_token(),
            expires_at: Utc::now() + ttl,
        };
        let token_hash = hash_session_token(&session.token);
        create_session(
            self.pool(),
            &session.session_id,
            user_id,
            &token_hash,
            session.expires_at,
        )
        .await?;
        let purged = delete_expired_sessions(self.pool()).await?;
        if purged > 0 {
            info!("purged {purged} expired sessions");
        }
        Ok(session)
    }

    pub async fn resolve_session(
        &self,
        session_id: &SessionId,
        token: &[u8],
    ) -> Result<UserId, SessionError> {
        let session = get_session(self.pool(), session_id).await?;
        if !session_token_matches(token, &session.token_hash) {
            debug!("session token mismatch for session {session_id}");
            return Err(SessionError::TokenNotFound);
        }
        if session.expires_at <= Utc::now() {
            return Err(SessionError::TokenExpired);
        }
        Ok(session.user_id)
    }

    pub async fn end_session(&self, session_id: &SessionId) -> Result<(), RequestError> {
        delete_session(self.pool(), session_id).await?;
        Ok(())
    }

    #[instrument(skip(self, payload))]
    pub async fn update_profile(
        &self,
        user_id: UserId,
        payload: &UpdateProfilePayload,
    ) -> Result<User, RequestError> {
        validate_user_name(&payload.name)?;
        validate_user_avatar(payload.avatar.as_deref())?;
        let user = UpdateUser {
            user_id,
            name: payload.name.clone(),
            avatar: payload.avatar.clone(),
        };
        Ok(update_user(self.pool(), &user).await?)
    }

    /// Changes email and/or password after re-checking the current password.
    /// Fields left out keep their stored values.
    #[instrument(skip(self, payload))]
    pub async fn update_credentials(
        &self,
        user_id: UserId,
        payload: &UpdateCredentialsPayload,
    ) -> Result<User, RequestError> {
        self.validate_password(user_id, &payload.current_password)
            .await?;
        let current = self
            .get_user_with_id(user_id)
            .await?
            .ok_or(ValidationError::NotFound)?;

        let email = match payload.email.as_deref().map(str::trim) {
            Some(email) => {
                validate_user_email(email)?;
                email.to_string()
            }
            None => current.email,
        };
        let password_hash = match payload.password.as_deref() {
            Some(password) => {
                validate_user_password(password)?;
                spawn_hash_password(password.to_string()).await?
            }
            None => current.password,
        };
        let name = payload.name.clone().unwrap_or(current.name);
        validate_user_name(&name)?;
        let avatar = payload.avatar.clone().or(current.avatar);
        validate_user_avatar(avatar.as_deref())?;

        let password_changed = payload.password.is_some();
        let mut transaction = self.pool().begin().await?;
        let user = update_user_with_creds(
            &mut *transaction,
            &UpdateUserWithCreds {
                user_id,
                email,
                password_hash,
                name,
                avatar,
            },
        )
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ValidationError::EmailTaken.into()
            } else {
                RequestError::from(e)
            }
        })?;
        if password_changed {
            let dropped = delete_user_sessions(&mut *transaction, user_id).await?;
            info!("password changed, dropped {dropped} sessions of user {user_id}");
        }
        transaction.commit().await?;
        Ok(user)
    }

    #[instrument(skip(self))]
    pub async fn delete_account(&self, user_id: UserId) -> Result<(), RequestError> {
        if delete_user(self.pool(), user_id).await? {
            info!("deleted user {user_id}");
            Ok(())
        } else {
            Err(ValidationError::NotFound.into())
        }
    }
}
