use std::sync::Arc;

use axum::extract::State;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use tracing::{debug, info};

use crate::auth::token::{decode_session_cookie, removal_cookie, session_cookie, Claims};
use crate::error::{RequestError, ValidationError};
use crate::models::session::NewSession;
use crate::models::user::{
    LoginPayload, RedirectResponse, SignupPayload, UpdateCredentialsPayload, UpdateProfilePayload,
    UserProfile,
};
use crate::server::extract::{BodyFormat, Payload};
use crate::server::state::AppState;
use crate::views::pages::{login_page, signup_page};

/// Scripts get `{ redirect }` back, plain form posts get a real redirect.
/// A failed form post re-renders its page with the error on it.
fn auth_reply(
    state: &AppState,
    jar: CookieJar,
    format: BodyFormat,
    outcome: Result<NewSession, RequestError>,
    page: fn(Option<&str>) -> String,
) -> Response {
    match (outcome, format) {
        (Ok(session), BodyFormat::Json) => {
            let jar = jar.add(session_cookie(&state.config.session, &session));
            (jar, Json(RedirectResponse::to("/home"))).into_response()
        }
        (Ok(session), BodyFormat::Form) => {
            let jar = jar.add(session_cookie(&state.config.session, &session));
            (jar, Redirect::to("/home")).into_response()
        }
        (Err(e), BodyFormat::Json) => e.into_response(),
        (Err(e), BodyFormat::Form) => {
            let (status, err) = e.status_and_message();
            (status, Html(page(Some(&err)))).into_response()
        }
    }
}

async fn start_login(state: &AppState, payload: &LoginPayload) -> Result<NewSession, RequestError> {
    state.login_throttle.check(&payload.email)?;
    let user = state
        .db_connection
        .login(&payload.email, &payload.password)
        .await?;
    info!("user {} logged in", user.id);
    state
        .db_connection
        .start_session(user.id, state.session_ttl())
        .await
}

async fn start_signup(
    state: &AppState,
    payload: &SignupPayload,
) -> Result<NewSession, RequestError> {
    let user = state.db_connection.signup(payload).await?;
    state
        .db_connection
        .start_session(user.id, state.session_ttl())
        .await
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Payload(payload, format): Payload<LoginPayload>,
) -> Response {
    let outcome = start_login(&state, &payload).await;
    auth_reply(&state, jar, format, outcome, login_page)
}

pub async fn signup(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Payload(payload, format): Payload<SignupPayload>,
) -> Response {
    let outcome = start_signup(&state, &payload).await;
    auth_reply(&state, jar, format, outcome, signup_page)
}

/// Ends the session named by the cookie, if any, and clears the cookie.
/// A stale or unreadable cookie is simply cleared.
async fn end_session(state: &AppState, jar: CookieJar) -> Result<CookieJar, RequestError> {
    if let Some(cookie) = jar.get(&state.config.session.cookie_name) {
        match decode_session_cookie(cookie.value()) {
            Ok((sid, _)) => state.db_connection.end_session(&sid).await?,
            Err(e) => debug!("ignoring unreadable session cookie on logout: {e:?}"),
        }
    }
    Ok(jar.remove(removal_cookie(&state.config.session)))
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<RedirectResponse>), RequestError> {
    let jar = end_session(&state, jar).await?;
    Ok((jar, Json(RedirectResponse::to("/"))))
}

/// The navigation bar's log out button.
pub async fn logout_form(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), RequestError> {
    let jar = end_session(&state, jar).await?;
    Ok((jar, Redirect::to("/")))
}

pub async fn profile(
    State(state): State<Arc<AppState>>,
    claims: Claims,
) -> Result<Json<UserProfile>, RequestError> {
    let user = state
        .db_connection
        .get_user_with_id(claims.user_id)
        .await?
        .ok_or(ValidationError::NotFound)?;
    Ok(Json(user.into()))
}

pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    claims: Claims,
    Payload(payload, _): Payload<UpdateProfilePayload>,
) -> Result<Json<UserProfile>, RequestError> {
    let user = state
        .db_connection
        .update_profile(claims.user_id, &payload)
        .await?;
    Ok(Json(user.into()))
}

/// A password change signs out every session, so the caller gets a fresh one.
pub async fn update_credentials(
    State(state): State<Arc<AppState>>,
    claims: Claims,
    jar: CookieJar,
    Payload(payload, _): Payload<UpdateCredentialsPayload>,
) -> Result<(CookieJar, Json<UserProfile>), RequestError> {
    let user = state
        .db_connection
        .update_credentials(claims.user_id, &payload)
        .await?;
    let jar = if payload.password.is_some() {
        let session = state
            .db_connection
            .start_session(user.id, state.session_ttl())
            .await?;
        jar.add(session_cookie(&state.config.session, &session))
    } else {
        jar
    };
    Ok((jar, Json(user.into())))
}

pub async fn delete_account(
    State(state): State<Arc<AppState>>,
    claims: Claims,
    jar: CookieJar,
) -> Result<(CookieJar, Json<RedirectResponse>), RequestError> {
    state.db_connection.delete_account(claims.user_id).await?;
    let jar = jar.remove(removal_cookie(&state.config.session));
    Ok((jar, Json(RedirectResponse::to("/"))))
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use axum::http::StatusCode;
    use axum_extra::extract::cookie::Cookie;

    use super::*;

    async fn text_of(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn alice_signup() -> SignupPayload {
        SignupPayload {
            name: "Alice".to_string(),
            email: "alice.example.com".to_string(),
            password: "wonderland".to_string(),
        }
    }

    #[tokio::test]
    async fn signup_rejects_malformed_email_before_touching_db() {
        let response = signup(
            State(AppState::offline()),
            CookieJar::new(),
            Payload(alice_signup(), BodyFormat::Json),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(text_of(response).await.contains(r#""err":"Email should be"#));
    }

    #[tokio::test]
    async fn failed_form_signup_rerenders_the_page() {
        let response = signup(
            State(AppState::offline()),
            CookieJar::new(),
            Payload(alice_signup(), BodyFormat::Form),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let html = text_of(response).await;
        assert!(html.contains("custom-signup"));
        assert!(html.contains("Email should be in the right format"));
    }

    #[tokio::test]
    async fn logout_without_cookie_redirects_home() {
        let (_, Json(redirect)) = logout(State(AppState::offline()), CookieJar::new())
            .await
            .unwrap();
        assert_eq!(redirect, RedirectResponse::to("/"));
    }

    #[tokio::test]
    async fn logout_with_garbage_cookie_still_succeeds() {
        let state = AppState::offline();
        let jar = CookieJar::new().add(Cookie::new(
            state.config.session.cookie_name.clone(),
            "garbage",
        ));
        let (jar, redirect) = logout_form(State(state), jar).await.unwrap();
        assert_eq!(redirect.into_response().status(), StatusCode::SEE_OTHER);
        assert!(jar.get("session").is_none());
    }

    #[tokio::test]
    async fn login_is_throttled_per_email() {
        let state = AppState::offline();
        state.login_throttle.check("alice@example.com").unwrap();
        let payload = LoginPayload {
            email: "alice@example.com".to_string(),
            password: "wonderland".to_string(),
        };
        let err = start_login(&state, &payload).await.unwrap_err();
        assert!(matches!(err, RequestError::Throttled));

        let response = login(State(state), CookieJar::new(), Payload(payload, BodyFormat::Form)).await;
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        let html = text_of(response).await;
        assert!(html.contains("custom-login"));
        assert!(html.contains("Too many attempts"));
    }
}
