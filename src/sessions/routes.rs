use std::sync::Arc;

use argon2::{password_hash::PasswordVerifier, Argon2, PasswordHash};
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use diesel::{
    BoolExpressionMethods, ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper,
};
use diesel_async::RunQueryDsl;
use garde::Validate;
use serde_json::{json, Value};
use tower_cookies::Cookies;

use crate::{
    schema::{sessions, users},
    sessions::models::UserLogin,
    users::models::{AuthenticatedUserResponse, User, UserResponse},
    AppState, ErrorResponse, InnerAppState, COOKIES_SECRET,
};

use super::{removal_cookie, start_session, SessionError, UserSession};

pub fn sessions_router() -> Router<AppState> {
    Router::new().route("/", get(get_session).post(login).delete(logout))
}

/// Log in with a username or email
#[utoipa::path(
    post,
    path = "/api/session",
    request_body(content = UserLogin, content_type = "application/json"),
    responses(
        (status = 200, description = "Logged in, session cookie set", body = AuthenticatedUserResponse),
        (status = StatusCode::UNAUTHORIZED, description = "Invalid credentials", body = ErrorResponse),
        (status = StatusCode::INTERNAL_SERVER_ERROR, description = "Something went wrong", body = ErrorResponse),
    ),
    tag = "Session API"
)]
#[axum::debug_handler(state = AppState)]
pub async fn login(
    State(state): State<Arc<InnerAppState>>,
    cookies: Cookies,
    Json(payload): Json<UserLogin>,
) -> Result<Json<AuthenticatedUserResponse>, SessionError> {
    payload.validate(&())?;

    let mut db = state.pool.get().await?;

    let credential = payload.credential.to_lowercase();

    let user = users::table
        .filter(
            users::username
                .eq(&credential)
                .or(users::email.eq(&credential)),
        )
        .select(User::as_select())
        .get_result::<User>(&mut db)
        .await
        .optional()?;

    // a failed lookup is a value, not an error path
    let Some(user) = user else {
        return Err(SessionError::InvalidCredentials);
    };

    let parsed_password = PasswordHash::new(&user.password)?;

    if Argon2::default()
        .verify_password(payload.password.as_bytes(), &parsed_password)
        .is_err()
    {
        return Err(SessionError::InvalidCredentials);
    }

    let session = start_session(&mut db, &cookies, user.id).await?;

    Ok(Json(AuthenticatedUserResponse {
        id: user.id,
        first_name: user.first_name,
        last_name: user.last_name,
        username: user.username,
        email: user.email,
        token: session.id.to_string(),
    }))
}

/// Log out: drop the session row and clear the cookie
#[utoipa::path(
    delete,
    path = "/api/session",
    responses(
        (status = 200, description = "Logged out"),
        (status = StatusCode::INTERNAL_SERVER_ERROR, description = "Something went wrong", body = ErrorResponse),
    ),
    tag = "Session API"
)]
#[axum::debug_handler(state = AppState)]
pub async fn logout(
    session: UserSession,
    State(state): State<Arc<InnerAppState>>,
    cookies: Cookies,
) -> Result<Json<Value>, SessionError> {
    if let Some(session_id) = session.session_id {
        let mut db = state.pool.get().await?;

        diesel::delete(sessions::table.find(session_id))
            .execute(&mut db)
            .await?;
    }

    let key = COOKIES_SECRET.get().expect("cookies secret key");
    cookies.private(key).remove(removal_cookie());

    Ok(Json(json!({ "message": "success" })))
}

/// Restore the session user; `null` when nobody is logged in
#[utoipa::path(
    get,
    path = "/api/session",
    responses(
        (status = 200, description = "Current user, or null when nobody is logged in", body = UserResponse),
        (status = StatusCode::INTERNAL_SERVER_ERROR, description = "Something went wrong", body = ErrorResponse),
    ),
    tag = "Session API"
)]
#[axum::debug_handler(state = AppState)]
pub async fn get_session(
    session: UserSession,
    State(state): State<Arc<InnerAppState>>,
) -> Result<Json<Option<UserResponse>>, SessionError> {
    let Some(session_id) = session.session_id else {
        return Ok(Json(None));
    };

    let mut db = state.pool.get().await?;

    let user = sessions::table
        .inner_join(users::table)
        .filter(sessions::id.eq(session_id))
        .filter(sessions::expires_at.gt(Utc::now()))
        .select(User::as_select())
        .get_result::<User>(&mut db)
        .await
        .optional()?;

    Ok(Json(user.map(User::into_response)))
}
